//! Application-wide constants and defaults.
//!
//! Values are grouped by the module that consumes them. Anything a user can
//! override lives in the configuration file; these are the fallbacks.

use std::time::Duration;

// # Schedule engine

/// Consecutive oracle failures tolerated before a solar schedule disables itself.
pub const DEFAULT_RETRY_LIMIT: u32 = 5;

/// Delay before the dispatcher re-polls a schedule whose oracle call failed.
pub const ORACLE_RETRY_BACKOFF_SECS: i64 = 60;

// # Device transitions

/// Deadline for a whole transition, from connect to the final colour write.
pub const TRANSITION_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for the connectivity probe performed once at startup.
pub const STARTUP_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Number of liveness probes attempted before a transition gives up.
pub const ECHO_ATTEMPTS: u32 = 5;

/// Linear backoff unit between liveness probes (`attempt * ECHO_BACKOFF`).
pub const ECHO_BACKOFF: Duration = Duration::from_millis(250);

/// Transition used to "arm" a bulb at zero brightness before powering it on.
pub const ARM_TRANSITION: Duration = Duration::from_millis(1);

// # Colour model

pub const MINIMUM_KELVIN: u16 = 1500;
pub const MAXIMUM_KELVIN: u16 = 9000;
pub const DEFAULT_KELVIN: u16 = 3500;

pub const MAXIMUM_HUE_DEGREES: f64 = 360.0;
pub const MAXIMUM_PERCENT: f64 = 100.0;

// # Jobs and HTTP surface

/// Transition applied by scheduled jobs that do not specify one.
pub const DEFAULT_JOB_TRANSITION: Duration = Duration::from_secs(15 * 60);

/// Transition applied by the power handler when the request omits one.
pub const DEFAULT_POWER_TRANSITION: Duration = Duration::from_secs(2);

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:9000";

// # Drivers

pub const LIFX_PORT: u16 = 56700;

/// Per-request response wait on the LIFX LAN protocol, capped by the operation deadline.
pub const LIFX_RESPONSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Timeout for a single REST call to a plug or relay.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for the sunrise-sunset.org oracle.
pub const SOLAR_API_TIMEOUT: Duration = Duration::from_secs(10);

pub const SOLAR_API_URL: &str = "https://api.sunrise-sunset.org/json";

// # Dispatcher

/// Longest single sleep of the dispatcher loop, so shutdown is noticed promptly.
pub const DISPATCHER_MAX_SLEEP: Duration = Duration::from_secs(1);

/// Number of upcoming triggers shown by `lamplighter preview` by default.
pub const DEFAULT_PREVIEW_COUNT: usize = 5;

// # Process

pub const EXIT_FAILURE: i32 = 1;
pub const CONFIG_FILE_NAME: &str = "lamplighter.toml";
