//! Device capability boundary and drivers.
//!
//! Everything above this module talks to lights through two traits. A
//! [`Device`] is a long-lived handle created once at startup; it hands out a
//! short-lived [`Connection`] per operation. Connections carry a deadline and
//! every call made through them is bounded by it.
//!
//! Drivers:
//! - [`LifxBulb`]: LIFX LAN protocol over UDP.
//! - [`TasmotaPlug`]: Tasmota firmware relays (Sonoff S31) over HTTP.
//! - [`ShellySwitch`]: Shelly Gen2 switches over HTTP RPC.
//!
//! Relays have no colour. They report full or zero brightness and treat any
//! non-zero brightness as "on", which lets the generic transition sequence
//! drive them unchanged.

pub mod color;
pub mod error;
pub mod lifx;
pub mod shelly;
pub mod tasmota;
#[cfg(any(test, feature = "testing-support"))]
pub mod testing;
pub mod transition;

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::common::constants::HTTP_REQUEST_TIMEOUT;
use crate::config::{DeviceConfig, DeviceKind};

pub use color::ColorState;
pub use error::DeviceError;
pub use lifx::LifxBulb;
pub use shelly::ShellySwitch;
pub use tasmota::TasmotaPlug;
pub use transition::{DeviceTransition, Step, TransitionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Power {
    On,
    Off,
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Power::On => write!(f, "on"),
            Power::Off => write!(f, "off"),
        }
    }
}

/// A single session with a device. Dropped when the operation completes.
pub trait Connection {
    /// Liveness round-trip.
    fn echo(&mut self) -> Result<(), DeviceError>;

    fn power(&mut self) -> Result<Power, DeviceError>;

    fn color(&mut self) -> Result<ColorState, DeviceError>;

    fn set_power(&mut self, power: Power, duration: Duration) -> Result<(), DeviceError>;

    fn set_color(&mut self, color: ColorState, duration: Duration) -> Result<(), DeviceError>;
}

/// A physical device known by its configured label.
pub trait Device: Send + Sync {
    fn label(&self) -> &str;

    /// Model and firmware details gathered at startup, for logs.
    fn describe(&self) -> String;

    /// Open a connection whose calls must all finish before `deadline`.
    fn connect(&self, deadline: Instant) -> Result<Box<dyn Connection + '_>, DeviceError>;
}

/// Client shared by the HTTP-based drivers.
pub(crate) static HTTP_CLIENT: Lazy<reqwest::blocking::Client> =
    Lazy::new(reqwest::blocking::Client::new);

/// Time left before `deadline`, or a timeout error once it has passed.
pub(crate) fn remaining(deadline: Instant) -> Result<Duration, DeviceError> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|left| !left.is_zero())
        .ok_or_else(|| DeviceError::Timeout("operation deadline exceeded".to_string()))
}

/// Create a device handle from configuration and verify it answers.
///
/// The probe runs once, with `timeout` as its deadline. A device that responds
/// but does not speak the expected protocol fails with
/// [`DeviceError::ProtocolMismatch`].
pub fn connect(
    label: &str,
    config: &DeviceConfig,
    timeout: Duration,
) -> Result<Arc<dyn Device>, DeviceError> {
    let deadline = Instant::now() + timeout;
    let device: Arc<dyn Device> = match config.kind {
        DeviceKind::Lifx => Arc::new(LifxBulb::connect(
            label,
            &config.host,
            config.mac.as_deref(),
            deadline,
        )?),
        DeviceKind::Tasmota => Arc::new(TasmotaPlug::connect(label, &config.host, deadline)?),
        DeviceKind::Shelly => Arc::new(ShellySwitch::connect(
            label,
            &config.host,
            config.index,
            deadline,
        )?),
    };
    Ok(device)
}

/// GET `url` with `query` and decode the JSON reply, within `deadline`.
pub(crate) fn get_json<T: DeserializeOwned>(
    url: &str,
    query: &[(&str, &str)],
    deadline: Instant,
) -> Result<T, DeviceError> {
    let timeout = remaining(deadline)?.min(HTTP_REQUEST_TIMEOUT);
    let response = HTTP_CLIENT
        .get(url)
        .query(query)
        .timeout(timeout)
        .send()?
        .error_for_status()?;
    Ok(response.json()?)
}

/// Base URL for an HTTP device given as `host` or `host:port`.
pub(crate) fn http_base_url(host: &str) -> Result<String, DeviceError> {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(DeviceError::InvalidAddress("empty host".to_string()));
    }
    if host.starts_with("http://") || host.starts_with("https://") {
        Ok(host.to_string())
    } else {
        Ok(format!("http://{host}"))
    }
}
