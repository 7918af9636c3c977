//! Moving a device to a target colour without a visible flash.
//!
//! Sequence for one transition, all under a single deadline:
//!
//! 1. connect
//! 2. echo, retried on timeouts with a linear backoff
//! 3. target brightness 0: power off over the duration and stop
//! 4. read power; if off, write the target colour at brightness 0 with a 1 ms
//!    transition, then power on
//! 5. write the target colour over the duration
//!
//! Step 4 exists because bulbs resume their last colour when powered on. Writing
//! the new colour at zero brightness first means the ramp starts from black
//! instead of from whatever the bulb showed last.
//!
//! Only the echo is retried. A failure in any later step is returned as is.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use super::{ColorState, Connection, Device, DeviceError, Power};
use crate::common::constants::{ARM_TRANSITION, ECHO_ATTEMPTS, ECHO_BACKOFF, TRANSITION_TIMEOUT};
use crate::time_source::TimeSource;

/// The stage of a transition that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Connect,
    Echo,
    SetLightPower,
    GetPower,
    GetColor,
    ResetColor,
    SetPower,
    SetColor,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Connect => "connect failed",
            Step::Echo => "echo device",
            Step::SetLightPower => "set light power",
            Step::GetPower => "get power",
            Step::GetColor => "get color",
            Step::ResetColor => "reset color",
            Step::SetPower => "set power",
            Step::SetColor => "set color",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Error)]
#[error("{label}: {step}: {source}")]
pub struct TransitionError {
    pub label: String,
    pub step: Step,
    pub source: DeviceError,
}

impl TransitionError {
    pub fn is_timeout(&self) -> bool {
        self.source.is_timeout()
    }
}

/// Runs transitions against any [`Device`].
pub struct DeviceTransition {
    time_source: Arc<dyn TimeSource>,
    timeout: Duration,
    echo_attempts: u32,
    echo_backoff: Duration,
}

impl DeviceTransition {
    pub fn new(time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            time_source,
            timeout: TRANSITION_TIMEOUT,
            echo_attempts: ECHO_ATTEMPTS,
            echo_backoff: ECHO_BACKOFF,
        }
    }

    pub fn with_echo_policy(mut self, attempts: u32, backoff: Duration) -> Self {
        self.echo_attempts = attempts.max(1);
        self.echo_backoff = backoff;
        self
    }

    pub fn transition(
        &self,
        device: &dyn Device,
        target: ColorState,
        duration: Duration,
    ) -> Result<(), TransitionError> {
        let label = device.label();
        let fail = |step: Step| {
            move |source: DeviceError| TransitionError {
                label: label.to_string(),
                step,
                source,
            }
        };
        let deadline = Instant::now() + self.timeout;

        let mut conn = device.connect(deadline).map_err(fail(Step::Connect))?;
        self.echo(label, conn.as_mut()).map_err(fail(Step::Echo))?;

        if target.is_off() {
            conn.set_power(Power::Off, duration).map_err(fail(Step::SetLightPower))?;
            return Ok(());
        }

        let power = conn.power().map_err(fail(Step::GetPower))?;
        if power == Power::Off {
            conn.set_color(target.with_brightness(0), ARM_TRANSITION)
                .map_err(fail(Step::ResetColor))?;
            conn.set_power(Power::On, Duration::ZERO).map_err(fail(Step::SetPower))?;
        }

        conn.set_color(target, duration).map_err(fail(Step::SetColor))?;
        Ok(())
    }

    /// Read power and colour, with the same connect and echo handling as a transition.
    pub fn status(&self, device: &dyn Device) -> Result<(Power, ColorState), TransitionError> {
        let label = device.label();
        let fail = |step: Step| {
            move |source: DeviceError| TransitionError {
                label: label.to_string(),
                step,
                source,
            }
        };
        let deadline = Instant::now() + self.timeout;

        let mut conn = device.connect(deadline).map_err(fail(Step::Connect))?;
        self.echo(label, conn.as_mut()).map_err(fail(Step::Echo))?;
        let power = conn.power().map_err(fail(Step::GetPower))?;
        let color = conn.color().map_err(fail(Step::GetColor))?;
        Ok((power, color))
    }

    fn echo(&self, label: &str, conn: &mut dyn Connection) -> Result<(), DeviceError> {
        let mut attempt = 1;
        loop {
            match conn.echo() {
                Ok(()) => {
                    if attempt > 1 {
                        log_debug!("{label}: echo answered on attempt {attempt}");
                    }
                    return Ok(());
                }
                Err(e) if e.is_timeout() && attempt < self.echo_attempts => {
                    log_debug!("{label}: echo attempt {attempt} timed out: {e}");
                    self.time_source.sleep(self.echo_backoff * attempt);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::{Call, FakeDevice};
    use crate::time_source::SimulatedTimeSource;
    use chrono::{TimeZone, Utc};

    fn transition_with_clock() -> (DeviceTransition, Arc<SimulatedTimeSource>) {
        let clock = Arc::new(SimulatedTimeSource::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap(),
        ));
        (DeviceTransition::new(clock.clone()), clock)
    }

    fn warm_white() -> ColorState {
        ColorState::from_human(30.0, 40.0, 80.0, 2700)
    }

    #[test]
    fn test_off_target_only_powers_off() {
        let (transition, _) = transition_with_clock();
        let device = FakeDevice::new("desk", Power::On);

        transition
            .transition(&device, ColorState::default(), Duration::from_secs(5))
            .unwrap();

        assert_eq!(
            device.calls(),
            vec![
                Call::Echo,
                Call::SetPower(Power::Off, Duration::from_secs(5))
            ]
        );
    }

    #[test]
    fn test_device_that_is_off_is_armed_first() {
        let (transition, _) = transition_with_clock();
        let device = FakeDevice::new("desk", Power::Off);
        let target = warm_white();

        transition
            .transition(&device, target, Duration::from_secs(900))
            .unwrap();

        assert_eq!(
            device.calls(),
            vec![
                Call::Echo,
                Call::GetPower,
                Call::SetColor(target.with_brightness(0), Duration::from_millis(1)),
                Call::SetPower(Power::On, Duration::ZERO),
                Call::SetColor(target, Duration::from_secs(900)),
            ]
        );
    }

    #[test]
    fn test_device_that_is_on_only_ramps() {
        let (transition, _) = transition_with_clock();
        let device = FakeDevice::new("desk", Power::On);
        let target = warm_white();

        transition
            .transition(&device, target, Duration::from_secs(2))
            .unwrap();

        assert_eq!(
            device.calls(),
            vec![
                Call::Echo,
                Call::GetPower,
                Call::SetColor(target, Duration::from_secs(2)),
            ]
        );
    }

    #[test]
    fn test_connect_failure_stops_everything() {
        let (transition, _) = transition_with_clock();
        let device = FakeDevice::new("desk", Power::On).refuse_connections();

        let err = transition
            .transition(&device, warm_white(), Duration::from_secs(2))
            .unwrap_err();

        assert_eq!(err.step, Step::Connect);
        assert!(err.to_string().starts_with("desk: connect failed: "));
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_echo_non_timeout_is_not_retried() {
        let (transition, clock) = transition_with_clock();
        let device = FakeDevice::new("desk", Power::On)
            .fail_echo_with(|| DeviceError::Transport("connection reset".to_string()), 3);

        let err = transition
            .transition(&device, warm_white(), Duration::from_secs(2))
            .unwrap_err();

        assert_eq!(err.step, Step::Echo);
        assert_eq!(device.calls(), vec![Call::Echo]);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_failed_write_names_the_step() {
        let (transition, _) = transition_with_clock();
        let device = FakeDevice::new("desk", Power::Off).fail_set_power();

        let err = transition
            .transition(&device, warm_white(), Duration::from_secs(2))
            .unwrap_err();

        assert_eq!(err.step, Step::SetPower);
        assert_eq!(
            err.to_string(),
            "desk: set power: injected set_power failure"
        );
        // The final ramp is never attempted after a failed step.
        assert_eq!(device.calls().len(), 4);
    }

    #[test]
    fn test_status_reads_power_and_color() {
        let (transition, _) = transition_with_clock();
        let device = FakeDevice::new("desk", Power::On);

        let (power, color) = transition.status(&device).unwrap();
        assert_eq!(power, Power::On);
        assert_eq!(color, ColorState::full());
    }

    #[test]
    fn test_step_names() {
        assert_eq!(Step::Connect.to_string(), "connect failed");
        assert_eq!(Step::Echo.to_string(), "echo device");
        assert_eq!(Step::SetLightPower.to_string(), "set light power");
        assert_eq!(Step::ResetColor.to_string(), "reset color");
    }
}
