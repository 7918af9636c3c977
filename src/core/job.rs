//! A scheduled job: one device, one target state.

use std::sync::Arc;
use std::time::Duration;

use crate::common::utils::format_duration;
use crate::device::{ColorState, Device, DeviceTransition};

/// Binds a device to the state it should reach when the job's schedule fires.
///
/// Jobs are built once at startup and never change. Several jobs may share a
/// device handle; nothing orders jobs that fire on the same device at once.
pub struct Job {
    pub name: String,
    pub device: Arc<dyn Device>,
    pub target: ColorState,
    pub transition_duration: Duration,
}

impl Job {
    pub fn new(
        name: impl Into<String>,
        device: Arc<dyn Device>,
        target: ColorState,
        transition_duration: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            device,
            target,
            transition_duration,
        }
    }

    /// Drive the device to the target. Failures are logged and dropped so one
    /// device can never stop the others.
    pub fn run(&self, transition: &DeviceTransition) {
        let label = self.device.label();
        if self.target.is_off() {
            log_block_start!(
                "{}: turning {label} off over {}",
                self.name,
                format_duration(self.transition_duration)
            );
        } else {
            log_block_start!(
                "{}: {label} to hue {:.0}° sat {:.0}% bri {:.0}% {}K over {}",
                self.name,
                self.target.hue_degrees(),
                self.target.saturation_percent(),
                self.target.brightness_percent(),
                self.target.kelvin,
                format_duration(self.transition_duration)
            );
        }

        match transition.transition(self.device.as_ref(), self.target, self.transition_duration) {
            Ok(()) => log_decorated!("{}: {label} done", self.name),
            Err(e) => log_error!("{}: {e}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Power;
    use crate::device::testing::{Call, FakeDevice};
    use crate::logger::Log;
    use crate::time_source::SimulatedTimeSource;
    use chrono::Utc;

    fn transition() -> DeviceTransition {
        DeviceTransition::new(Arc::new(SimulatedTimeSource::new(Utc::now())))
    }

    #[test]
    fn test_run_applies_target() {
        Log::set_enabled(false);
        let device = Arc::new(FakeDevice::new("desk", Power::On));
        let target = ColorState::from_human(30.0, 40.0, 80.0, 2700);
        let job = Job::new("evening", device.clone(), target, Duration::from_secs(60));

        job.run(&transition());

        assert_eq!(
            device.calls(),
            vec![
                Call::Echo,
                Call::GetPower,
                Call::SetColor(target, Duration::from_secs(60)),
            ]
        );
    }

    #[test]
    fn test_run_swallows_failures() {
        Log::set_enabled(false);
        let device = Arc::new(FakeDevice::new("porch", Power::Off).refuse_connections());
        let job = Job::new(
            "night",
            device.clone(),
            ColorState::full(),
            Duration::from_secs(1),
        );

        job.run(&transition());

        assert!(device.calls().is_empty());
    }
}
