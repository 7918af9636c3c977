//! Application coordinator for the daemon.
//!
//! Loads the configuration, probes devices, wires schedules to jobs and then
//! hands the main thread to the [`Dispatcher`]. The HTTP control surface runs
//! on its own thread with its own Tokio runtime.
//!
//! ```no_run
//! use lamplighter::Lamplighter;
//!
//! # fn main() -> anyhow::Result<()> {
//! Lamplighter::new(false).run()?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    api::{self, ApiState},
    common::constants::*,
    config::{self, Config, SolarSource},
    core::{Dispatcher, Job},
    device::{self, Device, DeviceTransition},
    geo::{AstronomicalOracle, SolarOracle, SunriseSunsetApi},
    logger::Log,
    schedule::{ScheduleContext, parse_expression},
    signals::setup_signal_handler,
    time_source::{RealTimeSource, TimeSource},
};

pub struct Lamplighter {
    debug_enabled: bool,
}

impl Lamplighter {
    pub fn new(debug_enabled: bool) -> Self {
        Self { debug_enabled }
    }

    /// Run until a shutdown signal arrives.
    pub fn run(self) -> Result<()> {
        log_version!();
        Log::set_debug(self.debug_enabled);

        let config_path = config::get_config_path()?;
        let config = config::load_from_path(&config_path)?;
        config.log_config(&config_path);

        let timezone = config.timezone()?;
        Log::set_timezone(timezone);
        Log::set_timestamps(true);

        let signal_state = setup_signal_handler()?;

        let devices = connect_devices(&config, STARTUP_PROBE_TIMEOUT);
        let time_source: Arc<dyn TimeSource> = Arc::new(RealTimeSource);
        let transition = Arc::new(DeviceTransition::new(Arc::clone(&time_source)));

        let ctx = schedule_context(&config)?;
        let mut dispatcher = Dispatcher::new(Arc::clone(&transition), time_source, timezone);

        log_block_start!("Scheduling {} jobs", config.jobs.len());
        for (index, job_config) in config.jobs.iter().enumerate() {
            let name = job_name(index, &job_config.device);
            let Some(device) = devices.get(&job_config.device) else {
                log_warning!(
                    "{name}: device \"{}\" is unavailable, job skipped",
                    job_config.device
                );
                continue;
            };

            let schedule = parse_expression(&job_config.schedule, &ctx)
                .with_context(|| format!("{name}: schedule \"{}\"", job_config.schedule))?;
            let job = Job::new(
                name,
                Arc::clone(device),
                job_config.target(),
                job_config.transition()?,
            );
            dispatcher.add(schedule, Arc::new(job));
        }

        let http = match config.listen_addr()? {
            Some(listen) => {
                let state = ApiState {
                    devices: Arc::new(devices),
                    transition,
                };
                Some(api::spawn(listen, state, Arc::clone(&signal_state.running))?)
            }
            None => {
                log_decorated!("HTTP control surface disabled");
                None
            }
        };

        dispatcher.run(&signal_state.running);

        if let Some(handle) = http
            && handle.join().is_err()
        {
            log_warning!("HTTP thread panicked");
        }

        log_block_start!("Shutting down lamplighter...");
        log_end!();
        Ok(())
    }
}

/// The oracle selected by `solar_source`.
pub fn solar_oracle(config: &Config) -> Result<Arc<dyn SolarOracle>> {
    let oracle: Arc<dyn SolarOracle> = match config.solar_source {
        SolarSource::Local => Arc::new(AstronomicalOracle::new()),
        SolarSource::Api => {
            Arc::new(SunriseSunsetApi::new().context("Failed to create solar API client")?)
        }
    };
    Ok(oracle)
}

pub fn schedule_context(config: &Config) -> Result<ScheduleContext> {
    Ok(ScheduleContext {
        location: config.location,
        timezone: config.timezone()?,
        oracle: solar_oracle(config)?,
        retry_limit: config.retry_limit(),
    })
}

/// Probe every configured device. Failures are logged and the device left out.
pub fn connect_devices(config: &Config, timeout: Duration) -> BTreeMap<String, Arc<dyn Device>> {
    log_block_start!("Connecting to {} devices", config.devices.len());

    let mut devices = BTreeMap::new();
    for (label, device_config) in &config.devices {
        match device::connect(label, device_config, timeout) {
            Ok(device) => {
                log_indented!("{label}: {}", device.describe());
                devices.insert(label.clone(), device);
            }
            Err(e) => log_warning!(
                "{label}: {} at {}: {e}",
                device_config.kind,
                device_config.host
            ),
        }
    }
    devices
}

/// Name used in logs for the job at `index` in the configuration.
pub fn job_name(index: usize, device: &str) -> String {
    format!("job {} ({device})", index + 1)
}
