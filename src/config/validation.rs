//! Configuration validation.
//!
//! Rejects configurations that cannot run: bad coordinates, unknown timezones,
//! jobs pointing at missing devices, schedules or transitions that do not
//! parse. Colour values are clamped later, so out-of-range ones only warn.

use anyhow::{Context, Result};
use std::sync::Arc;

use super::{Config, JobConfig};
use crate::common::constants::*;
use crate::geo::AstronomicalOracle;
use crate::schedule::{ScheduleContext, parse_expression};

pub fn validate_config(config: &Config) -> Result<()> {
    let lat = config.location.latitude;
    if !(-90.0..=90.0).contains(&lat) {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    let lon = config.location.longitude;
    if !(-180.0..=180.0).contains(&lon) {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    let timezone = config.timezone()?;

    if config.retry_limit == Some(0) {
        anyhow::bail!("retry_limit must be at least 1");
    }

    config.listen_addr()?;

    for (label, device) in &config.devices {
        if device.host.trim().is_empty() {
            anyhow::bail!("device \"{label}\" has an empty host");
        }
        if let Some(mac) = device.mac.as_deref() {
            crate::device::lifx::protocol::parse_target(mac)
                .with_context(|| format!("device \"{label}\""))?;
        }
    }

    // Parsing a schedule never consults the oracle, so the local one suffices here.
    let ctx = ScheduleContext {
        location: config.location,
        timezone,
        oracle: Arc::new(AstronomicalOracle::new()),
        retry_limit: config.retry_limit(),
    };

    for (index, job) in config.jobs.iter().enumerate() {
        let name = format!("job {} ({})", index + 1, job.schedule);

        if !config.devices.contains_key(&job.device) {
            anyhow::bail!("{name} references missing device \"{}\"", job.device);
        }

        parse_expression(&job.schedule, &ctx).with_context(|| name.clone())?;
        job.transition().with_context(|| name.clone())?;

        warn_on_clamping(&name, job);
    }

    Ok(())
}

fn warn_on_clamping(name: &str, job: &JobConfig) {
    if !(0.0..=MAXIMUM_HUE_DEGREES).contains(&job.hue) {
        log_warning!(
            "{name}: hue {} will be clamped to 0-{MAXIMUM_HUE_DEGREES}",
            job.hue
        );
    }
    for (field, value) in [("saturation", job.saturation), ("brightness", job.brightness)] {
        if !(0.0..=MAXIMUM_PERCENT).contains(&value) {
            log_warning!("{name}: {field} {value} will be clamped to 0-{MAXIMUM_PERCENT}");
        }
    }
    if let Some(kelvin) = job.kelvin
        && !(i64::from(MINIMUM_KELVIN)..=i64::from(MAXIMUM_KELVIN)).contains(&kelvin)
    {
        log_warning!(
            "{name}: kelvin {kelvin} will be clamped to {MINIMUM_KELVIN}-{MAXIMUM_KELVIN}"
        );
    }
}
