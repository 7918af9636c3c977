//! `lamplighter test`: run one transition now.
//!
//! Parameters follow the HTTP power handler exactly (`brightness` required,
//! bare integer transitions are milliseconds, colour values clamped).

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::parse_power_params;
use crate::common::constants::STARTUP_PROBE_TIMEOUT;
use crate::common::utils::format_duration;
use crate::config;
use crate::device::{self, DeviceTransition};
use crate::logger::Log;
use crate::time_source::RealTimeSource;

pub fn handle_test_command(
    device_label: &str,
    params: Vec<(String, String)>,
    debug_enabled: bool,
) -> Result<()> {
    log_version!();
    Log::set_debug(debug_enabled);

    let params: HashMap<String, String> = params.into_iter().collect();
    let (target, duration) = parse_power_params(&params)?;

    let config = config::load()?;
    let device_config = config
        .devices
        .get(device_label)
        .with_context(|| format!("No device named \"{device_label}\" in the configuration"))?;

    let device = device::connect(device_label, device_config, STARTUP_PROBE_TIMEOUT)
        .with_context(|| format!("{device_label}: connect failed"))?;
    log_block_start!("Connected to {device_label}: {}", device.describe());

    log_block_start!(
        "Transition to hue {:.0}° sat {:.0}% bri {:.0}% {}K over {}",
        target.hue_degrees(),
        target.saturation_percent(),
        target.brightness_percent(),
        target.kelvin,
        format_duration(duration)
    );

    let transition = DeviceTransition::new(Arc::new(RealTimeSource));
    transition.transition(device.as_ref(), target, duration)?;

    log_decorated!("Done");
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("test - Run one transition now");
    log_block_start!("Usage: lamplighter test <device> key=value [...]");
    log_block_start!("Arguments:");
    log_indented!("<device>        Device label from the configuration");
    log_indented!("brightness=<%>  Required, 0 turns the device off");
    log_indented!("hue=<degrees>   0-360, default 0");
    log_indented!("saturation=<%>  0-100, default 0");
    log_indented!("kelvin=<K>      1500-9000, default 3500");
    log_indented!("transition=<d>  Duration such as 5s or 1m30s; a bare number is");
    log_indented!("                milliseconds. Default 2s");
    log_block_start!("Examples:");
    log_indented!("# Warm white over ten seconds");
    log_indented!("lamplighter test desk brightness=60 kelvin=2700 transition=10s");
    log_pipe!();
    log_indented!("# Turn a plug off");
    log_indented!("lamplighter test porch brightness=0");
    log_end!();
}
