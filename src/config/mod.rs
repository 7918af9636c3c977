//! Configuration for lamplighter.
//!
//! A single TOML file describes where the household is, which devices exist and
//! which jobs drive them:
//!
//! ```toml
//! listen = "0.0.0.0:9000"       # HTTP control surface ("" disables it)
//! timezone = "America/New_York" # calendar dates for solar schedules; $TZ, then UTC
//! solar_source = "local"        # "local" or "api" (sunrise-sunset.org)
//! retry_limit = 5               # oracle failures tolerated per schedule
//!
//! [location]
//! latitude = 40.7128
//! longitude = -74.0060
//!
//! [devices.desk]
//! type = "lifx"                 # "lifx" | "tasmota" (or "s31") | "shelly"
//! host = "192.168.1.20"
//! mac = "d0:73:d5:01:02:03"
//!
//! [[jobs]]
//! schedule = "@sunset -1h"      # or a cron expression
//! device = "desk"
//! hue = 30.0                    # degrees
//! saturation = 40.0             # percent
//! brightness = 100.0            # percent, 0 turns the device off
//! kelvin = 2700
//! transition = "15m"
//! ```
//!
//! Colour values outside their ranges are clamped when a job runs; validation
//! only warns about them. Everything else that cannot work is rejected at load
//! time.

pub mod loading;
pub mod validation;


use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::common::constants::*;
use crate::common::utils::{format_duration, private_path};
use crate::device::ColorState;
use crate::geo::Location;
use crate::schedule::parse_duration;

pub use loading::{get_config_path, load, load_from_path, set_config_path};
pub use validation::validate_config;

/// Where sunrise and sunset come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolarSource {
    /// Computed locally.
    #[default]
    Local,
    /// Fetched from sunrise-sunset.org.
    Api,
}

impl fmt::Display for SolarSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolarSource::Local => write!(f, "local"),
            SolarSource::Api => write!(f, "api"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Lifx,
    #[serde(alias = "s31")]
    Tasmota,
    Shelly,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Lifx => write!(f, "lifx"),
            DeviceKind::Tasmota => write!(f, "tasmota"),
            DeviceKind::Shelly => write!(f, "shelly"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceConfig {
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    /// `host` or `host:port`.
    pub host: String,
    /// LIFX target address; without it the bulb answers to any target.
    #[serde(default)]
    pub mac: Option<String>,
    /// Switch channel on multi-channel Shelly devices.
    #[serde(default)]
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobConfig {
    pub schedule: String,
    pub device: String,
    #[serde(default)]
    pub hue: f64,
    #[serde(default)]
    pub saturation: f64,
    pub brightness: f64,
    #[serde(default)]
    pub kelvin: Option<i64>,
    #[serde(default)]
    pub transition: Option<String>,
}

impl JobConfig {
    /// Target colour, clamped into range.
    pub fn target(&self) -> ColorState {
        ColorState::from_human(
            self.hue,
            self.saturation,
            self.brightness,
            self.kelvin.unwrap_or(i64::from(DEFAULT_KELVIN)),
        )
    }

    pub fn transition(&self) -> Result<Duration> {
        let Some(raw) = self.transition.as_deref() else {
            return Ok(DEFAULT_JOB_TRANSITION);
        };
        let parsed = parse_duration(raw)?;
        parsed
            .to_std()
            .with_context(|| format!("transition \"{raw}\" must not be negative"))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub listen: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub solar_source: SolarSource,
    #[serde(default)]
    pub retry_limit: Option<u32>,
    pub location: Location,
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceConfig>,
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

impl Config {
    /// Timezone for calendar dates: the configured one, then `$TZ`, then UTC.
    pub fn timezone(&self) -> Result<Tz> {
        if let Some(name) = self.timezone.as_deref() {
            return name
                .parse::<Tz>()
                .map_err(|_| anyhow::anyhow!("unknown timezone \"{name}\""));
        }
        match std::env::var("TZ") {
            Ok(name) if !name.trim().is_empty() => name
                .trim()
                .trim_start_matches(':')
                .parse::<Tz>()
                .map_err(|_| anyhow::anyhow!("unknown timezone \"{name}\" in $TZ")),
            _ => Ok(Tz::UTC),
        }
    }

    pub fn retry_limit(&self) -> u32 {
        self.retry_limit.unwrap_or(DEFAULT_RETRY_LIMIT)
    }

    /// Address for the HTTP surface, or `None` when it is disabled.
    pub fn listen_addr(&self) -> Result<Option<SocketAddr>> {
        let raw = self.listen.as_deref().unwrap_or(DEFAULT_LISTEN_ADDR).trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<SocketAddr>()
            .map(Some)
            .with_context(|| format!("invalid listen address \"{raw}\""))
    }

    pub fn log_config(&self, path: &Path) {
        log_block_start!("Loaded configuration from {}", private_path(path));
        log_indented!("Location: {}", self.location);
        match self.timezone() {
            Ok(tz) => log_indented!("Timezone: {tz}"),
            Err(e) => log_indented!("Timezone: {e}"),
        }
        log_indented!("Solar source: {}", self.solar_source);
        match self.listen_addr() {
            Ok(Some(addr)) => log_indented!("HTTP control: {addr}"),
            _ => log_indented!("HTTP control: disabled"),
        }

        log_block_start!("Devices ({}):", self.devices.len());
        for (label, device) in &self.devices {
            log_indented!("{label}: {} at {}", device.kind, device.host);
        }

        log_block_start!("Jobs ({}):", self.jobs.len());
        for job in &self.jobs {
            let transition = job
                .transition()
                .map(format_duration)
                .unwrap_or_else(|_| "invalid".to_string());
            log_indented!(
                "{} -> {} (brightness {:.0}%, over {transition})",
                job.schedule,
                job.device,
                job.brightness
            );
        }
    }
}
