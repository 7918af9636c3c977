//! Relays running Tasmota firmware, such as the Sonoff S31.
//!
//! Commands go through the web console endpoint: `GET /cm?cmnd=<command>`.

use serde::Deserialize;
use std::time::{Duration, Instant};

use super::{ColorState, Connection, Device, DeviceError, Power, get_json, http_base_url};

#[derive(Debug, Deserialize)]
struct FirmwareStatus {
    #[serde(rename = "StatusFWR")]
    status: FirmwareDetails,
}

#[derive(Debug, Deserialize)]
struct FirmwareDetails {
    #[serde(rename = "Version")]
    version: String,
    #[serde(rename = "Hardware", default)]
    hardware: String,
}

#[derive(Debug, Deserialize)]
struct PowerState {
    #[serde(rename = "POWER", alias = "POWER1")]
    power: String,
}

impl PowerState {
    fn power(&self) -> Result<Power, DeviceError> {
        match self.power.to_ascii_uppercase().as_str() {
            "ON" => Ok(Power::On),
            "OFF" => Ok(Power::Off),
            other => Err(DeviceError::ProtocolMismatch(format!(
                "unknown power state '{other}'"
            ))),
        }
    }
}

pub struct TasmotaPlug {
    label: String,
    base_url: String,
    firmware: String,
    hardware: String,
}

impl TasmotaPlug {
    /// Query firmware status to confirm the host runs Tasmota.
    pub fn connect(label: &str, host: &str, deadline: Instant) -> Result<Self, DeviceError> {
        let base_url = http_base_url(host)?;
        let status: FirmwareStatus =
            get_json(&command_url(&base_url), &[("cmnd", "Status 2")], deadline)?;

        Ok(Self {
            label: label.to_string(),
            base_url,
            firmware: status.status.version,
            hardware: status.status.hardware,
        })
    }
}

fn command_url(base_url: &str) -> String {
    format!("{base_url}/cm")
}

impl Device for TasmotaPlug {
    fn label(&self) -> &str {
        &self.label
    }

    fn describe(&self) -> String {
        if self.hardware.is_empty() {
            format!("Tasmota relay {} (firmware {})", self.base_url, self.firmware)
        } else {
            format!(
                "Tasmota relay {} ({}, firmware {})",
                self.base_url, self.hardware, self.firmware
            )
        }
    }

    fn connect(&self, deadline: Instant) -> Result<Box<dyn Connection + '_>, DeviceError> {
        Ok(Box::new(TasmotaConnection {
            url: command_url(&self.base_url),
            deadline,
        }))
    }
}

struct TasmotaConnection {
    url: String,
    deadline: Instant,
}

impl TasmotaConnection {
    fn command(&self, command: &str) -> Result<Power, DeviceError> {
        let state: PowerState = get_json(&self.url, &[("cmnd", command)], self.deadline)?;
        state.power()
    }
}

impl Connection for TasmotaConnection {
    fn echo(&mut self) -> Result<(), DeviceError> {
        self.command("Power").map(|_| ())
    }

    fn power(&mut self) -> Result<Power, DeviceError> {
        self.command("Power")
    }

    fn color(&mut self) -> Result<ColorState, DeviceError> {
        Ok(match self.power()? {
            Power::On => ColorState::full(),
            Power::Off => ColorState::default(),
        })
    }

    fn set_power(&mut self, power: Power, _duration: Duration) -> Result<(), DeviceError> {
        let command = match power {
            Power::On => "Power On",
            Power::Off => "Power Off",
        };
        let reported = self.command(command)?;
        if reported != power {
            return Err(DeviceError::Transport(format!(
                "relay reports {reported} after {command}"
            )));
        }
        Ok(())
    }

    fn set_color(&mut self, color: ColorState, duration: Duration) -> Result<(), DeviceError> {
        let power = if color.is_off() { Power::Off } else { Power::On };
        self.set_power(power, duration)
    }
}
