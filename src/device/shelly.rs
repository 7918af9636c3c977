//! Shelly Gen2 switches over the HTTP RPC interface (`/rpc/<Method>`).

use serde::Deserialize;
use std::time::{Duration, Instant};

use super::{ColorState, Connection, Device, DeviceError, Power, get_json, http_base_url};

#[derive(Debug, Deserialize)]
struct SysConfig {
    device: SysDevice,
}

#[derive(Debug, Deserialize)]
struct SysDevice {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "fw_id", default)]
    firmware: String,
}

#[derive(Debug, Deserialize)]
struct KvsValue {
    value: String,
}

#[derive(Debug, Deserialize)]
struct SwitchStatus {
    output: bool,
}

#[derive(Debug, Deserialize)]
struct SwitchSetResult {
    was_on: bool,
}

pub struct ShellySwitch {
    label: String,
    base_url: String,
    index: u32,
    name: Option<String>,
    firmware: String,
    model: Option<String>,
}

impl ShellySwitch {
    /// Read the system config to confirm the host speaks Gen2 RPC.
    ///
    /// The `model` key in the KVS store is optional and only used for logs.
    pub fn connect(
        label: &str,
        host: &str,
        index: u32,
        deadline: Instant,
    ) -> Result<Self, DeviceError> {
        let base_url = http_base_url(host)?;
        let config: SysConfig = get_json(&rpc_url(&base_url, "Sys.GetConfig"), &[], deadline)?;

        let model = match get_json::<KvsValue>(
            &rpc_url(&base_url, "KVS.Get"),
            &[("key", "model")],
            deadline,
        ) {
            Ok(kvs) => Some(kvs.value),
            Err(e) => {
                log_debug!("{label}: no model in key-value store: {e}");
                None
            }
        };

        Ok(Self {
            label: label.to_string(),
            base_url,
            index,
            name: config.device.name,
            firmware: config.device.firmware,
            model,
        })
    }
}

fn rpc_url(base_url: &str, method: &str) -> String {
    format!("{base_url}/rpc/{method}")
}

impl Device for ShellySwitch {
    fn label(&self) -> &str {
        &self.label
    }

    fn describe(&self) -> String {
        let model = self.model.as_deref().unwrap_or("Shelly");
        match &self.name {
            Some(name) => format!(
                "{model} '{name}' switch {} at {} (firmware {})",
                self.index, self.base_url, self.firmware
            ),
            None => format!(
                "{model} switch {} at {} (firmware {})",
                self.index, self.base_url, self.firmware
            ),
        }
    }

    fn connect(&self, deadline: Instant) -> Result<Box<dyn Connection + '_>, DeviceError> {
        Ok(Box::new(ShellyConnection {
            switch: self,
            id: self.index.to_string(),
            deadline,
        }))
    }
}

struct ShellyConnection<'a> {
    switch: &'a ShellySwitch,
    id: String,
    deadline: Instant,
}

impl ShellyConnection<'_> {
    fn status(&self) -> Result<SwitchStatus, DeviceError> {
        get_json(
            &rpc_url(&self.switch.base_url, "Switch.GetStatus"),
            &[("id", self.id.as_str())],
            self.deadline,
        )
    }
}

impl Connection for ShellyConnection<'_> {
    fn echo(&mut self) -> Result<(), DeviceError> {
        self.status().map(|_| ())
    }

    fn power(&mut self) -> Result<Power, DeviceError> {
        Ok(if self.status()?.output {
            Power::On
        } else {
            Power::Off
        })
    }

    fn color(&mut self) -> Result<ColorState, DeviceError> {
        Ok(match self.power()? {
            Power::On => ColorState::full(),
            Power::Off => ColorState::default(),
        })
    }

    fn set_power(&mut self, power: Power, _duration: Duration) -> Result<(), DeviceError> {
        let on = match power {
            Power::On => "true",
            Power::Off => "false",
        };
        let result: SwitchSetResult = get_json(
            &rpc_url(&self.switch.base_url, "Switch.Set"),
            &[("id", self.id.as_str()), ("on", on)],
            self.deadline,
        )?;
        log_debug!(
            "{}: switch {} was {}",
            self.switch.label,
            self.id,
            if result.was_on { "on" } else { "off" }
        );
        Ok(())
    }

    fn set_color(&mut self, color: ColorState, duration: Duration) -> Result<(), DeviceError> {
        let power = if color.is_off() { Power::Off } else { Power::On };
        self.set_power(power, duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_sys_config() {
        let config: SysConfig = serde_json::from_str(
            r#"{"device":{"name":"Porch","mac":"A8032ABE54DC","fw_id":"20231107-164738/1.0.8-gb6a4bda","discoverable":true,"eco_mode":false},"location":{"tz":"America/New_York","lat":40.7,"lon":-74.0}}"#,
        )
        .unwrap();
        assert_eq!(config.device.name.as_deref(), Some("Porch"));
        assert_eq!(config.device.firmware, "20231107-164738/1.0.8-gb6a4bda");
    }

    #[test]
    fn test_decode_switch_status() {
        let status: SwitchStatus = serde_json::from_str(
            r#"{"id":0,"source":"HTTP_in","output":true,"temperature":{"tC":41.2,"tF":106.2}}"#,
        )
        .unwrap();
        assert!(status.output);

        let result: SwitchSetResult = serde_json::from_str(r#"{"was_on":false}"#).unwrap();
        assert!(!result.was_on);
    }

    #[test]
    fn test_rpc_url() {
        assert_eq!(
            rpc_url("http://10.0.0.4", "Switch.Set"),
            "http://10.0.0.4/rpc/Switch.Set"
        );
    }
}
