//! In-memory device for exercising transitions without a network.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::{ColorState, Connection, Device, DeviceError, Power};

/// One operation observed by a [`FakeDevice`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Echo,
    GetPower,
    GetColor,
    SetPower(Power, Duration),
    SetColor(ColorState, Duration),
}

/// Records every call and keeps a power/colour state like a real bulb.
pub struct FakeDevice {
    label: String,
    calls: Mutex<Vec<Call>>,
    power: Mutex<Power>,
    color: Mutex<ColorState>,
    refuse_connections: bool,
    echo_failures: Mutex<u32>,
    echo_error: fn() -> DeviceError,
    fail_set_power: bool,
}

impl FakeDevice {
    pub fn new(label: &str, power: Power) -> Self {
        let color = match power {
            Power::On => ColorState::full(),
            Power::Off => ColorState::default(),
        };
        Self {
            label: label.to_string(),
            calls: Mutex::new(Vec::new()),
            power: Mutex::new(power),
            color: Mutex::new(color),
            refuse_connections: false,
            echo_failures: Mutex::new(0),
            echo_error: || DeviceError::Timeout("echo".to_string()),
            fail_set_power: false,
        }
    }

    pub fn refuse_connections(mut self) -> Self {
        self.refuse_connections = true;
        self
    }

    /// Fail the next `count` echoes with the error built by `error`.
    pub fn fail_echo_with(mut self, error: fn() -> DeviceError, count: u32) -> Self {
        self.echo_error = error;
        self.echo_failures = Mutex::new(count);
        self
    }

    /// Fail the next `count` echoes with a timeout.
    pub fn time_out_echo(self, count: u32) -> Self {
        self.fail_echo_with(|| DeviceError::Timeout("no echo reply".to_string()), count)
    }

    pub fn fail_set_power(mut self) -> Self {
        self.fail_set_power = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn power(&self) -> Power {
        *lock(&self.power)
    }

    pub fn color(&self) -> ColorState {
        *lock(&self.color)
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl Device for FakeDevice {
    fn label(&self) -> &str {
        &self.label
    }

    fn describe(&self) -> String {
        format!("fake device {}", self.label)
    }

    fn connect(&self, _deadline: Instant) -> Result<Box<dyn Connection + '_>, DeviceError> {
        if self.refuse_connections {
            return Err(DeviceError::Transport("connection refused".to_string()));
        }
        Ok(Box::new(FakeConnection { device: self }))
    }
}

struct FakeConnection<'a> {
    device: &'a FakeDevice,
}

impl Connection for FakeConnection<'_> {
    fn echo(&mut self) -> Result<(), DeviceError> {
        self.device.record(Call::Echo);
        let mut remaining = lock(&self.device.echo_failures);
        if *remaining > 0 {
            *remaining -= 1;
            return Err((self.device.echo_error)());
        }
        Ok(())
    }

    fn power(&mut self) -> Result<Power, DeviceError> {
        self.device.record(Call::GetPower);
        Ok(self.device.power())
    }

    fn color(&mut self) -> Result<ColorState, DeviceError> {
        self.device.record(Call::GetColor);
        Ok(self.device.color())
    }

    fn set_power(&mut self, power: Power, duration: Duration) -> Result<(), DeviceError> {
        self.device.record(Call::SetPower(power, duration));
        if self.device.fail_set_power {
            return Err(DeviceError::Transport(
                "injected set_power failure".to_string(),
            ));
        }
        *lock(&self.device.power) = power;
        Ok(())
    }

    fn set_color(&mut self, color: ColorState, duration: Duration) -> Result<(), DeviceError> {
        self.device.record(Call::SetColor(color, duration));
        *lock(&self.device.color) = color;
        Ok(())
    }
}
