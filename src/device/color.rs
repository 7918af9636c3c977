//! HSBK colour values and conversions from human units.

use crate::common::constants::{
    DEFAULT_KELVIN, MAXIMUM_HUE_DEGREES, MAXIMUM_KELVIN, MAXIMUM_PERCENT, MINIMUM_KELVIN,
};

/// Hue, saturation and brightness as fractions of the 16-bit range, plus a colour
/// temperature in Kelvin. Brightness 0 means off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorState {
    pub hue: u16,
    pub saturation: u16,
    pub brightness: u16,
    pub kelvin: u16,
}

impl Default for ColorState {
    fn default() -> Self {
        Self {
            hue: 0,
            saturation: 0,
            brightness: 0,
            kelvin: DEFAULT_KELVIN,
        }
    }
}

impl ColorState {
    /// Build a colour from degrees, percentages and Kelvin.
    ///
    /// Out-of-range values are clamped, never rejected.
    pub fn from_human(hue: f64, saturation: f64, brightness: f64, kelvin: i64) -> Self {
        Self {
            hue: hue_from_degrees(hue),
            saturation: fraction_from_percent(saturation),
            brightness: fraction_from_percent(brightness),
            kelvin: clamp_kelvin(kelvin),
        }
    }

    /// Neutral white at full brightness.
    pub fn full() -> Self {
        Self {
            brightness: u16::MAX,
            ..Self::default()
        }
    }

    pub fn with_brightness(self, brightness: u16) -> Self {
        Self { brightness, ..self }
    }

    pub fn is_off(&self) -> bool {
        self.brightness == 0
    }

    pub fn hue_degrees(&self) -> f64 {
        f64::from(self.hue) * MAXIMUM_HUE_DEGREES / 65536.0
    }

    pub fn saturation_percent(&self) -> f64 {
        percent_from_fraction(self.saturation)
    }

    pub fn brightness_percent(&self) -> f64 {
        percent_from_fraction(self.brightness)
    }
}

/// Degrees to the 16-bit hue domain. 360° is the same angle as 0°.
pub fn hue_from_degrees(degrees: f64) -> u16 {
    let degrees = clamp_f64(degrees, 0.0, MAXIMUM_HUE_DEGREES);
    let scaled = (degrees / MAXIMUM_HUE_DEGREES * 65536.0).floor() as u32;
    (scaled % 65536) as u16
}

pub fn fraction_from_percent(percent: f64) -> u16 {
    let percent = clamp_f64(percent, 0.0, MAXIMUM_PERCENT);
    (percent / MAXIMUM_PERCENT * f64::from(u16::MAX)).floor() as u16
}

pub fn percent_from_fraction(value: u16) -> f64 {
    f64::from(value) / f64::from(u16::MAX) * MAXIMUM_PERCENT
}

pub fn clamp_kelvin(kelvin: i64) -> u16 {
    kelvin.clamp(i64::from(MINIMUM_KELVIN), i64::from(MAXIMUM_KELVIN)) as u16
}

fn clamp_f64(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}
