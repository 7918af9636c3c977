//! Request parameters for the power handler.
//!
//! Also used by `lamplighter test`, so a manual transition from the command
//! line behaves exactly like one requested over HTTP.

use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::common::constants::{DEFAULT_KELVIN, DEFAULT_POWER_TRANSITION};
use crate::device::ColorState;
use crate::device::color::{clamp_kelvin, fraction_from_percent, hue_from_degrees};
use crate::schedule::parse_duration;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("brightness parameter is required")]
    MissingBrightness,

    #[error("unable to parse {name} parameter \"{value}\"")]
    Invalid { name: &'static str, value: String },

    #[error("transition parameter must not be negative")]
    NegativeTransition,
}

/// Target colour and transition from `hue`, `saturation`, `brightness`,
/// `kelvin` and `transition`.
///
/// Colour values are clamped rather than rejected. A bare integer transition
/// is milliseconds; anything else is a duration string such as `1.5s`.
pub fn parse_power_params(
    params: &HashMap<String, String>,
) -> Result<(ColorState, Duration), ParamError> {
    let brightness = match params.get("brightness") {
        Some(raw) => fraction_from_percent(parse_float("brightness", raw)?),
        None => return Err(ParamError::MissingBrightness),
    };

    let hue = match params.get("hue") {
        Some(raw) => hue_from_degrees(parse_float("hue", raw)?),
        None => 0,
    };
    let saturation = match params.get("saturation") {
        Some(raw) => fraction_from_percent(parse_float("saturation", raw)?),
        None => 0,
    };
    let kelvin = match params.get("kelvin") {
        Some(raw) => clamp_kelvin(raw.trim().parse::<i64>().map_err(|_| invalid("kelvin", raw))?),
        None => DEFAULT_KELVIN,
    };

    let transition = match params.get("transition") {
        Some(raw) => parse_transition(raw)?,
        None => DEFAULT_POWER_TRANSITION,
    };

    let color = ColorState {
        hue,
        saturation,
        brightness,
        kelvin,
    };
    Ok((color, transition))
}

fn parse_float(name: &'static str, raw: &str) -> Result<f64, ParamError> {
    raw.trim().parse::<f64>().map_err(|_| invalid(name, raw))
}

fn parse_transition(raw: &str) -> Result<Duration, ParamError> {
    let raw = raw.trim();
    if let Ok(millis) = raw.parse::<i64>() {
        return u64::try_from(millis)
            .map(Duration::from_millis)
            .map_err(|_| ParamError::NegativeTransition);
    }
    parse_duration(raw)
        .map_err(|_| invalid("transition", raw))?
        .to_std()
        .map_err(|_| ParamError::NegativeTransition)
}

fn invalid(name: &'static str, value: &str) -> ParamError {
    ParamError::Invalid {
        name,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_brightness_is_required() {
        let err = parse_power_params(&params(&[("hue", "120")])).unwrap_err();
        assert_eq!(err, ParamError::MissingBrightness);
    }

    #[test]
    fn test_defaults() {
        let (color, transition) = parse_power_params(&params(&[("brightness", "50")])).unwrap();
        assert_eq!(color.hue, 0);
        assert_eq!(color.saturation, 0);
        assert_eq!(color.brightness, 32767);
        assert_eq!(color.kelvin, DEFAULT_KELVIN);
        assert_eq!(transition, Duration::from_secs(2));
    }

    #[test]
    fn test_values_are_clamped() {
        let (color, _) = parse_power_params(&params(&[
            ("brightness", "250"),
            ("hue", "-30"),
            ("saturation", "101"),
            ("kelvin", "100000"),
        ]))
        .unwrap();
        assert_eq!(color.brightness, u16::MAX);
        assert_eq!(color.hue, 0);
        assert_eq!(color.saturation, u16::MAX);
        assert_eq!(color.kelvin, 9000);

        let (color, _) =
            parse_power_params(&params(&[("brightness", "10"), ("kelvin", "1000")])).unwrap();
        assert_eq!(color.kelvin, 1500);
    }

    #[test]
    fn test_bare_integer_transition_is_milliseconds() {
        let (_, transition) =
            parse_power_params(&params(&[("brightness", "10"), ("transition", "1500")])).unwrap();
        assert_eq!(transition, Duration::from_millis(1500));

        let (_, transition) =
            parse_power_params(&params(&[("brightness", "10"), ("transition", "1m30s")])).unwrap();
        assert_eq!(transition, Duration::from_secs(90));
    }

    #[test]
    fn test_invalid_values() {
        let err = parse_power_params(&params(&[("brightness", "bright")])).unwrap_err();
        assert_eq!(err.to_string(), "unable to parse brightness parameter \"bright\"");

        let err =
            parse_power_params(&params(&[("brightness", "10"), ("kelvin", "2700.5")])).unwrap_err();
        assert!(matches!(err, ParamError::Invalid { name: "kelvin", .. }));

        let err = parse_power_params(&params(&[("brightness", "10"), ("transition", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ParamError::Invalid { name: "transition", .. }));

        let err = parse_power_params(&params(&[("brightness", "10"), ("transition", "-5s")]))
            .unwrap_err();
        assert_eq!(err, ParamError::NegativeTransition);

        let err = parse_power_params(&params(&[("brightness", "10"), ("transition", "-500")]))
            .unwrap_err();
        assert_eq!(err, ParamError::NegativeTransition);
    }
}
