//! Geographic location and solar event lookup.
//!
//! The schedule engine never computes sunrise or sunset itself. It asks a
//! [`SolarOracle`] for the two instants of a given calendar date at a given
//! location. Two oracles are provided:
//!
//! - [`AstronomicalOracle`]: computed locally with the `sunrise` crate. Never
//!   touches the network; fails only for invalid coordinates or when the sun does
//!   not rise or set on that date.
//! - [`SunriseSunsetApi`]: queries `api.sunrise-sunset.org` over verified TLS.
//!
//! Which one is used is chosen by `solar_source` in the configuration.

pub mod astronomical;
pub mod sunrise_api;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use astronomical::AstronomicalOracle;
pub use sunrise_api::SunriseSunsetApi;

#[cfg(test)]
mod tests;

/// A point on the globe, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Create a location, rejecting coordinates outside the valid ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, OracleError> {
        let location = Self {
            latitude,
            longitude,
        };
        if location.is_valid() {
            Ok(location)
        } else {
            Err(OracleError::InvalidCoordinates {
                latitude,
                longitude,
            })
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}°, {:.4}°", self.latitude, self.longitude)
    }
}

/// Which of the two daily events a schedule tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolarEvent {
    Sunrise,
    Sunset,
}

impl fmt::Display for SolarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolarEvent::Sunrise => write!(f, "sunrise"),
            SolarEvent::Sunset => write!(f, "sunset"),
        }
    }
}

impl FromStr for SolarEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sunrise" => Ok(SolarEvent::Sunrise),
            "sunset" => Ok(SolarEvent::Sunset),
            other => Err(format!("unknown solar event '{other}'")),
        }
    }
}

/// Sunrise and sunset instants for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolarEvents {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

impl SolarEvents {
    pub fn get(&self, event: SolarEvent) -> DateTime<Utc> {
        match event {
            SolarEvent::Sunrise => self.sunrise,
            SolarEvent::Sunset => self.sunset,
        }
    }
}

/// Failure to obtain solar events. Always treated as transient by the schedule engine.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("invalid coordinates: lat={latitude:.4}, lon={longitude:.4}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("solar events unavailable: {0}")]
    Unavailable(String),

    #[error("sunset request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("response: HTTP {0}")]
    Status(u16),

    #[error("decode response: {0}")]
    Decode(String),
}

/// Source of sunrise/sunset instants.
///
/// Implementations must be safe to share between the dispatcher and the
/// preview command; they carry no per-call state.
#[cfg_attr(test, mockall::automock)]
pub trait SolarOracle: Send + Sync {
    /// Return the sunrise and sunset instants of `date` at `location`.
    fn solar_events(&self, location: &Location, date: NaiveDate)
    -> Result<SolarEvents, OracleError>;
}
