//! Local sunrise/sunset computation backed by the `sunrise` crate.

use chrono::NaiveDate;
use sunrise::{Coordinates, SolarDay, SolarEvent as SunriseEvent};

use super::{Location, OracleError, SolarEvents, SolarOracle};

/// Computes solar events offline.
///
/// Results are for the standard event definition (upper limb at the horizon,
/// corrected for refraction), in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct AstronomicalOracle;

impl AstronomicalOracle {
    pub fn new() -> Self {
        Self
    }
}

impl SolarOracle for AstronomicalOracle {
    fn solar_events(
        &self,
        location: &Location,
        date: NaiveDate,
    ) -> Result<SolarEvents, OracleError> {
        let coord = Coordinates::new(location.latitude, location.longitude).ok_or(
            OracleError::InvalidCoordinates {
                latitude: location.latitude,
                longitude: location.longitude,
            },
        )?;

        let solar_day = SolarDay::new(coord, date);
        let sunrise = solar_day.event_time(SunriseEvent::Sunrise);
        let sunset = solar_day.event_time(SunriseEvent::Sunset);

        // During polar day or night the algorithm returns instants that drift
        // far away from the requested date instead of failing.
        for (name, instant) in [("sunrise", sunrise), ("sunset", sunset)] {
            let drift = (instant.date_naive() - date).num_days().abs();
            if drift > 1 {
                return Err(OracleError::Unavailable(format!(
                    "no {name} on {date} at {location}"
                )));
            }
        }

        Ok(SolarEvents { sunrise, sunset })
    }
}
