//! sunrise-sunset.org oracle.
//!
//! `GET https://api.sunrise-sunset.org/json?lat=..&lng=..&date=YYYY-MM-DD&formatted=0`
//! returns RFC 3339 instants in UTC. Certificates are verified.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use super::{Location, OracleError, SolarEvents, SolarOracle};
use crate::common::constants::{SOLAR_API_TIMEOUT, SOLAR_API_URL};

#[derive(Debug, Deserialize)]
struct SolarResponse {
    results: SolarData,
    status: String,
}

#[derive(Debug, Deserialize)]
struct SolarData {
    sunrise: DateTime<Utc>,
    sunset: DateTime<Utc>,
}

/// HTTP client for the sunrise-sunset.org API.
pub struct SunriseSunsetApi {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl SunriseSunsetApi {
    pub fn new() -> Result<Self, OracleError> {
        Self::with_base_url(SOLAR_API_URL)
    }

    /// Point the oracle at another endpoint with the same response format.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, OracleError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(SOLAR_API_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn request_url(&self, location: &Location, date: NaiveDate) -> String {
        format!(
            "{}?lat={:.6}&lng={:.6}&date={}&formatted=0",
            self.base_url,
            location.latitude,
            location.longitude,
            date.format("%Y-%m-%d")
        )
    }
}

impl SolarOracle for SunriseSunsetApi {
    fn solar_events(
        &self,
        location: &Location,
        date: NaiveDate,
    ) -> Result<SolarEvents, OracleError> {
        let response = self.client.get(self.request_url(location, date)).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status(status.as_u16()));
        }

        let body: SolarResponse = response
            .json()
            .map_err(|e| OracleError::Decode(e.to_string()))?;
        parse_response(body)
    }
}

fn parse_response(body: SolarResponse) -> Result<SolarEvents, OracleError> {
    if body.status != "OK" {
        return Err(OracleError::Unavailable(format!("api status {}", body.status)));
    }
    Ok(SolarEvents {
        sunrise: body.results.sunrise,
        sunset: body.results.sunset,
    })
}
