//! Schedules: when should a job fire next.
//!
//! The dispatcher only knows the [`Schedule`] trait. Two implementations exist:
//! [`SolarSchedule`] for `@sunrise`/`@sunset` expressions with an optional
//! signed offset, and [`CronSchedule`] for everything else.

pub mod calendar;
pub mod duration;
pub mod solar;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use thiserror::Error;

use crate::geo::{Location, SolarEvent, SolarOracle};

pub use calendar::CronSchedule;
pub use duration::parse_duration;
pub use solar::{EngineState, SolarSchedule};

/// Computes the next trigger instant.
///
/// `None` means "never": the dispatcher stops polling the schedule. Taking
/// `&mut self` lets implementations keep retry state between calls.
pub trait Schedule: Send {
    fn next(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>>;

    /// Human-readable form for logs and previews.
    fn describe(&self) -> String;
}

#[derive(Debug, Error)]
pub enum ScheduleParseError {
    #[error("empty schedule expression")]
    Empty,

    #[error("invalid duration \"{input}\": {reason}")]
    InvalidDuration { input: String, reason: String },

    #[error("invalid cron expression \"{expression}\": {reason}")]
    InvalidCron { expression: String, reason: String },
}

/// Everything a schedule needs besides its expression.
#[derive(Clone)]
pub struct ScheduleContext {
    pub location: Location,
    pub timezone: Tz,
    pub oracle: Arc<dyn SolarOracle>,
    pub retry_limit: u32,
}

/// Build a schedule from an expression such as `@sunset -1h` or `30 6 * * *`.
pub fn parse_expression(
    expression: &str,
    ctx: &ScheduleContext,
) -> Result<Box<dyn Schedule>, ScheduleParseError> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Err(ScheduleParseError::Empty);
    }

    let (head, tail) = match trimmed.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (trimmed, ""),
    };

    if let Some(event) = head
        .strip_prefix('@')
        .and_then(|name| name.parse::<SolarEvent>().ok())
    {
        let offset = if tail.is_empty() {
            chrono::Duration::zero()
        } else {
            parse_duration(tail)?
        };
        let schedule = SolarSchedule::new(
            ctx.location,
            event,
            offset,
            ctx.timezone,
            Arc::clone(&ctx.oracle),
        )
        .with_retry_limit(ctx.retry_limit);
        return Ok(Box::new(schedule));
    }

    Ok(Box::new(CronSchedule::parse(trimmed, ctx.timezone)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{MockSolarOracle, SolarEvents};
    use chrono::{NaiveDate, TimeZone};

    fn context() -> ScheduleContext {
        let mut mock = MockSolarOracle::new();
        mock.expect_solar_events().returning(|_, date: NaiveDate| {
            let at = |h| Utc.from_utc_datetime(&date.and_hms_opt(h, 0, 0).unwrap());
            Ok(SolarEvents {
                sunrise: at(6),
                sunset: at(18),
            })
        });
        ScheduleContext {
            location: Location::new(40.7128, -74.0060).unwrap(),
            timezone: Tz::UTC,
            oracle: Arc::new(mock),
            retry_limit: 5,
        }
    }

    #[test]
    fn test_solar_expression_with_offset() {
        let mut schedule = parse_expression("@sunset -1h", &context()).unwrap();
        assert_eq!(schedule.describe(), "@sunset -1h");

        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(
            schedule.next(now),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 17, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_solar_expression_without_offset() {
        let mut schedule = parse_expression("@sunrise", &context()).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(
            schedule.next(now),
            Some(Utc.with_ymd_and_hms(2024, 6, 2, 6, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_solar_expression_compound_offset() {
        let mut schedule = parse_expression("  @sunrise   +1h30m ", &context()).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(
            schedule.next(now),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 7, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_cron_expression() {
        let schedule = parse_expression("0 22 * * *", &context()).unwrap();
        assert_eq!(schedule.describe(), "0 22 * * *");
    }

    #[test]
    fn test_rejects_bad_expressions() {
        assert!(matches!(
            parse_expression("   ", &context()),
            Err(ScheduleParseError::Empty)
        ));
        assert!(matches!(
            parse_expression("@sunset soon", &context()),
            Err(ScheduleParseError::InvalidDuration { .. })
        ));
        assert!(matches!(
            parse_expression("@noon", &context()),
            Err(ScheduleParseError::InvalidCron { .. })
        ));
    }
}
