//! Clock-time triggers from cron expressions.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

use super::{Schedule, ScheduleParseError};

/// A standard cron expression evaluated in a fixed timezone.
///
/// Five-field expressions (`min hour dom month dow`) are accepted and treated as
/// firing at second zero. Six-field expressions lead with seconds. Descriptors
/// such as `@daily` and `@hourly` are passed through unchanged.
#[derive(Debug)]
pub struct CronSchedule {
    expression: String,
    schedule: ::cron::Schedule,
    timezone: Tz,
}

impl CronSchedule {
    pub fn parse(expression: &str, timezone: Tz) -> Result<Self, ScheduleParseError> {
        let expression = expression.trim().to_string();
        let normalized = normalize(&expression);

        let schedule = ::cron::Schedule::from_str(&normalized).map_err(|e| {
            ScheduleParseError::InvalidCron {
                expression: expression.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            expression,
            schedule,
            timezone,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }
}

fn normalize(expression: &str) -> String {
    if expression.starts_with('@') {
        return expression.to_string();
    }
    if expression.split_whitespace().count() == 5 {
        format!("0 {expression}")
    } else {
        expression.to_string()
    }
}

impl Schedule for CronSchedule {
    fn next(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let local_now = now.with_timezone(&self.timezone);
        self.schedule
            .after(&local_now)
            .next()
            .map(|next| next.with_timezone(&Utc))
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}
