//! Triggers anchored to sunrise or sunset.
//!
//! A [`SolarSchedule`] answers "when is the next trigger after `now`" for a
//! daily solar event shifted by a signed offset. Dates handed to the oracle are
//! calendar dates in the configured timezone; the instants that come back are
//! absolute, so DST shifts move the trigger with the sun rather than the clock.
//!
//! Oracle failures are counted per schedule. While the count is below the retry
//! limit the schedule asks to be polled again one minute later. Once the limit
//! is reached the schedule is disabled and returns `None` forever, without
//! consulting the oracle again.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::sync::Arc;

use super::Schedule;
use crate::common::constants::{DEFAULT_RETRY_LIMIT, ORACLE_RETRY_BACKOFF_SECS};
use crate::common::utils::format_offset;
use crate::geo::{Location, OracleError, SolarEvent, SolarOracle};

/// Health of a solar schedule, derived from its failure counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No outstanding oracle failures.
    Healthy,
    /// Some failures, still retrying every minute.
    Degraded,
    /// Retry limit reached. Terminal until restart.
    Disabled,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Healthy => write!(f, "healthy"),
            EngineState::Degraded => write!(f, "degraded"),
            EngineState::Disabled => write!(f, "disabled"),
        }
    }
}

pub struct SolarSchedule {
    location: Location,
    event: SolarEvent,
    offset: Duration,
    timezone: Tz,
    oracle: Arc<dyn SolarOracle>,
    retry_limit: u32,
    failure_count: u32,
}

impl SolarSchedule {
    pub fn new(
        location: Location,
        event: SolarEvent,
        offset: Duration,
        timezone: Tz,
        oracle: Arc<dyn SolarOracle>,
    ) -> Self {
        Self {
            location,
            event,
            offset,
            timezone,
            oracle,
            retry_limit: DEFAULT_RETRY_LIMIT,
            failure_count: 0,
        }
    }

    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    pub fn event(&self) -> SolarEvent {
        self.event
    }

    pub fn offset(&self) -> Duration {
        self.offset
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn state(&self) -> EngineState {
        match self.failure_count {
            0 => EngineState::Healthy,
            n if n < self.retry_limit => EngineState::Degraded,
            _ => EngineState::Disabled,
        }
    }

    /// First calendar date worth asking the oracle about.
    ///
    /// Offsets under a day start at `now`'s own date. Each whole day of
    /// positive offset moves the start one date back.
    fn first_candidate_date(&self, now: DateTime<Utc>) -> NaiveDate {
        let today = now.with_timezone(&self.timezone).date_naive();
        let lead_days = self.offset.max(Duration::zero()).num_days();
        today
            .checked_sub_signed(Duration::days(lead_days))
            .unwrap_or(today)
    }

    fn record_failure(
        &mut self,
        now: DateTime<Utc>,
        err: &OracleError,
    ) -> Option<DateTime<Utc>> {
        self.failure_count += 1;
        log_warning!(
            "get {}: {err} (failure {}/{})",
            self.event,
            self.failure_count,
            self.retry_limit
        );
        Some(now + Duration::seconds(ORACLE_RETRY_BACKOFF_SECS))
    }
}

impl Schedule for SolarSchedule {
    fn next(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.failure_count >= self.retry_limit {
            log_debug!("{} is disabled after {} failures", self, self.failure_count);
            return None;
        }

        let mut date = self.first_candidate_date(now);
        let max_steps = ceil_days(self.offset.abs()) + 2;

        for _ in 0..max_steps {
            let events = match self.oracle.solar_events(&self.location, date) {
                Ok(events) => events,
                Err(e) => return self.record_failure(now, &e),
            };

            let candidate = events.get(self.event) + self.offset;
            if candidate > now {
                if self.failure_count > 0 {
                    log_info!("{} recovered after {} failures", self, self.failure_count);
                }
                self.failure_count = 0;
                log_debug!(
                    "next {} {}: {}",
                    self.event,
                    format_offset(self.offset),
                    candidate.with_timezone(&self.timezone).to_rfc3339()
                );
                return Some(candidate);
            }

            date = date.succ_opt()?;
        }

        // Only reachable when the oracle reports events that do not advance with the date.
        let err = OracleError::Unavailable(format!("no {} after {now}", self.event));
        self.record_failure(now, &err)
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SolarSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.offset.is_zero() {
            write!(f, "@{}", self.event)
        } else {
            write!(f, "@{} {}", self.event, format_offset(self.offset))
        }
    }
}

/// Whole days needed to cover a non-negative duration, rounded up.
fn ceil_days(duration: Duration) -> i64 {
    let whole = duration.num_days();
    if duration > Duration::days(whole) {
        whole + 1
    } else {
        whole
    }
}
