//! The dispatcher loop.
//!
//! A single thread owns every [`Schedule`] and asks each one for its next
//! trigger. When an entry comes due its [`Job`] runs on a fresh thread, so a
//! hung device cannot delay anything else, and the schedule is polled again
//! from the firing time. Schedules are never touched from any other thread,
//! which keeps their retry counters free of locking.

pub mod job;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crate::common::constants::DISPATCHER_MAX_SLEEP;
use crate::device::DeviceTransition;
use crate::schedule::Schedule;
use crate::time_source::TimeSource;

pub use job::Job;

struct Entry {
    schedule: Box<dyn Schedule>,
    job: Arc<Job>,
    /// `None` once the schedule has said "never".
    next: Option<DateTime<Utc>>,
}

/// Upcoming trigger instants of one job.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub job: String,
    pub schedule: String,
    pub triggers: Vec<DateTime<Utc>>,
}

pub struct Dispatcher {
    entries: Vec<Entry>,
    transition: Arc<DeviceTransition>,
    time_source: Arc<dyn TimeSource>,
    timezone: Tz,
}

impl Dispatcher {
    pub fn new(
        transition: Arc<DeviceTransition>,
        time_source: Arc<dyn TimeSource>,
        timezone: Tz,
    ) -> Self {
        Self {
            entries: Vec::new(),
            transition,
            time_source,
            timezone,
        }
    }

    /// Register a job. Its first trigger is computed from the current time.
    pub fn add(&mut self, mut schedule: Box<dyn Schedule>, job: Arc<Job>) {
        let next = schedule.next(self.time_source.now());
        log_next(self.timezone, &job.name, schedule.as_ref(), next);
        self.entries.push(Entry {
            schedule,
            job,
            next,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest pending trigger across all entries.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.entries.iter().filter_map(|entry| entry.next).min()
    }

    /// Run until `running` is cleared.
    ///
    /// Sleeps in slices of at most [`DISPATCHER_MAX_SLEEP`] so a shutdown
    /// request is noticed within a second.
    pub fn run(&mut self, running: &AtomicBool) {
        log_block_start!("Dispatching {} jobs", self.entries.len());

        while running.load(Ordering::SeqCst) {
            let now = self.time_source.now();
            // Workers run detached; the process does not wait for them on exit.
            drop(self.fire_due(now));

            let wait = self
                .next_due()
                .and_then(|due| (due - now).to_std().ok())
                .unwrap_or(DISPATCHER_MAX_SLEEP)
                .min(DISPATCHER_MAX_SLEEP);
            if !wait.is_zero() {
                self.time_source.sleep(wait);
            }
        }

        log_decorated!("Dispatcher stopped");
    }

    /// Start every entry due at or before `now` and poll its schedule again.
    ///
    /// Returns the worker handles so callers can wait for them.
    pub fn fire_due(&mut self, now: DateTime<Utc>) -> Vec<JoinHandle<()>> {
        let mut workers = Vec::new();

        for entry in &mut self.entries {
            let Some(due) = entry.next else {
                continue;
            };
            if due > now {
                continue;
            }

            let job = Arc::clone(&entry.job);
            let transition = Arc::clone(&self.transition);
            let spawned = std::thread::Builder::new()
                .name(format!("job-{}", job.name))
                .spawn(move || job.run(&transition));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => log_error!("{}: could not start worker: {e}", entry.job.name),
            }

            entry.next = entry.schedule.next(now);
            log_next(self.timezone, &entry.job.name, entry.schedule.as_ref(), entry.next);
        }

        workers
    }

    /// The next `count` triggers of every job starting from `from`, without
    /// firing anything.
    ///
    /// Polling advances schedule state, so this is meant for a dispatcher that
    /// will not be run afterwards.
    pub fn preview(&mut self, count: usize, from: DateTime<Utc>) -> Vec<Preview> {
        self.entries
            .iter_mut()
            .map(|entry| Preview {
                job: entry.job.name.clone(),
                schedule: entry.schedule.describe(),
                triggers: upcoming(entry.schedule.as_mut(), count, from),
            })
            .collect()
    }
}

fn log_next(timezone: Tz, name: &str, schedule: &dyn Schedule, next: Option<DateTime<Utc>>) {
    match next {
        Some(at) => log_decorated!(
            "{name} ({}) next at {}",
            schedule.describe(),
            at.with_timezone(&timezone).format("%Y-%m-%d %H:%M:%S %Z")
        ),
        None => log_warning!("{name} ({}) will not fire again", schedule.describe()),
    }
}

/// Walk a schedule forward `count` times from `from`.
///
/// Stops early at "never" or if the schedule fails to move forward.
pub fn upcoming(
    schedule: &mut dyn Schedule,
    count: usize,
    from: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let mut triggers = Vec::with_capacity(count);
    let mut cursor = from;
    while triggers.len() < count {
        match schedule.next(cursor) {
            Some(next) if next > cursor => {
                triggers.push(next);
                cursor = next;
            }
            _ => break,
        }
    }
    triggers
}
