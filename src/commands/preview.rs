//! `lamplighter preview`: list upcoming triggers without contacting devices.
//!
//! Uses the configured solar source, so with `solar_source = "api"` this does
//! make HTTP requests to the oracle.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::config::{self, Config};
use crate::core::upcoming;
use crate::lamplighter::{job_name, schedule_context};
use crate::logger::Log;
use crate::schedule::parse_expression;

pub fn handle_preview_command(count: usize, debug_enabled: bool) -> Result<()> {
    log_version!();
    Log::set_debug(debug_enabled);

    let config = config::load()?;
    let timezone = config.timezone()?;

    for (name, schedule, triggers) in preview(&config, count, Utc::now())? {
        log_block_start!("{name}: {schedule}");
        if triggers.is_empty() {
            log_indented!("never");
        }
        for at in triggers {
            log_indented!(
                "{}",
                at.with_timezone(&timezone).format("%a %Y-%m-%d %H:%M:%S %Z")
            );
        }
    }
    log_end!();
    Ok(())
}

/// `(job name, schedule, triggers)` for every configured job.
pub fn preview(
    config: &Config,
    count: usize,
    from: DateTime<Utc>,
) -> Result<Vec<(String, String, Vec<DateTime<Utc>>)>> {
    let ctx = schedule_context(config)?;
    config
        .jobs
        .iter()
        .enumerate()
        .map(|(index, job)| {
            let name = job_name(index, &job.device);
            let mut schedule = parse_expression(&job.schedule, &ctx)
                .with_context(|| format!("{name}: schedule \"{}\"", job.schedule))?;
            let triggers = upcoming(schedule.as_mut(), count, from);
            Ok((name, schedule.describe(), triggers))
        })
        .collect()
}

pub fn display_help() {
    log_version!();
    log_block_start!("preview - List upcoming trigger times");
    log_block_start!("Usage: lamplighter preview [COUNT]");
    log_block_start!("Arguments:");
    log_indented!("COUNT  Triggers to show per job (default 5)");
    log_block_start!("Description:");
    log_indented!("Computes the next trigger times of every configured job in the");
    log_indented!("configured timezone. Devices are not contacted.");
    log_block_start!("Examples:");
    log_indented!("lamplighter preview");
    log_indented!("lamplighter preview 14");
    log_end!();
}
