//! Shutdown signal handling.
//!
//! SIGINT, SIGTERM and SIGHUP all mean "stop": the dispatcher finishes its
//! current sleep slice and the HTTP server drains. Transitions already running
//! are not interrupted.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

/// Signal handling state shared between threads
pub struct SignalState {
    /// Cleared once a shutdown signal arrives
    pub running: Arc<AtomicBool>,
}

/// Register the handlers and watch for signals on a background thread.
pub fn setup_signal_handler() -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));

    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("failed to register signal handlers")?;

    let running_clone = running.clone();
    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            // One signal is enough; the loop exits and the thread ends.
            if let Some(sig) = signals.forever().next() {
                log_pipe!();
                log_info!("Received {}, shutting down", signal_name(sig));
                running_clone.store(false, Ordering::SeqCst);
            }
        })
        .context("failed to start signal thread")?;

    Ok(SignalState { running })
}

fn signal_name(sig: i32) -> &'static str {
    match sig {
        SIGINT => "SIGINT",
        SIGTERM => "SIGTERM",
        SIGHUP => "SIGHUP",
        _ => "signal",
    }
}
