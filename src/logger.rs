//! Structured logging with box-drawing output.
//!
//! Every line lamplighter prints goes through the macros in this module so that
//! daemon output, one-shot command output and file logs share one visual style:
//!
//! ```text
//! ┏ lamplighter v0.4.0 ━━╸
//! ┃
//! ┣ Registered 3 devices
//! ┃   desk: LIFX product 27 (d0:73:d5:01:02:03)
//! ┣[WARNING] porch: echo device: timed out
//! ╹
//! ```
//!
//! ## Conventions
//!
//! - **`log_block_start!`** opens a new conceptual block (startup phases, a job
//!   firing, a schedule being computed). Prints an empty pipe first for spacing.
//! - **`log_decorated!`** continues a block, or stands alone for short status lines.
//! - **`log_indented!`** is for details that belong to the preceding line.
//! - **`log_pipe!`** inserts a spacer before a level-tagged message that starts
//!   a new block. Not for use at the end of a block.
//! - **`log_info!`, `log_warning!`, `log_error!`, `log_critical!`** carry a coloured
//!   `[LEVEL]` tag. `log_debug!` only prints when debug output is enabled.
//! - **`log_version!`** / **`log_end!`** frame the whole run.
//!
//! When timestamps are enabled (the daemon turns them on) each line is prefixed
//! with `[HH:MM:SS]` in the configured calendar timezone.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static TIMESTAMPS_ENABLED: AtomicBool = AtomicBool::new(false);

// Zone used for the timestamp prefix, set once after the config is loaded
static TIMESTAMP_ZONE: OnceLock<chrono_tz::Tz> = OnceLock::new();

// Channel for routing output to a file when --log is active
static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// How a single line is decorated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    /// `┣ message`
    Decorated,
    /// `┃\n┣ message`
    BlockStart,
    /// `┃   message`
    Indented,
    /// `┃`
    Pipe,
    /// `┏ lamplighter vX.Y.Z ━━╸`
    Version,
    /// `╹`
    End,
    /// `┣[LEVEL] message`
    Level(Level),
    /// `┃\n┗[ERROR] message`
    ErrorExit,
}

/// Severity tag for level-prefixed lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
    Debug,
    Critical,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Info => "\x1b[32mINFO\x1b[0m",
            Level::Warning => "\x1b[33mWARNING\x1b[0m",
            Level::Error => "\x1b[31mERROR\x1b[0m",
            Level::Debug => "\x1b[36mDEBUG\x1b[0m",
            Level::Critical => "\x1b[31mCRITICAL\x1b[0m",
        }
    }
}

/// Global switches for the logging macros.
pub struct Log;

impl Log {
    /// Enable or disable all output.
    ///
    /// Tests and quiet commands turn logging off so output does not interfere
    /// with results.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Enable `log_debug!` output (the `--debug` flag).
    pub fn set_debug(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_debug() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Prefix every line with the wall-clock time.
    pub fn set_timestamps(enabled: bool) {
        TIMESTAMPS_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Set the zone timestamps are rendered in. Only the first call takes effect.
    pub fn set_timezone(tz: chrono_tz::Tz) {
        let _ = TIMESTAMP_ZONE.set(tz);
    }

    /// Start file logging to the specified path.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::File::create(&file_path)?;

            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => {
                        file.write_all(text.as_bytes())?;
                    }
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    fn timestamp_prefix() -> String {
        if !TIMESTAMPS_ENABLED.load(Ordering::SeqCst) {
            return String::new();
        }

        let now = chrono::Utc::now();
        match TIMESTAMP_ZONE.get() {
            Some(tz) => format!("[{}] ", now.with_timezone(tz).format("%H:%M:%S")),
            None => format!("[{}] ", now.with_timezone(&chrono::Local).format("%H:%M:%S")),
        }
    }
}

/// Guard for file logging that flushes and joins the writer thread on drop.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Remove ANSI colour sequences (`ESC [ ... m`) from text bound for a file.
fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Render one line. Separated from [`emit`] so formatting can be tested.
fn render(line: Line, prefix: &str, message: &str) -> String {
    match line {
        Line::Decorated => format!("{prefix}┣ {message}\n"),
        Line::BlockStart => format!("{prefix}┃\n{prefix}┣ {message}\n"),
        Line::Indented => format!("{prefix}┃   {message}\n"),
        Line::Pipe => format!("{prefix}┃\n"),
        Line::Version => format!(
            "{prefix}┏ lamplighter v{} ━━╸\n",
            env!("CARGO_PKG_VERSION")
        ),
        Line::End => format!("{prefix}╹\n"),
        Line::Level(level) => format!("{prefix}┣[{}] {message}\n", level.tag()),
        Line::ErrorExit => {
            format!("{prefix}┃\n{prefix}┗[{}] {message}\n", Level::Error.tag())
        }
    }
}

/// Write a line to stdout or the log file. Called by the macros.
pub fn emit(line: Line, message: &str) {
    if !Log::is_enabled() {
        return;
    }
    if line == Line::Level(Level::Debug) && !Log::is_debug() {
        return;
    }

    let text = render(line, &Log::timestamp_prefix(), message);
    if let Some(tx) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Formatted(strip_ansi_codes(&text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

// # Logging Macros

/// Log a decorated message, typically as part of an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => {
        $crate::logger::emit($crate::logger::Line::Decorated, &format!($($arg)+))
    };
}

/// Log an indented detail line.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => {
        $crate::logger::emit($crate::logger::Line::Indented, &format!($($arg)+))
    };
}

/// Log a visual pipe separator for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::logger::emit($crate::logger::Line::Pipe, "")
    };
}

/// Log a block start message, opening a new conceptual block.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => {
        $crate::logger::emit($crate::logger::Line::BlockStart, &format!($($arg)+))
    };
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::logger::emit($crate::logger::Line::Version, "")
    };
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {
        $crate::logger::emit($crate::logger::Line::End, "")
    };
}

/// Log a warning with a yellow tag.
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => {
        $crate::logger::emit(
            $crate::logger::Line::Level($crate::logger::Level::Warning),
            &format!($($arg)+),
        )
    };
}

/// Log an error with a red tag.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => {
        $crate::logger::emit(
            $crate::logger::Line::Level($crate::logger::Level::Error),
            &format!($($arg)+),
        )
    };
}

/// Log an error that terminates the current flow, closing the block with `┗`.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => {
        $crate::logger::emit($crate::logger::Line::ErrorExit, &format!($($arg)+))
    };
}

/// Log an informational message with a green tag.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => {
        $crate::logger::emit(
            $crate::logger::Line::Level($crate::logger::Level::Info),
            &format!($($arg)+),
        )
    };
}

/// Log a debug message. Suppressed unless `--debug` was given.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => {
        $crate::logger::emit(
            $crate::logger::Line::Level($crate::logger::Level::Debug),
            &format!($($arg)+),
        )
    };
}

/// Log a critical message with a red tag.
#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => {
        $crate::logger::emit(
            $crate::logger::Line::Level($crate::logger::Level::Critical),
            &format!($($arg)+),
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi_codes() {
        assert_eq!(strip_ansi_codes("┣[\x1b[33mWARNING\x1b[0m] hi"), "┣[WARNING] hi");
        assert_eq!(strip_ansi_codes("plain"), "plain");
    }

    #[test]
    fn test_render_block_start_prepends_pipe() {
        assert_eq!(render(Line::BlockStart, "", "Loading"), "┃\n┣ Loading\n");
    }

    #[test]
    fn test_render_level_and_prefix() {
        let text = render(Line::Level(Level::Error), "[12:00:00] ", "desk: connect failed");
        assert_eq!(
            strip_ansi_codes(&text),
            "[12:00:00] ┣[ERROR] desk: connect failed\n"
        );
    }

    #[test]
    fn test_render_indented() {
        assert_eq!(render(Line::Indented, "", "detail"), "┃   detail\n");
    }
}
