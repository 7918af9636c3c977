//! Small formatting helpers shared by logging, the CLI and the HTTP surface.

use std::path::Path;
use std::time::Duration;

/// Format a duration the way it is written in the configuration file.
///
/// Produces the shortest unit sequence that round-trips through
/// [`crate::schedule::parse_duration`]: `15m`, `1h30m`, `2s`, `500ms`, `0s`.
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    if total_ms == 0 {
        return "0s".to_string();
    }
    if total_ms < 1000 {
        return format!("{total_ms}ms");
    }

    let mut out = String::new();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;

    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if millis > 0 {
        out.push_str(&format!("{seconds}.{millis:03}s"));
    } else if seconds > 0 {
        out.push_str(&format!("{seconds}s"));
    }
    out
}

/// Format a signed offset such as `-1h` or `+30m`.
pub fn format_offset(offset: chrono::Duration) -> String {
    let sign = if offset < chrono::Duration::zero() { "-" } else { "+" };
    let magnitude = offset.abs().to_std().unwrap_or_default();
    format!("{sign}{}", format_duration(magnitude))
}

/// Replace the home directory prefix with `~` for display.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_units() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(2)), "2s");
        assert_eq!(format_duration(Duration::from_secs(15 * 60)), "15m");
        assert_eq!(format_duration(Duration::from_secs(5400)), "1h30m");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
    }

    #[test]
    fn test_format_offset_sign() {
        assert_eq!(format_offset(chrono::Duration::hours(-1)), "-1h");
        assert_eq!(format_offset(chrono::Duration::minutes(30)), "+30m");
        assert_eq!(format_offset(chrono::Duration::zero()), "+0s");
    }
}
