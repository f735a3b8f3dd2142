//! Display-time formatting
//!
//! Track times render as `M:SS` with floor minutes; positions render as a
//! fixed-width 20-segment indicator. Uptime renders as `Xd Yh Zm`.

/// Number of segments in the position indicator.
const BAR_SEGMENTS: u64 = 20;

/// Format a track time in milliseconds as `M:SS`.
///
/// Minutes are not capped at 59; an 80-minute mix renders as `80:00`.
pub fn format_track_time(ms: u64) -> String {
    format!("{}:{:02}", ms / 60_000, (ms / 1000) % 60)
}

/// Render a 20-segment position indicator with a cursor.
///
/// A zero-length duration pins the cursor to the start.
pub fn position_bar(position_ms: u64, duration_ms: u64) -> String {
    let filled = if duration_ms > 0 {
        (position_ms * BAR_SEGMENTS / duration_ms).min(BAR_SEGMENTS)
    } else {
        0
    };
    let trailing = BAR_SEGMENTS - filled;
    format!(
        "{}🔘{}",
        "▬".repeat(filled as usize),
        "▬".repeat(trailing as usize)
    )
}

/// Elapsed/total line for now-playing views: `M:SS <bar> M:SS`.
pub fn progress_line(position_ms: u64, duration_ms: u64) -> String {
    format!(
        "{} {} {}",
        format_track_time(position_ms),
        position_bar(position_ms, duration_ms),
        format_track_time(duration_ms)
    )
}

/// Format process uptime as `Xd Yh Zm`.
pub fn format_uptime(uptime_secs: u64) -> String {
    let minutes = uptime_secs / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    format!("{}d {}h {}m", days, hours % 24, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_time_basic() {
        assert_eq!(format_track_time(0), "0:00");
        assert_eq!(format_track_time(59_000), "0:59");
        assert_eq!(format_track_time(60_000), "1:00");
        assert_eq!(format_track_time(302_000), "5:02");
    }

    #[test]
    fn test_track_time_sub_second_floors() {
        // 1999ms is still 0:01 on screen
        assert_eq!(format_track_time(1_999), "0:01");
    }

    #[test]
    fn test_track_time_long_mix() {
        assert_eq!(format_track_time(80 * 60_000), "80:00");
    }

    #[test]
    fn test_position_bar_endpoints() {
        assert_eq!(position_bar(0, 100_000), format!("🔘{}", "▬".repeat(20)));
        assert_eq!(position_bar(100_000, 100_000), format!("{}🔘", "▬".repeat(20)));
    }

    #[test]
    fn test_position_bar_midpoint() {
        let bar = position_bar(50_000, 100_000);
        assert_eq!(bar, format!("{}🔘{}", "▬".repeat(10), "▬".repeat(10)));
    }

    #[test]
    fn test_position_bar_zero_duration() {
        // Streams with unknown length pin the cursor to the start
        assert_eq!(position_bar(5_000, 0), format!("🔘{}", "▬".repeat(20)));
    }

    #[test]
    fn test_position_bar_overshoot_clamps() {
        assert_eq!(position_bar(120_000, 100_000), format!("{}🔘", "▬".repeat(20)));
    }

    #[test]
    fn test_progress_line() {
        let line = progress_line(61_000, 302_000);
        assert!(line.starts_with("1:01 "));
        assert!(line.ends_with(" 5:02"));
    }

    #[test]
    fn test_uptime_formatting() {
        assert_eq!(format_uptime(0), "0d 0h 0m");
        assert_eq!(format_uptime(61), "0d 0h 1m");
        assert_eq!(format_uptime(3 * 86_400 + 4 * 3600 + 5 * 60), "3d 4h 5m");
    }
}
