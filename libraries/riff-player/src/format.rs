//! Time display helpers

/// Format seconds as `HH:MM:SS`
///
/// Fractional seconds are truncated and hours wrap at 24, like a time of
/// day. Negative and non-finite inputs render as `00:00:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };

    let hours = (total / 3600) % 24;
    let minutes = (total / 60) % 60;
    let secs = total % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}
