//! Pace and display formatting helpers.
//!
//! Paces travel as whole seconds per km; the screens show them as `mm:ss`.

use chrono::{Datelike, NaiveDateTime, Timelike};

/// Parse `"mm:ss"` into seconds. Whitespace anywhere is ignored.
///
/// Returns `None` for anything that is not two integer fields with seconds
/// in `0..=59`.
pub fn pace_string_to_seconds(value: &str) -> Option<u32> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let (min, sec) = compact.split_once(':')?;
    if sec.contains(':') {
        return None;
    }
    let min: u32 = min.parse().ok()?;
    let sec: u32 = sec.parse().ok()?;
    if sec > 59 {
        return None;
    }
    min.checked_mul(60)?.checked_add(sec)
}

/// Format seconds as zero-padded `"mm:ss"`.
pub fn seconds_to_pace_string(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Progressive formatting for a pace text field.
///
/// Keeps at most four digits: `"05"` -> `"05:"`, `"053"` -> `"05:3"`,
/// `"0530"` -> `"05:30"`.
pub fn format_pace_display(value: &str) -> String {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).take(4).collect();
    match digits.len() {
        0 | 1 => digits,
        2 => format!("{}:", digits),
        _ => format!("{}:{}", &digits[..2], &digits[2..]),
    }
}

/// `MM/DD HH:mm` label for a session start time.
pub fn format_start_at(start_at: &NaiveDateTime) -> String {
    format!(
        "{:02}/{:02} {:02}:{:02}",
        start_at.month(),
        start_at.day(),
        start_at.hour(),
        start_at.minute()
    )
}

/// Four-decimal coordinate label, `"-"` when unknown.
pub fn format_coordinate(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "-".to_string(),
    }
}

/// Round a coordinate to the four decimals shown on screen.
pub fn round_coordinate(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
