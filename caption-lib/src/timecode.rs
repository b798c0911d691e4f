//! Time-code conversion
//!
//! `parse_timecode` and `format_timecode` are deliberately not inverses:
//! parsing accepts hours and rounds to the millisecond, formatting emits
//! `MM:SS,mmm` without hours and truncates. `format_timecode_full` is the
//! hour-aware variant selected through [`TimecodeStyle::Full`].

use serde::{Deserialize, Serialize};

/// Time-code layout used when serializing captions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimecodeStyle {
    /// `MM:SS,mmm`, minutes unbounded
    #[default]
    Short,
    /// `HH:MM:SS,mmm`
    Full,
}

impl TimecodeStyle {
    /// Format a seconds value in this style
    pub fn format(&self, seconds: f64) -> String {
        match self {
            TimecodeStyle::Short => format_timecode(seconds),
            TimecodeStyle::Full => format_timecode_full(seconds),
        }
    }
}

/// Convert time-code components to seconds, rounded to millisecond precision
pub fn parse_timecode(hours: u32, minutes: u32, seconds: u32, millis: u32) -> f64 {
    let total_ms = (hours as u64 * 3600 + minutes as u64 * 60 + seconds as u64) * 1000
        + millis as u64;
    total_ms as f64 / 1000.0
}

/// Format seconds as `MM:SS,mmm`, truncating each component
pub fn format_timecode(seconds: f64) -> String {
    let total_ms = truncate_to_millis(seconds);
    let minutes = total_ms / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02},{:03}", minutes, secs, millis)
}

/// Format seconds as `HH:MM:SS,mmm`, truncating each component
pub fn format_timecode_full(seconds: f64) -> String {
    let total_ms = truncate_to_millis(seconds);
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Whole milliseconds in `seconds`, floor semantics.
///
/// The value is first snapped to the microsecond so that binary
/// representation error (59.999 is stored as 59.99899999...) cannot drop a
/// millisecond. Negative and non-finite input yields zero.
fn truncate_to_millis(seconds: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    let micros = (seconds * 1_000_000.0).round() as u64;
    micros / 1000
}
