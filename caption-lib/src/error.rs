use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Why a cue block was rejected by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer than three lines (index, time range, text)
    TooFewLines,
    /// The second line is not a `HH:MM:SS,mmm --> HH:MM:SS,mmm` range
    BadTimeRange,
    /// The range ends at or before its start
    InvertedRange,
}

impl SkipReason {
    /// Stable identifier, used in diagnostics and JSON output
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::TooFewLines => "too_few_lines",
            SkipReason::BadTimeRange => "bad_time_range",
            SkipReason::InvertedRange => "inverted_range",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the caption codec
#[derive(Error, Debug)]
pub enum CaptionError {
    /// A cue block failed structural or pattern matching (strict parsing only)
    #[error("Malformed cue block #{block}: {reason}")]
    MalformedBlock { block: usize, reason: SkipReason },

    /// The subtitle source could not be read at all
    #[error("Subtitle source unavailable: {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An unrecognized output format identifier
    #[error("Invalid subtitle format: {0:?} (expected srt, vtt or txt)")]
    InvalidFormat(String),

    /// A caption record breaks the start/end/text invariants
    #[error("Invalid caption #{position}: {reason}")]
    InvalidRecord { position: usize, reason: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CaptionError>;
