//! Caption codec
//!
//! Converts between SubRip text and ordered caption records, and serializes
//! caption records as SRT, WebVTT or plain text. Pure and synchronous: no
//! I/O beyond [`parse_srt_file`], no logging, no shared state.

pub(crate) mod error;
pub(crate) mod subtitle;
pub(crate) mod timecode;
pub(crate) mod types;

#[cfg(test)]
pub(crate) mod tests;

pub use error::{CaptionError, Result, SkipReason};
pub use subtitle::*;
pub use timecode::{format_timecode, format_timecode_full, parse_timecode, TimecodeStyle};
pub use types::{CaptionRecord, CaptionSequence};
