//! Subtitle writers
//!
//! Serializes caption records into SubRip, WebVTT or bracketed plain text in a
//! single pass. Cue indices are always regenerated (1-based).

use std::fmt::Write as _;
use std::str::FromStr;

use crate::error::{CaptionError, Result};
use crate::timecode::TimecodeStyle;
use crate::types::CaptionRecord;

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubtitleFormat {
    /// SubRip
    Srt,
    /// WebVTT
    Vtt,
    /// `[start - end] text` lines
    Txt,
}

impl SubtitleFormat {
    pub const ALL: [SubtitleFormat; 3] = [
        SubtitleFormat::Srt,
        SubtitleFormat::Vtt,
        SubtitleFormat::Txt,
    ];

    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Vtt => "vtt",
            SubtitleFormat::Txt => "txt",
        }
    }

    /// MIME type for HTTP responses and downloads
    pub fn content_type(&self) -> &'static str {
        match self {
            SubtitleFormat::Srt => "application/x-subrip",
            SubtitleFormat::Vtt => "text/vtt",
            SubtitleFormat::Txt => "text/plain",
        }
    }

    /// `<stem>.<extension>`
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.extension())
    }
}

impl FromStr for SubtitleFormat {
    type Err = CaptionError;

    fn from_str(s: &str) -> Result<Self> {
        let id = s.trim();
        let id = id.strip_prefix('.').unwrap_or(id);
        match id.to_ascii_lowercase().as_str() {
            "srt" => Ok(SubtitleFormat::Srt),
            "vtt" => Ok(SubtitleFormat::Vtt),
            "txt" => Ok(SubtitleFormat::Txt),
            _ => Err(CaptionError::InvalidFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Writer configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterConfig {
    /// Time-code layout for cue timings
    pub timecode: TimecodeStyle,
}

/// Caption serializer
#[derive(Debug, Clone, Default)]
pub struct SubtitleWriter {
    config: WriterConfig,
}

impl SubtitleWriter {
    /// Create a writer with the legacy `MM:SS,mmm` timings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WriterConfig) -> Self {
        Self { config }
    }

    /// Serialize `captions` in `format`
    pub fn write(&self, captions: &[CaptionRecord], format: SubtitleFormat) -> String {
        let mut out = String::new();
        if format == SubtitleFormat::Vtt {
            out.push_str("WEBVTT\n\n");
        }

        let tc = self.config.timecode;
        for (i, caption) in captions.iter().enumerate() {
            let start = tc.format(caption.start);
            let end = tc.format(caption.end);
            // Writing into a String cannot fail.
            let _ = match format {
                SubtitleFormat::Srt | SubtitleFormat::Vtt => write!(
                    out,
                    "{}\n{} --> {}\n{}\n\n",
                    i + 1,
                    start,
                    end,
                    caption.text
                ),
                SubtitleFormat::Txt => writeln!(out, "[{} - {}] {}", start, end, caption.text),
            };
        }

        out
    }
}

/// Serialize with the default writer
pub fn serialize(captions: &[CaptionRecord], format: SubtitleFormat) -> String {
    SubtitleWriter::new().write(captions, format)
}

/// Serialize with a format identifier such as `"srt"`; unknown identifiers fail
pub fn serialize_as(captions: &[CaptionRecord], format: &str) -> Result<String> {
    let format = format.parse::<SubtitleFormat>()?;
    Ok(serialize(captions, format))
}
