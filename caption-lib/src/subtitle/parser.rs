//! SubRip parser
//!
//! Turns the text of a numbered-cue subtitle file into a [`CaptionSequence`].
//! Malformed blocks are skipped by default and reported in the
//! [`ParseReport`]; strict parsing turns the first one into an error.

use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{CaptionError, Result, SkipReason};
use crate::timecode::parse_timecode;
use crate::types::{CaptionRecord, CaptionSequence};

/// Parser policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Fail on the first malformed block instead of skipping it
    pub strict: bool,
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// A block the parser dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkippedBlock {
    /// 1-based position among the non-empty blocks of the input
    pub block: usize,
    pub reason: SkipReason,
}

/// Parser output with diagnostics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    pub captions: CaptionSequence,
    pub skipped: Vec<SkippedBlock>,
}

fn block_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("valid block separator pattern"))
}

fn time_range() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"([0-9]{2}):([0-9]{2}):([0-9]{2}),([0-9]{3})\s*-->\s*([0-9]{2}):([0-9]{2}):([0-9]{2}),([0-9]{3})",
        )
            .expect("valid time range pattern")
    })
}

/// Parse subtitle text, skipping malformed blocks
pub fn parse_srt(content: &str) -> CaptionSequence {
    // Tolerant parsing has no failure path.
    match parse_with_options(content, ParseOptions::default()) {
        Ok(report) => report.captions,
        Err(_) => CaptionSequence::new(),
    }
}

/// Parse subtitle text under the given policy
pub fn parse_with_options(content: &str, options: ParseOptions) -> Result<ParseReport> {
    let mut report = ParseReport::default();

    let blocks = block_separator()
        .split(content)
        .map(str::trim)
        .filter(|block| !block.is_empty());

    for (i, block) in blocks.enumerate() {
        let position = i + 1;
        match parse_block(block) {
            Ok(record) => report.captions.push(record),
            Err(reason) if options.strict => {
                return Err(CaptionError::MalformedBlock {
                    block: position,
                    reason,
                });
            }
            Err(reason) => report.skipped.push(SkippedBlock {
                block: position,
                reason,
            }),
        }
    }

    Ok(report)
}

/// Read and parse a subtitle file, skipping malformed blocks
pub fn parse_srt_file<P: AsRef<Path>>(path: P) -> Result<CaptionSequence> {
    parse_file_with_options(path, ParseOptions::default()).map(|report| report.captions)
}

/// Read and parse a subtitle file under the given policy
pub fn parse_file_with_options<P: AsRef<Path>>(
    path: P,
    options: ParseOptions,
) -> Result<ParseReport> {
    let path = path.as_ref();
    let content =
        std::fs::read_to_string(path).map_err(|source| CaptionError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
    parse_with_options(&content, options)
}

fn parse_block(block: &str) -> std::result::Result<CaptionRecord, SkipReason> {
    let lines: Vec<&str> = block.lines().map(str::trim).collect();
    if lines.len() < 3 {
        return Err(SkipReason::TooFewLines);
    }

    let caps = time_range()
        .captures(lines[1])
        .ok_or(SkipReason::BadTimeRange)?;

    let field = |i: usize| {
        caps[i]
            .parse::<u32>()
            .map_err(|_| SkipReason::BadTimeRange)
    };
    let start = parse_timecode(field(1)?, field(2)?, field(3)?, field(4)?);
    let end = parse_timecode(field(5)?, field(6)?, field(7)?, field(8)?);
    if end <= start {
        return Err(SkipReason::InvertedRange);
    }

    let text = lines[2..].join(" ").trim().to_string();

    Ok(CaptionRecord::new(start, end, text))
}
