//! Subtitle codec
//!
//! - SubRip parsing into caption records, tolerant or strict
//! - SRT, WebVTT and plain-text serialization

pub mod parser;
pub mod writer;

pub use parser::{
    parse_file_with_options, parse_srt, parse_srt_file, parse_with_options, ParseOptions,
    ParseReport, SkippedBlock,
};
pub use writer::{serialize, serialize_as, SubtitleFormat, SubtitleWriter, WriterConfig};
