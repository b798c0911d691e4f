//! Application state management
//!
//! This module defines the AppState structure that holds:
//! - Server configuration
//! - The whisper.cpp transcriber and its concurrency limit
//! - Request metrics

use caption_lib::{ParseOptions, SubtitleWriter, WriterConfig};
use chrono::{DateTime, Utc};

use crate::config::ServerConfig;
use crate::metrics::Metrics;
use crate::transcribe::Transcriber;

/// Application state shared across all handlers
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,

    /// Speech-to-text runner
    pub transcriber: Transcriber,

    /// Metrics collector
    pub metrics: Metrics,

    /// Server start time
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let transcriber = Transcriber::new(
            config.whisper.clone(),
            parse_options(&config),
            config.max_concurrent_jobs,
        );

        Self {
            config,
            transcriber,
            metrics: Metrics::new(),
            started_at: Utc::now(),
        }
    }

    /// Parser policy for subtitle input
    pub fn parse_options(&self) -> ParseOptions {
        parse_options(&self.config)
    }

    /// Serializer for exports
    pub fn writer(&self) -> SubtitleWriter {
        SubtitleWriter::with_config(WriterConfig {
            timecode: self.config.export.timecode,
        })
    }
}

fn parse_options(config: &ServerConfig) -> ParseOptions {
    ParseOptions {
        strict: config.export.strict_parsing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caption_lib::{CaptionRecord, SubtitleFormat, TimecodeStyle};

    #[test]
    fn test_app_state_creation() {
        let state = AppState::new(ServerConfig::default());
        assert_eq!(state.config.port, 3000);
        assert!(!state.parse_options().strict);
        assert_eq!(state.transcriber.available_slots(), 2);
    }

    #[test]
    fn test_writer_follows_config() {
        let mut config = ServerConfig::default();
        config.export.timecode = TimecodeStyle::Full;
        let state = AppState::new(config);

        let out = state.writer().write(
            &[CaptionRecord::new(3723.5, 3724.0, "late")],
            SubtitleFormat::Txt,
        );
        assert_eq!(out, "[01:02:03,500 - 01:02:04,000] late\n");
    }
}
