//! Speech-to-text boundary
//!
//! Runs the external whisper.cpp binary on an audio file and parses the
//! SubRip file it writes:
//! - Audio path and extension validation
//! - Configured language mapping with a default fallback
//! - Bounded concurrency, timeout and one error variant per failure

pub mod runner;

use axum::http::StatusCode;
use caption_lib::CaptionError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub use runner::Transcriber;

/// Audio file extensions accepted for transcription
pub const AUDIO_EXTENSIONS: [&str; 5] = ["wav", "mp3", "mpeg", "ogg", "webm"];

/// Transcription failures
#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("Audio path is required")]
    EmptyAudioPath,

    #[error("Audio file not found: {}", .0.display())]
    AudioNotFound(PathBuf),

    #[error("Unsupported audio file: {} (expected one of wav, mp3, mpeg, ogg, webm)", .0.display())]
    UnsupportedAudio(PathBuf),

    #[error("Whisper binary not found at {}", .0.display())]
    BinaryNotFound(PathBuf),

    #[error("Failed to prepare output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start whisper: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Whisper exited with {}: {stderr}", exit_label(*.code))]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("Whisper did not finish within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Caption file not generated: {}", .0.display())]
    OutputMissing(PathBuf),

    #[error("Failed to parse caption file: {0}")]
    Parse(#[source] CaptionError),

    #[error("Too many transcriptions in progress")]
    Busy,
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl TranscribeError {
    pub fn status(&self) -> StatusCode {
        match self {
            TranscribeError::EmptyAudioPath
            | TranscribeError::AudioNotFound(_)
            | TranscribeError::UnsupportedAudio(_) => StatusCode::BAD_REQUEST,
            TranscribeError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            TranscribeError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TranscribeError::EmptyAudioPath => "empty_audio_path",
            TranscribeError::AudioNotFound(_) => "audio_not_found",
            TranscribeError::UnsupportedAudio(_) => "unsupported_audio",
            TranscribeError::BinaryNotFound(_) => "binary_not_found",
            TranscribeError::OutputDir { .. } => "output_dir",
            TranscribeError::Spawn(_) => "spawn",
            TranscribeError::NonZeroExit { .. } => "non_zero_exit",
            TranscribeError::Timeout(_) => "timeout",
            TranscribeError::OutputMissing(_) => "output_missing",
            TranscribeError::Parse(_) => "parse",
            TranscribeError::Busy => "busy",
        }
    }
}

/// True when the file extension is one of [`AUDIO_EXTENSIONS`]
pub fn is_supported_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_audio() {
        assert!(is_supported_audio(Path::new("/tmp/hircus_audio.wav")));
        assert!(is_supported_audio(Path::new("take2.MP3")));
        assert!(is_supported_audio(Path::new("a/b/voice.webm")));
        assert!(!is_supported_audio(Path::new("movie.mp4")));
        assert!(!is_supported_audio(Path::new("noext")));
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            TranscribeError::EmptyAudioPath.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TranscribeError::Timeout(Duration::from_secs(1)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            TranscribeError::BinaryNotFound(PathBuf::from("main")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_exit_message() {
        let err = TranscribeError::NonZeroExit {
            code: Some(3),
            stderr: "model not found".to_string(),
        };
        assert_eq!(err.to_string(), "Whisper exited with status 3: model not found");
    }
}
