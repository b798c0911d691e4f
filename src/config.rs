//! Server configuration

use caption_lib::TimecodeStyle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Speech-to-text executable configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperConfig {
    /// Path to the whisper.cpp `main` binary
    pub binary_path: PathBuf,

    /// Path to the ggml model file
    pub model_path: PathBuf,

    /// Directory the binary writes its subtitle output into
    pub output_dir: PathBuf,

    /// Maximum run time for one transcription in seconds
    pub timeout_secs: u64,

    /// Request language -> model language
    pub languages: BTreeMap<String, String>,

    /// Model language used for identifiers missing from `languages`
    pub default_language: String,

    /// Keep the generated subtitle file after parsing it
    pub keep_output: bool,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        let languages = [("en", "en"), ("ml", "ml"), ("ml-en", "ml")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            binary_path: PathBuf::from("whisper.cpp/main"),
            model_path: PathBuf::from("whisper.cpp/models/ggml-base.en.bin"),
            output_dir: PathBuf::from("temp"),
            timeout_secs: 600,
            languages,
            default_language: "en".to_string(),
            keep_output: false,
        }
    }
}

impl WhisperConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve a request language to the model language.
    ///
    /// Returns `None` when the identifier is not mapped; callers fall back to
    /// `default_language`.
    pub fn model_language(&self, language: &str) -> Option<&str> {
        self.languages.get(language).map(String::as_str)
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Cue timing layout (`short` = MM:SS,mmm, `full` = HH:MM:SS,mmm)
    pub timecode: TimecodeStyle,

    /// Reject subtitle input containing malformed blocks
    pub strict_parsing: bool,

    /// Download file name without extension
    pub file_stem: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            timecode: TimecodeStyle::Short,
            strict_parsing: false,
            file_stem: "captions".to_string(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Transcription configuration
    pub whisper: WhisperConfig,

    /// Export configuration
    pub export: ExportConfig,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,

    /// Maximum concurrent transcriptions
    pub max_concurrent_jobs: usize,

    /// Maximum request body size in megabytes
    pub max_request_size_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            whisper: WhisperConfig::default(),
            export: ExportConfig::default(),
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            max_concurrent_jobs: 2,
            max_request_size_mb: 10,
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_request_size_bytes(&self) -> usize {
        self.max_request_size_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.whisper.timeout_secs, 600);
        assert_eq!(config.export.timecode, TimecodeStyle::Short);
        assert!(!config.export.strict_parsing);
    }

    #[test]
    fn test_language_table() {
        let whisper = WhisperConfig::default();
        assert_eq!(whisper.model_language("en"), Some("en"));
        assert_eq!(whisper.model_language("ml-en"), Some("ml"));
        assert_eq!(whisper.model_language("fr"), None);
        assert_eq!(whisper.timeout(), Duration::from_secs(600));
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Default::default()
        };
        assert_eq!(config.socket_addr(), "127.0.0.1:8080");
        assert_eq!(config.max_request_size_bytes(), 10 * 1024 * 1024);
    }
}
