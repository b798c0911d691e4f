//! Configuration file support
//!
//! Loads server configuration from TOML files.

use caption_lib::TimecodeStyle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::{ExportConfig, ServerConfig, WhisperConfig};
use crate::error::{Result, ServerError};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Speech-to-text settings
    pub whisper: Option<WhisperSettings>,
    /// Export settings
    pub export: Option<ExportSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
    /// Limits settings
    pub limits: Option<LimitsSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperSettings {
    /// Path to the whisper.cpp binary
    pub binary_path: PathBuf,
    /// Path to the model file
    pub model_path: PathBuf,
    /// Output directory for generated subtitle files
    pub output_dir: Option<PathBuf>,
    /// Timeout per transcription in seconds
    pub timeout_secs: Option<u64>,
    /// Fallback model language
    pub default_language: Option<String>,
    /// Keep generated subtitle files
    pub keep_output: Option<bool>,
    /// Request language -> model language
    pub languages: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    /// `short` or `full`
    pub timecode: Option<TimecodeStyle>,
    /// Reject malformed subtitle blocks
    pub strict_parsing: Option<bool>,
    /// Download file name without extension
    pub file_stem: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSettings {
    /// Maximum concurrent transcriptions
    pub max_concurrent_jobs: Option<usize>,
    /// Maximum request body size in MB
    pub max_request_size_mb: Option<usize>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let whisper = WhisperConfig::default();
        let export = ExportConfig::default();

        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_enabled: Some(true),
            },
            whisper: Some(WhisperSettings {
                binary_path: whisper.binary_path,
                model_path: whisper.model_path,
                output_dir: Some(whisper.output_dir),
                timeout_secs: Some(whisper.timeout_secs),
                default_language: Some(whisper.default_language),
                keep_output: Some(whisper.keep_output),
                languages: Some(whisper.languages),
            }),
            export: Some(ExportSettings {
                timecode: Some(export.timecode),
                strict_parsing: Some(export.strict_parsing),
                file_stem: Some(export.file_stem),
            }),
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                format: Some("pretty".to_string()),
            }),
            limits: Some(LimitsSettings {
                max_concurrent_jobs: Some(2),
                max_request_size_mb: Some(10),
            }),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();

        let whisper = match self.whisper {
            Some(w) => WhisperConfig {
                binary_path: w.binary_path,
                model_path: w.model_path,
                output_dir: w.output_dir.unwrap_or(defaults.whisper.output_dir),
                timeout_secs: w.timeout_secs.unwrap_or(defaults.whisper.timeout_secs),
                languages: w.languages.unwrap_or(defaults.whisper.languages),
                default_language: w
                    .default_language
                    .unwrap_or(defaults.whisper.default_language),
                keep_output: w.keep_output.unwrap_or(defaults.whisper.keep_output),
            },
            None => defaults.whisper,
        };

        let export = match self.export {
            Some(e) => ExportConfig {
                timecode: e.timecode.unwrap_or(defaults.export.timecode),
                strict_parsing: e.strict_parsing.unwrap_or(defaults.export.strict_parsing),
                file_stem: e.file_stem.unwrap_or(defaults.export.file_stem),
            },
            None => defaults.export,
        };

        ServerConfig {
            host: self.server.host,
            port: self.server.port,
            whisper,
            export,
            cors_enabled: self.server.cors_enabled.unwrap_or(true),
            log_level: self
                .logging
                .as_ref()
                .map(|l| l.level.clone())
                .unwrap_or(defaults.log_level),
            log_format: self
                .logging
                .and_then(|l| l.format)
                .unwrap_or(defaults.log_format),
            max_concurrent_jobs: self
                .limits
                .as_ref()
                .and_then(|l| l.max_concurrent_jobs)
                .unwrap_or(defaults.max_concurrent_jobs),
            max_request_size_mb: self
                .limits
                .as_ref()
                .and_then(|l| l.max_request_size_mb)
                .unwrap_or(defaults.max_request_size_mb),
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    ConfigFile::default_config().to_file(path)
}

/// Load the server configuration.
///
/// A missing file yields the defaults; an unreadable or invalid file is an
/// error so the caller can report it before falling back.
pub fn load_server_config<P: AsRef<Path>>(path: P) -> Result<ServerConfig> {
    if !path.as_ref().exists() {
        return Ok(ServerConfig::default());
    }
    ConfigFile::from_file(path).map(ConfigFile::into_server_config)
}
