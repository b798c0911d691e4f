//! whisper.cpp process runner

use caption_lib::{parse_with_options, ParseOptions, ParseReport};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::{is_supported_audio, TranscribeError};
use crate::config::WhisperConfig;

/// Runs whisper.cpp and parses its subtitle output.
///
/// At most `max_concurrent` transcriptions run at once; further requests are
/// rejected with [`TranscribeError::Busy`] instead of queueing.
#[derive(Debug)]
pub struct Transcriber {
    config: WhisperConfig,
    parse_options: ParseOptions,
    permits: Arc<Semaphore>,
}

impl Transcriber {
    pub fn new(config: WhisperConfig, parse_options: ParseOptions, max_concurrent: usize) -> Self {
        Self {
            config,
            parse_options,
            permits: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Free transcription slots
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// Map a request language to the model language, falling back to the
    /// configured default for unknown identifiers.
    pub fn resolve_language(&self, language: &str) -> String {
        match self.config.model_language(language.trim()) {
            Some(model) => model.to_string(),
            None => {
                tracing::warn!(
                    "Unsupported language {:?}, falling back to {}",
                    language,
                    self.config.default_language
                );
                self.config.default_language.clone()
            }
        }
    }

    /// Validate `audio_path` and claim a transcription slot.
    ///
    /// The slot is held until the returned job is run or dropped.
    pub async fn prepare(&self, audio_path: &str) -> Result<TranscriptionJob<'_>, TranscribeError> {
        let audio = self.check_audio(audio_path).await?;

        let permit = self
            .permits
            .clone()
            .try_acquire_owned()
            .map_err(|_| TranscribeError::Busy)?;

        Ok(TranscriptionJob {
            transcriber: self,
            audio,
            _permit: permit,
        })
    }

    /// Transcribe `audio_path` and return the parsed captions
    pub async fn transcribe(
        &self,
        audio_path: &str,
        language: &str,
    ) -> Result<ParseReport, TranscribeError> {
        self.prepare(audio_path).await?.run(language).await
    }

    async fn check_audio(&self, audio_path: &str) -> Result<PathBuf, TranscribeError> {
        let audio_path = audio_path.trim();
        if audio_path.is_empty() {
            return Err(TranscribeError::EmptyAudioPath);
        }

        let path = PathBuf::from(audio_path);
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(TranscribeError::AudioNotFound(path));
        }
        if !is_supported_audio(&path) {
            return Err(TranscribeError::UnsupportedAudio(path));
        }

        absolute(&path).map_err(|_| TranscribeError::AudioNotFound(path))
    }

    /// `<binary> -m <model> -f <audio> -l <lang> -osrt -of <output_base>`,
    /// run from the binary's directory
    fn build_command(
        &self,
        binary: &Path,
        audio: &Path,
        language: &str,
        output_base: &Path,
    ) -> Result<Command, TranscribeError> {
        let model = absolute(&self.config.model_path).map_err(TranscribeError::Spawn)?;

        let mut command = Command::new(binary);
        command
            .arg("-m")
            .arg(&model)
            .arg("-f")
            .arg(audio)
            .arg("-l")
            .arg(language)
            .arg("-osrt")
            .arg("-of")
            .arg(output_base)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = binary.parent().filter(|d| !d.as_os_str().is_empty()) {
            command.current_dir(dir);
        }

        Ok(command)
    }
}

/// A validated transcription holding one concurrency slot
#[derive(Debug)]
pub struct TranscriptionJob<'a> {
    transcriber: &'a Transcriber,
    audio: PathBuf,
    _permit: OwnedSemaphorePermit,
}

impl TranscriptionJob<'_> {
    /// Run whisper.cpp and parse the subtitle file it writes
    pub async fn run(self, language: &str) -> Result<ParseReport, TranscribeError> {
        let transcriber = self.transcriber;
        let config = &transcriber.config;

        let binary = absolute(&config.binary_path)
            .map_err(|_| TranscribeError::BinaryNotFound(config.binary_path.clone()))?;
        if !tokio::fs::try_exists(&binary).await.unwrap_or(false) {
            return Err(TranscribeError::BinaryNotFound(binary));
        }

        let output_dir = absolute(&config.output_dir).map_err(|source| {
            TranscribeError::OutputDir {
                path: config.output_dir.clone(),
                source,
            }
        })?;
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|source| TranscribeError::OutputDir {
                path: output_dir.clone(),
                source,
            })?;

        let output_base = output_dir.join(format!("captions_{}", uuid::Uuid::new_v4()));
        let output_file = srt_path(&output_base);
        let model_language = transcriber.resolve_language(language);

        let mut command =
            transcriber.build_command(&binary, &self.audio, &model_language, &output_base)?;
        tracing::info!(
            audio = %self.audio.display(),
            language = %model_language,
            "Running whisper: {:?}",
            command.as_std()
        );

        let started = std::time::Instant::now();
        let timeout = config.timeout();
        let output = match tokio::time::timeout(timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                discard(&output_file).await;
                return Err(TranscribeError::Spawn(e));
            }
            // Dropping the future kills the child.
            Err(_) => {
                discard(&output_file).await;
                return Err(TranscribeError::Timeout(timeout));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            // Partial output from a failed run is never parsed.
            discard(&output_file).await;
            return Err(TranscribeError::NonZeroExit {
                code: output.status.code(),
                stderr,
            });
        }

        let content = match tokio::fs::read_to_string(&output_file).await {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("Reading {} failed: {}", output_file.display(), e);
                return Err(TranscribeError::OutputMissing(output_file));
            }
        };

        if !config.keep_output {
            discard(&output_file).await;
        }

        let report = parse_with_options(&content, transcriber.parse_options)
            .map_err(TranscribeError::Parse)?;

        tracing::info!(
            captions = report.captions.len(),
            skipped = report.skipped.len(),
            "Transcription finished in {:?}",
            started.elapsed()
        );

        Ok(report)
    }
}

/// Remove a partial or leftover output file, if any
async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

/// Paths are resolved against the server's working directory before the
/// child changes into the binary's directory.
fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn srt_path(base: &Path) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".srt");
    PathBuf::from(name)
}
