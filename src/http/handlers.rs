//! HTTP request handlers
//!
//! Transcription, subtitle parsing and export endpoints, plus health and version.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use caption_lib::{parse_with_options, CaptionSequence, ParseOptions, SkippedBlock, SubtitleFormat};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Result, ServerError};
use crate::state::AppState;

fn default_language() -> String {
    "en".to_string()
}

/// Body of `POST /generate-captions`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub audio_path: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct CaptionsResponse {
    pub captions: CaptionSequence,
}

/// Body of `POST /parse`
#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub content: String,
    /// Overrides `export.strict_parsing`
    #[serde(default)]
    pub strict: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub captions: CaptionSequence,
    pub skipped: Vec<SkippedBlock>,
}

/// Body of `POST /export/{format}`
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub captions: CaptionSequence,
}

/// Turn an extractor rejection into the JSON error shape
fn json_body<T>(state: &AppState, body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value).map_err(|rejection| {
        let err = ServerError::BadRequest(rejection.body_text());
        state.metrics.record_error(err.kind());
        err
    })
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    state.metrics.record_request("/health");
    Json(serde_json::json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Version information endpoint
pub async fn version_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    state.metrics.record_request("/version");
    Json(serde_json::json!({
        "status": "online",
        "version": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at.to_rfc3339(),
        "formats": SubtitleFormat::ALL.iter().map(|f| f.extension()).collect::<Vec<_>>(),
        "transcription_slots": state.transcriber.available_slots(),
    }))
}

/// Run whisper.cpp on a local audio file and return its captions
pub async fn generate_captions(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<CaptionsResponse>> {
    state.metrics.record_request("/generate-captions");
    let request = json_body(&state, body)?;

    tracing::info!(
        audio = %request.audio_path,
        language = %request.language,
        "Caption generation requested"
    );

    // Only requests that pass validation and get a slot count as started.
    let result = match state.transcriber.prepare(&request.audio_path).await {
        Ok(job) => {
            state.metrics.transcription_started();
            let result = job.run(&request.language).await;
            state.metrics.transcription_finished(result.is_ok());
            result
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(report) => {
            state
                .metrics
                .record_parse(report.captions.len(), report.skipped.len());
            for skipped in &report.skipped {
                tracing::warn!(
                    block = skipped.block,
                    reason = %skipped.reason,
                    "Skipped malformed block in whisper output"
                );
            }
            Ok(Json(CaptionsResponse {
                captions: report.captions,
            }))
        }
        Err(e) => {
            let err = ServerError::from(e);
            state.metrics.record_error(err.kind());
            Err(err)
        }
    }
}

/// Parse uploaded SubRip text
pub async fn parse_captions(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<ParseRequest>, JsonRejection>,
) -> Result<Json<ParseResponse>> {
    state.metrics.record_request("/parse");
    let request = json_body(&state, body)?;

    let options = match request.strict {
        Some(strict) => ParseOptions { strict },
        None => state.parse_options(),
    };

    let report = parse_with_options(&request.content, options).map_err(|e| {
        let err = ServerError::from(e);
        state.metrics.record_error(err.kind());
        err
    })?;

    state
        .metrics
        .record_parse(report.captions.len(), report.skipped.len());
    tracing::debug!(
        captions = report.captions.len(),
        skipped = report.skipped.len(),
        "Parsed subtitle upload"
    );

    Ok(Json(ParseResponse {
        captions: report.captions,
        skipped: report.skipped,
    }))
}

/// Serialize captions as a downloadable subtitle file
pub async fn export_captions(
    State(state): State<Arc<AppState>>,
    Path(format): Path<String>,
    body: std::result::Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response> {
    state.metrics.record_request("/export");

    let format = format.parse::<SubtitleFormat>().map_err(|e| {
        let err = ServerError::from(e);
        state.metrics.record_error(err.kind());
        err
    })?;
    let request = json_body(&state, body)?;

    request.captions.validate().map_err(|e| {
        let err = ServerError::from(e);
        state.metrics.record_error(err.kind());
        err
    })?;

    let body = state.writer().write(request.captions.records(), format);
    state.metrics.record_export(format.extension());

    let disposition = format!(
        "attachment; filename=\"{}\"",
        format.file_name(&state.config.export.file_stem)
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&format!("{}; charset=utf-8", format.content_type()))
            .map_err(|e| ServerError::Internal(e.to_string()))?,
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition).map_err(|e| ServerError::Internal(e.to_string()))?,
    );

    Ok((headers, body).into_response())
}
