//! Prometheus-compatible metrics endpoint

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::state::AppState;

/// Metrics collector
#[derive(Debug)]
pub struct Metrics {
    /// Server start time
    start_time: Instant,
    /// Total requests processed
    request_count: RwLock<u64>,
    /// Requests by endpoint
    requests_by_endpoint: RwLock<BTreeMap<String, u64>>,
    /// Transcriptions started
    transcriptions_started: RwLock<u64>,
    /// Transcriptions that produced captions
    transcriptions_succeeded: RwLock<u64>,
    /// Transcriptions currently running
    active_transcriptions: RwLock<u64>,
    /// Captions produced by parsing (transcription or upload)
    captions_parsed: RwLock<u64>,
    /// Malformed blocks dropped by the parser
    skipped_blocks: RwLock<u64>,
    /// Exports by format
    exports_by_format: RwLock<BTreeMap<String, u64>>,
    /// Errors by type
    errors_by_type: RwLock<BTreeMap<String, u64>>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            request_count: RwLock::new(0),
            requests_by_endpoint: RwLock::new(BTreeMap::new()),
            transcriptions_started: RwLock::new(0),
            transcriptions_succeeded: RwLock::new(0),
            active_transcriptions: RwLock::new(0),
            captions_parsed: RwLock::new(0),
            skipped_blocks: RwLock::new(0),
            exports_by_format: RwLock::new(BTreeMap::new()),
            errors_by_type: RwLock::new(BTreeMap::new()),
        }
    }

    /// Record a request
    pub fn record_request(&self, endpoint: &str) {
        *self.request_count.write() += 1;
        *self
            .requests_by_endpoint
            .write()
            .entry(endpoint.to_string())
            .or_insert(0) += 1;
    }

    /// Record the start of a transcription
    pub fn transcription_started(&self) {
        *self.transcriptions_started.write() += 1;
        *self.active_transcriptions.write() += 1;
    }

    /// Record the end of a transcription
    pub fn transcription_finished(&self, succeeded: bool) {
        let mut active = self.active_transcriptions.write();
        *active = active.saturating_sub(1);
        if succeeded {
            *self.transcriptions_succeeded.write() += 1;
        }
    }

    /// Record parser output
    pub fn record_parse(&self, captions: usize, skipped: usize) {
        *self.captions_parsed.write() += captions as u64;
        *self.skipped_blocks.write() += skipped as u64;
    }

    /// Record an export
    pub fn record_export(&self, format: &str) {
        *self
            .exports_by_format
            .write()
            .entry(format.to_string())
            .or_insert(0) += 1;
    }

    /// Record error
    pub fn record_error(&self, error_type: &str) {
        *self
            .errors_by_type
            .write()
            .entry(error_type.to_string())
            .or_insert(0) += 1;
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        counter(
            &mut output,
            "caption_server_uptime_seconds",
            "Server uptime in seconds",
            self.uptime_secs(),
        );

        let start = std::time::SystemTime::UNIX_EPOCH
            .elapsed()
            .unwrap_or(Duration::ZERO)
            .as_secs()
            .saturating_sub(self.uptime_secs());
        gauge(
            &mut output,
            "caption_server_start_time_seconds",
            "Server start time as Unix timestamp",
            start,
        );

        // Requests
        counter(
            &mut output,
            "caption_requests_total",
            "Total number of HTTP requests",
            *self.request_count.read(),
        );
        labelled(
            &mut output,
            "caption_requests_by_endpoint",
            "Requests by endpoint",
            "endpoint",
            &self.requests_by_endpoint.read(),
        );

        // Transcription
        counter(
            &mut output,
            "caption_transcriptions_started_total",
            "Transcriptions started",
            *self.transcriptions_started.read(),
        );
        counter(
            &mut output,
            "caption_transcriptions_succeeded_total",
            "Transcriptions that produced captions",
            *self.transcriptions_succeeded.read(),
        );
        gauge(
            &mut output,
            "caption_active_transcriptions",
            "Transcriptions currently running",
            *self.active_transcriptions.read(),
        );

        // Parsing and export
        counter(
            &mut output,
            "caption_captions_parsed_total",
            "Caption records produced by the parser",
            *self.captions_parsed.read(),
        );
        counter(
            &mut output,
            "caption_skipped_blocks_total",
            "Malformed subtitle blocks skipped by the parser",
            *self.skipped_blocks.read(),
        );
        labelled(
            &mut output,
            "caption_exports_total",
            "Exports by format",
            "format",
            &self.exports_by_format.read(),
        );

        // Errors
        labelled(
            &mut output,
            "caption_errors_total",
            "Total errors by type",
            "type",
            &self.errors_by_type.read(),
        );

        output
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn counter(out: &mut String, name: &str, help: &str, value: u64) {
    let _ = write!(
        out,
        "# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n\n"
    );
}

fn gauge(out: &mut String, name: &str, help: &str, value: u64) {
    let _ = write!(
        out,
        "# HELP {name} {help}\n# TYPE {name} gauge\n{name} {value}\n\n"
    );
}

fn labelled(out: &mut String, name: &str, help: &str, label: &str, values: &BTreeMap<String, u64>) {
    let _ = write!(out, "# HELP {name} {help}\n# TYPE {name} counter\n");
    for (key, count) in values {
        let _ = writeln!(out, "{name}{{{label}=\"{key}\"}} {count}");
    }
    out.push('\n');
}

/// Metrics endpoint handler
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    state.metrics.record_request("/metrics");
    let prometheus_output = state.metrics.export_prometheus();

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        prometheus_output,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert!(metrics.uptime_secs() < 2);
    }

    #[test]
    fn test_record_request() {
        let metrics = Metrics::new();
        metrics.record_request("/parse");
        metrics.record_request("/parse");

        assert_eq!(*metrics.request_count.read(), 2);
        assert_eq!(metrics.requests_by_endpoint.read().get("/parse"), Some(&2));
    }

    #[test]
    fn test_transcription_counters() {
        let metrics = Metrics::new();
        metrics.transcription_started();
        metrics.transcription_started();
        metrics.transcription_finished(true);

        assert_eq!(*metrics.transcriptions_started.read(), 2);
        assert_eq!(*metrics.transcriptions_succeeded.read(), 1);
        assert_eq!(*metrics.active_transcriptions.read(), 1);

        metrics.transcription_finished(false);
        metrics.transcription_finished(false);
        assert_eq!(*metrics.active_transcriptions.read(), 0);
    }

    #[test]
    fn test_export_prometheus() {
        let metrics = Metrics::new();
        metrics.record_request("/export/srt");
        metrics.record_export("srt");
        metrics.record_parse(3, 1);

        let output = metrics.export_prometheus();

        assert!(output.contains("caption_requests_total 1"));
        assert!(output.contains("caption_exports_total{format=\"srt\"} 1"));
        assert!(output.contains("caption_captions_parsed_total 3"));
        assert!(output.contains("caption_skipped_blocks_total 1"));
        assert!(output.contains("caption_server_uptime_seconds"));
    }

    #[test]
    fn test_error_recording() {
        let metrics = Metrics::new();
        metrics.record_error("audio_not_found");
        metrics.record_error("audio_not_found");
        metrics.record_error("invalid_format");

        let errors = metrics.errors_by_type.read();
        assert_eq!(errors.get("audio_not_found"), Some(&2));
        assert_eq!(errors.get("invalid_format"), Some(&1));
    }
}
