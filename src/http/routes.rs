//! Axum router configuration

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::metrics::metrics_handler;
use crate::state::AppState;

use super::handlers::{
    export_captions, generate_captions, health_check, parse_captions, version_check,
};
use super::middleware::request_logger;

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_request_size_bytes();
    let cors_enabled = state.config.cors_enabled;

    let router = Router::new()
        // Health and version endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        .route("/metrics", get(metrics_handler))
        // Captions
        .route("/generate-captions", post(generate_captions))
        .route("/parse", post(parse_captions))
        .route("/export/{format}", post(export_captions))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http());

    let router = if cors_enabled {
        // The panel and the demo web app call from other origins.
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::ORIGIN])
            .expose_headers([header::CONTENT_DISPOSITION])
            .max_age(Duration::from_secs(3600));
        router.layer(cors)
    } else {
        router
    };

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use tower::util::ServiceExt;

    fn app() -> Router {
        create_router(Arc::new(AppState::new(ServerConfig::default())))
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    const DAMAGED: &str = "1\n00:00:01,000 --> 00:00:02,000\nFirst\n\n\
                           2\nno timing here\nLost\n\n\
                           3\n00:00:05,000 --> 00:00:06,000\nThird\nline two\n";

    #[tokio::test]
    async fn test_health() {
        let response = app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "OK");
        assert!(json["timestamp"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_version() {
        let response = app().oneshot(get("/version")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "online");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(json["formats"], serde_json::json!(["srt", "vtt", "txt"]));
    }

    #[tokio::test]
    async fn test_parse_reports_skipped_blocks() {
        let response = app()
            .oneshot(post_json("/parse", serde_json::json!({ "content": DAMAGED })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(
            json["captions"],
            serde_json::json!([
                { "start": 1.0, "end": 2.0, "text": "First" },
                { "start": 5.0, "end": 6.0, "text": "Third line two" },
            ])
        );
        assert_eq!(
            json["skipped"],
            serde_json::json!([{ "block": 2, "reason": "bad_time_range" }])
        );
    }

    #[tokio::test]
    async fn test_parse_strict_rejects() {
        let response = app()
            .oneshot(post_json(
                "/parse",
                serde_json::json!({ "content": DAMAGED, "strict": true }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("#2"));
    }

    #[tokio::test]
    async fn test_export_srt() {
        let response = app()
            .oneshot(post_json(
                "/export/srt",
                serde_json::json!({ "captions": [{ "start": 1.5, "end": 4.25, "text": "Hi" }] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/x-subrip; charset=utf-8"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"captions.srt\""
        );
        assert_eq!(body_text(response).await, "1\n00:01,500 --> 00:04,250\nHi\n\n");
    }

    #[tokio::test]
    async fn test_export_empty_vtt() {
        let response = app()
            .oneshot(post_json("/export/VTT", serde_json::json!({ "captions": [] })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "WEBVTT\n\n");
    }

    #[tokio::test]
    async fn test_export_unknown_format() {
        let response = app()
            .oneshot(post_json("/export/docx", serde_json::json!({ "captions": [] })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("docx"));
    }

    #[tokio::test]
    async fn test_export_rejects_inverted_caption() {
        let response = app()
            .oneshot(post_json(
                "/export/txt",
                serde_json::json!({ "captions": [{ "start": 4.0, "end": 2.0, "text": "Back" }] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generate_requires_audio_path() {
        let response = app()
            .oneshot(post_json(
                "/generate-captions",
                serde_json::json!({ "language": "en" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Audio path is required");
    }

    #[tokio::test]
    async fn test_generate_missing_audio() {
        let response = app()
            .oneshot(post_json(
                "/generate-captions",
                serde_json::json!({ "audioPath": "/definitely/not/here.wav", "language": "en" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().starts_with("Audio file not found"));
    }

    #[tokio::test]
    async fn test_generate_busy() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("clip.wav");
        std::fs::write(&audio, b"RIFF").unwrap();

        let config = ServerConfig {
            max_concurrent_jobs: 0,
            ..Default::default()
        };
        let app = create_router(Arc::new(AppState::new(config)));

        let response = app
            .oneshot(post_json(
                "/generate-captions",
                serde_json::json!({ "audioPath": audio, "language": "en" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_rejected_generation_not_counted_as_started() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("clip.wav");
        std::fs::write(&audio, b"RIFF").unwrap();

        let config = ServerConfig {
            max_concurrent_jobs: 0,
            ..Default::default()
        };
        let app = create_router(Arc::new(AppState::new(config)));

        for body in [
            serde_json::json!({ "language": "en" }),
            serde_json::json!({ "audioPath": "/definitely/not/here.wav" }),
            serde_json::json!({ "audioPath": audio }),
        ] {
            let response = app
                .clone()
                .oneshot(post_json("/generate-captions", body))
                .await
                .unwrap();
            assert!(!response.status().is_success());
        }

        let text = body_text(app.oneshot(get("/metrics")).await.unwrap()).await;
        assert!(text.contains("caption_transcriptions_started_total 0"));
        assert!(text.contains("caption_active_transcriptions 0"));
        assert!(text.contains("caption_errors_total{type=\"busy\"} 1"));
        assert!(text.contains("caption_errors_total{type=\"empty_audio_path\"} 1"));
        assert!(text.contains("caption_errors_total{type=\"audio_not_found\"} 1"));
    }

    #[tokio::test]
    async fn test_malformed_json_body() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/parse")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"content\": "))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_metrics_after_requests() {
        let app = app();
        app.clone()
            .oneshot(post_json("/export/srt", serde_json::json!({ "captions": [] })))
            .await
            .unwrap();
        app.clone()
            .oneshot(post_json("/export/pdf", serde_json::json!({ "captions": [] })))
            .await
            .unwrap();

        let response = app.oneshot(get("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains("caption_exports_total{format=\"srt\"} 1"));
        assert!(text.contains("caption_errors_total{type=\"invalid_format\"} 1"));
        assert!(text.contains("caption_requests_by_endpoint{endpoint=\"/export\"} 2"));
    }

    #[tokio::test]
    async fn test_cors_options() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/parse")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("POST"));
    }

    #[tokio::test]
    async fn test_cors_disabled() {
        let config = ServerConfig {
            cors_enabled: false,
            ..Default::default()
        };
        let app = create_router(Arc::new(AppState::new(config)));
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
