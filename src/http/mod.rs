//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router with the caption endpoints
//! - Request handlers for transcription, parsing and export
//! - Request logging middleware
//! - CORS middleware

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
