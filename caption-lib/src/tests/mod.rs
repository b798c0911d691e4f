//! Scenario tests
//!
//! End-to-end checks of the codec against whisper-style subtitle files:
//! - Parsing realistic and damaged inputs
//! - Exporting to every format
//! - File-backed parsing
