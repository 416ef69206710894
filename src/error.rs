//! Error types for the wellness engine

use thiserror::Error;

/// Errors that can occur while computing baselines, scanning or selecting
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Mood score out of range (expected 1-5): {0}")]
    InvalidMood(i64),

    #[error("Invalid baseline window: {0}")]
    InvalidWindow(String),

    #[error("Intervention catalog is empty")]
    EmptyCatalog,

    #[error("Invalid intervention catalog: {0}")]
    InvalidCatalog(String),

    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
