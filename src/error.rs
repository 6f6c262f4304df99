//! Typed errors for the HTTP boundary (`SPEC_FULL.md` §7).
//!
//! Internal plumbing (CLI utilities, the microphone capture path) still
//! returns `anyhow::Result` where no caller needs to branch on a specific
//! failure kind; only errors that change engine/HTTP behavior get a variant
//! here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Audio bytes were unrecognized or the stream was truncated.
    #[error("could not decode audio: {0}")]
    Decode(String),

    /// Decoding succeeded but produced zero samples.
    #[error("decoded audio is empty")]
    EmptyAudio,

    /// Transient fingerprint store failure (pool exhaustion, connection
    /// error, query error).
    #[error("fingerprint store unavailable: {0}")]
    StoreUnavailable(String),

    /// A unique-violation on `content_hash` raced us during ingest; treated
    /// as idempotent success by callers.
    #[error("track already exists")]
    StoreConflict,

    /// Bad request: wrong content-type, missing form fields.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The bounded ingest queue has no capacity left.
    #[error("ingest queue is full")]
    QueueFull,

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            EngineError::Decode(_) | EngineError::EmptyAudio => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            EngineError::StoreUnavailable(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            EngineError::StoreConflict => (StatusCode::OK, self.to_string()),
            EngineError::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            EngineError::QueueFull => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            EngineError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
