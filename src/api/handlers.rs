use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::engine::IngestRequest;
use crate::error::EngineError;

use super::state::AppState;

struct UploadedFile {
    bytes: Vec<u8>,
    title: Option<String>,
    artist: Option<String>,
}

/// Reads a multipart body, requiring a `file` part whose declared content
/// type starts with `audio/`. `artist` is an optional form field; `title`
/// is read here but its non-emptiness is validated by the caller.
async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, EngineError> {
    let mut bytes = None;
    let mut title = None;
    let mut artist = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| EngineError::InvalidInput(e.to_string()))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                let content_type = field.content_type().unwrap_or("").to_string();
                if !content_type.starts_with("audio/") {
                    return Err(EngineError::InvalidInput(format!(
                        "expected audio/* content-type, got {content_type}"
                    )));
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
                bytes = Some(data.to_vec());
            }
            "title" => {
                title = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| EngineError::InvalidInput(e.to_string()))?,
                );
            }
            "artist" => {
                artist = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| EngineError::InvalidInput(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let bytes = bytes.ok_or_else(|| EngineError::InvalidInput("missing file part".to_string()))?;
    Ok(UploadedFile { bytes, title, artist })
}

pub async fn ingest(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, EngineError> {
    let upload = read_upload(multipart).await?;
    let title = upload
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| EngineError::InvalidInput("missing title".to_string()))?
        .to_string();
    let content_hash = sha256::digest(&upload.bytes);

    let job = IngestRequest {
        bytes: upload.bytes,
        title,
        artist: upload.artist,
        content_hash: content_hash.clone(),
    };
    state.queue.enqueue(job)?;

    Ok(Json(json!({
        "message": "ingest accepted",
        "status": "processing",
        "file_hash": content_hash,
    })))
}

#[derive(Serialize)]
struct SongSummary {
    title: String,
    artist: Option<String>,
    confidence: f64,
    aligned_matches: usize,
}

pub async fn recognize(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, EngineError> {
    let upload = read_upload(multipart).await?;
    let result = state.engine.recognize(upload.bytes).await?;

    let body = match result {
        Some(m) => json!({
            "match_found": true,
            "song": SongSummary {
                title: m.title,
                artist: m.artist,
                confidence: m.confidence,
                aligned_matches: m.aligned_matches,
            },
        }),
        None => json!({ "match_found": false }),
    };
    Ok(Json(body))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<Value>, EngineError> {
    let stats = state.engine.stats().await?;
    let average = if stats.track_count > 0 {
        stats.landmark_count as f64 / stats.track_count as f64
    } else {
        0.0
    };

    Ok(Json(json!({
        "total_songs": stats.track_count,
        "total_fingerprints": stats.landmark_count,
        "average_fingerprints_per_song": average,
    })))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
