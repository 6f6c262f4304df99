//! Persistence abstraction over the `tracks`/`landmarks` tables.
//!
//! [`FingerprintStore`] is implemented twice: [`postgres::PgStore`] for the
//! real service, and [`memory::MemoryStore`] as an in-memory double used in
//! tests that have no Postgres instance to talk to.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod schema;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::landmarks::Landmark;

/// Rows are inserted and looked up in batches of this size, mirroring the
/// original service's batching of both inserts and digest lookups.
pub const BATCH_SIZE: usize = 1000;

/// A stored track, independent of how the backing row is modeled.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: i32,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<i32>,
    pub indexed: bool,
    pub content_hash: String,
}

/// One `(digest, track_id, anchor_time)` landmark joined with its track's
/// display metadata, as returned by a digest lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkRow {
    pub digest: String,
    pub track_id: i32,
    pub anchor_time: i32,
    pub title: String,
    pub artist: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StoreStats {
    pub track_count: i64,
    pub landmark_count: i64,
}

/// Everything the engine needs from a fingerprint database.
///
/// Implementations are expected to be cheaply cloneable handles (a pool, or
/// a shared in-memory map) since the engine holds one behind an `Arc`.
#[async_trait]
pub trait FingerprintStore: Send + Sync {
    /// Looks up a track by its ingest content hash, for idempotent re-ingest.
    async fn find_track_by_content_hash(
        &self,
        content_hash: &str,
    ) -> Result<Option<Track>, EngineError>;

    /// Creates a new, not-yet-indexed track row.
    ///
    /// Returns [`EngineError::StoreConflict`] if `content_hash` already
    /// exists — callers should treat that as "someone else is ingesting
    /// this clip" and fall back to [`Self::find_track_by_content_hash`].
    async fn create_track(
        &self,
        title: &str,
        artist: Option<&str>,
        album: Option<&str>,
        duration: Option<i32>,
        content_hash: &str,
    ) -> Result<Track, EngineError>;

    /// Bulk-inserts landmarks for `track_id`, batching internally and
    /// ignoring duplicate `(digest, track_id, anchor_time)` rows.
    async fn insert_landmarks(
        &self,
        track_id: i32,
        landmarks: &[Landmark],
    ) -> Result<(), EngineError>;

    /// Flips a track's `indexed` flag once all of its landmarks have landed.
    async fn mark_indexed(&self, track_id: i32) -> Result<(), EngineError>;

    /// Looks up every stored landmark whose digest is in `digests`, joined
    /// with its track's title/artist. Batches the `IN (...)` query.
    async fn lookup_by_digests(&self, digests: &[String]) -> Result<Vec<LandmarkRow>, EngineError>;

    /// Coarse counts surfaced by the `/api/stats` endpoint.
    async fn stats(&self) -> Result<StoreStats, EngineError>;
}
