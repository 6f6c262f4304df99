//! Postgres-backed [`FingerprintStore`], using a pooled connection per
//! request and offloading every Diesel call to the blocking pool.
//!
//! Grounded on the teacher's `db/connector.rs` (pool setup, joined lookup
//! query) and its `db/bindings.rs` (row structs), generalized from a
//! bespoke hash-bucket scheme to the fixed `tracks`/`landmarks` schema. The
//! digest lookup join uses diesel's query builder (`inner_join` +
//! `select`) rather than the teacher's raw SQL, since the query is a
//! straightforward two-table join with no dynamic SQL to hand-assemble.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::EngineError;
use crate::landmarks::Landmark;

use super::models::{NewLandmark, NewTrack, TrackRow};
use super::schema::{landmarks, tracks};
use super::{BATCH_SIZE, FingerprintStore, LandmarkRow, StoreStats, Track};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

type PgPool = Pool<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Opens a connection pool against `database_url` and runs pending
    /// migrations before handing back a usable store.
    pub fn connect(database_url: &str) -> Result<Self, EngineError> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .build(manager)
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;

        let mut conn = pool
            .get()
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>, EngineError> {
        self.pool
            .get()
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))
    }
}

impl From<TrackRow> for Track {
    fn from(row: TrackRow) -> Self {
        Track {
            id: row.id,
            title: row.title,
            artist: row.artist,
            album: row.album,
            duration: row.duration,
            indexed: row.indexed,
            content_hash: row.content_hash,
        }
    }
}

#[async_trait]
impl FingerprintStore for PgStore {
    async fn find_track_by_content_hash(
        &self,
        content_hash: &str,
    ) -> Result<Option<Track>, EngineError> {
        let store = self.clone();
        let content_hash = content_hash.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = store.conn()?;
            tracks::table
                .filter(tracks::content_hash.eq(&content_hash))
                .first::<TrackRow>(&mut conn)
                .optional()
                .map(|opt| opt.map(Track::from))
                .map_err(|e| EngineError::StoreUnavailable(e.to_string()))
        })
        .await
        .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?
    }

    async fn create_track(
        &self,
        title: &str,
        artist: Option<&str>,
        album: Option<&str>,
        duration: Option<i32>,
        content_hash: &str,
    ) -> Result<Track, EngineError> {
        let store = self.clone();
        let title = title.to_string();
        let artist = artist.map(str::to_string);
        let album = album.map(str::to_string);
        let content_hash = content_hash.to_string();

        tokio::task::spawn_blocking(move || {
            let mut conn = store.conn()?;
            let new_track = NewTrack {
                title: &title,
                artist: artist.as_deref(),
                album: album.as_deref(),
                duration,
                indexed: false,
                content_hash: &content_hash,
            };

            let row = diesel::insert_into(tracks::table)
                .values(&new_track)
                .get_result::<TrackRow>(&mut conn)
                .map_err(|e| match e {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        EngineError::StoreConflict
                    }
                    other => EngineError::StoreUnavailable(other.to_string()),
                })?;

            Ok(Track::from(row))
        })
        .await
        .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?
    }

    async fn insert_landmarks(
        &self,
        track_id: i32,
        landmarks_in: &[Landmark],
    ) -> Result<(), EngineError> {
        let store = self.clone();
        let rows: Vec<(String, u32)> = landmarks_in
            .iter()
            .map(|l| (l.digest.clone(), l.anchor_time))
            .collect();

        tokio::task::spawn_blocking(move || {
            let mut conn = store.conn()?;
            for chunk in rows.chunks(BATCH_SIZE) {
                let values: Vec<NewLandmark> = chunk
                    .iter()
                    .map(|(digest, anchor_time)| NewLandmark {
                        digest,
                        track_id,
                        anchor_time: *anchor_time as i32,
                    })
                    .collect();

                conn.transaction(|conn| {
                    diesel::insert_into(landmarks::table)
                        .values(&values)
                        .on_conflict((
                            landmarks::digest,
                            landmarks::track_id,
                            landmarks::anchor_time,
                        ))
                        .do_nothing()
                        .execute(conn)
                })
                .map_err(|e: DieselError| EngineError::StoreUnavailable(e.to_string()))?;
            }
            Ok(())
        })
        .await
        .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?
    }

    async fn mark_indexed(&self, track_id: i32) -> Result<(), EngineError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = store.conn()?;
            diesel::update(tracks::table.filter(tracks::id.eq(track_id)))
                .set(tracks::indexed.eq(true))
                .execute(&mut conn)
                .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?
    }

    async fn lookup_by_digests(&self, digests: &[String]) -> Result<Vec<LandmarkRow>, EngineError> {
        let store = self.clone();
        let digests = digests.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut conn = store.conn()?;
            let mut out = Vec::new();

            for chunk in digests.chunks(BATCH_SIZE) {
                let rows = landmarks::table
                    .inner_join(tracks::table)
                    .filter(landmarks::digest.eq_any(chunk))
                    .select((
                        landmarks::digest,
                        landmarks::track_id,
                        landmarks::anchor_time,
                        tracks::title,
                        tracks::artist,
                    ))
                    .load::<(String, i32, i32, String, Option<String>)>(&mut conn)
                    .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;

                out.extend(rows.into_iter().map(
                    |(digest, track_id, anchor_time, title, artist)| LandmarkRow {
                        digest,
                        track_id,
                        anchor_time,
                        title,
                        artist,
                    },
                ));
            }

            Ok(out)
        })
        .await
        .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?
    }

    async fn stats(&self) -> Result<StoreStats, EngineError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = store.conn()?;
            let track_count = tracks::table
                .count()
                .get_result(&mut conn)
                .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
            let landmark_count = landmarks::table
                .count()
                .get_result(&mut conn)
                .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
            Ok(StoreStats {
                track_count,
                landmark_count,
            })
        })
        .await
        .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?
    }
}
