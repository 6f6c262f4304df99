//! In-memory [`FingerprintStore`] double for tests that have no Postgres
//! instance to talk to.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::landmarks::Landmark;

use super::{FingerprintStore, LandmarkRow, StoreStats, Track};

#[derive(Default)]
struct Inner {
    tracks: Vec<Track>,
    // (digest, track_id, anchor_time) -> present, for de-duplication.
    landmark_keys: std::collections::HashSet<(String, i32, i32)>,
    landmarks: HashMap<i32, Vec<(String, i32)>>,
    next_id: i32,
}

/// A `Mutex`-guarded in-memory store. Cloning shares the same underlying
/// state (like a connection pool handle would), since it's a thin `Arc`.
#[derive(Clone)]
pub struct MemoryStore {
    inner: std::sync::Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: std::sync::Arc::new(Mutex::new(Inner {
                next_id: 1,
                ..Default::default()
            })),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FingerprintStore for MemoryStore {
    async fn find_track_by_content_hash(
        &self,
        content_hash: &str,
    ) -> Result<Option<Track>, EngineError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .tracks
            .iter()
            .find(|t| t.content_hash == content_hash)
            .cloned())
    }

    async fn create_track(
        &self,
        title: &str,
        artist: Option<&str>,
        album: Option<&str>,
        duration: Option<i32>,
        content_hash: &str,
    ) -> Result<Track, EngineError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.tracks.iter().any(|t| t.content_hash == content_hash) {
            return Err(EngineError::StoreConflict);
        }

        let track = Track {
            id: inner.next_id,
            title: title.to_string(),
            artist: artist.map(str::to_string),
            album: album.map(str::to_string),
            duration,
            indexed: false,
            content_hash: content_hash.to_string(),
        };
        inner.next_id += 1;
        inner.tracks.push(track.clone());
        Ok(track)
    }

    async fn insert_landmarks(
        &self,
        track_id: i32,
        landmarks: &[Landmark],
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().unwrap();
        for landmark in landmarks {
            let key = (landmark.digest.clone(), track_id, landmark.anchor_time as i32);
            if inner.landmark_keys.insert(key) {
                inner
                    .landmarks
                    .entry(track_id)
                    .or_default()
                    .push((landmark.digest.clone(), landmark.anchor_time as i32));
            }
        }
        Ok(())
    }

    async fn mark_indexed(&self, track_id: i32) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(track) = inner.tracks.iter_mut().find(|t| t.id == track_id) {
            track.indexed = true;
        }
        Ok(())
    }

    async fn lookup_by_digests(&self, digests: &[String]) -> Result<Vec<LandmarkRow>, EngineError> {
        let inner = self.inner.lock().unwrap();
        let wanted: std::collections::HashSet<&str> = digests.iter().map(String::as_str).collect();
        let mut out = Vec::new();

        for track in &inner.tracks {
            let Some(rows) = inner.landmarks.get(&track.id) else {
                continue;
            };
            for (digest, anchor_time) in rows {
                if wanted.contains(digest.as_str()) {
                    out.push(LandmarkRow {
                        digest: digest.clone(),
                        track_id: track.id,
                        anchor_time: *anchor_time,
                        title: track.title.clone(),
                        artist: track.artist.clone(),
                    });
                }
            }
        }

        Ok(out)
    }

    async fn stats(&self) -> Result<StoreStats, EngineError> {
        let inner = self.inner.lock().unwrap();
        let landmark_count: i64 = inner.landmarks.values().map(|v| v.len() as i64).sum();
        Ok(StoreStats {
            track_count: inner.tracks.len() as i64,
            landmark_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_find_round_trips() {
        let store = MemoryStore::new();
        let track = store
            .create_track("Song", Some("Artist"), None, Some(180), "hash1")
            .await
            .unwrap();
        let found = store
            .find_track_by_content_hash("hash1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, track.id);
        assert_eq!(found.title, "Song");
    }

    #[tokio::test]
    async fn duplicate_content_hash_is_a_conflict() {
        let store = MemoryStore::new();
        store
            .create_track("Song", None, None, None, "hash1")
            .await
            .unwrap();
        let err = store
            .create_track("Song Again", None, None, None, "hash1")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::StoreConflict));
    }

    #[tokio::test]
    async fn lookup_by_digests_only_returns_requested_digests() {
        let store = MemoryStore::new();
        let track = store
            .create_track("Song", None, None, None, "hash1")
            .await
            .unwrap();
        store
            .insert_landmarks(
                track.id,
                &[
                    Landmark { digest: "a".into(), anchor_time: 0 },
                    Landmark { digest: "b".into(), anchor_time: 1 },
                ],
            )
            .await
            .unwrap();

        let rows = store
            .lookup_by_digests(&["a".to_string()])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].digest, "a");
    }

    #[tokio::test]
    async fn duplicate_landmarks_are_not_double_counted() {
        let store = MemoryStore::new();
        let track = store
            .create_track("Song", None, None, None, "hash1")
            .await
            .unwrap();
        let landmark = Landmark { digest: "a".into(), anchor_time: 0 };
        store.insert_landmarks(track.id, &[landmark.clone()]).await.unwrap();
        store.insert_landmarks(track.id, &[landmark]).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.landmark_count, 1);
    }
}
