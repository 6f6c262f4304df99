//! The façade tying preprocessing, store, and matcher together.
//! Grounded on the teacher's `AudioProcessor` as the "do everything" entry
//! point, split into `ingest`/`recognize` per `SPEC_FULL.md` §4.6.

use std::sync::Arc;

use crate::error::EngineError;
use crate::landmarks::{self, Landmark};
use crate::matcher::{self, Match};
use crate::peaks;
use crate::spectrogram;
use crate::store::FingerprintStore;
use crate::{audio, store};

/// A queued ingest job: the file bytes plus everything the HTTP layer
/// already computed before handing off to a worker.
#[derive(Clone)]
pub struct IngestRequest {
    pub bytes: Vec<u8>,
    pub title: String,
    pub artist: Option<String>,
    pub content_hash: String,
}

pub struct Engine {
    store: Arc<dyn FingerprintStore>,
    min_match_count: usize,
}

impl Engine {
    pub fn new(store: Arc<dyn FingerprintStore>) -> Self {
        Self {
            store,
            min_match_count: matcher::DEFAULT_MIN_MATCH_COUNT,
        }
    }

    pub fn with_min_match_count(store: Arc<dyn FingerprintStore>, min_match_count: usize) -> Self {
        Self {
            store,
            min_match_count,
        }
    }

    /// Computes the content hash and ingests synchronously. Used by the CLI
    /// and by `ingest_now` once a job has been dequeued.
    pub async fn ingest(
        &self,
        bytes: Vec<u8>,
        title: &str,
        artist: Option<&str>,
    ) -> Result<String, EngineError> {
        let content_hash = content_hash(&bytes);
        let job = IngestRequest {
            bytes,
            title: title.to_string(),
            artist: artist.map(str::to_string),
            content_hash: content_hash.clone(),
        };
        self.ingest_now(job).await?;
        Ok(content_hash)
    }

    /// Runs a precomputed ingest job to completion: idempotency check,
    /// track creation, the DSP pipeline, bulk landmark insert, and the
    /// final `indexed` flip.
    pub async fn ingest_now(&self, job: IngestRequest) -> Result<(), EngineError> {
        if self
            .store
            .find_track_by_content_hash(&job.content_hash)
            .await?
            .is_some()
        {
            tracing::info!(content_hash = %job.content_hash, "ingest: already present, skipping");
            return Ok(());
        }

        let track = match self
            .store
            .create_track(
                &job.title,
                job.artist.as_deref(),
                None,
                None,
                &job.content_hash,
            )
            .await
        {
            Ok(track) => track,
            Err(EngineError::StoreConflict) => {
                tracing::info!(content_hash = %job.content_hash, "ingest: lost the race, treating as done");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let bytes = job.bytes;
        let landmarks = tokio::task::spawn_blocking(move || compute_landmarks(bytes))
            .await
            .map_err(|e| EngineError::Internal(anyhow::anyhow!(e)))??;

        self.store.insert_landmarks(track.id, &landmarks).await?;
        self.store.mark_indexed(track.id).await?;
        Ok(())
    }

    /// Runs the pipeline against `bytes` and returns the best match, if any.
    pub async fn recognize(&self, bytes: Vec<u8>) -> Result<Option<Match>, EngineError> {
        let landmarks = match tokio::task::spawn_blocking(move || compute_landmarks(bytes)).await {
            Ok(Ok(landmarks)) => landmarks,
            Ok(Err(EngineError::Decode(e))) => {
                tracing::warn!(error = %e, "recognize: decode failed, treating as no-match");
                return Ok(None);
            }
            Ok(Err(EngineError::EmptyAudio)) => return Ok(None),
            Ok(Err(e)) => return Err(e),
            Err(e) => return Err(EngineError::Internal(anyhow::anyhow!(e))),
        };

        if landmarks.is_empty() {
            return Ok(None);
        }

        // Q: the distinct digests of the query's landmarks.
        let digests: Vec<String> = landmarks
            .iter()
            .map(|l| l.digest.as_str())
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        let rows = self.store.lookup_by_digests(&digests).await?;
        Ok(matcher::identify(&landmarks, &rows, self.min_match_count))
    }

    pub async fn stats(&self) -> Result<store::StoreStats, EngineError> {
        self.store.stats().await
    }
}

/// The CPU-bound half of both `ingest` and `recognize`: decode, STFT,
/// peak-pick, hash. Runs inside `spawn_blocking`.
fn compute_landmarks(bytes: Vec<u8>) -> Result<Vec<Landmark>, EngineError> {
    let samples = audio::decode(bytes)?;
    let spec = spectrogram::stft(&samples);
    let found_peaks = peaks::find_peaks(&spec);
    Ok(landmarks::generate_landmarks(found_peaks))
}

fn content_hash(bytes: &[u8]) -> String {
    sha256::digest(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn sine_wave_bytes(freq: f32, seconds: f32, sample_rate: u32) -> Vec<u8> {
        let n = (seconds * sample_rate as f32) as usize;
        let mut samples = Vec::with_capacity(n);
        for i in 0..n {
            let t = i as f32 / sample_rate as f32;
            let v = (2.0 * std::f32::consts::PI * freq * t).sin();
            samples.push((v * i16::MAX as f32) as i16);
        }

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut buf, spec).unwrap();
            for s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        buf.into_inner()
    }

    #[tokio::test]
    async fn ingest_then_recognize_self_matches() {
        let store = Arc::new(MemoryStore::new());
        let engine = Engine::new(store);
        let clip = sine_wave_bytes(440.0, 5.0, 22_050);

        engine
            .ingest(clip.clone(), "Test Tone", Some("Nobody"))
            .await
            .unwrap();

        let result = engine.recognize(clip).await.unwrap();
        let m = result.expect("expected a self-match");
        assert_eq!(m.title, "Test Tone");
    }

    #[tokio::test]
    async fn repeat_ingest_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let engine = Engine::new(store.clone());
        let clip = sine_wave_bytes(440.0, 2.0, 22_050);

        engine.ingest(clip.clone(), "Song", None).await.unwrap();
        engine.ingest(clip, "Song", None).await.unwrap();

        let stats = engine.stats().await.unwrap();
        assert_eq!(stats.track_count, 1);
    }

    #[tokio::test]
    async fn recognize_unrelated_audio_is_no_match() {
        let store = Arc::new(MemoryStore::new());
        let engine = Engine::new(store);
        let clip_a = sine_wave_bytes(440.0, 3.0, 22_050);
        let clip_b = sine_wave_bytes(1200.0, 3.0, 22_050);

        engine.ingest(clip_a, "A", None).await.unwrap();
        let result = engine.recognize(clip_b).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn empty_bytes_recognize_is_no_match_not_error() {
        let store = Arc::new(MemoryStore::new());
        let engine = Engine::new(store);
        let result = engine.recognize(Vec::new()).await.unwrap();
        assert!(result.is_none());
    }
}
