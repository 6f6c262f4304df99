//! Offset-histogram alignment: given a query's landmarks and the rows the
//! store returned for their digests, pick the best-aligned track.

use std::collections::HashMap;

use crate::landmarks::Landmark;
use crate::store::LandmarkRow;

/// Default minimum number of matching landmarks a track must have before
/// it's eligible to win.
pub const DEFAULT_MIN_MATCH_COUNT: usize = 5;

/// The result of a successful recognition.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub track_id: i32,
    pub title: String,
    pub artist: Option<String>,
    pub confidence: f64,
    pub aligned_matches: usize,
    pub total_query_hashes: usize,
}

/// Finds the modal value in `deltas`, breaking ties by first occurrence.
/// Returns `(modal_value, count)`.
fn modal_delta(deltas: &[i64]) -> (i64, usize) {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    let mut first_index: HashMap<i64, usize> = HashMap::new();
    for (idx, &d) in deltas.iter().enumerate() {
        *counts.entry(d).or_insert(0) += 1;
        first_index.entry(d).or_insert(idx);
    }

    let mut best = (deltas[0], 0usize, usize::MAX);
    for (&delta, &count) in &counts {
        let first = first_index[&delta];
        if count > best.1 || (count == best.1 && first < best.2) {
            best = (delta, count, first);
        }
    }
    (best.0, best.1)
}

/// Aligns `query_landmarks` against the store rows matching their digests
/// and returns the best track, or `None` if no track clears
/// `min_match_count`.
pub fn identify(
    query_landmarks: &[Landmark],
    rows: &[LandmarkRow],
    min_match_count: usize,
) -> Option<Match> {
    if query_landmarks.is_empty() || rows.is_empty() {
        return None;
    }

    // Q: digest -> query anchor, first-encountered wins.
    let mut query_anchor: HashMap<&str, u32> = HashMap::new();
    for l in query_landmarks {
        query_anchor.entry(l.digest.as_str()).or_insert(l.anchor_time);
    }

    let mut order: Vec<i32> = Vec::new();
    let mut deltas_by_track: HashMap<i32, Vec<i64>> = HashMap::new();
    let mut meta_by_track: HashMap<i32, (String, Option<String>)> = HashMap::new();

    for row in rows {
        let Some(&q_anchor) = query_anchor.get(row.digest.as_str()) else {
            continue;
        };
        let delta = row.anchor_time as i64 - q_anchor as i64;

        deltas_by_track
            .entry(row.track_id)
            .or_insert_with(|| {
                order.push(row.track_id);
                Vec::new()
            })
            .push(delta);
        meta_by_track
            .entry(row.track_id)
            .or_insert_with(|| (row.title.clone(), row.artist.clone()));
    }

    let total_query_hashes = query_landmarks.len();
    let mut best: Option<Match> = None;

    for track_id in order {
        let deltas = &deltas_by_track[&track_id];
        if deltas.len() < min_match_count {
            continue;
        }

        let (_, aligned) = modal_delta(deltas);
        let confidence = aligned as f64 / total_query_hashes as f64;

        let is_better = match &best {
            None => true,
            Some(current) => confidence > current.confidence,
        };
        if is_better {
            let (title, artist) = meta_by_track[&track_id].clone();
            best = Some(Match {
                track_id,
                title,
                artist,
                confidence,
                aligned_matches: aligned,
                total_query_hashes,
            });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landmark(digest: &str, anchor: u32) -> Landmark {
        Landmark {
            digest: digest.to_string(),
            anchor_time: anchor,
        }
    }

    fn row(digest: &str, track_id: i32, anchor: i32, title: &str) -> LandmarkRow {
        LandmarkRow {
            digest: digest.to_string(),
            track_id,
            anchor_time: anchor,
            title: title.to_string(),
            artist: Some("artist".to_string()),
        }
    }

    #[test]
    fn concentrated_offset_wins() {
        // True match: every db_anchor is query_anchor + 100.
        let query = vec![
            landmark("a", 0),
            landmark("b", 1),
            landmark("c", 2),
            landmark("d", 3),
            landmark("e", 4),
        ];
        let rows = vec![
            row("a", 1, 100, "song"),
            row("b", 1, 101, "song"),
            row("c", 1, 102, "song"),
            row("d", 1, 103, "song"),
            row("e", 1, 104, "song"),
        ];

        let m = identify(&query, &rows, 5).expect("expected a match");
        assert_eq!(m.track_id, 1);
        assert_eq!(m.aligned_matches, 5);
        assert_eq!(m.confidence, 1.0);
    }

    #[test]
    fn scattered_offsets_do_not_match() {
        let query = vec![
            landmark("a", 0),
            landmark("b", 1),
            landmark("c", 2),
            landmark("d", 3),
            landmark("e", 4),
        ];
        // Deltas are all different: 10,9,8,7,6 -> no single offset reaches 5.
        let rows = vec![
            row("a", 1, 10, "song"),
            row("b", 1, 10, "song"),
            row("c", 1, 9, "song"),
            row("d", 1, 8, "song"),
            row("e", 1, 6, "song"),
        ];
        let m = identify(&query, &rows, 5);
        assert!(m.is_none());
    }

    #[test]
    fn below_min_match_count_is_excluded() {
        let query = vec![landmark("a", 0), landmark("b", 1)];
        let rows = vec![row("a", 1, 100, "song"), row("b", 1, 101, "song")];
        assert!(identify(&query, &rows, 5).is_none());
    }

    #[test]
    fn empty_query_or_rows_is_no_match() {
        assert!(identify(&[], &[row("a", 1, 0, "x")], 1).is_none());
        assert!(identify(&[landmark("a", 0)], &[], 1).is_none());
    }

    #[test]
    fn best_confidence_wins_across_tracks() {
        let query: Vec<Landmark> = (0..10).map(|i| landmark(&format!("h{i}"), i)).collect();

        // Track 1: 5 aligned out of 10 query hashes -> confidence 0.5
        let mut rows: Vec<LandmarkRow> = (0..5)
            .map(|i| row(&format!("h{i}"), 1, 100 + i as i32, "five"))
            .collect();
        // Track 2: 8 aligned -> confidence 0.8
        rows.extend((0..8).map(|i| row(&format!("h{i}"), 2, 200 + i as i32, "eight")));

        let m = identify(&query, &rows, 5).expect("expected a match");
        assert_eq!(m.track_id, 2);
        assert_eq!(m.aligned_matches, 8);
    }
}
