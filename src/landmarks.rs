//! Combinatorial hash generation: pairs each peak with a bounded fan of
//! successors and reduces each pair to a short hex digest. This is the wire
//! format other independent implementations must reproduce byte-for-byte —
//! see `SPEC_FULL.md` §6.

use std::collections::HashSet;

use sha1::{Digest, Sha1};

use crate::peaks::Peak;

/// Maximum number of successor peaks paired with each anchor.
pub const FAN: usize = 15;
/// Minimum accepted time delta between anchor and successor, in frames.
pub const MIN_DELTA: i64 = 0;
/// Maximum accepted time delta between anchor and successor, in frames.
pub const MAX_DELTA: i64 = 200;
/// Length, in hex characters, of a truncated landmark digest.
pub const DIGEST_LEN: usize = 20;

/// A single (digest, anchor-time) landmark.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Landmark {
    pub digest: String,
    pub anchor_time: u32,
}

fn hash_pair(f1: u32, f2: u32, delta: i64) -> String {
    let payload = format!("{f1}|{f2}|{delta}");
    let mut hasher = Sha1::new();
    hasher.update(payload.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)[..DIGEST_LEN].to_string()
}

#[cfg(test)]
fn hex_encode_full(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(bytes)
}

/// Generates the de-duplicated landmark set for a list of peaks.
///
/// Peaks are sorted by time ascending first (stable), then each anchor is
/// paired with up to `FAN` successors whose time delta falls in
/// `[MIN_DELTA, MAX_DELTA]`.
pub fn generate_landmarks(mut peaks: Vec<Peak>) -> Vec<Landmark> {
    peaks.sort_by_key(|p| p.time);

    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for i in 0..peaks.len() {
        let anchor = peaks[i];
        for j in 1..=FAN {
            let Some(&successor) = peaks.get(i + j) else {
                break;
            };
            let delta = successor.time as i64 - anchor.time as i64;
            if delta < MIN_DELTA || delta > MAX_DELTA {
                continue;
            }

            let digest = hash_pair(anchor.freq, successor.freq, delta);
            if seen.insert((digest.clone(), anchor.time)) {
                out.push(Landmark {
                    digest,
                    anchor_time: anchor.time,
                });
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(time: u32, freq: u32) -> Peak {
        Peak { time, freq }
    }

    #[test]
    fn digest_is_twenty_lowercase_hex_chars() {
        let peaks = vec![peak(0, 100), peak(5, 200), peak(10, 300)];
        let landmarks = generate_landmarks(peaks);
        assert!(!landmarks.is_empty());
        for l in &landmarks {
            assert_eq!(l.digest.len(), DIGEST_LEN);
            assert!(l.digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn fan_out_is_bounded() {
        let peaks: Vec<Peak> = (0..50).map(|t| peak(t, t * 3)).collect();
        let landmarks = generate_landmarks(peaks);

        let mut per_anchor: std::collections::HashMap<u32, usize> = std::collections::HashMap::new();
        for l in &landmarks {
            *per_anchor.entry(l.anchor_time).or_default() += 1;
        }
        for (_, count) in per_anchor {
            assert!(count <= FAN);
        }
    }

    #[test]
    fn delta_window_is_respected() {
        let peaks = vec![peak(0, 10), peak(300, 20)];
        let landmarks = generate_landmarks(peaks);
        assert!(landmarks.is_empty(), "delta of 300 exceeds MAX_DELTA");
    }

    #[test]
    fn determinism_across_runs() {
        let peaks = vec![peak(0, 42), peak(3, 99), peak(7, 17), peak(7, 5)];
        let a = generate_landmarks(peaks.clone());
        let b = generate_landmarks(peaks);

        let mut a_sorted = a.clone();
        let mut b_sorted = b.clone();
        a_sorted.sort_by(|x, y| (x.digest.clone(), x.anchor_time).cmp(&(y.digest.clone(), y.anchor_time)));
        b_sorted.sort_by(|x, y| (x.digest.clone(), x.anchor_time).cmp(&(y.digest.clone(), y.anchor_time)));

        assert_eq!(a_sorted.iter().map(|l| (&l.digest, l.anchor_time)).collect::<Vec<_>>(),
                   b_sorted.iter().map(|l| (&l.digest, l.anchor_time)).collect::<Vec<_>>());
    }

    #[test]
    fn known_hash_matches_the_wire_format() {
        // "100|200|5" sha1 hex, first 20 chars, computed independently.
        let mut h = Sha1::new();
        h.update(b"100|200|5");
        let expected_full = hex_encode_full(h.finalize());
        assert_eq!(hash_pair(100, 200, 5), expected_full[..DIGEST_LEN]);
    }
}
