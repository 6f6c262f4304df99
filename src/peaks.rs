//! 2-D local-maximum peak picking over a [`Spectrogram`].
//!
//! A cell is a peak iff it equals the maximum of its `P`x`P` neighborhood and
//! exceeds the amplitude floor. The neighborhood max is computed with a
//! separable sliding-window maximum (monotonic deque) rather than a brute
//! force `O(P^2)` scan per cell, since full-length tracks produce
//! spectrograms with millions of cells.

use std::collections::VecDeque;

use crate::spectrogram::Spectrogram;

/// Side length of the square neighborhood used for local-maximum peak
/// detection. Part of the fingerprint contract — do not change casually.
pub const NEIGHBORHOOD: usize = 20;
/// Minimum magnitude for a cell to be eligible as a peak.
pub const AMP_MIN: f32 = 10.0;

/// A detected spectral peak: `(time_frame, freq_bin)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peak {
    pub time: u32,
    pub freq: u32,
}

/// Sliding-window maximum of `data` with window `size`, matching
/// `scipy.ndimage.maximum_filter`'s even-size origin convention: the window
/// for index `i` spans `[i - size/2, i + (size - 1 - size/2)]`, clamped to
/// the array bounds.
fn sliding_max(data: &[f32], size: usize) -> Vec<f32> {
    let n = data.len();
    if n == 0 {
        return Vec::new();
    }
    let low = size / 2;
    let high = size - 1 - low;

    let mut out = vec![0.0f32; n];
    let mut deque: VecDeque<usize> = VecDeque::with_capacity(size + 1);

    // Process indices in order of their window's right edge so each data
    // point enters the deque exactly once.
    let mut front = 0usize; // next data index to push
    for i in 0..n {
        let window_end = (i + high).min(n - 1);
        while front <= window_end {
            while let Some(&back) = deque.back() {
                if data[back] <= data[front] {
                    deque.pop_back();
                } else {
                    break;
                }
            }
            deque.push_back(front);
            front += 1;
        }

        let window_start = i.saturating_sub(low);
        while let Some(&head) = deque.front() {
            if head < window_start {
                deque.pop_front();
            } else {
                break;
            }
        }

        out[i] = data[*deque.front().unwrap()];
    }

    out
}

/// Finds all cells equal to their `NEIGHBORHOOD`-sized local maximum and
/// above `AMP_MIN`. Returns `(time, freq)` pairs; order is unspecified.
pub fn find_peaks(spec: &Spectrogram) -> Vec<Peak> {
    let t_len = spec.num_frames();
    let f_len = spec.num_bins();
    if t_len == 0 || f_len == 0 {
        return Vec::new();
    }

    // Pass 1: sliding max along the frequency axis, per frame.
    let mut freq_maxed: Vec<Vec<f32>> = Vec::with_capacity(t_len);
    for t in 0..t_len {
        freq_maxed.push(sliding_max(spec.frame(t), NEIGHBORHOOD));
    }

    // Pass 2: sliding max along the time axis, per frequency bin.
    let mut local_max = vec![vec![0.0f32; f_len]; t_len];
    for f in 0..f_len {
        let column: Vec<f32> = (0..t_len).map(|t| freq_maxed[t][f]).collect();
        let maxed = sliding_max(&column, NEIGHBORHOOD);
        for t in 0..t_len {
            local_max[t][f] = maxed[t];
        }
    }

    let mut peaks = Vec::new();
    for t in 0..t_len {
        for f in 0..f_len {
            let m = spec.magnitude(f, t);
            if m > AMP_MIN && m == local_max[t][f] {
                peaks.push(Peak {
                    time: t as u32,
                    freq: f as u32,
                });
            }
        }
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sliding_max_matches_brute_force() {
        let data = vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0, 3.0];
        let size = 4;
        let fast = sliding_max(&data, size);

        let low = size / 2;
        let high = size - 1 - low;
        let brute: Vec<f32> = (0..data.len())
            .map(|i| {
                let start = i.saturating_sub(low);
                let end = (i + high).min(data.len() - 1);
                data[start..=end].iter().cloned().fold(f32::MIN, f32::max)
            })
            .collect();

        assert_eq!(fast, brute);
    }

    #[test]
    fn silence_yields_no_peaks() {
        let silence = crate::spectrogram::stft(&vec![0.0f32; 22_050]);
        assert!(find_peaks(&silence).is_empty());
    }
}
