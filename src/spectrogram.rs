//! Magnitude STFT with the fixed window/hop/padding contract the rest of the
//! fingerprint pipeline depends on. These constants are part of the wire
//! format: changing them invalidates every previously stored landmark.

use crate::fft::{apply_hann_window, magnitude_spectrum};

/// FFT window size in samples.
pub const N_FFT: usize = 4096;
/// Hop size between successive frames, in samples.
pub const HOP: usize = 512;

/// A magnitude spectrogram, `M[f, t]` with `f` in `[0, N_FFT/2]`.
pub struct Spectrogram {
    /// `frames[t][f]`
    frames: Vec<Vec<f32>>,
}

impl Spectrogram {
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn num_bins(&self) -> usize {
        N_FFT / 2 + 1
    }

    #[inline]
    pub fn magnitude(&self, freq_bin: usize, time_frame: usize) -> f32 {
        self.frames[time_frame][freq_bin]
    }

    pub fn frame(&self, time_frame: usize) -> &[f32] {
        &self.frames[time_frame]
    }
}

/// Reflects an index into `[0, len - 1]` without repeating the boundary
/// sample, matching `numpy`'s `mode="reflect"` padding used by the reference
/// implementation's `librosa.stft(..., center=True)` call.
fn reflect_index(i: isize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let mut m = i % period;
    if m < 0 {
        m += period;
    }
    if m < len as isize {
        m as usize
    } else {
        (period - m) as usize
    }
}

/// Computes the centered, reflect-padded magnitude STFT of `samples`.
pub fn stft(samples: &[f32]) -> Spectrogram {
    if samples.is_empty() {
        return Spectrogram { frames: Vec::new() };
    }

    let pad = N_FFT / 2;
    let len = samples.len();
    let num_frames = 1 + len / HOP;

    let mut frames = Vec::with_capacity(num_frames);
    for t in 0..num_frames {
        // Frame t starts at sample `t*HOP - pad` in the unpadded signal
        // (i.e. position `t*HOP` in the conceptually padded signal).
        let start = t as isize * HOP as isize - pad as isize;

        let mut frame = vec![0.0f32; N_FFT];
        for (k, slot) in frame.iter_mut().enumerate() {
            let idx = start + k as isize;
            *slot = samples[reflect_index(idx, len)];
        }

        apply_hann_window(&mut frame);
        frames.push(magnitude_spectrum(&frame));
    }

    Spectrogram { frames }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_count_matches_hop_contract() {
        let samples = vec![0.0f32; HOP * 10];
        let spec = stft(&samples);
        assert_eq!(spec.num_frames(), 1 + samples.len() / HOP);
        assert_eq!(spec.num_bins(), N_FFT / 2 + 1);
    }

    #[test]
    fn empty_input_yields_no_frames() {
        let spec = stft(&[]);
        assert_eq!(spec.num_frames(), 0);
    }

    #[test]
    fn pure_tone_peaks_near_expected_bin() {
        let sample_rate = 22_050.0f32;
        let freq = 1000.0f32;
        let samples: Vec<f32> = (0..sample_rate as usize * 2)
            .map(|n| (2.0 * std::f32::consts::PI * freq * n as f32 / sample_rate).sin())
            .collect();
        let spec = stft(&samples);

        let mid = spec.num_frames() / 2;
        let expected_bin = (freq * N_FFT as f32 / sample_rate).round() as usize;

        let mut best_bin = 0;
        let mut best_mag = 0.0f32;
        for f in 0..spec.num_bins() {
            let m = spec.magnitude(f, mid);
            if m > best_mag {
                best_mag = m;
                best_bin = f;
            }
        }
        assert!(
            (best_bin as isize - expected_bin as isize).abs() <= 1,
            "expected peak near bin {expected_bin}, found {best_bin}"
        );
    }
}
