//! Hand-rolled radix-2 Cooley-Tukey FFT.
//!
//! Kept close to the original implementation this crate grew out of: a
//! recursive decimation-in-time FFT with no external numerics dependency.
//! `N_FFT` in [`crate::spectrogram`] is a fixed power of two, so the
//! power-of-two restriction here is never a practical limitation.

mod complex;

pub use complex::Complex;

use std::f32::consts::PI;

/// In-place radix-2 Cooley-Tukey FFT. `buf.len()` must be a power of two.
pub fn fft(buf: &mut [Complex]) {
    let n = buf.len();
    if n <= 1 {
        return;
    }
    debug_assert!(n.is_power_of_two(), "FFT length must be a power of two");

    let mut even: Vec<Complex> = Vec::with_capacity(n / 2);
    let mut odd: Vec<Complex> = Vec::with_capacity(n / 2);
    for (i, &sample) in buf.iter().enumerate() {
        if i % 2 == 0 {
            even.push(sample);
        } else {
            odd.push(sample);
        }
    }

    fft(&mut even);
    fft(&mut odd);

    // P(ω)  = Pₑ(ω²) + ωPₒ(ω²)
    // P(-ω) = Pₑ(ω²) - ωPₒ(ω²)
    // where ω = e^{-i*2π*j/n}
    for j in 0..n / 2 {
        let theta = (2.0 * PI * (j as f32)) / (n as f32);
        let twiddle = Complex::from_polar(1.0, -theta);

        buf[j] = even[j] + (twiddle * odd[j]);
        buf[j + n / 2] = even[j] - (twiddle * odd[j]);
    }
}

/// Applies a periodic Hann window in place: `w[n] = 0.5 * (1 - cos(2*pi*n/N))`.
pub fn apply_hann_window(frame: &mut [f32]) {
    let n = frame.len();
    if n <= 1 {
        return;
    }
    for (i, sample) in frame.iter_mut().enumerate() {
        let multiplier = 0.5 * (1.0 - (2.0 * PI * i as f32 / n as f32).cos());
        *sample *= multiplier;
    }
}

/// Magnitude spectrum (`|FFT|`) of a windowed real-valued frame, keeping only
/// the non-negative frequency bins `[0, n/2]`.
pub fn magnitude_spectrum(frame: &[f32]) -> Vec<f32> {
    let n = frame.len();
    let mut buf: Vec<Complex> = frame.iter().map(|&s| Complex::new(s, 0.0)).collect();
    fft(&mut buf);

    buf[..=n / 2].iter().map(|c| c.norm_sqr().sqrt()).collect()
}
