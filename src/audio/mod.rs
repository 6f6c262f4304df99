//! Audio preprocessing: decode an opaque byte blob to mono PCM at the
//! fixed target sample rate, peak-normalized. Grounded on the symphonia
//! probe/decode/downmix sequence this crate's `AudioProcessor` used.

pub mod capture;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::EngineError;

/// The fixed sample rate every decoded clip is resampled to. Part of the
/// fingerprint wire contract.
pub const TARGET_SAMPLE_RATE: u32 = 22_050;

/// Decodes `bytes` to mono PCM at [`TARGET_SAMPLE_RATE`], peak-normalized to
/// `[-1, 1]`.
pub fn decode(bytes: Vec<u8>) -> Result<Vec<f32>, EngineError> {
    let (raw, sample_rate) = decode_native(bytes)?;
    if raw.is_empty() {
        return Err(EngineError::EmptyAudio);
    }

    let resampled = resample_linear(&raw, sample_rate, TARGET_SAMPLE_RATE);
    if resampled.is_empty() {
        return Err(EngineError::EmptyAudio);
    }

    Ok(normalize(&resampled))
}

/// Probes and decodes `bytes` into mono PCM at the container's native
/// sample rate (no resampling, no normalization yet).
fn decode_native(bytes: Vec<u8>) -> Result<(Vec<f32>, u32), EngineError> {
    let cursor = std::io::Cursor::new(bytes);
    let stream = MediaSourceStream::new(Box::new(cursor), MediaSourceStreamOptions::default());

    let probe = symphonia::default::get_probe();
    let probed = probe
        .format(
            &Hint::new(),
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| EngineError::Decode(format!("unrecognized container: {e}")))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .first()
        .ok_or_else(|| EngineError::Decode("no audio track in container".to_string()))?;
    let codec_params = track.codec_params.clone();

    let registry = symphonia::default::get_codecs();
    let mut decoder = registry
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| EngineError::Decode(format!("unsupported codec: {e}")))?;

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| EngineError::Decode("unknown sample rate".to_string()))?;

    let mut mono_samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(_)) => break, // EOF
            Err(e) => return Err(EngineError::Decode(format!("truncated stream: {e}"))),
        };

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| EngineError::Decode(format!("decode failure: {e}")))?;

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        for frame in sample_buf.samples().chunks_exact(channels) {
            let mono = frame.iter().sum::<f32>() / channels as f32;
            mono_samples.push(mono);
        }
    }

    Ok((mono_samples, sample_rate))
}

/// Linear-interpolation resampler, kept from the teacher's
/// `resample_linear` implementation.
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let new_len = (samples.len() as f64 / ratio) as usize;
    let mut resampled = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let in_idx_float = i as f64 * ratio;
        let in_idx = in_idx_float.floor() as usize;
        let frac = in_idx_float.fract() as f32;

        if in_idx + 1 < samples.len() {
            let p1 = samples[in_idx];
            let p2 = samples[in_idx + 1];
            resampled.push(p1 + frac * (p2 - p1));
        } else if in_idx < samples.len() {
            resampled.push(samples[in_idx]);
        } else {
            break;
        }
    }

    resampled
}

/// Peak-normalizes so `max(|samples|) == 1.0`, or returns the input
/// unchanged if it's silent.
fn normalize(samples: &[f32]) -> Vec<f32> {
    let peak = samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
    if peak == 0.0 {
        return samples.to_vec();
    }
    samples.iter().map(|&s| s / peak).collect()
}
