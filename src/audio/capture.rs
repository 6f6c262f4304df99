//! Microphone capture and playback utilities for local testing.
//!
//! This is a CLI-only convenience for producing test clips (`soundmark
//! record`) — it never feeds straight into recognition over HTTP. Live
//! recognition stays a non-goal. Grounded on the teacher's
//! `AudioProcessor::record_audio`/`play_recording`/`save_as_wav`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use audio_gate::NoiseGate;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SupportedStreamConfig, SampleFormat};
use hound::{SampleFormat as WavSampleFormat, WavSpec, WavWriter};

/// Records from the default input device for `duration_secs`.
pub fn record_audio(duration_secs: u64) -> anyhow::Result<(Vec<f32>, SupportedStreamConfig)> {
    // Constructed for parity with the gate parameters used elsewhere in this
    // tool's recording path; wiring it into the callback below is future
    // work (it needs the stream's live sample rate, known only after open).
    let _gate = NoiseGate::new(
        -36.0,    // open threshold (dB)
        -54.0,    // close threshold (dB)
        48_000.0, // sample rate
        2,        // channels
        150.0,    // release rate (ms)
        25.0,     // attack rate (ms)
        150.0,    // hold time (ms)
    );

    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow::anyhow!("no input device found"))?;
    let config = device.default_input_config()?;

    let recorded = Arc::new(Mutex::new(Vec::new()));
    let recorded_clone = recorded.clone();
    let err_fn = |err| tracing::error!("input stream error: {err}");

    let stream = match config.sample_format() {
        SampleFormat::F32 => device.build_input_stream(
            &config.clone().into(),
            move |data: &[f32], _: &_| {
                recorded_clone.lock().unwrap().extend_from_slice(data);
            },
            err_fn,
            None,
        )?,
        SampleFormat::I16 => device.build_input_stream(
            &config.clone().into(),
            move |data: &[i16], _: &_| {
                let mut samples = recorded_clone.lock().unwrap();
                samples.extend(data.iter().map(|&s| s as f32 / i16::MAX as f32));
            },
            err_fn,
            None,
        )?,
        other => anyhow::bail!("unsupported sample format: {other:?}"),
    };

    stream.play()?;
    std::thread::sleep(Duration::from_secs(duration_secs));
    drop(stream);

    let samples = recorded.lock().unwrap().clone();
    Ok((samples, config))
}

/// Plays back `samples` through the default output device using `config`.
pub fn play_recording(samples: Vec<f32>, config: &cpal::StreamConfig) -> anyhow::Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("no output device available"))?;

    let duration_secs =
        samples.len() as f32 / (config.sample_rate.0 as f32 * config.channels as f32);
    let mut samples_iter = samples.into_iter();

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            for sample in data.iter_mut() {
                *sample = samples_iter.next().unwrap_or(0.0);
            }
        },
        |err| tracing::error!("output stream error: {err}"),
        None,
    )?;

    stream.play()?;
    std::thread::sleep(Duration::from_secs_f32(duration_secs + 1.0));
    Ok(())
}

/// Saves `samples` (`[-1, 1]` range) to a 16-bit PCM WAV file at `path`.
pub fn save_as_wav(samples: &[f32], config: &SupportedStreamConfig, path: &str) -> anyhow::Result<()> {
    let spec = WavSpec {
        channels: config.channels(),
        sample_rate: config.sample_rate().0,
        bits_per_sample: 16,
        sample_format: WavSampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample((sample * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
