//! Audio sample buffer
//!
//! **`WavData`** is the sync finder's view of an audio recording: a channel
//! count and an interleaved `f32` sample vector. Loading from disk is a
//! convenience for building test fixtures — the detection pipeline itself
//! never touches a file path, only the in-memory buffer.
//!
//! **Format when reading/writing files**: 16-bit PCM via `hound`, matching
//! the bit depth the original recordings use.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use snafu::ResultExt;

use crate::error::{Result, WavReadSnafu, WavWriteSnafu};

/// An interleaved audio sample buffer with a known channel count.
#[derive(Debug, Clone)]
pub struct WavData {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

impl WavData {
    /// Build a buffer directly from interleaved samples, e.g. synthetic
    /// signals constructed by tests.
    pub fn from_samples(samples: Vec<f32>, channels: usize, sample_rate: u32) -> Self {
        assert!(channels > 0, "channel count must be nonzero");
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Load a WAV file from disk, normalizing 16-bit PCM samples to
    /// `[-1.0, 1.0]`.
    pub fn from_wav_file(path: &str) -> Result<Self> {
        let mut reader = WavReader::open(path).context(WavReadSnafu { path })?;
        let spec = reader.spec();
        let channels = spec.channels as usize;

        let samples: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .context(WavReadSnafu { path })?,
            SampleFormat::Int => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
                .collect::<std::result::Result<_, _>>()
                .context(WavReadSnafu { path })?,
        };

        Ok(Self {
            samples,
            channels,
            sample_rate: spec.sample_rate,
        })
    }

    /// Write this buffer to disk as 16-bit PCM, clamping to `[-1.0, 1.0]`.
    pub fn write_wav_file(&self, path: &str) -> Result<()> {
        let spec = WavSpec {
            channels: self.channels as u16,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).context(WavWriteSnafu { path })?;
        for &sample in &self.samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer
                .write_sample((clamped * i16::MAX as f32) as i16)
                .context(WavWriteSnafu { path })?;
        }
        writer.finalize().context(WavWriteSnafu { path })?;
        Ok(())
    }

    pub fn n_channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total interleaved sample count (`n_channels() * samples_per_channel()`).
    pub fn n_values(&self) -> usize {
        self.samples.len()
    }

    /// Samples per channel.
    pub fn n_samples(&self) -> usize {
        self.samples.len() / self.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}
