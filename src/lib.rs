pub mod codecs;
pub mod error;
pub mod pixels;
pub mod prelude;
pub mod synth;

use std::path::Path;

use crate::prelude::*;

pub use codecs::{
    AudioBuffer, CodecOptions, FailurePolicy, OverflowPolicy, SampleFormat, WavCodec, WavConfig,
};
pub use error::{ConfigError, ContainerError, WavError};
pub use pixels::{ImagePixels, PixelGrid, PixelSource};
pub use synth::{SpectrogramSynth, WaveformSynthesizer, find_max, map_range, normalize};

/// Writes `channel_data` with the default codec options.
pub fn write(
    config: &WavConfig,
    destination: impl AsRef<Path>,
    channel_data: &[&[f32]],
) -> Result<usize> {
    WavCodec::default().write(config, destination, channel_data)
}

pub fn read_header(source: impl AsRef<Path>) -> Result<WavConfig> {
    WavCodec::default().read_header(source)
}

pub fn read(
    config: &WavConfig,
    source: impl AsRef<Path>,
    channel_buffers: &mut [&mut [f32]],
) -> Result<usize> {
    WavCodec::default().read(config, source, channel_buffers)
}

pub fn read_easy(source: impl AsRef<Path>) -> Result<AudioBuffer> {
    WavCodec::default().read_easy(source)
}

/// Output parameters for [`image_to_wav`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub sample_rate: u32,
    pub duration_seconds: f32,
    pub bit_depth: u16,
    pub options: CodecOptions,
}

impl RenderSettings {
    /// 32-bit float output with default codec options.
    pub fn new(sample_rate: u32, duration_seconds: f32) -> Self {
        Self {
            sample_rate,
            duration_seconds,
            bit_depth: SampleFormat::F32.bits_per_sample(),
            options: CodecOptions::default(),
        }
    }

    pub fn with_bit_depth(mut self, bit_depth: u16) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    pub fn with_options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }
}

/// Loads pixels, synthesizes a signal, normalizes it and writes it as a mono
/// WAV file. Returns the number of frames written.
pub fn image_to_wav(
    source: &impl PixelSource,
    synth: &impl WaveformSynthesizer,
    settings: &RenderSettings,
    output: impl AsRef<Path>,
) -> R<usize> {
    let output = output.as_ref();
    let pixels = source.pixels()?;

    let mut signal = synth.synthesize(&pixels, settings.sample_rate, settings.duration_seconds)?;
    normalize(&mut signal);

    let sample_count = u32::try_from(signal.len())
        .map_err(|_| anyhow!("{} samples do not fit a WAV file", signal.len()))?;
    let config = WavConfig::new(1, sample_count, settings.sample_rate, settings.bit_depth);

    let written = WavCodec::new(settings.options)
        .write(&config, output, &[signal.as_slice()])
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(
        path = %output.display(),
        width = pixels.width(),
        height = pixels.height(),
        frames = written,
        "rendered image"
    );
    Ok(written)
}
