use crate::prelude::*;
pub mod sample;
mod wav;
pub use sample::OverflowPolicy;
pub use wav::{
    ContainerHeader, DATA_OFFSET, FieldId, FieldKind, HEADER_LAYOUT, HeaderField,
    WAV_HEADER_SIZE, WavCodec,
};

/// Per-operation descriptor for a read or a write.
///
/// Built by the caller before every operation and validated by the codec at
/// the start of it; the codec never mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavConfig {
    /// Number of channels, > 0.
    pub channel_count: u16,
    /// Frames per channel, > 0.
    pub sample_count: u32,
    /// Sample rate in Hz, > 0.
    pub sample_rate: u32,
    /// One of 8, 16, 24 or 32.
    pub bit_depth: u16,
}

impl WavConfig {
    pub fn new(channel_count: u16, sample_count: u32, sample_rate: u32, bit_depth: u16) -> Self {
        Self {
            channel_count,
            sample_count,
            sample_rate,
            bit_depth,
        }
    }

    /// Checks the numeric fields in order and resolves the wire format.
    pub fn validate(&self) -> std::result::Result<SampleFormat, ConfigError> {
        if self.channel_count == 0 {
            return Err(ConfigError::ZeroChannels);
        }
        if self.sample_count == 0 {
            return Err(ConfigError::ZeroSamples);
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        SampleFormat::from_bit_depth(self.bit_depth)
            .ok_or(ConfigError::UnsupportedBitDepth(self.bit_depth))
    }

    /// Byte stride of one frame.
    pub fn block_align(&self) -> u32 {
        u32::from(self.bit_depth / 8) * u32::from(self.channel_count)
    }

    /// Payload size in bytes, without the pad byte.
    pub fn data_size(&self) -> u64 {
        u64::from(self.block_align()) * u64::from(self.sample_count)
    }

    pub fn duration_seconds(&self) -> f64 {
        f64::from(self.sample_count) / f64::from(self.sample_rate)
    }
}

/// Wire representation of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFormat {
    U8,
    I16,
    I24,
    #[default]
    F32,
}

impl SampleFormat {
    pub fn from_bit_depth(bit_depth: u16) -> Option<Self> {
        match bit_depth {
            8 => Some(SampleFormat::U8),
            16 => Some(SampleFormat::I16),
            24 => Some(SampleFormat::I24),
            32 => Some(SampleFormat::F32),
            _ => None,
        }
    }

    pub fn bits_per_sample(&self) -> u16 {
        match self {
            SampleFormat::U8 => 8,
            SampleFormat::I16 => 16,
            SampleFormat::I24 => 24,
            SampleFormat::F32 => 32,
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_per_sample() / 8)
    }

    /// Format code written to the fmt chunk: 3 for IEEE float, 1 for integer PCM.
    pub fn format_code(&self) -> u16 {
        match self {
            SampleFormat::F32 => FORMAT_IEEE_FLOAT,
            _ => FORMAT_PCM,
        }
    }
}

pub const FORMAT_PCM: u16 = 1;
pub const FORMAT_IEEE_FLOAT: u16 = 3;

/// What a [`WavCodec`] does when the environment fails under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Return every error to the caller.
    #[default]
    Propagate,
    /// Panic on I/O and allocation failures. Configuration and container
    /// errors are still returned.
    Abort,
}

/// Settings shared by every operation of one [`WavCodec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecOptions {
    pub overflow: OverflowPolicy,
    pub on_failure: FailurePolicy,
}

impl CodecOptions {
    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn with_failure_policy(mut self, on_failure: FailurePolicy) -> Self {
        self.on_failure = on_failure;
        self
    }
}

/// Owned, de-interleaved audio as returned by [`WavCodec::read_easy`] and
/// [`WavCodec::decode`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub format: SampleFormat,
    pub data: Vec<Vec<f32>>, // deinterleaved float audio
}

impl AudioBuffer {
    /// Frames per channel.
    pub fn frames(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.data.get(index).map(Vec::as_slice)
    }

    /// Borrowed per-channel view, in the shape [`WavCodec::write`] expects.
    pub fn channel_refs(&self) -> Vec<&[f32]> {
        self.data.iter().map(Vec::as_slice).collect()
    }

    pub fn config(&self) -> WavConfig {
        WavConfig {
            channel_count: self.channels,
            sample_count: self.frames() as u32,
            sample_rate: self.sample_rate,
            bit_depth: self.format.bits_per_sample(),
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_checks_fields_in_order() {
        assert_eq!(
            WavConfig::new(0, 0, 0, 0).validate(),
            Err(ConfigError::ZeroChannels)
        );
        assert_eq!(
            WavConfig::new(1, 0, 0, 0).validate(),
            Err(ConfigError::ZeroSamples)
        );
        assert_eq!(
            WavConfig::new(1, 1, 0, 0).validate(),
            Err(ConfigError::ZeroSampleRate)
        );
        assert_eq!(
            WavConfig::new(1, 1, 44100, 12).validate(),
            Err(ConfigError::UnsupportedBitDepth(12))
        );
        assert_eq!(
            WavConfig::new(1, 1, 44100, 24).validate(),
            Ok(SampleFormat::I24)
        );
    }

    #[test]
    fn test_derived_sizes() {
        let config = WavConfig::new(3, 1000, 48000, 24);
        assert_eq!(config.block_align(), 9);
        assert_eq!(config.data_size(), 9000);

        let stereo = WavConfig::new(2, 88200, 44100, 16);
        assert_eq!(stereo.duration_seconds(), 2.0);
    }

    #[test]
    fn test_format_codes() {
        assert_eq!(SampleFormat::F32.format_code(), FORMAT_IEEE_FLOAT);
        for format in [SampleFormat::U8, SampleFormat::I16, SampleFormat::I24] {
            assert_eq!(format.format_code(), FORMAT_PCM);
        }
        assert_eq!(SampleFormat::I24.bytes_per_sample(), 3);
    }

    #[test]
    fn test_audio_buffer_config() {
        let buffer = AudioBuffer {
            sample_rate: 8000,
            channels: 2,
            format: SampleFormat::I16,
            data: vec![vec![0.0; 4000], vec![0.0; 4000]],
        };
        assert_eq!(buffer.config(), WavConfig::new(2, 4000, 8000, 16));
        assert_eq!(buffer.duration_seconds(), 0.5);
        assert_eq!(buffer.channel_refs().len(), 2);
        assert!(buffer.channel(2).is_none());
    }

    #[test]
    fn test_options_builders() {
        let options = CodecOptions::default()
            .with_overflow(OverflowPolicy::Clamp)
            .with_failure_policy(FailurePolicy::Abort);
        assert_eq!(options.overflow, OverflowPolicy::Clamp);
        assert_eq!(options.on_failure, FailurePolicy::Abort);
        assert_eq!(CodecOptions::default().overflow, OverflowPolicy::Wrap);
    }
}
