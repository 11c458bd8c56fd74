//! Error types for the WAV codec.
//!
//! Every failure falls into one of four families: an invalid [`WavConfig`],
//! an I/O failure on the file being read or written, a malformed container, or
//! a failed allocation of the transient payload buffer.
//!
//! [`WavConfig`]: crate::codecs::WavConfig

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, WavError>;

/// Errors that can occur when reading or writing a WAV file.
#[derive(Debug, Error)]
pub enum WavError {
    /// The caller-supplied configuration or buffers were rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Opening, seeking, reading, writing or flushing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file does not follow the fixed RIFF/fmt/data layout.
    #[error("malformed container: {0}")]
    MalformedContainer(#[from] ContainerError),

    /// The internal payload buffer could not be reserved.
    #[error("failed to allocate {bytes} bytes for the sample payload")]
    Allocation { bytes: usize },
}

impl WavError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures of the environment rather than of the input:
    /// I/O and allocation errors.
    pub fn is_resource_failure(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Allocation { .. })
    }
}

/// Precondition failures, listed in the order they are checked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("path must not be empty")]
    EmptyPath,

    #[error("channel data must hold {expected} channels, got {got}")]
    MissingChannelData { expected: u16, got: usize },

    #[error("number of channels must be greater than 0")]
    ZeroChannels,

    #[error("number of samples must be greater than 0")]
    ZeroSamples,

    #[error("sample rate must be greater than 0")]
    ZeroSampleRate,

    #[error("bit depth must be 8, 16, 24 or 32, got {0}")]
    UnsupportedBitDepth(u16),

    #[error("channel {channel} holds {len} samples, expected at least {expected}")]
    ShortChannel {
        channel: usize,
        len: usize,
        expected: u32,
    },

    #[error("payload of {bytes} bytes does not fit a RIFF container")]
    PayloadTooLarge { bytes: u64 },

    #[error("byte rate of {bytes_per_second} bytes/s does not fit the fmt chunk")]
    ByteRateOverflow { bytes_per_second: u64 },

    #[error("frame of {block_align} bytes does not fit the fmt chunk")]
    FrameTooWide { block_align: u32 },
}

/// Structural failures found while parsing a container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    #[error("invalid {field} tag: expected {expected:?}, found {found:?}")]
    TagMismatch {
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("header truncated at {field}: parsed {parsed} of {expected} bytes")]
    ShortHeader {
        field: &'static str,
        parsed: usize,
        expected: usize,
    },

    #[error("fmt chunk size must be 16, found {0}")]
    UnexpectedFmtSize(u32),

    #[error("unsupported format code {format_code} for {bit_depth}-bit samples")]
    UnsupportedFormat { format_code: u16, bit_depth: u16 },

    #[error("block align {found} does not match {expected} for the declared format")]
    BlockAlignMismatch { expected: u16, found: u16 },

    #[error("channel count must be greater than 0")]
    ZeroChannels,

    #[error("sample rate must be greater than 0")]
    ZeroSampleRate,

    #[error("data chunk is empty")]
    EmptyData,

    #[error("data size {data_size} is not a multiple of the {frame_size}-byte frame")]
    IndivisibleDataSize { data_size: u32, frame_size: u32 },

    #[error("payload truncated: expected {expected} bytes, found {found}")]
    ShortPayload { expected: u64, found: u64 },
}
