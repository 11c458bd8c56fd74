use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use byteorder::ByteOrder;
use memmap2::Mmap;

use crate::codecs::sample::{self, OverflowPolicy};
use crate::codecs::{
    AudioBuffer, CodecOptions, FORMAT_IEEE_FLOAT, FORMAT_PCM, FailurePolicy, SampleFormat,
    WavConfig,
};
use crate::prelude::*;

// Chunk Identifiers
const RIFF_CHUNK_ID: [u8; 4] = *b"RIFF";
const WAVE_FORMAT_ID: [u8; 4] = *b"WAVE";
const FMT_CHUNK_ID: [u8; 4] = *b"fmt ";
const DATA_CHUNK_ID: [u8; 4] = *b"data";

// Chunk Structures
const STANDARD_FMT_CHUNK_SIZE: u32 = 16;
const RIFF_PREAMBLE_SIZE: usize = 8; // RIFF + size

// Files above this size are mapped instead of copied into a payload buffer
const MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Identifies one fixed-width field of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldId {
    RiffTag,
    RiffSize,
    WaveTag,
    FmtTag,
    FmtSize,
    FormatCode,
    Channels,
    SampleRate,
    ByteRate,
    BlockAlign,
    BitDepth,
    DataTag,
    DataSize,
}

impl FieldId {
    pub fn name(self) -> &'static str {
        match self {
            FieldId::RiffTag => "RIFF",
            FieldId::RiffSize => "riff size",
            FieldId::WaveTag => "WAVE",
            FieldId::FmtTag => "fmt ",
            FieldId::FmtSize => "fmt chunk size",
            FieldId::FormatCode => "format code",
            FieldId::Channels => "channel count",
            FieldId::SampleRate => "sample rate",
            FieldId::ByteRate => "byte rate",
            FieldId::BlockAlign => "block align",
            FieldId::BitDepth => "bit depth",
            FieldId::DataTag => "data",
            FieldId::DataSize => "data size",
        }
    }
}

/// Wire shape of a header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A 4-byte ASCII chunk identifier that must match exactly.
    Tag([u8; 4]),
    U16,
    U32,
}

impl FieldKind {
    pub const fn width(self) -> usize {
        match self {
            FieldKind::Tag(_) | FieldKind::U32 => 4,
            FieldKind::U16 => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderField {
    pub id: FieldId,
    pub kind: FieldKind,
}

const fn field(id: FieldId, kind: FieldKind) -> HeaderField {
    HeaderField { id, kind }
}

/// The RIFF/fmt/data header, field by field, in file order. Both the writer
/// and the parser walk this table, so the data offset cannot drift between
/// them.
pub const HEADER_LAYOUT: [HeaderField; 13] = [
    field(FieldId::RiffTag, FieldKind::Tag(RIFF_CHUNK_ID)),
    field(FieldId::RiffSize, FieldKind::U32),
    field(FieldId::WaveTag, FieldKind::Tag(WAVE_FORMAT_ID)),
    field(FieldId::FmtTag, FieldKind::Tag(FMT_CHUNK_ID)),
    field(FieldId::FmtSize, FieldKind::U32),
    field(FieldId::FormatCode, FieldKind::U16),
    field(FieldId::Channels, FieldKind::U16),
    field(FieldId::SampleRate, FieldKind::U32),
    field(FieldId::ByteRate, FieldKind::U32),
    field(FieldId::BlockAlign, FieldKind::U16),
    field(FieldId::BitDepth, FieldKind::U16),
    field(FieldId::DataTag, FieldKind::Tag(DATA_CHUNK_ID)),
    field(FieldId::DataSize, FieldKind::U32),
];

const fn layout_size(layout: &[HeaderField]) -> usize {
    let mut size = 0;
    let mut i = 0;
    while i < layout.len() {
        size += layout[i].kind.width();
        i += 1;
    }
    size
}

/// Size of the fixed header in bytes.
pub const WAV_HEADER_SIZE: usize = layout_size(&HEADER_LAYOUT);

/// Byte offset of the first payload sample.
pub const DATA_OFFSET: u64 = WAV_HEADER_SIZE as u64;

const _: () = assert!(WAV_HEADER_SIZE == 44);

/// Numeric content of the header.
///
/// Derived from a [`WavConfig`] on write and parsed from the file on read;
/// never kept past the operation that built it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContainerHeader {
    pub riff_size: u32,
    pub fmt_size: u32,
    pub format_code: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl ContainerHeader {
    pub fn from_config(config: &WavConfig) -> std::result::Result<Self, ConfigError> {
        let format = config.validate()?;

        let data_size = config.data_size();
        let padded = data_size + data_size % 2;
        let riff_size = u32::try_from((WAV_HEADER_SIZE - RIFF_PREAMBLE_SIZE) as u64 + padded)
            .map_err(|_| ConfigError::PayloadTooLarge { bytes: data_size })?;

        let bytes_per_second = u64::from(config.sample_rate)
            * u64::from(config.bit_depth)
            * u64::from(config.channel_count)
            / 8;
        let byte_rate = u32::try_from(bytes_per_second)
            .map_err(|_| ConfigError::ByteRateOverflow { bytes_per_second })?;

        let block_align = u16::try_from(config.block_align()).map_err(|_| {
            ConfigError::FrameTooWide {
                block_align: config.block_align(),
            }
        })?;

        Ok(Self {
            riff_size,
            fmt_size: STANDARD_FMT_CHUNK_SIZE,
            format_code: format.format_code(),
            channels: config.channel_count,
            sample_rate: config.sample_rate,
            byte_rate,
            block_align,
            bits_per_sample: config.bit_depth,
            // fits: riff_size already holds it
            data_size: data_size as u32,
        })
    }

    /// Total bytes on disk, pad byte included.
    pub fn file_size(&self) -> u64 {
        let data_size = u64::from(self.data_size);
        DATA_OFFSET + data_size + data_size % 2
    }

    /// Wire format declared by the fmt chunk, if this codec supports it.
    pub fn sample_format(&self) -> Option<SampleFormat> {
        match (self.format_code, self.bits_per_sample) {
            (FORMAT_PCM, 8) => Some(SampleFormat::U8),
            (FORMAT_PCM, 16) => Some(SampleFormat::I16),
            (FORMAT_PCM, 24) => Some(SampleFormat::I24),
            (FORMAT_IEEE_FLOAT, 32) => Some(SampleFormat::F32),
            _ => None,
        }
    }

    fn get(&self, id: FieldId) -> u32 {
        match id {
            FieldId::RiffSize => self.riff_size,
            FieldId::FmtSize => self.fmt_size,
            FieldId::FormatCode => u32::from(self.format_code),
            FieldId::Channels => u32::from(self.channels),
            FieldId::SampleRate => self.sample_rate,
            FieldId::ByteRate => self.byte_rate,
            FieldId::BlockAlign => u32::from(self.block_align),
            FieldId::BitDepth => u32::from(self.bits_per_sample),
            FieldId::DataSize => self.data_size,
            FieldId::RiffTag | FieldId::WaveTag | FieldId::FmtTag | FieldId::DataTag => 0,
        }
    }

    // 16-bit fields only ever receive values read as u16.
    fn set(&mut self, id: FieldId, value: u32) {
        match id {
            FieldId::RiffSize => self.riff_size = value,
            FieldId::FmtSize => self.fmt_size = value,
            FieldId::FormatCode => self.format_code = value as u16,
            FieldId::Channels => self.channels = value as u16,
            FieldId::SampleRate => self.sample_rate = value,
            FieldId::ByteRate => self.byte_rate = value,
            FieldId::BlockAlign => self.block_align = value as u16,
            FieldId::BitDepth => self.bits_per_sample = value as u16,
            FieldId::DataSize => self.data_size = value,
            FieldId::RiffTag | FieldId::WaveTag | FieldId::FmtTag | FieldId::DataTag => {}
        }
    }

    /// Emits exactly [`WAV_HEADER_SIZE`] bytes.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for field in &HEADER_LAYOUT {
            match field.kind {
                FieldKind::Tag(tag) => out.write_all(&tag)?,
                FieldKind::U16 => out.write_u16::<LittleEndian>(self.get(field.id) as u16)?,
                FieldKind::U32 => out.write_u32::<LittleEndian>(self.get(field.id))?,
            }
        }
        Ok(())
    }

    /// Parses the header from the start of `bytes`, stopping at the first
    /// field that is missing or invalid.
    pub fn parse(bytes: &[u8]) -> std::result::Result<Self, ContainerError> {
        let mut header = Self::default();
        let mut offset = 0;

        for field in &HEADER_LAYOUT {
            let width = field.kind.width();
            let Some(raw) = bytes.get(offset..offset + width) else {
                return Err(ContainerError::ShortHeader {
                    field: field.id.name(),
                    parsed: offset,
                    expected: WAV_HEADER_SIZE,
                });
            };

            match field.kind {
                FieldKind::Tag(expected) => check_tag(field.id, &expected, raw)?,
                FieldKind::U16 => header.set(field.id, u32::from(LittleEndian::read_u16(raw))),
                FieldKind::U32 => header.set(field.id, LittleEndian::read_u32(raw)),
            }
            offset += width;

            // The fmt chunk is complete once the bit depth is in.
            if field.id == FieldId::BitDepth {
                header.check_format()?;
            }
        }

        Ok(header)
    }

    fn check_format(&self) -> std::result::Result<SampleFormat, ContainerError> {
        if self.fmt_size != STANDARD_FMT_CHUNK_SIZE {
            return Err(ContainerError::UnexpectedFmtSize(self.fmt_size));
        }
        let format = self
            .sample_format()
            .ok_or(ContainerError::UnsupportedFormat {
                format_code: self.format_code,
                bit_depth: self.bits_per_sample,
            })?;
        if self.channels == 0 {
            return Err(ContainerError::ZeroChannels);
        }
        if self.sample_rate == 0 {
            return Err(ContainerError::ZeroSampleRate);
        }
        let expected = u32::from(self.channels) * format.bytes_per_sample() as u32;
        if u32::from(self.block_align) != expected {
            return Err(ContainerError::BlockAlignMismatch {
                expected: expected.min(u32::from(u16::MAX)) as u16,
                found: self.block_align,
            });
        }
        Ok(format)
    }

    /// Reduces a parsed header to the caller-facing configuration.
    pub fn to_config(&self) -> std::result::Result<WavConfig, ContainerError> {
        self.check_format()?;
        if self.data_size == 0 {
            return Err(ContainerError::EmptyData);
        }
        let frame_size = u32::from(self.block_align);
        if self.data_size % frame_size != 0 {
            return Err(ContainerError::IndivisibleDataSize {
                data_size: self.data_size,
                frame_size,
            });
        }
        Ok(WavConfig {
            channel_count: self.channels,
            sample_count: self.data_size / frame_size,
            sample_rate: self.sample_rate,
            bit_depth: self.bits_per_sample,
        })
    }
}

/// Reads and writes the fixed 44-byte RIFF/WAVE layout.
///
/// Payload samples are interleaved on disk and de-interleaved in memory: the
/// codec walks frames in the outer loop and channels in the inner loop in both
/// directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavCodec {
    options: CodecOptions,
}

impl WavCodec {
    pub fn new(options: CodecOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> CodecOptions {
        self.options
    }

    pub fn file_extension(&self) -> &'static str {
        "wav"
    }

    /// Cheap signature check: `RIFF....WAVE`.
    pub fn validate_file_format(&self, data: &[u8]) -> Result<()> {
        let mut offset = 0;
        for field in &HEADER_LAYOUT[..3] {
            let width = field.kind.width();
            if let FieldKind::Tag(expected) = field.kind {
                let Some(raw) = data.get(offset..offset + width) else {
                    return Err(ContainerError::ShortHeader {
                        field: field.id.name(),
                        parsed: data.len(),
                        expected: WAV_HEADER_SIZE,
                    }
                    .into());
                };
                check_tag(field.id, &expected, raw)?;
            }
            offset += width;
        }
        Ok(())
    }

    /// Writes `channel_data` to `destination` and returns the number of frames
    /// written.
    ///
    /// `channel_data` holds one slice per channel, each at least
    /// `config.sample_count` long. A failure part way through the payload
    /// leaves a truncated file behind.
    pub fn write(
        &self,
        config: &WavConfig,
        destination: impl AsRef<Path>,
        channel_data: &[&[f32]],
    ) -> Result<usize> {
        self.settle("write", self.write_file(config, destination.as_ref(), channel_data))
    }

    /// Parses the header of `source` into the configuration it was written
    /// with.
    pub fn read_header(&self, source: impl AsRef<Path>) -> Result<WavConfig> {
        self.settle("read_header", read_header_file(source.as_ref()))
    }

    /// Fills `channel_buffers` from the payload of `source` and returns the
    /// number of frames read. The buffers are never reallocated; each must
    /// already hold `config.sample_count` samples.
    pub fn read(
        &self,
        config: &WavConfig,
        source: impl AsRef<Path>,
        channel_buffers: &mut [&mut [f32]],
    ) -> Result<usize> {
        self.settle("read", read_file(config, source.as_ref(), channel_buffers))
    }

    /// Reads the header, allocates the channel buffers and reads the payload.
    pub fn read_easy(&self, source: impl AsRef<Path>) -> Result<AudioBuffer> {
        self.settle("read_easy", read_easy_file(source.as_ref()))
    }

    /// Produces the exact bytes [`WavCodec::write`] would put on disk.
    pub fn encode(&self, config: &WavConfig, channel_data: &[&[f32]]) -> Result<Vec<u8>> {
        self.settle("encode", self.encode_vec(config, channel_data))
    }

    /// Inverse of [`WavCodec::encode`].
    pub fn decode(&self, input: &[u8]) -> Result<AudioBuffer> {
        self.settle("decode", decode_bytes(input))
    }

    fn write_file(
        &self,
        config: &WavConfig,
        destination: &Path,
        channel_data: &[&[f32]],
    ) -> Result<usize> {
        if destination.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath.into());
        }
        let format = check_buffers(config, channel_data)?;
        let header = ContainerHeader::from_config(config)?;

        let file = File::create(destination).map_err(|e| WavError::io(destination, e))?;
        let mut out = BufWriter::new(file);
        tracing::debug!(path = %destination.display(), ?header, "writing header");

        self.encode_into(&mut out, &header, config, format, channel_data)
            .and_then(|()| out.flush())
            .map_err(|e| WavError::io(destination, e))?;

        tracing::info!(
            path = %destination.display(),
            channels = config.channel_count,
            frames = config.sample_count,
            bit_depth = config.bit_depth,
            "wrote WAV file"
        );
        Ok(config.sample_count as usize)
    }

    fn encode_vec(&self, config: &WavConfig, channel_data: &[&[f32]]) -> Result<Vec<u8>> {
        let format = check_buffers(config, channel_data)?;
        let header = ContainerHeader::from_config(config)?;
        let mut out = allocate::<u8>(header.file_size() as usize)?;
        self.encode_into(&mut out, &header, config, format, channel_data)
            .map_err(|e| WavError::io("<memory>", e))?;
        Ok(out)
    }

    fn encode_into<W: Write>(
        &self,
        out: &mut W,
        header: &ContainerHeader,
        config: &WavConfig,
        format: SampleFormat,
        channel_data: &[&[f32]],
    ) -> io::Result<()> {
        header.write_to(out)?;

        let channels = &channel_data[..usize::from(config.channel_count)];
        for frame in 0..config.sample_count as usize {
            for channel in channels {
                sample::encode_sample(out, channel[frame], format, self.overflow())?;
            }
        }

        // RIFF chunks end on an even boundary
        if header.data_size % 2 == 1 {
            out.write_u8(0)?;
        }
        tracing::debug!(bytes = header.data_size, "wrote payload");
        Ok(())
    }

    fn overflow(&self) -> OverflowPolicy {
        self.options.overflow
    }

    fn settle<T>(&self, operation: &'static str, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if err.is_resource_failure() && self.options.on_failure == FailurePolicy::Abort {
                tracing::error!(operation, error = %err, "aborting");
                panic!("{operation} failed: {err}");
            }
            tracing::warn!(operation, error = %err, "operation failed");
        }
        result
    }
}

fn check_tag(id: FieldId, expected: &[u8], found: &[u8]) -> std::result::Result<(), ContainerError> {
    if found == expected {
        return Ok(());
    }
    Err(ContainerError::TagMismatch {
        field: id.name(),
        expected: String::from_utf8_lossy(expected).into_owned(),
        found: String::from_utf8_lossy(found).into_owned(),
    })
}

/// Checks a caller's channel buffers against `config`, in precondition order.
fn check_buffers<B: AsRef<[f32]>>(config: &WavConfig, buffers: &[B]) -> Result<SampleFormat> {
    if buffers.is_empty() {
        return Err(ConfigError::MissingChannelData {
            expected: config.channel_count,
            got: 0,
        }
        .into());
    }
    let format = config.validate()?;

    let channels = usize::from(config.channel_count);
    if buffers.len() < channels {
        return Err(ConfigError::MissingChannelData {
            expected: config.channel_count,
            got: buffers.len(),
        }
        .into());
    }
    for (channel, buffer) in buffers[..channels].iter().enumerate() {
        let len = buffer.as_ref().len();
        if len < config.sample_count as usize {
            return Err(ConfigError::ShortChannel {
                channel,
                len,
                expected: config.sample_count,
            }
            .into());
        }
    }
    Ok(format)
}

fn allocate<T>(len: usize) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| WavError::Allocation {
            bytes: len.saturating_mul(size_of::<T>()),
        })?;
    Ok(buffer)
}

fn allocate_channels(config: &WavConfig) -> Result<Vec<Vec<f32>>> {
    let frames = config.sample_count as usize;
    let mut data = allocate(usize::from(config.channel_count))?;
    for _ in 0..config.channel_count {
        let mut channel = allocate::<f32>(frames)?;
        channel.resize(frames, 0.0);
        data.push(channel);
    }
    Ok(data)
}

fn read_header_file(source: &Path) -> Result<WavConfig> {
    if source.as_os_str().is_empty() {
        return Err(ConfigError::EmptyPath.into());
    }
    let file = File::open(source).map_err(|e| WavError::io(source, e))?;

    let mut bytes = Vec::with_capacity(WAV_HEADER_SIZE);
    file.take(DATA_OFFSET)
        .read_to_end(&mut bytes)
        .map_err(|e| WavError::io(source, e))?;

    let header = ContainerHeader::parse(&bytes)?;
    let config = header.to_config()?;
    tracing::debug!(path = %source.display(), ?config, "parsed header");
    Ok(config)
}

fn read_file(config: &WavConfig, source: &Path, channel_buffers: &mut [&mut [f32]]) -> Result<usize> {
    read_file_with_threshold(config, source, channel_buffers, MMAP_THRESHOLD)
}

/// Files larger than `mmap_threshold` bytes are mapped instead of copied.
pub(crate) fn read_file_with_threshold(
    config: &WavConfig,
    source: &Path,
    channel_buffers: &mut [&mut [f32]],
    mmap_threshold: u64,
) -> Result<usize> {
    if source.as_os_str().is_empty() {
        return Err(ConfigError::EmptyPath.into());
    }
    let format = check_buffers(config, channel_buffers)?;
    let expected = config.data_size();

    let mut file = File::open(source).map_err(|e| WavError::io(source, e))?;
    let file_size = file
        .metadata()
        .map_err(|e| WavError::io(source, e))?
        .len();

    if file_size > mmap_threshold {
        // Only valid while nothing truncates the file underneath the mapping.
        let mapped = unsafe { Mmap::map(&file) }.map_err(|e| WavError::io(source, e))?;
        let payload = payload_slice(&mapped, expected)?;
        deinterleave(payload, config, format, channel_buffers);
    } else {
        file.seek(SeekFrom::Start(DATA_OFFSET))
            .map_err(|e| WavError::io(source, e))?;
        let mut payload = allocate::<u8>(expected as usize)?;
        file.take(expected)
            .read_to_end(&mut payload)
            .map_err(|e| WavError::io(source, e))?;
        if (payload.len() as u64) < expected {
            return Err(ContainerError::ShortPayload {
                expected,
                found: payload.len() as u64,
            }
            .into());
        }
        deinterleave(&payload, config, format, channel_buffers);
    }

    tracing::info!(
        path = %source.display(),
        channels = config.channel_count,
        frames = config.sample_count,
        "read WAV payload"
    );
    Ok(config.sample_count as usize)
}

fn read_easy_file(source: &Path) -> Result<AudioBuffer> {
    let config = read_header_file(source)?;
    let format = config.validate()?;
    let mut data = allocate_channels(&config)?;

    let mut views: Vec<&mut [f32]> = data.iter_mut().map(Vec::as_mut_slice).collect();
    read_file(&config, source, &mut views)?;

    Ok(AudioBuffer {
        sample_rate: config.sample_rate,
        channels: config.channel_count,
        format,
        data,
    })
}

fn decode_bytes(input: &[u8]) -> Result<AudioBuffer> {
    let header = ContainerHeader::parse(input)?;
    let config = header.to_config()?;
    let format = config.validate()?;
    let payload = payload_slice(input, config.data_size())?;

    let mut data = allocate_channels(&config)?;
    let mut views: Vec<&mut [f32]> = data.iter_mut().map(Vec::as_mut_slice).collect();
    deinterleave(payload, &config, format, &mut views);

    Ok(AudioBuffer {
        sample_rate: config.sample_rate,
        channels: config.channel_count,
        format,
        data,
    })
}

fn payload_slice(bytes: &[u8], expected: u64) -> std::result::Result<&[u8], ContainerError> {
    let found = (bytes.len() as u64).saturating_sub(DATA_OFFSET);
    if found < expected {
        return Err(ContainerError::ShortPayload { expected, found });
    }
    Ok(&bytes[WAV_HEADER_SIZE..WAV_HEADER_SIZE + expected as usize])
}

fn deinterleave(
    payload: &[u8],
    config: &WavConfig,
    format: SampleFormat,
    channel_buffers: &mut [&mut [f32]],
) {
    let width = format.bytes_per_sample();
    let block_align = width * usize::from(config.channel_count);
    let frames = payload
        .chunks_exact(block_align)
        .take(config.sample_count as usize);

    for (frame, bytes) in frames.enumerate() {
        for (channel, raw) in bytes.chunks_exact(width).enumerate() {
            channel_buffers[channel][frame] = sample::decode_sample(raw, format);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_index(id: FieldId) -> usize {
        HEADER_LAYOUT.iter().position(|field| field.id == id).unwrap()
    }

    fn ramp(len: usize, scale: f32) -> Vec<f32> {
        (0..len).map(|i| scale * (i as f32 / len as f32 - 0.5)).collect()
    }

    #[test]
    fn test_layout_size_and_offsets() {
        assert_eq!(WAV_HEADER_SIZE, 44);
        assert_eq!(layout_size(&HEADER_LAYOUT[..field_index(FieldId::FmtTag)]), 12);
        assert_eq!(layout_size(&HEADER_LAYOUT[..field_index(FieldId::DataTag)]), 36);
        assert_eq!(layout_size(&HEADER_LAYOUT[..field_index(FieldId::DataSize)]), 40);
    }

    #[test]
    fn test_header_bytes() {
        let config = WavConfig::new(1, 3, 8000, 16);
        let header = ContainerHeader::from_config(&config).unwrap();
        let mut bytes = Vec::new();
        header.write_to(&mut bytes).unwrap();

        #[rustfmt::skip]
        let expected: [u8; 44] = [
            b'R', b'I', b'F', b'F', 42, 0, 0, 0,
            b'W', b'A', b'V', b'E',
            b'f', b'm', b't', b' ', 16, 0, 0, 0,
            1, 0,                   // integer PCM
            1, 0,                   // channels
            0x40, 0x1F, 0, 0,       // 8000 Hz
            0x80, 0x3E, 0, 0,       // 16000 bytes/s
            2, 0,                   // block align
            16, 0,                  // bit depth
            b'd', b'a', b't', b'a', 6, 0, 0, 0,
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_float_format_code() {
        let header = ContainerHeader::from_config(&WavConfig::new(2, 10, 48000, 32)).unwrap();
        assert_eq!(header.format_code, FORMAT_IEEE_FLOAT);
        assert_eq!(header.byte_rate, 384000);
        assert_eq!(header.block_align, 8);
    }

    #[test]
    fn test_odd_payload_is_padded() {
        let config = WavConfig::new(1, 3, 8000, 8);
        let samples = [0.0f32, 0.5, -0.5];
        let bytes = WavCodec::default().encode(&config, &[&samples[..]]).unwrap();

        assert_eq!(bytes.len(), 48);
        assert_eq!(LittleEndian::read_u32(&bytes[4..8]), 40);
        assert_eq!(LittleEndian::read_u32(&bytes[40..44]), 3);
        assert_eq!(bytes[44], 128);
        assert_eq!(bytes[47], 0);
    }

    #[test]
    fn test_payload_is_interleaved() {
        let config = WavConfig::new(2, 2, 8000, 8);
        let left = [0.0f32, 0.5];
        let right = [-0.5f32, 1.0];
        let bytes = WavCodec::default().encode(&config, &[&left[..], &right[..]]).unwrap();
        // frame 0: L R, frame 1: L R
        assert_eq!(&bytes[44..48], &[128, 65, 191, 255]);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let codec = WavCodec::default();
        for bit_depth in [8, 16, 24, 32] {
            let config = WavConfig::new(3, 257, 22050, bit_depth);
            let channels = [ramp(257, 1.0), ramp(257, -0.7), ramp(257, 0.3)];
            let views: Vec<&[f32]> = channels.iter().map(Vec::as_slice).collect();

            let bytes = codec.encode(&config, &views).unwrap();
            assert_eq!(bytes.len() as u64 % 2, 0);

            let decoded = codec.decode(&bytes).unwrap();
            assert_eq!(decoded.config(), config);
            for (original, restored) in channels.iter().zip(&decoded.data) {
                for (a, b) in original.iter().zip(restored) {
                    assert!((a - b).abs() <= 1.0 / 127.0 + f32::EPSILON);
                }
            }
        }
    }

    #[test]
    fn test_parse_rejects_bad_riff_tag() {
        let mut bytes = WavCodec::default()
            .encode(&WavConfig::new(1, 4, 8000, 16), &[&[0.0f32; 4][..]])
            .unwrap();
        bytes[3] = b'X';
        let err = ContainerHeader::parse(&bytes).unwrap_err();
        assert!(matches!(err, ContainerError::TagMismatch { field: "RIFF", .. }));
    }

    #[test]
    fn test_parse_checks_fields_in_order() {
        let mut bytes = WavCodec::default()
            .encode(&WavConfig::new(1, 4, 8000, 16), &[&[0.0f32; 4][..]])
            .unwrap();
        // Break both the format code and the data tag; the fmt field comes first.
        bytes[20] = 2;
        bytes[36] = b'D';
        let err = ContainerHeader::parse(&bytes).unwrap_err();
        assert_eq!(
            err,
            ContainerError::UnsupportedFormat {
                format_code: 2,
                bit_depth: 16
            }
        );
    }

    #[test]
    fn test_parse_short_header() {
        let bytes = WavCodec::default()
            .encode(&WavConfig::new(1, 4, 8000, 16), &[&[0.0f32; 4][..]])
            .unwrap();
        let err = ContainerHeader::parse(&bytes[..30]).unwrap_err();
        assert_eq!(
            err,
            ContainerError::ShortHeader {
                field: "byte rate",
                parsed: 28,
                expected: 44
            }
        );
    }

    #[test]
    fn test_integer_32_bit_is_unsupported() {
        let mut header = ContainerHeader::from_config(&WavConfig::new(1, 4, 8000, 32)).unwrap();
        header.format_code = FORMAT_PCM;
        let mut bytes = Vec::new();
        header.write_to(&mut bytes).unwrap();
        assert!(matches!(
            ContainerHeader::parse(&bytes),
            Err(ContainerError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_indivisible_data_size() {
        let mut header = ContainerHeader::from_config(&WavConfig::new(2, 4, 8000, 16)).unwrap();
        header.data_size = 15;
        assert_eq!(
            header.to_config(),
            Err(ContainerError::IndivisibleDataSize {
                data_size: 15,
                frame_size: 4
            })
        );
    }

    #[test]
    fn test_block_align_mismatch() {
        let mut header = ContainerHeader::from_config(&WavConfig::new(2, 4, 8000, 16)).unwrap();
        header.block_align = 2;
        assert_eq!(
            header.to_config(),
            Err(ContainerError::BlockAlignMismatch {
                expected: 4,
                found: 2
            })
        );
    }

    #[test]
    fn test_decode_short_payload() {
        let bytes = WavCodec::default()
            .encode(&WavConfig::new(1, 8, 8000, 16), &[&[0.25f32; 8][..]])
            .unwrap();
        let err = WavCodec::default().decode(&bytes[..50]).unwrap_err();
        assert!(matches!(
            err,
            WavError::MalformedContainer(ContainerError::ShortPayload {
                expected: 16,
                found: 6
            })
        ));
    }

    #[test]
    fn test_validate_file_format() {
        let codec = WavCodec::default();
        let bytes = codec
            .encode(&WavConfig::new(1, 2, 8000, 16), &[&[0.0f32; 2][..]])
            .unwrap();
        assert!(codec.validate_file_format(&bytes).is_ok());
        assert!(codec.validate_file_format(b"RIFF").is_err());
        assert!(codec.validate_file_format(b"RIFF\0\0\0\0AVI LIST").is_err());
    }

    #[test]
    fn test_encode_preconditions() {
        let codec = WavCodec::default();
        let samples = [0.0f32; 4];

        let missing = codec.encode(&WavConfig::new(2, 4, 8000, 16), &[]).unwrap_err();
        assert!(matches!(
            missing,
            WavError::InvalidConfig(ConfigError::MissingChannelData { got: 0, .. })
        ));

        let too_few = codec
            .encode(&WavConfig::new(2, 4, 8000, 16), &[&samples[..]])
            .unwrap_err();
        assert!(matches!(
            too_few,
            WavError::InvalidConfig(ConfigError::MissingChannelData { got: 1, .. })
        ));

        let short = codec
            .encode(&WavConfig::new(1, 5, 8000, 16), &[&samples[..]])
            .unwrap_err();
        assert!(matches!(
            short,
            WavError::InvalidConfig(ConfigError::ShortChannel { len: 4, .. })
        ));
    }

    #[test]
    fn test_clamp_policy_reaches_payload() {
        let config = WavConfig::new(1, 1, 8000, 8);
        let wrap = WavCodec::default().encode(&config, &[&[1.5f32][..]]).unwrap();
        let clamp = WavCodec::new(CodecOptions::default().with_overflow(OverflowPolicy::Clamp))
            .encode(&config, &[&[1.5f32][..]])
            .unwrap();
        assert_eq!(wrap[44], 62);
        assert_eq!(clamp[44], 255);
    }

    fn write_sine_file(path: &Path, config: &WavConfig) -> Vec<Vec<f32>> {
        let channels: Vec<Vec<f32>> = (0..config.channel_count)
            .map(|ch| ramp(config.sample_count as usize, 0.9 - 0.3 * f32::from(ch)))
            .collect();
        let views: Vec<&[f32]> = channels.iter().map(Vec::as_slice).collect();
        WavCodec::default().write(config, path, &views).unwrap();
        channels
    }

    #[test]
    fn test_mapped_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapped.wav");
        let config = WavConfig::new(2, 501, 16000, 24);
        let channels = write_sine_file(&path, &config);

        let mut left = vec![0.0f32; 501];
        let mut right = vec![0.0f32; 501];
        let frames =
            read_file_with_threshold(&config, &path, &mut [&mut left[..], &mut right[..]], 0)
                .unwrap();
        assert_eq!(frames, 501);

        for (original, restored) in channels.iter().zip([&left, &right]) {
            for (a, b) in original.iter().zip(restored) {
                assert!((a - b).abs() <= 1e-6);
            }
        }
    }

    #[test]
    fn test_mapped_read_reports_short_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapped_short.wav");
        let config = WavConfig::new(1, 100, 8000, 16);
        write_sine_file(&path, &config);

        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(DATA_OFFSET + 50).unwrap();
        drop(file);

        let mut buffer = vec![0.0f32; 100];
        let err = read_file_with_threshold(&config, &path, &mut [&mut buffer[..]], 0).unwrap_err();
        assert!(matches!(
            err,
            WavError::MalformedContainer(ContainerError::ShortPayload {
                expected: 200,
                found: 50
            })
        ));
        assert!(buffer.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_fmt_tag_mismatch_names_full_tag() {
        let mut bytes = WavCodec::default()
            .encode(&WavConfig::new(1, 4, 8000, 16), &[&[0.0f32; 4][..]])
            .unwrap();
        bytes[12] = b'F';
        let err = ContainerHeader::parse(&bytes).unwrap_err();
        assert!(matches!(err, ContainerError::TagMismatch { field: "fmt ", .. }));
    }

    #[test]
    fn test_wide_frame_is_rejected() {
        let config = WavConfig::new(20000, 1, 8000, 32);
        assert_eq!(
            ContainerHeader::from_config(&config),
            Err(ConfigError::FrameTooWide { block_align: 80000 })
        );
    }

    #[test]
    fn test_oversized_payload_is_rejected() {
        let config = WavConfig::new(u16::MAX, u32::MAX, 8000, 32);
        assert!(matches!(
            ContainerHeader::from_config(&config),
            Err(ConfigError::PayloadTooLarge { .. })
        ));
    }
}
