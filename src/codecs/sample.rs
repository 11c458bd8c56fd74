//! Scalar conversion between normalized `f32` samples and the four wire
//! encodings. Nothing here knows about files or chunk structure.
//!
//! | depth | encode                                   | decode              |
//! |-------|------------------------------------------|---------------------|
//! | 32    | IEEE-754 passthrough, never clamped      | passthrough         |
//! | 24    | `round(s * 8388607)`, masked to 24 bits   | sign-extend, `2^-31`|
//! | 16    | `trunc(s * 32768)`, clamped to i16        | `2^-15`             |
//! | 8     | `128 + trunc(s * 127)`, unsigned byte     | `(b - 128) / 127`   |

use crate::codecs::SampleFormat;
use crate::prelude::*;

// Sample conversion constants
const U8_SCALE: f32 = 127.0;
const U8_OFFSET: i32 = 128;
const I16_SCALE: f32 = 32768.0;
const I16_INV_SCALE: f32 = 1.0 / 32768.0; // 2^-15
const I24_MAX_F: f32 = 8388607.0;
const I24_MIN: i32 = -8388608;
const I24_MAX: i32 = 8388607;
const I32_INV_SCALE: f32 = 1.0 / 2147483648.0; // 2^-31

//Bit Operations
const I24_MASK: i32 = 0xFFFFFF;

/// How the 8- and 24-bit encoders treat values that land outside the
/// representable range. 16-bit always clamps and 32-bit never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Keep the low bits, as a fixed-width store would.
    #[default]
    Wrap,
    /// Saturate to the nearest representable value.
    Clamp,
}

pub fn encode_u8(sample: f32, overflow: OverflowPolicy) -> u8 {
    let v = U8_OFFSET + (sample * U8_SCALE) as i32;
    match overflow {
        OverflowPolicy::Wrap => v as u8,
        OverflowPolicy::Clamp => v.clamp(0, 255) as u8,
    }
}

pub fn decode_u8(byte: u8) -> f32 {
    (i32::from(byte) - U8_OFFSET) as f32 / U8_SCALE
}

pub fn encode_i16(sample: f32) -> i16 {
    // 1.0 * 32768 is one past i16::MAX
    ((sample * I16_SCALE) as i32).clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

pub fn decode_i16(value: i16) -> f32 {
    f32::from(value) * I16_INV_SCALE
}

/// Returns the three little-endian bytes of the 24-bit field.
pub fn encode_i24(sample: f32, overflow: OverflowPolicy) -> [u8; 3] {
    let v = (sample * I24_MAX_F).round() as i32;
    let v = match overflow {
        OverflowPolicy::Wrap => v & I24_MASK,
        OverflowPolicy::Clamp => v.clamp(I24_MIN, I24_MAX),
    };
    let [b0, b1, b2, _] = v.to_le_bytes();
    [b0, b1, b2]
}

pub fn decode_i24(bytes: [u8; 3]) -> f32 {
    // Shift the field into the top of an i32 so its sign bit lands in bit 31.
    let v = i32::from_le_bytes([0, bytes[0], bytes[1], bytes[2]]);
    v as f32 * I32_INV_SCALE
}

/// Appends one encoded scalar to `out`.
pub fn encode_sample<W: Write>(
    out: &mut W,
    sample: f32,
    format: SampleFormat,
    overflow: OverflowPolicy,
) -> std::io::Result<()> {
    match format {
        SampleFormat::U8 => out.write_u8(encode_u8(sample, overflow)),
        SampleFormat::I16 => out.write_i16::<LittleEndian>(encode_i16(sample)),
        SampleFormat::I24 => out.write_all(&encode_i24(sample, overflow)),
        SampleFormat::F32 => out.write_f32::<LittleEndian>(sample),
    }
}

/// Decodes one scalar. `bytes` must hold exactly `format.bytes_per_sample()`
/// bytes.
pub fn decode_sample(bytes: &[u8], format: SampleFormat) -> f32 {
    match format {
        SampleFormat::U8 => decode_u8(bytes[0]),
        SampleFormat::I16 => decode_i16(i16::from_le_bytes([bytes[0], bytes[1]])),
        SampleFormat::I24 => decode_i24([bytes[0], bytes[1], bytes[2]]),
        SampleFormat::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}
