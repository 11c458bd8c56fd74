pub use crate::codecs::*;
pub use crate::error::{ConfigError, ContainerError, Result, WavError};
pub use anyhow::{Context, Result as R, anyhow};
pub use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

pub use std::io::{Read, Seek, SeekFrom, Write};
