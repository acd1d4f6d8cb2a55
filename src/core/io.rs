//! Byte-level codec helpers and `.index` file access
//!
//! All integers in the index format are little-endian. Identifiers and most
//! counts are 24-bit, which has no native Rust integer, so both directions go
//! through the helpers here rather than `to_le_bytes` on the call sites.

use crate::error::{IndexError, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Largest value representable in a 3-byte field
pub const U24_MAX: u32 = 0x00FF_FFFF;

/// File extension of index artifacts
pub const INDEX_EXTENSION: &str = "index";

/// Append-only little-endian writer
#[derive(Debug, Default)]
pub struct ByteWriter {
    bytes: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        ByteWriter { bytes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ByteWriter {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    /// Write a 3-byte little-endian value, rejecting anything above [`U24_MAX`]
    pub fn write_u24(&mut self, field: &'static str, value: u32) -> Result<()> {
        if value > U24_MAX {
            return Err(IndexError::FieldOverflow {
                field,
                value: value as u64,
                max: U24_MAX as u64,
            });
        }
        self.bytes.extend_from_slice(&value.to_le_bytes()[..3]);
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a count or length into a field of `width` bytes (1 or 3)
    pub fn write_sized(&mut self, field: &'static str, width: usize, value: usize) -> Result<()> {
        let max = match width {
            1 => u8::MAX as u64,
            3 => U24_MAX as u64,
            _ => unreachable!("index format only uses 1 and 3 byte count fields"),
        };
        if value as u64 > max {
            return Err(IndexError::FieldOverflow {
                field,
                value: value as u64,
                max,
            });
        }
        if width == 1 {
            self.write_u8(value as u8);
            Ok(())
        } else {
            self.write_u24(field, value as u32)
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Write `value` right-padded with zero bytes to exactly `width` bytes
    pub fn write_padded(&mut self, field: &'static str, value: &str, width: usize) -> Result<()> {
        let raw = value.as_bytes();
        if raw.len() > width {
            return Err(IndexError::FieldOverflow {
                field,
                value: raw.len() as u64,
                max: width as u64,
            });
        }
        self.bytes.extend_from_slice(raw);
        self.bytes.resize(self.bytes.len() + (width - raw.len()), 0);
        Ok(())
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

/// Bounds-checked little-endian cursor over an index buffer
///
/// Every read that runs past the end of the buffer fails with
/// [`IndexError::TruncatedIndex`]; nothing is ever read partially.
#[derive(Debug)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        ByteReader { bytes, offset: 0 }
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Fail with `TruncatedIndex` unless `needed` more bytes are available
    pub fn ensure(&self, needed: usize) -> Result<()> {
        if needed > self.remaining() {
            return Err(IndexError::TruncatedIndex {
                offset: self.offset,
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        let b = self.take(3)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], 0]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a 1 or 3 byte count field
    pub fn read_sized(&mut self, width: usize) -> Result<usize> {
        match width {
            1 => Ok(self.read_u8()? as usize),
            3 => Ok(self.read_u24()? as usize),
            _ => unreachable!("index format only uses 1 and 3 byte count fields"),
        }
    }

    /// Read `len` raw bytes as UTF-8 text
    pub fn read_str(&mut self, field: &str, len: usize) -> Result<String> {
        let raw = self.take(len)?;
        decode_utf8(field, raw)
    }

    /// Read a zero-padded string field of `width` bytes, trimming the padding
    pub fn read_padded(&mut self, field: &str, width: usize) -> Result<String> {
        let raw = self.take(width)?;
        decode_utf8(field, trim_padding(raw))
    }
}

fn decode_utf8(field: &str, raw: &[u8]) -> Result<String> {
    String::from_utf8(raw.to_vec())
        .map_err(|_| IndexError::MalformedIndex(format!("{} is not valid UTF-8", field)))
}

/// Strip trailing zero bytes from a padded field
pub fn trim_padding(raw: &[u8]) -> &[u8] {
    let end = raw.iter().rposition(|&b| b != 0).map_or(0, |pos| pos + 1);
    &raw[..end]
}

/// Read an entire index artifact into memory
pub fn read_index_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    Ok(fs::read(path)?)
}

/// Write an index artifact, replacing any existing file
pub fn write_index_file<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(())
}

/// Conventional artifact name, e.g. `hk4e51.index` for game `hk4e` version `5.1`
pub fn index_file_name(game: &str, version: &str) -> String {
    format!("{}{}.{}", game, version.replace('.', ""), INDEX_EXTENSION)
}

/// Conventional name of the debug lookup artifact written next to the index
pub fn meta_file_name(game: &str, version: &str) -> String {
    format!("{}{}index-meta.json", game, version.replace('.', ""))
}
