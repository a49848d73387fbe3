//! Reading inputs and viewing them as code units.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Read};
use std::ops::Deref;
use std::path::Path;
use turbo_unicode::{Encoding, Endianness};

/// Encodings accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TextEncoding {
    #[value(name = "utf8", alias = "utf-8")]
    Utf8,
    #[value(name = "utf16le", alias = "utf-16le")]
    Utf16Le,
    #[value(name = "utf16be", alias = "utf-16be")]
    Utf16Be,
    /// UTF-32 in host byte order
    #[value(name = "utf32", alias = "utf-32")]
    Utf32,
}

impl TextEncoding {
    pub fn unit_size(self) -> usize {
        match self {
            Self::Utf8 => 1,
            Self::Utf16Le | Self::Utf16Be => 2,
            Self::Utf32 => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf16Be => "UTF-16BE",
            Self::Utf32 => "UTF-32",
        }
    }

    /// The tag used by detection, if this encoding has one on this host.
    pub fn from_detected(encoding: Encoding) -> Option<Self> {
        match encoding {
            Encoding::Utf8 => Some(Self::Utf8),
            Encoding::Utf16Le => Some(Self::Utf16Le),
            Encoding::Utf16Be => Some(Self::Utf16Be),
            e if e == Encoding::UTF32_NATIVE => Some(Self::Utf32),
            _ => None,
        }
    }
}

/// File contents, memory-mapped when read from a non-empty file.
pub enum Input {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for Input {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Mapped(map) => map,
            Self::Owned(bytes) => bytes,
        }
    }
}

/// Read `path`, or stdin when `path` is `None`.
pub fn read(path: Option<&Path>) -> io::Result<Input> {
    let Some(path) = path else {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        return Ok(Input::Owned(buf));
    };
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        // Mapping an empty file fails on some platforms
        return Ok(Input::Owned(Vec::new()));
    }
    // SAFETY: the mapping is only read. Another process truncating the file
    // while we hold it is not something we can defend against.
    let map = unsafe { Mmap::map(&file)? };
    Ok(Input::Mapped(map))
}

// Units keep their in-memory byte order; the kernels handle swapping.
fn units16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
        .collect()
}

fn units32(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|quad| u32::from_ne_bytes([quad[0], quad[1], quad[2], quad[3]]))
        .collect()
}

/// An input viewed as code units of one encoding.
pub enum Text<'a> {
    Utf8(&'a [u8]),
    Utf16(Vec<u16>, Endianness),
    Utf32(Vec<u32>),
}

impl<'a> Text<'a> {
    /// View `bytes` as `encoding`. Fails when the length is not a whole
    /// number of units.
    pub fn new(bytes: &'a [u8], encoding: TextEncoding) -> Result<Self> {
        let size = encoding.unit_size();
        if bytes.len() % size != 0 {
            bail!(
                "{} input of {} bytes is not a whole number of {}-byte units",
                encoding.name(),
                bytes.len(),
                size
            );
        }
        Ok(match encoding {
            TextEncoding::Utf8 => Self::Utf8(bytes),
            TextEncoding::Utf16Le => Self::Utf16(units16(bytes), Endianness::Little),
            TextEncoding::Utf16Be => Self::Utf16(units16(bytes), Endianness::Big),
            TextEncoding::Utf32 => Self::Utf32(units32(bytes)),
        })
    }

    pub fn validate(&self) -> turbo_unicode::TranscodeResult {
        match self {
            Self::Utf8(bytes) => turbo_unicode::validate_utf8_with_errors(bytes),
            Self::Utf16(units, endianness) => {
                turbo_unicode::validate_utf16_with_errors(units, *endianness)
            }
            Self::Utf32(units) => turbo_unicode::validate_utf32_with_errors(units),
        }
    }

    /// Code points in valid text.
    pub fn count(&self) -> usize {
        match self {
            Self::Utf8(bytes) => turbo_unicode::count_utf8(bytes),
            Self::Utf16(units, endianness) => turbo_unicode::count_utf16(units, *endianness),
            Self::Utf32(units) => units.len(),
        }
    }

    /// Lengths of valid text in UTF-8 bytes, UTF-16 units and UTF-32 units.
    pub fn lengths(&self) -> (usize, usize, usize) {
        match self {
            Self::Utf8(bytes) => (
                bytes.len(),
                turbo_unicode::utf16_length_from_utf8(bytes),
                turbo_unicode::utf32_length_from_utf8(bytes),
            ),
            Self::Utf16(units, endianness) => (
                turbo_unicode::utf8_length_from_utf16(units, *endianness),
                units.len(),
                turbo_unicode::utf32_length_from_utf16(units, *endianness),
            ),
            Self::Utf32(units) => (
                turbo_unicode::utf8_length_from_utf32(units),
                turbo_unicode::utf16_length_from_utf32(units),
                units.len(),
            ),
        }
    }
}

/// Display name for an optional path.
pub fn display_name(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "<stdin>".to_string())
}

/// Read and report which file failed.
pub fn read_named(path: Option<&Path>) -> Result<Input> {
    read(path).with_context(|| format!("failed to read {}", display_name(path)))
}
