//! Encoding tags, byte order, and encoding detection for unlabeled buffers.

pub mod bom;
pub mod detect;

use core::fmt;

use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Byte order of UTF-16 code units in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// Byte order of the host.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Self = Self::Little;
    /// Byte order of the host.
    #[cfg(target_endian = "big")]
    pub const NATIVE: Self = Self::Big;

    #[inline]
    pub const fn is_big(self) -> bool {
        matches!(self, Self::Big)
    }
}

/// A Unicode encoding scheme.
///
/// Each variant's discriminant is its flag in an [`EncodingSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Encoding {
    /// Nothing matched.
    Unspecified = 0,
    Utf8 = 1,
    Utf16Le = 2,
    Utf16Be = 4,
    Utf32Le = 8,
    /// Only produced by BOM sniffing on little-endian hosts.
    Utf32Be = 16,
}

impl Encoding {
    /// UTF-32 in host byte order, the form every UTF-32 routine works with.
    #[cfg(target_endian = "little")]
    pub const UTF32_NATIVE: Self = Self::Utf32Le;
    /// UTF-32 in host byte order, the form every UTF-32 routine works with.
    #[cfg(target_endian = "big")]
    pub const UTF32_NATIVE: Self = Self::Utf32Be;

    const ALL: [Self; 5] = [
        Self::Utf8,
        Self::Utf16Le,
        Self::Utf16Be,
        Self::Utf32Le,
        Self::Utf32Be,
    ];

    /// The byte order mark for this encoding, empty for `Unspecified`.
    pub const fn bom_bytes(self) -> &'static [u8] {
        match self {
            Self::Unspecified => &[],
            Self::Utf8 => &[0xEF, 0xBB, 0xBF],
            Self::Utf16Le => &[0xFF, 0xFE],
            Self::Utf16Be => &[0xFE, 0xFF],
            Self::Utf32Le => &[0xFF, 0xFE, 0x00, 0x00],
            Self::Utf32Be => &[0x00, 0x00, 0xFE, 0xFF],
        }
    }

    #[inline]
    pub const fn bom_len(self) -> usize {
        self.bom_bytes().len()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Utf8 => "UTF-8",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf16Be => "UTF-16BE",
            Self::Utf32Le => "UTF-32LE",
            Self::Utf32Be => "UTF-32BE",
        }
    }

    /// Size in bytes of one code unit.
    pub const fn unit_size(self) -> usize {
        match self {
            Self::Unspecified | Self::Utf8 => 1,
            Self::Utf16Le | Self::Utf16Be => 2,
            Self::Utf32Le | Self::Utf32Be => 4,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// A set of plausible encodings, as returned by detection.
    ///
    /// Flags are declared in preference order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct EncodingSet: u8 {
        const UTF8 = Encoding::Utf8 as u8;
        const UTF16_LE = Encoding::Utf16Le as u8;
        const UTF16_BE = Encoding::Utf16Be as u8;
        const UTF32_LE = Encoding::Utf32Le as u8;
        const UTF32_BE = Encoding::Utf32Be as u8;
    }
}

impl EncodingSet {
    /// UTF-32 in host byte order.
    pub const UTF32_NATIVE: Self = Self::of(Encoding::UTF32_NATIVE);

    /// The set holding just `encoding`; empty for `Unspecified`.
    #[inline]
    pub const fn of(encoding: Encoding) -> Self {
        Self::from_bits_retain(encoding as u8)
    }

    /// Returns `true` if `encoding` is a member.
    #[inline]
    pub const fn has(self, encoding: Encoding) -> bool {
        let flag = Self::of(encoding);
        !flag.is_empty() && self.contains(flag)
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.bits().count_ones() as usize
    }

    /// Members in preference order: UTF-8, UTF-16LE, UTF-16BE, UTF-32.
    pub fn encodings(self) -> impl Iterator<Item = Encoding> {
        Encoding::ALL.into_iter().filter(move |&e| self.has(e))
    }

    /// The most preferred member, or [`Encoding::Unspecified`] when empty.
    #[inline]
    pub fn first(self) -> Encoding {
        self.encodings().next().unwrap_or(Encoding::Unspecified)
    }
}

impl From<Encoding> for EncodingSet {
    #[inline]
    fn from(encoding: Encoding) -> Self {
        Self::of(encoding)
    }
}

impl fmt::Display for EncodingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str(Encoding::Unspecified.name());
        }
        for (i, encoding) in self.encodings().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(encoding.name())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bom_lengths() {
        assert_eq!(Encoding::Utf8.bom_len(), 3);
        assert_eq!(Encoding::Utf16Be.bom_len(), 2);
        assert_eq!(Encoding::Utf32Le.bom_len(), 4);
        assert_eq!(Encoding::Unspecified.bom_len(), 0);
    }

    #[test]
    fn set_membership() {
        let set = EncodingSet::UTF8 | EncodingSet::UTF32_LE;
        assert!(set.has(Encoding::Utf8));
        assert!(!set.has(Encoding::Utf16Le));
        assert!(!set.has(Encoding::Unspecified));
        assert_eq!(set.len(), 2);
        assert_eq!(set.first(), Encoding::Utf8);
        assert_eq!(EncodingSet::empty().first(), Encoding::Unspecified);
        assert!(EncodingSet::of(Encoding::Unspecified).is_empty());
    }

    #[test]
    fn set_iteration_order() {
        let mut set = EncodingSet::from(Encoding::Utf32Le);
        set |= EncodingSet::UTF16_LE;
        set.insert(EncodingSet::UTF8);
        let all: Vec<_> = set.encodings().collect();
        assert_eq!(
            all,
            vec![Encoding::Utf8, Encoding::Utf16Le, Encoding::Utf32Le]
        );
        assert_eq!(set.to_string(), "UTF-8, UTF-16LE, UTF-32LE");
    }

    #[test]
    fn native_endianness() {
        assert_eq!(Endianness::NATIVE.is_big(), cfg!(target_endian = "big"));
    }
}
