//! Encoding detection for unlabeled buffers.
//!
//! A leading byte order mark settles the question on its own. Otherwise
//! the buffer is tried as UTF-8, as UTF-16LE when its length is even, and as
//! host-endian UTF-32 when its length is a multiple of four. Byte buffers
//! that are not aligned for wider units are validated through a small
//! stack buffer instead of being reinterpreted.

use super::{bom, Encoding, EncodingSet};
use crate::kernel::KernelOps;
use crate::scalar::utf16::is_high_surrogate;

/// Units copied per round when the input is not suitably aligned.
const CHUNK: usize = 256;

fn utf16le_bytes_valid(ops: &KernelOps, bytes: &[u8]) -> bool {
    if let Ok(units) = bytemuck::try_cast_slice::<u8, u16>(bytes) {
        return ops.validate_utf16le(units);
    }

    let mut buf = [0u16; CHUNK];
    let mut rest = bytes;
    while !rest.is_empty() {
        let available = rest.len() / 2;
        let take = available.min(CHUNK);
        for (dst, pair) in buf[..take].iter_mut().zip(rest.chunks_exact(2)) {
            *dst = u16::from_ne_bytes([pair[0], pair[1]]);
        }
        // Keep a trailing high surrogate for the next round so pairs stay whole
        let mut n = take;
        if take < available && is_high_surrogate(u16::from_le(buf[take - 1])) {
            n -= 1;
        }
        if !ops.validate_utf16le(&buf[..n]) {
            return false;
        }
        rest = &rest[n * 2..];
    }
    true
}

fn utf32_bytes_valid(ops: &KernelOps, bytes: &[u8]) -> bool {
    if let Ok(units) = bytemuck::try_cast_slice::<u8, u32>(bytes) {
        return ops.validate_utf32(units);
    }

    let mut buf = [0u32; CHUNK];
    for chunk in bytes.chunks(CHUNK * 4) {
        let n = chunk.len() / 4;
        for (dst, quad) in buf[..n].iter_mut().zip(chunk.chunks_exact(4)) {
            *dst = u32::from_ne_bytes([quad[0], quad[1], quad[2], quad[3]]);
        }
        if !ops.validate_utf32(&buf[..n]) {
            return false;
        }
    }
    true
}

/// The encoding named by a leading BOM, otherwise every encoding `bytes`
/// validates under.
pub(crate) fn detect_with(ops: &KernelOps, bytes: &[u8]) -> EncodingSet {
    if let Some(encoding) = bom::sniff(bytes) {
        return EncodingSet::of(encoding);
    }

    let mut set = EncodingSet::empty();
    if ops.validate_utf8(bytes) {
        set |= EncodingSet::UTF8;
    }
    if bytes.len() % 2 == 0 && utf16le_bytes_valid(ops, bytes) {
        set |= EncodingSet::UTF16_LE;
    }
    if bytes.len() % 4 == 0 && utf32_bytes_valid(ops, bytes) {
        set |= EncodingSet::UTF32_NATIVE;
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel;

    fn scalar() -> &'static KernelOps {
        kernel::scalar::KERNEL.ops().unwrap()
    }

    #[test]
    fn ascii_matches_everything_it_can() {
        // "abcd" is valid UTF-8 and UTF-16LE ("扡摣") but 0x64636261 > U+10FFFF
        let set = detect_with(scalar(), b"abcd");
        assert!(set.has(Encoding::Utf8));
        assert!(set.has(Encoding::Utf16Le));
        assert!(!set.has(Encoding::UTF32_NATIVE));
    }

    #[test]
    fn odd_length_is_never_utf16() {
        let set = detect_with(scalar(), b"abc");
        assert_eq!(set, EncodingSet::from(Encoding::Utf8));
    }

    #[test]
    fn utf32_detected() {
        let units: Vec<u32> = "hi😀".chars().map(|c| c as u32).collect();
        let bytes: Vec<u8> = units.iter().flat_map(|u| u.to_ne_bytes()).collect();
        let set = detect_with(scalar(), &bytes);
        assert!(set.has(Encoding::UTF32_NATIVE));
        assert!(!set.has(Encoding::Utf8) || bytes.is_ascii());
    }

    #[test]
    fn nothing_matches() {
        let set = detect_with(scalar(), &[0xFF, 0xFF, 0xFF]);
        assert!(set.is_empty());
        assert_eq!(set.first(), Encoding::Unspecified);
    }

    #[test]
    fn bom_is_the_only_candidate() {
        let cases: [(&[u8], Encoding); 5] = [
            (&[0xEF, 0xBB, 0xBF, b'h', b'i'], Encoding::Utf8),
            (&[0xFE, 0xFF], Encoding::Utf16Be),
            (&[0xFF, 0xFE, b'h', 0x00], Encoding::Utf16Le),
            (&[0xFF, 0xFE, 0x00, 0x00], Encoding::Utf32Le),
            (&[0x00, 0x00, 0xFE, 0xFF], Encoding::Utf32Be),
        ];
        for (bytes, expected) in cases {
            assert_eq!(
                detect_with(scalar(), bytes),
                EncodingSet::of(expected),
                "{bytes:02X?}"
            );
        }
    }

    #[test]
    fn bom_overrides_content() {
        // Without the mark these bytes would pass as UTF-16LE only
        let set = detect_with(scalar(), &[0xFE, 0xFF, 0x41, 0x00]);
        assert_eq!(set, EncodingSet::UTF16_BE);
        assert!(!set.has(Encoding::Utf16Le));
    }

    #[test]
    fn misaligned_utf16_with_pair_across_chunks() {
        // Place a surrogate pair so it straddles the copy-buffer boundary
        let mut text: Vec<u16> = vec![0x4E2D; CHUNK - 1];
        text.extend("😀".encode_utf16());
        text.extend(core::iter::repeat(0x0041).take(10));
        let mut bytes = vec![0u8];
        bytes.extend(text.iter().flat_map(|u| u.to_le_bytes()));
        let misaligned = &bytes[1..];
        assert!(utf16le_bytes_valid(scalar(), misaligned));

        // Break the low half of the pair
        let mut broken = bytes.clone();
        let low = 1 + CHUNK * 2;
        broken[low] = 0x41;
        broken[low + 1] = 0x00;
        assert!(!utf16le_bytes_valid(scalar(), &broken[1..]));
    }

    #[test]
    fn misaligned_utf32() {
        let units: Vec<u32> = (0..(CHUNK as u32 + 7)).map(|i| 0x40 + i).collect();
        let mut bytes = vec![0u8];
        bytes.extend(units.iter().flat_map(|u| u.to_ne_bytes()));
        assert!(utf32_bytes_valid(scalar(), &bytes[1..]));

        let mut bad = bytes.clone();
        let last = bad.len() - 4;
        bad[last..].copy_from_slice(&0xD800u32.to_ne_bytes());
        assert!(!utf32_bytes_valid(scalar(), &bad[1..]));
    }
}
