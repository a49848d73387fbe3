//! SSE4.2 UTF-16 to UTF-8 and UTF-32 transcoding, and byte swapping.
//!
//! Eight units are handled per step. Chunks holding a surrogate are decoded
//! one code point at a time; everything else stays in registers.

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::{load, store_utf8_x4, swap_if, table};
use crate::error::TranscodeResult;
use crate::kernel::tables;
use crate::scalar::{utf16, utf8};

/// Decode one code point, checked or not. `Err` carries the failing result.
#[inline(always)]
fn step<const BE: bool, const CHECKED: bool>(
    input: &[u16],
    pos: usize,
) -> Result<(u32, usize), TranscodeResult> {
    if CHECKED {
        utf16::decode_at::<BE>(input, pos).map_err(|kind| TranscodeResult::err(kind, pos))
    } else {
        Ok(utf16::decode_unchecked::<BE>(input, pos))
    }
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
fn has_surrogate(v: __m128i) -> bool {
    let surrogates = _mm_cmpeq_epi16(
        _mm_and_si128(v, _mm_set1_epi16(0xF800u16 as i16)),
        _mm_set1_epi16(0xD800u16 as i16),
    );
    _mm_movemask_epi8(surrogates) != 0
}

// =============================================================================
// UTF-8
// =============================================================================

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
unsafe fn to_utf8<const BE: bool, const CHECKED: bool>(
    input: &[u16],
    output: &mut [u8],
) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 8 <= input.len() && out + 32 <= output.len() {
            let v = swap_if::<BE>(load(input.as_ptr().add(pos).cast()));
            if has_surrogate(v) {
                let end = pos + 8;
                while pos < end {
                    let (cp, n) = match step::<BE, CHECKED>(input, pos) {
                        Ok(decoded) => decoded,
                        Err(failed) => return failed,
                    };
                    out += utf8::encode_unchecked(cp, output, out);
                    pos += n;
                }
                continue;
            }
            let dst = output.as_mut_ptr().add(out);
            if _mm_testz_si128(v, _mm_set1_epi16(0xFF80u16 as i16)) == 1 {
                _mm_storel_epi64(dst.cast(), _mm_packus_epi16(v, v));
                pos += 8;
                out += 8;
                continue;
            }
            out += store_utf8_x4(_mm_cvtepu16_epi32(v), dst);
            out += store_utf8_x4(
                _mm_cvtepu16_epi32(_mm_srli_si128(v, 8)),
                output.as_mut_ptr().add(out),
            );
            pos += 8;
        }
    }
    let tail = if CHECKED {
        utf16::convert_to_utf8_with_errors::<BE>(&input[pos..], &mut output[out..])
    } else {
        TranscodeResult::ok(utf16::convert_valid_to_utf8::<BE>(
            &input[pos..],
            &mut output[out..],
        ))
    };
    tail.rebase(pos, out)
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn convert_utf16_to_utf8_with_errors<const BE: bool>(
    input: &[u16],
    output: &mut [u8],
) -> TranscodeResult {
    unsafe { to_utf8::<BE, true>(input, output) }
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn convert_utf16_to_utf8<const BE: bool>(
    input: &[u16],
    output: &mut [u8],
) -> usize {
    let result = unsafe { to_utf8::<BE, true>(input, output) };
    if result.is_ok() {
        result.count
    } else {
        0
    }
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn convert_valid_utf16_to_utf8<const BE: bool>(
    input: &[u16],
    output: &mut [u8],
) -> usize {
    unsafe { to_utf8::<BE, false>(input, output).count }
}

// =============================================================================
// UTF-32
// =============================================================================

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
unsafe fn to_utf32<const BE: bool, const CHECKED: bool>(
    input: &[u16],
    output: &mut [u32],
) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 8 <= input.len() && out + 8 <= output.len() {
            let v = swap_if::<BE>(load(input.as_ptr().add(pos).cast()));
            if has_surrogate(v) {
                let end = pos + 8;
                while pos < end {
                    let (cp, n) = match step::<BE, CHECKED>(input, pos) {
                        Ok(decoded) => decoded,
                        Err(failed) => return failed,
                    };
                    output[out] = cp;
                    out += 1;
                    pos += n;
                }
                continue;
            }
            let dst = output.as_mut_ptr().add(out);
            _mm_storeu_si128(dst.cast(), _mm_cvtepu16_epi32(v));
            _mm_storeu_si128(dst.add(4).cast(), _mm_cvtepu16_epi32(_mm_srli_si128(v, 8)));
            pos += 8;
            out += 8;
        }
    }
    let tail = if CHECKED {
        utf16::convert_to_utf32_with_errors::<BE>(&input[pos..], &mut output[out..])
    } else {
        TranscodeResult::ok(utf16::convert_valid_to_utf32::<BE>(
            &input[pos..],
            &mut output[out..],
        ))
    };
    tail.rebase(pos, out)
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn convert_utf16_to_utf32_with_errors<const BE: bool>(
    input: &[u16],
    output: &mut [u32],
) -> TranscodeResult {
    unsafe { to_utf32::<BE, true>(input, output) }
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn convert_utf16_to_utf32<const BE: bool>(
    input: &[u16],
    output: &mut [u32],
) -> usize {
    let result = unsafe { to_utf32::<BE, true>(input, output) };
    if result.is_ok() {
        result.count
    } else {
        0
    }
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn convert_valid_utf16_to_utf32<const BE: bool>(
    input: &[u16],
    output: &mut [u32],
) -> usize {
    unsafe { to_utf32::<BE, false>(input, output).count }
}

// =============================================================================
// Byte order
// =============================================================================

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn change_endianness_utf16(input: &[u16], output: &mut [u16]) {
    let output = &mut output[..input.len()];
    let mut pos = 0;
    unsafe {
        let swap = table(&tables::SWAP_BYTES_16);
        while pos + 8 <= input.len() {
            let v = load(input.as_ptr().add(pos).cast());
            _mm_storeu_si128(
                output.as_mut_ptr().add(pos).cast(),
                _mm_shuffle_epi8(v, swap),
            );
            pos += 8;
        }
    }
    utf16::change_endianness(&input[pos..], &mut output[pos..]);
}

#[cfg(test)]
mod tests {
    use super::super::KERNEL;
    use crate::error::{ErrorKind, TranscodeResult};

    fn text() -> String {
        "Ab\u{00E9}\u{4E2D}\u{1F600}xyz".repeat(12)
    }

    #[test]
    fn to_utf8_both_orders() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let text = text();
        let le: Vec<u16> = text.encode_utf16().map(u16::to_le).collect();
        let be: Vec<u16> = text.encode_utf16().map(u16::to_be).collect();
        let mut out = vec![0u8; text.len()];
        assert_eq!(ops.convert_utf16le_to_utf8(&le, &mut out), text.len());
        assert_eq!(out, text.as_bytes());
        out.fill(0);
        assert_eq!(ops.convert_valid_utf16be_to_utf8(&be, &mut out), text.len());
        assert_eq!(out, text.as_bytes());
    }

    #[test]
    fn to_utf32() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let text = text();
        let le: Vec<u16> = text.encode_utf16().map(u16::to_le).collect();
        let expect: Vec<u32> = text.chars().map(|c| c as u32).collect();
        let mut out = vec![0u32; expect.len()];
        assert_eq!(ops.convert_utf16le_to_utf32(&le, &mut out), expect.len());
        assert_eq!(out, expect);
    }

    #[test]
    fn ascii_chunks() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let units: Vec<u16> = (0..40u16).map(|i| (b'a' as u16 + i % 26).to_le()).collect();
        let mut out = vec![0u8; 40];
        assert_eq!(ops.convert_utf16le_to_utf8(&units, &mut out), 40);
        assert!(out.iter().all(u8::is_ascii_lowercase));
    }

    #[test]
    fn lone_surrogate_reported() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let mut units: Vec<u16> = vec![0x0041u16.to_le(); 20];
        units[13] = 0xD800u16.to_le();
        let mut out = vec![0u8; 64];
        assert_eq!(
            ops.convert_utf16le_to_utf8_with_errors(&units, &mut out),
            TranscodeResult::err(ErrorKind::Surrogate, 13)
        );
        assert_eq!(&out[..13], &[b'A'; 13]);
        assert_eq!(ops.convert_utf16le_to_utf8(&units, &mut out), 0);
    }

    #[test]
    fn swap_bytes() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let input: Vec<u16> = (0..19).map(|i| 0x0102 * i).collect();
        let mut out = vec![0u16; 19];
        ops.change_endianness_utf16(&input, &mut out);
        for (a, b) in input.iter().zip(&out) {
            assert_eq!(a.swap_bytes(), *b);
        }
    }
}
