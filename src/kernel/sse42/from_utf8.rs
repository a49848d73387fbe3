//! SSE4.2 UTF-8 to UTF-16 and UTF-32 transcoding.
//!
//! Each 16-byte block is decoded in four groups of four positions. Every
//! position is decoded as if it started a sequence, and continuation lanes
//! are then compressed away.

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::validate::{validate_utf8, validate_utf8_with_errors};
use super::{decode_utf8_x4, load, store_utf16_x4, store_utf32_x4, swap_if};
use crate::error::TranscodeResult;
use crate::scalar::utf8;

// =============================================================================
// UTF-16
// =============================================================================

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn convert_valid_utf8_to_utf16<const BE: bool>(
    input: &[u8],
    output: &mut [u16],
) -> usize {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 32 <= input.len() && out + 32 <= output.len() {
            let src = input.as_ptr().add(pos);
            let v = load(src);
            if _mm_movemask_epi8(v) == 0 {
                let dst = output.as_mut_ptr().add(out);
                let lo = swap_if::<BE>(_mm_cvtepu8_epi16(v));
                let hi = swap_if::<BE>(_mm_cvtepu8_epi16(_mm_srli_si128(v, 8)));
                _mm_storeu_si128(dst.cast(), lo);
                _mm_storeu_si128(dst.add(8).cast(), hi);
                pos += 16;
                out += 16;
                continue;
            }
            for group in [0, 4, 8, 12] {
                let d = decode_utf8_x4(src.add(group));
                out += store_utf16_x4::<BE>(d.cp, d.four, d.leaders, output.as_mut_ptr().add(out));
            }
            pos += 16;
        }
    }
    out + utf8::convert_valid_to_utf16::<BE>(&input[pos..], &mut output[out..])
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn convert_utf8_to_utf16<const BE: bool>(
    input: &[u8],
    output: &mut [u16],
) -> usize {
    unsafe {
        if validate_utf8(input) {
            convert_valid_utf8_to_utf16::<BE>(input, output)
        } else {
            0
        }
    }
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn convert_utf8_to_utf16_with_errors<const BE: bool>(
    input: &[u8],
    output: &mut [u16],
) -> TranscodeResult {
    unsafe {
        let checked = validate_utf8_with_errors(input);
        if checked.is_err() {
            convert_valid_utf8_to_utf16::<BE>(&input[..checked.count], output);
            return checked;
        }
        TranscodeResult::ok(convert_valid_utf8_to_utf16::<BE>(input, output))
    }
}

// =============================================================================
// UTF-32
// =============================================================================

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn convert_valid_utf8_to_utf32(input: &[u8], output: &mut [u32]) -> usize {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 32 <= input.len() && out + 16 <= output.len() {
            let src = input.as_ptr().add(pos);
            let v = load(src);
            if _mm_movemask_epi8(v) == 0 {
                let dst = output.as_mut_ptr().add(out);
                _mm_storeu_si128(dst.cast(), _mm_cvtepu8_epi32(v));
                _mm_storeu_si128(dst.add(4).cast(), _mm_cvtepu8_epi32(_mm_srli_si128(v, 4)));
                _mm_storeu_si128(dst.add(8).cast(), _mm_cvtepu8_epi32(_mm_srli_si128(v, 8)));
                _mm_storeu_si128(dst.add(12).cast(), _mm_cvtepu8_epi32(_mm_srli_si128(v, 12)));
                pos += 16;
                out += 16;
                continue;
            }
            for group in [0, 4, 8, 12] {
                let d = decode_utf8_x4(src.add(group));
                out += store_utf32_x4(d.cp, d.leaders, output.as_mut_ptr().add(out));
            }
            pos += 16;
        }
    }
    out + utf8::convert_valid_to_utf32(&input[pos..], &mut output[out..])
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn convert_utf8_to_utf32(input: &[u8], output: &mut [u32]) -> usize {
    unsafe {
        if validate_utf8(input) {
            convert_valid_utf8_to_utf32(input, output)
        } else {
            0
        }
    }
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn convert_utf8_to_utf32_with_errors(
    input: &[u8],
    output: &mut [u32],
) -> TranscodeResult {
    unsafe {
        let checked = validate_utf8_with_errors(input);
        if checked.is_err() {
            convert_valid_utf8_to_utf32(&input[..checked.count], output);
            return checked;
        }
        TranscodeResult::ok(convert_valid_utf8_to_utf32(input, output))
    }
}

#[cfg(test)]
mod tests {
    use super::super::KERNEL;
    use crate::error::{ErrorKind, TranscodeResult};

    fn mixed() -> String {
        let mut s = String::from("ascii run that is longer than one block ");
        for i in 0..30 {
            s.push(char::from_u32(0x41 + i).unwrap_or('?'));
            s.push('ß');
            s.push('€');
            s.push('𝄞');
        }
        s
    }

    #[test]
    fn utf16_both_orders() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let text = mixed();
        let expect_le: Vec<u16> = text.encode_utf16().map(u16::to_le).collect();
        let expect_be: Vec<u16> = text.encode_utf16().map(u16::to_be).collect();

        let mut out = vec![0u16; expect_le.len()];
        assert_eq!(
            ops.convert_utf8_to_utf16le(text.as_bytes(), &mut out),
            out.len()
        );
        assert_eq!(out, expect_le);
        assert_eq!(
            ops.convert_valid_utf8_to_utf16be(text.as_bytes(), &mut out),
            out.len()
        );
        assert_eq!(out, expect_be);
    }

    #[test]
    fn utf32_output() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let text = mixed();
        let expect: Vec<u32> = text.chars().map(|c| c as u32).collect();
        let mut out = vec![0u32; expect.len()];
        assert_eq!(
            ops.convert_utf8_to_utf32(text.as_bytes(), &mut out),
            expect.len()
        );
        assert_eq!(out, expect);
    }

    #[test]
    fn error_keeps_valid_prefix() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let mut bytes = "é".repeat(30).into_bytes();
        bytes[41] = b'!';
        let mut out = vec![0u32; 60];
        let result = ops.convert_utf8_to_utf32_with_errors(&bytes, &mut out);
        assert_eq!(result, TranscodeResult::err(ErrorKind::TooShort, 40));
        assert!(out[..20].iter().all(|&cp| cp == 'é' as u32));
        assert_eq!(ops.convert_utf8_to_utf16le(&bytes, &mut [0u16; 60]), 0);
    }
}
