//! AVX2 UTF-8 to UTF-16 and UTF-32 transcoding.

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::validate::{validate_utf8, validate_utf8_with_errors};
use super::{decode_utf8_x8, load, store_utf16_x8, store_utf32_x8, swap_if};
use crate::error::TranscodeResult;
use crate::scalar::utf8;

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn convert_valid_utf8_to_utf16<const BE: bool>(
    input: &[u8],
    output: &mut [u16],
) -> usize {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 48 <= input.len() && out + 64 <= output.len() {
            let src = input.as_ptr().add(pos);
            let v = load(src);
            if _mm256_movemask_epi8(v) == 0 {
                let dst = output.as_mut_ptr().add(out);
                let lo = _mm256_cvtepu8_epi16(_mm256_castsi256_si128(v));
                let hi = _mm256_cvtepu8_epi16(_mm256_extracti128_si256(v, 1));
                _mm256_storeu_si256(dst.cast(), swap_if::<BE>(lo));
                _mm256_storeu_si256(dst.add(16).cast(), swap_if::<BE>(hi));
                pos += 32;
                out += 32;
                continue;
            }
            for group in [0, 8, 16, 24] {
                let d = decode_utf8_x8(src.add(group));
                out += store_utf16_x8::<BE>(d.cp, d.four, d.leaders, output.as_mut_ptr().add(out));
            }
            pos += 32;
        }
    }
    out + utf8::convert_valid_to_utf16::<BE>(&input[pos..], &mut output[out..])
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
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

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
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

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn convert_valid_utf8_to_utf32(input: &[u8], output: &mut [u32]) -> usize {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 48 <= input.len() && out + 32 <= output.len() {
            let src = input.as_ptr().add(pos);
            let v = load(src);
            if _mm256_movemask_epi8(v) == 0 {
                let dst = output.as_mut_ptr().add(out);
                let lo = _mm256_castsi256_si128(v);
                let hi = _mm256_extracti128_si256(v, 1);
                _mm256_storeu_si256(dst.cast(), _mm256_cvtepu8_epi32(lo));
                _mm256_storeu_si256(
                    dst.add(8).cast(),
                    _mm256_cvtepu8_epi32(_mm_srli_si128(lo, 8)),
                );
                _mm256_storeu_si256(dst.add(16).cast(), _mm256_cvtepu8_epi32(hi));
                _mm256_storeu_si256(
                    dst.add(24).cast(),
                    _mm256_cvtepu8_epi32(_mm_srli_si128(hi, 8)),
                );
                pos += 32;
                out += 32;
                continue;
            }
            for group in [0, 8, 16, 24] {
                let d = decode_utf8_x8(src.add(group));
                out += store_utf32_x8(d.cp, d.leaders, output.as_mut_ptr().add(out));
            }
            pos += 32;
        }
    }
    out + utf8::convert_valid_to_utf32(&input[pos..], &mut output[out..])
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
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

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
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
