//! AVX-512 UTF-8 to UTF-16 and UTF-32 transcoding.

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::validate::{validate_utf8, validate_utf8_with_errors};
use super::{decode_utf8_x16, load, store_utf16_x16, swap_if};
use crate::error::TranscodeResult;
use crate::scalar::utf8;

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn convert_valid_utf8_to_utf16<const BE: bool>(
    input: &[u8],
    output: &mut [u16],
) -> usize {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 80 <= input.len() && out + 128 <= output.len() {
            let src = input.as_ptr().add(pos);
            let v = load(src);
            if _mm512_movepi8_mask(v) == 0 {
                let dst = output.as_mut_ptr().add(out);
                let lo = _mm512_cvtepu8_epi16(_mm512_castsi512_si256(v));
                let hi = _mm512_cvtepu8_epi16(_mm512_extracti64x4_epi64(v, 1));
                _mm512_storeu_si512(dst.cast(), swap_if::<BE>(lo));
                _mm512_storeu_si512(dst.add(32).cast(), swap_if::<BE>(hi));
                pos += 64;
                out += 64;
                continue;
            }
            for group in [0, 16, 32, 48] {
                let d = decode_utf8_x16(src.add(group));
                out += store_utf16_x16::<BE>(d.cp, d.four, d.leaders, output.as_mut_ptr().add(out));
            }
            pos += 64;
        }
    }
    out + utf8::convert_valid_to_utf16::<BE>(&input[pos..], &mut output[out..])
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
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

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
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

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn convert_valid_utf8_to_utf32(input: &[u8], output: &mut [u32]) -> usize {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 80 <= input.len() && out + 64 <= output.len() {
            let src = input.as_ptr().add(pos);
            let v = load(src);
            if _mm512_movepi8_mask(v) == 0 {
                let dst = output.as_mut_ptr().add(out);
                for quarter in 0..4 {
                    let bytes = _mm_loadu_si128(src.add(quarter * 16).cast());
                    _mm512_storeu_si512(dst.add(quarter * 16).cast(), _mm512_cvtepu8_epi32(bytes));
                }
                pos += 64;
                out += 64;
                continue;
            }
            for group in [0, 16, 32, 48] {
                let d = decode_utf8_x16(src.add(group));
                _mm512_mask_compressstoreu_epi32(
                    output.as_mut_ptr().add(out).cast(),
                    d.leaders,
                    d.cp,
                );
                out += d.leaders.count_ones() as usize;
            }
            pos += 64;
        }
    }
    out + utf8::convert_valid_to_utf32(&input[pos..], &mut output[out..])
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
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

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
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
