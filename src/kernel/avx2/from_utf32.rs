//! AVX2 UTF-32 to UTF-8 and UTF-16 transcoding.

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::validate::utf32_invalid;
use super::{ge_u32, load, store_utf16_x8, store_utf8_x8};
use crate::error::TranscodeResult;
use crate::scalar::utf32;

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
unsafe fn to_utf8<const CHECKED: bool>(input: &[u32], output: &mut [u8]) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 8 <= input.len() && out + 32 <= output.len() {
            let v = load(input.as_ptr().add(pos).cast());
            if CHECKED {
                let bad = utf32_invalid(v);
                if _mm256_testz_si256(bad, bad) == 0 {
                    break;
                }
            }
            out += store_utf8_x8(v, output.as_mut_ptr().add(out));
            pos += 8;
        }
    }
    let tail = if CHECKED {
        utf32::convert_to_utf8_with_errors(&input[pos..], &mut output[out..])
    } else {
        TranscodeResult::ok(utf32::convert_valid_to_utf8(
            &input[pos..],
            &mut output[out..],
        ))
    };
    tail.rebase(pos, out)
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn convert_utf32_to_utf8_with_errors(
    input: &[u32],
    output: &mut [u8],
) -> TranscodeResult {
    unsafe { to_utf8::<true>(input, output) }
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn convert_utf32_to_utf8(input: &[u32], output: &mut [u8]) -> usize {
    let result = unsafe { to_utf8::<true>(input, output) };
    if result.is_ok() {
        result.count
    } else {
        0
    }
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn convert_valid_utf32_to_utf8(input: &[u32], output: &mut [u8]) -> usize {
    unsafe { to_utf8::<false>(input, output).count }
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
unsafe fn to_utf16<const BE: bool, const CHECKED: bool>(
    input: &[u32],
    output: &mut [u16],
) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 8 <= input.len() && out + 16 <= output.len() {
            let v = load(input.as_ptr().add(pos).cast());
            if CHECKED {
                let bad = utf32_invalid(v);
                if _mm256_testz_si256(bad, bad) == 0 {
                    break;
                }
            }
            let pairs = ge_u32(v, 0x10000);
            out += store_utf16_x8::<BE>(v, pairs, 0xFF, output.as_mut_ptr().add(out));
            pos += 8;
        }
    }
    let tail = if CHECKED {
        utf32::convert_to_utf16_with_errors::<BE>(&input[pos..], &mut output[out..])
    } else {
        TranscodeResult::ok(utf32::convert_valid_to_utf16::<BE>(
            &input[pos..],
            &mut output[out..],
        ))
    };
    tail.rebase(pos, out)
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn convert_utf32_to_utf16_with_errors<const BE: bool>(
    input: &[u32],
    output: &mut [u16],
) -> TranscodeResult {
    unsafe { to_utf16::<BE, true>(input, output) }
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn convert_utf32_to_utf16<const BE: bool>(
    input: &[u32],
    output: &mut [u16],
) -> usize {
    let result = unsafe { to_utf16::<BE, true>(input, output) };
    if result.is_ok() {
        result.count
    } else {
        0
    }
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn convert_valid_utf32_to_utf16<const BE: bool>(
    input: &[u32],
    output: &mut [u16],
) -> usize {
    unsafe { to_utf16::<BE, false>(input, output).count }
}
