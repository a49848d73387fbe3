//! NEON UTF-32 to UTF-8 and UTF-16 transcoding.

#[cfg(target_arch = "aarch64")]
use core::arch::aarch64::*;

use super::validate::utf32_invalid;
use super::{store_utf16_x4, store_utf8_x4};
use crate::error::TranscodeResult;
use crate::scalar::utf32;

#[target_feature(enable = "neon")]
#[inline]
unsafe fn to_utf8<const CHECKED: bool>(input: &[u32], output: &mut [u8]) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 4 <= input.len() && out + 16 <= output.len() {
            let v = vld1q_u32(input.as_ptr().add(pos));
            if CHECKED && vmaxvq_u32(utf32_invalid(v)) != 0 {
                break;
            }
            out += store_utf8_x4(v, output.as_mut_ptr().add(out));
            pos += 4;
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

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn convert_utf32_to_utf8_with_errors(
    input: &[u32],
    output: &mut [u8],
) -> TranscodeResult {
    unsafe { to_utf8::<true>(input, output) }
}

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn convert_utf32_to_utf8(input: &[u32], output: &mut [u8]) -> usize {
    let result = unsafe { to_utf8::<true>(input, output) };
    if result.is_ok() {
        result.count
    } else {
        0
    }
}

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn convert_valid_utf32_to_utf8(input: &[u32], output: &mut [u8]) -> usize {
    unsafe { to_utf8::<false>(input, output).count }
}

#[target_feature(enable = "neon")]
#[inline]
unsafe fn to_utf16<const BE: bool, const CHECKED: bool>(
    input: &[u32],
    output: &mut [u16],
) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 4 <= input.len() && out + 8 <= output.len() {
            let v = vld1q_u32(input.as_ptr().add(pos));
            if CHECKED && vmaxvq_u32(utf32_invalid(v)) != 0 {
                break;
            }
            let pairs = vcgeq_u32(v, vdupq_n_u32(0x10000));
            out += store_utf16_x4::<BE>(v, pairs, 0xF, output.as_mut_ptr().add(out));
            pos += 4;
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

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn convert_utf32_to_utf16_with_errors<const BE: bool>(
    input: &[u32],
    output: &mut [u16],
) -> TranscodeResult {
    unsafe { to_utf16::<BE, true>(input, output) }
}

#[target_feature(enable = "neon")]
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

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn convert_valid_utf32_to_utf16<const BE: bool>(
    input: &[u32],
    output: &mut [u16],
) -> usize {
    unsafe { to_utf16::<BE, false>(input, output).count }
}
