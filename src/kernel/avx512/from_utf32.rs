//! AVX-512 UTF-32 to UTF-8 and UTF-16 transcoding.

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::validate::utf32_invalid;
use super::{load, store_utf16_x16, store_utf8_x16};
use crate::error::TranscodeResult;
use crate::scalar::utf32;

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
unsafe fn to_utf8<const CHECKED: bool>(input: &[u32], output: &mut [u8]) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 16 <= input.len() && out + 64 <= output.len() {
            let v = load(input.as_ptr().add(pos).cast());
            if CHECKED && utf32_invalid(v) != 0 {
                break;
            }
            out += store_utf8_x16(v, output.as_mut_ptr().add(out));
            pos += 16;
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

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn convert_utf32_to_utf8_with_errors(
    input: &[u32],
    output: &mut [u8],
) -> TranscodeResult {
    unsafe { to_utf8::<true>(input, output) }
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn convert_utf32_to_utf8(input: &[u32], output: &mut [u8]) -> usize {
    let result = unsafe { to_utf8::<true>(input, output) };
    if result.is_ok() {
        result.count
    } else {
        0
    }
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn convert_valid_utf32_to_utf8(input: &[u32], output: &mut [u8]) -> usize {
    unsafe { to_utf8::<false>(input, output).count }
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
unsafe fn to_utf16<const BE: bool, const CHECKED: bool>(
    input: &[u32],
    output: &mut [u16],
) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 16 <= input.len() && out + 32 <= output.len() {
            let v = load(input.as_ptr().add(pos).cast());
            if CHECKED && utf32_invalid(v) != 0 {
                break;
            }
            let pairs = _mm512_cmpge_epu32_mask(v, _mm512_set1_epi32(0x10000));
            out += store_utf16_x16::<BE>(v, pairs, 0xFFFF, output.as_mut_ptr().add(out));
            pos += 16;
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

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn convert_utf32_to_utf16_with_errors<const BE: bool>(
    input: &[u32],
    output: &mut [u16],
) -> TranscodeResult {
    unsafe { to_utf16::<BE, true>(input, output) }
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
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

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn convert_valid_utf32_to_utf16<const BE: bool>(
    input: &[u32],
    output: &mut [u16],
) -> usize {
    unsafe { to_utf16::<BE, false>(input, output).count }
}

#[cfg(test)]
mod tests {
    use super::super::KERNEL;
    use crate::error::{ErrorKind, TranscodeResult};

    #[test]
    fn mixed_widths() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let text = "z\u{A9}\u{2603}\u{1F680}".repeat(12);
        let units: Vec<u32> = text.chars().map(|c| c as u32).collect();

        let mut utf8 = vec![0u8; text.len()];
        assert_eq!(ops.convert_utf32_to_utf8(&units, &mut utf8), text.len());
        assert_eq!(utf8, text.as_bytes());

        let expect: Vec<u16> = text.encode_utf16().map(u16::to_be).collect();
        let mut utf16 = vec![0u16; expect.len()];
        assert_eq!(
            ops.convert_utf32_to_utf16be(&units, &mut utf16),
            expect.len()
        );
        assert_eq!(utf16, expect);
    }

    #[test]
    fn surrogate_code_point_rejected() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let mut units = vec![0x41u32; 33];
        units[20] = 0xDABC;
        let mut out = vec![0u16; 64];
        assert_eq!(
            ops.convert_utf32_to_utf16le_with_errors(&units, &mut out),
            TranscodeResult::err(ErrorKind::Surrogate, 20)
        );
    }
}
