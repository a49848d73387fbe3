//! NEON UTF-8 to UTF-16 and UTF-32 transcoding.

#[cfg(target_arch = "aarch64")]
use core::arch::aarch64::*;

use super::validate::{validate_utf8, validate_utf8_with_errors};
use super::{decode_utf8_x4, store_utf16_x4, store_utf32_x4, swap_if};
use crate::error::TranscodeResult;
use crate::scalar::utf8;

// =============================================================================
// UTF-16
// =============================================================================

#[target_feature(enable = "neon")]
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
            let v = vld1q_u8(src);
            if vmaxvq_u8(v) < 0x80 {
                let dst = output.as_mut_ptr().add(out);
                vst1q_u16(dst, swap_if::<BE>(vmovl_u8(vget_low_u8(v))));
                vst1q_u16(dst.add(8), swap_if::<BE>(vmovl_high_u8(v)));
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

#[target_feature(enable = "neon")]
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

#[target_feature(enable = "neon")]
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

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn convert_valid_utf8_to_utf32(input: &[u8], output: &mut [u32]) -> usize {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 32 <= input.len() && out + 16 <= output.len() {
            let src = input.as_ptr().add(pos);
            let v = vld1q_u8(src);
            if vmaxvq_u8(v) < 0x80 {
                let dst = output.as_mut_ptr().add(out);
                let lo = vmovl_u8(vget_low_u8(v));
                let hi = vmovl_high_u8(v);
                vst1q_u32(dst, vmovl_u16(vget_low_u16(lo)));
                vst1q_u32(dst.add(4), vmovl_high_u16(lo));
                vst1q_u32(dst.add(8), vmovl_u16(vget_low_u16(hi)));
                vst1q_u32(dst.add(12), vmovl_high_u16(hi));
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

#[target_feature(enable = "neon")]
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

#[target_feature(enable = "neon")]
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

    #[test]
    fn utf16_and_utf32_targets() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let text = format!("{}{}", "plain ascii block ".repeat(4), "ñ ∑ 𐍈 ".repeat(25));
        let bytes = text.as_bytes();

        let expect16: Vec<u16> = text.encode_utf16().map(u16::to_be).collect();
        let mut out16 = vec![0u16; expect16.len()];
        assert_eq!(
            ops.convert_utf8_to_utf16be(bytes, &mut out16),
            expect16.len()
        );
        assert_eq!(out16, expect16);

        let expect32: Vec<u32> = text.chars().map(|c| c as u32).collect();
        let mut out32 = vec![0u32; expect32.len()];
        assert_eq!(ops.convert_utf8_to_utf32(bytes, &mut out32), expect32.len());
        assert_eq!(out32, expect32);
    }

    #[test]
    fn overlong_reported_with_position() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let mut bytes = vec![b'k'; 40];
        bytes[33] = 0xC0;
        bytes[34] = 0xAF;
        let mut out = vec![0u16; 40];
        assert_eq!(
            ops.convert_utf8_to_utf16le_with_errors(&bytes, &mut out),
            TranscodeResult::err(ErrorKind::Overlong, 33)
        );
        assert!(out[..33].iter().all(|&u| u == u16::from(b'k').to_le()));
    }
}
