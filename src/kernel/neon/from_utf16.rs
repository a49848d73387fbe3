//! NEON UTF-16 to UTF-8 and UTF-32 transcoding, and byte swapping.

#[cfg(target_arch = "aarch64")]
use core::arch::aarch64::*;

use super::{has_surrogate, store_utf8_x4, swap_if};
use crate::error::TranscodeResult;
use crate::scalar::{utf16, utf8};

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

// =============================================================================
// UTF-8
// =============================================================================

#[target_feature(enable = "neon")]
#[inline]
unsafe fn to_utf8<const BE: bool, const CHECKED: bool>(
    input: &[u16],
    output: &mut [u8],
) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 8 <= input.len() && out + 32 <= output.len() {
            let v = swap_if::<BE>(vld1q_u16(input.as_ptr().add(pos)));
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
            if vmaxvq_u16(v) < 0x80 {
                vst1_u8(output.as_mut_ptr().add(out), vmovn_u16(v));
                pos += 8;
                out += 8;
                continue;
            }
            out += store_utf8_x4(vmovl_u16(vget_low_u16(v)), output.as_mut_ptr().add(out));
            out += store_utf8_x4(vmovl_high_u16(v), output.as_mut_ptr().add(out));
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

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn convert_utf16_to_utf8_with_errors<const BE: bool>(
    input: &[u16],
    output: &mut [u8],
) -> TranscodeResult {
    unsafe { to_utf8::<BE, true>(input, output) }
}

#[target_feature(enable = "neon")]
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

#[target_feature(enable = "neon")]
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

#[target_feature(enable = "neon")]
#[inline]
unsafe fn to_utf32<const BE: bool, const CHECKED: bool>(
    input: &[u16],
    output: &mut [u32],
) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 8 <= input.len() && out + 8 <= output.len() {
            let v = swap_if::<BE>(vld1q_u16(input.as_ptr().add(pos)));
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
            vst1q_u32(dst, vmovl_u16(vget_low_u16(v)));
            vst1q_u32(dst.add(4), vmovl_high_u16(v));
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

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn convert_utf16_to_utf32_with_errors<const BE: bool>(
    input: &[u16],
    output: &mut [u32],
) -> TranscodeResult {
    unsafe { to_utf32::<BE, true>(input, output) }
}

#[target_feature(enable = "neon")]
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

#[target_feature(enable = "neon")]
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

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn change_endianness_utf16(input: &[u16], output: &mut [u16]) {
    let output = &mut output[..input.len()];
    let mut pos = 0;
    unsafe {
        while pos + 8 <= input.len() {
            let v = vld1q_u16(input.as_ptr().add(pos));
            vst1q_u16(output.as_mut_ptr().add(pos), swap_if::<true>(v));
            pos += 8;
        }
    }
    utf16::change_endianness(&input[pos..], &mut output[pos..]);
}

#[cfg(test)]
mod tests {
    use super::super::KERNEL;
    use crate::error::{ErrorKind, TranscodeResult};

    #[test]
    fn utf8_output_both_orders() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let text = format!("{}{}", "abcdefgh".repeat(5), "Ωμέγα 🎵 ".repeat(10));
        let le: Vec<u16> = text.encode_utf16().map(u16::to_le).collect();
        let be: Vec<u16> = text.encode_utf16().map(u16::to_be).collect();
        let mut out = vec![0u8; text.len()];
        assert_eq!(ops.convert_utf16le_to_utf8(&le, &mut out), text.len());
        assert_eq!(out, text.as_bytes());
        assert_eq!(ops.convert_valid_utf16be_to_utf8(&be, &mut out), text.len());
        assert_eq!(out, text.as_bytes());
    }

    #[test]
    fn lone_high_surrogate_at_end() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let mut units = vec![0x0041u16; 24];
        units.push(0xD801);
        let mut out = vec![0u32; 32];
        assert_eq!(
            ops.convert_utf16le_to_utf32_with_errors(&units, &mut out),
            TranscodeResult::err(ErrorKind::Surrogate, 24)
        );
        assert_eq!(ops.convert_utf16le_to_utf32(&units, &mut out), 0);
    }

    #[test]
    fn swap_round_trip() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let input: Vec<u16> = (0..37u16).map(|i| i * 0x0101 + 1).collect();
        let mut swapped = vec![0u16; 37];
        let mut back = vec![0u16; 37];
        ops.change_endianness_utf16(&input, &mut swapped);
        ops.change_endianness_utf16(&swapped, &mut back);
        assert_eq!(back, input);
        assert_eq!(swapped[3], input[3].swap_bytes());
    }
}
