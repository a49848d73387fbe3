//! NEON code point counters and output length estimators.

#[cfg(target_arch = "aarch64")]
use core::arch::aarch64::*;

use super::{count16, count32, surrogates, swap_if};
use crate::scalar::{utf16, utf32, utf8};

/// Number of 0xFF bytes in a byte comparison result.
#[target_feature(enable = "neon")]
#[inline]
unsafe fn count8(mask: uint8x16_t) -> usize {
    unsafe { vaddvq_u8(vshrq_n_u8::<7>(mask)) as usize }
}

#[target_feature(enable = "neon")]
#[inline]
unsafe fn leaders(v: uint8x16_t) -> uint8x16_t {
    unsafe { vcgtq_s8(vreinterpretq_s8_u8(v), vdupq_n_s8(-65)) }
}

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn count_utf8(input: &[u8]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        while pos + 16 <= input.len() {
            count += count8(leaders(vld1q_u8(input.as_ptr().add(pos))));
            pos += 16;
        }
    }
    count + utf8::count_code_points(&input[pos..])
}

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn utf16_length_from_utf8(input: &[u8]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        while pos + 16 <= input.len() {
            let v = vld1q_u8(input.as_ptr().add(pos));
            count += count8(leaders(v)) + count8(vcgeq_u8(v, vdupq_n_u8(0xF0)));
            pos += 16;
        }
    }
    count + utf8::utf16_length(&input[pos..])
}

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn count_utf16<const BE: bool>(input: &[u16]) -> usize {
    let mut pos = 0;
    let mut highs = 0;
    unsafe {
        while pos + 8 <= input.len() {
            let v = swap_if::<BE>(vld1q_u16(input.as_ptr().add(pos)));
            let high = vceqq_u16(vandq_u16(v, vdupq_n_u16(0xFC00)), vdupq_n_u16(0xD800));
            highs += count16(high);
            pos += 8;
        }
    }
    pos - highs + utf16::count_code_points::<BE>(&input[pos..])
}

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn utf8_length_from_utf16<const BE: bool>(input: &[u16]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        while pos + 8 <= input.len() {
            let v = swap_if::<BE>(vld1q_u16(input.as_ptr().add(pos)));
            count += 8
                + count16(vcgeq_u16(v, vdupq_n_u16(0x80)))
                + count16(vcgeq_u16(v, vdupq_n_u16(0x800)))
                - count16(surrogates(v));
            pos += 8;
        }
    }
    count + utf16::utf8_length::<BE>(&input[pos..])
}

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn utf8_length_from_utf32(input: &[u32]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        while pos + 4 <= input.len() {
            let v = vld1q_u32(input.as_ptr().add(pos));
            count += 4
                + count32(vcgeq_u32(v, vdupq_n_u32(0x80)))
                + count32(vcgeq_u32(v, vdupq_n_u32(0x800)))
                + count32(vcgeq_u32(v, vdupq_n_u32(0x10000)));
            pos += 4;
        }
    }
    count + utf32::utf8_length(&input[pos..])
}

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn utf16_length_from_utf32(input: &[u32]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        while pos + 4 <= input.len() {
            let v = vld1q_u32(input.as_ptr().add(pos));
            count += 4 + count32(vcgeq_u32(v, vdupq_n_u32(0x10000)));
            pos += 4;
        }
    }
    count + utf32::utf16_length(&input[pos..])
}

#[cfg(test)]
mod tests {
    use super::super::KERNEL;

    #[test]
    fn lengths_of_mixed_text() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let text = "Grüße, 世界 🌍! ".repeat(9);
        let bytes = text.as_bytes();
        let le: Vec<u16> = text.encode_utf16().map(u16::to_le).collect();
        let be: Vec<u16> = text.encode_utf16().map(u16::to_be).collect();
        let utf32: Vec<u32> = text.chars().map(|c| c as u32).collect();

        assert_eq!(ops.count_utf8(bytes), utf32.len());
        assert_eq!(ops.utf16_length_from_utf8(bytes), le.len());
        assert_eq!(ops.count_utf16le(&le), utf32.len());
        assert_eq!(ops.count_utf16be(&be), utf32.len());
        assert_eq!(ops.utf8_length_from_utf16be(&be), bytes.len());
        assert_eq!(ops.utf8_length_from_utf32(&utf32), bytes.len());
        assert_eq!(ops.utf16_length_from_utf32(&utf32), le.len());
    }
}
