//! SSE4.2 code point counters and output length estimators.

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::{ge_u32, load, mask32, swap_if};
use crate::scalar::{utf16, utf32, utf8};

#[inline]
fn bits(mask: i32) -> usize {
    (mask as u32).count_ones() as usize
}

/// Unsigned `v >= t` per 16-bit lane.
#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
fn ge_u16(v: __m128i, t: u16) -> __m128i {
    _mm_cmpeq_epi16(_mm_max_epu16(v, _mm_set1_epi16(t as i16)), v)
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn count_utf8(input: &[u8]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        let leader_floor = _mm_set1_epi8(-65);
        while pos + 16 <= input.len() {
            let v = load(input.as_ptr().add(pos));
            count += bits(_mm_movemask_epi8(_mm_cmpgt_epi8(v, leader_floor)));
            pos += 16;
        }
    }
    count + utf8::count_code_points(&input[pos..])
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn utf16_length_from_utf8(input: &[u8]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        let leader_floor = _mm_set1_epi8(-65);
        let four_byte = _mm_set1_epi8(0xF0u8 as i8);
        while pos + 16 <= input.len() {
            let v = load(input.as_ptr().add(pos));
            let leaders = _mm_movemask_epi8(_mm_cmpgt_epi8(v, leader_floor));
            let pairs = _mm_movemask_epi8(_mm_cmpeq_epi8(_mm_max_epu8(v, four_byte), v));
            count += bits(leaders) + bits(pairs);
            pos += 16;
        }
    }
    count + utf8::utf16_length(&input[pos..])
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn count_utf16<const BE: bool>(input: &[u16]) -> usize {
    let mut pos = 0;
    let mut highs = 0;
    unsafe {
        while pos + 8 <= input.len() {
            let v = swap_if::<BE>(load(input.as_ptr().add(pos).cast()));
            let high = _mm_cmpeq_epi16(
                _mm_and_si128(v, _mm_set1_epi16(0xFC00u16 as i16)),
                _mm_set1_epi16(0xD800u16 as i16),
            );
            highs += bits(_mm_movemask_epi8(high)) / 2;
            pos += 8;
        }
    }
    pos - highs + utf16::count_code_points::<BE>(&input[pos..])
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn utf8_length_from_utf16<const BE: bool>(input: &[u16]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        while pos + 8 <= input.len() {
            let v = swap_if::<BE>(load(input.as_ptr().add(pos).cast()));
            let surrogates = _mm_cmpeq_epi16(
                _mm_and_si128(v, _mm_set1_epi16(0xF800u16 as i16)),
                _mm_set1_epi16(0xD800u16 as i16),
            );
            let wide = bits(_mm_movemask_epi8(ge_u16(v, 0x80)))
                + bits(_mm_movemask_epi8(ge_u16(v, 0x800)));
            count += 8 + wide / 2 - bits(_mm_movemask_epi8(surrogates)) / 2;
            pos += 8;
        }
    }
    count + utf16::utf8_length::<BE>(&input[pos..])
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn utf8_length_from_utf32(input: &[u32]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        while pos + 4 <= input.len() {
            let v = load(input.as_ptr().add(pos).cast());
            count += 4
                + mask32(ge_u32(v, 0x80)).count_ones() as usize
                + mask32(ge_u32(v, 0x800)).count_ones() as usize
                + mask32(ge_u32(v, 0x10000)).count_ones() as usize;
            pos += 4;
        }
    }
    count + utf32::utf8_length(&input[pos..])
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn utf16_length_from_utf32(input: &[u32]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        while pos + 4 <= input.len() {
            let v = load(input.as_ptr().add(pos).cast());
            count += 4 + mask32(ge_u32(v, 0x10000)).count_ones() as usize;
            pos += 4;
        }
    }
    count + utf32::utf16_length(&input[pos..])
}

#[cfg(test)]
mod tests {
    use super::super::KERNEL;
    use crate::kernel::scalar;

    #[test]
    fn utf8_lengths_match_scalar() {
        let (Some(ops), Some(reference)) = (KERNEL.ops(), scalar::KERNEL.ops()) else {
            return;
        };
        let text = "Grüße, 世界! 🌍🚀 ".repeat(9);
        let bytes = text.as_bytes();
        assert_eq!(ops.count_utf8(bytes), text.chars().count());
        assert_eq!(
            ops.utf16_length_from_utf8(bytes),
            text.encode_utf16().count()
        );
        assert_eq!(
            ops.utf32_length_from_utf8(bytes),
            reference.utf32_length_from_utf8(bytes)
        );
    }

    #[test]
    fn utf16_lengths_match_scalar() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let text = "Grüße, 世界! 🌍🚀 ".repeat(7);
        let le: Vec<u16> = text.encode_utf16().map(u16::to_le).collect();
        let be: Vec<u16> = text.encode_utf16().map(u16::to_be).collect();
        assert_eq!(ops.count_utf16le(&le), text.chars().count());
        assert_eq!(ops.count_utf16be(&be), text.chars().count());
        assert_eq!(ops.utf8_length_from_utf16le(&le), text.len());
        assert_eq!(ops.utf8_length_from_utf16be(&be), text.len());
    }

    #[test]
    fn utf32_lengths() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let text = "a\u{7FF}\u{800}\u{FFFF}\u{10000}\u{10FFFF}".repeat(5);
        let units: Vec<u32> = text.chars().map(|c| c as u32).collect();
        assert_eq!(ops.utf8_length_from_utf32(&units), text.len());
        assert_eq!(
            ops.utf16_length_from_utf32(&units),
            text.encode_utf16().count()
        );
    }
}
