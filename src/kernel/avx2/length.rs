//! AVX2 code point counters and output length estimators.

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::{ge_u32, load, mask32, swap_if};
use crate::scalar::{utf16, utf32, utf8};

#[inline]
fn bits(mask: i32) -> usize {
    (mask as u32).count_ones() as usize
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
fn ge_u16(v: __m256i, t: u16) -> __m256i {
    _mm256_cmpeq_epi16(_mm256_max_epu16(v, _mm256_set1_epi16(t as i16)), v)
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn count_utf8(input: &[u8]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        let leader_floor = _mm256_set1_epi8(-65);
        while pos + 32 <= input.len() {
            let v = load(input.as_ptr().add(pos));
            count += bits(_mm256_movemask_epi8(_mm256_cmpgt_epi8(v, leader_floor)));
            pos += 32;
        }
    }
    count + utf8::count_code_points(&input[pos..])
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn utf16_length_from_utf8(input: &[u8]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        let leader_floor = _mm256_set1_epi8(-65);
        let four_byte = _mm256_set1_epi8(0xF0u8 as i8);
        while pos + 32 <= input.len() {
            let v = load(input.as_ptr().add(pos));
            let leaders = _mm256_movemask_epi8(_mm256_cmpgt_epi8(v, leader_floor));
            let pairs = _mm256_movemask_epi8(_mm256_cmpeq_epi8(_mm256_max_epu8(v, four_byte), v));
            count += bits(leaders) + bits(pairs);
            pos += 32;
        }
    }
    count + utf8::utf16_length(&input[pos..])
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn count_utf16<const BE: bool>(input: &[u16]) -> usize {
    let mut pos = 0;
    let mut highs = 0;
    unsafe {
        while pos + 16 <= input.len() {
            let v = swap_if::<BE>(load(input.as_ptr().add(pos).cast()));
            let high = _mm256_cmpeq_epi16(
                _mm256_and_si256(v, _mm256_set1_epi16(0xFC00u16 as i16)),
                _mm256_set1_epi16(0xD800u16 as i16),
            );
            highs += bits(_mm256_movemask_epi8(high)) / 2;
            pos += 16;
        }
    }
    pos - highs + utf16::count_code_points::<BE>(&input[pos..])
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn utf8_length_from_utf16<const BE: bool>(input: &[u16]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        while pos + 16 <= input.len() {
            let v = swap_if::<BE>(load(input.as_ptr().add(pos).cast()));
            let surrogates = _mm256_cmpeq_epi16(
                _mm256_and_si256(v, _mm256_set1_epi16(0xF800u16 as i16)),
                _mm256_set1_epi16(0xD800u16 as i16),
            );
            let wide = bits(_mm256_movemask_epi8(ge_u16(v, 0x80)))
                + bits(_mm256_movemask_epi8(ge_u16(v, 0x800)));
            count += 16 + wide / 2 - bits(_mm256_movemask_epi8(surrogates)) / 2;
            pos += 16;
        }
    }
    count + utf16::utf8_length::<BE>(&input[pos..])
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn utf8_length_from_utf32(input: &[u32]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        while pos + 8 <= input.len() {
            let v = load(input.as_ptr().add(pos).cast());
            count += 8
                + mask32(ge_u32(v, 0x80)).count_ones() as usize
                + mask32(ge_u32(v, 0x800)).count_ones() as usize
                + mask32(ge_u32(v, 0x10000)).count_ones() as usize;
            pos += 8;
        }
    }
    count + utf32::utf8_length(&input[pos..])
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn utf16_length_from_utf32(input: &[u32]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        while pos + 8 <= input.len() {
            let v = load(input.as_ptr().add(pos).cast());
            count += 8 + mask32(ge_u32(v, 0x10000)).count_ones() as usize;
            pos += 8;
        }
    }
    count + utf32::utf16_length(&input[pos..])
}

#[cfg(test)]
mod tests {
    use super::super::KERNEL;

    #[test]
    fn lengths_agree_with_std() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let text = "ÿ\u{0800}\u{FFFD}𐍈 plain ".repeat(13);
        let bytes = text.as_bytes();
        let utf16: Vec<u16> = text.encode_utf16().collect();
        let utf32: Vec<u32> = text.chars().map(|c| c as u32).collect();

        assert_eq!(ops.count_utf8(bytes), utf32.len());
        assert_eq!(ops.utf16_length_from_utf8(bytes), utf16.len());
        assert_eq!(ops.utf8_length_from_utf16le(&utf16), bytes.len());
        assert_eq!(ops.count_utf16le(&utf16), utf32.len());
        assert_eq!(ops.utf8_length_from_utf32(&utf32), bytes.len());
        assert_eq!(ops.utf16_length_from_utf32(&utf32), utf16.len());
    }
}
