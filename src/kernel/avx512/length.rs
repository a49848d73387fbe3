//! AVX-512 code point counters and output length estimators.

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::{load, surrogates, swap_if};
use crate::scalar::{utf16, utf32, utf8};

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn count_utf8(input: &[u8]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        let leader_floor = _mm512_set1_epi8(-65);
        while pos + 64 <= input.len() {
            let v = load(input.as_ptr().add(pos));
            count += _mm512_cmpgt_epi8_mask(v, leader_floor).count_ones() as usize;
            pos += 64;
        }
    }
    count + utf8::count_code_points(&input[pos..])
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn utf16_length_from_utf8(input: &[u8]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        let leader_floor = _mm512_set1_epi8(-65);
        let four_byte = _mm512_set1_epi8(0xF0u8 as i8);
        while pos + 64 <= input.len() {
            let v = load(input.as_ptr().add(pos));
            count += _mm512_cmpgt_epi8_mask(v, leader_floor).count_ones() as usize
                + _mm512_cmpge_epu8_mask(v, four_byte).count_ones() as usize;
            pos += 64;
        }
    }
    count + utf8::utf16_length(&input[pos..])
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn count_utf16<const BE: bool>(input: &[u16]) -> usize {
    let mut pos = 0;
    let mut highs = 0;
    unsafe {
        while pos + 32 <= input.len() {
            let v = swap_if::<BE>(load(input.as_ptr().add(pos).cast()));
            let high = _mm512_cmpeq_epi16_mask(
                _mm512_and_si512(v, _mm512_set1_epi16(0xFC00u16 as i16)),
                _mm512_set1_epi16(0xD800u16 as i16),
            );
            highs += high.count_ones() as usize;
            pos += 32;
        }
    }
    pos - highs + utf16::count_code_points::<BE>(&input[pos..])
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn utf8_length_from_utf16<const BE: bool>(input: &[u16]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        while pos + 32 <= input.len() {
            let v = swap_if::<BE>(load(input.as_ptr().add(pos).cast()));
            let ge_80 = _mm512_cmpge_epu16_mask(v, _mm512_set1_epi16(0x80));
            let ge_800 = _mm512_cmpge_epu16_mask(v, _mm512_set1_epi16(0x800));
            count += 32 + ge_80.count_ones() as usize + ge_800.count_ones() as usize
                - surrogates(v).count_ones() as usize;
            pos += 32;
        }
    }
    count + utf16::utf8_length::<BE>(&input[pos..])
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn utf8_length_from_utf32(input: &[u32]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        while pos + 16 <= input.len() {
            let v = load(input.as_ptr().add(pos).cast());
            count += 16
                + _mm512_cmpge_epu32_mask(v, _mm512_set1_epi32(0x80)).count_ones() as usize
                + _mm512_cmpge_epu32_mask(v, _mm512_set1_epi32(0x800)).count_ones() as usize
                + _mm512_cmpge_epu32_mask(v, _mm512_set1_epi32(0x10000)).count_ones() as usize;
            pos += 16;
        }
    }
    count + utf32::utf8_length(&input[pos..])
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn utf16_length_from_utf32(input: &[u32]) -> usize {
    let mut pos = 0;
    let mut count = 0;
    unsafe {
        while pos + 16 <= input.len() {
            let v = load(input.as_ptr().add(pos).cast());
            count += 16
                + _mm512_cmpge_epu32_mask(v, _mm512_set1_epi32(0x10000)).count_ones() as usize;
            pos += 16;
        }
    }
    count + utf32::utf16_length(&input[pos..])
}

#[cfg(test)]
mod tests {
    use super::super::KERNEL;
    use crate::kernel::scalar;

    #[test]
    fn lengths_match_scalar() {
        let (Some(ops), Some(reference)) = (KERNEL.ops(), scalar::KERNEL.ops()) else {
            return;
        };
        let text = "ascii ü 中 🙂 ".repeat(23);
        let bytes = text.as_bytes();
        let le: Vec<u16> = text.encode_utf16().map(u16::to_le).collect();
        let be: Vec<u16> = text.encode_utf16().map(u16::to_be).collect();
        let utf32: Vec<u32> = text.chars().map(|c| c as u32).collect();

        assert_eq!(ops.count_utf8(bytes), reference.count_utf8(bytes));
        assert_eq!(ops.utf16_length_from_utf8(bytes), le.len());
        assert_eq!(ops.count_utf16be(&be), utf32.len());
        assert_eq!(ops.utf8_length_from_utf16le(&le), bytes.len());
        assert_eq!(ops.utf8_length_from_utf16be(&be), bytes.len());
        assert_eq!(ops.utf8_length_from_utf32(&utf32), bytes.len());
        assert_eq!(ops.utf16_length_from_utf32(&utf32), le.len());
    }
}
