//! AVX-512 validators.

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::{load, surrogates, swap_if, table};
use crate::error::{ErrorKind, TranscodeResult};
use crate::kernel::tables;
use crate::scalar::{ascii, utf16, utf32, utf8};

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn validate_ascii(input: &[u8]) -> bool {
    let mut pos = 0;
    unsafe {
        let src = input.as_ptr();
        while pos + 256 <= input.len() {
            let any = _mm512_or_si512(
                _mm512_or_si512(load(src.add(pos)), load(src.add(pos + 64))),
                _mm512_or_si512(load(src.add(pos + 128)), load(src.add(pos + 192))),
            );
            if _mm512_movepi8_mask(any) != 0 {
                return false;
            }
            pos += 256;
        }
        while pos + 64 <= input.len() {
            if _mm512_movepi8_mask(load(src.add(pos))) != 0 {
                return false;
            }
            pos += 64;
        }
    }
    ascii::validate(&input[pos..])
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn validate_ascii_with_errors(input: &[u8]) -> TranscodeResult {
    let mut pos = 0;
    unsafe {
        while pos + 64 <= input.len() {
            let mask = _mm512_movepi8_mask(load(input.as_ptr().add(pos)));
            if mask != 0 {
                return TranscodeResult::err(
                    ErrorKind::TooLarge,
                    pos + mask.trailing_zeros() as usize,
                );
            }
            pos += 64;
        }
    }
    ascii::validate_with_errors(&input[pos..]).rebase(pos, pos)
}

// =============================================================================
// UTF-8
// =============================================================================

struct Utf8Checker {
    error: __m512i,
    prev_input: __m512i,
    prev_incomplete: __m512i,
}

impl Utf8Checker {
    #[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
    #[inline]
    fn new() -> Self {
        Self {
            error: _mm512_setzero_si512(),
            prev_input: _mm512_setzero_si512(),
            prev_incomplete: _mm512_setzero_si512(),
        }
    }

    #[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
    #[inline]
    unsafe fn check(&mut self, input: __m512i) {
        unsafe {
            if _mm512_movepi8_mask(input) == 0 {
                self.error = _mm512_or_si512(self.error, self.prev_incomplete);
                self.prev_incomplete = _mm512_setzero_si512();
                self.prev_input = input;
                return;
            }

            // Each 128-bit lane of `carried` is the lane just before the
            // matching lane of `input`
            let carried = _mm512_permutex2var_epi64(
                self.prev_input,
                _mm512_set_epi64(13, 12, 11, 10, 9, 8, 7, 6),
                input,
            );
            let prev1 = _mm512_alignr_epi8(input, carried, 15);
            let prev2 = _mm512_alignr_epi8(input, carried, 14);
            let prev3 = _mm512_alignr_epi8(input, carried, 13);

            let nibble = _mm512_set1_epi8(0x0F);
            let byte_1_high = _mm512_shuffle_epi8(
                table(&tables::BYTE_1_HIGH),
                _mm512_and_si512(_mm512_srli_epi16(prev1, 4), nibble),
            );
            let byte_1_low = _mm512_shuffle_epi8(
                table(&tables::BYTE_1_LOW),
                _mm512_and_si512(prev1, nibble),
            );
            let byte_2_high = _mm512_shuffle_epi8(
                table(&tables::BYTE_2_HIGH),
                _mm512_and_si512(_mm512_srli_epi16(input, 4), nibble),
            );
            let special =
                _mm512_and_si512(_mm512_and_si512(byte_1_high, byte_1_low), byte_2_high);

            let third = _mm512_subs_epu8(prev2, _mm512_set1_epi8(0x60));
            let fourth = _mm512_subs_epu8(prev3, _mm512_set1_epi8(0x70));
            let must_be_cont = _mm512_and_si512(
                _mm512_or_si512(third, fourth),
                _mm512_set1_epi8(0x80u8 as i8),
            );

            self.error = _mm512_or_si512(self.error, _mm512_xor_si512(must_be_cont, special));
            self.prev_incomplete = _mm512_subs_epu8(input, load(tables::INCOMPLETE_MAX.as_ptr()));
            self.prev_input = input;
        }
    }

    #[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
    #[inline]
    fn has_error(&self) -> bool {
        _mm512_test_epi8_mask(self.error, self.error) != 0
    }
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn validate_utf8(input: &[u8]) -> bool {
    let mut checker = Utf8Checker::new();
    let mut pos = 0;
    unsafe {
        while pos + 64 <= input.len() {
            checker.check(load(input.as_ptr().add(pos)));
            pos += 64;
        }
    }
    if checker.has_error() {
        return false;
    }
    utf8::validate(&input[utf8::rewind_to_leader(input, pos)..])
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn validate_utf8_with_errors(input: &[u8]) -> TranscodeResult {
    let mut checker = Utf8Checker::new();
    let mut pos = 0;
    unsafe {
        while pos + 64 <= input.len() {
            checker.check(load(input.as_ptr().add(pos)));
            if checker.has_error() {
                return utf8::rewind_and_validate_with_errors(input, pos);
            }
            pos += 64;
        }
    }
    utf8::rewind_and_validate_with_errors(input, pos)
}

// =============================================================================
// UTF-16 and UTF-32
// =============================================================================

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn validate_utf16<const BE: bool>(input: &[u16]) -> bool {
    unsafe { validate_utf16_with_errors::<BE>(input).is_ok() }
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn validate_utf16_with_errors<const BE: bool>(input: &[u16]) -> TranscodeResult {
    let mut pos = 0;
    unsafe {
        while pos + 32 <= input.len() {
            let v = swap_if::<BE>(load(input.as_ptr().add(pos).cast()));
            if surrogates(v) == 0 {
                pos += 32;
                continue;
            }
            let end = pos + 32;
            while pos < end {
                match utf16::decode_at::<BE>(input, pos) {
                    Ok((_, n)) => pos += n,
                    Err(kind) => return TranscodeResult::err(kind, pos),
                }
            }
        }
    }
    utf16::validate_with_errors::<BE>(&input[pos..]).rebase(pos, pos)
}

/// Bit per lane holding a surrogate or a value above U+10FFFF.
#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) fn utf32_invalid(v: __m512i) -> __mmask16 {
    let too_large = _mm512_cmpge_epu32_mask(v, _mm512_set1_epi32(0x110000));
    let offset = _mm512_sub_epi32(v, _mm512_set1_epi32(0xD800));
    too_large | _mm512_cmple_epu32_mask(offset, _mm512_set1_epi32(0x7FF))
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn validate_utf32(input: &[u32]) -> bool {
    unsafe { validate_utf32_with_errors(input).is_ok() }
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn validate_utf32_with_errors(input: &[u32]) -> TranscodeResult {
    let mut pos = 0;
    unsafe {
        while pos + 16 <= input.len() {
            let bad = utf32_invalid(load(input.as_ptr().add(pos).cast()));
            if bad != 0 {
                let lane = pos + bad.trailing_zeros() as usize;
                return utf32::validate_with_errors(&input[lane..]).rebase(lane, lane);
            }
            pos += 16;
        }
    }
    utf32::validate_with_errors(&input[pos..]).rebase(pos, pos)
}
