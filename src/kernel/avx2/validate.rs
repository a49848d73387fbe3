//! AVX2 validators.

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::{ge_u32, has_surrogate, load, swap_if, table};
use crate::error::{ErrorKind, TranscodeResult};
use crate::kernel::tables;
use crate::scalar::{ascii, utf16, utf32, utf8};

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn validate_ascii(input: &[u8]) -> bool {
    let mut pos = 0;
    unsafe {
        let src = input.as_ptr();
        while pos + 128 <= input.len() {
            let any = _mm256_or_si256(
                _mm256_or_si256(load(src.add(pos)), load(src.add(pos + 32))),
                _mm256_or_si256(load(src.add(pos + 64)), load(src.add(pos + 96))),
            );
            if _mm256_movemask_epi8(any) != 0 {
                return false;
            }
            pos += 128;
        }
        while pos + 32 <= input.len() {
            if _mm256_movemask_epi8(load(src.add(pos))) != 0 {
                return false;
            }
            pos += 32;
        }
    }
    ascii::validate(&input[pos..])
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn validate_ascii_with_errors(input: &[u8]) -> TranscodeResult {
    let mut pos = 0;
    unsafe {
        while pos + 32 <= input.len() {
            let mask = _mm256_movemask_epi8(load(input.as_ptr().add(pos))) as u32;
            if mask != 0 {
                return TranscodeResult::err(
                    ErrorKind::TooLarge,
                    pos + mask.trailing_zeros() as usize,
                );
            }
            pos += 32;
        }
    }
    ascii::validate_with_errors(&input[pos..]).rebase(pos, pos)
}

// =============================================================================
// UTF-8
// =============================================================================

struct Utf8Checker {
    error: __m256i,
    prev_input: __m256i,
    prev_incomplete: __m256i,
}

impl Utf8Checker {
    #[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
    #[inline]
    fn new() -> Self {
        Self {
            error: _mm256_setzero_si256(),
            prev_input: _mm256_setzero_si256(),
            prev_incomplete: _mm256_setzero_si256(),
        }
    }

    #[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
    #[inline]
    unsafe fn check(&mut self, input: __m256i) {
        unsafe {
            if _mm256_movemask_epi8(input) == 0 {
                self.error = _mm256_or_si256(self.error, self.prev_incomplete);
                self.prev_incomplete = _mm256_setzero_si256();
                self.prev_input = input;
                return;
            }

            // Upper half of the previous block next to the lower half of this one
            let carried = _mm256_permute2x128_si256(self.prev_input, input, 0x21);
            let prev1 = _mm256_alignr_epi8(input, carried, 15);
            let prev2 = _mm256_alignr_epi8(input, carried, 14);
            let prev3 = _mm256_alignr_epi8(input, carried, 13);

            let nibble = _mm256_set1_epi8(0x0F);
            let byte_1_high = _mm256_shuffle_epi8(
                table(&tables::BYTE_1_HIGH),
                _mm256_and_si256(_mm256_srli_epi16(prev1, 4), nibble),
            );
            let byte_1_low = _mm256_shuffle_epi8(
                table(&tables::BYTE_1_LOW),
                _mm256_and_si256(prev1, nibble),
            );
            let byte_2_high = _mm256_shuffle_epi8(
                table(&tables::BYTE_2_HIGH),
                _mm256_and_si256(_mm256_srli_epi16(input, 4), nibble),
            );
            let special =
                _mm256_and_si256(_mm256_and_si256(byte_1_high, byte_1_low), byte_2_high);

            let third = _mm256_subs_epu8(prev2, _mm256_set1_epi8(0x60));
            let fourth = _mm256_subs_epu8(prev3, _mm256_set1_epi8(0x70));
            let must_be_cont = _mm256_and_si256(
                _mm256_or_si256(third, fourth),
                _mm256_set1_epi8(0x80u8 as i8),
            );

            self.error = _mm256_or_si256(self.error, _mm256_xor_si256(must_be_cont, special));
            self.prev_incomplete = _mm256_subs_epu8(
                input,
                _mm256_loadu_si256(tables::INCOMPLETE_MAX[32..].as_ptr().cast()),
            );
            self.prev_input = input;
        }
    }

    #[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
    #[inline]
    fn has_error(&self) -> bool {
        _mm256_testz_si256(self.error, self.error) == 0
    }
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn validate_utf8(input: &[u8]) -> bool {
    let mut checker = Utf8Checker::new();
    let mut pos = 0;
    unsafe {
        while pos + 32 <= input.len() {
            checker.check(load(input.as_ptr().add(pos)));
            pos += 32;
        }
    }
    if checker.has_error() {
        return false;
    }
    utf8::validate(&input[utf8::rewind_to_leader(input, pos)..])
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn validate_utf8_with_errors(input: &[u8]) -> TranscodeResult {
    let mut checker = Utf8Checker::new();
    let mut pos = 0;
    unsafe {
        while pos + 32 <= input.len() {
            checker.check(load(input.as_ptr().add(pos)));
            if checker.has_error() {
                return utf8::rewind_and_validate_with_errors(input, pos);
            }
            pos += 32;
        }
    }
    utf8::rewind_and_validate_with_errors(input, pos)
}

// =============================================================================
// UTF-16 and UTF-32
// =============================================================================

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn validate_utf16<const BE: bool>(input: &[u16]) -> bool {
    unsafe { validate_utf16_with_errors::<BE>(input).is_ok() }
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn validate_utf16_with_errors<const BE: bool>(input: &[u16]) -> TranscodeResult {
    let mut pos = 0;
    unsafe {
        while pos + 16 <= input.len() {
            let v = swap_if::<BE>(load(input.as_ptr().add(pos).cast()));
            if !has_surrogate(v) {
                pos += 16;
                continue;
            }
            let end = pos + 16;
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

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) fn utf32_invalid(v: __m256i) -> __m256i {
    let offset = _mm256_sub_epi32(v, _mm256_set1_epi32(0xD800));
    let surrogate =
        _mm256_cmpeq_epi32(_mm256_min_epu32(offset, _mm256_set1_epi32(0x7FF)), offset);
    _mm256_or_si256(ge_u32(v, 0x110000), surrogate)
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn validate_utf32(input: &[u32]) -> bool {
    let mut pos = 0;
    let mut bad = _mm256_setzero_si256();
    unsafe {
        while pos + 8 <= input.len() {
            bad = _mm256_or_si256(bad, utf32_invalid(load(input.as_ptr().add(pos).cast())));
            pos += 8;
        }
    }
    _mm256_testz_si256(bad, bad) == 1 && utf32::validate(&input[pos..])
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn validate_utf32_with_errors(input: &[u32]) -> TranscodeResult {
    let mut pos = 0;
    unsafe {
        while pos + 8 <= input.len() {
            let bad = utf32_invalid(load(input.as_ptr().add(pos).cast()));
            if _mm256_testz_si256(bad, bad) == 0 {
                break;
            }
            pos += 8;
        }
    }
    utf32::validate_with_errors(&input[pos..]).rebase(pos, pos)
}
