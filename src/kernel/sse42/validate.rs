//! SSE4.2 validators.

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::{load, swap_if, table};
use crate::error::{ErrorKind, TranscodeResult};
use crate::kernel::tables;
use crate::scalar::{ascii, utf16, utf32, utf8};

// =============================================================================
// ASCII
// =============================================================================

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn validate_ascii(input: &[u8]) -> bool {
    let mut pos = 0;
    unsafe {
        let src = input.as_ptr();
        while pos + 64 <= input.len() {
            let any = _mm_or_si128(
                _mm_or_si128(load(src.add(pos)), load(src.add(pos + 16))),
                _mm_or_si128(load(src.add(pos + 32)), load(src.add(pos + 48))),
            );
            if _mm_movemask_epi8(any) != 0 {
                return false;
            }
            pos += 64;
        }
        while pos + 16 <= input.len() {
            if _mm_movemask_epi8(load(src.add(pos))) != 0 {
                return false;
            }
            pos += 16;
        }
    }
    ascii::validate(&input[pos..])
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn validate_ascii_with_errors(input: &[u8]) -> TranscodeResult {
    let mut pos = 0;
    unsafe {
        while pos + 16 <= input.len() {
            let mask = _mm_movemask_epi8(load(input.as_ptr().add(pos)));
            if mask != 0 {
                return TranscodeResult::err(
                    ErrorKind::TooLarge,
                    pos + mask.trailing_zeros() as usize,
                );
            }
            pos += 16;
        }
    }
    ascii::validate_with_errors(&input[pos..]).rebase(pos, pos)
}

// =============================================================================
// UTF-8
// =============================================================================

/// Running state of the lookup-table validator across 16-byte blocks.
struct Utf8Checker {
    error: __m128i,
    prev_input: __m128i,
    prev_incomplete: __m128i,
}

impl Utf8Checker {
    #[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
    #[inline]
    fn new() -> Self {
        Self {
            error: _mm_setzero_si128(),
            prev_input: _mm_setzero_si128(),
            prev_incomplete: _mm_setzero_si128(),
        }
    }

    #[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
    #[inline]
    unsafe fn check(&mut self, input: __m128i) {
        unsafe {
            if _mm_movemask_epi8(input) == 0 {
                self.error = _mm_or_si128(self.error, self.prev_incomplete);
                self.prev_incomplete = _mm_setzero_si128();
                self.prev_input = input;
                return;
            }

            let nibble = _mm_set1_epi8(0x0F);
            let prev1 = _mm_alignr_epi8(input, self.prev_input, 15);
            let byte_1_high = _mm_shuffle_epi8(
                table(&tables::BYTE_1_HIGH),
                _mm_and_si128(_mm_srli_epi16(prev1, 4), nibble),
            );
            let byte_1_low =
                _mm_shuffle_epi8(table(&tables::BYTE_1_LOW), _mm_and_si128(prev1, nibble));
            let byte_2_high = _mm_shuffle_epi8(
                table(&tables::BYTE_2_HIGH),
                _mm_and_si128(_mm_srli_epi16(input, 4), nibble),
            );
            let special = _mm_and_si128(_mm_and_si128(byte_1_high, byte_1_low), byte_2_high);

            let prev2 = _mm_alignr_epi8(input, self.prev_input, 14);
            let prev3 = _mm_alignr_epi8(input, self.prev_input, 13);
            let third = _mm_subs_epu8(prev2, _mm_set1_epi8(0x60));
            let fourth = _mm_subs_epu8(prev3, _mm_set1_epi8(0x70));
            let must_be_cont =
                _mm_and_si128(_mm_or_si128(third, fourth), _mm_set1_epi8(0x80u8 as i8));

            self.error = _mm_or_si128(self.error, _mm_xor_si128(must_be_cont, special));
            self.prev_incomplete = _mm_subs_epu8(input, table_at(&tables::INCOMPLETE_MAX[48..]));
            self.prev_input = input;
        }
    }

    #[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
    #[inline]
    fn has_error(&self) -> bool {
        _mm_testz_si128(self.error, self.error) == 0
    }
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
unsafe fn table_at(bytes: &[u8]) -> __m128i {
    debug_assert!(bytes.len() >= 16);
    unsafe { load(bytes.as_ptr()) }
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn validate_utf8(input: &[u8]) -> bool {
    let mut checker = Utf8Checker::new();
    let mut pos = 0;
    unsafe {
        while pos + 16 <= input.len() {
            checker.check(load(input.as_ptr().add(pos)));
            pos += 16;
        }
    }
    if checker.has_error() {
        return false;
    }
    utf8::validate(&input[utf8::rewind_to_leader(input, pos)..])
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn validate_utf8_with_errors(input: &[u8]) -> TranscodeResult {
    let mut checker = Utf8Checker::new();
    let mut pos = 0;
    unsafe {
        while pos + 16 <= input.len() {
            checker.check(load(input.as_ptr().add(pos)));
            if checker.has_error() {
                return utf8::rewind_and_validate_with_errors(input, pos);
            }
            pos += 16;
        }
    }
    utf8::rewind_and_validate_with_errors(input, pos)
}

// =============================================================================
// UTF-16
// =============================================================================

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn validate_utf16<const BE: bool>(input: &[u16]) -> bool {
    unsafe { validate_utf16_with_errors::<BE>(input).is_ok() }
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn validate_utf16_with_errors<const BE: bool>(input: &[u16]) -> TranscodeResult {
    let mut pos = 0;
    unsafe {
        while pos + 8 <= input.len() {
            let v = swap_if::<BE>(load(input.as_ptr().add(pos).cast()));
            let surrogates = _mm_cmpeq_epi16(
                _mm_and_si128(v, _mm_set1_epi16(0xF800u16 as i16)),
                _mm_set1_epi16(0xD800u16 as i16),
            );
            if _mm_movemask_epi8(surrogates) == 0 {
                pos += 8;
                continue;
            }
            let end = pos + 8;
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

// =============================================================================
// UTF-32
// =============================================================================

/// All ones in lanes holding a surrogate or a value above U+10FFFF.
#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) fn utf32_invalid(v: __m128i) -> __m128i {
    let too_large = super::ge_u32(v, 0x110000);
    let offset = _mm_sub_epi32(v, _mm_set1_epi32(0xD800));
    let surrogate = _mm_cmpeq_epi32(_mm_min_epu32(offset, _mm_set1_epi32(0x7FF)), offset);
    _mm_or_si128(too_large, surrogate)
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn validate_utf32(input: &[u32]) -> bool {
    let mut pos = 0;
    let mut bad = _mm_setzero_si128();
    unsafe {
        while pos + 4 <= input.len() {
            bad = _mm_or_si128(bad, utf32_invalid(load(input.as_ptr().add(pos).cast())));
            pos += 4;
        }
    }
    _mm_testz_si128(bad, bad) == 1 && utf32::validate(&input[pos..])
}

#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
pub(super) unsafe fn validate_utf32_with_errors(input: &[u32]) -> TranscodeResult {
    let mut pos = 0;
    unsafe {
        while pos + 4 <= input.len() {
            let bad = utf32_invalid(load(input.as_ptr().add(pos).cast()));
            if _mm_testz_si128(bad, bad) == 0 {
                break;
            }
            pos += 4;
        }
    }
    utf32::validate_with_errors(&input[pos..]).rebase(pos, pos)
}
