//! NEON validators.

#[cfg(target_arch = "aarch64")]
use core::arch::aarch64::*;

use super::{has_surrogate, swap_if, table};
use crate::error::TranscodeResult;
use crate::kernel::tables;
use crate::scalar::{ascii, utf16, utf32, utf8};

// =============================================================================
// ASCII
// =============================================================================

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn validate_ascii(input: &[u8]) -> bool {
    let mut pos = 0;
    unsafe {
        let src = input.as_ptr();
        while pos + 64 <= input.len() {
            let any = vorrq_u8(
                vorrq_u8(vld1q_u8(src.add(pos)), vld1q_u8(src.add(pos + 16))),
                vorrq_u8(vld1q_u8(src.add(pos + 32)), vld1q_u8(src.add(pos + 48))),
            );
            if vmaxvq_u8(any) >= 0x80 {
                return false;
            }
            pos += 64;
        }
        while pos + 16 <= input.len() {
            if vmaxvq_u8(vld1q_u8(src.add(pos))) >= 0x80 {
                return false;
            }
            pos += 16;
        }
    }
    ascii::validate(&input[pos..])
}

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn validate_ascii_with_errors(input: &[u8]) -> TranscodeResult {
    let mut pos = 0;
    unsafe {
        while pos + 16 <= input.len() {
            if vmaxvq_u8(vld1q_u8(input.as_ptr().add(pos))) >= 0x80 {
                break;
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
    error: uint8x16_t,
    prev_input: uint8x16_t,
    prev_incomplete: uint8x16_t,
}

impl Utf8Checker {
    #[target_feature(enable = "neon")]
    #[inline]
    unsafe fn new() -> Self {
        unsafe {
            Self {
                error: vdupq_n_u8(0),
                prev_input: vdupq_n_u8(0),
                prev_incomplete: vdupq_n_u8(0),
            }
        }
    }

    #[target_feature(enable = "neon")]
    #[inline]
    unsafe fn check(&mut self, input: uint8x16_t) {
        unsafe {
            if vmaxvq_u8(input) < 0x80 {
                self.error = vorrq_u8(self.error, self.prev_incomplete);
                self.prev_incomplete = vdupq_n_u8(0);
                self.prev_input = input;
                return;
            }

            let prev1 = vextq_u8::<15>(self.prev_input, input);
            let byte_1_high = vqtbl1q_u8(table(&tables::BYTE_1_HIGH), vshrq_n_u8::<4>(prev1));
            let byte_1_low = vqtbl1q_u8(
                table(&tables::BYTE_1_LOW),
                vandq_u8(prev1, vdupq_n_u8(0x0F)),
            );
            let byte_2_high = vqtbl1q_u8(table(&tables::BYTE_2_HIGH), vshrq_n_u8::<4>(input));
            let special = vandq_u8(vandq_u8(byte_1_high, byte_1_low), byte_2_high);

            let prev2 = vextq_u8::<14>(self.prev_input, input);
            let prev3 = vextq_u8::<13>(self.prev_input, input);
            let third = vqsubq_u8(prev2, vdupq_n_u8(0x60));
            let fourth = vqsubq_u8(prev3, vdupq_n_u8(0x70));
            let must_be_cont = vandq_u8(vorrq_u8(third, fourth), vdupq_n_u8(0x80));

            self.error = vorrq_u8(self.error, veorq_u8(must_be_cont, special));
            self.prev_incomplete =
                vqsubq_u8(input, vld1q_u8(tables::INCOMPLETE_MAX[48..].as_ptr()));
            self.prev_input = input;
        }
    }

    #[target_feature(enable = "neon")]
    #[inline]
    unsafe fn has_error(&self) -> bool {
        unsafe { vmaxvq_u8(self.error) != 0 }
    }
}

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn validate_utf8(input: &[u8]) -> bool {
    let mut pos = 0;
    unsafe {
        let mut checker = Utf8Checker::new();
        while pos + 16 <= input.len() {
            checker.check(vld1q_u8(input.as_ptr().add(pos)));
            pos += 16;
        }
        if checker.has_error() {
            return false;
        }
    }
    utf8::validate(&input[utf8::rewind_to_leader(input, pos)..])
}

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn validate_utf8_with_errors(input: &[u8]) -> TranscodeResult {
    let mut pos = 0;
    unsafe {
        let mut checker = Utf8Checker::new();
        while pos + 16 <= input.len() {
            checker.check(vld1q_u8(input.as_ptr().add(pos)));
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

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn validate_utf16<const BE: bool>(input: &[u16]) -> bool {
    unsafe { validate_utf16_with_errors::<BE>(input).is_ok() }
}

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn validate_utf16_with_errors<const BE: bool>(input: &[u16]) -> TranscodeResult {
    let mut pos = 0;
    unsafe {
        while pos + 8 <= input.len() {
            let v = swap_if::<BE>(vld1q_u16(input.as_ptr().add(pos)));
            if !has_surrogate(v) {
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
#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn utf32_invalid(v: uint32x4_t) -> uint32x4_t {
    unsafe {
        let too_large = vcgeq_u32(v, vdupq_n_u32(0x110000));
        let surrogate = vcltq_u32(vsubq_u32(v, vdupq_n_u32(0xD800)), vdupq_n_u32(0x800));
        vorrq_u32(too_large, surrogate)
    }
}

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn validate_utf32(input: &[u32]) -> bool {
    let mut pos = 0;
    unsafe {
        let mut bad = vdupq_n_u32(0);
        while pos + 4 <= input.len() {
            bad = vorrq_u32(bad, utf32_invalid(vld1q_u32(input.as_ptr().add(pos))));
            pos += 4;
        }
        if vmaxvq_u32(bad) != 0 {
            return false;
        }
    }
    utf32::validate(&input[pos..])
}

#[target_feature(enable = "neon")]
#[inline]
pub(super) unsafe fn validate_utf32_with_errors(input: &[u32]) -> TranscodeResult {
    let mut pos = 0;
    unsafe {
        while pos + 4 <= input.len() {
            if vmaxvq_u32(utf32_invalid(vld1q_u32(input.as_ptr().add(pos)))) != 0 {
                break;
            }
            pos += 4;
        }
    }
    utf32::validate_with_errors(&input[pos..]).rebase(pos, pos)
}
