//! SSE4.2 kernel for x86_64.
//!
//! Processes 16 bytes per step. Every entry point is compiled with
//! `sse2,ssse3,sse4.1,sse4.2,popcnt` and only reachable through
//! [`KERNEL`] once the host has been checked for those features.

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

mod from_utf16;
mod from_utf32;
mod from_utf8;
mod length;
mod validate;

use super::{tables, Kernel, KernelOps};
use crate::encoding::{detect, EncodingSet};
use crate::isa::IsaFeatures;

const LE: bool = false;
const BE: bool = true;

pub static KERNEL: Kernel = Kernel::new(
    "sse42",
    "Intel/AMD SSE4.2",
    IsaFeatures::SSE2
        .union(IsaFeatures::SSSE3)
        .union(IsaFeatures::SSE41)
        .union(IsaFeatures::SSE42)
        .union(IsaFeatures::POPCNT),
    KernelOps {
        validate_ascii: validate::validate_ascii,
        validate_ascii_with_errors: validate::validate_ascii_with_errors,
        validate_utf8: validate::validate_utf8,
        validate_utf8_with_errors: validate::validate_utf8_with_errors,
        validate_utf16le: validate::validate_utf16::<LE>,
        validate_utf16be: validate::validate_utf16::<BE>,
        validate_utf16le_with_errors: validate::validate_utf16_with_errors::<LE>,
        validate_utf16be_with_errors: validate::validate_utf16_with_errors::<BE>,
        validate_utf32: validate::validate_utf32,
        validate_utf32_with_errors: validate::validate_utf32_with_errors,

        count_utf8: length::count_utf8,
        count_utf16le: length::count_utf16::<LE>,
        count_utf16be: length::count_utf16::<BE>,
        utf16_length_from_utf8: length::utf16_length_from_utf8,
        utf32_length_from_utf8: length::count_utf8,
        utf8_length_from_utf16le: length::utf8_length_from_utf16::<LE>,
        utf8_length_from_utf16be: length::utf8_length_from_utf16::<BE>,
        utf32_length_from_utf16le: length::count_utf16::<LE>,
        utf32_length_from_utf16be: length::count_utf16::<BE>,
        utf8_length_from_utf32: length::utf8_length_from_utf32,
        utf16_length_from_utf32: length::utf16_length_from_utf32,

        convert_utf8_to_utf16le: from_utf8::convert_utf8_to_utf16::<LE>,
        convert_utf8_to_utf16be: from_utf8::convert_utf8_to_utf16::<BE>,
        convert_utf8_to_utf16le_with_errors: from_utf8::convert_utf8_to_utf16_with_errors::<LE>,
        convert_utf8_to_utf16be_with_errors: from_utf8::convert_utf8_to_utf16_with_errors::<BE>,
        convert_valid_utf8_to_utf16le: from_utf8::convert_valid_utf8_to_utf16::<LE>,
        convert_valid_utf8_to_utf16be: from_utf8::convert_valid_utf8_to_utf16::<BE>,

        convert_utf8_to_utf32: from_utf8::convert_utf8_to_utf32,
        convert_utf8_to_utf32_with_errors: from_utf8::convert_utf8_to_utf32_with_errors,
        convert_valid_utf8_to_utf32: from_utf8::convert_valid_utf8_to_utf32,

        convert_utf16le_to_utf8: from_utf16::convert_utf16_to_utf8::<LE>,
        convert_utf16be_to_utf8: from_utf16::convert_utf16_to_utf8::<BE>,
        convert_utf16le_to_utf8_with_errors: from_utf16::convert_utf16_to_utf8_with_errors::<LE>,
        convert_utf16be_to_utf8_with_errors: from_utf16::convert_utf16_to_utf8_with_errors::<BE>,
        convert_valid_utf16le_to_utf8: from_utf16::convert_valid_utf16_to_utf8::<LE>,
        convert_valid_utf16be_to_utf8: from_utf16::convert_valid_utf16_to_utf8::<BE>,

        convert_utf16le_to_utf32: from_utf16::convert_utf16_to_utf32::<LE>,
        convert_utf16be_to_utf32: from_utf16::convert_utf16_to_utf32::<BE>,
        convert_utf16le_to_utf32_with_errors: from_utf16::convert_utf16_to_utf32_with_errors::<LE>,
        convert_utf16be_to_utf32_with_errors: from_utf16::convert_utf16_to_utf32_with_errors::<BE>,
        convert_valid_utf16le_to_utf32: from_utf16::convert_valid_utf16_to_utf32::<LE>,
        convert_valid_utf16be_to_utf32: from_utf16::convert_valid_utf16_to_utf32::<BE>,

        convert_utf32_to_utf8: from_utf32::convert_utf32_to_utf8,
        convert_utf32_to_utf8_with_errors: from_utf32::convert_utf32_to_utf8_with_errors,
        convert_valid_utf32_to_utf8: from_utf32::convert_valid_utf32_to_utf8,

        convert_utf32_to_utf16le: from_utf32::convert_utf32_to_utf16::<LE>,
        convert_utf32_to_utf16be: from_utf32::convert_utf32_to_utf16::<BE>,
        convert_utf32_to_utf16le_with_errors: from_utf32::convert_utf32_to_utf16_with_errors::<LE>,
        convert_utf32_to_utf16be_with_errors: from_utf32::convert_utf32_to_utf16_with_errors::<BE>,
        convert_valid_utf32_to_utf16le: from_utf32::convert_valid_utf32_to_utf16::<LE>,
        convert_valid_utf32_to_utf16be: from_utf32::convert_valid_utf32_to_utf16::<BE>,

        change_endianness_utf16: from_utf16::change_endianness_utf16,

        detect_encodings,
    },
);

fn detect_encodings(input: &[u8]) -> EncodingSet {
    detect::detect_with(KERNEL.ops_unchecked(), input)
}

// =============================================================================
// Shared vector helpers
// =============================================================================

#[inline]
unsafe fn load(ptr: *const u8) -> __m128i {
    unsafe { _mm_loadu_si128(ptr.cast()) }
}

#[inline]
unsafe fn table(t: &[u8; 16]) -> __m128i {
    unsafe { _mm_loadu_si128(t.as_ptr().cast()) }
}

/// Lane mask of 32-bit lanes as four bits.
#[inline]
unsafe fn mask32(v: __m128i) -> u32 {
    unsafe { _mm_movemask_ps(_mm_castsi128_ps(v)) as u32 }
}

/// Unsigned `v >= t` per 32-bit lane.
#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
fn ge_u32(v: __m128i, t: u32) -> __m128i {
    _mm_cmpeq_epi32(_mm_max_epu32(v, _mm_set1_epi32(t as i32)), v)
}

/// Reorder the bytes of 16-bit lanes from big-endian when `BE` is set.
#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
unsafe fn swap_if<const BE: bool>(v: __m128i) -> __m128i {
    if BE {
        unsafe { _mm_shuffle_epi8(v, table(&tables::SWAP_BYTES_16)) }
    } else {
        v
    }
}

/// UTF-8 sequences decoded from four consecutive byte positions.
struct Decoded {
    /// Code point of each lane (garbage for continuation lanes).
    cp: __m128i,
    /// All ones where the leading byte is `F0..FF`.
    four: __m128i,
    /// Bit per lane that holds a leading byte.
    leaders: u32,
}

/// Decode the sequences starting at each of the four bytes at `src`.
///
/// Reads 16 bytes. Lanes whose byte is a continuation are flagged off in
/// `leaders`.
#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
unsafe fn decode_utf8_x4(src: *const u8) -> Decoded {
    unsafe {
        let bytes = _mm_shuffle_epi8(load(src), table(&tables::UTF8_WINDOWS));
        let low6 = _mm_set1_epi32(0x3F);

        let b0 = _mm_and_si128(bytes, _mm_set1_epi32(0xFF));
        let c1 = _mm_and_si128(_mm_srli_epi32(bytes, 8), low6);
        let c2 = _mm_and_si128(_mm_srli_epi32(bytes, 16), low6);
        let c3 = _mm_and_si128(_mm_srli_epi32(bytes, 24), low6);

        let cp2 = _mm_or_si128(
            _mm_slli_epi32(_mm_and_si128(b0, _mm_set1_epi32(0x1F)), 6),
            c1,
        );
        let cp3 = _mm_or_si128(
            _mm_or_si128(
                _mm_slli_epi32(_mm_and_si128(b0, _mm_set1_epi32(0x0F)), 12),
                _mm_slli_epi32(c1, 6),
            ),
            c2,
        );
        let cp4 = _mm_or_si128(
            _mm_or_si128(
                _mm_slli_epi32(_mm_and_si128(b0, _mm_set1_epi32(0x07)), 18),
                _mm_slli_epi32(c1, 12),
            ),
            _mm_or_si128(_mm_slli_epi32(c2, 6), c3),
        );

        let multi = _mm_cmpgt_epi32(b0, _mm_set1_epi32(0x7F));
        let three = _mm_cmpgt_epi32(b0, _mm_set1_epi32(0xDF));
        let four = _mm_cmpgt_epi32(b0, _mm_set1_epi32(0xEF));

        let mut cp = _mm_blendv_epi8(b0, cp2, multi);
        cp = _mm_blendv_epi8(cp, cp3, three);
        cp = _mm_blendv_epi8(cp, cp4, four);

        let continuation = _mm_cmpeq_epi32(
            _mm_and_si128(b0, _mm_set1_epi32(0xC0)),
            _mm_set1_epi32(0x80),
        );

        Decoded {
            cp,
            four,
            leaders: !mask32(continuation) & 0xF,
        }
    }
}

/// Store the `present` lanes of `cp` contiguously at `dst`.
///
/// Writes four units, returns the number kept.
#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
unsafe fn store_utf32_x4(cp: __m128i, present: u32, dst: *mut u32) -> usize {
    unsafe {
        let packed = _mm_shuffle_epi8(cp, table(&tables::COMPRESS_32X4[present as usize]));
        _mm_storeu_si128(dst.cast(), packed);
    }
    present.count_ones() as usize
}

/// Store the `present` lanes of `cp` as UTF-16 at `dst`; lanes flagged in
/// `pairs` become surrogate pairs.
///
/// Writes eight units, returns the number kept.
#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
unsafe fn store_utf16_x4<const BE: bool>(
    cp: __m128i,
    pairs: __m128i,
    present: u32,
    dst: *mut u16,
) -> usize {
    unsafe {
        let high = _mm_add_epi32(
            _mm_set1_epi32(0xD7C0),
            _mm_and_si128(_mm_srli_epi32(cp, 10), _mm_set1_epi32(0x7FF)),
        );
        let low = _mm_or_si128(
            _mm_set1_epi32(0xDC00),
            _mm_and_si128(cp, _mm_set1_epi32(0x3FF)),
        );
        let pair = _mm_or_si128(high, _mm_slli_epi32(low, 16));
        let units = swap_if::<BE>(_mm_blendv_epi8(cp, pair, pairs));

        let slots = tables::utf16_slot_mask(present, mask32(pairs) & present);
        let packed = _mm_shuffle_epi8(units, table(&tables::COMPRESS_16X8[slots]));
        _mm_storeu_si128(dst.cast(), packed);
        slots.count_ones() as usize
    }
}

/// Encode four code points as UTF-8 at `dst`.
///
/// Writes 16 bytes, returns the number of encoded bytes.
#[target_feature(enable = "sse2,ssse3,sse4.1,sse4.2,popcnt")]
#[inline]
unsafe fn store_utf8_x4(cp: __m128i, dst: *mut u8) -> usize {
    unsafe {
        let low6 = _mm_set1_epi32(0x3F);
        let cont = _mm_set1_epi32(0x80);
        let c0 = _mm_or_si128(_mm_and_si128(cp, low6), cont);
        let c1 = _mm_or_si128(_mm_and_si128(_mm_srli_epi32(cp, 6), low6), cont);
        let c2 = _mm_or_si128(_mm_and_si128(_mm_srli_epi32(cp, 12), low6), cont);

        let two = _mm_or_si128(
            _mm_or_si128(_mm_srli_epi32(cp, 6), _mm_set1_epi32(0xC0)),
            _mm_slli_epi32(c0, 8),
        );
        let three = _mm_or_si128(
            _mm_or_si128(_mm_srli_epi32(cp, 12), _mm_set1_epi32(0xE0)),
            _mm_or_si128(_mm_slli_epi32(c1, 8), _mm_slli_epi32(c0, 16)),
        );
        let four = _mm_or_si128(
            _mm_or_si128(
                _mm_and_si128(_mm_srli_epi32(cp, 18), _mm_set1_epi32(0x07)),
                _mm_set1_epi32(0xF0),
            ),
            _mm_or_si128(
                _mm_slli_epi32(c2, 8),
                _mm_or_si128(_mm_slli_epi32(c1, 16), _mm_slli_epi32(c0, 24)),
            ),
        );

        let gt_7f = ge_u32(cp, 0x80);
        let gt_7ff = ge_u32(cp, 0x800);
        let gt_ffff = ge_u32(cp, 0x10000);

        let mut bytes = _mm_blendv_epi8(cp, two, gt_7f);
        bytes = _mm_blendv_epi8(bytes, three, gt_7ff);
        bytes = _mm_blendv_epi8(bytes, four, gt_ffff);

        let key = tables::utf8_pack_key(mask32(gt_7f), mask32(gt_7ff), mask32(gt_ffff));
        let packed = _mm_shuffle_epi8(bytes, table(&tables::PACK_UTF8[key]));
        _mm_storeu_si128(dst.cast(), packed);
        tables::PACK_UTF8_LEN[key] as usize
    }
}
