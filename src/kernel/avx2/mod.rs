//! AVX2 kernel for x86_64.
//!
//! Same structure as the SSE4.2 kernel with 32-byte vectors. Shuffles
//! that cross the 128-bit lanes are done per half with the 128-bit tables.

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
    "avx2",
    "Intel/AMD AVX2",
    IsaFeatures::AVX
        .union(IsaFeatures::AVX2)
        .union(IsaFeatures::BMI1)
        .union(IsaFeatures::BMI2)
        .union(IsaFeatures::POPCNT)
        .union(IsaFeatures::LZCNT),
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
unsafe fn load(ptr: *const u8) -> __m256i {
    unsafe { _mm256_loadu_si256(ptr.cast()) }
}

/// A 16-byte table repeated in both 128-bit lanes.
#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
unsafe fn table(t: &[u8; 16]) -> __m256i {
    unsafe { _mm256_broadcastsi128_si256(_mm_loadu_si128(t.as_ptr().cast())) }
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
fn mask32(v: __m256i) -> u32 {
    _mm256_movemask_ps(_mm256_castsi256_ps(v)) as u32
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
fn ge_u32(v: __m256i, t: u32) -> __m256i {
    _mm256_cmpeq_epi32(_mm256_max_epu32(v, _mm256_set1_epi32(t as i32)), v)
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
unsafe fn swap_if<const BE: bool>(v: __m256i) -> __m256i {
    if BE {
        unsafe { _mm256_shuffle_epi8(v, table(&tables::SWAP_BYTES_16)) }
    } else {
        v
    }
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
fn has_surrogate(v: __m256i) -> bool {
    let surrogates = _mm256_cmpeq_epi16(
        _mm256_and_si256(v, _mm256_set1_epi16(0xF800u16 as i16)),
        _mm256_set1_epi16(0xD800u16 as i16),
    );
    _mm256_movemask_epi8(surrogates) != 0
}

struct Decoded {
    cp: __m256i,
    four: __m256i,
    leaders: u32,
}

/// Decode the sequences starting at each of the eight bytes at `src`.
///
/// Reads 20 bytes.
#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
unsafe fn decode_utf8_x8(src: *const u8) -> Decoded {
    unsafe {
        let raw = _mm256_loadu2_m128i(src.add(4).cast(), src.cast());
        let bytes = _mm256_shuffle_epi8(raw, table(&tables::UTF8_WINDOWS));
        let low6 = _mm256_set1_epi32(0x3F);

        let b0 = _mm256_and_si256(bytes, _mm256_set1_epi32(0xFF));
        let c1 = _mm256_and_si256(_mm256_srli_epi32(bytes, 8), low6);
        let c2 = _mm256_and_si256(_mm256_srli_epi32(bytes, 16), low6);
        let c3 = _mm256_and_si256(_mm256_srli_epi32(bytes, 24), low6);

        let cp2 = _mm256_or_si256(
            _mm256_slli_epi32(_mm256_and_si256(b0, _mm256_set1_epi32(0x1F)), 6),
            c1,
        );
        let cp3 = _mm256_or_si256(
            _mm256_or_si256(
                _mm256_slli_epi32(_mm256_and_si256(b0, _mm256_set1_epi32(0x0F)), 12),
                _mm256_slli_epi32(c1, 6),
            ),
            c2,
        );
        let cp4 = _mm256_or_si256(
            _mm256_or_si256(
                _mm256_slli_epi32(_mm256_and_si256(b0, _mm256_set1_epi32(0x07)), 18),
                _mm256_slli_epi32(c1, 12),
            ),
            _mm256_or_si256(_mm256_slli_epi32(c2, 6), c3),
        );

        let multi = _mm256_cmpgt_epi32(b0, _mm256_set1_epi32(0x7F));
        let three = _mm256_cmpgt_epi32(b0, _mm256_set1_epi32(0xDF));
        let four = _mm256_cmpgt_epi32(b0, _mm256_set1_epi32(0xEF));

        let mut cp = _mm256_blendv_epi8(b0, cp2, multi);
        cp = _mm256_blendv_epi8(cp, cp3, three);
        cp = _mm256_blendv_epi8(cp, cp4, four);

        let continuation = _mm256_cmpeq_epi32(
            _mm256_and_si256(b0, _mm256_set1_epi32(0xC0)),
            _mm256_set1_epi32(0x80),
        );

        Decoded {
            cp,
            four,
            leaders: !mask32(continuation) & 0xFF,
        }
    }
}

/// Store the `present` lanes of `cp` contiguously. Writes eight units.
#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
unsafe fn store_utf32_x8(cp: __m256i, present: u32, dst: *mut u32) -> usize {
    unsafe {
        let perm = _mm256_loadu_si256(tables::COMPRESS_32X8[present as usize].as_ptr().cast());
        _mm256_storeu_si256(dst.cast(), _mm256_permutevar8x32_epi32(cp, perm));
    }
    present.count_ones() as usize
}

/// Store the `present` lanes of `cp` as UTF-16, lanes in `pairs` as
/// surrogate pairs. Writes up to sixteen units.
#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
unsafe fn store_utf16_x8<const BE: bool>(
    cp: __m256i,
    pairs: __m256i,
    present: u32,
    dst: *mut u16,
) -> usize {
    unsafe {
        let high = _mm256_add_epi32(
            _mm256_set1_epi32(0xD7C0),
            _mm256_and_si256(_mm256_srli_epi32(cp, 10), _mm256_set1_epi32(0x7FF)),
        );
        let low = _mm256_or_si256(
            _mm256_set1_epi32(0xDC00),
            _mm256_and_si256(cp, _mm256_set1_epi32(0x3FF)),
        );
        let pair = _mm256_or_si256(high, _mm256_slli_epi32(low, 16));
        let units = swap_if::<BE>(_mm256_blendv_epi8(cp, pair, pairs));
        let pair_mask = mask32(pairs) & present;

        let lo_slots = tables::utf16_slot_mask(present & 0xF, pair_mask & 0xF);
        let hi_slots = tables::utf16_slot_mask(present >> 4, pair_mask >> 4);
        let lo = _mm_shuffle_epi8(
            _mm256_castsi256_si128(units),
            _mm_loadu_si128(tables::COMPRESS_16X8[lo_slots].as_ptr().cast()),
        );
        let hi = _mm_shuffle_epi8(
            _mm256_extracti128_si256(units, 1),
            _mm_loadu_si128(tables::COMPRESS_16X8[hi_slots].as_ptr().cast()),
        );
        let n_lo = lo_slots.count_ones() as usize;
        _mm_storeu_si128(dst.cast(), lo);
        _mm_storeu_si128(dst.add(n_lo).cast(), hi);
        n_lo + hi_slots.count_ones() as usize
    }
}

/// Encode eight code points as UTF-8. Writes up to 32 bytes.
#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
unsafe fn store_utf8_x8(cp: __m256i, dst: *mut u8) -> usize {
    unsafe {
        let low6 = _mm256_set1_epi32(0x3F);
        let cont = _mm256_set1_epi32(0x80);
        let c0 = _mm256_or_si256(_mm256_and_si256(cp, low6), cont);
        let c1 = _mm256_or_si256(_mm256_and_si256(_mm256_srli_epi32(cp, 6), low6), cont);
        let c2 = _mm256_or_si256(_mm256_and_si256(_mm256_srli_epi32(cp, 12), low6), cont);

        let two = _mm256_or_si256(
            _mm256_or_si256(_mm256_srli_epi32(cp, 6), _mm256_set1_epi32(0xC0)),
            _mm256_slli_epi32(c0, 8),
        );
        let three = _mm256_or_si256(
            _mm256_or_si256(_mm256_srli_epi32(cp, 12), _mm256_set1_epi32(0xE0)),
            _mm256_or_si256(_mm256_slli_epi32(c1, 8), _mm256_slli_epi32(c0, 16)),
        );
        let four = _mm256_or_si256(
            _mm256_or_si256(
                _mm256_and_si256(_mm256_srli_epi32(cp, 18), _mm256_set1_epi32(0x07)),
                _mm256_set1_epi32(0xF0),
            ),
            _mm256_or_si256(
                _mm256_slli_epi32(c2, 8),
                _mm256_or_si256(_mm256_slli_epi32(c1, 16), _mm256_slli_epi32(c0, 24)),
            ),
        );

        let gt_7f = ge_u32(cp, 0x80);
        let gt_7ff = ge_u32(cp, 0x800);
        let gt_ffff = ge_u32(cp, 0x10000);

        let mut bytes = _mm256_blendv_epi8(cp, two, gt_7f);
        bytes = _mm256_blendv_epi8(bytes, three, gt_7ff);
        bytes = _mm256_blendv_epi8(bytes, four, gt_ffff);

        let (m1, m2, m3) = (mask32(gt_7f), mask32(gt_7ff), mask32(gt_ffff));
        let lo_key = tables::utf8_pack_key(m1, m2, m3);
        let hi_key = tables::utf8_pack_key(m1 >> 4, m2 >> 4, m3 >> 4);
        let lo = _mm_shuffle_epi8(
            _mm256_castsi256_si128(bytes),
            _mm_loadu_si128(tables::PACK_UTF8[lo_key].as_ptr().cast()),
        );
        let hi = _mm_shuffle_epi8(
            _mm256_extracti128_si256(bytes, 1),
            _mm_loadu_si128(tables::PACK_UTF8[hi_key].as_ptr().cast()),
        );
        let n_lo = tables::PACK_UTF8_LEN[lo_key] as usize;
        _mm_storeu_si128(dst.cast(), lo);
        _mm_storeu_si128(dst.add(n_lo).cast(), hi);
        n_lo + tables::PACK_UTF8_LEN[hi_key] as usize
    }
}
