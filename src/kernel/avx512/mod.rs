//! AVX-512 kernel for x86_64 (Ice Lake and later).
//!
//! Requires VBMI for the cross-lane byte gathers and VBMI2 for compressing
//! stores, which replace the shuffle tables the narrower kernels need.

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
    "avx512_vbmi2",
    "Intel AVX-512 with VBMI2",
    IsaFeatures::AVX512F
        .union(IsaFeatures::AVX512BW)
        .union(IsaFeatures::AVX512VL)
        .union(IsaFeatures::AVX512VBMI)
        .union(IsaFeatures::AVX512VBMI2)
        .union(IsaFeatures::BMI2)
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
unsafe fn load(ptr: *const u8) -> __m512i {
    unsafe { _mm512_loadu_si512(ptr.cast()) }
}

/// A 16-byte table repeated in all four 128-bit lanes.
#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
unsafe fn table(t: &[u8; 16]) -> __m512i {
    unsafe { _mm512_broadcast_i32x4(_mm_loadu_si128(t.as_ptr().cast())) }
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
unsafe fn swap_if<const BE: bool>(v: __m512i) -> __m512i {
    if BE {
        unsafe { _mm512_shuffle_epi8(v, table(&tables::SWAP_BYTES_16)) }
    } else {
        v
    }
}

/// Bit per 16-bit lane holding any surrogate.
#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
fn surrogates(v: __m512i) -> __mmask32 {
    _mm512_cmpeq_epi16_mask(
        _mm512_and_si512(v, _mm512_set1_epi16(0xF800u16 as i16)),
        _mm512_set1_epi16(0xD800u16 as i16),
    )
}

struct Decoded {
    cp: __m512i,
    four: __mmask16,
    leaders: __mmask16,
}

/// Decode the sequences starting at each of the sixteen bytes at `src`.
///
/// Reads 32 bytes.
#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
unsafe fn decode_utf8_x16(src: *const u8) -> Decoded {
    unsafe {
        let raw = _mm512_zextsi256_si512(_mm256_loadu_si256(src.cast()));
        let windows = load(tables::UTF8_WINDOWS_X16.as_ptr());
        let bytes = _mm512_permutexvar_epi8(windows, raw);
        let low6 = _mm512_set1_epi32(0x3F);

        let b0 = _mm512_and_si512(bytes, _mm512_set1_epi32(0xFF));
        let c1 = _mm512_and_si512(_mm512_srli_epi32(bytes, 8), low6);
        let c2 = _mm512_and_si512(_mm512_srli_epi32(bytes, 16), low6);
        let c3 = _mm512_and_si512(_mm512_srli_epi32(bytes, 24), low6);

        let cp2 = _mm512_or_si512(
            _mm512_slli_epi32(_mm512_and_si512(b0, _mm512_set1_epi32(0x1F)), 6),
            c1,
        );
        let cp3 = _mm512_or_si512(
            _mm512_or_si512(
                _mm512_slli_epi32(_mm512_and_si512(b0, _mm512_set1_epi32(0x0F)), 12),
                _mm512_slli_epi32(c1, 6),
            ),
            c2,
        );
        let cp4 = _mm512_or_si512(
            _mm512_or_si512(
                _mm512_slli_epi32(_mm512_and_si512(b0, _mm512_set1_epi32(0x07)), 18),
                _mm512_slli_epi32(c1, 12),
            ),
            _mm512_or_si512(_mm512_slli_epi32(c2, 6), c3),
        );

        let multi = _mm512_cmpgt_epu32_mask(b0, _mm512_set1_epi32(0x7F));
        let three = _mm512_cmpgt_epu32_mask(b0, _mm512_set1_epi32(0xDF));
        let four = _mm512_cmpgt_epu32_mask(b0, _mm512_set1_epi32(0xEF));

        let mut cp = _mm512_mask_blend_epi32(multi, b0, cp2);
        cp = _mm512_mask_blend_epi32(three, cp, cp3);
        cp = _mm512_mask_blend_epi32(four, cp, cp4);

        let continuation = _mm512_cmpeq_epi32_mask(
            _mm512_and_si512(b0, _mm512_set1_epi32(0xC0)),
            _mm512_set1_epi32(0x80),
        );

        Decoded {
            cp,
            four,
            leaders: !continuation,
        }
    }
}

/// Store the `present` lanes of `cp` as UTF-16, lanes in `pairs` as
/// surrogate pairs. Writes exactly the returned number of units.
#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
unsafe fn store_utf16_x16<const BE: bool>(
    cp: __m512i,
    pairs: __mmask16,
    present: __mmask16,
    dst: *mut u16,
) -> usize {
    unsafe {
        let high = _mm512_add_epi32(
            _mm512_set1_epi32(0xD7C0),
            _mm512_and_si512(_mm512_srli_epi32(cp, 10), _mm512_set1_epi32(0x7FF)),
        );
        let low = _mm512_or_si512(
            _mm512_set1_epi32(0xDC00),
            _mm512_and_si512(cp, _mm512_set1_epi32(0x3FF)),
        );
        let pair = _mm512_or_si512(high, _mm512_slli_epi32(low, 16));
        let units = swap_if::<BE>(_mm512_mask_blend_epi32(pairs, cp, pair));

        let slots = _pdep_u32(present as u32, 0x5555_5555)
            | _pdep_u32((pairs & present) as u32, 0xAAAA_AAAA);
        _mm512_mask_compressstoreu_epi16(dst.cast(), slots, units);
        slots.count_ones() as usize
    }
}

/// Encode sixteen code points as UTF-8. Writes exactly the returned number
/// of bytes.
#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
unsafe fn store_utf8_x16(cp: __m512i, dst: *mut u8) -> usize {
    unsafe {
        let low6 = _mm512_set1_epi32(0x3F);
        let cont = _mm512_set1_epi32(0x80);
        let c0 = _mm512_or_si512(_mm512_and_si512(cp, low6), cont);
        let c1 = _mm512_or_si512(_mm512_and_si512(_mm512_srli_epi32(cp, 6), low6), cont);
        let c2 = _mm512_or_si512(_mm512_and_si512(_mm512_srli_epi32(cp, 12), low6), cont);

        let two = _mm512_or_si512(
            _mm512_or_si512(_mm512_srli_epi32(cp, 6), _mm512_set1_epi32(0xC0)),
            _mm512_slli_epi32(c0, 8),
        );
        let three = _mm512_or_si512(
            _mm512_or_si512(_mm512_srli_epi32(cp, 12), _mm512_set1_epi32(0xE0)),
            _mm512_or_si512(_mm512_slli_epi32(c1, 8), _mm512_slli_epi32(c0, 16)),
        );
        let four = _mm512_or_si512(
            _mm512_or_si512(
                _mm512_and_si512(_mm512_srli_epi32(cp, 18), _mm512_set1_epi32(0x07)),
                _mm512_set1_epi32(0xF0),
            ),
            _mm512_or_si512(
                _mm512_slli_epi32(c2, 8),
                _mm512_or_si512(_mm512_slli_epi32(c1, 16), _mm512_slli_epi32(c0, 24)),
            ),
        );

        let gt_7f = _mm512_cmpge_epu32_mask(cp, _mm512_set1_epi32(0x80));
        let gt_7ff = _mm512_cmpge_epu32_mask(cp, _mm512_set1_epi32(0x800));
        let gt_ffff = _mm512_cmpge_epu32_mask(cp, _mm512_set1_epi32(0x10000));

        let mut bytes = _mm512_mask_blend_epi32(gt_7f, cp, two);
        bytes = _mm512_mask_blend_epi32(gt_7ff, bytes, three);
        bytes = _mm512_mask_blend_epi32(gt_ffff, bytes, four);

        // High bit set in every byte of a lane that belongs to its encoding
        let mut keep = _mm512_set1_epi32(0x80);
        keep = _mm512_mask_or_epi32(keep, gt_7f, keep, _mm512_set1_epi32(0x8000));
        keep = _mm512_mask_or_epi32(keep, gt_7ff, keep, _mm512_set1_epi32(0x80_0000));
        keep = _mm512_mask_or_epi32(
            keep,
            gt_ffff,
            keep,
            _mm512_set1_epi32(0x8000_0000u32 as i32),
        );
        let mask = _mm512_movepi8_mask(keep);

        _mm512_mask_compressstoreu_epi8(dst.cast(), mask, bytes);
        mask.count_ones() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::scalar;

    #[test]
    fn requires_vbmi2() {
        let required = KERNEL.required_features();
        assert!(required.contains(IsaFeatures::AVX512VBMI2));
        assert_eq!(KERNEL.name(), "avx512_vbmi2");
    }

    #[test]
    fn transcodes_like_scalar() {
        let (Some(simd), Some(reference)) = (KERNEL.ops(), scalar::KERNEL.ops()) else {
            return;
        };
        let text = "Mixed: ąčęėįšųū — 한국어 — 🦀🦀 — plain ascii text. ".repeat(10);
        let bytes = text.as_bytes();

        let mut a = vec![0u32; text.chars().count()];
        let mut b = vec![0u32; a.len()];
        assert_eq!(simd.convert_utf8_to_utf32(bytes, &mut a), a.len());
        reference.convert_utf8_to_utf32(bytes, &mut b);
        assert_eq!(a, b);

        let mut utf8 = vec![0u8; bytes.len()];
        assert_eq!(simd.convert_utf32_to_utf8(&a, &mut utf8), bytes.len());
        assert_eq!(utf8, bytes);
    }
}
