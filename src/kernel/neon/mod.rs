//! NEON kernel for aarch64.
//!
//! Mirrors the SSE4.2 kernel: 16-byte vectors, `tbl` lookups in place of
//! `pshufb` (out-of-range indices read as zero), and horizontal reductions
//! in place of `movemask`.

#[cfg(target_arch = "aarch64")]
use core::arch::aarch64::*;

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
    "neon",
    "ARM NEON",
    IsaFeatures::NEON,
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

#[target_feature(enable = "neon")]
#[inline]
unsafe fn table(t: &[u8; 16]) -> uint8x16_t {
    unsafe { vld1q_u8(t.as_ptr()) }
}

/// Lane mask of 32-bit lanes as four bits.
#[target_feature(enable = "neon")]
#[inline]
unsafe fn mask32(v: uint32x4_t) -> u32 {
    const WEIGHTS: [u32; 4] = [1, 2, 4, 8];
    unsafe { vaddvq_u32(vandq_u32(v, vld1q_u32(WEIGHTS.as_ptr()))) }
}

#[target_feature(enable = "neon")]
#[inline]
unsafe fn swap_if<const BE: bool>(v: uint16x8_t) -> uint16x8_t {
    if BE {
        unsafe { vreinterpretq_u16_u8(vrev16q_u8(vreinterpretq_u8_u16(v))) }
    } else {
        v
    }
}

#[target_feature(enable = "neon")]
#[inline]
unsafe fn has_surrogate(v: uint16x8_t) -> bool {
    unsafe { vmaxvq_u16(surrogates(v)) != 0 }
}

/// All ones in lanes holding either half of a surrogate pair.
#[target_feature(enable = "neon")]
#[inline]
unsafe fn surrogates(v: uint16x8_t) -> uint16x8_t {
    unsafe { vceqq_u16(vandq_u16(v, vdupq_n_u16(0xF800)), vdupq_n_u16(0xD800)) }
}

/// Number of all-ones lanes in a 16-bit comparison result.
#[target_feature(enable = "neon")]
#[inline]
unsafe fn count16(mask: uint16x8_t) -> usize {
    unsafe { vaddvq_u16(vshrq_n_u16::<15>(mask)) as usize }
}

/// Number of all-ones lanes in a 32-bit comparison result.
#[target_feature(enable = "neon")]
#[inline]
unsafe fn count32(mask: uint32x4_t) -> usize {
    unsafe { vaddvq_u32(vshrq_n_u32::<31>(mask)) as usize }
}

struct Decoded {
    cp: uint32x4_t,
    four: uint32x4_t,
    leaders: u32,
}

/// Decode the sequences starting at each of the four bytes at `src`.
///
/// Reads 16 bytes.
#[target_feature(enable = "neon")]
#[inline]
unsafe fn decode_utf8_x4(src: *const u8) -> Decoded {
    unsafe {
        let bytes = vreinterpretq_u32_u8(vqtbl1q_u8(vld1q_u8(src), table(&tables::UTF8_WINDOWS)));
        let low6 = vdupq_n_u32(0x3F);

        let b0 = vandq_u32(bytes, vdupq_n_u32(0xFF));
        let c1 = vandq_u32(vshrq_n_u32::<8>(bytes), low6);
        let c2 = vandq_u32(vshrq_n_u32::<16>(bytes), low6);
        let c3 = vshrq_n_u32::<24>(bytes);
        let c3 = vandq_u32(c3, low6);

        let cp2 = vorrq_u32(vshlq_n_u32::<6>(vandq_u32(b0, vdupq_n_u32(0x1F))), c1);
        let cp3 = vorrq_u32(
            vorrq_u32(
                vshlq_n_u32::<12>(vandq_u32(b0, vdupq_n_u32(0x0F))),
                vshlq_n_u32::<6>(c1),
            ),
            c2,
        );
        let cp4 = vorrq_u32(
            vorrq_u32(
                vshlq_n_u32::<18>(vandq_u32(b0, vdupq_n_u32(0x07))),
                vshlq_n_u32::<12>(c1),
            ),
            vorrq_u32(vshlq_n_u32::<6>(c2), c3),
        );

        let multi = vcgtq_u32(b0, vdupq_n_u32(0x7F));
        let three = vcgtq_u32(b0, vdupq_n_u32(0xDF));
        let four = vcgtq_u32(b0, vdupq_n_u32(0xEF));

        let mut cp = vbslq_u32(multi, cp2, b0);
        cp = vbslq_u32(three, cp3, cp);
        cp = vbslq_u32(four, cp4, cp);

        let continuation = vceqq_u32(vandq_u32(b0, vdupq_n_u32(0xC0)), vdupq_n_u32(0x80));

        Decoded {
            cp,
            four,
            leaders: !mask32(continuation) & 0xF,
        }
    }
}

#[target_feature(enable = "neon")]
#[inline]
unsafe fn store_utf32_x4(cp: uint32x4_t, present: u32, dst: *mut u32) -> usize {
    unsafe {
        let packed = vqtbl1q_u8(
            vreinterpretq_u8_u32(cp),
            table(&tables::COMPRESS_32X4[present as usize]),
        );
        vst1q_u32(dst, vreinterpretq_u32_u8(packed));
    }
    present.count_ones() as usize
}

#[target_feature(enable = "neon")]
#[inline]
unsafe fn store_utf16_x4<const BE: bool>(
    cp: uint32x4_t,
    pairs: uint32x4_t,
    present: u32,
    dst: *mut u16,
) -> usize {
    unsafe {
        let high = vaddq_u32(
            vdupq_n_u32(0xD7C0),
            vandq_u32(vshrq_n_u32::<10>(cp), vdupq_n_u32(0x7FF)),
        );
        let low = vorrq_u32(vdupq_n_u32(0xDC00), vandq_u32(cp, vdupq_n_u32(0x3FF)));
        let pair = vorrq_u32(high, vshlq_n_u32::<16>(low));
        let units = swap_if::<BE>(vreinterpretq_u16_u32(vbslq_u32(pairs, pair, cp)));

        let slots = tables::utf16_slot_mask(present, mask32(pairs) & present);
        let packed = vqtbl1q_u8(
            vreinterpretq_u8_u16(units),
            table(&tables::COMPRESS_16X8[slots]),
        );
        vst1q_u16(dst, vreinterpretq_u16_u8(packed));
        slots.count_ones() as usize
    }
}

#[target_feature(enable = "neon")]
#[inline]
unsafe fn store_utf8_x4(cp: uint32x4_t, dst: *mut u8) -> usize {
    unsafe {
        let low6 = vdupq_n_u32(0x3F);
        let cont = vdupq_n_u32(0x80);
        let c0 = vorrq_u32(vandq_u32(cp, low6), cont);
        let c1 = vorrq_u32(vandq_u32(vshrq_n_u32::<6>(cp), low6), cont);
        let c2 = vorrq_u32(vandq_u32(vshrq_n_u32::<12>(cp), low6), cont);

        let two = vorrq_u32(
            vorrq_u32(vshrq_n_u32::<6>(cp), vdupq_n_u32(0xC0)),
            vshlq_n_u32::<8>(c0),
        );
        let three = vorrq_u32(
            vorrq_u32(vshrq_n_u32::<12>(cp), vdupq_n_u32(0xE0)),
            vorrq_u32(vshlq_n_u32::<8>(c1), vshlq_n_u32::<16>(c0)),
        );
        let four = vorrq_u32(
            vorrq_u32(
                vandq_u32(vshrq_n_u32::<18>(cp), vdupq_n_u32(0x07)),
                vdupq_n_u32(0xF0),
            ),
            vorrq_u32(
                vshlq_n_u32::<8>(c2),
                vorrq_u32(vshlq_n_u32::<16>(c1), vshlq_n_u32::<24>(c0)),
            ),
        );

        let gt_7f = vcgeq_u32(cp, vdupq_n_u32(0x80));
        let gt_7ff = vcgeq_u32(cp, vdupq_n_u32(0x800));
        let gt_ffff = vcgeq_u32(cp, vdupq_n_u32(0x10000));

        let mut bytes = vbslq_u32(gt_7f, two, cp);
        bytes = vbslq_u32(gt_7ff, three, bytes);
        bytes = vbslq_u32(gt_ffff, four, bytes);

        let key = tables::utf8_pack_key(mask32(gt_7f), mask32(gt_7ff), mask32(gt_ffff));
        let packed = vqtbl1q_u8(vreinterpretq_u8_u32(bytes), table(&tables::PACK_UTF8[key]));
        vst1q_u8(dst, packed);
        tables::PACK_UTF8_LEN[key] as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::scalar;

    #[test]
    fn neon_is_always_available() {
        assert!(KERNEL.is_supported());
    }

    #[test]
    fn transcodes_like_scalar() {
        let (Some(simd), Some(reference)) = (KERNEL.ops(), scalar::KERNEL.ops()) else {
            return;
        };
        let text = "Hello, мир! こんにちは 👋🏽 ".repeat(10);
        let bytes = text.as_bytes();
        let n = simd.utf16_length_from_utf8(bytes);
        let mut a = vec![0u16; n];
        let mut b = vec![0u16; n];
        assert_eq!(simd.convert_utf8_to_utf16le(bytes, &mut a), n);
        reference.convert_utf8_to_utf16le(bytes, &mut b);
        assert_eq!(a, b);
    }
}
