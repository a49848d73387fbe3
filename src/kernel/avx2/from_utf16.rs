//! AVX2 UTF-16 to UTF-8 and UTF-32 transcoding, and byte swapping.

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::{has_surrogate, load, store_utf8_x8, swap_if, table};
use crate::error::TranscodeResult;
use crate::kernel::tables;
use crate::scalar::{utf16, utf8};

#[inline(always)]
fn step<const BE: bool, const CHECKED: bool>(
    input: &[u16],
    pos: usize,
) -> Result<(u32, usize), TranscodeResult> {
    if CHECKED {
        utf16::decode_at::<BE>(input, pos).map_err(|kind| TranscodeResult::err(kind, pos))
    } else {
        Ok(utf16::decode_unchecked::<BE>(input, pos))
    }
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
unsafe fn to_utf8<const BE: bool, const CHECKED: bool>(
    input: &[u16],
    output: &mut [u8],
) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 16 <= input.len() && out + 64 <= output.len() {
            let v = swap_if::<BE>(load(input.as_ptr().add(pos).cast()));
            if has_surrogate(v) {
                let end = pos + 16;
                while pos < end {
                    let (cp, n) = match step::<BE, CHECKED>(input, pos) {
                        Ok(decoded) => decoded,
                        Err(failed) => return failed,
                    };
                    out += utf8::encode_unchecked(cp, output, out);
                    pos += n;
                }
                continue;
            }
            let lo = _mm256_castsi256_si128(v);
            let hi = _mm256_extracti128_si256(v, 1);
            if _mm256_testz_si256(v, _mm256_set1_epi16(0xFF80u16 as i16)) == 1 {
                let packed = _mm_packus_epi16(lo, hi);
                _mm_storeu_si128(output.as_mut_ptr().add(out).cast(), packed);
                pos += 16;
                out += 16;
                continue;
            }
            out += store_utf8_x8(_mm256_cvtepu16_epi32(lo), output.as_mut_ptr().add(out));
            out += store_utf8_x8(_mm256_cvtepu16_epi32(hi), output.as_mut_ptr().add(out));
            pos += 16;
        }
    }
    let tail = if CHECKED {
        utf16::convert_to_utf8_with_errors::<BE>(&input[pos..], &mut output[out..])
    } else {
        TranscodeResult::ok(utf16::convert_valid_to_utf8::<BE>(
            &input[pos..],
            &mut output[out..],
        ))
    };
    tail.rebase(pos, out)
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn convert_utf16_to_utf8_with_errors<const BE: bool>(
    input: &[u16],
    output: &mut [u8],
) -> TranscodeResult {
    unsafe { to_utf8::<BE, true>(input, output) }
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn convert_utf16_to_utf8<const BE: bool>(
    input: &[u16],
    output: &mut [u8],
) -> usize {
    let result = unsafe { to_utf8::<BE, true>(input, output) };
    if result.is_ok() {
        result.count
    } else {
        0
    }
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn convert_valid_utf16_to_utf8<const BE: bool>(
    input: &[u16],
    output: &mut [u8],
) -> usize {
    unsafe { to_utf8::<BE, false>(input, output).count }
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
unsafe fn to_utf32<const BE: bool, const CHECKED: bool>(
    input: &[u16],
    output: &mut [u32],
) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 16 <= input.len() && out + 16 <= output.len() {
            let v = swap_if::<BE>(load(input.as_ptr().add(pos).cast()));
            if has_surrogate(v) {
                let end = pos + 16;
                while pos < end {
                    let (cp, n) = match step::<BE, CHECKED>(input, pos) {
                        Ok(decoded) => decoded,
                        Err(failed) => return failed,
                    };
                    output[out] = cp;
                    out += 1;
                    pos += n;
                }
                continue;
            }
            let dst = output.as_mut_ptr().add(out);
            _mm256_storeu_si256(dst.cast(), _mm256_cvtepu16_epi32(_mm256_castsi256_si128(v)));
            _mm256_storeu_si256(
                dst.add(8).cast(),
                _mm256_cvtepu16_epi32(_mm256_extracti128_si256(v, 1)),
            );
            pos += 16;
            out += 16;
        }
    }
    let tail = if CHECKED {
        utf16::convert_to_utf32_with_errors::<BE>(&input[pos..], &mut output[out..])
    } else {
        TranscodeResult::ok(utf16::convert_valid_to_utf32::<BE>(
            &input[pos..],
            &mut output[out..],
        ))
    };
    tail.rebase(pos, out)
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn convert_utf16_to_utf32_with_errors<const BE: bool>(
    input: &[u16],
    output: &mut [u32],
) -> TranscodeResult {
    unsafe { to_utf32::<BE, true>(input, output) }
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn convert_utf16_to_utf32<const BE: bool>(
    input: &[u16],
    output: &mut [u32],
) -> usize {
    let result = unsafe { to_utf32::<BE, true>(input, output) };
    if result.is_ok() {
        result.count
    } else {
        0
    }
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn convert_valid_utf16_to_utf32<const BE: bool>(
    input: &[u16],
    output: &mut [u32],
) -> usize {
    unsafe { to_utf32::<BE, false>(input, output).count }
}

#[target_feature(enable = "avx,avx2,bmi1,bmi2,popcnt,lzcnt")]
#[inline]
pub(super) unsafe fn change_endianness_utf16(input: &[u16], output: &mut [u16]) {
    let output = &mut output[..input.len()];
    let mut pos = 0;
    unsafe {
        let swap = table(&tables::SWAP_BYTES_16);
        while pos + 16 <= input.len() {
            let v = load(input.as_ptr().add(pos).cast());
            _mm256_storeu_si256(
                output.as_mut_ptr().add(pos).cast(),
                _mm256_shuffle_epi8(v, swap),
            );
            pos += 16;
        }
    }
    utf16::change_endianness(&input[pos..], &mut output[pos..]);
}

#[cfg(test)]
mod tests {
    use super::super::KERNEL;
    use crate::error::{ErrorKind, TranscodeResult};

    #[test]
    fn round_trips_through_utf8() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let text = "Ωmega ≈ 𝛀, ascii ascii ascii. ".repeat(9);
        let be: Vec<u16> = text.encode_utf16().map(u16::to_be).collect();
        let mut out = vec![0u8; text.len()];
        assert_eq!(ops.convert_utf16be_to_utf8(&be, &mut out), text.len());
        assert_eq!(out, text.as_bytes());

        let mut utf32 = vec![0u32; text.chars().count()];
        assert_eq!(
            ops.convert_valid_utf16be_to_utf32(&be, &mut utf32),
            utf32.len()
        );
        assert!(utf32.iter().copied().eq(text.chars().map(|c| c as u32)));
    }

    #[test]
    fn high_surrogate_at_end() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let mut units = vec![0x20u16; 33];
        units[32] = 0xD83D;
        let mut out = vec![0u32; 40];
        assert_eq!(
            ops.convert_utf16le_to_utf32_with_errors(&units, &mut out),
            TranscodeResult::err(ErrorKind::Surrogate, 32)
        );
    }

    #[test]
    fn swap_matches_scalar() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let input: Vec<u16> = (0..45u16).map(|i| i.wrapping_mul(0x1234)).collect();
        let mut out = vec![0u16; 45];
        ops.change_endianness_utf16(&input, &mut out);
        assert!(input.iter().zip(&out).all(|(a, b)| a.swap_bytes() == *b));
    }
}
