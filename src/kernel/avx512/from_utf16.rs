//! AVX-512 UTF-16 to UTF-8 and UTF-32 transcoding, and byte swapping.

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::{load, store_utf8_x16, surrogates, swap_if, table};
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

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
unsafe fn to_utf8<const BE: bool, const CHECKED: bool>(
    input: &[u16],
    output: &mut [u8],
) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        // A block's last unit may pair with the next one: 31 * 3 + 4 bytes
        while pos + 32 <= input.len() && out + 128 <= output.len() {
            let v = swap_if::<BE>(load(input.as_ptr().add(pos).cast()));
            if surrogates(v) != 0 {
                let end = pos + 32;
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
            if _mm512_test_epi16_mask(v, _mm512_set1_epi16(0xFF80u16 as i16)) == 0 {
                let narrow = _mm512_cvtepi16_epi8(v);
                _mm256_storeu_si256(output.as_mut_ptr().add(out).cast(), narrow);
                pos += 32;
                out += 32;
                continue;
            }
            let lo = _mm512_cvtepu16_epi32(_mm512_castsi512_si256(v));
            let hi = _mm512_cvtepu16_epi32(_mm512_extracti64x4_epi64(v, 1));
            out += store_utf8_x16(lo, output.as_mut_ptr().add(out));
            out += store_utf8_x16(hi, output.as_mut_ptr().add(out));
            pos += 32;
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

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn convert_utf16_to_utf8_with_errors<const BE: bool>(
    input: &[u16],
    output: &mut [u8],
) -> TranscodeResult {
    unsafe { to_utf8::<BE, true>(input, output) }
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
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

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn convert_valid_utf16_to_utf8<const BE: bool>(
    input: &[u16],
    output: &mut [u8],
) -> usize {
    unsafe { to_utf8::<BE, false>(input, output).count }
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
unsafe fn to_utf32<const BE: bool, const CHECKED: bool>(
    input: &[u16],
    output: &mut [u32],
) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    unsafe {
        while pos + 32 <= input.len() && out + 32 <= output.len() {
            let v = swap_if::<BE>(load(input.as_ptr().add(pos).cast()));
            if surrogates(v) != 0 {
                let end = pos + 32;
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
            _mm512_storeu_si512(dst.cast(), _mm512_cvtepu16_epi32(_mm512_castsi512_si256(v)));
            _mm512_storeu_si512(
                dst.add(16).cast(),
                _mm512_cvtepu16_epi32(_mm512_extracti64x4_epi64(v, 1)),
            );
            pos += 32;
            out += 32;
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

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn convert_utf16_to_utf32_with_errors<const BE: bool>(
    input: &[u16],
    output: &mut [u32],
) -> TranscodeResult {
    unsafe { to_utf32::<BE, true>(input, output) }
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
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

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn convert_valid_utf16_to_utf32<const BE: bool>(
    input: &[u16],
    output: &mut [u32],
) -> usize {
    unsafe { to_utf32::<BE, false>(input, output).count }
}

#[target_feature(enable = "avx512f,avx512bw,avx512vl,avx512vbmi,avx512vbmi2,bmi2,popcnt")]
#[inline]
pub(super) unsafe fn change_endianness_utf16(input: &[u16], output: &mut [u16]) {
    let output = &mut output[..input.len()];
    let mut pos = 0;
    unsafe {
        let swap = table(&tables::SWAP_BYTES_16);
        while pos + 32 <= input.len() {
            let v = load(input.as_ptr().add(pos).cast());
            _mm512_storeu_si512(
                output.as_mut_ptr().add(pos).cast(),
                _mm512_shuffle_epi8(v, swap),
            );
            pos += 32;
        }
    }
    utf16::change_endianness(&input[pos..], &mut output[pos..]);
}

#[cfg(test)]
mod tests {
    use super::super::KERNEL;
    use crate::error::{ErrorKind, TranscodeResult};

    #[test]
    fn ascii_and_wide_chunks() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let text = format!("{}{}", "0123456789".repeat(7), "ÆØÅ ฿ ".repeat(12));
        let le: Vec<u16> = text.encode_utf16().map(u16::to_le).collect();
        let mut out = vec![0u8; text.len()];
        assert_eq!(ops.convert_utf16le_to_utf8(&le, &mut out), text.len());
        assert_eq!(out, text.as_bytes());
    }

    #[test]
    fn unpaired_low_surrogate() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let mut units = vec![0x0391u16.to_be(); 70];
        units[40] = 0xDC00u16.to_be();
        let mut out = vec![0u32; 70];
        assert_eq!(
            ops.convert_utf16be_to_utf32_with_errors(&units, &mut out),
            TranscodeResult::err(ErrorKind::Surrogate, 40)
        );
        assert!(out[..40].iter().all(|&cp| cp == 0x0391));
    }

    #[test]
    fn swap_long_buffer() {
        let Some(ops) = KERNEL.ops() else {
            return;
        };
        let input: Vec<u16> = (0..100u16).collect();
        let mut out = vec![0u16; 100];
        ops.change_endianness_utf16(&input, &mut out);
        assert!(input.iter().zip(&out).all(|(a, b)| a.swap_bytes() == *b));
    }
}
