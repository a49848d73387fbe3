//! Scalar UTF-16 validation, counting and transcoding.
//!
//! Units are passed around in their in-memory representation. The const
//! parameter `BE` selects how that representation is read: big-endian when
//! `true`, little-endian otherwise. [`load`] and [`store`] do the conversion
//! and compile to nothing when the requested order matches the host.

use crate::error::{ErrorKind, TranscodeResult};

use super::utf8;

/// Read a code unit stored with the requested byte order.
#[inline(always)]
pub const fn load<const BE: bool>(unit: u16) -> u16 {
    if BE {
        u16::from_be(unit)
    } else {
        u16::from_le(unit)
    }
}

/// Produce the in-memory form of `value` for the requested byte order.
#[inline(always)]
pub const fn store<const BE: bool>(value: u16) -> u16 {
    if BE {
        value.to_be()
    } else {
        value.to_le()
    }
}

#[inline(always)]
pub const fn is_surrogate(unit: u16) -> bool {
    (unit & 0xF800) == 0xD800
}

#[inline(always)]
pub const fn is_high_surrogate(unit: u16) -> bool {
    (unit & 0xFC00) == 0xD800
}

#[inline(always)]
pub const fn is_low_surrogate(unit: u16) -> bool {
    (unit & 0xFC00) == 0xDC00
}

/// Split a supplementary code point into its surrogate pair.
///
/// Only the low 21 bits are used, so out-of-range values produce garbage
/// units rather than overflowing.
#[inline(always)]
pub const fn split_surrogates(cp: u32) -> (u16, u16) {
    let high = 0xD7C0u32.wrapping_add((cp >> 10) & 0x7FF) as u16;
    let low = 0xDC00 | (cp & 0x3FF) as u16;
    (high, low)
}

/// Combine a surrogate pair into its code point.
#[inline(always)]
pub const fn combine_surrogates(high: u16, low: u16) -> u32 {
    (((high as u32) & 0x3FF) << 10) + ((low as u32) & 0x3FF) + 0x10000
}

/// Decode the code point at `pos`, returning it and the units consumed.
#[inline]
pub(crate) fn decode_at<const BE: bool>(
    input: &[u16],
    pos: usize,
) -> Result<(u32, usize), ErrorKind> {
    let unit = load::<BE>(input[pos]);
    if !is_surrogate(unit) {
        return Ok((unit as u32, 1));
    }
    if !is_high_surrogate(unit) || pos + 1 >= input.len() {
        return Err(ErrorKind::Surrogate);
    }
    let next = load::<BE>(input[pos + 1]);
    if !is_low_surrogate(next) {
        return Err(ErrorKind::Surrogate);
    }
    Ok((combine_surrogates(unit, next), 2))
}

pub fn validate<const BE: bool>(input: &[u16]) -> bool {
    validate_with_errors::<BE>(input).is_ok()
}

/// Validate UTF-16. Unpaired surrogates are reported at their own index.
pub fn validate_with_errors<const BE: bool>(input: &[u16]) -> TranscodeResult {
    let mut pos = 0;
    while pos < input.len() {
        match decode_at::<BE>(input, pos) {
            Ok((_, n)) => pos += n,
            Err(kind) => return TranscodeResult::err(kind, pos),
        }
    }
    TranscodeResult::ok(input.len())
}

/// Number of code points: units minus high surrogates.
#[inline]
pub fn count_code_points<const BE: bool>(input: &[u16]) -> usize {
    input.len()
        - input
            .iter()
            .filter(|&&u| is_high_surrogate(load::<BE>(u)))
            .count()
}

/// Bytes needed to hold `input` as UTF-8.
///
/// Every surrogate counts two bytes, so a pair counts four.
#[inline]
pub fn utf8_length<const BE: bool>(input: &[u16]) -> usize {
    input
        .iter()
        .map(|&u| {
            let u = load::<BE>(u);
            if u < 0x80 {
                1
            } else if u < 0x800 || is_surrogate(u) {
                2
            } else {
                3
            }
        })
        .sum()
}

/// Code points in `input`, which is also its UTF-32 length.
#[inline]
pub fn utf32_length<const BE: bool>(input: &[u16]) -> usize {
    count_code_points::<BE>(input)
}

/// Swap the byte order of every unit.
///
/// # Panics
///
/// Panics if `output` is shorter than `input`.
pub fn change_endianness(input: &[u16], output: &mut [u16]) {
    for (dst, &src) in output[..input.len()].iter_mut().zip(input) {
        *dst = src.swap_bytes();
    }
}

pub fn change_endianness_in_place(buffer: &mut [u16]) {
    for unit in buffer {
        *unit = unit.swap_bytes();
    }
}

// =============================================================================
// Conversion to UTF-8
// =============================================================================

/// Convert UTF-16 to UTF-8, stopping at the first error.
///
/// # Panics
///
/// Panics if `output` is shorter than [`utf8_length`] of the valid prefix.
pub fn convert_to_utf8_with_errors<const BE: bool>(
    input: &[u16],
    output: &mut [u8],
) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    while pos < input.len() {
        match decode_at::<BE>(input, pos) {
            Ok((cp, n)) => {
                out += utf8::encode_unchecked(cp, output, out);
                pos += n;
            }
            Err(kind) => return TranscodeResult::err(kind, pos),
        }
    }
    TranscodeResult::ok(out)
}

pub fn convert_to_utf8<const BE: bool>(input: &[u16], output: &mut [u8]) -> usize {
    let result = convert_to_utf8_with_errors::<BE>(input, output);
    if result.is_ok() {
        result.count
    } else {
        0
    }
}

/// Decode the code point at `pos` assuming well-formed input.
///
/// A high surrogate always consumes the following unit (zero at end of
/// input); a lone low surrogate decodes as itself.
#[inline(always)]
pub(crate) fn decode_unchecked<const BE: bool>(input: &[u16], pos: usize) -> (u32, usize) {
    let unit = load::<BE>(input[pos]);
    if is_high_surrogate(unit) {
        let next = input.get(pos + 1).map_or(0, |&u| load::<BE>(u));
        (combine_surrogates(unit, next), 2)
    } else {
        (unit as u32, 1)
    }
}

/// Convert valid UTF-16 to UTF-8 without validation.
///
/// Malformed input can need more room than [`utf8_length`] reserves; the
/// conversion then stops at the first code point that does not fit.
pub fn convert_valid_to_utf8<const BE: bool>(input: &[u16], output: &mut [u8]) -> usize {
    let mut pos = 0;
    let mut out = 0;
    while pos < input.len() {
        let (cp, n) = decode_unchecked::<BE>(input, pos);
        if out + utf8::encoded_len(cp) > output.len() {
            break;
        }
        out += utf8::encode_unchecked(cp, output, out);
        pos += n;
    }
    out
}

// =============================================================================
// Conversion to UTF-32
// =============================================================================

pub fn convert_to_utf32_with_errors<const BE: bool>(
    input: &[u16],
    output: &mut [u32],
) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    while pos < input.len() {
        match decode_at::<BE>(input, pos) {
            Ok((cp, n)) => {
                output[out] = cp;
                out += 1;
                pos += n;
            }
            Err(kind) => return TranscodeResult::err(kind, pos),
        }
    }
    TranscodeResult::ok(out)
}

pub fn convert_to_utf32<const BE: bool>(input: &[u16], output: &mut [u32]) -> usize {
    let result = convert_to_utf32_with_errors::<BE>(input, output);
    if result.is_ok() {
        result.count
    } else {
        0
    }
}

/// Convert valid UTF-16 to UTF-32 without validation.
///
/// Stops when `output` is full, which malformed input can reach before
/// its end.
pub fn convert_valid_to_utf32<const BE: bool>(input: &[u16], output: &mut [u32]) -> usize {
    let mut pos = 0;
    let mut out = 0;
    while pos < input.len() && out < output.len() {
        let (cp, n) = decode_unchecked::<BE>(input, pos);
        output[out] = cp;
        out += 1;
        pos += n;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le(s: &str) -> Vec<u16> {
        s.encode_utf16().map(u16::to_le).collect()
    }

    fn be(s: &str) -> Vec<u16> {
        s.encode_utf16().map(u16::to_be).collect()
    }

    fn raw_le(units: &[u16]) -> Vec<u16> {
        units.iter().map(|u| u.to_le()).collect()
    }

    mod validation {
        use super::*;

        #[test]
        fn valid_text() {
            assert!(validate::<false>(&le("Hello, 世界! 🎉")));
            assert!(validate::<true>(&be("Hello, 世界! 🎉")));
            assert!(validate::<false>(&[]));
        }

        #[test]
        fn byte_order_changes_meaning() {
            // 00E9 read with the other byte order is E900, a different scalar
            let mut out = [0u32; 1];
            assert_eq!(convert_to_utf32::<true>(&le("é"), &mut out), 1);
            assert_eq!(out[0], 0xE900);
        }

        #[test]
        fn lone_high_surrogate() {
            let input = raw_le(&[0x41, 0xD800, 0x42]);
            assert_eq!(
                validate_with_errors::<false>(&input),
                TranscodeResult::err(ErrorKind::Surrogate, 1)
            );
        }

        #[test]
        fn high_surrogate_at_end() {
            let input = raw_le(&[0x41, 0xDBFF]);
            assert_eq!(
                validate_with_errors::<false>(&input),
                TranscodeResult::err(ErrorKind::Surrogate, 1)
            );
        }

        #[test]
        fn lone_low_surrogate() {
            let input = raw_le(&[0xDC00, 0x41]);
            assert_eq!(
                validate_with_errors::<false>(&input),
                TranscodeResult::err(ErrorKind::Surrogate, 0)
            );
        }

        #[test]
        fn reversed_pair() {
            let input = raw_le(&[0xDC00, 0xD800]);
            assert_eq!(
                validate_with_errors::<false>(&input),
                TranscodeResult::err(ErrorKind::Surrogate, 0)
            );
        }
    }

    mod lengths {
        use super::*;

        #[test]
        fn utf8_lengths() {
            for s in ["", "A", "é", "日本", "😀", "aé日😀"] {
                assert_eq!(utf8_length::<false>(&le(s)), s.len(), "{s:?}");
                assert_eq!(utf8_length::<true>(&be(s)), s.len(), "{s:?}");
            }
        }

        #[test]
        fn code_points() {
            let s = "a😀b🎉";
            assert_eq!(count_code_points::<false>(&le(s)), 4);
            assert_eq!(utf32_length::<true>(&be(s)), 4);
        }
    }

    mod conversion {
        use super::*;

        #[test]
        fn to_utf8() {
            let s = "Hello 世界 Привет 🌍 end";
            let mut out = vec![0u8; s.len()];
            assert_eq!(convert_to_utf8::<false>(&le(s), &mut out), s.len());
            assert_eq!(out, s.as_bytes());

            let mut out = vec![0u8; s.len()];
            assert_eq!(convert_valid_to_utf8::<true>(&be(s), &mut out), s.len());
            assert_eq!(out, s.as_bytes());
        }

        #[test]
        fn to_utf8_error_position() {
            let input = raw_le(&[0x41, 0x42, 0xD800, 0x43]);
            let mut out = [0u8; 8];
            let r = convert_to_utf8_with_errors::<false>(&input, &mut out);
            assert_eq!(r, TranscodeResult::err(ErrorKind::Surrogate, 2));
            assert_eq!(&out[..2], b"AB");
            assert_eq!(convert_to_utf8::<false>(&input, &mut out), 0);
        }

        #[test]
        fn to_utf32() {
            let s = "x😀y";
            let expected: Vec<u32> = s.chars().map(|c| c as u32).collect();
            let mut out = vec![0u32; expected.len()];
            assert_eq!(convert_to_utf32::<false>(&le(s), &mut out), 3);
            assert_eq!(out, expected);

            let mut out = vec![0u32; expected.len()];
            assert_eq!(convert_valid_to_utf32::<true>(&be(s), &mut out), 3);
            assert_eq!(out, expected);
        }

        #[test]
        fn endianness_swap() {
            let s = "Zürich 😀";
            let mut out = vec![0u16; le(s).len()];
            change_endianness(&le(s), &mut out);
            assert_eq!(out, be(s));

            let mut buf = be(s);
            change_endianness_in_place(&mut buf);
            assert_eq!(buf, le(s));
        }

        #[test]
        fn surrogate_split_roundtrip() {
            for cp in [0x10000u32, 0x1F600, 0x10FFFF] {
                let (h, l) = split_surrogates(cp);
                assert!(is_high_surrogate(h));
                assert!(is_low_surrogate(l));
                assert_eq!(combine_surrogates(h, l), cp);
            }
        }

        #[test]
        fn unchecked_conversion_of_lone_surrogates_fits_estimate() {
            let inputs: [&[u16]; 5] = [
                &[0xD800, 0x0041],
                &[0xDC00],
                &[0xD800],
                &[0xD800, 0xD800],
                &[0x4E2D, 0xDFFF, 0x4E2D, 0xDBFF],
            ];
            for units in inputs {
                let units = raw_le(units);
                let mut out8 = vec![0u8; utf8_length::<false>(&units)];
                let written = convert_valid_to_utf8::<false>(&units, &mut out8);
                assert!(written <= out8.len());
                let mut out32 = vec![0u32; utf32_length::<false>(&units)];
                let written = convert_valid_to_utf32::<false>(&units, &mut out32);
                assert!(written <= out32.len());
            }
        }
    }
}
