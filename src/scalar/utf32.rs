//! Scalar UTF-32 validation and transcoding. UTF-32 is always host-endian.

use crate::error::{ErrorKind, TranscodeResult};

use super::{utf16, utf8};

#[inline(always)]
fn check(cp: u32) -> Result<(), ErrorKind> {
    if cp > 0x10FFFF {
        Err(ErrorKind::TooLarge)
    } else if (0xD800..=0xDFFF).contains(&cp) {
        Err(ErrorKind::Surrogate)
    } else {
        Ok(())
    }
}

pub fn validate(input: &[u32]) -> bool {
    input.iter().all(|&cp| check(cp).is_ok())
}

pub fn validate_with_errors(input: &[u32]) -> TranscodeResult {
    for (pos, &cp) in input.iter().enumerate() {
        if let Err(kind) = check(cp) {
            return TranscodeResult::err(kind, pos);
        }
    }
    TranscodeResult::ok(input.len())
}

/// Bytes needed to hold `input` as UTF-8.
#[inline]
pub fn utf8_length(input: &[u32]) -> usize {
    input.iter().map(|&cp| utf8::encoded_len(cp)).sum()
}

/// Units needed to hold `input` as UTF-16.
#[inline]
pub fn utf16_length(input: &[u32]) -> usize {
    input.len() + input.iter().filter(|&&cp| cp > 0xFFFF).count()
}

pub fn convert_to_utf8_with_errors(input: &[u32], output: &mut [u8]) -> TranscodeResult {
    let mut out = 0;
    for (pos, &cp) in input.iter().enumerate() {
        if let Err(kind) = check(cp) {
            return TranscodeResult::err(kind, pos);
        }
        out += utf8::encode_unchecked(cp, output, out);
    }
    TranscodeResult::ok(out)
}

pub fn convert_to_utf8(input: &[u32], output: &mut [u8]) -> usize {
    let result = convert_to_utf8_with_errors(input, output);
    if result.is_ok() {
        result.count
    } else {
        0
    }
}

pub fn convert_valid_to_utf8(input: &[u32], output: &mut [u8]) -> usize {
    let mut out = 0;
    for &cp in input {
        out += utf8::encode_unchecked(cp, output, out);
    }
    out
}

pub fn convert_to_utf16_with_errors<const BE: bool>(
    input: &[u32],
    output: &mut [u16],
) -> TranscodeResult {
    let mut out = 0;
    for (pos, &cp) in input.iter().enumerate() {
        if let Err(kind) = check(cp) {
            return TranscodeResult::err(kind, pos);
        }
        out += push_utf16::<BE>(cp, output, out);
    }
    TranscodeResult::ok(out)
}

pub fn convert_to_utf16<const BE: bool>(input: &[u32], output: &mut [u16]) -> usize {
    let result = convert_to_utf16_with_errors::<BE>(input, output);
    if result.is_ok() {
        result.count
    } else {
        0
    }
}

pub fn convert_valid_to_utf16<const BE: bool>(input: &[u32], output: &mut [u16]) -> usize {
    let mut out = 0;
    for &cp in input {
        out += push_utf16::<BE>(cp, output, out);
    }
    out
}

#[inline(always)]
fn push_utf16<const BE: bool>(cp: u32, output: &mut [u16], at: usize) -> usize {
    if cp <= 0xFFFF {
        output[at] = utf16::store::<BE>(cp as u16);
        1
    } else {
        let (high, low) = utf16::split_surrogates(cp);
        output[at] = utf16::store::<BE>(high);
        output[at + 1] = utf16::store::<BE>(low);
        2
    }
}
