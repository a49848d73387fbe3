//! Scalar UTF-8 validation, counting and decoding.
//!
//! This is the reference implementation every SIMD kernel is checked
//! against. It is also the tail handler for SIMD kernels and the routine
//! they re-run over a single block to recover the exact error position.
//!
//! ## UTF-8 Encoding Rules
//!
//! | Bytes | First byte    | Continuation bytes | Code point range     |
//! |-------|---------------|--------------------|----------------------|
//! | 1     | `0xxxxxxx`    | -                  | U+0000 - U+007F      |
//! | 2     | `110xxxxx`    | `10xxxxxx`         | U+0080 - U+07FF      |
//! | 3     | `1110xxxx`    | `10xxxxxx` x 2     | U+0800 - U+FFFF      |
//! | 4     | `11110xxx`    | `10xxxxxx` x 3     | U+10000 - U+10FFFF   |
//!
//! ## Error classification
//!
//! Errors are always reported at the index of the leading byte of the
//! offending sequence:
//!
//! 1. **TooShort**: a continuation byte is missing (end of input or a
//!    non-continuation byte follows the leader)
//! 2. **TooLong**: a continuation byte appears where a leader is expected
//! 3. **Overlong**: the code point fits in fewer bytes
//! 4. **Surrogate**: U+D800-U+DFFF encoded in three bytes
//! 5. **TooLarge**: the decoded value is above U+10FFFF, or the leader is
//!    `F5..FF` (checked before any continuation byte)

use crate::error::{ErrorKind, TranscodeResult};

use super::utf16;

const ASCII_MASK: u64 = 0x8080_8080_8080_8080;

/// Check if a byte is a UTF-8 continuation byte (0x80-0xBF).
#[inline(always)]
pub const fn is_continuation_byte(byte: u8) -> bool {
    (byte & 0xC0) == 0x80
}

/// Get the expected sequence length from a lead byte.
/// Returns 0 for continuation bytes and `F5..FF`.
#[inline]
pub const fn sequence_length(lead_byte: u8) -> usize {
    match lead_byte {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

/// Decode and validate the sequence starting at `pos`.
///
/// Returns the code point and the number of bytes consumed.
#[inline]
fn decode_at(input: &[u8], pos: usize) -> Result<(u32, usize), ErrorKind> {
    let lead = input[pos];
    let len = input.len();

    if lead < 0x80 {
        return Ok((lead as u32, 1));
    }
    // Nothing starting with F5..FF can be at or below U+10FFFF
    if lead >= 0xF5 {
        return Err(ErrorKind::TooLarge);
    }

    if (lead & 0xE0) == 0xC0 {
        if pos + 2 > len || !is_continuation_byte(input[pos + 1]) {
            return Err(ErrorKind::TooShort);
        }
        let cp = ((lead as u32 & 0x1F) << 6) | (input[pos + 1] as u32 & 0x3F);
        // C0 and C1 leaders always land here
        if cp < 0x80 {
            return Err(ErrorKind::Overlong);
        }
        Ok((cp, 2))
    } else if (lead & 0xF0) == 0xE0 {
        if pos + 3 > len
            || !is_continuation_byte(input[pos + 1])
            || !is_continuation_byte(input[pos + 2])
        {
            return Err(ErrorKind::TooShort);
        }
        let cp = ((lead as u32 & 0x0F) << 12)
            | ((input[pos + 1] as u32 & 0x3F) << 6)
            | (input[pos + 2] as u32 & 0x3F);
        if cp < 0x800 {
            return Err(ErrorKind::Overlong);
        }
        if (0xD800..=0xDFFF).contains(&cp) {
            return Err(ErrorKind::Surrogate);
        }
        Ok((cp, 3))
    } else if lead >= 0xF0 {
        if pos + 4 > len
            || !is_continuation_byte(input[pos + 1])
            || !is_continuation_byte(input[pos + 2])
            || !is_continuation_byte(input[pos + 3])
        {
            return Err(ErrorKind::TooShort);
        }
        let cp = ((lead as u32 & 0x07) << 18)
            | ((input[pos + 1] as u32 & 0x3F) << 12)
            | ((input[pos + 2] as u32 & 0x3F) << 6)
            | (input[pos + 3] as u32 & 0x3F);
        if cp < 0x10000 {
            return Err(ErrorKind::Overlong);
        }
        if cp > 0x10FFFF {
            return Err(ErrorKind::TooLarge);
        }
        Ok((cp, 4))
    } else {
        Err(ErrorKind::TooLong)
    }
}

/// Skip a run of ASCII bytes starting at `pos`, eight at a time.
#[inline]
fn skip_ascii(input: &[u8], mut pos: usize) -> usize {
    while pos + 8 <= input.len() {
        let mut word = [0u8; 8];
        word.copy_from_slice(&input[pos..pos + 8]);
        if u64::from_ne_bytes(word) & ASCII_MASK != 0 {
            break;
        }
        pos += 8;
    }
    while pos < input.len() && input[pos] < 0x80 {
        pos += 1;
    }
    pos
}

/// Validate that the input is valid UTF-8.
pub fn validate(input: &[u8]) -> bool {
    let mut pos = 0;
    while pos < input.len() {
        pos = skip_ascii(input, pos);
        if pos == input.len() {
            break;
        }
        match decode_at(input, pos) {
            Ok((_, n)) => pos += n,
            Err(_) => return false,
        }
    }
    true
}

/// Validate UTF-8, reporting the first error and its position.
///
/// # Examples
///
/// ```
/// use turbo_unicode::scalar::utf8::validate_with_errors;
/// use turbo_unicode::ErrorKind;
///
/// assert!(validate_with_errors("日本語".as_bytes()).is_ok());
///
/// let r = validate_with_errors(&[b'A', 0xC0, 0x80]);
/// assert_eq!(r.error, ErrorKind::Overlong);
/// assert_eq!(r.count, 1);
/// ```
pub fn validate_with_errors(input: &[u8]) -> TranscodeResult {
    let mut pos = 0;
    while pos < input.len() {
        pos = skip_ascii(input, pos);
        if pos == input.len() {
            break;
        }
        match decode_at(input, pos) {
            Ok((_, n)) => pos += n,
            Err(kind) => return TranscodeResult::err(kind, pos),
        }
    }
    TranscodeResult::ok(input.len())
}

/// Nearest non-continuation byte among the three bytes before `pos`, or
/// `pos` itself when there is none.
///
/// SIMD kernels use this to restart scalar validation at a sequence
/// boundary: a sequence left incomplete by a previous block always starts
/// within those three bytes.
#[inline]
pub fn rewind_to_leader(input: &[u8], pos: usize) -> usize {
    let pos = pos.min(input.len());
    let limit = pos.saturating_sub(3);
    let mut start = pos;
    while start > limit {
        start -= 1;
        if !is_continuation_byte(input[start]) {
            return start;
        }
    }
    pos
}

/// Validate `input[from..]` with errors after rewinding `from` to the
/// start of the sequence it falls in. Positions refer to `input`.
///
/// The caller guarantees everything before the rewound position is valid.
pub fn rewind_and_validate_with_errors(input: &[u8], from: usize) -> TranscodeResult {
    let start = rewind_to_leader(input, from);
    let result = validate_with_errors(&input[start..]);
    if result.is_ok() {
        TranscodeResult::ok(input.len())
    } else {
        result.rebase(start, 0)
    }
}

/// Number of code points (non-continuation bytes).
///
/// Assumes valid input; on invalid input it still counts leaders.
#[inline]
pub fn count_code_points(input: &[u8]) -> usize {
    input.iter().filter(|&&b| !is_continuation_byte(b)).count()
}

/// Number of UTF-16 units needed to hold `input` once transcoded.
#[inline]
pub fn utf16_length(input: &[u8]) -> usize {
    input
        .iter()
        .map(|&b| (!is_continuation_byte(b)) as usize + (b >= 0xF0) as usize)
        .sum()
}

/// Number of UTF-32 units needed to hold `input` once transcoded.
#[inline]
pub fn utf32_length(input: &[u8]) -> usize {
    count_code_points(input)
}

// =============================================================================
// Conversion to UTF-16
// =============================================================================

/// Write one code point as UTF-16, returning the number of units written.
#[inline(always)]
fn push_utf16<const BE: bool>(cp: u32, output: &mut [u16], at: usize) -> usize {
    if cp < 0x10000 {
        output[at] = utf16::store::<BE>(cp as u16);
        1
    } else {
        let (high, low) = utf16::split_surrogates(cp);
        output[at] = utf16::store::<BE>(high);
        output[at + 1] = utf16::store::<BE>(low);
        2
    }
}

/// Convert UTF-8 to UTF-16, stopping at the first error.
///
/// # Panics
///
/// Panics if `output` is shorter than [`utf16_length`] of the valid prefix.
pub fn convert_to_utf16_with_errors<const BE: bool>(
    input: &[u8],
    output: &mut [u16],
) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    while pos < input.len() {
        let lead = input[pos];
        if lead < 0x80 {
            output[out] = utf16::store::<BE>(lead as u16);
            out += 1;
            pos += 1;
            continue;
        }
        match decode_at(input, pos) {
            Ok((cp, n)) => {
                out += push_utf16::<BE>(cp, output, out);
                pos += n;
            }
            Err(kind) => return TranscodeResult::err(kind, pos),
        }
    }
    TranscodeResult::ok(out)
}

/// Convert UTF-8 to UTF-16. Returns 0 on invalid input.
pub fn convert_to_utf16<const BE: bool>(input: &[u8], output: &mut [u16]) -> usize {
    let result = convert_to_utf16_with_errors::<BE>(input, output);
    if result.is_ok() {
        result.count
    } else {
        0
    }
}

/// Read the payload byte at `pos`, or zero past the end of input.
#[inline(always)]
fn payload(input: &[u8], pos: usize) -> u32 {
    input.get(pos).map_or(0, |&b| b as u32 & 0x3F)
}

/// Decode the code point whose leader is at `pos` without validation.
///
/// Missing bytes read as zero, so garbage input decodes to garbage but never
/// reads out of bounds.
#[inline(always)]
pub(crate) fn decode_unchecked(input: &[u8], pos: usize) -> u32 {
    let lead = input[pos] as u32;
    if lead < 0x80 {
        lead
    } else if lead < 0xE0 {
        ((lead & 0x1F) << 6) | payload(input, pos + 1)
    } else if lead < 0xF0 {
        ((lead & 0x0F) << 12) | (payload(input, pos + 1) << 6) | payload(input, pos + 2)
    } else {
        ((lead & 0x07) << 18)
            | (payload(input, pos + 1) << 12)
            | (payload(input, pos + 2) << 6)
            | payload(input, pos + 3)
    }
}

/// Convert valid UTF-8 to UTF-16 without validation.
///
/// Every non-continuation byte produces one unit, two when it is a four-byte
/// leader, so the output length always equals [`utf16_length`].
pub fn convert_valid_to_utf16<const BE: bool>(input: &[u8], output: &mut [u16]) -> usize {
    let mut out = 0;
    for pos in 0..input.len() {
        let lead = input[pos];
        if lead < 0x80 {
            output[out] = utf16::store::<BE>(lead as u16);
            out += 1;
        } else if lead >= 0xF0 {
            let (high, low) = utf16::split_surrogates(decode_unchecked(input, pos));
            output[out] = utf16::store::<BE>(high);
            output[out + 1] = utf16::store::<BE>(low);
            out += 2;
        } else if !is_continuation_byte(lead) {
            output[out] = utf16::store::<BE>(decode_unchecked(input, pos) as u16);
            out += 1;
        }
    }
    out
}

// =============================================================================
// Conversion to UTF-32
// =============================================================================

/// Convert UTF-8 to UTF-32, stopping at the first error.
///
/// # Panics
///
/// Panics if `output` is shorter than [`utf32_length`] of the valid prefix.
pub fn convert_to_utf32_with_errors(input: &[u8], output: &mut [u32]) -> TranscodeResult {
    let mut pos = 0;
    let mut out = 0;
    while pos < input.len() {
        let lead = input[pos];
        if lead < 0x80 {
            output[out] = lead as u32;
            out += 1;
            pos += 1;
            continue;
        }
        match decode_at(input, pos) {
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

/// Convert UTF-8 to UTF-32. Returns 0 on invalid input.
pub fn convert_to_utf32(input: &[u8], output: &mut [u32]) -> usize {
    let result = convert_to_utf32_with_errors(input, output);
    if result.is_ok() {
        result.count
    } else {
        0
    }
}

/// Convert valid UTF-8 to UTF-32 without validation.
///
/// Every non-continuation byte produces exactly one unit.
pub fn convert_valid_to_utf32(input: &[u8], output: &mut [u32]) -> usize {
    let mut out = 0;
    for pos in 0..input.len() {
        if !is_continuation_byte(input[pos]) {
            output[out] = decode_unchecked(input, pos);
            out += 1;
        }
    }
    out
}

// =============================================================================
// Single code point helpers
// =============================================================================

/// Decode a UTF-8 code point from a byte slice.
///
/// Returns `None` if the input is empty or starts with an invalid sequence.
/// On success, returns the decoded code point and the number of bytes consumed.
///
/// # Examples
///
/// ```
/// use turbo_unicode::scalar::utf8::decode_code_point;
///
/// assert_eq!(decode_code_point(b"A"), Some(('A' as u32, 1)));
/// assert_eq!(decode_code_point("日".as_bytes()), Some((0x65E5, 3)));
/// assert_eq!(decode_code_point(&[0xC0, 0x80]), None);
/// assert_eq!(decode_code_point(b""), None);
/// ```
pub fn decode_code_point(input: &[u8]) -> Option<(u32, usize)> {
    if input.is_empty() {
        return None;
    }
    decode_at(input, 0).ok()
}

/// Encode a Unicode code point as UTF-8.
///
/// Returns `None` if the code point is a surrogate or above U+10FFFF.
/// On success, returns the UTF-8 bytes and the number of bytes used.
///
/// # Examples
///
/// ```
/// use turbo_unicode::scalar::utf8::encode_code_point;
///
/// let (bytes, len) = encode_code_point(0x1F389).unwrap();
/// assert_eq!(&bytes[..len], "🎉".as_bytes());
///
/// assert!(encode_code_point(0xD800).is_none());
/// assert!(encode_code_point(0x110000).is_none());
/// ```
pub fn encode_code_point(cp: u32) -> Option<([u8; 4], usize)> {
    if (0xD800..=0xDFFF).contains(&cp) || cp > 0x10FFFF {
        return None;
    }
    let mut buf = [0u8; 4];
    let len = encode_unchecked(cp, &mut buf, 0);
    Some((buf, len))
}

/// Write `cp` as UTF-8 at `output[at..]` without range checks.
#[inline(always)]
pub(crate) fn encode_unchecked(cp: u32, output: &mut [u8], at: usize) -> usize {
    if cp < 0x80 {
        output[at] = cp as u8;
        1
    } else if cp < 0x800 {
        output[at] = 0xC0 | (cp >> 6) as u8;
        output[at + 1] = 0x80 | (cp & 0x3F) as u8;
        2
    } else if cp < 0x10000 {
        output[at] = 0xE0 | (cp >> 12) as u8;
        output[at + 1] = 0x80 | ((cp >> 6) & 0x3F) as u8;
        output[at + 2] = 0x80 | (cp & 0x3F) as u8;
        3
    } else {
        output[at] = 0xF0 | (cp >> 18) as u8;
        output[at + 1] = 0x80 | ((cp >> 12) & 0x3F) as u8;
        output[at + 2] = 0x80 | ((cp >> 6) & 0x3F) as u8;
        output[at + 3] = 0x80 | (cp & 0x3F) as u8;
        4
    }
}

/// Number of UTF-8 bytes needed for `cp`.
#[inline(always)]
pub(crate) const fn encoded_len(cp: u32) -> usize {
    1 + (cp >= 0x80) as usize + (cp >= 0x800) as usize + (cp >= 0x10000) as usize
}
