//! Free functions dispatched through the active kernel.
//!
//! Every function here loads the active kernel (see [`crate::dispatch`])
//! and forwards to the matching [`KernelOps`](crate::kernel::KernelOps)
//! method. UTF-16 operations come in three shapes: `_le`/`_be` suffixed
//! names and an unsuffixed one taking an [`Endianness`].
//!
//! Output buffers must be at least as long as the matching length
//! estimator reports for the input; a shorter buffer panics.
//!
//! # Example
//!
//! ```
//! use turbo_unicode::{convert_utf8_to_utf16, utf16_length_from_utf8, Endianness};
//!
//! let text = "𝄞 clef";
//! let mut units = vec![0u16; utf16_length_from_utf8(text.as_bytes())];
//! let n = convert_utf8_to_utf16(text.as_bytes(), &mut units, Endianness::Little);
//! assert_eq!(n, 7);
//! ```

use crate::dispatch::active_ops;
use crate::encoding::{Encoding, EncodingSet, Endianness};
use crate::error::TranscodeResult;

/// Forward to the active kernel's method of the same name.
macro_rules! forward {
    ($(
        $(#[$doc:meta])*
        fn $name:ident($($arg:ident: $ty:ty),*) -> $ret:ty;
    )*) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $name($($arg: $ty),*) -> $ret {
                active_ops().$name($($arg),*)
            }
        )*
    };
}

/// Pick the `le` or `be` method of the active kernel.
macro_rules! by_endianness {
    ($(
        $(#[$doc:meta])*
        fn $name:ident($($arg:ident: $ty:ty),*) -> $ret:ty => $le:ident, $be:ident;
    )*) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $name($($arg: $ty,)* endianness: Endianness) -> $ret {
                let ops = active_ops();
                match endianness {
                    Endianness::Little => ops.$le($($arg),*),
                    Endianness::Big => ops.$be($($arg),*),
                }
            }
        )*
    };
}

// =============================================================================
// Validation
// =============================================================================

forward! {
    /// `true` when every byte is below 0x80.
    fn validate_ascii(input: &[u8]) -> bool;
    /// First non-ASCII byte, reported as [`ErrorKind::TooLarge`](crate::ErrorKind::TooLarge).
    fn validate_ascii_with_errors(input: &[u8]) -> TranscodeResult;
    /// `true` when `input` is well-formed UTF-8.
    fn validate_utf8(input: &[u8]) -> bool;
    /// The first UTF-8 error and its byte index, or the input length.
    fn validate_utf8_with_errors(input: &[u8]) -> TranscodeResult;
    fn validate_utf16le(input: &[u16]) -> bool;
    fn validate_utf16be(input: &[u16]) -> bool;
    fn validate_utf16le_with_errors(input: &[u16]) -> TranscodeResult;
    fn validate_utf16be_with_errors(input: &[u16]) -> TranscodeResult;
    /// `true` when every unit is a Unicode scalar value.
    fn validate_utf32(input: &[u32]) -> bool;
    fn validate_utf32_with_errors(input: &[u32]) -> TranscodeResult;
}

by_endianness! {
    fn validate_utf16(input: &[u16]) -> bool => validate_utf16le, validate_utf16be;
    /// Unpaired surrogates are reported at their own index.
    fn validate_utf16_with_errors(input: &[u16]) -> TranscodeResult
        => validate_utf16le_with_errors, validate_utf16be_with_errors;
}

// =============================================================================
// Counting and length estimation
// =============================================================================

forward! {
    /// Code points in UTF-8. Assumes valid input.
    fn count_utf8(input: &[u8]) -> usize;
    fn count_utf16le(input: &[u16]) -> usize;
    fn count_utf16be(input: &[u16]) -> usize;
    /// UTF-16 units needed for valid UTF-8 `input`.
    fn utf16_length_from_utf8(input: &[u8]) -> usize;
    /// UTF-32 units needed for valid UTF-8 `input`.
    fn utf32_length_from_utf8(input: &[u8]) -> usize;
    fn utf8_length_from_utf16le(input: &[u16]) -> usize;
    fn utf8_length_from_utf16be(input: &[u16]) -> usize;
    fn utf32_length_from_utf16le(input: &[u16]) -> usize;
    fn utf32_length_from_utf16be(input: &[u16]) -> usize;
    /// UTF-8 bytes needed for valid UTF-32 `input`.
    fn utf8_length_from_utf32(input: &[u32]) -> usize;
    /// UTF-16 units needed for valid UTF-32 `input`.
    fn utf16_length_from_utf32(input: &[u32]) -> usize;
}

by_endianness! {
    /// Code points in UTF-16. Assumes valid input.
    fn count_utf16(input: &[u16]) -> usize => count_utf16le, count_utf16be;
    /// UTF-8 bytes needed for valid UTF-16 `input`.
    fn utf8_length_from_utf16(input: &[u16]) -> usize
        => utf8_length_from_utf16le, utf8_length_from_utf16be;
    /// UTF-32 units needed for valid UTF-16 `input`.
    fn utf32_length_from_utf16(input: &[u16]) -> usize
        => utf32_length_from_utf16le, utf32_length_from_utf16be;
}

// =============================================================================
// Conversion
// =============================================================================

forward! {
    /// Returns units written, or 0 if `input` is not valid UTF-8.
    fn convert_utf8_to_utf16le(input: &[u8], output: &mut [u16]) -> usize;
    fn convert_utf8_to_utf16be(input: &[u8], output: &mut [u16]) -> usize;
    /// On error the valid prefix has been written and the result holds the
    /// input index of the error.
    fn convert_utf8_to_utf16le_with_errors(input: &[u8], output: &mut [u16]) -> TranscodeResult;
    fn convert_utf8_to_utf16be_with_errors(input: &[u8], output: &mut [u16]) -> TranscodeResult;
    /// `input` must be valid UTF-8. Invalid input yields unspecified output.
    fn convert_valid_utf8_to_utf16le(input: &[u8], output: &mut [u16]) -> usize;
    fn convert_valid_utf8_to_utf16be(input: &[u8], output: &mut [u16]) -> usize;

    fn convert_utf8_to_utf32(input: &[u8], output: &mut [u32]) -> usize;
    fn convert_utf8_to_utf32_with_errors(input: &[u8], output: &mut [u32]) -> TranscodeResult;
    fn convert_valid_utf8_to_utf32(input: &[u8], output: &mut [u32]) -> usize;

    fn convert_utf16le_to_utf8(input: &[u16], output: &mut [u8]) -> usize;
    fn convert_utf16be_to_utf8(input: &[u16], output: &mut [u8]) -> usize;
    fn convert_utf16le_to_utf8_with_errors(input: &[u16], output: &mut [u8]) -> TranscodeResult;
    fn convert_utf16be_to_utf8_with_errors(input: &[u16], output: &mut [u8]) -> TranscodeResult;
    fn convert_valid_utf16le_to_utf8(input: &[u16], output: &mut [u8]) -> usize;
    fn convert_valid_utf16be_to_utf8(input: &[u16], output: &mut [u8]) -> usize;

    fn convert_utf16le_to_utf32(input: &[u16], output: &mut [u32]) -> usize;
    fn convert_utf16be_to_utf32(input: &[u16], output: &mut [u32]) -> usize;
    fn convert_utf16le_to_utf32_with_errors(input: &[u16], output: &mut [u32]) -> TranscodeResult;
    fn convert_utf16be_to_utf32_with_errors(input: &[u16], output: &mut [u32]) -> TranscodeResult;
    fn convert_valid_utf16le_to_utf32(input: &[u16], output: &mut [u32]) -> usize;
    fn convert_valid_utf16be_to_utf32(input: &[u16], output: &mut [u32]) -> usize;

    fn convert_utf32_to_utf8(input: &[u32], output: &mut [u8]) -> usize;
    fn convert_utf32_to_utf8_with_errors(input: &[u32], output: &mut [u8]) -> TranscodeResult;
    fn convert_valid_utf32_to_utf8(input: &[u32], output: &mut [u8]) -> usize;

    fn convert_utf32_to_utf16le(input: &[u32], output: &mut [u16]) -> usize;
    fn convert_utf32_to_utf16be(input: &[u32], output: &mut [u16]) -> usize;
    fn convert_utf32_to_utf16le_with_errors(input: &[u32], output: &mut [u16]) -> TranscodeResult;
    fn convert_utf32_to_utf16be_with_errors(input: &[u32], output: &mut [u16]) -> TranscodeResult;
    fn convert_valid_utf32_to_utf16le(input: &[u32], output: &mut [u16]) -> usize;
    fn convert_valid_utf32_to_utf16be(input: &[u32], output: &mut [u16]) -> usize;
}

by_endianness! {
    fn convert_utf8_to_utf16(input: &[u8], output: &mut [u16]) -> usize
        => convert_utf8_to_utf16le, convert_utf8_to_utf16be;
    fn convert_utf8_to_utf16_with_errors(input: &[u8], output: &mut [u16]) -> TranscodeResult
        => convert_utf8_to_utf16le_with_errors, convert_utf8_to_utf16be_with_errors;
    fn convert_valid_utf8_to_utf16(input: &[u8], output: &mut [u16]) -> usize
        => convert_valid_utf8_to_utf16le, convert_valid_utf8_to_utf16be;

    fn convert_utf16_to_utf8(input: &[u16], output: &mut [u8]) -> usize
        => convert_utf16le_to_utf8, convert_utf16be_to_utf8;
    fn convert_utf16_to_utf8_with_errors(input: &[u16], output: &mut [u8]) -> TranscodeResult
        => convert_utf16le_to_utf8_with_errors, convert_utf16be_to_utf8_with_errors;
    fn convert_valid_utf16_to_utf8(input: &[u16], output: &mut [u8]) -> usize
        => convert_valid_utf16le_to_utf8, convert_valid_utf16be_to_utf8;

    fn convert_utf16_to_utf32(input: &[u16], output: &mut [u32]) -> usize
        => convert_utf16le_to_utf32, convert_utf16be_to_utf32;
    fn convert_utf16_to_utf32_with_errors(input: &[u16], output: &mut [u32]) -> TranscodeResult
        => convert_utf16le_to_utf32_with_errors, convert_utf16be_to_utf32_with_errors;
    fn convert_valid_utf16_to_utf32(input: &[u16], output: &mut [u32]) -> usize
        => convert_valid_utf16le_to_utf32, convert_valid_utf16be_to_utf32;

    fn convert_utf32_to_utf16(input: &[u32], output: &mut [u16]) -> usize
        => convert_utf32_to_utf16le, convert_utf32_to_utf16be;
    fn convert_utf32_to_utf16_with_errors(input: &[u32], output: &mut [u16]) -> TranscodeResult
        => convert_utf32_to_utf16le_with_errors, convert_utf32_to_utf16be_with_errors;
    fn convert_valid_utf32_to_utf16(input: &[u32], output: &mut [u16]) -> usize
        => convert_valid_utf32_to_utf16le, convert_valid_utf32_to_utf16be;
}

// =============================================================================
// Byte order
// =============================================================================

/// Byte-swap every unit of `input` into the front of `output`.
///
/// # Panics
///
/// If `output` is shorter than `input`.
#[inline]
pub fn change_endianness_utf16(input: &[u16], output: &mut [u16]) {
    active_ops().change_endianness_utf16(input, output)
}

/// Byte-swap every unit of `buffer`.
pub fn change_endianness_utf16_in_place(buffer: &mut [u16]) {
    const CHUNK: usize = 256;
    let ops = active_ops();
    let mut scratch = [0u16; CHUNK];
    for chunk in buffer.chunks_mut(CHUNK) {
        let n = chunk.len();
        scratch[..n].copy_from_slice(chunk);
        ops.change_endianness_utf16(&scratch[..n], chunk);
    }
}

// =============================================================================
// Detection
// =============================================================================

/// The encoding named by a leading BOM, otherwise every encoding `input` is
/// valid in.
#[inline]
pub fn detect_encodings(input: &[u8]) -> EncodingSet {
    active_ops().detect_encodings(input)
}

/// The encoding named by a leading BOM, otherwise the preferred valid
/// encoding (UTF-8, then UTF-16, then UTF-32).
#[inline]
pub fn autodetect_encoding(input: &[u8]) -> Encoding {
    active_ops().autodetect_encoding(input)
}
