//! Stand-in kernel installed when a forced kernel is unknown or cannot run
//! on this host.
//!
//! Every operation fails. Validators return `false` and `_with_errors`
//! operations return [`ErrorKind::Other`] at position 0. Counters,
//! estimators and converters return 0. Detection finds nothing, even
//! behind a byte order mark. This makes a bad override visible instead of
//! silently using something else.

use super::{Kernel, KernelOps};
use crate::encoding::EncodingSet;
use crate::error::{ErrorKind, TranscodeResult};
use crate::isa::IsaFeatures;

fn reject<T: ?Sized>(_: &T) -> bool {
    false
}

fn reject_with_errors<T: ?Sized>(_: &T) -> TranscodeResult {
    TranscodeResult::err(ErrorKind::Other, 0)
}

fn zero<T: ?Sized>(_: &T) -> usize {
    0
}

fn no_output<T: ?Sized, U>(_: &T, _: &mut [U]) -> usize {
    0
}

fn no_output_with_errors<T: ?Sized, U>(_: &T, _: &mut [U]) -> TranscodeResult {
    TranscodeResult::err(ErrorKind::Other, 0)
}

fn no_swap(_: &[u16], _: &mut [u16]) {}

fn nothing_detected(_: &[u8]) -> EncodingSet {
    EncodingSet::empty()
}

pub static KERNEL: Kernel = Kernel::new(
    "unsupported",
    "Forced kernel unavailable (every operation fails)",
    IsaFeatures::empty(),
    KernelOps {
        validate_ascii: reject::<[u8]>,
        validate_ascii_with_errors: reject_with_errors::<[u8]>,
        validate_utf8: reject::<[u8]>,
        validate_utf8_with_errors: reject_with_errors::<[u8]>,
        validate_utf16le: reject::<[u16]>,
        validate_utf16be: reject::<[u16]>,
        validate_utf16le_with_errors: reject_with_errors::<[u16]>,
        validate_utf16be_with_errors: reject_with_errors::<[u16]>,
        validate_utf32: reject::<[u32]>,
        validate_utf32_with_errors: reject_with_errors::<[u32]>,

        count_utf8: zero::<[u8]>,
        count_utf16le: zero::<[u16]>,
        count_utf16be: zero::<[u16]>,
        utf16_length_from_utf8: zero::<[u8]>,
        utf32_length_from_utf8: zero::<[u8]>,
        utf8_length_from_utf16le: zero::<[u16]>,
        utf8_length_from_utf16be: zero::<[u16]>,
        utf32_length_from_utf16le: zero::<[u16]>,
        utf32_length_from_utf16be: zero::<[u16]>,
        utf8_length_from_utf32: zero::<[u32]>,
        utf16_length_from_utf32: zero::<[u32]>,

        convert_utf8_to_utf16le: no_output::<[u8], u16>,
        convert_utf8_to_utf16be: no_output::<[u8], u16>,
        convert_utf8_to_utf16le_with_errors: no_output_with_errors::<[u8], u16>,
        convert_utf8_to_utf16be_with_errors: no_output_with_errors::<[u8], u16>,
        convert_valid_utf8_to_utf16le: no_output::<[u8], u16>,
        convert_valid_utf8_to_utf16be: no_output::<[u8], u16>,

        convert_utf8_to_utf32: no_output::<[u8], u32>,
        convert_utf8_to_utf32_with_errors: no_output_with_errors::<[u8], u32>,
        convert_valid_utf8_to_utf32: no_output::<[u8], u32>,

        convert_utf16le_to_utf8: no_output::<[u16], u8>,
        convert_utf16be_to_utf8: no_output::<[u16], u8>,
        convert_utf16le_to_utf8_with_errors: no_output_with_errors::<[u16], u8>,
        convert_utf16be_to_utf8_with_errors: no_output_with_errors::<[u16], u8>,
        convert_valid_utf16le_to_utf8: no_output::<[u16], u8>,
        convert_valid_utf16be_to_utf8: no_output::<[u16], u8>,

        convert_utf16le_to_utf32: no_output::<[u16], u32>,
        convert_utf16be_to_utf32: no_output::<[u16], u32>,
        convert_utf16le_to_utf32_with_errors: no_output_with_errors::<[u16], u32>,
        convert_utf16be_to_utf32_with_errors: no_output_with_errors::<[u16], u32>,
        convert_valid_utf16le_to_utf32: no_output::<[u16], u32>,
        convert_valid_utf16be_to_utf32: no_output::<[u16], u32>,

        convert_utf32_to_utf8: no_output::<[u32], u8>,
        convert_utf32_to_utf8_with_errors: no_output_with_errors::<[u32], u8>,
        convert_valid_utf32_to_utf8: no_output::<[u32], u8>,

        convert_utf32_to_utf16le: no_output::<[u32], u16>,
        convert_utf32_to_utf16be: no_output::<[u32], u16>,
        convert_utf32_to_utf16le_with_errors: no_output_with_errors::<[u32], u16>,
        convert_utf32_to_utf16be_with_errors: no_output_with_errors::<[u32], u16>,
        convert_valid_utf32_to_utf16le: no_output::<[u32], u16>,
        convert_valid_utf32_to_utf16be: no_output::<[u32], u16>,

        change_endianness_utf16: no_swap,

        detect_encodings: nothing_detected,
    },
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Encoding;

    #[test]
    fn everything_fails() {
        let ops = KERNEL.ops().unwrap();
        assert!(!ops.validate_utf8(b""));
        assert!(!ops.validate_ascii(b"a"));
        assert_eq!(
            ops.validate_utf32_with_errors(&[0x41]),
            TranscodeResult::err(ErrorKind::Other, 0)
        );
        assert_eq!(ops.count_utf8(b"abc"), 0);
        let mut out = [0u16; 4];
        assert_eq!(ops.convert_utf8_to_utf16le(b"ab", &mut out), 0);
        assert!(ops.detect_encodings(b"abcd").is_empty());
        assert!(ops.detect_encodings(&[0xEF, 0xBB, 0xBF, b'a']).is_empty());
        assert_eq!(
            ops.autodetect_encoding(&[0xFF, 0xFE]),
            Encoding::Unspecified
        );
    }
}
