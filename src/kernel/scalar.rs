//! The portable kernel, built entirely from [`crate::scalar`].

use super::{Kernel, KernelOps};
use crate::encoding::{detect, EncodingSet};
use crate::isa::IsaFeatures;
use crate::scalar::{ascii, utf16, utf32, utf8};

const LE: bool = false;
const BE: bool = true;

pub static KERNEL: Kernel = Kernel::new(
    "scalar",
    "Generic portable implementation",
    IsaFeatures::empty(),
    KernelOps {
        validate_ascii: ascii::validate,
        validate_ascii_with_errors: ascii::validate_with_errors,
        validate_utf8: utf8::validate,
        validate_utf8_with_errors: utf8::validate_with_errors,
        validate_utf16le: utf16::validate::<LE>,
        validate_utf16be: utf16::validate::<BE>,
        validate_utf16le_with_errors: utf16::validate_with_errors::<LE>,
        validate_utf16be_with_errors: utf16::validate_with_errors::<BE>,
        validate_utf32: utf32::validate,
        validate_utf32_with_errors: utf32::validate_with_errors,

        count_utf8: utf8::count_code_points,
        count_utf16le: utf16::count_code_points::<LE>,
        count_utf16be: utf16::count_code_points::<BE>,
        utf16_length_from_utf8: utf8::utf16_length,
        utf32_length_from_utf8: utf8::utf32_length,
        utf8_length_from_utf16le: utf16::utf8_length::<LE>,
        utf8_length_from_utf16be: utf16::utf8_length::<BE>,
        utf32_length_from_utf16le: utf16::utf32_length::<LE>,
        utf32_length_from_utf16be: utf16::utf32_length::<BE>,
        utf8_length_from_utf32: utf32::utf8_length,
        utf16_length_from_utf32: utf32::utf16_length,

        convert_utf8_to_utf16le: utf8::convert_to_utf16::<LE>,
        convert_utf8_to_utf16be: utf8::convert_to_utf16::<BE>,
        convert_utf8_to_utf16le_with_errors: utf8::convert_to_utf16_with_errors::<LE>,
        convert_utf8_to_utf16be_with_errors: utf8::convert_to_utf16_with_errors::<BE>,
        convert_valid_utf8_to_utf16le: utf8::convert_valid_to_utf16::<LE>,
        convert_valid_utf8_to_utf16be: utf8::convert_valid_to_utf16::<BE>,

        convert_utf8_to_utf32: utf8::convert_to_utf32,
        convert_utf8_to_utf32_with_errors: utf8::convert_to_utf32_with_errors,
        convert_valid_utf8_to_utf32: utf8::convert_valid_to_utf32,

        convert_utf16le_to_utf8: utf16::convert_to_utf8::<LE>,
        convert_utf16be_to_utf8: utf16::convert_to_utf8::<BE>,
        convert_utf16le_to_utf8_with_errors: utf16::convert_to_utf8_with_errors::<LE>,
        convert_utf16be_to_utf8_with_errors: utf16::convert_to_utf8_with_errors::<BE>,
        convert_valid_utf16le_to_utf8: utf16::convert_valid_to_utf8::<LE>,
        convert_valid_utf16be_to_utf8: utf16::convert_valid_to_utf8::<BE>,

        convert_utf16le_to_utf32: utf16::convert_to_utf32::<LE>,
        convert_utf16be_to_utf32: utf16::convert_to_utf32::<BE>,
        convert_utf16le_to_utf32_with_errors: utf16::convert_to_utf32_with_errors::<LE>,
        convert_utf16be_to_utf32_with_errors: utf16::convert_to_utf32_with_errors::<BE>,
        convert_valid_utf16le_to_utf32: utf16::convert_valid_to_utf32::<LE>,
        convert_valid_utf16be_to_utf32: utf16::convert_valid_to_utf32::<BE>,

        convert_utf32_to_utf8: utf32::convert_to_utf8,
        convert_utf32_to_utf8_with_errors: utf32::convert_to_utf8_with_errors,
        convert_valid_utf32_to_utf8: utf32::convert_valid_to_utf8,

        convert_utf32_to_utf16le: utf32::convert_to_utf16::<LE>,
        convert_utf32_to_utf16be: utf32::convert_to_utf16::<BE>,
        convert_utf32_to_utf16le_with_errors: utf32::convert_to_utf16_with_errors::<LE>,
        convert_utf32_to_utf16be_with_errors: utf32::convert_to_utf16_with_errors::<BE>,
        convert_valid_utf32_to_utf16le: utf32::convert_valid_to_utf16::<LE>,
        convert_valid_utf32_to_utf16be: utf32::convert_valid_to_utf16::<BE>,

        change_endianness_utf16: utf16::change_endianness,

        detect_encodings,
    },
);

fn detect_encodings(input: &[u8]) -> EncodingSet {
    detect::detect_with(KERNEL.ops_unchecked(), input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, TranscodeResult};

    fn ops() -> &'static KernelOps {
        KERNEL.ops().unwrap()
    }

    #[test]
    fn table_routes_endianness() {
        let le: Vec<u16> = "é".encode_utf16().map(u16::to_le).collect();
        let be: Vec<u16> = "é".encode_utf16().map(u16::to_be).collect();
        let mut out = [0u8; 2];
        assert_eq!(ops().convert_utf16le_to_utf8(&le, &mut out), 2);
        assert_eq!(&out, "é".as_bytes());
        assert_eq!(ops().convert_utf16be_to_utf8(&be, &mut out), 2);
        assert_eq!(&out, "é".as_bytes());
    }

    #[test]
    fn validators() {
        assert!(ops().validate_ascii(b"plain"));
        assert_eq!(
            ops().validate_ascii_with_errors("plé".as_bytes()),
            TranscodeResult::err(ErrorKind::TooLarge, 2)
        );
        assert!(ops().validate_utf8("ok ✓".as_bytes()));
        assert!(!ops().validate_utf32(&[0xD800]));
    }
}
