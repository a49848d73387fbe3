//! Byte order mark sniffing.

use super::Encoding;

/// Identify a leading byte order mark.
///
/// The four-byte UTF-32LE mark `FF FE 00 00` is checked before the UTF-16LE
/// mark it starts with.
///
/// # Examples
///
/// ```
/// use turbo_unicode::encoding::{bom, Encoding};
///
/// assert_eq!(bom::sniff(&[0xEF, 0xBB, 0xBF, b'x']), Some(Encoding::Utf8));
/// assert_eq!(bom::sniff(&[0xFF, 0xFE, 0x00, 0x00]), Some(Encoding::Utf32Le));
/// assert_eq!(bom::sniff(&[0xFF, 0xFE, 0x41, 0x00]), Some(Encoding::Utf16Le));
/// assert_eq!(bom::sniff(b"plain"), None);
/// ```
pub fn sniff(bytes: &[u8]) -> Option<Encoding> {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => Some(Encoding::Utf8),
        [0xFF, 0xFE, 0x00, 0x00, ..] => Some(Encoding::Utf32Le),
        [0xFF, 0xFE, ..] => Some(Encoding::Utf16Le),
        [0xFE, 0xFF, ..] => Some(Encoding::Utf16Be),
        [0x00, 0x00, 0xFE, 0xFF, ..] => Some(Encoding::Utf32Be),
        _ => None,
    }
}

/// Split off a leading byte order mark, if any.
pub fn strip(bytes: &[u8]) -> (Option<Encoding>, &[u8]) {
    match sniff(bytes) {
        Some(encoding) => (Some(encoding), &bytes[encoding.bom_len()..]),
        None => (None, bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_bom_is_recognised() {
        for encoding in [
            Encoding::Utf8,
            Encoding::Utf16Le,
            Encoding::Utf16Be,
            Encoding::Utf32Le,
            Encoding::Utf32Be,
        ] {
            assert_eq!(sniff(encoding.bom_bytes()), Some(encoding));
        }
    }

    #[test]
    fn partial_marks_are_not_boms() {
        assert_eq!(sniff(&[]), None);
        assert_eq!(sniff(&[0xEF, 0xBB]), None);
        assert_eq!(sniff(&[0xFF]), None);
        assert_eq!(sniff(&[0x00, 0x00, 0xFE]), None);
    }

    #[test]
    fn strip_returns_payload() {
        let (encoding, rest) = strip(&[0xEF, 0xBB, 0xBF, b'h', b'i']);
        assert_eq!(encoding, Some(Encoding::Utf8));
        assert_eq!(rest, b"hi");

        let (encoding, rest) = strip(b"hi");
        assert_eq!(encoding, None);
        assert_eq!(rest, b"hi");
    }
}
