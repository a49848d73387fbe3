//! Scalar ASCII validation.

use crate::error::{ErrorKind, TranscodeResult};

const HIGH_BITS: u64 = 0x8080_8080_8080_8080;

/// Returns `true` when every byte is below 0x80.
pub fn validate(input: &[u8]) -> bool {
    let mut chunks = input.chunks_exact(8);
    for chunk in &mut chunks {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        if u64::from_ne_bytes(word) & HIGH_BITS != 0 {
            return false;
        }
    }
    chunks.remainder().iter().all(|&b| b < 0x80)
}

/// Position of the first non-ASCII byte. Errors are [`ErrorKind::TooLarge`].
pub fn validate_with_errors(input: &[u8]) -> TranscodeResult {
    match input.iter().position(|&b| b >= 0x80) {
        Some(pos) => TranscodeResult::err(ErrorKind::TooLarge, pos),
        None => TranscodeResult::ok(input.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_ascii() {
        let input: Vec<u8> = (0..0x80).collect();
        assert!(validate(&input));
        assert!(validate(b""));
        assert_eq!(validate_with_errors(&input), TranscodeResult::ok(0x80));
    }

    #[test]
    fn first_high_byte() {
        for pos in [0, 7, 8, 9, 63, 64] {
            let mut input = vec![b'a'; 70];
            input[pos] = 0x80;
            input[69] = 0xFF;
            assert!(!validate(&input));
            assert_eq!(
                validate_with_errors(&input),
                TranscodeResult::err(ErrorKind::TooLarge, pos)
            );
        }
    }
}
