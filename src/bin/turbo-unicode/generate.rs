//! Text generators for benchmarking and testing.
//!
//! Text is drawn from code point ranges typical of a script family, broken
//! into words and lines, then encoded in the requested form. Optional
//! corruption plants invalid units at random positions.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::io::Write;
use std::path::PathBuf;

use crate::exit_codes;
use crate::input::TextEncoding;

/// Generate synthetic text files.
#[derive(Debug, Parser)]
pub struct GenerateArgs {
    /// Approximate UTF-8 size to generate (supports b, kb, mb, gb)
    #[arg(value_parser = crate::parse_size)]
    pub size: usize,

    /// Content pattern
    #[arg(short, long, default_value = "mixed")]
    pub pattern: Pattern,

    /// Output encoding
    #[arg(short, long, default_value = "utf8")]
    pub encoding: TextEncoding,

    /// Number of invalid units to plant
    #[arg(long, default_value = "0")]
    pub corrupt: usize,

    /// Random seed for reproducible generation
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Output file path (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Pattern types for text generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Pattern {
    /// Pure ASCII (1-byte sequences)
    Ascii,
    /// Latin with diacritics (mostly 1- and 2-byte sequences)
    Latin,
    /// Greek and Cyrillic (2-byte sequences)
    GreekCyrillic,
    /// Chinese/Japanese/Korean (3-byte sequences)
    Cjk,
    /// Emoji and historic scripts (4-byte sequences, surrogate pairs in UTF-16)
    Emoji,
    /// Prose with occasional non-ASCII
    Mixed,
    /// Uniform mix of all sequence lengths
    AllLengths,
}

type Range = (u32, u32);

const ASCII_LETTERS: &[Range] = &[(0x61, 0x7A), (0x41, 0x5A), (0x30, 0x39)];
const LATIN: &[Range] = &[(0xC0, 0xFF), (0x100, 0x17F)];
const GREEK_CYRILLIC: &[Range] = &[(0x391, 0x3A9), (0x3B1, 0x3C9), (0x410, 0x44F)];
const CJK: &[Range] = &[(0x4E00, 0x9FFF), (0x3041, 0x3096), (0xAC00, 0xD7A3)];
const SUPPLEMENTARY: &[Range] = &[(0x1F600, 0x1F64F), (0x1F300, 0x1F5FF), (0x10330, 0x1034A)];

impl Pattern {
    /// Ranges to draw from, with the percentage chance of using the second
    /// list instead of plain ASCII letters.
    fn ranges(self) -> (&'static [Range], u32) {
        match self {
            Self::Ascii => (ASCII_LETTERS, 0),
            Self::Latin => (LATIN, 25),
            Self::GreekCyrillic => (GREEK_CYRILLIC, 90),
            Self::Cjk => (CJK, 95),
            Self::Emoji => (SUPPLEMENTARY, 60),
            Self::Mixed => (GREEK_CYRILLIC, 5),
            Self::AllLengths => (ASCII_LETTERS, 0),
        }
    }
}

fn pick(rng: &mut ChaCha8Rng, ranges: &[Range]) -> char {
    let (lo, hi) = ranges[rng.gen_range(0..ranges.len())];
    // Every range above avoids surrogates
    char::from_u32(rng.gen_range(lo..=hi)).unwrap_or('\u{FFFD}')
}

fn next_char(rng: &mut ChaCha8Rng, pattern: Pattern) -> char {
    if pattern == Pattern::AllLengths {
        let family: &[Range] = match rng.gen_range(0..4) {
            0 => ASCII_LETTERS,
            1 => GREEK_CYRILLIC,
            2 => CJK,
            _ => SUPPLEMENTARY,
        };
        return pick(rng, family);
    }
    if pattern == Pattern::Mixed && rng.gen_ratio(1, 50) {
        return pick(rng, SUPPLEMENTARY);
    }
    let (ranges, percent) = pattern.ranges();
    if percent > 0 && rng.gen_range(0..100) < percent {
        pick(rng, ranges)
    } else {
        pick(rng, ASCII_LETTERS)
    }
}

/// Generate text of approximately `target_size` UTF-8 bytes.
pub fn generate_text(target_size: usize, pattern: Pattern, rng: &mut ChaCha8Rng) -> String {
    let mut text = String::with_capacity(target_size + 4);
    let mut line_len = 0;
    while text.len() < target_size {
        let word_len = rng.gen_range(1..=9);
        for _ in 0..word_len {
            text.push(next_char(rng, pattern));
        }
        line_len += word_len + 1;
        if line_len > 72 {
            text.push('\n');
            line_len = 0;
        } else {
            text.push(' ');
        }
    }
    text
}

/// Encode `text`, planting `corrupt` invalid units.
pub fn encode(text: &str, encoding: TextEncoding, corrupt: usize, rng: &mut ChaCha8Rng) -> Vec<u8> {
    match encoding {
        TextEncoding::Utf8 => {
            let mut bytes = text.as_bytes().to_vec();
            for _ in 0..corrupt.min(bytes.len()) {
                let at = rng.gen_range(0..bytes.len());
                bytes[at] = 0xFF;
            }
            bytes
        }
        TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
            let mut units: Vec<u16> = text.encode_utf16().collect();
            for _ in 0..corrupt.min(units.len()) {
                let at = rng.gen_range(0..units.len());
                units[at] = 0xDC00;
            }
            let big = encoding == TextEncoding::Utf16Be;
            units
                .iter()
                .flat_map(|u| {
                    if big {
                        u.to_be_bytes()
                    } else {
                        u.to_le_bytes()
                    }
                })
                .collect()
        }
        TextEncoding::Utf32 => {
            let mut units: Vec<u32> = text.chars().map(u32::from).collect();
            for _ in 0..corrupt.min(units.len()) {
                let at = rng.gen_range(0..units.len());
                units[at] = 0x11_0000;
            }
            units.iter().flat_map(|u| u.to_ne_bytes()).collect()
        }
    }
}

pub fn run(args: GenerateArgs) -> Result<i32> {
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed.unwrap_or_else(rand::random));
    let text = generate_text(args.size, args.pattern, &mut rng);
    let bytes = encode(&text, args.encoding, args.corrupt, &mut rng);

    match &args.output {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("✓ Wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(exit_codes::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn reaches_target_size() {
        for pattern in Pattern::value_variants() {
            let text = generate_text(1000, *pattern, &mut rng());
            assert!(text.len() >= 1000, "{pattern:?}");
            assert!(text.len() < 1100, "{pattern:?}");
        }
    }

    #[test]
    fn ascii_pattern_is_ascii() {
        assert!(generate_text(500, Pattern::Ascii, &mut rng()).is_ascii());
    }

    #[test]
    fn same_seed_same_text() {
        let a = generate_text(300, Pattern::AllLengths, &mut rng());
        let b = generate_text(300, Pattern::AllLengths, &mut rng());
        assert_eq!(a, b);
    }

    #[test]
    fn corruption_is_detected() {
        let text = generate_text(400, Pattern::Cjk, &mut rng());

        let utf8 = encode(&text, TextEncoding::Utf8, 1, &mut rng());
        assert!(!turbo_unicode::validate_utf8(&utf8));

        let clean = encode(&text, TextEncoding::Utf32, 0, &mut rng());
        let units: Vec<u32> = clean
            .chunks_exact(4)
            .map(|q| u32::from_ne_bytes([q[0], q[1], q[2], q[3]]))
            .collect();
        assert!(turbo_unicode::validate_utf32(&units));
    }
}
