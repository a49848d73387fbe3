//! CLI handler for the `convert` command.

use anyhow::{bail, Context, Result};
use bytemuck::{Pod, Zeroable};
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use turbo_unicode::{encoding::bom, Encoding, Endianness, TranscodeError, TranscodeResult};

use crate::exit_codes;
use crate::input::{self, Text, TextEncoding};

/// Convert a file between Unicode encodings.
#[derive(Debug, Parser)]
pub struct ConvertArgs {
    /// Input file (reads from stdin if omitted)
    pub input: Option<PathBuf>,

    /// Source encoding (detected from the BOM or content if omitted)
    #[arg(short, long)]
    pub from: Option<TextEncoding>,

    /// Target encoding
    #[arg(short, long)]
    pub to: TextEncoding,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Prefix the output with a byte order mark
    #[arg(long)]
    pub bom: bool,
}

/// Run the convert command.
pub fn run(args: ConvertArgs) -> Result<i32> {
    let path = args.input.as_deref();
    let bytes = input::read_named(path)?;
    let name = input::display_name(path);

    let (from, body) = match args.from {
        Some(from) => (from, &bytes[..]),
        None => {
            let (found, rest) = bom::strip(&bytes);
            let guess = found.unwrap_or_else(|| turbo_unicode::autodetect_encoding(&bytes));
            let Some(from) = TextEncoding::from_detected(guess) else {
                bail!("{}: cannot detect encoding, use --from", name);
            };
            log::info!("{}: detected {}", name, from.name());
            (from, rest)
        }
    };

    let text = Text::new(body, from).with_context(|| name.clone())?;
    let converted = match transcode(&text, args.to) {
        Ok(converted) => converted,
        Err(err) => {
            eprintln!("error: {}: {} input: {}", name, from.name(), err);
            return Ok(exit_codes::INVALID);
        }
    };
    log::debug!(
        "{}: {} -> {}, {} bytes out",
        name,
        from.name(),
        args.to.name(),
        converted.len()
    );

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(io::BufWriter::new(
            fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    if args.bom {
        out.write_all(bom_for(args.to).bom_bytes())?;
    }
    out.write_all(&converted)?;
    out.flush()?;
    Ok(exit_codes::SUCCESS)
}

fn bom_for(encoding: TextEncoding) -> Encoding {
    match encoding {
        TextEncoding::Utf8 => Encoding::Utf8,
        TextEncoding::Utf16Le => Encoding::Utf16Le,
        TextEncoding::Utf16Be => Encoding::Utf16Be,
        TextEncoding::Utf32 => Encoding::UTF32_NATIVE,
    }
}

/// Size the output with the length estimator, convert, keep what was written.
fn convert_with<I, O: Pod + Zeroable>(
    input: &[I],
    estimate: usize,
    convert: impl FnOnce(&[I], &mut [O]) -> TranscodeResult,
) -> Result<Vec<u8>, TranscodeError> {
    let mut out = vec![O::zeroed(); estimate];
    let written = convert(input, &mut out).into_result()?;
    out.truncate(written);
    Ok(bytemuck::cast_slice(out.as_slice()).to_vec())
}

/// Encode `text` as `to`, validating it on the way.
fn transcode(text: &Text<'_>, to: TextEncoding) -> Result<Vec<u8>, TranscodeError> {
    use turbo_unicode as tu;

    match (text, to) {
        (Text::Utf8(bytes), TextEncoding::Utf8) => {
            tu::validate_utf8_with_errors(bytes).into_result()?;
            Ok(bytes.to_vec())
        }
        (Text::Utf8(bytes), TextEncoding::Utf16Le | TextEncoding::Utf16Be) => {
            let endianness = endianness_of(to);
            convert_with(*bytes, tu::utf16_length_from_utf8(bytes), |i, o| {
                tu::convert_utf8_to_utf16_with_errors(i, o, endianness)
            })
        }
        (Text::Utf8(bytes), TextEncoding::Utf32) => convert_with(
            *bytes,
            tu::utf32_length_from_utf8(bytes),
            tu::convert_utf8_to_utf32_with_errors,
        ),

        (Text::Utf16(units, from), TextEncoding::Utf8) => {
            let from = *from;
            convert_with(units.as_slice(), tu::utf8_length_from_utf16(units, from), |i, o| {
                tu::convert_utf16_to_utf8_with_errors(i, o, from)
            })
        }
        (Text::Utf16(units, from), TextEncoding::Utf16Le | TextEncoding::Utf16Be) => {
            tu::validate_utf16_with_errors(units, *from).into_result()?;
            if *from == endianness_of(to) {
                return Ok(bytemuck::cast_slice(units.as_slice()).to_vec());
            }
            let mut swapped = vec![0u16; units.len()];
            tu::change_endianness_utf16(units, &mut swapped);
            Ok(bytemuck::cast_slice(swapped.as_slice()).to_vec())
        }
        (Text::Utf16(units, from), TextEncoding::Utf32) => {
            let from = *from;
            convert_with(units.as_slice(), tu::utf32_length_from_utf16(units, from), |i, o| {
                tu::convert_utf16_to_utf32_with_errors(i, o, from)
            })
        }

        (Text::Utf32(units), TextEncoding::Utf8) => convert_with(
            units.as_slice(),
            tu::utf8_length_from_utf32(units),
            tu::convert_utf32_to_utf8_with_errors,
        ),
        (Text::Utf32(units), TextEncoding::Utf16Le | TextEncoding::Utf16Be) => {
            let endianness = endianness_of(to);
            convert_with(units.as_slice(), tu::utf16_length_from_utf32(units), |i, o| {
                tu::convert_utf32_to_utf16_with_errors(i, o, endianness)
            })
        }
        (Text::Utf32(units), TextEncoding::Utf32) => {
            tu::validate_utf32_with_errors(units).into_result()?;
            Ok(bytemuck::cast_slice(units.as_slice()).to_vec())
        }
    }
}

fn endianness_of(encoding: TextEncoding) -> Endianness {
    match encoding {
        TextEncoding::Utf16Be => Endianness::Big,
        TextEncoding::Utf32 => Endianness::NATIVE,
        _ => Endianness::Little,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turbo_unicode::ErrorKind;

    fn utf16_bytes(text: &str, big: bool) -> Vec<u8> {
        text.encode_utf16()
            .flat_map(|u| {
                if big {
                    u.to_be_bytes()
                } else {
                    u.to_le_bytes()
                }
            })
            .collect()
    }

    #[test]
    fn utf8_to_every_target() {
        let text = "Zürich → 東京 ✈️";
        let source = Text::Utf8(text.as_bytes());

        assert_eq!(
            transcode(&source, TextEncoding::Utf8).unwrap(),
            text.as_bytes()
        );
        assert_eq!(
            transcode(&source, TextEncoding::Utf16Le).unwrap(),
            utf16_bytes(text, false)
        );
        assert_eq!(
            transcode(&source, TextEncoding::Utf16Be).unwrap(),
            utf16_bytes(text, true)
        );
        let utf32: Vec<u8> = text
            .chars()
            .flat_map(|c| (c as u32).to_ne_bytes())
            .collect();
        assert_eq!(transcode(&source, TextEncoding::Utf32).unwrap(), utf32);
    }

    #[test]
    fn utf16_byte_order_swap() {
        let le = utf16_bytes("swap 🔁", false);
        let text = Text::new(&le, TextEncoding::Utf16Le).unwrap();
        assert_eq!(
            transcode(&text, TextEncoding::Utf16Be).unwrap(),
            utf16_bytes("swap 🔁", true)
        );
        assert_eq!(
            transcode(&text, TextEncoding::Utf8).unwrap(),
            "swap 🔁".as_bytes()
        );
    }

    #[test]
    fn invalid_source_reports_position() {
        let err = transcode(&Text::Utf8(b"ok\xED\xA0\x80"), TextEncoding::Utf16Le).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Surrogate);
        assert_eq!(err.position, 2);

        let err = transcode(&Text::Utf32(vec![0x41, 0x110000]), TextEncoding::Utf8).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TooLarge);
        assert_eq!(err.position, 1);
    }
}
