//! CLI handler for the `validate` command.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use turbo_unicode::{ErrorKind, TranscodeResult};

use crate::exit_codes;
use crate::input::{self, Text, TextEncoding};

/// Validate files as UTF-8, UTF-16, UTF-32 or ASCII.
#[derive(Debug, Parser)]
pub struct ValidateArgs {
    /// Input files to validate (reads from stdin if none provided)
    #[arg(trailing_var_arg = true)]
    pub files: Vec<PathBuf>,

    /// Encoding to validate against
    #[arg(short, long, default_value = "utf8")]
    pub encoding: ValidateEncoding,

    /// Quiet mode: exit code only, no output
    #[arg(short, long)]
    pub quiet: bool,

    /// Print one JSON object per input on stdout
    #[arg(long)]
    pub json: bool,

    /// Force color output even when not a TTY
    #[arg(short = 'C', long = "color")]
    pub color: bool,

    /// Disable color output
    #[arg(short = 'M', long = "no-color")]
    pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ValidateEncoding {
    #[value(name = "utf8", alias = "utf-8")]
    Utf8,
    #[value(name = "utf16le", alias = "utf-16le")]
    Utf16Le,
    #[value(name = "utf16be", alias = "utf-16be")]
    Utf16Be,
    #[value(name = "utf32", alias = "utf-32")]
    Utf32,
    Ascii,
}

impl ValidateEncoding {
    fn text(self) -> Option<TextEncoding> {
        match self {
            Self::Utf8 => Some(TextEncoding::Utf8),
            Self::Utf16Le => Some(TextEncoding::Utf16Le),
            Self::Utf16Be => Some(TextEncoding::Utf16Be),
            Self::Utf32 => Some(TextEncoding::Utf32),
            Self::Ascii => None,
        }
    }

    fn name(self) -> &'static str {
        self.text().map_or("ASCII", TextEncoding::name)
    }

    fn unit_size(self) -> usize {
        self.text().map_or(1, TextEncoding::unit_size)
    }
}

/// ANSI color codes for error output.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const ERROR: &str = "\x1b[1;31m"; // Bold red
    pub const LOCATION: &str = "\x1b[1;34m"; // Bold blue
    pub const MESSAGE: &str = "\x1b[0;33m"; // Yellow
}

/// Color scheme that can be disabled.
struct ColorScheme {
    error: &'static str,
    location: &'static str,
    message: &'static str,
    reset: &'static str,
}

impl ColorScheme {
    fn new(use_color: bool) -> Self {
        if use_color {
            Self {
                error: colors::ERROR,
                location: colors::LOCATION,
                message: colors::MESSAGE,
                reset: colors::RESET,
            }
        } else {
            Self {
                error: "",
                location: "",
                message: "",
                reset: "",
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    file: &'a str,
    encoding: &'static str,
    valid: bool,
    /// Units validated on success, error position on failure
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorKind>,
}

/// Run the validate command.
pub fn run(args: ValidateArgs) -> Result<i32> {
    let use_color = if args.no_color {
        false
    } else if args.color {
        true
    } else {
        atty::is(atty::Stream::Stderr)
    };
    let scheme = ColorScheme::new(use_color);

    let paths: Vec<Option<&Path>> = if args.files.is_empty() {
        vec![None]
    } else {
        args.files.iter().map(|p| Some(p.as_path())).collect()
    };

    let mut any_invalid = false;
    let mut any_io_error = false;

    for path in paths {
        let name = input::display_name(path);
        let bytes = match input::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                any_io_error = true;
                if !args.quiet {
                    eprintln!("{}error{}: {}: {}", scheme.error, scheme.reset, name, e);
                }
                continue;
            }
        };

        let result = validate_bytes(&bytes, args.encoding);
        log::debug!("{}: {:?}", name, result);
        if result.is_err() {
            any_invalid = true;
        }

        if args.json {
            let report = Report {
                file: &name,
                encoding: args.encoding.name(),
                valid: result.is_ok(),
                count: result.count,
                error: result.is_err().then_some(result.error),
            };
            println!("{}", serde_json::to_string(&report)?);
        } else if result.is_err() && !args.quiet {
            print_error(result, &bytes, &name, args.encoding, &scheme);
        }
    }

    if any_io_error {
        Ok(exit_codes::IO_ERROR)
    } else if any_invalid {
        Ok(exit_codes::INVALID)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

/// Validate raw bytes. A trailing partial unit is reported as `TooShort`.
fn validate_bytes(bytes: &[u8], encoding: ValidateEncoding) -> TranscodeResult {
    let Some(text_encoding) = encoding.text() else {
        return turbo_unicode::validate_ascii_with_errors(bytes);
    };
    let size = text_encoding.unit_size();
    let whole = bytes.len() - bytes.len() % size;
    let result = match Text::new(&bytes[..whole], text_encoding) {
        Ok(text) => text.validate(),
        Err(_) => TranscodeResult::err(ErrorKind::Other, 0),
    };
    if result.is_ok() && whole != bytes.len() {
        return TranscodeResult::err(ErrorKind::TooShort, whole / size);
    }
    result
}

/// Print a formatted error message with its location.
fn print_error(
    result: TranscodeResult,
    bytes: &[u8],
    name: &str,
    encoding: ValidateEncoding,
    scheme: &ColorScheme,
) {
    let unit = encoding.unit_size();
    let offset = result.count * unit;
    let unit_bytes = bytes
        .get(offset..(offset + unit).min(bytes.len()))
        .unwrap_or(&[]);

    eprintln!(
        "{}error{}: {}{}",
        scheme.error,
        scheme.reset,
        describe(result.error, encoding),
        format_unit(unit_bytes)
    );

    let location = if encoding == ValidateEncoding::Utf8 || encoding == ValidateEncoding::Ascii {
        let (line, column) = line_and_column(&bytes[..offset.min(bytes.len())]);
        format!("{}:{}:{}", name, line, column)
    } else {
        format!("{}: unit {} (byte offset {})", name, result.count, offset)
    };
    eprintln!("  {}--> {}{}", scheme.location, location, scheme.reset);

    if let Some(hint) = hint(result.error) {
        eprintln!("  {}{}{}", scheme.message, hint, scheme.reset);
    }
    eprintln!();
}

fn describe(kind: ErrorKind, encoding: ValidateEncoding) -> String {
    match (kind, encoding) {
        (ErrorKind::TooLarge, ValidateEncoding::Ascii) => "non-ASCII byte".to_string(),
        (ErrorKind::Surrogate, ValidateEncoding::Utf16Le | ValidateEncoding::Utf16Be) => {
            "unpaired UTF-16 surrogate".to_string()
        }
        (ErrorKind::TooShort, ValidateEncoding::Utf8) => "truncated UTF-8 sequence".to_string(),
        (ErrorKind::TooShort, _) => format!("trailing partial {} unit", encoding.name()),
        (kind, _) => format!("{} in {}", kind, encoding.name()),
    }
}

fn format_unit(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }
    let hex: Vec<String> = bytes.iter().map(|b| format!("{:02X}", b)).collect();
    format!(" (bytes {})", hex.join(" "))
}

fn hint(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::TooLong => Some("bytes 0x80-0xBF are continuation bytes"),
        ErrorKind::Overlong => Some("use shortest possible encoding"),
        ErrorKind::Surrogate => Some("U+D800-U+DFFF are reserved for UTF-16 pairs"),
        ErrorKind::TooLarge => Some("maximum is U+10FFFF, so bytes 0xF5-0xFF never lead"),
        _ => None,
    }
}

/// One-based line and column (in characters) of the end of `prefix`.
fn line_and_column(prefix: &[u8]) -> (usize, usize) {
    let line = 1 + prefix.iter().filter(|&&b| b == b'\n').count();
    let line_start = prefix
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1);
    let column = 1 + turbo_unicode::count_utf8(&prefix[line_start..]);
    (line, column)
}
