//! CLI handlers for the `detect` and `count` commands.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use turbo_unicode::encoding::bom;

use crate::exit_codes;
use crate::input::{self, Text, TextEncoding};

/// Guess the encoding of files from their BOM or content.
#[derive(Debug, Parser)]
pub struct DetectArgs {
    /// Input files (reads from stdin if none provided)
    #[arg(trailing_var_arg = true)]
    pub files: Vec<PathBuf>,

    /// Print one JSON object per input on stdout
    #[arg(long)]
    pub json: bool,
}

/// Count code points and the size of each encoding form.
#[derive(Debug, Parser)]
pub struct CountArgs {
    /// Input files (reads from stdin if none provided)
    #[arg(trailing_var_arg = true)]
    pub files: Vec<PathBuf>,

    /// Encoding of the inputs
    #[arg(short, long, default_value = "utf8")]
    pub encoding: TextEncoding,

    /// Print one JSON object per input on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Detection<'a> {
    file: &'a str,
    bom: Option<String>,
    encoding: String,
    candidates: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Counts<'a> {
    file: &'a str,
    code_points: usize,
    utf8_bytes: usize,
    utf16_units: usize,
    utf32_units: usize,
}

fn inputs(files: &[PathBuf]) -> Vec<Option<&Path>> {
    if files.is_empty() {
        vec![None]
    } else {
        files.iter().map(|p| Some(p.as_path())).collect()
    }
}

/// Run the detect command.
pub fn run_detect(args: DetectArgs) -> Result<i32> {
    let mut code = exit_codes::SUCCESS;
    for path in inputs(&args.files) {
        let name = input::display_name(path);
        let bytes = match input::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("error: {}: {}", name, e);
                code = exit_codes::IO_ERROR;
                continue;
            }
        };

        let detection = Detection {
            file: &name,
            bom: bom::sniff(&bytes).map(|e| e.to_string()),
            encoding: turbo_unicode::autodetect_encoding(&bytes).to_string(),
            candidates: turbo_unicode::detect_encodings(&bytes)
                .encodings()
                .map(|e| e.to_string())
                .collect(),
        };

        if args.json {
            println!("{}", serde_json::to_string(&detection)?);
        } else {
            let bom = detection
                .bom
                .as_deref()
                .map(|b| format!(" (BOM {})", b))
                .unwrap_or_default();
            let candidates = if detection.candidates.is_empty() {
                "none".to_string()
            } else {
                detection.candidates.join(", ")
            };
            println!(
                "{}: {}{} [valid as: {}]",
                name, detection.encoding, bom, candidates
            );
        }
    }
    Ok(code)
}

/// Run the count command.
pub fn run_count(args: CountArgs) -> Result<i32> {
    let mut code = exit_codes::SUCCESS;
    for path in inputs(&args.files) {
        let name = input::display_name(path);
        let bytes = match input::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("error: {}: {}", name, e);
                code = exit_codes::IO_ERROR;
                continue;
            }
        };

        let text = match Text::new(&bytes, args.encoding) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("error: {}: {}", name, e);
                code = code.max(exit_codes::INVALID);
                continue;
            }
        };
        // Counters assume valid input
        if let Err(e) = text.validate().into_result() {
            eprintln!("error: {}: {} in {}", name, e, args.encoding.name());
            code = code.max(exit_codes::INVALID);
            continue;
        }

        let (utf8_bytes, utf16_units, utf32_units) = text.lengths();
        let counts = Counts {
            file: &name,
            code_points: text.count(),
            utf8_bytes,
            utf16_units,
            utf32_units,
        };
        if args.json {
            println!("{}", serde_json::to_string(&counts)?);
        } else {
            println!(
                "{}: {} code points (UTF-8 {} bytes, UTF-16 {} units, UTF-32 {} units)",
                name, counts.code_points, utf8_bytes, utf16_units, utf32_units
            );
        }
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdin_when_no_files() {
        assert_eq!(inputs(&[]), vec![None]);
        let files = vec![PathBuf::from("a.txt")];
        assert_eq!(inputs(&files), vec![Some(Path::new("a.txt"))]);
    }
}
