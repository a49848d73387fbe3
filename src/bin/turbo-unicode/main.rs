//! turbo-unicode CLI: validate, convert and inspect Unicode text.

use anyhow::{bail, Result};
use clap::{ArgAction, Parser, Subcommand};

mod convert;
mod detect;
mod generate;
mod input;
mod kernels;
mod validate;

/// Process exit codes shared by every command.
pub mod exit_codes {
    /// Every input was valid
    pub const SUCCESS: i32 = 0;
    /// At least one input failed validation
    pub const INVALID: i32 = 1;
    /// An input could not be read or an output written
    pub const IO_ERROR: i32 = 2;
}

#[derive(Debug, Parser)]
#[command(name = "turbo-unicode")]
#[command(about = "SIMD-accelerated Unicode validation and transcoding", long_about = None)]
#[command(version)]
struct Cli {
    /// Use this kernel instead of the best one for the host
    #[arg(short, long, global = true, value_name = "NAME")]
    kernel: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate files against an encoding
    Validate(validate::ValidateArgs),
    /// Convert a file between encodings
    Convert(convert::ConvertArgs),
    /// Guess the encoding of files
    Detect(detect::DetectArgs),
    /// Count code points and encoded lengths
    Count(detect::CountArgs),
    /// List kernels and host CPU features
    Kernels(kernels::KernelsArgs),
    /// Generate synthetic text for benchmarking and testing
    Generate(generate::GenerateArgs),
}

/// Parse a size such as `1024`, `64kb` or `2GB` into bytes.
pub fn parse_size(s: &str) -> Result<usize, String> {
    let s = s.trim().to_lowercase();
    if let Ok(bytes) = s.parse::<usize>() {
        return Ok(bytes);
    }

    let units: [(&str, usize); 4] = [("gb", 1 << 30), ("mb", 1 << 20), ("kb", 1 << 10), ("b", 1)];
    let Some((number, scale)) = units
        .iter()
        .find_map(|(suffix, scale)| s.strip_suffix(suffix).map(|n| (n, *scale)))
    else {
        return Err(format!(
            "invalid size '{}': use a form like '1mb', '512KB' or '1024'",
            s
        ));
    };

    number
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_mul(scale))
        .ok_or_else(|| format!("invalid number in size '{}'", s))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(name) = &cli.kernel {
        if !turbo_unicode::set_active_kernel(name) {
            let available: Vec<&str> = turbo_unicode::list_kernels()
                .filter(|k| k.is_supported())
                .map(|k| k.name())
                .collect();
            bail!(
                "kernel '{}' is unknown or unsupported here (available: {})",
                name,
                available.join(", ")
            );
        }
    }
    log::info!("using kernel {}", turbo_unicode::get_active_kernel());

    match cli.command {
        Command::Validate(args) => validate::run(args),
        Command::Convert(args) => convert::run(args),
        Command::Detect(args) => detect::run_detect(args),
        Command::Count(args) => detect::run_count(args),
        Command::Kernels(args) => kernels::run(args),
        Command::Generate(args) => generate::run(args),
    }
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(exit_codes::IO_ERROR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("4096").unwrap(), 4096);
        assert_eq!(parse_size("7b").unwrap(), 7);
        assert_eq!(parse_size("7B").unwrap(), 7);
        assert_eq!(parse_size("64kb").unwrap(), 64 * 1024);
        assert_eq!(parse_size("64Kb").unwrap(), 64 * 1024);
        assert_eq!(parse_size("3MB").unwrap(), 3 * 1024 * 1024);
        assert_eq!(parse_size("2gb").unwrap(), 2 << 30);
        assert_eq!(parse_size("  8 kb ").unwrap(), 8 * 1024);

        assert!(parse_size("").is_err());
        assert!(parse_size("lots").is_err());
        assert!(parse_size("5tb").is_err());
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::try_parse_from(["turbo-unicode", "-vv", "--kernel", "scalar", "kernels"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.kernel.as_deref(), Some("scalar"));
        assert!(matches!(cli.command, Command::Kernels(_)));
    }
}
