//! CLI handler for the `kernels` command.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use crate::exit_codes;

/// List the compiled kernels and which one is active.
#[derive(Debug, Parser)]
pub struct KernelsArgs {
    /// Print a JSON array on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct KernelInfo {
    name: &'static str,
    description: &'static str,
    required: Vec<&'static str>,
    supported: bool,
    active: bool,
}

pub fn run(args: KernelsArgs) -> Result<i32> {
    let active = turbo_unicode::get_active_kernel();
    let infos: Vec<KernelInfo> = turbo_unicode::list_kernels()
        .map(|k| KernelInfo {
            name: k.name(),
            description: k.description(),
            required: k
                .required_features()
                .iter_names()
                .map(|(name, _)| name)
                .collect(),
            supported: k.is_supported(),
            active: k.name() == active,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(exit_codes::SUCCESS);
    }

    println!("host features: {}", turbo_unicode::isa::detect());
    for info in &infos {
        let marker = if info.active {
            "*"
        } else if info.supported {
            " "
        } else {
            "-"
        };
        let required = if info.required.is_empty() {
            "none".to_string()
        } else {
            info.required.join("|")
        };
        println!(
            "{} {:<14} {:<32} requires {}",
            marker, info.name, info.description, required
        );
    }
    if !infos.iter().any(|k| k.active) {
        println!("* {:<14} (forced kernel is not available)", active);
    }
    Ok(exit_codes::SUCCESS)
}
