#![allow(clippy::print_stderr)]

mod args;
mod driver;
mod loader;
mod report;
mod scenario;
mod tracing_config;
mod type_syntax;

use anyhow::{Context, Result};
use clap::Parser;
use polyinfer_solver::InferenceLimits;

use crate::args::CliArgs;
use crate::report::Report;

const EXIT_SUCCESS: i32 = 0;
const EXIT_INFERENCE_FAILED: i32 = 1;

fn main() -> Result<()> {
    // Initialize tracing if POLYINFER_LOG or RUST_LOG is set.
    tracing_config::init_tracing();

    let args = CliArgs::parse();
    let source = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("failed to read {}", args.scenario.display()))?;

    let defaults = InferenceLimits::default();
    let limits = InferenceLimits {
        max_iterations: args.max_iterations.unwrap_or(defaults.max_iterations),
        max_nested_depth: args.max_depth.unwrap_or(defaults.max_nested_depth),
    };
    let report = driver::run(&source, limits)
        .with_context(|| format!("failed to load {}", args.scenario.display()))?;

    if args.explain
        && let Report::Failed { errors } = &report
    {
        for error in errors {
            eprintln!("error[{}]: {}", error.code, error.message);
        }
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("failed to serialize report")?;
    println!("{json}");

    let status = if report.is_ok() {
        EXIT_SUCCESS
    } else {
        EXIT_INFERENCE_FAILED
    };
    std::process::exit(status);
}
