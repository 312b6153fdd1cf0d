use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for the polyinfer binary.
#[derive(Parser, Debug)]
#[command(
    name = "polyinfer",
    version,
    about = "Infer type arguments of generic calls described by a JSON scenario"
)]
pub struct CliArgs {
    /// Scenario file: class table, methods, expression tree and target type.
    pub scenario: PathBuf,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pub pretty: bool,

    /// Fixpoint iterations allowed per inference session.
    #[arg(long = "max-iterations", alias = "maxIterations")]
    pub max_iterations: Option<u32>,

    /// Maximum nesting depth of generic calls.
    #[arg(long = "max-depth", alias = "maxDepth")]
    pub max_depth: Option<u32>,

    /// Print failure messages to stderr in addition to the report.
    #[arg(long)]
    pub explain: bool,
}
