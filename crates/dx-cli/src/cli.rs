//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Dialectic - convert SQL documents between database dialects
#[derive(Parser, Debug)]
#[command(name = "dx")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override config file path (default: ./dialectic.yml when present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert SQL documents from one dialect to another
    Convert(ConvertArgs),

    /// Show how a document splits into conversion units
    Segment(SegmentArgs),

    /// Score a document and show the strategy each unit would get
    Analyze(AnalyzeArgs),

    /// List supported dialects
    Dialects,
}

/// Arguments for the convert command
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input files or glob patterns (`-` reads stdin)
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Source dialect
    #[arg(short, long)]
    pub from: String,

    /// Target dialect
    #[arg(short, long)]
    pub to: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Keep the rule-based engine's compact output
    #[arg(long)]
    pub no_pretty: bool,

    /// Write each converted document to this directory instead of stdout
    #[arg(long)]
    pub out_dir: Option<String>,

    /// Number of documents converted concurrently
    #[arg(long, default_value = "4")]
    pub threads: usize,

    /// Print conversion statistics at the end
    #[arg(long)]
    pub stats: bool,

    /// Inference service API key
    #[arg(long, env = "DIALECTIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

/// Arguments for the segment command
#[derive(Args, Debug)]
pub struct SegmentArgs {
    /// Input file (`-` reads stdin)
    pub input: String,

    /// Dynamic-SQL wrapper names (comma-separated, overrides config)
    #[arg(short, long, value_delimiter = ',')]
    pub wrappers: Option<Vec<String>>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Input file (`-` reads stdin)
    pub input: String,

    /// Source dialect
    #[arg(short, long)]
    pub from: String,

    /// Target dialect
    #[arg(short, long)]
    pub to: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output formats shared by every command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
