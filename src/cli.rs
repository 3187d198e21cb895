// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! `metricdag` is a library; the CLI surface is embeddable. A downstream
//! binary registers its metrics and producers, then hands the parsed args
//! to [`crate::run`]:
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     let args = metricdag::cli::parse();
//!     metricdag::logging::init_logging(args.log_level)?;
//!     let (registry, container) = my_pipeline::declare();
//!     metricdag::run(args, registry, container)
//! }
//! ```

use clap::{Parser, ValueEnum};

/// Command-line arguments for a metricdag-driven binary.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "metricdag",
    version,
    about = "Run metrics over a DAG of shared artifact producers.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Metricdag.toml` in the current working directory; a
    /// missing file falls back to built-in defaults.
    #[arg(long, value_name = "PATH", default_value = "Metricdag.toml")]
    pub config: String,

    /// Metric to run; repeat for several. Without this flag the
    /// `[run].metrics` list from config is used, and failing that, every
    /// registered metric.
    #[arg(long = "metric", value_name = "NAME")]
    pub metrics: Vec<String>,

    /// Override the auto-cache threshold from config.
    #[arg(long, value_name = "N")]
    pub threshold: Option<usize>,

    /// Resolve and print the per-metric execution plan, but don't execute
    /// any compute function.
    #[arg(long)]
    pub dry_run: bool,

    /// Validate every registration against the container and print all
    /// problems, without running anything.
    #[arg(long)]
    pub check: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `METRICDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
