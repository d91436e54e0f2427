// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! `build` writes the workflow document. The other subcommands are the
//! helpers that document calls back into on the execution side.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::stockpile::ArtifactKind;

/// Command-line arguments for `sdmflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sdmflow",
    version,
    about = "Build workflow documents for distribution modelling and stockpile their outputs.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SDMFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Build the workflow document from a config file.
    Build {
        /// Path to the config file (TOML).
        #[arg(long, value_name = "PATH", default_value = "Sdmflow.toml")]
        config: PathBuf,

        /// Where to write the document. Overrides `[workflow].document`.
        #[arg(long, short, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Print the document and execution order instead of writing it.
        #[arg(long)]
        dry_run: bool,
    },

    /// Verify one object's outputs and commit its status to the registry.
    Stockpile {
        #[arg(long, value_enum)]
        kind: ArtifactKind,

        #[arg(long, value_name = "ID")]
        object_id: i64,

        /// Root directory of the file registry.
        #[arg(long, value_name = "DIR")]
        registry: PathBuf,

        /// Status reported by the job that produced the outputs.
        #[arg(long, value_name = "CODE", conflicts_with = "status_file")]
        status: Option<i32>,

        /// File holding the reported status code.
        #[arg(long, value_name = "PATH")]
        status_file: Option<String>,

        /// Success file to write (`1` or `0`).
        success_file: PathBuf,

        /// Output files; the first one is the primary output.
        outputs: Vec<String>,
    },

    /// Stockpile every object listed in a JSON manifest.
    StockpileBatch {
        #[arg(long, value_name = "DIR")]
        registry: PathBuf,

        manifest: PathBuf,

        success_file: PathBuf,
    },

    /// Create missing files as empty files.
    Touch {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Keep only the candidate paths that exist.
    Triage { input: PathBuf, output: PathBuf },
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
