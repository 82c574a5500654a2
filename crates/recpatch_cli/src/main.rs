//! recpatch CLI
//!
//! Command-line tools for JSON record tables.
//!
//! # Commands
//!
//! - `fingerprint` - Print a table's fingerprint
//! - `inspect` - List records and table statistics
//! - `diff` - Generate a patch set turning one table into another
//! - `apply` - Apply a patch set to a table as one transaction

mod commands;

use clap::{Parser, Subcommand};
use commands::diff::DiffOptions;
use commands::Format;
use recpatch_core::{EngineConfig, SnapshotOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// recpatch record-table tools.
#[derive(Parser)]
#[command(name = "recpatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value = "text")]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the fingerprint of a record table
    Fingerprint {
        /// Record table (JSON)
        table: PathBuf,
    },

    /// List the records of a table
    Inspect {
        /// Record table (JSON)
        table: PathBuf,
    },

    /// Generate a patch set turning BEFORE into AFTER
    Diff {
        /// Earlier record table
        before: PathBuf,

        /// Later record table
        after: PathBuf,

        /// Write the patch set here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Version recorded as the patch set's target
        #[arg(long, default_value = "")]
        target_version: String,

        /// Also diff current values
        #[arg(long)]
        values: bool,

        /// Skip script bodies
        #[arg(long)]
        no_scripts: bool,
    },

    /// Apply a patch set to a table
    Apply {
        /// Record table (JSON)
        table: PathBuf,

        /// Patch set (JSON, patch-response shape)
        patches: PathBuf,

        /// Write the patched table here; without it nothing is written
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Do not revert on failure
        #[arg(long = "unsafe")]
        no_safe_mode: bool,

        /// Match target descriptions ignoring case and surrounding spaces
        #[arg(long)]
        relaxed: bool,

        /// Apply even if the table's fingerprint differs from the one the
        /// patch set requires
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Fingerprint { table } => commands::fingerprint::run(&table, cli.format)?,
        Commands::Inspect { table } => commands::inspect::run(&table, cli.format)?,
        Commands::Diff {
            before,
            after,
            out,
            target_version,
            values,
            no_scripts,
        } => {
            let options = DiffOptions {
                snapshot: SnapshotOptions::default()
                    .include_values(values)
                    .include_scripts(!no_scripts),
                version: target_version,
            };
            commands::diff::run(&before, &after, &options, out.as_deref())?;
        }
        Commands::Apply {
            table,
            patches,
            out,
            no_safe_mode,
            relaxed,
            force,
        } => {
            let config = EngineConfig::new()
                .safe_mode(!no_safe_mode)
                .strict_target_resolution(!relaxed)
                .verify_required_fingerprint(!force);
            commands::apply::run(&table, &patches, config, out.as_deref(), cli.format)?;
        }
    }

    Ok(())
}
