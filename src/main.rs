//! bprof CLI
//!
//! Replays recorded execution traces through the line profiler and
//! writes per-line self/child time profiles.

use anyhow::Result;
use bprof::commands::{
    display_schema, display_version, execute_replay, validate_args, validate_profile_file,
    ReplayArgs,
};
use bprof::utils::config::{DEFAULT_OUTPUT, DEFAULT_TOP_LINES};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

/// bprof - deterministic line profiler
#[derive(Parser, Debug)]
#[command(name = "bprof")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a recorded trace and write its profile
    Replay {
        /// Recorded trace (JSON)
        #[arg(short, long, env = "BPROF_TRACE")]
        trace: PathBuf,

        /// Output path for JSON profile
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Number of hot lines to include
        #[arg(long, default_value_t = DEFAULT_TOP_LINES)]
        top_lines: usize,

        /// Print hot-line summary to stdout
        #[arg(long)]
        summary: bool,

        /// Print the full per-line dump to stdout
        #[arg(long)]
        dump: bool,
    },

    /// Validate a profile JSON file
    Validate {
        /// Path to profile JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Replay {
            trace,
            output,
            top_lines,
            summary,
            dump,
        } => {
            let args = ReplayArgs {
                trace,
                output_json: output,
                top_lines,
                print_summary: summary,
                print_dump: dump,
            };

            validate_args(&args)?;
            execute_replay(args)?;
        }

        Commands::Validate { file } => {
            validate_profile_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
