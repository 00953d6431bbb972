use crate::utils::config::{DEFAULT_OUTPUT, DEFAULT_TOP_LINES};
use std::path::PathBuf;

/// Arguments for the replay command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ReplayArgs {
    /// Recorded trace to replay
    pub trace: PathBuf,

    /// Output path for JSON profile
    pub output_json: PathBuf,

    /// Number of hot lines to include in profile
    pub top_lines: usize,

    /// Print hot-line summary to stdout
    pub print_summary: bool,

    /// Print the full per-line dump to stdout
    pub print_dump: bool,
}

impl Default for ReplayArgs {
    fn default() -> Self {
        Self {
            trace: PathBuf::new(),
            output_json: PathBuf::from(DEFAULT_OUTPUT),
            top_lines: DEFAULT_TOP_LINES,
            print_summary: false,
            print_dump: false,
        }
    }
}
