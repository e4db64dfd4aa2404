//! CLI command definitions using clap.
//!
//! Two subcommands:
//! - load: rebuild the three SQLite databases from their CSVs
//! - chat: start the interactive agent loop (also the default)

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// medagent - query three medical datasets or the web from a terminal agent
#[derive(Parser, Debug)]
#[command(name = "medagent")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebuild the three dataset databases from CSV files
    Load,

    /// Start the interactive question loop (default)
    Chat,
}
