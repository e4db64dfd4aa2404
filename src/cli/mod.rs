//! CLI module for medagent - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
