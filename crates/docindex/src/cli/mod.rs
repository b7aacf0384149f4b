//! Command-line interface for docindex.
//!
//! This module provides the CLI structure for the `docindex` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    CheckCommand, ConfigCommand, IndexCommand, LocateCommand, NavCommand, OutputFormat,
    SearchCommand, SearchModeArg, StatusCommand,
};

/// docindex - Browse and search generated documentation tables
///
/// Parses the navigation tree and search index scripts of a generated
/// documentation site, checks them, and keeps a local index for fast lookup.
#[derive(Debug, Parser)]
#[command(name = "docindex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a documentation site into the index database
    Index(IndexCommand),

    /// Search symbol names
    Search(SearchCommand),

    /// Print the navigation outline
    Nav(NavCommand),

    /// Show the breadcrumb path to a link
    Locate(LocateCommand),

    /// Check a documentation site for well-formedness problems
    Check(CheckCommand),

    /// Show index status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// The configuration file in effect: `--config`, or the default path.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_config_path)
    }

    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                2 => crate::logging::Verbosity::Debug,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
