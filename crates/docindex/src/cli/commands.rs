//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Index command arguments.
#[derive(Debug, Args)]
pub struct IndexCommand {
    /// Documentation site root (defaults to the configured root)
    pub root: Option<PathBuf>,

    /// Reimport even if the source files are unchanged
    #[arg(short, long)]
    pub force: bool,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// The search query
    pub query: String,

    /// Search the site files under this root instead of the index database
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Matching strategy (the index supports only substring)
    #[arg(short, long, value_enum)]
    pub mode: Option<SearchModeArg>,

    /// Match case exactly (requires --root)
    #[arg(long)]
    pub case_sensitive: bool,

    /// Restrict to one category, e.g. "functions" or "enums"
    #[arg(long)]
    pub category: Option<String>,

    /// Restrict to entries defined in this header file
    #[arg(long, value_name = "HEADER")]
    pub file: Option<String>,

    /// Maximum number of results (0 for unlimited)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

impl SearchCommand {
    /// Flags given on the command line that the index database cannot
    /// honour. Empty when searching files with `--root`.
    #[must_use]
    pub fn index_unsupported_options(&self) -> Vec<&'static str> {
        let mut unsupported = Vec::new();
        if self.root.is_some() {
            return unsupported;
        }
        if matches!(self.mode, Some(SearchModeArg::Prefix | SearchModeArg::Regex)) {
            unsupported.push("--mode");
        }
        if self.case_sensitive {
            unsupported.push("--case-sensitive");
        }
        unsupported
    }
}

/// Nav command arguments.
#[derive(Debug, Args)]
pub struct NavCommand {
    /// Documentation site root
    pub root: Option<PathBuf>,

    /// Deepest level to print (roots are level 0)
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Locate command arguments.
#[derive(Debug, Args)]
pub struct LocateCommand {
    /// Link to find, e.g. "index.html#introduction-overview"
    pub link: String,

    /// Documentation site root; without it the index database is used
    pub root: Option<PathBuf>,
}

/// Check command arguments.
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Documentation site root
    pub root: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Search mode argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchModeArg {
    /// Match anywhere in the name or key
    Substring,
    /// Match the start of the name or key
    Prefix,
    /// Treat the query as a regular expression
    Regex,
}

impl From<SearchModeArg> for crate::search::SearchMode {
    fn from(arg: SearchModeArg) -> Self {
        match arg {
            SearchModeArg::Substring => Self::Substring,
            SearchModeArg::Prefix => Self::Prefix,
            SearchModeArg::Regex => Self::Regex,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchMode;

    #[test]
    fn test_search_mode_arg_conversion() {
        assert_eq!(SearchMode::from(SearchModeArg::Substring), SearchMode::Substring);
        assert_eq!(SearchMode::from(SearchModeArg::Prefix), SearchMode::Prefix);
        assert_eq!(SearchMode::from(SearchModeArg::Regex), SearchMode::Regex);
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_search_command_debug() {
        let cmd = SearchCommand {
            query: "spi_open".to_string(),
            root: None,
            mode: None,
            case_sensitive: false,
            category: None,
            file: None,
            limit: Some(5),
            format: OutputFormat::Table,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("query"));
        assert!(debug_str.contains("spi_open"));
    }

    fn search_command() -> SearchCommand {
        SearchCommand {
            query: "spi".to_string(),
            root: None,
            mode: None,
            case_sensitive: false,
            category: None,
            file: None,
            limit: None,
            format: OutputFormat::Table,
        }
    }

    #[test]
    fn test_index_unsupported_options() {
        let mut cmd = search_command();
        cmd.mode = Some(SearchModeArg::Substring);
        cmd.file = Some("r_spi.h".to_string());
        assert!(cmd.index_unsupported_options().is_empty());

        cmd.mode = Some(SearchModeArg::Regex);
        cmd.case_sensitive = true;
        assert_eq!(
            cmd.index_unsupported_options(),
            vec!["--mode", "--case-sensitive"]
        );

        cmd.root = Some(PathBuf::from("/srv/docs"));
        assert!(cmd.index_unsupported_options().is_empty());
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        assert!(format!("{cmd:?}").contains("Show"));
    }
}
