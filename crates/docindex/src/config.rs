//! Configuration management for docindex.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::search::SearchMode;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "docindex";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "index.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `DOCINDEX_`)
/// 2. TOML config file at `~/.config/docindex/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Where the generated site lives and how its files are named.
    pub source: SourceConfig,
    /// Search defaults.
    pub search: SearchConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/docindex/index.db`
    pub database_path: Option<PathBuf>,
}

/// Layout of a generated documentation site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Site root used when a command is given none.
    pub doc_root: Option<PathBuf>,
    /// Navigation tree script, relative to the root.
    pub navtree_file: String,
    /// Directory of search table scripts, relative to the root.
    pub search_dir: String,
}

/// Defaults for the `search` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Matching strategy.
    pub mode: SearchMode,
    /// Match case exactly.
    pub case_sensitive: bool,
    /// Maximum number of results.
    pub default_limit: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            doc_root: None,
            navtree_file: "navtreedata.js".to_string(),
            search_dir: "search".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Substring,
            case_sensitive: false,
            default_limit: 20,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("DOCINDEX_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.source.navtree_file.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "source.navtree_file must not be empty".to_string(),
            });
        }

        if self.source.search_dir.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "source.search_dir must not be empty".to_string(),
            });
        }

        if self.search.default_limit == 0 {
            return Err(Error::ConfigValidation {
                message: "search.default_limit must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Resolve the site root: an explicit argument, then the configured
    /// root, then the current directory.
    #[must_use]
    pub fn doc_root(&self, explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(|| self.source.doc_root.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert!(config.source.doc_root.is_none());
        assert_eq!(config.source.navtree_file, "navtreedata.js");
        assert_eq!(config.source.search_dir, "search");
        assert_eq!(config.search.mode, SearchMode::Substring);
        assert!(!config.search.case_sensitive);
        assert_eq!(config.search.default_limit, 20);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_navtree_file() {
        let mut config = Config::default();
        config.source.navtree_file = String::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("navtree_file"));
    }

    #[test]
    fn test_validate_empty_search_dir() {
        let mut config = Config::default();
        config.source.search_dir = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("search_dir"));
    }

    #[test]
    fn test_validate_zero_limit() {
        let mut config = Config::default();
        config.search.default_limit = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("default_limit"));
    }

    #[test]
    fn test_database_path_default() {
        let path = Config::default().database_path();
        assert!(path.to_string_lossy().contains("index.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_doc_root_resolution() {
        let mut config = Config::default();
        assert_eq!(config.doc_root(None), PathBuf::from("."));

        config.source.doc_root = Some(PathBuf::from("/srv/docs"));
        assert_eq!(config.doc_root(None), PathBuf::from("/srv/docs"));
        assert_eq!(
            config.doc_root(Some(PathBuf::from("/tmp/site"))),
            PathBuf::from("/tmp/site")
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("docindex"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_default_data_dir() {
        let path = Config::default_data_dir();
        assert!(path.to_string_lossy().contains("docindex"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        Jail::expect_with(|_| {
            let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [source]
                doc_root = "/srv/fsp"

                [search]
                mode = "prefix"
                default_limit = 5
                "#,
            )?;

            let config = Config::load_from(Some(PathBuf::from("config.toml"))).unwrap();
            assert_eq!(config.source.doc_root, Some(PathBuf::from("/srv/fsp")));
            assert_eq!(config.source.navtree_file, "navtreedata.js");
            assert_eq!(config.search.mode, SearchMode::Prefix);
            assert_eq!(config.search.default_limit, 5);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[search]\ndefault_limit = 5\n")?;
            jail.set_env("DOCINDEX_SEARCH__DEFAULT_LIMIT", 7);
            jail.set_env("DOCINDEX_SEARCH__MODE", "regex");
            jail.set_env("DOCINDEX_SOURCE__SEARCH_DIR", "idx");

            let config = Config::load_from(Some(PathBuf::from("config.toml"))).unwrap();
            assert_eq!(config.search.default_limit, 7);
            assert_eq!(config.search.mode, SearchMode::Regex);
            assert_eq!(config.source.search_dir, "idx");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[search]\ndefault_limit = 0\n")?;

            let err = Config::load_from(Some(PathBuf::from("config.toml"))).unwrap_err();
            assert!(matches!(err, Error::ConfigValidation { .. }));
            Ok(())
        });
    }

    #[test]
    fn test_search_config_deserialize() {
        let json = r#"{"mode": "regex", "case_sensitive": true}"#;
        let search: SearchConfig = serde_json::from_str(json).unwrap();
        assert_eq!(search.mode, SearchMode::Regex);
        assert!(search.case_sensitive);
        assert_eq!(search.default_limit, 20);
    }

    #[test]
    fn test_source_config_serialize() {
        let json = serde_json::to_string(&SourceConfig::default()).unwrap();
        assert!(json.contains("navtree_file"));
        assert!(json.contains("search_dir"));
    }
}
