//! Error types for docindex.
//!
//! This module defines all error types used throughout the docindex crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for docindex operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Parse Errors ===
    /// The data script is not a well-formed sequence of literal assignments.
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        /// 1-based line of the offending token.
        line: usize,
        /// 1-based column of the offending token.
        column: usize,
        /// Description of what was expected.
        message: String,
    },

    /// A required variable is not assigned in the script.
    #[error("variable '{name}' not found")]
    MissingVariable {
        /// Name of the variable.
        name: String,
    },

    /// A literal parsed but does not have the expected shape.
    #[error("malformed value at {path}: {message}")]
    Shape {
        /// Location of the value, e.g. `NAVTREE[0][2]`.
        path: String,
        /// Description of the mismatch.
        message: String,
    },

    /// A regex search pattern failed to compile.
    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// Failed to read a documentation asset.
    #[error("failed to read {path}: {source}")]
    ReadFile {
        /// Path of the file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for docindex operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new syntax error at the given position.
    #[must_use]
    pub fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a new shape error for the value at `path`.
    #[must_use]
    pub fn shape(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Shape {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a missing variable error.
    #[must_use]
    pub fn missing_variable(name: impl Into<String>) -> Self {
        Self::MissingVariable { name: name.into() }
    }

    /// Check if this error came from parsing a data asset.
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::Syntax { .. } | Self::Shape { .. } | Self::MissingVariable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = Error::syntax(3, 14, "expected ']'");
        assert_eq!(err.to_string(), "syntax error at 3:14: expected ']'");
    }

    #[test]
    fn test_shape_error_display() {
        let err = Error::shape("NAVTREE[0][1]", "label must be a string");
        let msg = err.to_string();
        assert!(msg.contains("NAVTREE[0][1]"));
        assert!(msg.contains("label must be a string"));
    }

    #[test]
    fn test_missing_variable_display() {
        let err = Error::missing_variable("searchData");
        assert_eq!(err.to_string(), "variable 'searchData' not found");
    }

    #[test]
    fn test_is_parse_error() {
        assert!(Error::syntax(1, 1, "x").is_parse_error());
        assert!(Error::shape("a", "b").is_parse_error());
        assert!(Error::missing_variable("NAVTREE").is_parse_error());
        assert!(!Error::ConfigValidation {
            message: "x".to_string()
        }
        .is_parse_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_read_file_error_display() {
        let err = Error::ReadFile {
            path: PathBuf::from("/docs/navtreedata.js"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/docs/navtreedata.js"));
    }

    #[test]
    fn test_from_regex_error() {
        let regex_err = regex::Regex::new("[unclosed").unwrap_err();
        let err: Error = regex_err.into();
        assert!(matches!(err, Error::Pattern(_)));
        assert!(err.to_string().starts_with("invalid search pattern"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "default_limit must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("default_limit"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
