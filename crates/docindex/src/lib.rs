//! `docindex` - Parse, check and search generated documentation tables
//!
//! Documentation generators ship a site's sidebar outline and its
//! client-side search index as script files full of literal arrays. This
//! library parses those scripts into typed values, answers the lookups a
//! documentation viewer performs, and can persist a site into a local
//! `SQLite` index.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod docset;
pub mod error;
pub mod literal;
pub mod logging;
pub mod nav;
pub mod search;
pub mod storage;

pub use config::Config;
pub use docset::{CheckReport, DocSet};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use nav::{NavChildren, NavNode, NavTree};
pub use search::{SearchEntry, SearchIndex, SearchMode, SearchQuery};
pub use storage::{ImportOutcome, Storage, StorageStats};
