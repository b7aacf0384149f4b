//! `SQLite` schema definitions for docindex.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// Files the stored index was built from.
pub const CREATE_SOURCES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS sources (
    path TEXT PRIMARY KEY,
    fingerprint TEXT NOT NULL,
    indexed_at TEXT NOT NULL
)
";

/// Navigation nodes; `parent_id` is NULL for roots.
pub const CREATE_NAV_NODES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS nav_nodes (
    id INTEGER PRIMARY KEY,
    parent_id INTEGER REFERENCES nav_nodes(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    depth INTEGER NOT NULL,
    label TEXT NOT NULL,
    link TEXT,
    deferred TEXT
)
";

/// Index on `parent_id` for child listing.
pub const CREATE_NAV_PARENT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_nav_nodes_parent ON nav_nodes(parent_id, position)
";

/// Index on `link` for breadcrumb lookup.
pub const CREATE_NAV_LINK_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_nav_nodes_link ON nav_nodes(link)
";

/// Search entries.
pub const CREATE_SEARCH_ENTRIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS search_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT NOT NULL,
    decoded_key TEXT NOT NULL,
    name TEXT NOT NULL,
    category TEXT NOT NULL
)
";

/// Index on `category` for filtering.
pub const CREATE_SEARCH_CATEGORY_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_search_entries_category ON search_entries(category)
";

/// Index on `decoded_key` for exact and prefix lookups.
pub const CREATE_SEARCH_DECODED_KEY_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_search_entries_decoded_key ON search_entries(decoded_key)
";

/// Link targets of search entries.
pub const CREATE_SEARCH_TARGETS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS search_targets (
    entry_id INTEGER NOT NULL REFERENCES search_entries(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    link TEXT NOT NULL,
    local INTEGER NOT NULL,
    source TEXT
)
";

/// Index on `entry_id` for target lookup.
pub const CREATE_SEARCH_TARGETS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_search_targets_entry ON search_targets(entry_id, position)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_SOURCES_TABLE,
    CREATE_NAV_NODES_TABLE,
    CREATE_NAV_PARENT_INDEX,
    CREATE_NAV_LINK_INDEX,
    CREATE_SEARCH_ENTRIES_TABLE,
    CREATE_SEARCH_CATEGORY_INDEX,
    CREATE_SEARCH_DECODED_KEY_INDEX,
    CREATE_SEARCH_TARGETS_TABLE,
    CREATE_SEARCH_TARGETS_INDEX,
    CREATE_METADATA_TABLE,
];
