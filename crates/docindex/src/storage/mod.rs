//! Storage layer for docindex.
//!
//! This module provides `SQLite`-based persistent storage for a loaded
//! documentation site, so that search and breadcrumb lookups do not need to
//! reparse the generated scripts. Re-imports are skipped when the source
//! file fingerprints are unchanged.

pub mod migrations;
pub mod schema;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::Serialize;
use tracing::{debug, info};

use crate::docset::DocSet;
use crate::error::{Error, Result};
use crate::nav::{NavChildren, NavNode};
use crate::search::SearchTarget;

/// Storage engine for an indexed documentation site.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

/// What [`Storage::import`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ImportOutcome {
    /// Every source fingerprint matched; nothing was written.
    Unchanged,
    /// The stored index was replaced.
    Imported {
        /// Navigation nodes written.
        nav_nodes: usize,
        /// Search entries written.
        search_entries: usize,
    },
}

/// A navigation node as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredNavNode {
    /// Row id; assigned in pre-order so lower ids come first in the tree.
    pub id: i64,
    /// Parent row id, `None` for roots.
    pub parent_id: Option<i64>,
    /// Distance from the root.
    pub depth: i64,
    /// Text shown in the sidebar.
    pub label: String,
    /// Target link.
    pub link: Option<String>,
    /// Name of the deferred subtree script, if any.
    pub deferred: Option<String>,
}

/// A search entry as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredEntry {
    /// Escaped lookup key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Category the entry was loaded from.
    pub category: String,
    /// Link targets in table order.
    pub targets: Vec<SearchTarget>,
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
fn like_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;
        migrations::initialize_schema(&conn)?;

        debug!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the stored index was built from exactly these source files.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn is_current(&self, docset: &DocSet) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT path, fingerprint FROM sources")?;
        let stored = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<std::result::Result<BTreeMap<_, _>, _>>()?;

        let loaded: BTreeMap<String, String> = docset
            .sources
            .iter()
            .map(|s| (s.path.clone(), s.fingerprint.clone()))
            .collect();

        Ok(!stored.is_empty() && stored == loaded)
    }

    /// Replace the stored index with `docset`.
    ///
    /// Unless `force` is set, nothing is written when the stored fingerprints
    /// match the loaded files.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails. The previous index
    /// is kept in that case.
    pub fn import(&mut self, docset: &DocSet, force: bool) -> Result<ImportOutcome> {
        if !force && self.is_current(docset)? {
            info!("Index is up to date with {}", docset.root.display());
            return Ok(ImportOutcome::Unchanged);
        }

        let tx = self.conn.transaction()?;
        clear_tables(&tx)?;

        let indexed_at = Utc::now().to_rfc3339();
        for source in &docset.sources {
            tx.execute(
                "INSERT INTO sources (path, fingerprint, indexed_at) VALUES (?1, ?2, ?3)",
                params![source.path, source.fingerprint, indexed_at],
            )?;
        }

        let mut nav_nodes = 0;
        for (position, root) in docset.nav.roots.iter().enumerate() {
            nav_nodes += insert_nav_node(&tx, root, None, position, 0)?;
        }

        let mut search_entries = 0;
        for indexed in docset.search.entries() {
            let entry = &indexed.entry;
            tx.execute(
                r"
                INSERT INTO search_entries (key, decoded_key, name, category)
                VALUES (?1, ?2, ?3, ?4)
                ",
                params![entry.key, entry.decoded_key(), entry.name, indexed.category],
            )?;
            let entry_id = tx.last_insert_rowid();
            for (position, target) in entry.targets.iter().enumerate() {
                tx.execute(
                    r"
                    INSERT INTO search_targets (entry_id, position, link, local, source)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ",
                    params![
                        entry_id,
                        i64::try_from(position).unwrap_or(i64::MAX),
                        target.link,
                        target.local,
                        target.source,
                    ],
                )?;
            }
            search_entries += 1;
        }

        tx.commit()?;
        info!(
            "Indexed {} navigation nodes and {} search entries",
            nav_nodes, search_entries
        );
        Ok(ImportOutcome::Imported {
            nav_nodes,
            search_entries,
        })
    }

    /// Search stored entries by decoded key or display name.
    ///
    /// Case-insensitive substring match. Exact matches come first, then
    /// prefix matches, then the rest, each group ordered by name. `source`
    /// keeps only entries with a target declared in that header file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn search(
        &self,
        text: &str,
        category: Option<&str>,
        source: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StoredEntry>> {
        let escaped = like_escape(text);
        let contains = format!("%{escaped}%");
        let prefix = format!("{escaped}%");
        let limit_i64 = if limit == 0 {
            -1
        } else {
            i64::try_from(limit).unwrap_or(i64::MAX)
        };

        let mut stmt = self.conn.prepare(
            r"
            SELECT id, key, name, category FROM search_entries
            WHERE (decoded_key LIKE ?1 ESCAPE '\' OR name LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR category = ?2)
              AND (?6 IS NULL OR EXISTS (
                SELECT 1 FROM search_targets t
                WHERE t.entry_id = search_entries.id AND t.source = ?6
              ))
            ORDER BY
              CASE
                WHEN lower(name) = lower(?3) OR lower(decoded_key) = lower(?3) THEN 0
                WHEN name LIKE ?4 ESCAPE '\' OR decoded_key LIKE ?4 ESCAPE '\' THEN 1
                ELSE 2
              END,
              name, id
            LIMIT ?5
            ",
        )?;

        let rows = stmt
            .query_map(params![contains, category, text, prefix, limit_i64, source], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    StoredEntry {
                        key: row.get(1)?,
                        name: row.get(2)?,
                        category: row.get(3)?,
                        targets: Vec::new(),
                    },
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, mut entry)| {
                entry.targets = self.targets_of(id)?;
                Ok(entry)
            })
            .collect()
    }

    fn targets_of(&self, entry_id: i64) -> Result<Vec<SearchTarget>> {
        let mut stmt = self.conn.prepare_cached(
            r"
            SELECT link, local, source FROM search_targets
            WHERE entry_id = ?1 ORDER BY position
            ",
        )?;
        let targets = stmt
            .query_map([entry_id], |row| {
                Ok(SearchTarget {
                    link: row.get(0)?,
                    local: row.get(1)?,
                    source: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(targets)
    }

    /// Children of `parent` in display order; `None` lists the roots.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn nav_children(&self, parent: Option<i64>) -> Result<Vec<StoredNavNode>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, parent_id, depth, label, link, deferred FROM nav_nodes
            WHERE parent_id IS ?1 ORDER BY position
            ",
        )?;
        let nodes = stmt
            .query_map([parent], Self::row_to_nav_node)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    /// Breadcrumb path from a root to the first node linking to `link`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn locate(&self, link: &str) -> Result<Option<Vec<StoredNavNode>>> {
        let first = self
            .conn
            .query_row(
                r"
                SELECT id, parent_id, depth, label, link, deferred FROM nav_nodes
                WHERE link = ?1 ORDER BY id LIMIT 1
                ",
                [link],
                Self::row_to_nav_node,
            )
            .optional()?;

        let Some(node) = first else {
            return Ok(None);
        };

        let mut path = vec![node];
        while let Some(parent_id) = path.last().and_then(|n| n.parent_id) {
            let parent = self.conn.query_row(
                "SELECT id, parent_id, depth, label, link, deferred FROM nav_nodes WHERE id = ?1",
                [parent_id],
                Self::row_to_nav_node,
            )?;
            path.push(parent);
        }
        path.reverse();
        Ok(Some(path))
    }

    /// Remove everything that was imported.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        clear_tables(&tx)?;
        tx.commit()?;
        info!("Cleared index at {}", self.path.display());
        Ok(())
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let count = |table: &str| -> Result<i64> {
            Ok(self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?)
        };

        let last_indexed: Option<String> = self
            .conn
            .query_row("SELECT MAX(indexed_at) FROM sources", [], |row| row.get(0))
            .optional()?
            .flatten();

        let last_indexed = last_indexed
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            sources: count("sources")?,
            nav_nodes: count("nav_nodes")?,
            search_entries: count("search_entries")?,
            search_targets: count("search_targets")?,
            last_indexed,
            db_size_bytes,
        })
    }

    fn row_to_nav_node(row: &rusqlite::Row) -> rusqlite::Result<StoredNavNode> {
        Ok(StoredNavNode {
            id: row.get(0)?,
            parent_id: row.get(1)?,
            depth: row.get(2)?,
            label: row.get(3)?,
            link: row.get(4)?,
            deferred: row.get(5)?,
        })
    }
}

fn clear_tables(tx: &Transaction<'_>) -> Result<()> {
    tx.execute_batch(
        r"
        DELETE FROM search_targets;
        DELETE FROM search_entries;
        DELETE FROM nav_nodes;
        DELETE FROM sources;
        ",
    )?;
    Ok(())
}

/// Insert `node` and its inline descendants; returns the number of rows written.
fn insert_nav_node(
    tx: &Transaction<'_>,
    node: &NavNode,
    parent_id: Option<i64>,
    position: usize,
    depth: usize,
) -> Result<usize> {
    let deferred = match &node.children {
        NavChildren::Deferred(name) => Some(name.as_str()),
        _ => None,
    };
    tx.execute(
        r"
        INSERT INTO nav_nodes (parent_id, position, depth, label, link, deferred)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ",
        params![
            parent_id,
            i64::try_from(position).unwrap_or(i64::MAX),
            i64::try_from(depth).unwrap_or(i64::MAX),
            node.label,
            node.link,
            deferred,
        ],
    )?;
    let id = tx.last_insert_rowid();

    let mut written = 1;
    for (i, child) in node.child_nodes().iter().enumerate() {
        written += insert_nav_node(tx, child, Some(id), i, depth + 1)?;
    }
    Ok(written)
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Number of source files recorded.
    pub sources: i64,
    /// Number of navigation nodes.
    pub nav_nodes: i64,
    /// Number of search entries.
    pub search_entries: i64,
    /// Number of search targets.
    pub search_targets: i64,
    /// When the current index was written.
    pub last_indexed: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
