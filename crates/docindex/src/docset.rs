//! A documentation site loaded from disk.
//!
//! Ties the navigation tree and the search tables of one generated site
//! together and checks them for well-formedness.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::nav::{NavChildren, NavTree};
use crate::search::{self, SearchIndex};

/// A data file that contributed to a [`DocSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    /// Path relative to the site root, `/`-separated.
    pub path: String,
    /// BLAKE3 hash of the file contents.
    pub fingerprint: String,
}

impl SourceFile {
    fn new(path: String, contents: &str) -> Self {
        Self {
            path,
            fingerprint: blake3::hash(contents.as_bytes()).to_hex().to_string(),
        }
    }
}

/// Navigation tree and search index of one documentation site.
#[derive(Debug, Clone, Default)]
pub struct DocSet {
    /// Site root directory.
    pub root: PathBuf,
    /// The navigation tree.
    pub nav: NavTree,
    /// All search tables.
    pub search: SearchIndex,
    /// Files read, navtree first, then search tables by name.
    pub sources: Vec<SourceFile>,
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

impl DocSet {
    /// Load a site rooted at `root`.
    ///
    /// The navtree file is required. A missing search directory yields an
    /// empty index; files in it that are not `<category>_<bucket>.js`
    /// tables are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or does not parse.
    pub fn load(root: impl AsRef<Path>, config: &SourceConfig) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        let nav_path = root.join(&config.navtree_file);
        debug!("Reading navigation tree from {}", nav_path.display());
        let nav_src = read(&nav_path)?;
        let nav = NavTree::parse(&nav_src)?;
        let mut sources = vec![SourceFile::new(config.navtree_file.clone(), &nav_src)];

        let mut search = SearchIndex::new();
        let search_dir = root.join(&config.search_dir);
        if search_dir.is_dir() {
            let mut names: Vec<String> = std::fs::read_dir(&search_dir)?
                .filter_map(std::result::Result::ok)
                .filter(|e| e.path().is_file())
                .filter_map(|e| e.file_name().into_string().ok())
                .collect();
            names.sort();

            for name in names {
                let Some((category, _bucket)) = search::category_from_file_name(&name) else {
                    debug!("Skipping {} (not a search table)", name);
                    continue;
                };
                let src = read(&search_dir.join(&name))?;
                let entries = search::parse_table(&src)?;
                search.add_table(category, entries);
                sources.push(SourceFile::new(format!("{}/{name}", config.search_dir), &src));
            }
        } else {
            warn!("No search directory at {}", search_dir.display());
        }

        info!(
            "Loaded {} navigation nodes and {} search entries from {}",
            nav.len(),
            search.len(),
            root.display()
        );
        Ok(Self {
            root,
            nav,
            search,
            sources,
        })
    }

    /// Check the site for well-formedness problems.
    #[must_use]
    pub fn check(&self) -> CheckReport {
        let mut findings = Vec::new();

        for (depth, node) in self.nav.walk() {
            if node.label.trim().is_empty() {
                findings.push(Finding::warning(format!(
                    "navigation node at depth {depth} has an empty label (link {:?})",
                    node.link
                )));
            }
            if node.link.is_none() && matches!(node.children, NavChildren::Leaf) {
                findings.push(Finding::warning(format!(
                    "navigation node '{}' has neither a link nor children",
                    node.label
                )));
            }
        }

        for dup in self.search.duplicate_keys() {
            findings.push(Finding::warning(format!(
                "search key '{}' appears {} times in category '{}'",
                dup.key, dup.count, dup.category
            )));
        }

        let mut unreferenced = BTreeSet::new();
        for indexed in self.search.entries() {
            let entry = &indexed.entry;
            if entry.targets.is_empty() {
                findings.push(Finding::warning(format!(
                    "search entry '{}' in category '{}' has no targets",
                    entry.name, indexed.category
                )));
            }
            for target in entry.targets.iter().filter(|t| t.local) {
                let page = crate::nav::page_of(target.root_link());
                if !self.nav.mentions_page(page) {
                    unreferenced.insert(page);
                }
            }
        }
        for page in unreferenced {
            findings.push(Finding::info(format!(
                "page '{page}' is targeted by search entries but not by the loaded navigation tree"
            )));
        }

        CheckReport { findings }
    }
}

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Expected in normal sites, e.g. pages only reachable through deferred subtrees.
    Info,
    /// A well-formedness problem.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// One problem reported by [`DocSet::check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// How serious it is.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

impl Finding {
    fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }

    fn info(message: String) -> Self {
        Self {
            severity: Severity::Info,
            message,
        }
    }
}

/// Result of [`DocSet::check`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Findings in discovery order.
    pub findings: Vec<Finding>,
}

impl CheckReport {
    /// Whether no warnings were found. Informational findings are allowed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings().next().is_none()
    }

    /// Warning-level findings.
    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
    }
}
