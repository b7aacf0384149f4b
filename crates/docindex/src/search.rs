//! Search index model and lookup.
//!
//! Search tables are flat lists of `[key, [name, [link, flag, source], ...]]`
//! entries, split into one script per category and bucket
//! (`functions_3.js`, `enums_d.js`, ...). Keys are lower-cased names with
//! every character outside `[a-z0-9]` written as `_XX` hex escapes.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::literal::{self, Literal};

/// Variable holding a search table.
pub const SEARCH_DATA_VAR: &str = "searchData";

/// Undo the `_XX` escaping used in search keys.
///
/// Sequences that are not valid hex escapes are kept verbatim.
#[must_use]
pub fn decode_key(key: &str) -> String {
    let bytes = key.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'_' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Split a search table file name into `(category, bucket)`.
///
/// `enums_d.js` yields `("enums", "d")`. Returns `None` for names that do
/// not follow the `<category>_<bucket>.js` pattern.
#[must_use]
pub fn category_from_file_name(name: &str) -> Option<(&str, &str)> {
    let stem = name.strip_suffix(".js")?;
    let (category, bucket) = stem.rsplit_once('_')?;
    if category.is_empty()
        || bucket.is_empty()
        || !bucket.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some((category, bucket))
}

/// One place a search entry points to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTarget {
    /// Link relative to the search directory, e.g. `../group___s_p_i.html#ga1`.
    pub link: String,
    /// Whether the link points into this documentation set.
    pub local: bool,
    /// Defining header file or enclosing scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl SearchTarget {
    /// The link relative to the documentation root, with `../` removed.
    #[must_use]
    pub fn root_link(&self) -> &str {
        let mut link = self.link.as_str();
        while let Some(rest) = link.strip_prefix("../") {
            link = rest;
        }
        link
    }
}

/// A single search table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEntry {
    /// Escaped lookup key as stored in the table.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Link targets, at least one in well-formed tables.
    pub targets: Vec<SearchTarget>,
}

impl SearchEntry {
    /// The lookup key with escapes resolved.
    #[must_use]
    pub fn decoded_key(&self) -> String {
        decode_key(&self.key)
    }

    /// Whether any target names `source` as its header file.
    #[must_use]
    pub fn defined_in(&self, source: &str) -> bool {
        self.targets
            .iter()
            .any(|t| t.source.as_deref() == Some(source))
    }

    /// Build an entry from its `[key, [name, target...]]` literal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shape`] naming the first malformed value.
    pub fn from_literal(value: &Literal, path: &str) -> Result<Self> {
        let parts = value
            .as_array()
            .ok_or_else(|| Error::shape(path, format!("expected array, found {}", value.kind())))?;
        let [key, body] = parts else {
            return Err(Error::shape(
                path,
                format!("expected [key, [name, targets...]], found {} elements", parts.len()),
            ));
        };

        let key = key
            .as_str()
            .ok_or_else(|| Error::shape(format!("{path}[0]"), "key must be a string"))?
            .to_string();

        let body_path = format!("{path}[1]");
        let body = body
            .as_array()
            .ok_or_else(|| Error::shape(&body_path, "expected [name, targets...]"))?;
        let (name, targets) = body
            .split_first()
            .ok_or_else(|| Error::shape(&body_path, "missing display name"))?;
        let name = name
            .as_str()
            .ok_or_else(|| Error::shape(format!("{body_path}[0]"), "name must be a string"))?
            .to_string();

        let targets = targets
            .iter()
            .enumerate()
            .map(|(i, t)| target_from_literal(t, &format!("{body_path}[{}]", i + 1)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { key, name, targets })
    }
}

fn target_from_literal(value: &Literal, path: &str) -> Result<SearchTarget> {
    let parts = value
        .as_array()
        .ok_or_else(|| Error::shape(path, "expected [link, flag, source]"))?;
    let link = parts
        .first()
        .and_then(Literal::as_str)
        .ok_or_else(|| Error::shape(format!("{path}[0]"), "link must be a string"))?
        .to_string();
    let local = match parts.get(1) {
        None | Some(Literal::Null) => true,
        Some(Literal::Number(n)) => *n != 0.0,
        Some(Literal::Bool(b)) => *b,
        Some(other) => {
            return Err(Error::shape(
                format!("{path}[1]"),
                format!("flag must be a number, found {}", other.kind()),
            ))
        }
    };
    let source = match parts.get(2) {
        None | Some(Literal::Null) => None,
        Some(Literal::Str(s)) if s.is_empty() => None,
        Some(Literal::Str(s)) => Some(s.clone()),
        Some(other) => {
            return Err(Error::shape(
                format!("{path}[2]"),
                format!("source must be a string, found {}", other.kind()),
            ))
        }
    };
    Ok(SearchTarget {
        link,
        local,
        source,
    })
}

/// Parse the entries of a search table script.
///
/// # Errors
///
/// Returns an error if the script does not parse or `searchData` is
/// missing or malformed.
pub fn parse_table(src: &str) -> Result<Vec<SearchEntry>> {
    let script = literal::parse_script(src)?;
    let data = script.require(SEARCH_DATA_VAR)?;
    let rows = data.as_array().ok_or_else(|| {
        Error::shape(SEARCH_DATA_VAR, format!("expected array, found {}", data.kind()))
    })?;
    rows.iter()
        .enumerate()
        .map(|(i, row)| SearchEntry::from_literal(row, &format!("{SEARCH_DATA_VAR}[{i}]")))
        .collect()
}

/// How a query is matched against keys and names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// The query occurs anywhere.
    #[default]
    Substring,
    /// The key or name starts with the query.
    Prefix,
    /// The query is a regular expression.
    Regex,
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Substring => write!(f, "substring"),
            Self::Prefix => write!(f, "prefix"),
            Self::Regex => write!(f, "regex"),
        }
    }
}

/// A search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Text or pattern to look for.
    pub text: String,
    /// Matching strategy.
    pub mode: SearchMode,
    /// Match case exactly.
    pub case_sensitive: bool,
    /// Restrict to one category, e.g. `enums`.
    pub category: Option<String>,
    /// Restrict to entries defined in this header file.
    pub source: Option<String>,
    /// Maximum number of hits, 0 for unlimited.
    pub limit: usize,
}

impl SearchQuery {
    /// A case-insensitive substring query without filters or limit.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: SearchMode::default(),
            case_sensitive: false,
            category: None,
            source: None,
            limit: 0,
        }
    }

    /// Set the matching strategy.
    #[must_use]
    pub fn mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Match case exactly.
    #[must_use]
    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    /// Restrict to one category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Restrict to one header file.
    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Cap the number of hits.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// How well a hit matched. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// The whole name or key equals the query.
    Exact,
    /// The name or key starts with the query.
    Prefix,
    /// The query matched elsewhere.
    Interior,
}

/// A search entry tagged with the category it was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedEntry {
    /// Category derived from the table's file name.
    pub category: String,
    /// The entry itself.
    #[serde(flatten)]
    pub entry: SearchEntry,
}

/// A search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit<'a> {
    /// Category of the matching entry.
    pub category: &'a str,
    /// The matching entry.
    pub entry: &'a SearchEntry,
    /// Match quality.
    pub kind: MatchKind,
}

/// A key seen more than once within one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateKey {
    /// Category holding the duplicates.
    pub category: String,
    /// The repeated key, escaped form.
    pub key: String,
    /// Number of occurrences.
    pub count: usize,
}

/// All search tables of a documentation site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIndex {
    entries: Vec<IndexedEntry>,
}

impl SearchIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the entries of one table under `category`.
    pub fn add_table(&mut self, category: &str, entries: Vec<SearchEntry>) {
        debug!("Adding {} search entries to category {}", entries.len(), category);
        self.entries
            .extend(entries.into_iter().map(|entry| IndexedEntry {
                category: category.to_string(),
                entry,
            }));
    }

    /// All entries in load order.
    #[must_use]
    pub fn entries(&self) -> &[IndexedEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct categories with their entry counts, sorted by name.
    #[must_use]
    pub fn categories(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for indexed in &self.entries {
            *counts.entry(indexed.category.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Keys occurring more than once within a category.
    #[must_use]
    pub fn duplicate_keys(&self) -> Vec<DuplicateKey> {
        let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
        for indexed in &self.entries {
            *counts
                .entry((indexed.category.as_str(), indexed.entry.key.as_str()))
                .or_insert(0) += 1;
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|((category, key), count)| DuplicateKey {
                category: category.to_string(),
                key: key.to_string(),
                count,
            })
            .collect()
    }

    /// Run a query.
    ///
    /// Hits are ordered by match kind, then by name, then by load order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] if a regex query does not compile.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit<'_>>> {
        let matcher = Matcher::new(query)?;

        let mut hits: Vec<SearchHit<'_>> = self
            .entries
            .iter()
            .filter(|indexed| {
                query
                    .category
                    .as_deref()
                    .map_or(true, |c| indexed.category == c)
            })
            .filter(|indexed| {
                query
                    .source
                    .as_deref()
                    .map_or(true, |s| indexed.entry.defined_in(s))
            })
            .filter_map(|indexed| {
                let kind = matcher.classify(&indexed.entry)?;
                trace!("Matched {} as {:?}", indexed.entry.name, kind);
                Some(SearchHit {
                    category: &indexed.category,
                    entry: &indexed.entry,
                    kind,
                })
            })
            .collect();

        // stable sort keeps load order among equals
        hits.sort_by(|a, b| match a.kind.cmp(&b.kind) {
            Ordering::Equal => a.entry.name.cmp(&b.entry.name),
            other => other,
        });

        if query.limit > 0 {
            hits.truncate(query.limit);
        }
        debug!("Query {:?} ({}) produced {} hits", query.text, query.mode, hits.len());
        Ok(hits)
    }
}

enum Matcher {
    Text { needle: String, prefix_only: bool, case_sensitive: bool },
    /// `whole` is the pattern anchored at both ends.
    Pattern { find: Regex, whole: Regex },
}

impl Matcher {
    fn new(query: &SearchQuery) -> Result<Self> {
        Ok(match query.mode {
            SearchMode::Regex => {
                let build = |pattern: &str| {
                    RegexBuilder::new(pattern)
                        .case_insensitive(!query.case_sensitive)
                        .build()
                };
                Self::Pattern {
                    find: build(&query.text)?,
                    whole: build(&format!("^(?:{})$", query.text))?,
                }
            }
            mode => Self::Text {
                needle: if query.case_sensitive {
                    query.text.clone()
                } else {
                    query.text.to_lowercase()
                },
                prefix_only: mode == SearchMode::Prefix,
                case_sensitive: query.case_sensitive,
            },
        })
    }

    fn classify(&self, entry: &SearchEntry) -> Option<MatchKind> {
        let key = entry.decoded_key();
        [entry.name.as_str(), key.as_str()]
            .into_iter()
            .filter_map(|haystack| self.classify_one(haystack))
            .min()
    }

    fn classify_one(&self, haystack: &str) -> Option<MatchKind> {
        match self {
            Self::Text {
                needle,
                prefix_only,
                case_sensitive,
            } => {
                let folded;
                let haystack = if *case_sensitive {
                    haystack
                } else {
                    folded = haystack.to_lowercase();
                    folded.as_str()
                };
                if haystack == needle {
                    Some(MatchKind::Exact)
                } else if haystack.starts_with(needle.as_str()) {
                    Some(MatchKind::Prefix)
                } else if !*prefix_only && haystack.contains(needle.as_str()) {
                    Some(MatchKind::Interior)
                } else {
                    None
                }
            }
            Self::Pattern { find, whole } => {
                let m = find.find(haystack)?;
                Some(if whole.is_match(haystack) {
                    MatchKind::Exact
                } else if m.start() == 0 {
                    MatchKind::Prefix
                } else {
                    MatchKind::Interior
                })
            }
        }
    }
}
