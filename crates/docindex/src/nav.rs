//! Navigation tree model.
//!
//! The navigation tree is the sidebar outline of a documentation site. On the
//! wire every node is a three-element array `[label, link, children]` where
//! `children` is `null`, a nested array of nodes, or the name of a separate
//! script holding the subtree.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::literal::{self, Literal, Script};

/// Variable holding the tree itself.
pub const NAVTREE_VAR: &str = "NAVTREE";

/// Variable holding the first anchor of every navtree chunk.
pub const NAVTREEINDEX_VAR: &str = "NAVTREEINDEX";

const SYNC_ON_VAR: &str = "SYNCONMSG";
const SYNC_OFF_VAR: &str = "SYNCOFFMSG";

/// Children of a navigation node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum NavChildren {
    /// No children (`null` on the wire).
    #[default]
    Leaf,
    /// Inline children in display order.
    Nodes(Vec<NavNode>),
    /// Children live in a separate script with this name.
    Deferred(String),
}

/// A single entry in the navigation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavNode {
    /// Text shown in the sidebar.
    pub label: String,
    /// Target page and optional anchor. `None` for grouping nodes.
    pub link: Option<String>,
    /// Child nodes.
    pub children: NavChildren,
}

impl NavNode {
    /// Create a leaf node.
    #[must_use]
    pub fn leaf(label: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            link: Some(link.into()),
            children: NavChildren::Leaf,
        }
    }

    /// Create a node with inline children.
    #[must_use]
    pub fn branch(label: impl Into<String>, link: impl Into<String>, children: Vec<NavNode>) -> Self {
        Self {
            label: label.into(),
            link: Some(link.into()),
            children: NavChildren::Nodes(children),
        }
    }

    /// Build a node from its `[label, link, children]` literal.
    ///
    /// `path` names the value in error messages, e.g. `NAVTREE[0][3]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shape`] naming the first malformed value.
    pub fn from_literal(value: &Literal, path: &str) -> Result<Self> {
        let parts = value
            .as_array()
            .ok_or_else(|| Error::shape(path, format!("expected array, found {}", value.kind())))?;
        if parts.len() != 3 {
            return Err(Error::shape(
                path,
                format!("expected [label, link, children], found {} elements", parts.len()),
            ));
        }

        let label = parts[0]
            .as_str()
            .ok_or_else(|| Error::shape(format!("{path}[0]"), "label must be a string"))?
            .to_string();

        let link = match &parts[1] {
            Literal::Str(s) => Some(s.clone()),
            Literal::Null => None,
            other => {
                return Err(Error::shape(
                    format!("{path}[1]"),
                    format!("link must be a string or null, found {}", other.kind()),
                ))
            }
        };

        let children = match &parts[2] {
            Literal::Null => NavChildren::Leaf,
            Literal::Str(name) => NavChildren::Deferred(name.clone()),
            Literal::Array(items) => {
                let child_path = format!("{path}[2]");
                NavChildren::Nodes(nodes_from_literals(items, &child_path)?)
            }
            other => {
                return Err(Error::shape(
                    format!("{path}[2]"),
                    format!("children must be an array, a string or null, found {}", other.kind()),
                ))
            }
        };

        Ok(Self {
            label,
            link,
            children,
        })
    }

    /// Serialise back to the `[label, link, children]` wire form.
    #[must_use]
    pub fn to_literal(&self) -> Literal {
        let link = self
            .link
            .as_ref()
            .map_or(Literal::Null, |l| Literal::Str(l.clone()));
        let children = match &self.children {
            NavChildren::Leaf => Literal::Null,
            NavChildren::Deferred(name) => Literal::Str(name.clone()),
            NavChildren::Nodes(nodes) => {
                Literal::Array(nodes.iter().map(NavNode::to_literal).collect())
            }
        };
        Literal::Array(vec![Literal::Str(self.label.clone()), link, children])
    }

    /// Inline children, empty for leaves and deferred subtrees.
    #[must_use]
    pub fn child_nodes(&self) -> &[NavNode] {
        match &self.children {
            NavChildren::Nodes(nodes) => nodes,
            _ => &[],
        }
    }

    /// Whether this node has no children of any kind.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.children, NavChildren::Leaf)
    }

    /// The page part of the link, without the `#anchor`.
    #[must_use]
    pub fn page(&self) -> Option<&str> {
        self.link.as_deref().map(page_of)
    }
}

/// The page part of a link: everything before `#`.
#[must_use]
pub fn page_of(link: &str) -> &str {
    link.split_once('#').map_or(link, |(page, _)| page)
}

fn nodes_from_literals(items: &[Literal], path: &str) -> Result<Vec<NavNode>> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| NavNode::from_literal(item, &format!("{path}[{i}]")))
        .collect()
}

/// Messages shown by the viewer's panel-synchronisation toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMessages {
    /// Tooltip while synchronisation is on.
    pub on: String,
    /// Tooltip while synchronisation is off.
    pub off: String,
}

/// The full navigation tree of a documentation site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavTree {
    /// Top-level nodes.
    pub roots: Vec<NavNode>,
    /// First anchor of each navtree chunk, in chunk order.
    pub chunk_index: Vec<String>,
    /// Sync toggle messages, when the script defines both.
    pub sync_messages: Option<SyncMessages>,
}

impl NavTree {
    /// Parse a navtree data script.
    ///
    /// # Errors
    ///
    /// Returns an error if the script does not parse or `NAVTREE` is
    /// missing or malformed.
    pub fn parse(src: &str) -> Result<Self> {
        Self::from_script(&literal::parse_script(src)?)
    }

    /// Build a tree from an already parsed script.
    ///
    /// # Errors
    ///
    /// Returns an error if `NAVTREE` is missing or malformed.
    pub fn from_script(script: &Script) -> Result<Self> {
        let tree = script.require(NAVTREE_VAR)?;
        let items = tree.as_array().ok_or_else(|| {
            Error::shape(NAVTREE_VAR, format!("expected array, found {}", tree.kind()))
        })?;
        let roots = nodes_from_literals(items, NAVTREE_VAR)?;

        let chunk_index = match script.get(NAVTREEINDEX_VAR) {
            None => Vec::new(),
            Some(value) => {
                let items = value.as_array().ok_or_else(|| {
                    Error::shape(NAVTREEINDEX_VAR, format!("expected array, found {}", value.kind()))
                })?;
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        item.as_str().map(str::to_string).ok_or_else(|| {
                            Error::shape(format!("{NAVTREEINDEX_VAR}[{i}]"), "expected string")
                        })
                    })
                    .collect::<Result<Vec<_>>>()?
            }
        };

        let sync_messages = match (
            script.get(SYNC_ON_VAR).and_then(Literal::as_str),
            script.get(SYNC_OFF_VAR).and_then(Literal::as_str),
        ) {
            (Some(on), Some(off)) => Some(SyncMessages {
                on: on.to_string(),
                off: off.to_string(),
            }),
            _ => None,
        };

        Ok(Self {
            roots,
            chunk_index,
            sync_messages,
        })
    }

    /// Depth-first, pre-order traversal yielding `(depth, node)`.
    /// Roots have depth 0.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: self.roots.iter().rev().map(|n| (0, n)).collect(),
        }
    }

    /// Total number of inline nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.walk().count()
    }

    /// Whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Depth of the deepest node, or `None` for an empty tree.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.walk().map(|(depth, _)| depth).max()
    }

    /// Names of deferred subtrees in traversal order.
    #[must_use]
    pub fn deferred(&self) -> Vec<&str> {
        self.walk()
            .filter_map(|(_, node)| match &node.children {
                NavChildren::Deferred(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The first node (in traversal order) linking to `link`.
    #[must_use]
    pub fn find_by_link(&self, link: &str) -> Option<&NavNode> {
        self.walk()
            .map(|(_, node)| node)
            .find(|node| node.link.as_deref() == Some(link))
    }

    /// Breadcrumb path from a root down to the first node linking to `link`.
    #[must_use]
    pub fn locate(&self, link: &str) -> Option<Vec<&NavNode>> {
        fn search<'a>(nodes: &'a [NavNode], link: &str, path: &mut Vec<&'a NavNode>) -> bool {
            for node in nodes {
                path.push(node);
                if node.link.as_deref() == Some(link) || search(node.child_nodes(), link, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        search(&self.roots, link, &mut path).then_some(path)
    }

    /// Position of the chunk in the chunk index that would hold `link`.
    ///
    /// The chunk index lists the first anchor of every chunk in sorted
    /// order, so the owning chunk is the last one whose start does not sort
    /// after `link`.
    #[must_use]
    pub fn chunk_for(&self, link: &str) -> Option<usize> {
        let after = self
            .chunk_index
            .partition_point(|start| start.as_str() <= link);
        after.checked_sub(1)
    }

    /// Whether any node or chunk start refers to `page`.
    #[must_use]
    pub fn mentions_page(&self, page: &str) -> bool {
        self.walk().any(|(_, node)| node.page() == Some(page))
            || self.chunk_index.iter().any(|start| page_of(start) == page)
    }

    /// Indented outline, two spaces per level. `max_depth` limits the
    /// levels printed; `None` prints everything.
    #[must_use]
    pub fn outline(&self, max_depth: Option<usize>) -> String {
        let mut out = String::new();
        for (depth, node) in self.walk() {
            if max_depth.is_some_and(|max| depth > max) {
                continue;
            }
            out.push_str(&"  ".repeat(depth));
            out.push_str(&node.label);
            if let Some(link) = &node.link {
                out.push_str(" <");
                out.push_str(link);
                out.push('>');
            }
            if let NavChildren::Deferred(name) = &node.children {
                out.push_str(" [+");
                out.push_str(name);
                out.push(']');
            }
            out.push('\n');
        }
        out
    }

    /// Serialise the roots back to the wire form.
    #[must_use]
    pub fn to_literal(&self) -> Literal {
        Literal::Array(self.roots.iter().map(NavNode::to_literal).collect())
    }
}

/// Pre-order iterator over a [`NavTree`].
#[derive(Debug)]
pub struct Walk<'a> {
    stack: Vec<(usize, &'a NavNode)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a NavNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.child_nodes().iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}
