//! Positional-path resolution and breadcrumb chains.
//!
//! A path is an ordered list of child indices from the root — a positional
//! address valid only for the tree snapshot it was derived from. Any caller
//! holding a path across a mutation boundary must re-resolve through the
//! block id (via [`BlockIndex`]) before trusting it again; paths are a
//! display convenience, ids are identity.

use quill_types::{BlockId, NodeKind};

use crate::error::TreeError;
use crate::index::BlockIndex;
use crate::node::Node;
use crate::Result;

/// Maximum characters of sentence text used as a breadcrumb label.
const CRUMB_LABEL_MAX: usize = 40;

/// Resolve a positional path against a tree snapshot.
///
/// Fails with `PathNotFound` when an index is out of bounds or the path
/// descends into a leaf.
pub fn resolve_path<'t>(root: &'t Node, path: &[usize]) -> Result<&'t Node> {
    let mut node = root;
    for &idx in path {
        let children = node
            .children()
            .ok_or_else(|| TreeError::PathNotFound(path.to_vec()))?;
        node = children
            .get(idx)
            .ok_or_else(|| TreeError::PathNotFound(path.to_vec()))?;
    }
    Ok(node)
}

/// Resolve a positional path against a tree snapshot, mutably.
pub fn resolve_path_mut<'t>(root: &'t mut Node, path: &[usize]) -> Result<&'t mut Node> {
    let mut node = root;
    for &idx in path {
        let children = node
            .children_mut()
            .ok_or_else(|| TreeError::PathNotFound(path.to_vec()))?;
        node = children
            .get_mut(idx)
            .ok_or_else(|| TreeError::PathNotFound(path.to_vec()))?;
    }
    Ok(node)
}

/// Positional path of a block as of the index's snapshot.
///
/// Thin delegation to [`BlockIndex::path_of`]; kept here so path-addressing
/// callers have one module to import.
pub fn path_of(index: &BlockIndex, id: BlockId) -> Option<&[usize]> {
    index.path_of(id)
}

/// One element of a breadcrumb chain, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub block_id: BlockId,
    pub kind: NodeKind,
    /// Title, truncated sentence text, or the kind name — best available.
    pub label: String,
}

/// Breadcrumb chain for a block: root-first ancestors, then the block
/// itself. `None` when the id is unknown (stale reference — clear the UI
/// selection rather than render a bogus trail).
pub fn breadcrumbs(tree: &Node, index: &BlockIndex, id: BlockId) -> Option<Vec<Breadcrumb>> {
    let mut chain = index.ancestors(id)?;
    chain.push(id);
    let mut crumbs = Vec::with_capacity(chain.len());
    for ancestor_id in chain {
        let (node, _) = index.lookup(tree, ancestor_id)?;
        crumbs.push(Breadcrumb {
            block_id: node.block_id,
            kind: node.kind(),
            label: crumb_label(node),
        });
    }
    Some(crumbs)
}

/// Best display label for a node: its title, a truncated slice of its text,
/// or its kind name when neither carries anything.
fn crumb_label(node: &Node) -> String {
    if let Some(title) = node.title() {
        if !title.is_empty() {
            return title.to_string();
        }
    }
    if let Some(text) = node.text() {
        if !text.is_empty() {
            let mut label: String = text.chars().take(CRUMB_LABEL_MAX).collect();
            if text.chars().count() > CRUMB_LABEL_MAX {
                label.push('…');
            }
            return label;
        }
    }
    node.kind().as_str().to_string()
}

// ============================================================================
// Tests
// ============================================================================
