//! Derived block index over the tree.
//!
//! [`BlockIndex`] is an ephemeral structure computed from a tree snapshot.
//! It maps every `BlockId` to its parent, kind, and positional path, giving
//! O(1) lookups without touching the tree itself. Rebuild it after any
//! operation that changes shape; a simple field update leaves it valid.
//!
//! A missing id is a normal outcome (stale reference after a concurrent
//! delete), reported as `None` — callers clear their selection and move on.

use std::collections::HashMap;

use quill_types::{BlockId, NodeKind};

use crate::node::{Node, MAX_TREE_DEPTH};

/// Per-block index entry: where the block sits as of the indexed snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Parent block — `None` for the root.
    pub parent: Option<BlockId>,
    /// The block's kind.
    pub kind: NodeKind,
    /// Positional path from the root (child indices). Valid only for the
    /// tree snapshot this index was built from.
    pub path: Vec<usize>,
}

/// O(1) lookup from block id to position, parent, and ancestor chain.
#[derive(Debug, Clone)]
pub struct BlockIndex {
    root: BlockId,
    entries: HashMap<BlockId, IndexEntry>,
}

impl BlockIndex {
    /// Build an index from a tree root. Full DFS, O(n) in tree size.
    pub fn build(root: &Node) -> Self {
        let mut entries = HashMap::new();
        let mut stack: Vec<(&Node, Option<BlockId>, Vec<usize>)> =
            vec![(root, None, Vec::new())];

        while let Some((node, parent, path)) = stack.pop() {
            if path.len() > MAX_TREE_DEPTH {
                tracing::warn!(
                    "index build hit MAX_TREE_DEPTH ({MAX_TREE_DEPTH}), truncating subtree"
                );
                continue;
            }
            let entry = IndexEntry { parent, kind: node.kind(), path: path.clone() };
            if entries.insert(node.block_id, entry).is_some() {
                // Violates the global-uniqueness invariant; keep the last
                // occurrence and flag it loudly.
                tracing::warn!("duplicate block id {} in tree", node.block_id);
            }
            if let Some(children) = node.children() {
                for (i, child) in children.iter().enumerate() {
                    let mut child_path = path.clone();
                    child_path.push(i);
                    stack.push((child, Some(node.block_id), child_path));
                }
            }
        }

        Self { root: root.block_id, entries }
    }

    /// The indexed root's id.
    pub fn root(&self) -> BlockId {
        self.root
    }

    /// Number of indexed blocks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty (never true for a built index).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the block exists in the indexed snapshot.
    pub fn contains(&self, id: BlockId) -> bool {
        self.entries.contains_key(&id)
    }

    /// The full entry for a block.
    pub fn entry(&self, id: BlockId) -> Option<&IndexEntry> {
        self.entries.get(&id)
    }

    /// Positional path of a block as of the indexed snapshot.
    pub fn path_of(&self, id: BlockId) -> Option<&[usize]> {
        self.entries.get(&id).map(|e| e.path.as_slice())
    }

    /// Parent of a block (`Some(None)` for the root, `None` if unknown).
    pub fn parent_of(&self, id: BlockId) -> Option<Option<BlockId>> {
        self.entries.get(&id).map(|e| e.parent)
    }

    /// Kind of a block.
    pub fn kind_of(&self, id: BlockId) -> Option<NodeKind> {
        self.entries.get(&id).map(|e| e.kind)
    }

    /// Ancestor chain of a block, root-first, excluding the block itself.
    ///
    /// Returns an empty chain for the root, `None` for an unknown id.
    /// Truncates at [`MAX_TREE_DEPTH`] if the parent links are corrupt.
    pub fn ancestors(&self, id: BlockId) -> Option<Vec<BlockId>> {
        let mut chain = Vec::new();
        let mut current = self.entries.get(&id)?.parent;
        while let Some(pid) = current {
            if chain.len() >= MAX_TREE_DEPTH {
                tracing::warn!("ancestors() hit MAX_TREE_DEPTH ({MAX_TREE_DEPTH}), truncating");
                break;
            }
            chain.push(pid);
            current = self.entries.get(&pid).and_then(|e| e.parent);
        }
        chain.reverse();
        Some(chain)
    }

    /// Resolve a block to its node and path in one step.
    ///
    /// `tree` must be the snapshot this index was built from; if the tree
    /// has mutated since, the id at the stored path may have changed and the
    /// lookup reports `None` rather than returning the wrong node.
    pub fn lookup<'t>(&self, tree: &'t Node, id: BlockId) -> Option<(&'t Node, &[usize])> {
        let entry = self.entries.get(&id)?;
        let node = crate::path::resolve_path(tree, &entry.path).ok()?;
        if node.block_id != id {
            tracing::warn!(
                "index is stale: path {:?} now holds {}, expected {}",
                entry.path,
                node.block_id,
                id
            );
            return None;
        }
        Some((node, &entry.path))
    }
}

// ============================================================================
// Tests
// ============================================================================
