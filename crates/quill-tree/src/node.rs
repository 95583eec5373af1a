//! The recursive node model.
//!
//! A [`Node`] is one element of the paper tree. Its shape is fixed by its
//! kind through the closed [`NodeBody`] variant: titled containers hold
//! child lists, paragraphs hold sentences, sentences hold text. There is no
//! runtime duck-typing — every operation matches the body exhaustively, so
//! adding a level is a compile-time change.
//!
//! Nodes own their children exclusively (a child lives in exactly one parent
//! list), which makes cycles unrepresentable. Identity lives in `block_id`;
//! position is derived and unstable.

use serde::{Deserialize, Serialize};

use quill_types::{BlockId, NodeKind, NodeSnapshot};

/// Maximum expected tree depth. Traversal code uses this as a circuit breaker.
///
/// A well-formed paper is at most 6 levels deep (paper → section →
/// subsection → subsubsection → paragraph → sentence). Depth 64 is generous;
/// exceeding it indicates a corrupted import, and traversals truncate rather
/// than recurse away.
pub const MAX_TREE_DEPTH: usize = 64;

/// One element of the paper tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Durable identity — assigned at creation, never reused or reassigned.
    pub block_id: BlockId,
    /// Free-text summary annotation.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
    /// Free-text intent annotation.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub intent: String,
    /// Kind-specific payload: title + children, children, or text.
    pub body: NodeBody,
}

/// Kind-specific node payload. The children shape is determined entirely by
/// the variant — a closed, fixed-arity union over the six node kinds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeBody {
    /// Document root: title + sections (or loose paragraphs).
    Paper { title: String, children: Vec<Node> },
    /// Top-level section.
    Section { title: String, children: Vec<Node> },
    /// Second-level section.
    Subsection { title: String, children: Vec<Node> },
    /// Third-level section.
    Subsubsection { title: String, children: Vec<Node> },
    /// Prose unit holding sentences. No title.
    Paragraph { children: Vec<Node> },
    /// Leaf with text content.
    Sentence { text: String },
}

impl Node {
    /// Create a node of `kind` with a fresh id and type-appropriate defaults.
    ///
    /// Containers get an empty title placeholder; a paragraph seeds one empty
    /// sentence child (with its own fresh id) so the editor always has a
    /// cursor target; a sentence gets empty text.
    pub fn with_defaults(kind: NodeKind) -> Self {
        let body = match kind {
            NodeKind::Paper => NodeBody::Paper { title: String::new(), children: Vec::new() },
            NodeKind::Section => NodeBody::Section { title: String::new(), children: Vec::new() },
            NodeKind::Subsection => {
                NodeBody::Subsection { title: String::new(), children: Vec::new() }
            }
            NodeKind::Subsubsection => {
                NodeBody::Subsubsection { title: String::new(), children: Vec::new() }
            }
            NodeKind::Paragraph => NodeBody::Paragraph {
                children: vec![Node::sentence("")],
            },
            NodeKind::Sentence => NodeBody::Sentence { text: String::new() },
        };
        Self {
            block_id: BlockId::new(),
            summary: String::new(),
            intent: String::new(),
            body,
        }
    }

    /// Create a sentence node with the given text and a fresh id.
    pub fn sentence(text: impl Into<String>) -> Self {
        Self {
            block_id: BlockId::new(),
            summary: String::new(),
            intent: String::new(),
            body: NodeBody::Sentence { text: text.into() },
        }
    }

    /// Create a paper root node with the given title and a fresh id.
    pub fn paper(title: impl Into<String>) -> Self {
        Self {
            block_id: BlockId::new(),
            summary: String::new(),
            intent: String::new(),
            body: NodeBody::Paper { title: title.into(), children: Vec::new() },
        }
    }

    /// This node's kind, derived from the body variant.
    pub fn kind(&self) -> NodeKind {
        match &self.body {
            NodeBody::Paper { .. } => NodeKind::Paper,
            NodeBody::Section { .. } => NodeKind::Section,
            NodeBody::Subsection { .. } => NodeKind::Subsection,
            NodeBody::Subsubsection { .. } => NodeKind::Subsubsection,
            NodeBody::Paragraph { .. } => NodeKind::Paragraph,
            NodeBody::Sentence { .. } => NodeKind::Sentence,
        }
    }

    /// Heading text, for titled kinds.
    pub fn title(&self) -> Option<&str> {
        match &self.body {
            NodeBody::Paper { title, .. }
            | NodeBody::Section { title, .. }
            | NodeBody::Subsection { title, .. }
            | NodeBody::Subsubsection { title, .. } => Some(title),
            NodeBody::Paragraph { .. } | NodeBody::Sentence { .. } => None,
        }
    }

    /// Mutable heading text, for titled kinds.
    pub(crate) fn title_mut(&mut self) -> Option<&mut String> {
        match &mut self.body {
            NodeBody::Paper { title, .. }
            | NodeBody::Section { title, .. }
            | NodeBody::Subsection { title, .. }
            | NodeBody::Subsubsection { title, .. } => Some(title),
            NodeBody::Paragraph { .. } | NodeBody::Sentence { .. } => None,
        }
    }

    /// Sentence text, for leaves.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            NodeBody::Sentence { text } => Some(text),
            _ => None,
        }
    }

    /// Mutable sentence text, for leaves.
    pub(crate) fn text_mut(&mut self) -> Option<&mut String> {
        match &mut self.body {
            NodeBody::Sentence { text } => Some(text),
            _ => None,
        }
    }

    /// Child list, `None` for leaves.
    pub fn children(&self) -> Option<&[Node]> {
        match &self.body {
            NodeBody::Paper { children, .. }
            | NodeBody::Section { children, .. }
            | NodeBody::Subsection { children, .. }
            | NodeBody::Subsubsection { children, .. }
            | NodeBody::Paragraph { children } => Some(children),
            NodeBody::Sentence { .. } => None,
        }
    }

    /// Mutable child list, `None` for leaves.
    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match &mut self.body {
            NodeBody::Paper { children, .. }
            | NodeBody::Section { children, .. }
            | NodeBody::Subsection { children, .. }
            | NodeBody::Subsubsection { children, .. }
            | NodeBody::Paragraph { children } => Some(children),
            NodeBody::Sentence { .. } => None,
        }
    }

    /// Number of direct children (0 for leaves).
    pub fn child_count(&self) -> usize {
        self.children().map_or(0, |c| c.len())
    }

    /// Flat wire snapshot of this node (no children).
    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            block_id: self.block_id,
            kind: self.kind(),
            title: self.title().map(str::to_string),
            content: self.text().map(str::to_string),
            summary: self.summary.clone(),
            intent: self.intent.clone(),
            child_count: self.child_count(),
        }
    }

    /// Find a node in this subtree by id.
    pub fn find(&self, id: BlockId) -> Option<&Node> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.block_id == id {
                return Some(node);
            }
            if let Some(children) = node.children() {
                stack.extend(children.iter());
            }
        }
        None
    }

    /// Find a node in this subtree by id, mutably.
    pub fn find_mut(&mut self, id: BlockId) -> Option<&mut Node> {
        if self.block_id == id {
            return Some(self);
        }
        let children = self.children_mut()?;
        for child in children {
            if let Some(found) = child.find_mut(id) {
                return Some(found);
            }
        }
        None
    }

    /// Remove and return the child subtree rooted at `id`, searching this
    /// whole subtree. Does not match `self`.
    pub(crate) fn remove_descendant(&mut self, id: BlockId) -> Option<Node> {
        let children = self.children_mut()?;
        if let Some(pos) = children.iter().position(|c| c.block_id == id) {
            return Some(children.remove(pos));
        }
        for child in children {
            if let Some(removed) = child.remove_descendant(id) {
                return Some(removed);
            }
        }
        None
    }

    /// Iterate this subtree depth-first as `(depth, node)` pairs, self at
    /// depth 0. Truncates past [`MAX_TREE_DEPTH`].
    pub fn iter_dfs(&self) -> impl Iterator<Item = (usize, &Node)> {
        DfsIterator { stack: vec![(0, self)] }
    }

    /// Total number of nodes in this subtree, including self.
    pub fn subtree_len(&self) -> usize {
        self.iter_dfs().count()
    }
}

/// Depth-first iterator over a subtree.
///
/// The owned tree cannot cycle, but an over-deep tree (corrupted import)
/// is truncated at `MAX_TREE_DEPTH` rather than walked to exhaustion.
struct DfsIterator<'a> {
    stack: Vec<(usize, &'a Node)>,
}

impl<'a> Iterator for DfsIterator<'a> {
    type Item = (usize, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        if depth >= MAX_TREE_DEPTH {
            tracing::warn!("DFS iterator hit MAX_TREE_DEPTH ({MAX_TREE_DEPTH}), truncating");
            self.stack.clear();
            return None;
        }
        if let Some(children) = node.children() {
            // Push children in reverse to emit them in order
            for child in children.iter().rev() {
                self.stack.push((depth + 1, child));
            }
        }
        Some((depth, node))
    }
}

// ============================================================================
// Tests
// ============================================================================
