//! Paper document — the tree plus its mutation operations.
//!
//! [`PaperDoc`] is the only type permitted to change tree shape or leaf
//! content. Every mutation validates its references first and leaves the
//! tree untouched on error; every accepted mutation bumps the version
//! counter so index holders know to rebuild.
//!
//! Structural moves are deliberately not an operation — call-sites do
//! delete + insert, keeping the mutation surface small and auditable.

use quill_types::{BlockId, NodeField, NodeKind, NodeSnapshot, PaperMeta, UserId};

use crate::error::TreeError;
use crate::node::Node;
use crate::Result;

/// A paper: metadata plus the block tree, with the full mutation operation
/// set. The root node is created once with the document and can never be
/// deleted; everything underneath is fair game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperDoc {
    meta: PaperMeta,
    root: Node,
    /// Bumped on every accepted mutation. Indexes built at version V are
    /// valid until the version moves.
    version: u64,
}

impl PaperDoc {
    /// Create a new paper owned by `author`, with an empty root.
    pub fn new(author: UserId, title: impl Into<String>) -> Self {
        Self {
            meta: PaperMeta::new(author),
            root: Node::paper(title),
            version: 0,
        }
    }

    /// Reassemble a paper from its stored parts (authoritative fetch,
    /// deserialized import). Starts a fresh version counter.
    pub fn from_parts(meta: PaperMeta, root: Node) -> Self {
        Self { meta, root, version: 0 }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Paper metadata (author, collaborators).
    pub fn meta(&self) -> &PaperMeta {
        &self.meta
    }

    /// Mutable paper metadata, for collaborator management.
    pub fn meta_mut(&mut self) -> &mut PaperMeta {
        &mut self.meta
    }

    /// The root node of the tree.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Current document version (bumped on every mutation).
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Total number of blocks in the tree.
    pub fn block_count(&self) -> usize {
        self.root.subtree_len()
    }

    /// Whether the block exists in the tree.
    pub fn contains(&self, id: BlockId) -> bool {
        self.root.find(id).is_some()
    }

    /// Get a node by id.
    pub fn get(&self, id: BlockId) -> Option<&Node> {
        self.root.find(id)
    }

    /// Get a node's subtree as an owned clone (for wire responses).
    pub fn subtree(&self, id: BlockId) -> Option<Node> {
        self.root.find(id).cloned()
    }

    /// Get a node's flat snapshot.
    pub fn snapshot(&self, id: BlockId) -> Option<NodeSnapshot> {
        self.root.find(id).map(Node::snapshot)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Update a single field of a node. Content-only — never changes shape.
    ///
    /// Atomic from the caller's point of view: on any error the tree is
    /// unchanged; on success the full new value is in place. Returns the
    /// node's post-update snapshot.
    pub fn update_field(
        &mut self,
        id: BlockId,
        field: NodeField,
        value: &str,
    ) -> Result<NodeSnapshot> {
        let node = self.root.find_mut(id).ok_or(TreeError::NotFound(id))?;
        let kind = node.kind();
        if !field.applies_to(kind) {
            return Err(TreeError::UnsupportedField { id, kind, field });
        }
        match field {
            // applies_to guarantees the accessor matches the kind
            NodeField::Title => match node.title_mut() {
                Some(title) => *title = value.to_string(),
                None => return Err(TreeError::UnsupportedField { id, kind, field }),
            },
            NodeField::Content => match node.text_mut() {
                Some(text) => *text = value.to_string(),
                None => return Err(TreeError::UnsupportedField { id, kind, field }),
            },
            NodeField::Summary => node.summary = value.to_string(),
            NodeField::Intent => node.intent = value.to_string(),
        }
        let snap = node.snapshot();
        self.version += 1;
        Ok(snap)
    }

    /// Insert a new block of `kind` under `parent_id`, positioned immediately
    /// after the sibling `after` (or at index 0 when `after` is `None`).
    ///
    /// The new node gets a fresh, collision-free id and kind-appropriate
    /// defaults (see [`Node::with_defaults`]). A stale `after` — the sibling
    /// was deleted concurrently — falls back to appending at the end rather
    /// than failing: position is a UX convenience, not a correctness
    /// property. Returns the new block's id.
    pub fn insert_block(
        &mut self,
        parent_id: BlockId,
        after: Option<BlockId>,
        kind: NodeKind,
    ) -> Result<BlockId> {
        let node = Node::with_defaults(kind);
        let id = node.block_id;
        self.insert_subtree(parent_id, after, node)?;
        Ok(id)
    }

    /// Insert a fully built subtree under `parent_id` (same positioning rules
    /// as [`insert_block`](Self::insert_block)).
    ///
    /// Used when the authoritative store hands back an inserted subtree with
    /// server-assigned ids that must land where the optimistic copy sat.
    pub fn insert_subtree(
        &mut self,
        parent_id: BlockId,
        after: Option<BlockId>,
        subtree: Node,
    ) -> Result<()> {
        let parent = self
            .root
            .find_mut(parent_id)
            .ok_or(TreeError::ParentNotFound(parent_id))?;
        let parent_kind = parent.kind();
        if !parent_kind.may_contain(subtree.kind()) {
            return Err(TreeError::InvalidChildType {
                parent: parent_kind,
                child: subtree.kind(),
            });
        }
        // may_contain rules out leaves as parents
        let children = parent.children_mut().ok_or(TreeError::InvalidChildType {
            parent: parent_kind,
            child: subtree.kind(),
        })?;

        let pos = match after {
            None => 0,
            Some(after_id) => match children.iter().position(|c| c.block_id == after_id) {
                Some(idx) => idx + 1,
                None => {
                    tracing::debug!(
                        "stale after-sibling {} under {}, appending at end",
                        after_id,
                        parent_id
                    );
                    children.len()
                }
            },
        };
        children.insert(pos, subtree);
        self.version += 1;
        Ok(())
    }

    /// Delete the subtree rooted at `id` and return it.
    ///
    /// Deleting the paper root is always rejected.
    pub fn delete_block(&mut self, id: BlockId) -> Result<Node> {
        if id == self.root.block_id {
            return Err(TreeError::CannotDeleteRoot);
        }
        let removed = self
            .root
            .remove_descendant(id)
            .ok_or(TreeError::NotFound(id))?;
        self.version += 1;
        Ok(removed)
    }

    /// Replace the node holding `subtree`'s block id with `subtree`,
    /// preserving its position among its siblings.
    ///
    /// This is the reconciliation primitive: after a confirmed mutation the
    /// client swaps its optimistic copy for the authoritative one, keyed by
    /// block id — never by path, since positions may have shifted.
    pub fn replace_subtree(&mut self, subtree: Node) -> Result<()> {
        let id = subtree.block_id;
        let target = self.root.find_mut(id).ok_or(TreeError::NotFound(id))?;
        *target = subtree;
        self.version += 1;
        Ok(())
    }

    /// Replace the entire tree (full refresh from the authoritative store).
    pub fn replace_root(&mut self, root: Node) {
        self.root = root;
        self.version += 1;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::index::BlockIndex;

    fn test_doc() -> PaperDoc {
        PaperDoc::new(UserId::new(), "Test Paper")
    }

    /// Paper with one section containing one paragraph containing one
    /// sentence reading "Hello" — the shape used throughout the spec-style
    /// scenarios. Returns (doc, section, paragraph, sentence) ids.
    fn scenario_doc() -> (PaperDoc, BlockId, BlockId, BlockId) {
        let mut doc = test_doc();
        let root_id = doc.root().block_id;
        let sec = doc.insert_block(root_id, None, NodeKind::Section).unwrap();
        let par = doc.insert_block(sec, None, NodeKind::Paragraph).unwrap();
        // A fresh paragraph seeds one empty sentence; use it as "Hello".
        let sen = doc.get(par).unwrap().children().unwrap()[0].block_id;
        doc.update_field(sen, NodeField::Content, "Hello").unwrap();
        (doc, sec, par, sen)
    }

    // ── update_field ────────────────────────────────────────────────────

    #[test]
    fn test_update_title() {
        let (mut doc, sec, _, _) = scenario_doc();
        let snap = doc.update_field(sec, NodeField::Title, "Intro").unwrap();
        assert_eq!(snap.title.as_deref(), Some("Intro"));
        assert_eq!(doc.get(sec).unwrap().title(), Some("Intro"));
    }

    #[test]
    fn test_update_annotations_on_any_kind() {
        let (mut doc, _, par, sen) = scenario_doc();
        doc.update_field(par, NodeField::Summary, "greets the reader").unwrap();
        doc.update_field(sen, NodeField::Intent, "hook").unwrap();
        assert_eq!(doc.get(par).unwrap().summary, "greets the reader");
        assert_eq!(doc.get(sen).unwrap().intent, "hook");
    }

    #[test]
    fn test_update_field_not_found() {
        let mut doc = test_doc();
        let ghost = BlockId::new();
        assert_eq!(
            doc.update_field(ghost, NodeField::Summary, "x"),
            Err(TreeError::NotFound(ghost))
        );
    }

    #[test]
    fn test_update_unsupported_field_rejected() {
        let (mut doc, _, par, sen) = scenario_doc();
        let before = doc.version();
        assert!(matches!(
            doc.update_field(sen, NodeField::Title, "x"),
            Err(TreeError::UnsupportedField { .. })
        ));
        assert!(matches!(
            doc.update_field(par, NodeField::Content, "x"),
            Err(TreeError::UnsupportedField { .. })
        ));
        // Rejected operations leave the tree (and version) unchanged
        assert_eq!(doc.version(), before);
    }

    // ── insert_block ────────────────────────────────────────────────────

    #[test]
    fn test_insert_after_none_is_first() {
        let (mut doc, sec, par, _) = scenario_doc();
        let par2 = doc.insert_block(sec, None, NodeKind::Paragraph).unwrap();
        let children = doc.get(sec).unwrap().children().unwrap();
        assert_eq!(children[0].block_id, par2);
        assert_eq!(children[1].block_id, par);
    }

    #[test]
    fn test_insert_after_sibling() {
        let (mut doc, _, par, sen) = scenario_doc();
        let sen2 = doc.insert_block(par, Some(sen), NodeKind::Sentence).unwrap();
        let children = doc.get(par).unwrap().children().unwrap();
        let pos_sen = children.iter().position(|c| c.block_id == sen).unwrap();
        assert_eq!(children[pos_sen + 1].block_id, sen2);
        assert_eq!(doc.get(sen2).unwrap().text(), Some(""));
    }

    #[test]
    fn test_insert_stale_after_appends_at_end() {
        let (mut doc, _, par, _) = scenario_doc();
        let ghost = BlockId::new();
        let sen2 = doc.insert_block(par, Some(ghost), NodeKind::Sentence).unwrap();
        let children = doc.get(par).unwrap().children().unwrap();
        assert_eq!(children.last().unwrap().block_id, sen2);
    }

    #[test]
    fn test_insert_parent_not_found() {
        let mut doc = test_doc();
        let ghost = BlockId::new();
        assert_eq!(
            doc.insert_block(ghost, None, NodeKind::Section),
            Err(TreeError::ParentNotFound(ghost))
        );
    }

    #[test]
    fn test_insert_invalid_child_type() {
        let (mut doc, sec, par, _) = scenario_doc();
        assert_eq!(
            doc.insert_block(sec, None, NodeKind::Sentence),
            Err(TreeError::InvalidChildType {
                parent: NodeKind::Section,
                child: NodeKind::Sentence,
            })
        );
        // Paper is a root kind, never insertable
        assert!(matches!(
            doc.insert_block(par, None, NodeKind::Paper),
            Err(TreeError::InvalidChildType { .. })
        ));
    }

    #[test]
    fn test_insert_paragraph_directly_under_paper() {
        // Loose hierarchy: real papers put prose straight under the root.
        let mut doc = test_doc();
        let root_id = doc.root().block_id;
        let par = doc.insert_block(root_id, None, NodeKind::Paragraph).unwrap();
        assert_eq!(doc.get(par).unwrap().kind(), NodeKind::Paragraph);
    }

    #[test]
    fn test_all_ids_pairwise_distinct_across_inserts() {
        let mut doc = test_doc();
        let root_id = doc.root().block_id;
        for _ in 0..20 {
            let sec = doc.insert_block(root_id, None, NodeKind::Section).unwrap();
            doc.insert_block(sec, None, NodeKind::Paragraph).unwrap();
        }
        let mut seen = HashSet::new();
        for (_, node) in doc.root().iter_dfs() {
            assert!(seen.insert(node.block_id), "duplicate id {}", node.block_id);
        }
    }

    // ── delete_block ────────────────────────────────────────────────────

    #[test]
    fn test_delete_returns_subtree() {
        let (mut doc, sec, par, sen) = scenario_doc();
        let removed = doc.delete_block(sec).unwrap();
        assert_eq!(removed.block_id, sec);
        assert!(removed.find(par).is_some());
        assert!(removed.find(sen).is_some());
        assert!(!doc.contains(sec));
        assert!(!doc.contains(sen));
    }

    #[test]
    fn test_delete_root_rejected() {
        let mut doc = test_doc();
        let root_id = doc.root().block_id;
        assert_eq!(doc.delete_block(root_id), Err(TreeError::CannotDeleteRoot));
        assert!(doc.contains(root_id));
    }

    #[test]
    fn test_delete_not_found() {
        let mut doc = test_doc();
        let ghost = BlockId::new();
        assert_eq!(doc.delete_block(ghost), Err(TreeError::NotFound(ghost)));
    }

    #[test]
    fn test_delete_then_lookup_is_not_found() {
        let (mut doc, _, par, sen) = scenario_doc();
        doc.delete_block(sen).unwrap();
        let index = BlockIndex::build(doc.root());
        assert!(!index.contains(sen));
        assert!(index.lookup(doc.root(), sen).is_none());
        assert!(doc.get(par).unwrap().children().unwrap().iter().all(|c| c.block_id != sen));
    }

    // ── Spec scenario ───────────────────────────────────────────────────

    #[test]
    fn test_insert_then_delete_scenario() {
        // Paper → section → paragraph → sentence "Hello". Insert a new
        // sentence after it, then delete the original.
        let (mut doc, _, par, sen) = scenario_doc();

        let new_sen = doc.insert_block(par, Some(sen), NodeKind::Sentence).unwrap();
        assert_ne!(new_sen, sen);
        let children = doc.get(par).unwrap().children().unwrap();
        let pos_sen = children.iter().position(|c| c.block_id == sen).unwrap();
        assert_eq!(children[pos_sen + 1].block_id, new_sen);
        assert_eq!(doc.get(new_sen).unwrap().text(), Some(""));

        doc.delete_block(sen).unwrap();
        let children = doc.get(par).unwrap().children().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].block_id, new_sen);

        let index = BlockIndex::build(doc.root());
        assert!(index.lookup(doc.root(), sen).is_none());
    }

    // ── Commutativity of disjoint edits ─────────────────────────────────

    #[test]
    fn test_disjoint_field_edits_commute() {
        let (doc, sec, _, sen) = scenario_doc();

        let mut ab = doc.clone();
        ab.update_field(sec, NodeField::Title, "Intro").unwrap();
        ab.update_field(sen, NodeField::Content, "Hi there").unwrap();

        let mut ba = doc.clone();
        ba.update_field(sen, NodeField::Content, "Hi there").unwrap();
        ba.update_field(sec, NodeField::Title, "Intro").unwrap();

        assert_eq!(ab.root(), ba.root());
    }

    // ── Reconciliation primitives ───────────────────────────────────────

    #[test]
    fn test_replace_subtree_in_place() {
        let (mut doc, sec, par, sen) = scenario_doc();
        // Authoritative copy of the paragraph with different content
        let mut authoritative = doc.subtree(par).unwrap();
        *authoritative
            .find_mut(sen)
            .unwrap()
            .text_mut()
            .unwrap() = "Hello from the server".to_string();

        doc.replace_subtree(authoritative).unwrap();
        assert_eq!(doc.get(sen).unwrap().text(), Some("Hello from the server"));
        // Position unchanged
        assert_eq!(doc.get(sec).unwrap().children().unwrap()[0].block_id, par);
    }

    #[test]
    fn test_replace_subtree_unknown_id_fails() {
        let mut doc = test_doc();
        let stray = Node::with_defaults(NodeKind::Section);
        let stray_id = stray.block_id;
        assert_eq!(doc.replace_subtree(stray), Err(TreeError::NotFound(stray_id)));
    }

    #[test]
    fn test_version_bumps_on_every_mutation() {
        let (mut doc, sec, par, _) = scenario_doc();
        let v = doc.version();
        doc.update_field(sec, NodeField::Title, "t").unwrap();
        assert_eq!(doc.version(), v + 1);
        doc.insert_block(par, None, NodeKind::Sentence).unwrap();
        assert_eq!(doc.version(), v + 2);
        doc.delete_block(sec).unwrap();
        assert_eq!(doc.version(), v + 3);
    }

    // ── Round-trip ──────────────────────────────────────────────────────

    #[test]
    fn test_tree_json_roundtrip_structural_equality() {
        let (doc, _, _, _) = scenario_doc();
        let json = serde_json::to_string(doc.root()).unwrap();
        let parsed: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(doc.root(), &parsed);
    }
}
