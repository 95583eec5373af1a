//! Optimistic editing session over one paper.
//!
//! [`SyncedPaper`] bundles a local [`PaperDoc`] replica with the
//! reconciliation bookkeeping: every edit applies locally first, then goes
//! to the authoritative store, and the store's answer is folded back in.
//! The store's ordering IS the conflict resolution (last write wins per
//! node and field); this type never merges, it converges.
//!
//! Structural mutations (insert, delete) are serialized per subtree: while
//! one is in flight, a second one touching an overlapping subtree is
//! refused with [`ClientError::MutationInFlight`]. Field updates are never
//! blocked — concurrent text edits to different nodes are independent by
//! construction, and same-field races resolve last-write-wins.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, warn};

use quill_tree::{BlockIndex, Breadcrumb, Node, PaperDoc, TreeError, breadcrumbs};
use quill_types::{BlockId, NodeField, NodeKind, NodeSnapshot, PaperId, PaperMeta, UserId};

use crate::store::{PaperStore, StoreError};

/// Errors from the client editing layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Local tree operation failed (stale reference, bad kind, ...).
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// The authoritative store refused or could not take the mutation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A structural mutation is already in flight for an overlapping
    /// subtree. Wait for it to settle and retry.
    #[error("a structural mutation is already in flight near {0:?}")]
    MutationInFlight(BlockId),
}

/// How an optimistic edit settled against the authoritative store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The store confirmed the edit; local and authoritative state agree.
    Confirmed,
    /// The target was deleted remotely before the edit landed. The local
    /// optimistic change has been rolled back along with the target.
    RemovedRemotely,
    /// The store was unreachable. The optimistic change is kept locally
    /// and flagged unconfirmed; call `refresh` once connectivity returns.
    Unconfirmed,
}

/// In-flight structural mutation, keyed by its subtree anchor.
#[derive(Debug)]
enum Pending {
    /// Optimistic insert. The key is the temporary local id.
    Insert,
    /// Optimistic delete. The removed subtree is kept for rollback.
    Delete { parent: BlockId, removed: Node },
}

/// One user's editing session over one paper.
///
/// Owns the local replica, its block index, and the pending/unconfirmed
/// sets. All mutation methods come in an async one-shot form
/// (`update_field`, `insert_block`, `delete_block`) that drives the full
/// optimistic-apply / store-call / reconcile cycle against a
/// [`PaperStore`]; the `begin_*` / `confirm_*` / `fail_*` halves are public
/// for callers that manage their own transport.
pub struct SyncedPaper {
    user: UserId,
    doc: PaperDoc,
    index: BlockIndex,
    pending: HashMap<BlockId, Pending>,
    unconfirmed: HashSet<BlockId>,
}

impl SyncedPaper {
    /// Start a session over an already-fetched document.
    pub fn new(user: UserId, doc: PaperDoc) -> Self {
        let index = BlockIndex::build(doc.root());
        Self {
            user,
            doc,
            index,
            pending: HashMap::new(),
            unconfirmed: HashSet::new(),
        }
    }

    /// Fetch a paper from the store and start a session over it.
    pub async fn open(
        store: &dyn PaperStore,
        paper: PaperId,
        user: UserId,
    ) -> Result<Self, ClientError> {
        let (meta, root) = store.get_tree(paper).await?;
        Ok(Self::new(user, PaperDoc::from_parts(meta, root)))
    }

    // =========================================================================
    // Read accessors
    // =========================================================================

    /// The editing user.
    pub fn user(&self) -> UserId {
        self.user
    }

    /// The paper id.
    pub fn paper_id(&self) -> PaperId {
        self.doc.meta().paper_id
    }

    /// Paper metadata.
    pub fn meta(&self) -> &PaperMeta {
        self.doc.meta()
    }

    /// The local replica.
    pub fn doc(&self) -> &PaperDoc {
        &self.doc
    }

    /// The current block index (rebuilt after every structural change).
    pub fn index(&self) -> &BlockIndex {
        &self.index
    }

    /// Flat snapshot of one block, or `None` for a stale reference.
    pub fn snapshot(&self, id: BlockId) -> Option<NodeSnapshot> {
        self.doc.snapshot(id)
    }

    /// Breadcrumb chain for a block, root-first. `None` for a stale
    /// reference — clear the selection instead of rendering a bogus trail.
    pub fn breadcrumbs(&self, id: BlockId) -> Option<Vec<Breadcrumb>> {
        breadcrumbs(self.doc.root(), &self.index, id)
    }

    /// Whether any structural mutation is currently in flight.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Blocks whose last local write was never confirmed by the store.
    /// Non-empty after an outage; cleared by `refresh`.
    pub fn unconfirmed(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.unconfirmed.iter().copied()
    }

    /// Whether local state is known to match the store.
    pub fn is_synced(&self) -> bool {
        self.pending.is_empty() && self.unconfirmed.is_empty()
    }

    fn reindex(&mut self) {
        self.index = BlockIndex::build(self.doc.root());
    }

    /// Refuse a structural mutation whose subtree overlaps an in-flight
    /// one. Two anchors overlap when one is an ancestor-or-self of the
    /// other, as of the current index.
    fn structural_guard(&self, target: BlockId) -> Result<(), ClientError> {
        for (&anchor, pending) in &self.pending {
            // A pending delete's subtree is gone from the tree; its parent
            // is where the overlap check re-attaches.
            let anchor = match pending {
                Pending::Insert => anchor,
                Pending::Delete { parent, .. } => *parent,
            };
            if anchor == target {
                return Err(ClientError::MutationInFlight(anchor));
            }
            if let Some(ancestors) = self.index.ancestors(target) {
                if ancestors.contains(&anchor) {
                    return Err(ClientError::MutationInFlight(anchor));
                }
            }
            if let Some(ancestors) = self.index.ancestors(anchor) {
                if ancestors.contains(&target) {
                    return Err(ClientError::MutationInFlight(anchor));
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Field updates — optimistic, never blocked
    // =========================================================================

    /// Apply a field edit locally. Returns the post-edit snapshot.
    ///
    /// The edit is flagged unconfirmed until `confirm_update` (or rolled
    /// back by `fail_update`).
    pub fn begin_update(
        &mut self,
        id: BlockId,
        field: NodeField,
        value: &str,
    ) -> Result<NodeSnapshot, ClientError> {
        let snap = self.doc.update_field(id, field, value)?;
        self.unconfirmed.insert(id);
        Ok(snap)
    }

    /// Fold the store's authoritative snapshot back in.
    ///
    /// The authoritative values may differ from what we sent — another
    /// writer's save may have landed after ours. Last write wins, so the
    /// store's answer overwrites the optimistic one, field by field.
    pub fn confirm_update(&mut self, authoritative: &NodeSnapshot) -> Result<(), ClientError> {
        let id = authoritative.block_id;
        if let Some(title) = &authoritative.title {
            self.doc.update_field(id, NodeField::Title, title)?;
        }
        if let Some(content) = &authoritative.content {
            self.doc.update_field(id, NodeField::Content, content)?;
        }
        self.doc
            .update_field(id, NodeField::Summary, &authoritative.summary)?;
        self.doc
            .update_field(id, NodeField::Intent, &authoritative.intent)?;
        self.unconfirmed.remove(&id);
        Ok(())
    }

    /// Settle a failed field save.
    ///
    /// `NotFound` means the node was deleted remotely: the local copy is
    /// dropped too. `Unavailable` keeps the optimistic value and leaves
    /// the block flagged unconfirmed. Anything else propagates.
    pub fn fail_update(
        &mut self,
        id: BlockId,
        err: StoreError,
    ) -> Result<ApplyOutcome, ClientError> {
        match err {
            StoreError::NotFound(_) => {
                debug!("block {} deleted remotely, dropping local copy", id);
                self.unconfirmed.remove(&id);
                if self.doc.delete_block(id).is_ok() {
                    self.reindex();
                }
                Ok(ApplyOutcome::RemovedRemotely)
            }
            StoreError::Unavailable(reason) => {
                warn!("field save for {} not confirmed: {}", id, reason);
                Ok(ApplyOutcome::Unconfirmed)
            }
            other => Err(other.into()),
        }
    }

    /// Edit one field end to end: apply locally, save to the store,
    /// reconcile the answer.
    pub async fn update_field(
        &mut self,
        store: &dyn PaperStore,
        id: BlockId,
        field: NodeField,
        value: &str,
    ) -> Result<ApplyOutcome, ClientError> {
        self.begin_update(id, field, value)?;
        match store
            .save_field(self.paper_id(), self.user, id, field, value)
            .await
        {
            Ok(snap) => {
                self.confirm_update(&snap)?;
                Ok(ApplyOutcome::Confirmed)
            }
            Err(err) => self.fail_update(id, err),
        }
    }

    // =========================================================================
    // Inserts — optimistic with a temporary id
    // =========================================================================

    /// Insert a block locally under a temporary id.
    ///
    /// The store assigns real ids, so the optimistic node lives under a
    /// local id until `confirm_insert` swaps in the authoritative subtree.
    pub fn begin_insert(
        &mut self,
        parent: BlockId,
        after: Option<BlockId>,
        kind: NodeKind,
    ) -> Result<BlockId, ClientError> {
        self.structural_guard(parent)?;
        let temp = self.doc.insert_block(parent, after, kind)?;
        self.pending.insert(temp, Pending::Insert);
        self.reindex();
        Ok(temp)
    }

    /// Replace the optimistic node with the store's authoritative subtree,
    /// at the same position. Returns the authoritative id.
    pub fn confirm_insert(
        &mut self,
        temp: BlockId,
        authoritative: Node,
    ) -> Result<BlockId, ClientError> {
        let id = authoritative.block_id;
        let parent = self
            .index
            .parent_of(temp)
            .flatten()
            .ok_or(TreeError::NotFound(temp))?;
        // Reinsert where the temp node sits now, not where it was created:
        // siblings may have moved underneath it.
        let after = self.index.path_of(temp).and_then(|path| {
            let pos = *path.last()?;
            if pos == 0 {
                None
            } else {
                let node = self.doc.get(parent)?;
                Some(node.children()?.get(pos - 1)?.block_id)
            }
        });
        self.doc.delete_block(temp)?;
        self.doc.insert_subtree(parent, after, authoritative)?;
        self.pending.remove(&temp);
        self.reindex();
        Ok(id)
    }

    /// Settle a failed insert.
    pub fn fail_insert(
        &mut self,
        temp: BlockId,
        err: StoreError,
    ) -> Result<ApplyOutcome, ClientError> {
        match err {
            StoreError::NotFound(_) => {
                debug!("insert parent vanished remotely, rolling back {}", temp);
                self.pending.remove(&temp);
                if self.doc.delete_block(temp).is_ok() {
                    self.reindex();
                }
                Ok(ApplyOutcome::RemovedRemotely)
            }
            StoreError::Unavailable(reason) => {
                warn!("insert {} not confirmed: {}", temp, reason);
                // Keep the node visible under its temporary id. It cannot
                // be saved to the store until refresh re-bases the session.
                self.pending.remove(&temp);
                self.unconfirmed.insert(temp);
                Ok(ApplyOutcome::Unconfirmed)
            }
            other => {
                self.pending.remove(&temp);
                if self.doc.delete_block(temp).is_ok() {
                    self.reindex();
                }
                Err(other.into())
            }
        }
    }

    /// Insert a block end to end. On success returns the store-assigned id
    /// and `Confirmed`; after an outage returns the temporary local id and
    /// `Unconfirmed`; `None` when the parent vanished remotely.
    pub async fn insert_block(
        &mut self,
        store: &dyn PaperStore,
        parent: BlockId,
        after: Option<BlockId>,
        kind: NodeKind,
    ) -> Result<(Option<BlockId>, ApplyOutcome), ClientError> {
        let temp = self.begin_insert(parent, after, kind)?;
        match store
            .insert_node(self.paper_id(), self.user, parent, after, kind)
            .await
        {
            Ok(subtree) => {
                let id = self.confirm_insert(temp, subtree)?;
                Ok((Some(id), ApplyOutcome::Confirmed))
            }
            Err(err) => match self.fail_insert(temp, err)? {
                ApplyOutcome::Unconfirmed => Ok((Some(temp), ApplyOutcome::Unconfirmed)),
                outcome => Ok((None, outcome)),
            },
        }
    }

    // =========================================================================
    // Deletes — optimistic with rollback subtree
    // =========================================================================

    /// Delete a subtree locally, keeping it for rollback until the store
    /// answers.
    pub fn begin_delete(&mut self, id: BlockId) -> Result<(), ClientError> {
        self.structural_guard(id)?;
        let parent = match self.index.parent_of(id) {
            Some(Some(parent)) => parent,
            Some(None) => return Err(TreeError::CannotDeleteRoot.into()),
            None => return Err(TreeError::NotFound(id).into()),
        };
        let removed = self.doc.delete_block(id)?;
        self.pending.insert(id, Pending::Delete { parent, removed });
        self.reindex();
        Ok(())
    }

    /// The store confirmed the delete (an explicit OK, or `NotFound`
    /// because another collaborator deleted it first — same end state).
    pub fn confirm_delete(&mut self, id: BlockId) {
        self.pending.remove(&id);
    }

    /// Settle a failed delete.
    ///
    /// `Unavailable` keeps the optimistic deletion and flags the parent
    /// unconfirmed. A store rejection restores the removed subtree.
    pub fn fail_delete(
        &mut self,
        id: BlockId,
        err: StoreError,
    ) -> Result<ApplyOutcome, ClientError> {
        let Some(Pending::Delete { parent, removed }) = self.pending.remove(&id) else {
            return Err(TreeError::NotFound(id).into());
        };
        match err {
            StoreError::Unavailable(reason) => {
                warn!("delete of {} not confirmed: {}", id, reason);
                self.unconfirmed.insert(parent);
                Ok(ApplyOutcome::Unconfirmed)
            }
            other => {
                // Rejected outright: put the subtree back. Position within
                // the siblings is not preserved; refresh restores order.
                self.doc.insert_subtree(parent, None, removed)?;
                self.reindex();
                Err(other.into())
            }
        }
    }

    /// Delete a block end to end.
    pub async fn delete_block(
        &mut self,
        store: &dyn PaperStore,
        id: BlockId,
    ) -> Result<ApplyOutcome, ClientError> {
        self.begin_delete(id)?;
        match store.delete_node(self.paper_id(), self.user, id).await {
            Ok(()) => {
                self.confirm_delete(id);
                Ok(ApplyOutcome::Confirmed)
            }
            Err(StoreError::NotFound(_)) => {
                // Already gone on the server. Converged.
                self.confirm_delete(id);
                Ok(ApplyOutcome::Confirmed)
            }
            Err(err) => self.fail_delete(id, err),
        }
    }

    // =========================================================================
    // Resync
    // =========================================================================

    /// Drop all local divergence and re-fetch the authoritative tree.
    ///
    /// Unconfirmed optimistic edits are discarded; the store's view wins.
    /// This is the recovery path after an outage.
    pub async fn refresh(&mut self, store: &dyn PaperStore) -> Result<(), ClientError> {
        let (meta, root) = store.get_tree(self.paper_id()).await?;
        self.doc = PaperDoc::from_parts(meta, root);
        self.pending.clear();
        self.unconfirmed.clear();
        self.reindex();
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
