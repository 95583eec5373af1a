//! The authoritative-store contract and an in-memory reference store.
//!
//! [`PaperStore`] is the seam between the optimistic client layer and
//! whatever holds the truth (a server, a database, a test double). The
//! contract is deliberately narrow: fetch the tree, save one field, insert
//! one node, delete one subtree. The store decides every conflict; the
//! client never argues, it reconciles.
//!
//! [`MemoryStore`] is the reference implementation used by tests and local
//! single-process setups. It serializes all mutations through one lock,
//! which is exactly the ordering guarantee the contract requires.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use quill_tree::{Node, PaperDoc, TreeError};
use quill_types::{BlockId, NodeField, NodeKind, NodeSnapshot, PaperId, PaperMeta, UserId};

/// Errors from the authoritative store.
///
/// `NotFound` means the referenced block no longer exists on the server —
/// a concurrent collaborator got there first. It is a routine outcome and
/// every caller has a defined recovery path.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No paper with this id.
    #[error("paper not found: {0:?}")]
    PaperNotFound(PaperId),

    /// Referenced block no longer exists on the server.
    #[error("block not found: {0:?}")]
    NotFound(BlockId),

    /// User has no edit access to the paper.
    #[error("user {0} may not edit this paper")]
    NotAuthorized(UserId),

    /// The store validated the mutation and refused it.
    #[error("mutation rejected: {0}")]
    Rejected(TreeError),

    /// The store could not be reached. The mutation may be retried.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    fn from_tree(err: TreeError) -> Self {
        match err {
            TreeError::NotFound(id) | TreeError::ParentNotFound(id) => StoreError::NotFound(id),
            other => StoreError::Rejected(other),
        }
    }
}

/// The authoritative store for papers.
///
/// Implementations must apply mutations in a single total order per paper;
/// the order in which concurrent saves land IS the conflict resolution
/// (last write wins, per node and field).
#[async_trait]
pub trait PaperStore: Send + Sync {
    /// Fetch a paper's metadata and full tree.
    async fn get_tree(&self, paper: PaperId) -> Result<(PaperMeta, Node), StoreError>;

    /// Persist one field of one node. Returns the node's authoritative
    /// snapshot after the write.
    async fn save_field(
        &self,
        paper: PaperId,
        user: UserId,
        id: BlockId,
        field: NodeField,
        value: &str,
    ) -> Result<NodeSnapshot, StoreError>;

    /// Insert a new node. The store assigns the id; the returned subtree
    /// (the node plus any kind defaults, such as a paragraph's seed
    /// sentence) is authoritative.
    async fn insert_node(
        &self,
        paper: PaperId,
        user: UserId,
        parent: BlockId,
        after: Option<BlockId>,
        kind: NodeKind,
    ) -> Result<Node, StoreError>;

    /// Delete the subtree rooted at `id`.
    async fn delete_node(
        &self,
        paper: PaperId,
        user: UserId,
        id: BlockId,
    ) -> Result<(), StoreError>;
}

/// In-memory [`PaperStore`] holding papers behind a single async lock.
///
/// The reference implementation: one total mutation order per store, access
/// checks on every write. Tests point several clients at one `MemoryStore`
/// to exercise concurrent-edit reconciliation; the `set_offline` switch
/// simulates an outage.
#[derive(Default)]
pub struct MemoryStore {
    papers: Mutex<HashMap<PaperId, PaperDoc>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a paper to the store, returning its id.
    pub async fn insert_paper(&self, doc: PaperDoc) -> PaperId {
        let id = doc.meta().paper_id;
        self.papers.lock().await.insert(id, doc);
        id
    }

    /// Simulate an outage: while offline, every call fails `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PaperStore for MemoryStore {
    async fn get_tree(&self, paper: PaperId) -> Result<(PaperMeta, Node), StoreError> {
        self.check_online()?;
        let papers = self.papers.lock().await;
        let doc = papers.get(&paper).ok_or(StoreError::PaperNotFound(paper))?;
        Ok((doc.meta().clone(), doc.root().clone()))
    }

    async fn save_field(
        &self,
        paper: PaperId,
        user: UserId,
        id: BlockId,
        field: NodeField,
        value: &str,
    ) -> Result<NodeSnapshot, StoreError> {
        self.check_online()?;
        let mut papers = self.papers.lock().await;
        let doc = papers
            .get_mut(&paper)
            .ok_or(StoreError::PaperNotFound(paper))?;
        if !doc.meta().can_edit(user) {
            return Err(StoreError::NotAuthorized(user));
        }
        doc.update_field(id, field, value)
            .map_err(StoreError::from_tree)
    }

    async fn insert_node(
        &self,
        paper: PaperId,
        user: UserId,
        parent: BlockId,
        after: Option<BlockId>,
        kind: NodeKind,
    ) -> Result<Node, StoreError> {
        self.check_online()?;
        let mut papers = self.papers.lock().await;
        let doc = papers
            .get_mut(&paper)
            .ok_or(StoreError::PaperNotFound(paper))?;
        if !doc.meta().can_edit(user) {
            return Err(StoreError::NotAuthorized(user));
        }
        let id = doc
            .insert_block(parent, after, kind)
            .map_err(StoreError::from_tree)?;
        // Freshly inserted, must exist
        doc.subtree(id).ok_or(StoreError::NotFound(id))
    }

    async fn delete_node(
        &self,
        paper: PaperId,
        user: UserId,
        id: BlockId,
    ) -> Result<(), StoreError> {
        self.check_online()?;
        let mut papers = self.papers.lock().await;
        let doc = papers
            .get_mut(&paper)
            .ok_or(StoreError::PaperNotFound(paper))?;
        if !doc.meta().can_edit(user) {
            return Err(StoreError::NotAuthorized(user));
        }
        doc.delete_block(id)
            .map(|_| ())
            .map_err(StoreError::from_tree)
    }
}

// ============================================================================
// Tests
// ============================================================================
