//! Hierarchical block-tree document model for Quill.
//!
//! A paper is a recursive tree of typed blocks (section, subsection,
//! subsubsection, paragraph, sentence) rooted at a single paper node.
//! Every block carries a stable [`BlockId`](quill_types::BlockId) that
//! survives any structural change; positional paths exist only as derived,
//! snapshot-scoped addresses.
//!
//! # Design Philosophy
//!
//! Structure is explicit, not inferred from flat text. This enables:
//! - Block-level collaboration (two writers editing different sentences
//!   never conflict)
//! - Per-block annotations (summary, intent) that travel with the block
//! - Stable addressing for citations, comments, and review threads
//!
//! # Consistency Model
//!
//! This crate holds no locks and merges nothing. Conflict resolution is
//! last-write-wins per field, decided by the authoritative store; the
//! client layer applies edits optimistically and reconciles afterwards.
//! `NotFound` on a stale reference is a normal outcome, not a failure.
//!
//! Mutations go through [`PaperDoc`]; reads go through the tree directly
//! or through a [`BlockIndex`] built from a snapshot.

pub mod doc;
pub mod error;
pub mod index;
pub mod node;
pub mod path;

pub use doc::PaperDoc;
pub use error::TreeError;
pub use index::{BlockIndex, IndexEntry};
pub use node::{MAX_TREE_DEPTH, Node, NodeBody};
pub use path::{Breadcrumb, breadcrumbs, path_of, resolve_path, resolve_path_mut};

/// Result type for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;
