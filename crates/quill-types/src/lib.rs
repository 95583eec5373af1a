//! Shared identity and node types for Quill.
//!
//! This crate is the relational foundation: typed IDs, node kinds, editable
//! fields, wire snapshots, and paper metadata. It has **no internal quill
//! dependencies** — a pure leaf crate that other crates build on.
//!
//! # Entity-Relationship Overview
//!
//! ```text
//! Paper (PaperId) ← one document tree
//!     └── owned by User (UserId, the author)
//!     └── edited by Users (collaborator_ids)
//!     └── roots a Node tree (BlockId per node)
//!
//! Node (BlockId) ← one element of the tree
//!     └── kind: paper | section | subsection | subsubsection | paragraph | sentence
//!     └── fields: title / content / summary / intent (NodeField)
//!     └── joined by annotations (chat, comments, history) via (PaperId, BlockId)
//! ```
//!
//! # Key Types
//!
//! |------------------|-----------------------------------------------|
//! | Type             | Purpose                                       |
//! |------------------|-----------------------------------------------|
//! | [`PaperId`]      | Which paper                                   |
//! | [`BlockId`]      | Which node — stable across tree reshapes      |
//! | [`UserId`]       | Who (author, collaborator, or system)         |
//! | [`NodeKind`]     | The six tree levels (closed enum)             |
//! | [`NodeField`]    | Editable single field of a node               |
//! | [`NodeSnapshot`] | Flat wire view of one node (no children)      |
//! | [`PaperMeta`]    | Paper birth certificate (author + access set) |
//! |------------------|-----------------------------------------------|

pub mod ids;
pub mod node;
pub mod paper;

// Re-export primary types at crate root for convenience.
pub use ids::{BlockId, PaperId, UserId};
pub use node::{NodeField, NodeKind, NodeSnapshot};
pub use paper::{AccessError, PaperMeta};

/// Current time as Unix milliseconds. Used by constructors throughout the crate.
pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
