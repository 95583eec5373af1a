//! Error types for tree operations.

use thiserror::Error;

use quill_types::{BlockId, NodeField, NodeKind};

/// Errors that can occur during tree operations.
///
/// `NotFound` is a normal, expected outcome — a stale reference after a
/// concurrent delete — and callers recover by re-resolving or clearing
/// their view, never by aborting.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    /// Referenced block no longer exists in the tree.
    #[error("block not found: {0:?}")]
    NotFound(BlockId),

    /// Insert target parent no longer exists.
    #[error("parent block not found: {0:?}")]
    ParentNotFound(BlockId),

    /// Insert attempted with a child kind not permitted under the parent kind.
    #[error("a {child} cannot be inserted under a {parent}")]
    InvalidChildType { parent: NodeKind, child: NodeKind },

    /// Attempted deletion of the paper root. Always rejected.
    #[error("the paper root cannot be deleted")]
    CannotDeleteRoot,

    /// Field update attempted on a kind that doesn't carry the field.
    #[error("field {field} does not apply to {kind} block {id:?}")]
    UnsupportedField {
        id: BlockId,
        kind: NodeKind,
        field: NodeField,
    },

    /// Positional path walked out of bounds or into a leaf.
    #[error("path {0:?} does not resolve to a node")]
    PathNotFound(Vec<usize>),
}
