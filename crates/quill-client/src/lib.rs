//! Client-side editing layer for quill papers.
//!
//! Wraps the tree model from `quill-tree` with the optimistic-apply /
//! reconcile cycle: edits land locally first, go to the authoritative
//! [`PaperStore`], and the store's answer is folded back in. Conflicts are
//! resolved by store ordering (last write wins per node and field), never
//! by merging.
//!
//! Consumers hold a [`SyncedPaper`] per open document and a store handle;
//! everything else is internal.

pub mod store;
pub mod synced_paper;

pub use store::{MemoryStore, PaperStore, StoreError};
pub use synced_paper::{ApplyOutcome, ClientError, SyncedPaper};
