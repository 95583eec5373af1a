//! Paper metadata types.
//!
//! `PaperMeta` captures the metadata of a paper — its identity, owner, and
//! collaborator set. This is the birth certificate, not the document tree;
//! the tree itself lives in the tree crate and is joined by `PaperId`.
//!
//! Access control is paper-level only: the author plus any collaborator may
//! edit any node. There are no node-level ACLs. The collaborator set itself
//! is mutable only by the author.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{PaperId, UserId};

/// Error from collaborator-set mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    /// Only the author may change the collaborator set.
    #[error("user {0} is not the author of this paper")]
    NotAuthor(UserId),
}

/// Metadata for a paper.
///
/// Used for listing, access checks, and display. The actual block tree lives
/// elsewhere; this is the lightweight summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMeta {
    /// Globally unique paper identifier.
    pub paper_id: PaperId,
    /// Owning user. Immutable for the paper's lifetime.
    pub author_id: UserId,
    /// Users with edit access. Sorted, deduplicated; excludes the author.
    pub collaborator_ids: Vec<UserId>,
    /// When this paper was created (Unix millis).
    pub created_at: u64,
}

impl PaperMeta {
    /// Create metadata for a freshly created paper.
    pub fn new(author_id: UserId) -> Self {
        Self {
            paper_id: PaperId::new(),
            author_id,
            collaborator_ids: Vec::new(),
            created_at: crate::now_millis(),
        }
    }

    /// Whether `user` may edit this paper (author or collaborator).
    pub fn can_edit(&self, user: UserId) -> bool {
        user == self.author_id || self.collaborator_ids.contains(&user)
    }

    /// Add a collaborator. Only the author may do this.
    ///
    /// Adding the author or an existing collaborator is a no-op.
    pub fn add_collaborator(
        &mut self,
        requested_by: UserId,
        user: UserId,
    ) -> Result<(), AccessError> {
        if requested_by != self.author_id {
            return Err(AccessError::NotAuthor(requested_by));
        }
        if user != self.author_id && !self.collaborator_ids.contains(&user) {
            self.collaborator_ids.push(user);
            self.collaborator_ids.sort();
        }
        Ok(())
    }

    /// Remove a collaborator. Only the author may do this.
    pub fn remove_collaborator(
        &mut self,
        requested_by: UserId,
        user: UserId,
    ) -> Result<(), AccessError> {
        if requested_by != self.author_id {
            return Err(AccessError::NotAuthor(requested_by));
        }
        self.collaborator_ids.retain(|c| *c != user);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_paper_meta() {
        let author = UserId::new();
        let meta = PaperMeta::new(author);
        assert_eq!(meta.author_id, author);
        assert!(meta.collaborator_ids.is_empty());
        assert!(meta.can_edit(author));
        assert!(!meta.can_edit(UserId::new()));
    }

    #[test]
    fn test_author_adds_and_removes_collaborator() {
        let author = UserId::new();
        let collab = UserId::new();
        let mut meta = PaperMeta::new(author);

        meta.add_collaborator(author, collab).unwrap();
        assert!(meta.can_edit(collab));

        meta.remove_collaborator(author, collab).unwrap();
        assert!(!meta.can_edit(collab));
    }

    #[test]
    fn test_non_author_cannot_mutate_collaborators() {
        let author = UserId::new();
        let collab = UserId::new();
        let stranger = UserId::new();
        let mut meta = PaperMeta::new(author);
        meta.add_collaborator(author, collab).unwrap();

        // Not even a collaborator may change the set
        assert_eq!(
            meta.add_collaborator(collab, stranger),
            Err(AccessError::NotAuthor(collab))
        );
        assert_eq!(
            meta.remove_collaborator(stranger, collab),
            Err(AccessError::NotAuthor(stranger))
        );
        assert!(meta.can_edit(collab));
    }

    #[test]
    fn test_add_is_idempotent_and_skips_author() {
        let author = UserId::new();
        let collab = UserId::new();
        let mut meta = PaperMeta::new(author);

        meta.add_collaborator(author, collab).unwrap();
        meta.add_collaborator(author, collab).unwrap();
        meta.add_collaborator(author, author).unwrap();

        assert_eq!(meta.collaborator_ids, vec![collab]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut meta = PaperMeta::new(UserId::new());
        meta.add_collaborator(meta.author_id, UserId::new()).unwrap();
        let json = serde_json::to_string(&meta).unwrap();
        let parsed: PaperMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, parsed);
    }
}
