//! Typed identifiers for papers, blocks, and users.
//!
//! All ID types wrap UUIDv7 (time-ordered, globally unique). They're opaque on
//! the wire (serde-transparent, so JSON sees a plain UUID string) and display
//! as standard UUID text for logging. The `short()` form (first 8 hex chars)
//! is for human-facing UI — never used as a lookup key.
//!
//! `BlockId` is the durable identity of a tree node: assigned once at
//! creation, never reused or reassigned, stable across every tree reshape.
//! Positional paths are snapshots; block ids are forever.
//!
//! `UserId` also has a deterministic sentinel via `UserId::system()`, derived
//! from UUIDv5 for server-generated edits (import, migration).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A paper (document) identifier (UUIDv7).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaperId(uuid::Uuid);

/// A block (tree node) identifier (UUIDv7).
///
/// Unique across the entire paper, not just among siblings. Fresh ids come
/// from `BlockId::new()`; two collaborators inserting in the same millisecond
/// cannot collide (122 bits of entropy beyond the timestamp).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(uuid::Uuid);

/// A user identifier (UUIDv7, or UUIDv5 for sentinels).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(uuid::Uuid);

// ── Shared behavior ─────────────────────────────────────────────────────────

macro_rules! impl_typed_id {
    ($T:ident, $name:literal) => {
        impl $T {
            /// Create a new time-ordered ID (UUIDv7).
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// First 8 hex characters — for human display only, not lookup.
            pub fn short(&self) -> String {
                self.0.as_simple().to_string()[..8].to_string()
            }

            /// Full 32-character hex string (no hyphens).
            pub fn to_hex(&self) -> String {
                self.0.as_simple().to_string()
            }

            /// The raw 16 bytes.
            pub fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }

            /// Reconstruct from 16 bytes.
            pub fn from_bytes(b: [u8; 16]) -> Self {
                Self(uuid::Uuid::from_bytes(b))
            }

            /// Parse from a hex string (32 chars, no hyphens) or standard UUID format.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                uuid::Uuid::parse_str(s).map(Self)
            }

            /// A nil / zero ID — for sentinel values only.
            pub fn nil() -> Self {
                Self(uuid::Uuid::nil())
            }

            /// Check if this is the nil ID.
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl Default for $T {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<uuid::Uuid> for $T {
            fn from(u: uuid::Uuid) -> Self {
                Self(u)
            }
        }

        impl From<$T> for uuid::Uuid {
            fn from(id: $T) -> uuid::Uuid {
                id.0
            }
        }

        impl fmt::Display for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // Full UUID with hyphens for log readability
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $name, self.short())
            }
        }
    };
}

impl_typed_id!(PaperId, "PaperId");
impl_typed_id!(BlockId, "BlockId");
impl_typed_id!(UserId, "UserId");

// ── UserId sentinels ────────────────────────────────────────────────────────

/// Fixed namespace for deriving deterministic UserIds via UUIDv5.
const QUILL_USER_NS: uuid::Uuid = uuid::uuid!("4f1c9a2e-8d57-4b36-9e0a-72c5d81f6ab3");

impl UserId {
    /// The well-known "system" user.
    ///
    /// Used for server-generated edits (document import, schema migration).
    /// Deterministic: same value every time (UUIDv5 derived from `b"system"`).
    pub fn system() -> Self {
        Self(uuid::Uuid::new_v5(&QUILL_USER_NS, b"system"))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ── Basic ID operations ─────────────────────────────────────────────

    #[test]
    fn test_new_is_unique() {
        let a = BlockId::new();
        let b = BlockId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_short_is_8_chars() {
        let id = PaperId::new();
        assert_eq!(id.short().len(), 8);
    }

    #[test]
    fn test_hex_is_32_chars() {
        let id = BlockId::new();
        assert_eq!(id.to_hex().len(), 32);
    }

    #[test]
    fn test_roundtrip_bytes() {
        let id = BlockId::new();
        let bytes = *id.as_bytes();
        let id2 = BlockId::from_bytes(bytes);
        assert_eq!(id, id2);
    }

    #[test]
    fn test_parse_hex() {
        let id = BlockId::new();
        let hex = id.to_hex();
        let parsed = BlockId::parse(&hex).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_uuid_format() {
        let id = PaperId::new();
        let uuid_str = id.to_string(); // has hyphens
        let parsed = PaperId::parse(&uuid_str).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(BlockId::parse("not-a-uuid").is_err());
        assert!(BlockId::parse("").is_err());
    }

    #[test]
    fn test_nil() {
        let id = BlockId::nil();
        assert!(id.is_nil());
        assert!(!BlockId::new().is_nil());
    }

    #[test]
    fn test_ordering_is_time_ordered() {
        // v7 ids sort by creation time across millisecond boundaries.
        let earlier = BlockId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let later = BlockId::new();
        assert!(later > earlier);
    }

    #[test]
    fn test_hash_usable_as_map_key() {
        use std::collections::HashMap;
        let id = BlockId::new();
        let mut map = HashMap::new();
        map.insert(id, "hello");
        assert_eq!(map.get(&id), Some(&"hello"));
    }

    #[test]
    fn test_is_copy() {
        let id = BlockId::new();
        let a = id; // move
        let b = id; // copy — would fail without Copy
        assert_eq!(a, b);
    }

    // ── Serde roundtrips ────────────────────────────────────────────────

    #[test]
    fn test_serde_roundtrip_paper_id() {
        let id = PaperId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: PaperId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_serde_roundtrip_block_id() {
        let id = BlockId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: BlockId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_serde_block_id_is_plain_string() {
        // serde(transparent) — wire format is an opaque string, per contract.
        let id = BlockId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert!(json.starts_with('"') && json.ends_with('"'));
    }

    #[test]
    fn test_postcard_roundtrip_block_id() {
        let id = BlockId::new();
        let bytes = postcard::to_stdvec(&id).unwrap();
        let parsed: BlockId = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_postcard_roundtrip_user_id() {
        let id = UserId::new();
        let bytes = postcard::to_stdvec(&id).unwrap();
        let parsed: UserId = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(id, parsed);
    }

    // ── UserId::system() ────────────────────────────────────────────────

    #[test]
    fn test_system_user_is_deterministic() {
        let a = UserId::system();
        let b = UserId::system();
        assert_eq!(a, b);
    }

    #[test]
    fn test_system_user_differs_from_new() {
        let system = UserId::system();
        let fresh = UserId::new();
        assert_ne!(system, fresh);
    }

    // ── Display / Debug formatting ──────────────────────────────────────

    #[test]
    fn test_display_is_full_uuid_with_hyphens() {
        let id = BlockId::new();
        let displayed = id.to_string();
        // Standard UUID format: 8-4-4-4-12
        assert_eq!(displayed.len(), 36);
        assert_eq!(displayed.chars().filter(|c| *c == '-').count(), 4);
    }

    #[test]
    fn test_debug_shows_type_and_short() {
        let id = PaperId::new();
        let debug = format!("{:?}", id);
        assert!(debug.starts_with("PaperId("));
        assert!(debug.ends_with(')'));
        let inner = &debug["PaperId(".len()..debug.len() - 1];
        assert_eq!(inner.len(), 8);
    }

    #[test]
    fn test_type_safety_distinct_newtypes() {
        // Same underlying bytes, different types — Debug shows which is which.
        let bytes = *PaperId::new().as_bytes();
        let paper = PaperId::from_bytes(bytes);
        let block = BlockId::from_bytes(bytes);
        let user = UserId::from_bytes(bytes);

        assert_eq!(paper.as_bytes(), block.as_bytes());
        assert_eq!(block.as_bytes(), user.as_bytes());

        assert!(format!("{:?}", paper).starts_with("PaperId("));
        assert!(format!("{:?}", block).starts_with("BlockId("));
        assert!(format!("{:?}", user).starts_with("UserId("));
    }

    // ── From conversions ────────────────────────────────────────────────

    #[test]
    fn test_from_uuid_preserves_identity() {
        let u = uuid::Uuid::now_v7();
        let id = BlockId::from(u);
        let back: uuid::Uuid = id.into();
        assert_eq!(u, back);
    }
}
