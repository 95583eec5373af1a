//! Node kinds, editable fields, and the flat wire snapshot.
//!
//! `NodeKind` is the closed set of six tree levels. The parent/child table
//! lives here (`NodeKind::may_contain`) so both the tree crate and the
//! authoritative store validate inserts against the same rules. The table is
//! deliberately loose — paragraphs may sit directly under any container, the
//! way real papers skip levels — but sentences live only inside paragraphs.
//!
//! `NodeSnapshot` is the flat, child-free view of one node used on the wire
//! and as the join shape for annotations (chat, comments, edit history),
//! which attach purely by `(PaperId, BlockId)`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::ids::BlockId;

/// What a node *is* — its level in the document hierarchy.
///
/// Fixed at creation, immutable for the node's lifetime. Every operation on
/// the tree matches this exhaustively; adding a level is a compile-time
/// change, not a string comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum NodeKind {
    /// Document root. Exactly one per tree, never insertable as a child.
    Paper,
    /// Top-level section.
    Section,
    /// Second-level section.
    Subsection,
    /// Third-level section.
    #[strum(serialize = "subsubsection", serialize = "sub_subsection")]
    Subsubsection,
    /// Prose unit holding sentences.
    #[strum(serialize = "paragraph", serialize = "para")]
    Paragraph,
    /// Leaf with text content.
    Sentence,
}

impl NodeKind {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Paper => "paper",
            NodeKind::Section => "section",
            NodeKind::Subsection => "subsection",
            NodeKind::Subsubsection => "subsubsection",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Sentence => "sentence",
        }
    }

    /// Whether nodes of this kind carry a title.
    pub fn has_title(&self) -> bool {
        matches!(
            self,
            NodeKind::Paper | NodeKind::Section | NodeKind::Subsection | NodeKind::Subsubsection
        )
    }

    /// Whether this kind is a leaf (no child list).
    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeKind::Sentence)
    }

    /// Whether a child of kind `child` may be inserted under this kind.
    ///
    /// Paragraphs are allowed directly under every container level; section
    /// kinds nest strictly downward; sentences only inside paragraphs. Paper
    /// is a root kind and never a valid child.
    pub fn may_contain(&self, child: NodeKind) -> bool {
        match self {
            NodeKind::Paper => matches!(child, NodeKind::Section | NodeKind::Paragraph),
            NodeKind::Section => matches!(child, NodeKind::Subsection | NodeKind::Paragraph),
            NodeKind::Subsection => {
                matches!(child, NodeKind::Subsubsection | NodeKind::Paragraph)
            }
            NodeKind::Subsubsection => matches!(child, NodeKind::Paragraph),
            NodeKind::Paragraph => matches!(child, NodeKind::Sentence),
            NodeKind::Sentence => false,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An editable single field of a node.
///
/// Field updates are content-only — they never change tree shape — and are
/// atomic from the caller's point of view. Which fields a node accepts
/// depends on its kind: `Title` needs a titled container, `Content` needs a
/// sentence, `Summary`/`Intent` exist on every node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum NodeField {
    /// Heading text (paper/section/subsection/subsubsection).
    Title,
    /// Sentence text (sentence only).
    #[strum(serialize = "content", serialize = "text")]
    Content,
    /// Free-text summary annotation (any node).
    Summary,
    /// Free-text intent annotation (any node).
    Intent,
}

impl NodeField {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeField::Title => "title",
            NodeField::Content => "content",
            NodeField::Summary => "summary",
            NodeField::Intent => "intent",
        }
    }

    /// Whether a node of `kind` accepts this field.
    pub fn applies_to(&self, kind: NodeKind) -> bool {
        match self {
            NodeField::Title => kind.has_title(),
            NodeField::Content => kind == NodeKind::Sentence,
            NodeField::Summary | NodeField::Intent => true,
        }
    }
}

impl std::fmt::Display for NodeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serializable flat snapshot of a single node (no children).
///
/// This is the wire shape for single-node responses (field saves, annotation
/// joins). `title` and `content` are `Option` — only populated for kinds
/// that carry them. Empty annotation strings are skipped on the wire and
/// restored as defaults on deserialize.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Durable node identity.
    pub block_id: BlockId,
    /// Tree level (paper, section, ... sentence).
    pub kind: NodeKind,
    /// Heading text — present only for titled kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Sentence text — present only for sentences.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Summary annotation.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
    /// Intent annotation.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub intent: String,
    /// Number of direct children (0 for leaves).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub child_count: usize,
}

/// Helper for `#[serde(skip_serializing_if)]` on counters.
fn is_zero(v: &usize) -> bool {
    *v == 0
}

impl NodeSnapshot {
    /// Read one named field as text.
    ///
    /// Returns `None` when the field doesn't apply to this node's kind.
    pub fn field(&self, field: NodeField) -> Option<&str> {
        match field {
            NodeField::Title => self.title.as_deref(),
            NodeField::Content => self.content.as_deref(),
            NodeField::Summary => Some(&self.summary),
            NodeField::Intent => Some(&self.intent),
        }
    }

}

// ============================================================================
// Tests
// ============================================================================
