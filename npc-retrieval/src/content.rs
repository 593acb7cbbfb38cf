//! Content types shared across the retrieval engine
//!
//! The relational store owns Persona/Prompt/Tag rows; the vector subsystem
//! works on a read-derived copy of the indexable text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable identifier for a content item, matching the relational-store
/// primary key. Ordered so similarity ties break deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId(String);

impl ContentId {
    /// Create from any stable key (row id, tag name, ...)
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ContentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of indexable content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Persona backstory/personality text
    Persona,
    /// Tag body text (lore, locations, rumors, ...)
    Tag,
}

/// A unit of indexable text sourced from the relational store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    pub kind: ContentKind,
    pub text: String,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn new(id: impl Into<ContentId>, kind: ContentKind, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            text: text.into(),
            updated_at: Utc::now(),
        }
    }

    /// Convenience constructor for persona content
    pub fn persona(id: impl Into<ContentId>, text: impl Into<String>) -> Self {
        Self::new(id, ContentKind::Persona, text)
    }

    /// Convenience constructor for tag content
    pub fn tag(id: impl Into<ContentId>, text: impl Into<String>) -> Self {
        Self::new(id, ContentKind::Tag, text)
    }
}

/// One ranked hit returned by the retrieval service. Ephemeral, produced per
/// query and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub id: ContentId,
    pub kind: ContentKind,
    /// Cosine similarity to the query, in [-1, 1]
    pub score: f32,
    /// Leading characters of the source text, for caller display
    pub snippet: String,
}

/// Hex SHA-256 digest of content text at embedding time.
///
/// Stored alongside each embedding so the pipeline can detect stale records
/// without re-embedding unchanged text.
pub fn source_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_hash_is_stable() {
        let a = source_hash("Stonehaven is a mining village");
        let b = source_hash("Stonehaven is a mining village");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_source_hash_changes_with_text() {
        assert_ne!(source_hash("old backstory"), source_hash("new backstory"));
    }

    #[test]
    fn test_content_id_ordering() {
        let a = ContentId::new("alpha");
        let z = ContentId::new("zeta");
        assert!(a < z);
        assert_eq!(a.to_string(), "alpha");
    }

    #[test]
    fn test_content_item_constructors() {
        let item = ContentItem::tag("mountain_village", "text about Stonehaven");
        assert_eq!(item.kind, ContentKind::Tag);
        assert_eq!(item.id.as_str(), "mountain_village");
    }
}
