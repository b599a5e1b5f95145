use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unique identifier for a Topic
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TopicId(u64);

impl TopicId {
    /// Creates a new `TopicId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Unique identifier for a Subtopic
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubtopicId(u64);

impl SubtopicId {
    /// Creates a new `SubtopicId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TopicId({})", self.0)
    }
}

impl fmt::Debug for SubtopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubtopicId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SubtopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for TopicId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(TopicId::new)
            .map_err(|_| ParseIdError {
                kind: "TopicId".to_string(),
            })
    }
}

impl FromStr for SubtopicId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(SubtopicId::new)
            .map_err(|_| ParseIdError {
                kind: "SubtopicId".to_string(),
            })
    }
}

// ─── Owner Id ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OwnerIdError {
    #[error("owner id cannot be empty")]
    Empty,
}

/// Opaque identifier for the user that owns a record.
///
/// Owner ids come from an external identity provider and are never generated
/// here; the only local rule is that they are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(String);

impl OwnerId {
    /// Creates an `OwnerId` from a raw provider string.
    ///
    /// # Errors
    ///
    /// Returns `OwnerIdError::Empty` if the string is empty or whitespace-only.
    pub fn new(raw: impl Into<String>) -> Result<Self, OwnerIdError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(OwnerIdError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_id_display() {
        let id = TopicId::new(42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_topic_id_from_str() {
        let id: TopicId = "123".parse().unwrap();
        assert_eq!(id, TopicId::new(123));
    }

    #[test]
    fn test_topic_id_from_str_invalid() {
        let result = "not-a-number".parse::<TopicId>();
        assert!(result.is_err());
    }

    #[test]
    fn test_subtopic_id_display() {
        let id = SubtopicId::new(99);
        assert_eq!(id.to_string(), "99");
    }

    #[test]
    fn test_subtopic_id_from_str() {
        let id: SubtopicId = "456".parse().unwrap();
        assert_eq!(id, SubtopicId::new(456));
    }

    #[test]
    fn test_id_roundtrip() {
        let original = TopicId::new(42);
        let serialized = original.to_string();
        let deserialized: TopicId = serialized.parse().unwrap();
        assert_eq!(original, deserialized);
    }

    #[test]
    fn owner_id_rejects_empty() {
        assert_eq!(OwnerId::new("   ").unwrap_err(), OwnerIdError::Empty);
    }

    #[test]
    fn owner_id_trims() {
        let owner = OwnerId::new("  uid-123  ").unwrap();
        assert_eq!(owner.as_str(), "uid-123");
    }
}
