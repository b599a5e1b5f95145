use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{OwnerId, TopicId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TopicError {
    #[error("topic title cannot be empty")]
    EmptyTitle,
}

//
// ─── TOPIC ─────────────────────────────────────────────────────────────────────
//

/// A top-level subject the user is studying.
///
/// Topics group subtopics and carry an optional owner for multi-user setups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    id: TopicId,
    owner_id: Option<OwnerId>,
    title: String,
    created_at: DateTime<Utc>,
}

impl Topic {
    /// Creates a new Topic.
    ///
    /// # Errors
    ///
    /// Returns `TopicError::EmptyTitle` if the title is empty or whitespace-only.
    pub fn new(
        id: TopicId,
        owner_id: Option<OwnerId>,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TopicError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(TopicError::EmptyTitle);
        }

        Ok(Self {
            id,
            owner_id,
            title: title.trim().to_owned(),
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> TopicId {
        self.id
    }

    #[must_use]
    pub fn owner_id(&self) -> Option<&OwnerId> {
        self.owner_id.as_ref()
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn topic_new_rejects_empty_title() {
        let err = Topic::new(TopicId::new(1), None, "   ", fixed_now()).unwrap_err();
        assert_eq!(err, TopicError::EmptyTitle);
    }

    #[test]
    fn topic_new_happy_path() {
        let owner = OwnerId::new("uid-1").unwrap();
        let topic = Topic::new(TopicId::new(10), Some(owner.clone()), "Dogs", fixed_now()).unwrap();

        assert_eq!(topic.id(), TopicId::new(10));
        assert_eq!(topic.owner_id(), Some(&owner));
        assert_eq!(topic.title(), "Dogs");
        assert_eq!(topic.created_at(), fixed_now());
    }

    #[test]
    fn topic_trims_title() {
        let topic = Topic::new(TopicId::new(1), None, "  Cats  ", fixed_now()).unwrap();
        assert_eq!(topic.title(), "Cats");
    }
}
