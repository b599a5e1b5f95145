use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use study_core::model::{ImageRef, OwnerId, Subtopic, SubtopicId, Topic, TopicId};

use crate::feed::StoreFeeds;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Insert payload for a topic; the backend assigns the id.
#[derive(Debug, Clone)]
pub struct NewTopicRecord {
    pub owner_id: Option<OwnerId>,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl NewTopicRecord {
    #[must_use]
    pub fn from_topic(topic: &Topic) -> Self {
        Self {
            owner_id: topic.owner_id().cloned(),
            title: topic.title().to_owned(),
            created_at: topic.created_at(),
        }
    }
}

/// Insert payload for a subtopic; the backend assigns the id.
#[derive(Debug, Clone)]
pub struct NewSubtopicRecord {
    pub topic_id: TopicId,
    pub owner_id: Option<OwnerId>,
    pub title: String,
    pub description: String,
    pub checked: bool,
    pub bookmarked: bool,
    pub image: Option<ImageRef>,
    pub created_at: DateTime<Utc>,
}

impl NewSubtopicRecord {
    #[must_use]
    pub fn from_subtopic(subtopic: &Subtopic) -> Self {
        Self {
            topic_id: subtopic.topic_id(),
            owner_id: subtopic.owner_id().cloned(),
            title: subtopic.title().to_owned(),
            description: subtopic.description().to_owned(),
            checked: subtopic.checked(),
            bookmarked: subtopic.bookmarked(),
            image: subtopic.image().cloned(),
            created_at: subtopic.created_at(),
        }
    }
}

/// Repository contract for topics.
#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// Persist a new topic and return its generated id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the topic cannot be stored.
    async fn insert_new_topic(&self, topic: NewTopicRecord) -> Result<TopicId, StorageError>;

    /// Persist or update a topic.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the topic cannot be stored.
    async fn upsert_topic(&self, topic: &Topic) -> Result<(), StorageError>;

    /// Fetch a topic by id. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StorageError>;

    /// List topics ordered by id, optionally restricted to one owner.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn list_topics(&self, owner: Option<&OwnerId>) -> Result<Vec<Topic>, StorageError>;

    /// Delete a topic and all of its subtopics.
    ///
    /// Returns true when a topic was actually removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete cannot be applied.
    async fn delete_topic(&self, id: TopicId) -> Result<bool, StorageError>;
}

/// Repository contract for subtopics.
#[async_trait]
pub trait SubtopicRepository: Send + Sync {
    /// Persist a new subtopic and return its generated id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the subtopic cannot be stored.
    async fn insert_new_subtopic(
        &self,
        subtopic: NewSubtopicRecord,
    ) -> Result<SubtopicId, StorageError>;

    /// Persist or update a subtopic.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the subtopic cannot be stored.
    async fn upsert_subtopic(&self, subtopic: &Subtopic) -> Result<(), StorageError>;

    /// Fetch a subtopic by id. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn get_subtopic(&self, id: SubtopicId) -> Result<Option<Subtopic>, StorageError>;

    /// List the subtopics of one topic ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn list_for_topic(&self, topic_id: TopicId) -> Result<Vec<Subtopic>, StorageError>;

    /// List all subtopics ordered by id, optionally restricted to one owner.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn list_subtopics(&self, owner: Option<&OwnerId>) -> Result<Vec<Subtopic>, StorageError>;

    /// List bookmarked subtopics across all topics, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn list_bookmarked(
        &self,
        owner: Option<&OwnerId>,
    ) -> Result<Vec<Subtopic>, StorageError>;

    /// Set the checked flag. Returns true when the subtopic existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the update cannot be applied.
    async fn set_checked(&self, id: SubtopicId, checked: bool) -> Result<bool, StorageError>;

    /// Set the bookmarked flag. Returns true when the subtopic existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the update cannot be applied.
    async fn set_bookmarked(
        &self,
        id: SubtopicId,
        bookmarked: bool,
    ) -> Result<bool, StorageError>;

    /// Delete a subtopic. Returns true when one was actually removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete cannot be applied.
    async fn delete_subtopic(&self, id: SubtopicId) -> Result<bool, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Publishes to the same change feeds as the SQLite backend, so the reactive
/// layer behaves identically over either.
#[derive(Clone)]
pub struct InMemoryRepository {
    topics: Arc<Mutex<HashMap<TopicId, Topic>>>,
    subtopics: Arc<Mutex<HashMap<SubtopicId, Subtopic>>>,
    next_topic_id: Arc<AtomicU64>,
    next_subtopic_id: Arc<AtomicU64>,
    feeds: StoreFeeds,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            topics: Arc::new(Mutex::new(HashMap::new())),
            subtopics: Arc::new(Mutex::new(HashMap::new())),
            next_topic_id: Arc::new(AtomicU64::new(1)),
            next_subtopic_id: Arc::new(AtomicU64::new(1)),
            feeds: StoreFeeds::new(),
        }
    }

    #[must_use]
    pub fn feeds(&self) -> &StoreFeeds {
        &self.feeds
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_err<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl TopicRepository for InMemoryRepository {
    async fn insert_new_topic(&self, topic: NewTopicRecord) -> Result<TopicId, StorageError> {
        let id = TopicId::new(self.next_topic_id.fetch_add(1, Ordering::Relaxed));
        let stored = Topic::new(id, topic.owner_id, topic.title, topic.created_at)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut guard = self.topics.lock().map_err(lock_err)?;
        guard.insert(id, stored);
        drop(guard);

        self.feeds.topics.publish();
        Ok(id)
    }

    async fn upsert_topic(&self, topic: &Topic) -> Result<(), StorageError> {
        let mut guard = self.topics.lock().map_err(lock_err)?;
        guard.insert(topic.id(), topic.clone());
        drop(guard);

        self.feeds.topics.publish();
        Ok(())
    }

    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StorageError> {
        let guard = self.topics.lock().map_err(lock_err)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_topics(&self, owner: Option<&OwnerId>) -> Result<Vec<Topic>, StorageError> {
        let guard = self.topics.lock().map_err(lock_err)?;
        let mut topics: Vec<Topic> = guard
            .values()
            .filter(|t| owner.is_none() || t.owner_id() == owner)
            .cloned()
            .collect();
        topics.sort_by_key(Topic::id);
        Ok(topics)
    }

    async fn delete_topic(&self, id: TopicId) -> Result<bool, StorageError> {
        let removed = {
            let mut guard = self.topics.lock().map_err(lock_err)?;
            guard.remove(&id).is_some()
        };
        if !removed {
            return Ok(false);
        }

        let orphaned = {
            let mut guard = self.subtopics.lock().map_err(lock_err)?;
            let before = guard.len();
            guard.retain(|_, s| s.topic_id() != id);
            before != guard.len()
        };

        self.feeds.topics.publish();
        if orphaned {
            self.feeds.subtopics.publish();
        }
        Ok(true)
    }
}

#[async_trait]
impl SubtopicRepository for InMemoryRepository {
    async fn insert_new_subtopic(
        &self,
        subtopic: NewSubtopicRecord,
    ) -> Result<SubtopicId, StorageError> {
        let id = SubtopicId::new(self.next_subtopic_id.fetch_add(1, Ordering::Relaxed));
        let stored = Subtopic::from_persisted(
            id,
            subtopic.topic_id,
            subtopic.owner_id,
            subtopic.title,
            subtopic.description,
            subtopic.checked,
            subtopic.bookmarked,
            subtopic.image,
            subtopic.created_at,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut guard = self.subtopics.lock().map_err(lock_err)?;
        guard.insert(id, stored);
        drop(guard);

        self.feeds.subtopics.publish();
        Ok(id)
    }

    async fn upsert_subtopic(&self, subtopic: &Subtopic) -> Result<(), StorageError> {
        let mut guard = self.subtopics.lock().map_err(lock_err)?;
        guard.insert(subtopic.id(), subtopic.clone());
        drop(guard);

        self.feeds.subtopics.publish();
        Ok(())
    }

    async fn get_subtopic(&self, id: SubtopicId) -> Result<Option<Subtopic>, StorageError> {
        let guard = self.subtopics.lock().map_err(lock_err)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_for_topic(&self, topic_id: TopicId) -> Result<Vec<Subtopic>, StorageError> {
        let guard = self.subtopics.lock().map_err(lock_err)?;
        let mut subtopics: Vec<Subtopic> = guard
            .values()
            .filter(|s| s.topic_id() == topic_id)
            .cloned()
            .collect();
        subtopics.sort_by_key(Subtopic::id);
        Ok(subtopics)
    }

    async fn list_subtopics(&self, owner: Option<&OwnerId>) -> Result<Vec<Subtopic>, StorageError> {
        let guard = self.subtopics.lock().map_err(lock_err)?;
        let mut subtopics: Vec<Subtopic> = guard
            .values()
            .filter(|s| owner.is_none() || s.owner_id() == owner)
            .cloned()
            .collect();
        subtopics.sort_by_key(Subtopic::id);
        Ok(subtopics)
    }

    async fn list_bookmarked(
        &self,
        owner: Option<&OwnerId>,
    ) -> Result<Vec<Subtopic>, StorageError> {
        let mut subtopics = self.list_subtopics(owner).await?;
        subtopics.retain(Subtopic::bookmarked);
        Ok(subtopics)
    }

    async fn set_checked(&self, id: SubtopicId, checked: bool) -> Result<bool, StorageError> {
        let updated = {
            let mut guard = self.subtopics.lock().map_err(lock_err)?;
            match guard.get_mut(&id) {
                Some(subtopic) => {
                    subtopic.set_checked(checked);
                    true
                }
                None => false,
            }
        };
        if updated {
            self.feeds.subtopics.publish();
        }
        Ok(updated)
    }

    async fn set_bookmarked(&self, id: SubtopicId, bookmarked: bool) -> Result<bool, StorageError> {
        let updated = {
            let mut guard = self.subtopics.lock().map_err(lock_err)?;
            match guard.get_mut(&id) {
                Some(subtopic) => {
                    subtopic.set_bookmarked(bookmarked);
                    true
                }
                None => false,
            }
        };
        if updated {
            self.feeds.subtopics.publish();
        }
        Ok(updated)
    }

    async fn delete_subtopic(&self, id: SubtopicId) -> Result<bool, StorageError> {
        let removed = {
            let mut guard = self.subtopics.lock().map_err(lock_err)?;
            guard.remove(&id).is_some()
        };
        if removed {
            self.feeds.subtopics.publish();
        }
        Ok(removed)
    }
}

/// Aggregates topic and subtopic repositories behind trait objects for easy
/// backend swapping, together with the change feeds they publish to.
#[derive(Clone)]
pub struct Storage {
    pub topics: Arc<dyn TopicRepository>,
    pub subtopics: Arc<dyn SubtopicRepository>,
    pub feeds: StoreFeeds,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let feeds = repo.feeds().clone();
        let topics: Arc<dyn TopicRepository> = Arc::new(repo.clone());
        let subtopics: Arc<dyn SubtopicRepository> = Arc::new(repo);
        Self {
            topics,
            subtopics,
            feeds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::time::fixed_now;

    fn topic_record(title: &str, owner: Option<&str>) -> NewTopicRecord {
        NewTopicRecord {
            owner_id: owner.map(|o| OwnerId::new(o).unwrap()),
            title: title.to_owned(),
            created_at: fixed_now(),
        }
    }

    fn subtopic_record(topic_id: TopicId, title: &str) -> NewSubtopicRecord {
        NewSubtopicRecord {
            topic_id,
            owner_id: None,
            title: title.to_owned(),
            description: String::new(),
            checked: false,
            bookmarked: false,
            image: None,
            created_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids_and_lists_in_order() {
        let repo = InMemoryRepository::new();

        let first = repo.insert_new_topic(topic_record("Dogs", None)).await.unwrap();
        let second = repo.insert_new_topic(topic_record("Cats", None)).await.unwrap();
        assert!(first < second);

        let topics = repo.list_topics(None).await.unwrap();
        let titles: Vec<&str> = topics.iter().map(Topic::title).collect();
        assert_eq!(titles, ["Dogs", "Cats"]);
    }

    #[tokio::test]
    async fn list_topics_filters_by_owner() {
        let repo = InMemoryRepository::new();
        let alice = OwnerId::new("alice").unwrap();

        repo.insert_new_topic(topic_record("Mine", Some("alice")))
            .await
            .unwrap();
        repo.insert_new_topic(topic_record("Theirs", Some("bob")))
            .await
            .unwrap();
        repo.insert_new_topic(topic_record("Nobody's", None))
            .await
            .unwrap();

        let topics = repo.list_topics(Some(&alice)).await.unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].title(), "Mine");
    }

    #[tokio::test]
    async fn delete_topic_cascades_and_publishes_both_feeds() {
        let repo = InMemoryRepository::new();
        let mut topics_rx = repo.feeds().topics.subscribe();
        let mut subtopics_rx = repo.feeds().subtopics.subscribe();

        let topic_id = repo.insert_new_topic(topic_record("Dogs", None)).await.unwrap();
        repo.insert_new_subtopic(subtopic_record(topic_id, "Terriers"))
            .await
            .unwrap();
        topics_rx.borrow_and_update();
        subtopics_rx.borrow_and_update();

        assert!(repo.delete_topic(topic_id).await.unwrap());
        assert!(topics_rx.has_changed().unwrap());
        assert!(subtopics_rx.has_changed().unwrap());

        assert!(repo.list_subtopics(None).await.unwrap().is_empty());
        assert!(!repo.delete_topic(topic_id).await.unwrap());
    }

    #[tokio::test]
    async fn set_checked_updates_in_place() {
        let repo = InMemoryRepository::new();
        let topic_id = repo.insert_new_topic(topic_record("Dogs", None)).await.unwrap();
        let sub_id = repo
            .insert_new_subtopic(subtopic_record(topic_id, "Terriers"))
            .await
            .unwrap();

        assert!(repo.set_checked(sub_id, true).await.unwrap());
        let subtopic = repo.get_subtopic(sub_id).await.unwrap().unwrap();
        assert!(subtopic.checked());

        assert!(!repo.set_checked(SubtopicId::new(999), true).await.unwrap());
    }

    #[tokio::test]
    async fn bookmarked_listing_only_returns_flagged() {
        let repo = InMemoryRepository::new();
        let topic_id = repo.insert_new_topic(topic_record("Dogs", None)).await.unwrap();
        let keep = repo
            .insert_new_subtopic(subtopic_record(topic_id, "Terriers"))
            .await
            .unwrap();
        repo.insert_new_subtopic(subtopic_record(topic_id, "Spaniels"))
            .await
            .unwrap();

        repo.set_bookmarked(keep, true).await.unwrap();

        let bookmarked = repo.list_bookmarked(None).await.unwrap();
        assert_eq!(bookmarked.len(), 1);
        assert_eq!(bookmarked[0].id(), keep);
    }
}
