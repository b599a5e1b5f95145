use std::sync::Arc;

use study_core::model::{OwnerId, Topic, TopicId};

use storage::repository::{NewTopicRecord, StorageError, TopicRepository};

use crate::Clock;
use crate::error::TopicServiceError;

/// Orchestrates topic creation and persistence.
#[derive(Clone)]
pub struct TopicService {
    clock: Clock,
    topics: Arc<dyn TopicRepository>,
}

impl TopicService {
    #[must_use]
    pub fn new(clock: Clock, topics: Arc<dyn TopicRepository>) -> Self {
        Self { clock, topics }
    }

    /// Create a new topic and persist it.
    ///
    /// # Errors
    ///
    /// Returns `TopicServiceError::Topic` for validation failures.
    /// Returns `TopicServiceError::Storage` if persistence fails.
    pub async fn create_topic(
        &self,
        title: String,
        owner: Option<OwnerId>,
    ) -> Result<TopicId, TopicServiceError> {
        let now = self.clock.now();
        let topic = Topic::new(TopicId::new(1), owner, title, now)?;
        let topic_id = self
            .topics
            .insert_new_topic(NewTopicRecord::from_topic(&topic))
            .await?;
        Ok(topic_id)
    }

    /// List topics ordered by id, optionally restricted to one owner.
    ///
    /// # Errors
    ///
    /// Returns `TopicServiceError::Storage` if repository access fails.
    pub async fn list_topics(
        &self,
        owner: Option<&OwnerId>,
    ) -> Result<Vec<Topic>, TopicServiceError> {
        let topics = self.topics.list_topics(owner).await?;
        Ok(topics)
    }

    /// Fetch a topic by id.
    ///
    /// Returns `Ok(None)` when the topic does not exist.
    ///
    /// # Errors
    ///
    /// Returns `TopicServiceError::Storage` if repository access fails.
    pub async fn get_topic(&self, topic_id: TopicId) -> Result<Option<Topic>, TopicServiceError> {
        let topic = self.topics.get_topic(topic_id).await?;
        Ok(topic)
    }

    /// Rename a topic while preserving its owner and creation time.
    ///
    /// # Errors
    ///
    /// Returns `TopicServiceError::Topic` if validation fails.
    /// Returns `TopicServiceError::Storage` if the topic is missing or
    /// repository access fails.
    pub async fn rename_topic(
        &self,
        topic_id: TopicId,
        title: String,
    ) -> Result<(), TopicServiceError> {
        let topic = self
            .topics
            .get_topic(topic_id)
            .await?
            .ok_or(StorageError::NotFound)?;

        let updated = Topic::new(
            topic.id(),
            topic.owner_id().cloned(),
            title,
            topic.created_at(),
        )?;
        self.topics.upsert_topic(&updated).await?;
        Ok(())
    }

    /// Delete a topic and all of its subtopics.
    ///
    /// # Errors
    ///
    /// Returns `TopicServiceError::Storage` if the topic is missing or the
    /// delete cannot be applied.
    pub async fn delete_topic(&self, topic_id: TopicId) -> Result<(), TopicServiceError> {
        let removed = self.topics.delete_topic(topic_id).await?;
        if !removed {
            return Err(StorageError::NotFound.into());
        }
        Ok(())
    }
}
