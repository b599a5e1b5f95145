use std::sync::Arc;

use study_core::model::{ImageRef, OwnerId, Subtopic, SubtopicId, TopicId};

use storage::repository::{
    NewSubtopicRecord, StorageError, SubtopicRepository, TopicRepository,
};

use crate::Clock;
use crate::error::SubtopicServiceError;

/// Orchestrates subtopic creation, flag toggles, and persistence.
#[derive(Clone)]
pub struct SubtopicService {
    clock: Clock,
    topics: Arc<dyn TopicRepository>,
    subtopics: Arc<dyn SubtopicRepository>,
}

impl SubtopicService {
    #[must_use]
    pub fn new(
        clock: Clock,
        topics: Arc<dyn TopicRepository>,
        subtopics: Arc<dyn SubtopicRepository>,
    ) -> Self {
        Self {
            clock,
            topics,
            subtopics,
        }
    }

    /// Create a new subtopic under an existing topic and persist it.
    ///
    /// # Errors
    ///
    /// Returns `SubtopicServiceError::Subtopic` for validation failures.
    /// Returns `SubtopicServiceError::Storage` if the topic is missing or
    /// persistence fails.
    pub async fn create_subtopic(
        &self,
        topic_id: TopicId,
        owner: Option<OwnerId>,
        title: String,
        description: String,
        image: Option<ImageRef>,
    ) -> Result<SubtopicId, SubtopicServiceError> {
        self.topics
            .get_topic(topic_id)
            .await?
            .ok_or(StorageError::NotFound)?;

        let now = self.clock.now();
        let subtopic = Subtopic::new(
            SubtopicId::new(1),
            topic_id,
            owner,
            title,
            description,
            image,
            now,
        )?;
        let subtopic_id = self
            .subtopics
            .insert_new_subtopic(NewSubtopicRecord::from_subtopic(&subtopic))
            .await?;
        Ok(subtopic_id)
    }

    /// Fetch a subtopic by id.
    ///
    /// Returns `Ok(None)` when the subtopic does not exist.
    ///
    /// # Errors
    ///
    /// Returns `SubtopicServiceError::Storage` if repository access fails.
    pub async fn get_subtopic(
        &self,
        subtopic_id: SubtopicId,
    ) -> Result<Option<Subtopic>, SubtopicServiceError> {
        let subtopic = self.subtopics.get_subtopic(subtopic_id).await?;
        Ok(subtopic)
    }

    /// List the subtopics of one topic ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `SubtopicServiceError::Storage` if repository access fails.
    pub async fn list_for_topic(
        &self,
        topic_id: TopicId,
    ) -> Result<Vec<Subtopic>, SubtopicServiceError> {
        let subtopics = self.subtopics.list_for_topic(topic_id).await?;
        Ok(subtopics)
    }

    /// List bookmarked subtopics across all topics.
    ///
    /// # Errors
    ///
    /// Returns `SubtopicServiceError::Storage` if repository access fails.
    pub async fn list_bookmarked(
        &self,
        owner: Option<&OwnerId>,
    ) -> Result<Vec<Subtopic>, SubtopicServiceError> {
        let subtopics = self.subtopics.list_bookmarked(owner).await?;
        Ok(subtopics)
    }

    /// Update a subtopic's title, description, and image while preserving its
    /// flags and creation time.
    ///
    /// # Errors
    ///
    /// Returns `SubtopicServiceError::Subtopic` if validation fails.
    /// Returns `SubtopicServiceError::Storage` if the subtopic is missing or
    /// repository access fails.
    pub async fn update_content(
        &self,
        subtopic_id: SubtopicId,
        title: String,
        description: String,
        image: Option<ImageRef>,
    ) -> Result<(), SubtopicServiceError> {
        let subtopic = self
            .subtopics
            .get_subtopic(subtopic_id)
            .await?
            .ok_or(StorageError::NotFound)?;

        let updated = Subtopic::from_persisted(
            subtopic.id(),
            subtopic.topic_id(),
            subtopic.owner_id().cloned(),
            title,
            description,
            subtopic.checked(),
            subtopic.bookmarked(),
            image,
            subtopic.created_at(),
        )?;
        self.subtopics.upsert_subtopic(&updated).await?;
        Ok(())
    }

    /// Mark a subtopic as known/complete, or clear the mark.
    ///
    /// # Errors
    ///
    /// Returns `SubtopicServiceError::Storage` if the subtopic is missing or
    /// the update cannot be applied.
    pub async fn set_checked(
        &self,
        subtopic_id: SubtopicId,
        checked: bool,
    ) -> Result<(), SubtopicServiceError> {
        let updated = self.subtopics.set_checked(subtopic_id, checked).await?;
        if !updated {
            return Err(StorageError::NotFound.into());
        }
        Ok(())
    }

    /// Flag a subtopic for later review, or clear the flag.
    ///
    /// # Errors
    ///
    /// Returns `SubtopicServiceError::Storage` if the subtopic is missing or
    /// the update cannot be applied.
    pub async fn set_bookmarked(
        &self,
        subtopic_id: SubtopicId,
        bookmarked: bool,
    ) -> Result<(), SubtopicServiceError> {
        let updated = self
            .subtopics
            .set_bookmarked(subtopic_id, bookmarked)
            .await?;
        if !updated {
            return Err(StorageError::NotFound.into());
        }
        Ok(())
    }

    /// Delete a subtopic.
    ///
    /// # Errors
    ///
    /// Returns `SubtopicServiceError::Storage` if the subtopic is missing or
    /// the delete cannot be applied.
    pub async fn delete_subtopic(
        &self,
        subtopic_id: SubtopicId,
    ) -> Result<(), SubtopicServiceError> {
        let removed = self.subtopics.delete_subtopic(subtopic_id).await?;
        if !removed {
            return Err(StorageError::NotFound.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use storage::repository::InMemoryRepository;
    use study_core::time::fixed_clock;

    async fn service_with_topic() -> (SubtopicService, TopicId) {
        let repo = InMemoryRepository::new();
        let topics: Arc<dyn TopicRepository> = Arc::new(repo.clone());
        let subtopics: Arc<dyn SubtopicRepository> = Arc::new(repo);
        let service = SubtopicService::new(fixed_clock(), Arc::clone(&topics), subtopics);

        let topic_id = topics
            .insert_new_topic(storage::repository::NewTopicRecord {
                owner_id: None,
                title: "Dogs".to_owned(),
                created_at: study_core::time::fixed_now(),
            })
            .await
            .unwrap();
        (service, topic_id)
    }

    #[tokio::test]
    async fn create_requires_existing_topic() {
        let (service, _) = service_with_topic().await;

        let err = service
            .create_subtopic(
                TopicId::new(404),
                None,
                "Terriers".to_string(),
                String::new(),
                None,
            )
            .await;
        assert!(matches!(
            err,
            Err(SubtopicServiceError::Storage(StorageError::NotFound))
        ));
    }

    #[tokio::test]
    async fn create_toggle_and_delete_subtopic() {
        let (service, topic_id) = service_with_topic().await;

        let subtopic_id = service
            .create_subtopic(
                topic_id,
                None,
                "Terriers".to_string(),
                "Bred to hunt vermin.".to_string(),
                None,
            )
            .await
            .unwrap();

        service.set_checked(subtopic_id, true).await.unwrap();
        service.set_bookmarked(subtopic_id, true).await.unwrap();

        let fetched = service.get_subtopic(subtopic_id).await.unwrap().unwrap();
        assert!(fetched.checked());
        assert!(fetched.bookmarked());

        service.delete_subtopic(subtopic_id).await.unwrap();
        assert!(service.get_subtopic(subtopic_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_content_preserves_flags() {
        let (service, topic_id) = service_with_topic().await;

        let subtopic_id = service
            .create_subtopic(
                topic_id,
                None,
                "Terriers".to_string(),
                "Old notes.".to_string(),
                None,
            )
            .await
            .unwrap();
        service.set_checked(subtopic_id, true).await.unwrap();

        let image = ImageRef::from_url("https://example.com/terrier.png").unwrap();
        service
            .update_content(
                subtopic_id,
                "Terrier breeds".to_string(),
                "New notes.".to_string(),
                Some(image.clone()),
            )
            .await
            .unwrap();

        let fetched = service.get_subtopic(subtopic_id).await.unwrap().unwrap();
        assert_eq!(fetched.title(), "Terrier breeds");
        assert_eq!(fetched.description(), "New notes.");
        assert_eq!(fetched.image(), Some(&image));
        assert!(fetched.checked());
    }

    #[tokio::test]
    async fn toggle_missing_subtopic_is_not_found() {
        let (service, _) = service_with_topic().await;

        let err = service.set_checked(SubtopicId::new(404), true).await;
        assert!(matches!(
            err,
            Err(SubtopicServiceError::Storage(StorageError::NotFound))
        ));
    }
}
