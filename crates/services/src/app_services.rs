use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::progress::ProgressService;
use crate::session::UserSession;
use crate::subtopic_service::SubtopicService;
use crate::topic_service::TopicService;

/// Assembles app-facing services over a shared storage backend.
#[derive(Clone)]
pub struct AppServices {
    session: UserSession,
    topic_service: Arc<TopicService>,
    subtopic_service: Arc<SubtopicService>,
    progress_service: Arc<ProgressService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        session: UserSession,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, session))
    }

    /// Build services over in-memory storage, for tests and prototyping.
    #[must_use]
    pub fn in_memory(clock: Clock, session: UserSession) -> Self {
        let storage = Storage::in_memory();
        Self::from_storage(&storage, clock, session)
    }

    /// Wire services over an already-open storage backend.
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, session: UserSession) -> Self {
        let topic_service = Arc::new(TopicService::new(clock, Arc::clone(&storage.topics)));
        let subtopic_service = Arc::new(SubtopicService::new(
            clock,
            Arc::clone(&storage.topics),
            Arc::clone(&storage.subtopics),
        ));
        let progress_service = Arc::new(ProgressService::new(
            Arc::clone(&storage.topics),
            Arc::clone(&storage.subtopics),
            storage.feeds.clone(),
            session.clone(),
        ));

        Self {
            session,
            topic_service,
            subtopic_service,
            progress_service,
        }
    }

    #[must_use]
    pub fn session(&self) -> &UserSession {
        &self.session
    }

    #[must_use]
    pub fn topics(&self) -> Arc<TopicService> {
        Arc::clone(&self.topic_service)
    }

    #[must_use]
    pub fn subtopics(&self) -> Arc<SubtopicService> {
        Arc::clone(&self.subtopic_service)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress_service)
    }
}
