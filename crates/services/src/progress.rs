use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use study_core::model::{OwnerId, TopicWithProgress, aggregate_progress};

use storage::feed::StoreFeeds;
use storage::repository::{StorageError, SubtopicRepository, TopicRepository};

use crate::error::ProgressError;
use crate::session::UserSession;

/// Derives per-topic completion from the live topic and subtopic collections.
///
/// One-shot snapshots come from `topics_with_progress`; `watch` keeps a
/// continuously updated view that re-emits whenever either store or the
/// signed-in user changes.
#[derive(Clone)]
pub struct ProgressService {
    topics: Arc<dyn TopicRepository>,
    subtopics: Arc<dyn SubtopicRepository>,
    feeds: StoreFeeds,
    session: UserSession,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        topics: Arc<dyn TopicRepository>,
        subtopics: Arc<dyn SubtopicRepository>,
        feeds: StoreFeeds,
        session: UserSession,
    ) -> Self {
        Self {
            topics,
            subtopics,
            feeds,
            session,
        }
    }

    /// Compute the current progress list for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if repository access fails.
    pub async fn topics_with_progress(&self) -> Result<Vec<TopicWithProgress>, ProgressError> {
        let owner = self.session.current();
        let progress =
            recompute(self.topics.as_ref(), self.subtopics.as_ref(), owner.as_ref()).await?;
        Ok(progress)
    }

    /// Start watching aggregated progress.
    ///
    /// The returned handle holds the latest emission and re-emits on every
    /// store mutation and user change. A store failure mid-watch closes the
    /// stream; `next`/`wait_for` then return `None`. Dropping the handle stops
    /// the watcher.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the initial query fails.
    pub async fn watch(&self) -> Result<ProgressWatch, ProgressError> {
        let mut topics_rx = self.feeds.topics.subscribe();
        let mut subtopics_rx = self.feeds.subtopics.subscribe();
        let mut session_rx = self.session.subscribe();

        let owner = session_rx.borrow_and_update().clone();
        let initial =
            recompute(self.topics.as_ref(), self.subtopics.as_ref(), owner.as_ref()).await?;
        let (tx, rx) = watch::channel(initial);

        let topics = Arc::clone(&self.topics);
        let subtopics = Arc::clone(&self.subtopics);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = topics_rx.changed() => if changed.is_err() { break },
                    changed = subtopics_rx.changed() => if changed.is_err() { break },
                    changed = session_rx.changed() => if changed.is_err() { break },
                    () = tx.closed() => break,
                }

                // Mark every input seen so one burst of writes yields one
                // recomputation instead of one per fired input.
                topics_rx.borrow_and_update();
                subtopics_rx.borrow_and_update();
                let owner = session_rx.borrow_and_update().clone();

                match recompute(topics.as_ref(), subtopics.as_ref(), owner.as_ref()).await {
                    Ok(progress) => {
                        if tx.send(progress).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "progress recomputation failed; closing watch");
                        break;
                    }
                }
            }
        });

        Ok(ProgressWatch { rx, task })
    }
}

/// Re-query both collections and join them.
async fn recompute(
    topics: &dyn TopicRepository,
    subtopics: &dyn SubtopicRepository,
    owner: Option<&OwnerId>,
) -> Result<Vec<TopicWithProgress>, StorageError> {
    let topic_rows = topics.list_topics(owner).await?;
    let subtopic_rows = subtopics.list_subtopics(owner).await?;
    Ok(aggregate_progress(&topic_rows, &subtopic_rows, owner))
}

/// Live handle onto aggregated progress.
pub struct ProgressWatch {
    rx: watch::Receiver<Vec<TopicWithProgress>>,
    task: JoinHandle<()>,
}

impl ProgressWatch {
    /// The most recent emission.
    #[must_use]
    pub fn current(&self) -> Vec<TopicWithProgress> {
        self.rx.borrow().clone()
    }

    /// Wait for the next emission. Returns `None` when the stream has closed.
    ///
    /// Intermediate emissions may be conflated; the returned value is always
    /// the newest one.
    pub async fn next(&mut self) -> Option<Vec<TopicWithProgress>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait until an emission satisfies `accept` (the current value counts).
    /// Returns `None` when the stream closes first.
    pub async fn wait_for(
        &mut self,
        accept: impl FnMut(&Vec<TopicWithProgress>) -> bool,
    ) -> Option<Vec<TopicWithProgress>> {
        let progress = self.rx.wait_for(accept).await.ok()?.clone();
        Some(progress)
    }
}

impl Drop for ProgressWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}
