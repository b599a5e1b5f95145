//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use study_core::model::{SubtopicError, TopicError};

/// Errors emitted by `TopicService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TopicServiceError {
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SubtopicService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubtopicServiceError {
    #[error(transparent)]
    Subtopic(#[from] SubtopicError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
