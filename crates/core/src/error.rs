use thiserror::Error;

use crate::model::{ImageRefError, SubtopicError, TopicError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error(transparent)]
    Subtopic(#[from] SubtopicError),
    #[error(transparent)]
    ImageRef(#[from] ImageRefError),
}
