#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod progress;
pub mod session;
pub mod subtopic_service;
pub mod topic_service;

pub use study_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ProgressError, SubtopicServiceError, TopicServiceError};
pub use progress::{ProgressService, ProgressWatch};
pub use session::UserSession;
pub use subtopic_service::SubtopicService;
pub use topic_service::TopicService;
