#![forbid(unsafe_code)]

pub mod feed;
pub mod repository;
pub mod sqlite;

pub use feed::{StoreFeeds, TableFeed};
pub use repository::{
    InMemoryRepository, NewSubtopicRecord, NewTopicRecord, Storage, StorageError,
    SubtopicRepository, TopicRepository,
};
