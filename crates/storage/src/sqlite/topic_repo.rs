use study_core::model::{OwnerId, Topic, TopicId};

use super::SqliteRepository;
use super::mapping::{map_topic_row, topic_id_from_i64, topic_id_to_i64};
use crate::repository::{NewTopicRecord, StorageError, TopicRepository};

#[async_trait::async_trait]
impl TopicRepository for SqliteRepository {
    async fn insert_new_topic(&self, topic: NewTopicRecord) -> Result<TopicId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO topics (owner_id, title, created_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(topic.owner_id.as_ref().map(OwnerId::as_str))
        .bind(topic.title)
        .bind(topic.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let id = topic_id_from_i64(res.last_insert_rowid())?;
        self.feeds.topics.publish();
        Ok(id)
    }

    async fn upsert_topic(&self, topic: &Topic) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO topics (id, owner_id, title, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                -- keep created_at from the original insert; only update mutable fields
                owner_id = excluded.owner_id,
                title = excluded.title
            ",
        )
        .bind(topic_id_to_i64(topic.id())?)
        .bind(topic.owner_id().map(OwnerId::as_str))
        .bind(topic.title())
        .bind(topic.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        self.feeds.topics.publish();
        Ok(())
    }

    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, owner_id, title, created_at
            FROM topics WHERE id = ?1
            ",
        )
        .bind(topic_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_topic_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_topics(&self, owner: Option<&OwnerId>) -> Result<Vec<Topic>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, owner_id, title, created_at
            FROM topics
            WHERE ?1 IS NULL OR owner_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(owner.map(OwnerId::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut topics = Vec::with_capacity(rows.len());
        for row in rows {
            topics.push(map_topic_row(&row)?);
        }
        Ok(topics)
    }

    async fn delete_topic(&self, id: TopicId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM topics WHERE id = ?1")
            .bind(topic_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let removed = res.rows_affected() > 0;
        if removed {
            // The FK cascade may have taken subtopics with it.
            self.feeds.topics.publish();
            self.feeds.subtopics.publish();
        }
        Ok(removed)
    }
}
