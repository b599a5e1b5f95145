use study_core::model::{ImageRef, OwnerId, Subtopic, SubtopicId, TopicId};

use super::SqliteRepository;
use super::mapping::{map_subtopic_row, subtopic_id_from_i64, subtopic_id_to_i64, topic_id_to_i64};
use crate::repository::{NewSubtopicRecord, StorageError, SubtopicRepository};

const SUBTOPIC_COLUMNS: &str =
    "id, topic_id, owner_id, title, description, checked, bookmarked, image_ref, created_at";

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl SubtopicRepository for SqliteRepository {
    async fn insert_new_subtopic(
        &self,
        subtopic: NewSubtopicRecord,
    ) -> Result<SubtopicId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO subtopics (topic_id, owner_id, title, description, checked, bookmarked, image_ref, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(topic_id_to_i64(subtopic.topic_id)?)
        .bind(subtopic.owner_id.as_ref().map(OwnerId::as_str))
        .bind(subtopic.title)
        .bind(subtopic.description)
        .bind(i64::from(subtopic.checked))
        .bind(i64::from(subtopic.bookmarked))
        .bind(subtopic.image.as_ref().map(ImageRef::to_string))
        .bind(subtopic.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        let id = subtopic_id_from_i64(res.last_insert_rowid())?;
        self.feeds.subtopics.publish();
        Ok(id)
    }

    async fn upsert_subtopic(&self, subtopic: &Subtopic) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO subtopics (id, topic_id, owner_id, title, description, checked, bookmarked, image_ref, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                -- keep created_at from the original insert; only update mutable fields
                topic_id = excluded.topic_id,
                owner_id = excluded.owner_id,
                title = excluded.title,
                description = excluded.description,
                checked = excluded.checked,
                bookmarked = excluded.bookmarked,
                image_ref = excluded.image_ref
            ",
        )
        .bind(subtopic_id_to_i64(subtopic.id())?)
        .bind(topic_id_to_i64(subtopic.topic_id())?)
        .bind(subtopic.owner_id().map(OwnerId::as_str))
        .bind(subtopic.title())
        .bind(subtopic.description())
        .bind(i64::from(subtopic.checked()))
        .bind(i64::from(subtopic.bookmarked()))
        .bind(subtopic.image().map(ImageRef::to_string))
        .bind(subtopic.created_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        self.feeds.subtopics.publish();
        Ok(())
    }

    async fn get_subtopic(&self, id: SubtopicId) -> Result<Option<Subtopic>, StorageError> {
        let sql = format!("SELECT {SUBTOPIC_COLUMNS} FROM subtopics WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(subtopic_id_to_i64(id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        match row {
            Some(row) => map_subtopic_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_for_topic(&self, topic_id: TopicId) -> Result<Vec<Subtopic>, StorageError> {
        let sql =
            format!("SELECT {SUBTOPIC_COLUMNS} FROM subtopics WHERE topic_id = ?1 ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .bind(topic_id_to_i64(topic_id)?)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut subtopics = Vec::with_capacity(rows.len());
        for row in rows {
            subtopics.push(map_subtopic_row(&row)?);
        }
        Ok(subtopics)
    }

    async fn list_subtopics(&self, owner: Option<&OwnerId>) -> Result<Vec<Subtopic>, StorageError> {
        let sql = format!(
            "SELECT {SUBTOPIC_COLUMNS} FROM subtopics WHERE ?1 IS NULL OR owner_id = ?1 ORDER BY id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(owner.map(OwnerId::as_str))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut subtopics = Vec::with_capacity(rows.len());
        for row in rows {
            subtopics.push(map_subtopic_row(&row)?);
        }
        Ok(subtopics)
    }

    async fn list_bookmarked(
        &self,
        owner: Option<&OwnerId>,
    ) -> Result<Vec<Subtopic>, StorageError> {
        let sql = format!(
            "SELECT {SUBTOPIC_COLUMNS} FROM subtopics
             WHERE bookmarked = 1 AND (?1 IS NULL OR owner_id = ?1)
             ORDER BY id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(owner.map(OwnerId::as_str))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut subtopics = Vec::with_capacity(rows.len());
        for row in rows {
            subtopics.push(map_subtopic_row(&row)?);
        }
        Ok(subtopics)
    }

    async fn set_checked(&self, id: SubtopicId, checked: bool) -> Result<bool, StorageError> {
        let res = sqlx::query("UPDATE subtopics SET checked = ?2 WHERE id = ?1")
            .bind(subtopic_id_to_i64(id)?)
            .bind(i64::from(checked))
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        let updated = res.rows_affected() > 0;
        if updated {
            self.feeds.subtopics.publish();
        }
        Ok(updated)
    }

    async fn set_bookmarked(&self, id: SubtopicId, bookmarked: bool) -> Result<bool, StorageError> {
        let res = sqlx::query("UPDATE subtopics SET bookmarked = ?2 WHERE id = ?1")
            .bind(subtopic_id_to_i64(id)?)
            .bind(i64::from(bookmarked))
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        let updated = res.rows_affected() > 0;
        if updated {
            self.feeds.subtopics.publish();
        }
        Ok(updated)
    }

    async fn delete_subtopic(&self, id: SubtopicId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM subtopics WHERE id = ?1")
            .bind(subtopic_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        let removed = res.rows_affected() > 0;
        if removed {
            self.feeds.subtopics.publish();
        }
        Ok(removed)
    }
}
