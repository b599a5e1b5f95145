use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use study_core::model::{ImageRef, OwnerId, Subtopic, SubtopicId, Topic, TopicId};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn topic_id_from_i64(v: i64) -> Result<TopicId, StorageError> {
    Ok(TopicId::new(i64_to_u64("topic_id", v)?))
}

pub(crate) fn subtopic_id_from_i64(v: i64) -> Result<SubtopicId, StorageError> {
    Ok(SubtopicId::new(i64_to_u64("subtopic_id", v)?))
}

pub(crate) fn topic_id_to_i64(id: TopicId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("topic_id overflow".into()))
}

pub(crate) fn subtopic_id_to_i64(id: SubtopicId) -> Result<i64, StorageError> {
    i64::try_from(id.value())
        .map_err(|_| StorageError::Serialization("subtopic_id overflow".into()))
}

pub(crate) fn owner_from_raw(raw: Option<String>) -> Result<Option<OwnerId>, StorageError> {
    raw.map(|s| OwnerId::new(s).map_err(ser)).transpose()
}

pub(crate) fn image_from_raw(raw: Option<String>) -> Result<Option<ImageRef>, StorageError> {
    raw.map(|s| ImageRef::parse(s).map_err(ser)).transpose()
}

pub(crate) fn map_topic_row(row: &SqliteRow) -> Result<Topic, StorageError> {
    Topic::new(
        topic_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        owner_from_raw(row.try_get::<Option<String>, _>("owner_id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_subtopic_row(row: &SqliteRow) -> Result<Subtopic, StorageError> {
    Subtopic::from_persisted(
        subtopic_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        topic_id_from_i64(row.try_get::<i64, _>("topic_id").map_err(ser)?)?,
        owner_from_raw(row.try_get::<Option<String>, _>("owner_id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("description").map_err(ser)?,
        row.try_get::<i64, _>("checked").map_err(ser)? != 0,
        row.try_get::<i64, _>("bookmarked").map_err(ser)? != 0,
        image_from_raw(row.try_get::<Option<String>, _>("image_ref").map_err(ser)?)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}
