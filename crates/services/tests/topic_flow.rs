use services::{AppServices, Clock, UserSession};
use study_core::model::ImageRef;
use study_core::time::fixed_now;

#[tokio::test]
async fn topic_flow_create_edit_cascade_delete() {
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_topic_flow?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
        UserSession::anonymous(),
    )
    .await
    .expect("connect sqlite");

    let topics = services.topics();
    let subtopics = services.subtopics();

    let topic_id = topics
        .create_topic("German".to_string(), None)
        .await
        .expect("create topic");

    let first = subtopics
        .create_subtopic(
            topic_id,
            None,
            "Greetings".to_string(),
            "Hallo, Guten Morgen, Tschuss.".to_string(),
            None,
        )
        .await
        .expect("create subtopic");
    subtopics
        .create_subtopic(
            topic_id,
            None,
            "Numbers".to_string(),
            "Eins bis zehn.".to_string(),
            Some(ImageRef::from_url("https://example.com/numbers.png").expect("image")),
        )
        .await
        .expect("create subtopic");

    topics
        .rename_topic(topic_id, "German B1".to_string())
        .await
        .expect("rename");
    let renamed = topics
        .get_topic(topic_id)
        .await
        .expect("get")
        .expect("some");
    assert_eq!(renamed.title(), "German B1");

    subtopics
        .update_content(
            first,
            "Greetings and farewells".to_string(),
            "Hallo, Guten Morgen, Auf Wiedersehen.".to_string(),
            None,
        )
        .await
        .expect("update subtopic");

    let listed = subtopics.list_for_topic(topic_id).await.expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].title(), "Greetings and farewells");
    assert_eq!(listed[1].title(), "Numbers");

    topics.delete_topic(topic_id).await.expect("delete");
    assert!(
        topics
            .get_topic(topic_id)
            .await
            .expect("get")
            .is_none()
    );
    assert!(
        subtopics
            .list_for_topic(topic_id)
            .await
            .expect("list after delete")
            .is_empty()
    );
}

#[tokio::test]
async fn bookmarks_survive_check_toggles() {
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_bookmarks?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
        UserSession::anonymous(),
    )
    .await
    .expect("connect sqlite");

    let topics = services.topics();
    let subtopics = services.subtopics();

    let topic_id = topics
        .create_topic("Dogs".to_string(), None)
        .await
        .expect("create topic");
    let subtopic_id = subtopics
        .create_subtopic(
            topic_id,
            None,
            "Terriers".to_string(),
            String::new(),
            None,
        )
        .await
        .expect("create subtopic");

    subtopics
        .set_bookmarked(subtopic_id, true)
        .await
        .expect("bookmark");
    subtopics
        .set_checked(subtopic_id, true)
        .await
        .expect("check");
    subtopics
        .set_checked(subtopic_id, false)
        .await
        .expect("uncheck");

    let bookmarked = subtopics.list_bookmarked(None).await.expect("bookmarked");
    assert_eq!(bookmarked.len(), 1);
    assert_eq!(bookmarked[0].id(), subtopic_id);
    assert!(!bookmarked[0].checked());
}
