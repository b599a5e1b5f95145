use std::collections::HashMap;

use crate::model::ids::{OwnerId, TopicId};
use crate::model::subtopic::Subtopic;
use crate::model::topic::Topic;

//
// ─── DERIVED PROGRESS ──────────────────────────────────────────────────────────
//

/// A topic paired with its derived completion state.
///
/// `checked` is true when every subtopic of the topic is checked. A topic with
/// no subtopics reads as complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicWithProgress {
    pub topic: Topic,
    pub checked: bool,
}

/// Joins topics with their subtopics and derives per-topic completion.
///
/// Subtopics are grouped by `topic_id` in a single pass; each topic is then
/// paired with `all(checked)` over its group. Output preserves the order of
/// `topics`. When `owner` is given, topics and subtopics belonging to anyone
/// else are excluded. Subtopics whose topic is not present are dropped;
/// a deletion racing a write is not an error here.
#[must_use]
pub fn aggregate_progress(
    topics: &[Topic],
    subtopics: &[Subtopic],
    owner: Option<&OwnerId>,
) -> Vec<TopicWithProgress> {
    let mut by_topic: HashMap<TopicId, Vec<&Subtopic>> = HashMap::new();
    for subtopic in subtopics {
        if owner.is_some() && subtopic.owner_id() != owner {
            continue;
        }
        by_topic.entry(subtopic.topic_id()).or_default().push(subtopic);
    }

    topics
        .iter()
        .filter(|topic| owner.is_none() || topic.owner_id() == owner)
        .map(|topic| TopicWithProgress {
            topic: topic.clone(),
            checked: by_topic
                .get(&topic.id())
                .is_none_or(|group| group.iter().all(|s| s.checked())),
        })
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::SubtopicId;
    use crate::time::fixed_now;

    fn topic(id: u64, title: &str) -> Topic {
        Topic::new(TopicId::new(id), None, title, fixed_now()).unwrap()
    }

    fn owned_topic(id: u64, title: &str, owner: &OwnerId) -> Topic {
        Topic::new(TopicId::new(id), Some(owner.clone()), title, fixed_now()).unwrap()
    }

    fn subtopic(id: u64, topic_id: u64, checked: bool) -> Subtopic {
        Subtopic::from_persisted(
            SubtopicId::new(id),
            TopicId::new(topic_id),
            None,
            format!("Subtopic {id}"),
            "",
            checked,
            false,
            None,
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn vacuously_complete_without_subtopics() {
        let topics = [topic(1, "Cats")];
        let out = aggregate_progress(&topics, &[], None);

        assert_eq!(out.len(), 1);
        assert!(out[0].checked);
    }

    #[test]
    fn unchecked_subtopic_keeps_topic_incomplete() {
        let topics = [topic(1, "Dogs")];
        let subs = [subtopic(1, 1, true), subtopic(2, 1, false)];
        let out = aggregate_progress(&topics, &subs, None);

        assert_eq!(out.len(), 1);
        assert!(!out[0].checked);
    }

    #[test]
    fn all_checked_subtopics_complete_topic() {
        let topics = [topic(1, "Dogs")];
        let subs = [subtopic(1, 1, true), subtopic(2, 1, true)];
        let out = aggregate_progress(&topics, &subs, None);

        assert!(out[0].checked);
    }

    #[test]
    fn preserves_topic_order_and_isolates_groups() {
        let topics = [topic(1, "Dogs"), topic(2, "Cats"), topic(3, "Birds")];
        let subs = [
            subtopic(1, 1, false),
            subtopic(2, 3, true),
            subtopic(3, 3, true),
        ];
        let out = aggregate_progress(&topics, &subs, None);

        let titles: Vec<&str> = out.iter().map(|t| t.topic.title()).collect();
        assert_eq!(titles, ["Dogs", "Cats", "Birds"]);
        assert!(!out[0].checked);
        assert!(out[1].checked); // no subtopics
        assert!(out[2].checked);
    }

    #[test]
    fn drops_subtopics_of_missing_topics() {
        let topics = [topic(1, "Dogs")];
        let subs = [subtopic(1, 1, true), subtopic(2, 99, false)];
        let out = aggregate_progress(&topics, &subs, None);

        assert_eq!(out.len(), 1);
        assert!(out[0].checked);
    }

    #[test]
    fn owner_filter_hides_foreign_records() {
        let alice = OwnerId::new("alice").unwrap();
        let bob = OwnerId::new("bob").unwrap();

        let topics = [owned_topic(1, "Dogs", &alice), owned_topic(2, "Cats", &bob)];
        let foreign = Subtopic::from_persisted(
            SubtopicId::new(1),
            TopicId::new(1),
            Some(bob.clone()),
            "Bob's card",
            "",
            false,
            false,
            None,
            fixed_now(),
        )
        .unwrap();

        let out = aggregate_progress(&topics, &[foreign], Some(&alice));

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].topic.title(), "Dogs");
        // Bob's unchecked subtopic under Alice's topic is invisible to Alice.
        assert!(out[0].checked);
    }

    #[test]
    fn no_owner_filter_sees_everything() {
        let alice = OwnerId::new("alice").unwrap();
        let topics = [owned_topic(1, "Dogs", &alice), topic(2, "Cats")];
        let out = aggregate_progress(&topics, &[], None);

        assert_eq!(out.len(), 2);
    }
}
