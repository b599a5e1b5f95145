use std::sync::Arc;

use tokio::sync::watch;

/// Change feed for one table.
///
/// Carries a monotonically increasing version, bumped after every committed
/// mutation. Subscribers re-query the table when the version moves; the
/// channel conflates, so a burst of writes wakes a subscriber once with the
/// newest version.
#[derive(Clone)]
pub struct TableFeed {
    tx: Arc<watch::Sender<u64>>,
}

impl TableFeed {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Announces that the table changed.
    pub fn publish(&self) {
        self.tx.send_modify(|version| *version = version.wrapping_add(1));
    }

    /// Returns a receiver positioned at the current version.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    /// Current version, for diagnostics.
    #[must_use]
    pub fn version(&self) -> u64 {
        *self.tx.borrow()
    }
}

impl Default for TableFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// The change feeds a repository backend publishes to.
#[derive(Clone, Default)]
pub struct StoreFeeds {
    pub topics: TableFeed,
    pub subtopics: TableFeed,
}

impl StoreFeeds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_wakes_subscriber() {
        let feed = TableFeed::new();
        let mut rx = feed.subscribe();

        feed.publish();
        rx.changed().await.expect("sender alive");
        assert_eq!(*rx.borrow_and_update(), 1);
    }

    #[tokio::test]
    async fn burst_conflates_to_latest_version() {
        let feed = TableFeed::new();
        let mut rx = feed.subscribe();

        feed.publish();
        feed.publish();
        feed.publish();

        rx.changed().await.expect("sender alive");
        assert_eq!(*rx.borrow_and_update(), 3);
        // Nothing further pending.
        assert!(!rx.has_changed().expect("sender alive"));
    }
}
