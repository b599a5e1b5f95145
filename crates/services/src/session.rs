use std::sync::Arc;

use tokio::sync::watch;

use study_core::model::OwnerId;

/// Tracks the currently signed-in user and exposes it as a live stream.
///
/// Sign-in itself happens elsewhere; this only holds the resulting owner id
/// so visibility filtering can react when the user changes. An anonymous
/// session sees everything.
#[derive(Clone)]
pub struct UserSession {
    tx: Arc<watch::Sender<Option<OwnerId>>>,
}

impl UserSession {
    /// Session with no signed-in user.
    #[must_use]
    pub fn anonymous() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Session that starts with the given user signed in.
    #[must_use]
    pub fn signed_in(owner: OwnerId) -> Self {
        let (tx, _rx) = watch::channel(Some(owner));
        Self { tx: Arc::new(tx) }
    }

    /// Switch the session to the given user.
    pub fn sign_in(&self, owner: OwnerId) {
        self.tx.send_replace(Some(owner));
    }

    /// Clear the signed-in user.
    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }

    /// The currently signed-in user, if any.
    #[must_use]
    pub fn current(&self) -> Option<OwnerId> {
        self.tx.borrow().clone()
    }

    /// Subscribe to user changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<OwnerId>> {
        self.tx.subscribe()
    }
}

impl Default for UserSession {
    fn default() -> Self {
        Self::anonymous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_in_and_out_are_visible_to_subscribers() {
        let session = UserSession::anonymous();
        let mut rx = session.subscribe();
        assert!(rx.borrow_and_update().is_none());

        let owner = OwnerId::new("uid-1").unwrap();
        session.sign_in(owner.clone());

        rx.changed().await.expect("session alive");
        assert_eq!(rx.borrow_and_update().as_ref(), Some(&owner));
        assert_eq!(session.current(), Some(owner));

        session.sign_out();
        rx.changed().await.expect("session alive");
        assert!(rx.borrow_and_update().is_none());
    }
}
