use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

use crate::entities::actions::Action;
use crate::entities::channels::reduce;
use crate::entities::state::ChannelsState;

/// A published state tree and the version it was published under.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Starts at 0 and increases by one for every action that changed the tree.
    pub version: u64,
    pub state: Arc<ChannelsState>,
    pub updated_at: DateTime<Utc>,
}

/// Single owner of the channel entities tree.
///
/// Actions are applied one at a time through `dispatch`, which needs
/// `&mut self`, so there is exactly one writer. Readers take `Arc`
/// snapshots or subscribe to be told when a new tree is published.
pub struct Store {
    publisher: watch::Sender<Snapshot>,
}

impl Store {
    pub fn new(initial: ChannelsState) -> Self {
        let snapshot = Snapshot {
            version: 0,
            state: Arc::new(initial),
            updated_at: Utc::now(),
        };
        let (publisher, _) = watch::channel(snapshot);
        Self { publisher }
    }

    /// Apply one action. Returns true if the tree changed; subscribers are
    /// only notified in that case.
    pub fn dispatch(&mut self, action: &Action) -> bool {
        let current = self.snapshot();
        let transition = reduce(&current, action);
        if !transition.changed {
            return false;
        }

        let version = self.version() + 1;
        self.publisher.send_replace(Snapshot {
            version,
            state: transition.state,
            updated_at: Utc::now(),
        });
        debug!(version, action = action.kind(), "published channel entities snapshot");
        true
    }

    /// The current tree. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<ChannelsState> {
        Arc::clone(&self.publisher.borrow().state)
    }

    pub fn version(&self) -> u64 {
        self.publisher.borrow().version
    }

    /// Receive every snapshot published after this call.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.publisher.subscribe()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(ChannelsState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::actions::{ChannelDeleted, ChannelIdRef, ChannelRef};
    use crate::entities::models::Channel;

    fn store_with_channel() -> Store {
        let mut store = Store::default();
        store.dispatch(&Action::ReceivedChannel(Channel::new("channel1")));
        store
    }

    #[test]
    fn test_new_store_starts_at_version_zero() {
        let store = Store::default();
        assert_eq!(store.version(), 0);
        assert_eq!(*store.snapshot(), ChannelsState::default());
    }

    #[test]
    fn test_dispatch_bumps_version_on_change() {
        let mut store = store_with_channel();
        assert_eq!(store.version(), 1);

        let changed = store.dispatch(&Action::ReceivedChannelDeleted(ChannelDeleted {
            id: "channel1".into(),
            delete_at: 1000,
        }));
        assert!(changed);
        assert_eq!(store.version(), 2);
        assert_eq!(store.snapshot().channels["channel1"].delete_at, 1000);
    }

    #[test]
    fn test_noop_keeps_snapshot_identity() {
        let mut store = store_with_channel();
        let before = store.snapshot();

        let changed = store.dispatch(&Action::RemoveManuallyUnread(ChannelIdRef {
            channel_id: "channel1".into(),
        }));

        assert!(!changed);
        assert_eq!(store.version(), 1);
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_old_snapshot_is_not_mutated() {
        let mut store = store_with_channel();
        let before = store.snapshot();

        store.dispatch(&Action::SelectChannel(ChannelRef {
            id: "channel1".into(),
        }));

        assert_eq!(before.current_channel_id, "");
        assert_eq!(store.snapshot().current_channel_id, "channel1");
        assert!(Arc::ptr_eq(&before.channels, &store.snapshot().channels));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes_only() {
        let mut store = Store::default();
        let mut rx = store.subscribe();

        store.dispatch(&Action::Unknown("NOT_OURS".into()));
        assert!(!rx.has_changed().unwrap());

        store.dispatch(&Action::ReceivedTotalChannelCount(5));
        rx.changed().await.unwrap();
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.state.total_count, 5);
    }
}
