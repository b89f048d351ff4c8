use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::models::{Channel, ChannelGroups, ChannelMembership, ChannelStats};

/// A keyed slice of the state tree. Both the map and every value sit behind
/// an `Arc`, so copying the map to change one key leaves all other values
/// pointer-equal to the previous tree.
pub type Slice<V> = Arc<HashMap<String, Arc<V>>>;

/// User id -> membership, for one channel.
pub type ChannelMembers = HashMap<String, Arc<ChannelMembership>>;

/// The channel entities tree. Never mutated in place: the reducer builds a
/// new tree and reuses every slice it did not touch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChannelsState {
    pub current_channel_id: String,
    /// Channel id -> channel.
    pub channels: Slice<Channel>,
    /// Team id -> ids of that team's channels.
    pub channels_in_team: Slice<BTreeSet<String>>,
    /// Channel id -> the current user's membership.
    pub my_members: Slice<ChannelMembership>,
    /// Channel id -> user id -> membership.
    pub members_in_channel: Slice<ChannelMembers>,
    /// Channel id -> counters.
    pub stats: Slice<ChannelStats>,
    /// Channel id -> linked groups.
    pub groups_associated_to_channel: Slice<ChannelGroups>,
    pub total_count: u64,
    /// Channel id -> `true` when the user marked it unread. Absent means not marked.
    pub manually_unread: Arc<HashMap<String, bool>>,
}

impl ChannelsState {
    /// Parse a state tree from its JSON form.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid channels state")
    }

    pub fn is_manually_unread(&self, channel_id: &str) -> bool {
        self.manually_unread
            .get(channel_id)
            .copied()
            .unwrap_or(false)
    }
}

// ── Slice helpers ───────────────────────────────────────────────

/// Copy of `slice` with `key` set to `value`.
pub(crate) fn with_entry<V>(slice: &Slice<V>, key: &str, value: V) -> Slice<V> {
    let mut next = HashMap::clone(slice);
    next.insert(key.to_string(), Arc::new(value));
    Arc::new(next)
}

/// Copy of `slice` without `key`, or `None` if the key is absent.
pub(crate) fn without_entry<V>(slice: &Slice<V>, key: &str) -> Option<Slice<V>> {
    if !slice.contains_key(key) {
        return None;
    }
    let mut next = HashMap::clone(slice);
    next.remove(key);
    Some(Arc::new(next))
}

/// Apply `update` to the value under `key`. `None` from `update`, or an
/// absent key, leaves the slice as it was.
pub(crate) fn update_entry<V>(
    slice: &Slice<V>,
    key: &str,
    update: impl FnOnce(&V) -> Option<V>,
) -> Option<Slice<V>> {
    let current = slice.get(key)?;
    let value = update(current)?;
    Some(with_entry(slice, key, value))
}

/// Insert every `(key, value)` pair that differs from what is stored.
pub(crate) fn merge_entries<V: PartialEq>(
    slice: &Slice<V>,
    entries: impl IntoIterator<Item = (String, V)>,
) -> Option<Slice<V>> {
    let mut next: Option<HashMap<String, Arc<V>>> = None;
    for (key, value) in entries {
        let stored = next.as_ref().map_or_else(|| slice.get(&key), |n| n.get(&key));
        if stored.is_some_and(|v| **v == value) {
            continue;
        }
        next.get_or_insert_with(|| HashMap::clone(slice))
            .insert(key, Arc::new(value));
    }
    next.map(Arc::new)
}

/// An empty slice, unless `slice` is already empty.
pub(crate) fn cleared<K, V>(slice: &Arc<HashMap<K, V>>) -> Option<Arc<HashMap<K, V>>> {
    (!slice.is_empty()).then(|| Arc::new(HashMap::new()))
}
