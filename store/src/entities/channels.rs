use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, trace};

use super::actions::Action;
use super::models::{Channel, ChannelGroups, ChannelMembership, ChannelStats};
use super::state::{
    ChannelMembers, ChannelsState, Slice, cleared, merge_entries, update_entry, without_entry,
};

/// Result of applying one action to a state tree.
///
/// When `changed` is false, `state` is the very `Arc` that was passed in.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: Arc<ChannelsState>,
    pub changed: bool,
}

impl Transition {
    fn unchanged(state: &Arc<ChannelsState>) -> Self {
        Self {
            state: Arc::clone(state),
            changed: false,
        }
    }
}

/// Apply `action` to `state`.
///
/// Each slice has its own sub-reducer returning `Some(next)` only when it
/// changed. Slices that did not change keep their `Arc` in the new tree, and
/// if none changed the input tree itself is returned.
pub fn reduce(state: &Arc<ChannelsState>, action: &Action) -> Transition {
    let current_channel_id = current_channel_id(&state.current_channel_id, action);
    let channels_next = channels(&state.channels, action);
    let channels_in_team_next = channels_in_team(&state.channels_in_team, action);
    let my_members_next = my_members(&state.my_members, action);
    let members_in_channel_next = members_in_channel(&state.members_in_channel, action);
    let stats_next = stats(&state.stats, action);
    let groups_next = groups_associated_to_channel(&state.groups_associated_to_channel, action);
    let total_count_next = total_count(state.total_count, action);
    let manually_unread_next = manually_unread(&state.manually_unread, action);

    let changed = current_channel_id.is_some()
        || channels_next.is_some()
        || channels_in_team_next.is_some()
        || my_members_next.is_some()
        || members_in_channel_next.is_some()
        || stats_next.is_some()
        || groups_next.is_some()
        || total_count_next.is_some()
        || manually_unread_next.is_some();

    if !changed {
        trace!(action = action.kind(), "channel entities unchanged");
        return Transition::unchanged(state);
    }

    debug!(action = action.kind(), "channel entities updated");

    let next = ChannelsState {
        current_channel_id: current_channel_id
            .unwrap_or_else(|| state.current_channel_id.clone()),
        channels: channels_next.unwrap_or_else(|| Arc::clone(&state.channels)),
        channels_in_team: channels_in_team_next
            .unwrap_or_else(|| Arc::clone(&state.channels_in_team)),
        my_members: my_members_next.unwrap_or_else(|| Arc::clone(&state.my_members)),
        members_in_channel: members_in_channel_next
            .unwrap_or_else(|| Arc::clone(&state.members_in_channel)),
        stats: stats_next.unwrap_or_else(|| Arc::clone(&state.stats)),
        groups_associated_to_channel: groups_next
            .unwrap_or_else(|| Arc::clone(&state.groups_associated_to_channel)),
        total_count: total_count_next.unwrap_or(state.total_count),
        manually_unread: manually_unread_next
            .unwrap_or_else(|| Arc::clone(&state.manually_unread)),
    };

    Transition {
        state: Arc::new(next),
        changed: true,
    }
}

// ── Sub-reducers ────────────────────────────────────────────────

pub fn current_channel_id(state: &str, action: &Action) -> Option<String> {
    match action {
        Action::SelectChannel(target) if target.id != state => Some(target.id.clone()),
        Action::LogoutSuccess if !state.is_empty() => Some(String::new()),
        _ => None,
    }
}

pub fn channels(state: &Slice<Channel>, action: &Action) -> Option<Slice<Channel>> {
    match action {
        Action::ReceivedChannel(channel) => {
            merge_entries(state, [(channel.id.clone(), channel.clone())])
        }
        Action::ReceivedChannels(page) => merge_entries(
            state,
            page.channels.iter().map(|c| (c.id.clone(), c.clone())),
        ),
        Action::ReceivedChannelDeleted(deleted) => {
            update_entry(state, &deleted.id, |channel| {
                (channel.delete_at != deleted.delete_at).then(|| Channel {
                    delete_at: deleted.delete_at,
                    ..channel.clone()
                })
            })
        }
        Action::ReceivedChannelUnarchived(target) => update_entry(state, &target.id, |channel| {
            channel.is_archived().then(|| Channel {
                delete_at: 0,
                ..channel.clone()
            })
        }),
        Action::UpdateChannelHeader(update) => {
            update_entry(state, &update.channel_id, |channel| {
                (channel.header.as_deref() != Some(update.header.as_str())).then(|| Channel {
                    header: Some(update.header.clone()),
                    ..channel.clone()
                })
            })
        }
        Action::UpdateChannelPurpose(update) => {
            update_entry(state, &update.channel_id, |channel| {
                (channel.purpose.as_deref() != Some(update.purpose.as_str())).then(|| Channel {
                    purpose: Some(update.purpose.clone()),
                    ..channel.clone()
                })
            })
        }
        // Private channels are no longer visible once left.
        Action::LeaveChannel(left) if left.is_private() => without_entry(state, &left.id),
        Action::LogoutSuccess => cleared(state),
        _ => None,
    }
}

pub fn channels_in_team(
    state: &Slice<BTreeSet<String>>,
    action: &Action,
) -> Option<Slice<BTreeSet<String>>> {
    match action {
        Action::ReceivedChannel(channel) => add_to_teams(state, std::slice::from_ref(channel)),
        Action::ReceivedChannels(page) => add_to_teams(state, &page.channels),
        Action::LeaveChannel(left) if left.is_private() => remove_from_teams(state, &left.id),
        Action::LogoutSuccess => cleared(state),
        _ => None,
    }
}

/// Index each channel under its own `team_id`. Direct and group messages
/// have an empty `team_id` and are not indexed.
fn add_to_teams(
    state: &Slice<BTreeSet<String>>,
    channels: &[Channel],
) -> Option<Slice<BTreeSet<String>>> {
    let mut touched: HashMap<&str, BTreeSet<String>> = HashMap::new();
    for channel in channels {
        let team_id = channel.team_id.as_str();
        if team_id.is_empty() {
            continue;
        }
        let present = touched
            .get(team_id)
            .or_else(|| state.get(team_id).map(|set| &**set))
            .is_some_and(|set| set.contains(&channel.id));
        if present {
            continue;
        }
        touched
            .entry(team_id)
            .or_insert_with(|| state.get(team_id).map(|set| (**set).clone()).unwrap_or_default())
            .insert(channel.id.clone());
    }
    if touched.is_empty() {
        return None;
    }
    let mut next = HashMap::clone(state);
    for (team_id, ids) in touched {
        next.insert(team_id.to_string(), Arc::new(ids));
    }
    Some(Arc::new(next))
}

fn remove_from_teams(
    state: &Slice<BTreeSet<String>>,
    channel_id: &str,
) -> Option<Slice<BTreeSet<String>>> {
    if !state.values().any(|ids| ids.contains(channel_id)) {
        return None;
    }
    let next = state
        .iter()
        .map(|(team_id, ids)| {
            let ids = if ids.contains(channel_id) {
                let mut ids = (**ids).clone();
                ids.remove(channel_id);
                Arc::new(ids)
            } else {
                Arc::clone(ids)
            };
            (team_id.clone(), ids)
        })
        .collect();
    Some(Arc::new(next))
}

pub fn my_members(
    state: &Slice<ChannelMembership>,
    action: &Action,
) -> Option<Slice<ChannelMembership>> {
    match action {
        Action::ReceivedMyChannelMember(member) => {
            merge_entries(state, [(member.channel_id.clone(), member.clone())])
        }
        Action::ReceivedMyChannelMembers(members) => merge_entries(
            state,
            members.iter().map(|m| (m.channel_id.clone(), m.clone())),
        ),
        Action::LeaveChannel(leave) => without_entry(state, &leave.id),
        Action::PostUnreadSuccess(unread) => update_entry(state, &unread.channel_id, |member| {
            let next = ChannelMembership {
                msg_count: unread.msg_count.unwrap_or(member.msg_count),
                mention_count: unread.mention_count.unwrap_or(member.mention_count),
                last_viewed_at: unread.last_viewed_at.unwrap_or(member.last_viewed_at),
                ..member.clone()
            };
            (next != *member).then_some(next)
        }),
        Action::UpdateChannelMemberLastViewedAt(update) => {
            update_entry(state, &update.channel_id, |member| {
                (member.last_viewed_at != update.last_viewed_at).then(|| ChannelMembership {
                    last_viewed_at: update.last_viewed_at,
                    ..member.clone()
                })
            })
        }
        Action::LogoutSuccess => cleared(state),
        _ => None,
    }
}

pub fn members_in_channel(
    state: &Slice<ChannelMembers>,
    action: &Action,
) -> Option<Slice<ChannelMembers>> {
    match action {
        Action::ReceivedMyChannelMember(member) | Action::ReceivedChannelMember(member) => {
            add_members(state, std::slice::from_ref(member))
        }
        Action::ReceivedMyChannelMembers(members) | Action::ReceivedChannelMembers(members) => {
            add_members(state, members)
        }
        Action::RemoveMemberFromChannel(target) => {
            remove_member(state, &target.id, &target.user_id)
        }
        Action::LeaveChannel(left) => remove_member(state, &left.id, &left.user_id),
        Action::LogoutSuccess => cleared(state),
        _ => None,
    }
}

fn remove_member(
    state: &Slice<ChannelMembers>,
    channel_id: &str,
    user_id: &str,
) -> Option<Slice<ChannelMembers>> {
    update_entry(state, channel_id, |members| {
        if !members.contains_key(user_id) {
            return None;
        }
        let mut next = members.clone();
        next.remove(user_id);
        Some(next)
    })
}

fn add_members(
    state: &Slice<ChannelMembers>,
    members: &[ChannelMembership],
) -> Option<Slice<ChannelMembers>> {
    let mut touched: HashMap<&str, ChannelMembers> = HashMap::new();
    for member in members {
        let stored = touched
            .get(member.channel_id.as_str())
            .or_else(|| state.get(&member.channel_id).map(|m| &**m))
            .and_then(|m| m.get(&member.user_id));
        if stored.is_some_and(|m| **m == *member) {
            continue;
        }
        touched
            .entry(member.channel_id.as_str())
            .or_insert_with(|| {
                state
                    .get(&member.channel_id)
                    .map(|m| (**m).clone())
                    .unwrap_or_default()
            })
            .insert(member.user_id.clone(), Arc::new(member.clone()));
    }
    if touched.is_empty() {
        return None;
    }
    let mut next = HashMap::clone(state);
    for (channel_id, members) in touched {
        next.insert(channel_id.to_string(), Arc::new(members));
    }
    Some(Arc::new(next))
}

pub fn stats(state: &Slice<ChannelStats>, action: &Action) -> Option<Slice<ChannelStats>> {
    match action {
        Action::ReceivedChannelStats(stats) => {
            merge_entries(state, [(stats.channel_id.clone(), stats.clone())])
        }
        Action::AddChannelMemberSuccess(target) => update_entry(state, &target.id, |s| {
            Some(ChannelStats {
                member_count: s.member_count + 1,
                ..s.clone()
            })
        }),
        Action::RemoveChannelMemberSuccess(target) => update_entry(state, &target.id, |s| {
            (s.member_count > 0).then(|| ChannelStats {
                member_count: s.member_count - 1,
                ..s.clone()
            })
        }),
        Action::IncrementPinnedPostCount(target) => update_entry(state, &target.id, |s| {
            Some(ChannelStats {
                pinnedpost_count: s.pinnedpost_count + 1,
                ..s.clone()
            })
        }),
        Action::DecrementPinnedPostCount(target) => update_entry(state, &target.id, |s| {
            (s.pinnedpost_count > 0).then(|| ChannelStats {
                pinnedpost_count: s.pinnedpost_count - 1,
                ..s.clone()
            })
        }),
        Action::LogoutSuccess => cleared(state),
        _ => None,
    }
}

pub fn groups_associated_to_channel(
    state: &Slice<ChannelGroups>,
    action: &Action,
) -> Option<Slice<ChannelGroups>> {
    match action {
        Action::ReceivedGroupsAssociatedToChannel(received) => {
            let groups = ChannelGroups {
                ids: received.groups.iter().map(|g| g.id.clone()).collect(),
                total_count: received.total_count,
            };
            merge_entries(state, [(received.channel_id.clone(), groups)])
        }
        Action::LogoutSuccess => cleared(state),
        _ => None,
    }
}

pub fn total_count(state: u64, action: &Action) -> Option<u64> {
    match action {
        Action::ReceivedTotalChannelCount(count) if *count != state => Some(*count),
        Action::LogoutSuccess if state != 0 => Some(0),
        _ => None,
    }
}

/// Channel id -> `true` for channels the user explicitly marked unread.
/// Clearing deletes the key; it is never set to `false`.
pub fn manually_unread(
    state: &Arc<HashMap<String, bool>>,
    action: &Action,
) -> Option<Arc<HashMap<String, bool>>> {
    let mark = |channel_id: &str| {
        if state.get(channel_id) == Some(&true) {
            return None;
        }
        let mut next = HashMap::clone(state);
        next.insert(channel_id.to_string(), true);
        Some(Arc::new(next))
    };
    let unmark = |channel_id: &str| {
        if !state.contains_key(channel_id) {
            return None;
        }
        let mut next = HashMap::clone(state);
        next.remove(channel_id);
        Some(Arc::new(next))
    };

    match action {
        Action::PostUnreadSuccess(unread) => mark(unread.channel_id.as_str()),
        Action::AddManuallyUnread(target) => mark(target.channel_id.as_str()),
        Action::RemoveManuallyUnread(target) => unmark(target.channel_id.as_str()),
        Action::LeaveChannel(leave) => unmark(leave.id.as_str()),
        Action::LogoutSuccess => cleared(state),
        _ => None,
    }
}
