use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::models::{Channel, ChannelMembership, ChannelStats, PRIVATE_CHANNEL};

/// Wire names of the action types the channel entities reducer understands.
pub mod types {
    pub const RECEIVED_CHANNEL: &str = "RECEIVED_CHANNEL";
    pub const RECEIVED_CHANNELS: &str = "RECEIVED_CHANNELS";
    pub const RECEIVED_CHANNEL_DELETED: &str = "RECEIVED_CHANNEL_DELETED";
    pub const RECEIVED_CHANNEL_UNARCHIVED: &str = "RECEIVED_CHANNEL_UNARCHIVED";
    pub const UPDATE_CHANNEL_HEADER: &str = "UPDATE_CHANNEL_HEADER";
    pub const UPDATE_CHANNEL_PURPOSE: &str = "UPDATE_CHANNEL_PURPOSE";
    pub const SELECT_CHANNEL: &str = "SELECT_CHANNEL";
    pub const LEAVE_CHANNEL: &str = "LEAVE_CHANNEL";
    pub const RECEIVED_MY_CHANNEL_MEMBER: &str = "RECEIVED_MY_CHANNEL_MEMBER";
    pub const RECEIVED_MY_CHANNEL_MEMBERS: &str = "RECEIVED_MY_CHANNEL_MEMBERS";
    pub const RECEIVED_CHANNEL_MEMBER: &str = "RECEIVED_CHANNEL_MEMBER";
    pub const RECEIVED_CHANNEL_MEMBERS: &str = "RECEIVED_CHANNEL_MEMBERS";
    pub const REMOVE_MEMBER_FROM_CHANNEL: &str = "REMOVE_MEMBER_FROM_CHANNEL";
    pub const RECEIVED_CHANNEL_STATS: &str = "RECEIVED_CHANNEL_STATS";
    pub const ADD_CHANNEL_MEMBER_SUCCESS: &str = "ADD_CHANNEL_MEMBER_SUCCESS";
    pub const REMOVE_CHANNEL_MEMBER_SUCCESS: &str = "REMOVE_CHANNEL_MEMBER_SUCCESS";
    pub const INCREMENT_PINNED_POST_COUNT: &str = "INCREMENT_PINNED_POST_COUNT";
    pub const DECREMENT_PINNED_POST_COUNT: &str = "DECREMENT_PINNED_POST_COUNT";
    pub const RECEIVED_GROUPS_ASSOCIATED_TO_CHANNEL: &str =
        "RECEIVED_GROUPS_ASSOCIATED_TO_CHANNEL";
    pub const RECEIVED_TOTAL_CHANNEL_COUNT: &str = "RECEIVED_TOTAL_CHANNEL_COUNT";
    pub const UPDATE_CHANNEL_MEMBER_LAST_VIEWED_AT: &str = "UPDATE_CHANNEL_MEMBER_LAST_VIEWED_AT";
    pub const POST_UNREAD_SUCCESS: &str = "POST_UNREAD_SUCCESS";
    pub const ADD_MANUALLY_UNREAD: &str = "ADD_MANUALLY_UNREAD";
    pub const REMOVE_MANUALLY_UNREAD: &str = "REMOVE_MANUALLY_UNREAD";
    pub const LOGOUT_SUCCESS: &str = "LOGOUT_SUCCESS";
}

/// A state transition request consumed by the channel entities reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A single channel was loaded or changed.
    ReceivedChannel(Channel),

    /// A page of a team's channels was loaded.
    ReceivedChannels(TeamChannels),

    /// A channel was archived.
    ReceivedChannelDeleted(ChannelDeleted),

    /// An archived channel was restored.
    ReceivedChannelUnarchived(ChannelRef),

    UpdateChannelHeader(HeaderUpdate),

    UpdateChannelPurpose(PurposeUpdate),

    /// The user switched to another channel.
    SelectChannel(ChannelRef),

    /// The current user left a channel.
    LeaveChannel(LeftChannel),

    /// The current user's membership in one channel.
    ReceivedMyChannelMember(ChannelMembership),

    ReceivedMyChannelMembers(Vec<ChannelMembership>),

    /// Another user's membership in a channel.
    ReceivedChannelMember(ChannelMembership),

    ReceivedChannelMembers(Vec<ChannelMembership>),

    /// A user was removed from a channel.
    RemoveMemberFromChannel(MemberRef),

    ReceivedChannelStats(ChannelStats),

    /// A member was added; bump the cached member count.
    AddChannelMemberSuccess(ChannelRef),

    /// A member was removed; lower the cached member count.
    RemoveChannelMemberSuccess(ChannelRef),

    IncrementPinnedPostCount(ChannelRef),

    DecrementPinnedPostCount(ChannelRef),

    ReceivedGroupsAssociatedToChannel(GroupsAssociated),

    /// Total number of channels reported by the server.
    ReceivedTotalChannelCount(u64),

    UpdateChannelMemberLastViewedAt(LastViewedUpdate),

    /// The user marked a post unread. Carries the rewound counters for the
    /// user's membership when the server sent them.
    PostUnreadSuccess(PostUnread),

    /// Mark a channel unread without touching the membership counters.
    AddManuallyUnread(ChannelIdRef),

    /// Drop a channel's manual unread mark.
    RemoveManuallyUnread(ChannelIdRef),

    /// The user logged out; every slice resets.
    LogoutSuccess,

    /// Any type this reducer does not handle. Always a no-op.
    Unknown(String),
}

impl Action {
    /// The wire name of this action's type.
    pub fn kind(&self) -> &str {
        match self {
            Self::ReceivedChannel(_) => types::RECEIVED_CHANNEL,
            Self::ReceivedChannels(_) => types::RECEIVED_CHANNELS,
            Self::ReceivedChannelDeleted(_) => types::RECEIVED_CHANNEL_DELETED,
            Self::ReceivedChannelUnarchived(_) => types::RECEIVED_CHANNEL_UNARCHIVED,
            Self::UpdateChannelHeader(_) => types::UPDATE_CHANNEL_HEADER,
            Self::UpdateChannelPurpose(_) => types::UPDATE_CHANNEL_PURPOSE,
            Self::SelectChannel(_) => types::SELECT_CHANNEL,
            Self::LeaveChannel(_) => types::LEAVE_CHANNEL,
            Self::ReceivedMyChannelMember(_) => types::RECEIVED_MY_CHANNEL_MEMBER,
            Self::ReceivedMyChannelMembers(_) => types::RECEIVED_MY_CHANNEL_MEMBERS,
            Self::ReceivedChannelMember(_) => types::RECEIVED_CHANNEL_MEMBER,
            Self::ReceivedChannelMembers(_) => types::RECEIVED_CHANNEL_MEMBERS,
            Self::RemoveMemberFromChannel(_) => types::REMOVE_MEMBER_FROM_CHANNEL,
            Self::ReceivedChannelStats(_) => types::RECEIVED_CHANNEL_STATS,
            Self::AddChannelMemberSuccess(_) => types::ADD_CHANNEL_MEMBER_SUCCESS,
            Self::RemoveChannelMemberSuccess(_) => types::REMOVE_CHANNEL_MEMBER_SUCCESS,
            Self::IncrementPinnedPostCount(_) => types::INCREMENT_PINNED_POST_COUNT,
            Self::DecrementPinnedPostCount(_) => types::DECREMENT_PINNED_POST_COUNT,
            Self::ReceivedGroupsAssociatedToChannel(_) => {
                types::RECEIVED_GROUPS_ASSOCIATED_TO_CHANNEL
            }
            Self::ReceivedTotalChannelCount(_) => types::RECEIVED_TOTAL_CHANNEL_COUNT,
            Self::UpdateChannelMemberLastViewedAt(_) => {
                types::UPDATE_CHANNEL_MEMBER_LAST_VIEWED_AT
            }
            Self::PostUnreadSuccess(_) => types::POST_UNREAD_SUCCESS,
            Self::AddManuallyUnread(_) => types::ADD_MANUALLY_UNREAD,
            Self::RemoveManuallyUnread(_) => types::REMOVE_MANUALLY_UNREAD,
            Self::LogoutSuccess => types::LOGOUT_SUCCESS,
            Self::Unknown(kind) => kind.as_str(),
        }
    }
}

// ── Payloads ────────────────────────────────────────────────────

/// `{id}` payload naming a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: String,
}

/// `{channelId}` payload naming a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelIdRef {
    pub channel_id: String,
}

/// `{id, user_id}` payload naming a channel and a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRef {
    pub id: String,
    pub user_id: String,
}

/// `{id, user_id, type}` payload for a channel the current user left. The
/// channel type decides whether the channel itself stays loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeftChannel {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type", default)]
    pub channel_type: String,
}

impl LeftChannel {
    pub fn is_private(&self) -> bool {
        self.channel_type == PRIVATE_CHANNEL
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamChannels {
    pub team_id: String,
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDeleted {
    pub id: String,
    pub delete_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderUpdate {
    pub channel_id: String,
    pub header: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurposeUpdate {
    pub channel_id: String,
    pub purpose: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupsAssociated {
    #[serde(rename = "channelID")]
    pub channel_id: String,
    #[serde(default)]
    pub groups: Vec<GroupRef>,
    #[serde(rename = "totalGroupCount", default)]
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastViewedUpdate {
    pub channel_id: String,
    pub last_viewed_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUnread {
    pub channel_id: String,
    #[serde(default)]
    pub msg_count: Option<i64>,
    #[serde(default)]
    pub mention_count: Option<i64>,
    #[serde(default)]
    pub last_viewed_at: Option<i64>,
}

impl PostUnread {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            ..Self::default()
        }
    }
}

// ── Wire decoding ───────────────────────────────────────────────

/// An action as it travels between the dispatch layer and the store:
/// `{"type": "...", "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl ActionEnvelope {
    /// Decode the payload for this envelope's type. Unrecognized types
    /// become [`Action::Unknown`]; a recognized type with a payload of the
    /// wrong shape is an error.
    pub fn into_action(self) -> anyhow::Result<Action> {
        let Self { kind, data } = self;
        let action = match kind.as_str() {
            types::RECEIVED_CHANNEL => Action::ReceivedChannel(payload(&kind, data)?),
            types::RECEIVED_CHANNELS => Action::ReceivedChannels(payload(&kind, data)?),
            types::RECEIVED_CHANNEL_DELETED => {
                Action::ReceivedChannelDeleted(payload(&kind, data)?)
            }
            types::RECEIVED_CHANNEL_UNARCHIVED => {
                Action::ReceivedChannelUnarchived(payload(&kind, data)?)
            }
            types::UPDATE_CHANNEL_HEADER => Action::UpdateChannelHeader(payload(&kind, data)?),
            types::UPDATE_CHANNEL_PURPOSE => Action::UpdateChannelPurpose(payload(&kind, data)?),
            types::SELECT_CHANNEL => Action::SelectChannel(payload(&kind, data)?),
            types::LEAVE_CHANNEL => Action::LeaveChannel(payload(&kind, data)?),
            types::RECEIVED_MY_CHANNEL_MEMBER => {
                Action::ReceivedMyChannelMember(payload(&kind, data)?)
            }
            types::RECEIVED_MY_CHANNEL_MEMBERS => {
                Action::ReceivedMyChannelMembers(payload(&kind, data)?)
            }
            types::RECEIVED_CHANNEL_MEMBER => Action::ReceivedChannelMember(payload(&kind, data)?),
            types::RECEIVED_CHANNEL_MEMBERS => {
                Action::ReceivedChannelMembers(payload(&kind, data)?)
            }
            types::REMOVE_MEMBER_FROM_CHANNEL => {
                Action::RemoveMemberFromChannel(payload(&kind, data)?)
            }
            types::RECEIVED_CHANNEL_STATS => Action::ReceivedChannelStats(payload(&kind, data)?),
            types::ADD_CHANNEL_MEMBER_SUCCESS => {
                Action::AddChannelMemberSuccess(payload(&kind, data)?)
            }
            types::REMOVE_CHANNEL_MEMBER_SUCCESS => {
                Action::RemoveChannelMemberSuccess(payload(&kind, data)?)
            }
            types::INCREMENT_PINNED_POST_COUNT => {
                Action::IncrementPinnedPostCount(payload(&kind, data)?)
            }
            types::DECREMENT_PINNED_POST_COUNT => {
                Action::DecrementPinnedPostCount(payload(&kind, data)?)
            }
            types::RECEIVED_GROUPS_ASSOCIATED_TO_CHANNEL => {
                Action::ReceivedGroupsAssociatedToChannel(payload(&kind, data)?)
            }
            types::RECEIVED_TOTAL_CHANNEL_COUNT => {
                Action::ReceivedTotalChannelCount(payload(&kind, data)?)
            }
            types::UPDATE_CHANNEL_MEMBER_LAST_VIEWED_AT => {
                Action::UpdateChannelMemberLastViewedAt(payload(&kind, data)?)
            }
            types::POST_UNREAD_SUCCESS => Action::PostUnreadSuccess(payload(&kind, data)?),
            types::ADD_MANUALLY_UNREAD => Action::AddManuallyUnread(payload(&kind, data)?),
            types::REMOVE_MANUALLY_UNREAD => Action::RemoveManuallyUnread(payload(&kind, data)?),
            types::LOGOUT_SUCCESS => Action::LogoutSuccess,
            _ => Action::Unknown(kind),
        };
        Ok(action)
    }
}

impl Action {
    /// Parse one JSON action envelope.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let envelope: ActionEnvelope =
            serde_json::from_str(json).context("invalid action envelope")?;
        envelope.into_action()
    }
}

fn payload<T: DeserializeOwned>(kind: &str, data: Value) -> anyhow::Result<T> {
    serde_json::from_value(data).with_context(|| format!("malformed {kind} payload"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_channel_deleted() {
        let action =
            Action::from_json(r#"{"type":"RECEIVED_CHANNEL_DELETED","data":{"id":"channel1","deleteAt":1000}}"#)
                .unwrap();
        assert_eq!(
            action,
            Action::ReceivedChannelDeleted(ChannelDeleted {
                id: "channel1".into(),
                delete_at: 1000,
            })
        );
    }

    #[test]
    fn test_decode_header_and_purpose_use_channel_id() {
        let header = Action::from_json(
            r#"{"type":"UPDATE_CHANNEL_HEADER","data":{"channelId":"c1","header":"new"}}"#,
        )
        .unwrap();
        assert_eq!(header.kind(), types::UPDATE_CHANNEL_HEADER);

        let purpose = Action::from_json(
            r#"{"type":"UPDATE_CHANNEL_PURPOSE","data":{"channelId":"c1","purpose":"new"}}"#,
        )
        .unwrap();
        assert_eq!(
            purpose,
            Action::UpdateChannelPurpose(PurposeUpdate {
                channel_id: "c1".into(),
                purpose: "new".into(),
            })
        );
    }

    #[test]
    fn test_decode_member_removal() {
        let action = Action::from_json(
            r#"{"type":"REMOVE_MEMBER_FROM_CHANNEL","data":{"id":"channel2","user_id":"memberId2"}}"#,
        )
        .unwrap();
        assert_eq!(
            action,
            Action::RemoveMemberFromChannel(MemberRef {
                id: "channel2".into(),
                user_id: "memberId2".into(),
            })
        );
    }

    #[test]
    fn test_decode_leave_channel_with_type() {
        let action = Action::from_json(
            r#"{"type":"LEAVE_CHANNEL","data":{"id":"c1","user_id":"me","team_id":"t1","type":"P"}}"#,
        )
        .unwrap();
        let Action::LeaveChannel(left) = action else {
            panic!("wrong variant");
        };
        assert_eq!(left.id, "c1");
        assert!(left.is_private());

        let open = Action::from_json(r#"{"type":"LEAVE_CHANNEL","data":{"id":"c1","user_id":"me"}}"#)
            .unwrap();
        assert!(matches!(open, Action::LeaveChannel(ref left) if !left.is_private()));
    }

    #[test]
    fn test_decode_add_manually_unread() {
        let action =
            Action::from_json(r#"{"type":"ADD_MANUALLY_UNREAD","data":{"channelId":"channel1"}}"#)
                .unwrap();
        assert_eq!(
            action,
            Action::AddManuallyUnread(ChannelIdRef {
                channel_id: "channel1".into(),
            })
        );
        assert_eq!(action.kind(), types::ADD_MANUALLY_UNREAD);
    }

    #[test]
    fn test_decode_post_unread_without_counters() {
        let action =
            Action::from_json(r#"{"type":"POST_UNREAD_SUCCESS","data":{"channelId":"channel1"}}"#)
                .unwrap();
        assert_eq!(action, Action::PostUnreadSuccess(PostUnread::new("channel1")));
    }

    #[test]
    fn test_decode_logout_ignores_data() {
        assert_eq!(
            Action::from_json(r#"{"type":"LOGOUT_SUCCESS","data":{}}"#).unwrap(),
            Action::LogoutSuccess
        );
        assert_eq!(
            Action::from_json(r#"{"type":"LOGOUT_SUCCESS"}"#).unwrap(),
            Action::LogoutSuccess
        );
    }

    #[test]
    fn test_decode_total_count_is_bare_number() {
        assert_eq!(
            Action::from_json(r#"{"type":"RECEIVED_TOTAL_CHANNEL_COUNT","data":42}"#).unwrap(),
            Action::ReceivedTotalChannelCount(42)
        );
    }

    #[test]
    fn test_decode_groups() {
        let action = Action::from_json(
            r#"{"type":"RECEIVED_GROUPS_ASSOCIATED_TO_CHANNEL","data":{"channelID":"c1","groups":[{"id":"g1","name":"x"}],"totalGroupCount":5}}"#,
        )
        .unwrap();
        let Action::ReceivedGroupsAssociatedToChannel(groups) = action else {
            panic!("wrong variant");
        };
        assert_eq!(groups.channel_id, "c1");
        assert_eq!(groups.groups, vec![GroupRef { id: "g1".into() }]);
        assert_eq!(groups.total_count, 5);
    }

    #[test]
    fn test_unknown_type_falls_through() {
        let action =
            Action::from_json(r#"{"type":"RECEIVED_POSTS","data":{"anything":[1,2,3]}}"#).unwrap();
        assert_eq!(action, Action::Unknown("RECEIVED_POSTS".into()));
        assert_eq!(action.kind(), "RECEIVED_POSTS");
    }

    #[test]
    fn test_malformed_payload_is_error() {
        let err = Action::from_json(r#"{"type":"UPDATE_CHANNEL_HEADER","data":{"header":"x"}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("UPDATE_CHANNEL_HEADER"));
    }

    #[test]
    fn test_missing_type_is_error() {
        assert!(Action::from_json(r#"{"data":{}}"#).is_err());
    }
}
