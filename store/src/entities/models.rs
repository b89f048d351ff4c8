use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Channel `type` of private channels.
pub const PRIVATE_CHANNEL: &str = "P";

/// A channel record as delivered by the server.
///
/// Fields the store does not interpret are kept in `extra` so a record
/// survives a decode/encode cycle unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    pub id: String,
    /// Empty for direct and group messages, which belong to no team.
    pub team_id: String,
    #[serde(rename = "type")]
    pub channel_type: String,
    pub name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Milliseconds since the epoch; 0 while the channel is active.
    pub delete_at: i64,
    pub create_at: i64,
    pub update_at: i64,
    pub total_msg_count: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Channel {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn is_archived(&self) -> bool {
        self.delete_at != 0
    }
}

/// A user's membership in a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMembership {
    pub channel_id: String,
    pub user_id: String,
    pub roles: String,
    pub last_viewed_at: i64,
    pub msg_count: i64,
    pub mention_count: i64,
    pub last_update_at: i64,
    pub notify_props: Map<String, Value>,
}

impl ChannelMembership {
    pub fn new(channel_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            user_id: user_id.into(),
            ..Self::default()
        }
    }
}

/// Aggregate counters for a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelStats {
    pub channel_id: String,
    pub member_count: u64,
    pub pinnedpost_count: u64,
    pub guest_count: u64,
}

/// Groups linked to a channel, in the order the server listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelGroups {
    pub ids: Vec<String>,
    pub total_count: u64,
}
