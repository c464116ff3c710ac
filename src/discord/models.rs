//! Discord REST payloads consumed by the aggregator and the dashboard API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discord's numeric type for a guild text channel
pub const GUILD_TEXT_CHANNEL: u8 = 0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Automated/service account flag
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: String,
}

impl Channel {
    pub fn is_text(&self) -> bool {
        self.kind == GUILD_TEXT_CHANNEL
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub author: User,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub user: User,
    pub joined_at: DateTime<Utc>,
    /// Ids of the roles held, excluding the implicit `@everyone` role
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Member {
    /// Whether this member holds `role` in `guild_id`.
    ///
    /// `@everyone` shares its id with the guild and is held by every member.
    pub fn holds(&self, role: &Role, guild_id: &str) -> bool {
        role.id == guild_id || self.roles.iter().any(|id| *id == role.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub position: i64,
}

impl Role {
    pub fn hex_color(&self) -> String {
        format!("#{:06x}", self.color & 0x00ff_ffff)
    }
}

/// Partial guild returned by `/users/@me/guilds` for an OAuth user token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserGuild {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub owner: bool,
    /// Permission bitfield serialized as a decimal string
    #[serde(default)]
    pub permissions: String,
}

/// Partial guild returned by `/users/@me/guilds?with_counts=true` for the bot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotGuild {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub approximate_member_count: Option<u64>,
}
