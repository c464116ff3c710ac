use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::models::{BotGuild, Channel, Guild, Member, Message, Role};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("discord request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("discord resource not found")]
    NotFound,
    #[error("bot lacks access to the requested resource")]
    Forbidden,
    #[error("discord returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode discord response: {0}")]
    Decode(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Channel listing and bounded history reads.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Text-capable channels of the guild
    async fn list_text_channels(&self, guild_id: &str) -> SourceResult<Vec<Channel>>;

    /// Up to `limit` messages created strictly after `after`
    async fn fetch_messages(
        &self,
        channel_id: &str,
        limit: u8,
        after: DateTime<Utc>,
    ) -> SourceResult<Vec<Message>>;
}

/// Current member and role listings.
#[async_trait]
pub trait MembershipSource: Send + Sync {
    async fn fetch_all_members(&self, guild_id: &str) -> SourceResult<Vec<Member>>;

    async fn list_roles(&self, guild_id: &str) -> SourceResult<Vec<Role>>;
}

/// Guild lookup and bot-scoped administration.
#[async_trait]
pub trait GuildSource: Send + Sync {
    /// `None` when the guild is unknown or the bot is not a member
    async fn get_guild(&self, guild_id: &str) -> SourceResult<Option<Guild>>;

    async fn bot_guilds(&self) -> SourceResult<Vec<BotGuild>>;

    /// The bot's own membership in the guild
    async fn bot_member(&self, guild_id: &str) -> SourceResult<Member>;

    /// Returns `false` when the role does not exist
    async fn delete_role(&self, guild_id: &str, role_id: &str) -> SourceResult<bool>;
}

/// Everything the dashboard needs from Discord.
pub trait DiscordBackend: GuildSource + MessageSource + MembershipSource {}

impl<T> DiscordBackend for T where T: GuildSource + MessageSource + MembershipSource {}
