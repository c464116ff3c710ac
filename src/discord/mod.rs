//! Discord collaborators: REST models, source traits and the bot client

pub mod client;
pub mod models;
pub mod permissions;
pub mod snowflake;
pub mod source;

pub use client::DiscordClient;
pub use models::{Attachment, BotGuild, Channel, Guild, Member, Message, Role, User, UserGuild};
pub use source::{
    DiscordBackend, GuildSource, MembershipSource, MessageSource, SourceError, SourceResult,
};
