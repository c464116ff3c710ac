//! In-memory Discord and OAuth stand-ins plus request helpers

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response},
    Router,
};
use chrono::{DateTime, Utc};
use guildlens::analytics::StatsCache;
use guildlens::api::{create_app_router, AppState};
use guildlens::auth::{OAuthError, OAuthProvider, TokenGrant, UserProfile};
use guildlens::config::{CacheConfig, FrontendConfig, SessionConfig};
use guildlens::discord::{
    Attachment, BotGuild, Channel, Guild, GuildSource, Member, MembershipSource, Message,
    MessageSource, Role, SourceError, SourceResult, User, UserGuild,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const GUILD_ID: &str = "9000";
pub const VALID_CODE: &str = "good-code";
pub const ACCESS_TOKEN: &str = "user-token";

pub fn user(id: &str, bot: bool) -> User {
    User {
        id: id.to_string(),
        username: id.to_string(),
        avatar: None,
        bot,
    }
}

pub fn message(id: &str, channel_id: &str, author: &str, at: DateTime<Utc>) -> Message {
    Message {
        id: id.to_string(),
        channel_id: channel_id.to_string(),
        author: user(author, false),
        created_at: at,
        content: "hi".to_string(),
        attachments: Vec::new(),
    }
}

pub fn with_attachment(mut message: Message, content_type: &str) -> Message {
    message.attachments.push(Attachment {
        id: format!("{}-a", message.id),
        content_type: Some(content_type.to_string()),
    });
    message
}

pub fn member(name: &str, bot: bool, joined_at: DateTime<Utc>, roles: &[&str]) -> Member {
    Member {
        user: user(name, bot),
        joined_at,
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

pub fn role(id: &str, name: &str, position: i64) -> Role {
    Role {
        id: id.to_string(),
        name: name.to_string(),
        color: 0x3498db,
        position,
    }
}

pub fn text_channel(id: &str, name: &str) -> Channel {
    Channel {
        id: id.to_string(),
        kind: 0,
        name: name.to_string(),
    }
}

/// Single-guild backend with call counters
#[derive(Default)]
pub struct FakeDiscord {
    pub guild: Option<Guild>,
    pub channels: Vec<Channel>,
    pub messages: HashMap<String, Vec<Message>>,
    pub failing_channels: Vec<String>,
    pub members: Vec<Member>,
    pub roles: Vec<Role>,
    pub bot: Option<Member>,
    pub bot_guilds: Vec<BotGuild>,
    pub fail_members: bool,
    pub fail_roles: bool,
    pub deleted_roles: Mutex<Vec<String>>,
    pub history_calls: AtomicUsize,
    pub member_calls: AtomicUsize,
}

impl FakeDiscord {
    pub fn with_guild(name: &str) -> Self {
        Self {
            guild: Some(Guild {
                id: GUILD_ID.to_string(),
                name: name.to_string(),
                icon: None,
            }),
            ..Self::default()
        }
    }

    pub fn member_calls(&self) -> usize {
        self.member_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    fn known(&self, guild_id: &str) -> SourceResult<()> {
        match &self.guild {
            Some(guild) if guild.id == guild_id => Ok(()),
            _ => Err(SourceError::NotFound),
        }
    }
}

#[async_trait]
impl MessageSource for FakeDiscord {
    async fn list_text_channels(&self, guild_id: &str) -> SourceResult<Vec<Channel>> {
        self.known(guild_id)?;
        Ok(self.channels.iter().filter(|c| c.is_text()).cloned().collect())
    }

    async fn fetch_messages(
        &self,
        channel_id: &str,
        limit: u8,
        after: DateTime<Utc>,
    ) -> SourceResult<Vec<Message>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_channels.iter().any(|id| id == channel_id) {
            return Err(SourceError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(self
            .messages
            .get(channel_id)
            .map(|messages| {
                messages
                    .iter()
                    .filter(|m| m.created_at > after)
                    .take(limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl MembershipSource for FakeDiscord {
    async fn fetch_all_members(&self, guild_id: &str) -> SourceResult<Vec<Member>> {
        self.member_calls.fetch_add(1, Ordering::SeqCst);
        self.known(guild_id)?;
        if self.fail_members {
            return Err(SourceError::Forbidden);
        }
        Ok(self.members.clone())
    }

    async fn list_roles(&self, guild_id: &str) -> SourceResult<Vec<Role>> {
        self.known(guild_id)?;
        if self.fail_roles {
            return Err(SourceError::Forbidden);
        }
        Ok(self.roles.clone())
    }
}

#[async_trait]
impl GuildSource for FakeDiscord {
    async fn get_guild(&self, guild_id: &str) -> SourceResult<Option<Guild>> {
        Ok(self.guild.clone().filter(|g| g.id == guild_id))
    }

    async fn bot_guilds(&self) -> SourceResult<Vec<BotGuild>> {
        Ok(self.bot_guilds.clone())
    }

    async fn bot_member(&self, guild_id: &str) -> SourceResult<Member> {
        self.known(guild_id)?;
        self.bot.clone().ok_or(SourceError::NotFound)
    }

    async fn delete_role(&self, guild_id: &str, role_id: &str) -> SourceResult<bool> {
        self.known(guild_id)?;
        if !self.roles.iter().any(|r| r.id == role_id) {
            return Ok(false);
        }
        self.deleted_roles
            .lock()
            .map_err(|_| SourceError::Decode("poisoned".to_string()))?
            .push(role_id.to_string());
        Ok(true)
    }
}

/// Accepts [`VALID_CODE`] and answers with [`ACCESS_TOKEN`]
#[derive(Default)]
pub struct FakeOAuth {
    pub guilds: Vec<UserGuild>,
}

#[async_trait]
impl OAuthProvider for FakeOAuth {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://discord.test/oauth2/authorize?client_id=1&state={state}")
    }

    fn bot_invite_url(&self) -> String {
        "https://discord.test/oauth2/authorize?client_id=1&scope=bot".to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, OAuthError> {
        if code != VALID_CODE {
            return Err(OAuthError::Rejected("invalid_grant".to_string()));
        }
        Ok(TokenGrant {
            access_token: ACCESS_TOKEN.to_string(),
        })
    }

    async fn current_user(&self, access_token: &str) -> Result<UserProfile, OAuthError> {
        if access_token != ACCESS_TOKEN {
            return Err(OAuthError::Status {
                status: 401,
                body: "unauthorized".to_string(),
            });
        }
        Ok(UserProfile {
            id: "42".to_string(),
            username: "owner".to_string(),
            avatar: None,
        })
    }

    async fn current_user_guilds(&self, _access_token: &str) -> Result<Vec<UserGuild>, OAuthError> {
        Ok(self.guilds.clone())
    }
}

pub fn create_test_app(discord: Arc<FakeDiscord>, oauth: FakeOAuth) -> Router {
    let state = Arc::new(AppState {
        discord,
        oauth: Arc::new(oauth),
        cache: StatsCache::new(&CacheConfig::default()),
        session: SessionConfig {
            secure_cookie: false,
        },
        frontend: FrontendConfig { static_dir: None },
    });
    create_app_router(state)
}

pub fn authed_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, format!("discord_access_token={ACCESS_TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// All `Set-Cookie` header values
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}
