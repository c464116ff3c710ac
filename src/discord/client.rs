//! Bot-token REST client implementing the Discord source traits

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::debug;

use super::models::{BotGuild, Channel, Guild, Member, Message, Role, User};
use super::snowflake;
use super::source::{GuildSource, MembershipSource, MessageSource, SourceError, SourceResult};
use crate::config::DiscordConfig;

/// Largest page `/guilds/{id}/members` accepts
const MEMBERS_PAGE_LIMIT: usize = 1000;
/// Largest page `/users/@me/guilds` accepts
const GUILDS_PAGE_LIMIT: usize = 200;

#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    api_base: String,
    bot_token: String,
    bot_user: std::sync::Arc<OnceCell<User>>,
}

impl DiscordClient {
    pub fn from_config(config: &DiscordConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(
                "DiscordBot (https://github.com/guildlens/guildlens, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("failed to build HTTP client for the Discord API")?;

        Ok(Self {
            client,
            api_base: config.api_base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            bot_user: Default::default(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_base, path))
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.bot_token))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> SourceResult<T> {
        debug!(path, "GET discord");
        let response = self.request(Method::GET, path).query(query).send().await?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }

    /// The bot's own user, fetched once
    async fn bot_user(&self) -> SourceResult<&User> {
        self.bot_user
            .get_or_try_init(|| async { self.get_json::<User>("/users/@me", &[]).await })
            .await
    }
}

async fn check_status(response: Response) -> SourceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::NOT_FOUND => Err(SourceError::NotFound),
        StatusCode::FORBIDDEN => Err(SourceError::Forbidden),
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(SourceError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl MessageSource for DiscordClient {
    async fn list_text_channels(&self, guild_id: &str) -> SourceResult<Vec<Channel>> {
        let channels: Vec<Channel> = self
            .get_json(&format!("/guilds/{guild_id}/channels"), &[])
            .await?;
        Ok(channels.into_iter().filter(Channel::is_text).collect())
    }

    async fn fetch_messages(
        &self,
        channel_id: &str,
        limit: u8,
        after: DateTime<Utc>,
    ) -> SourceResult<Vec<Message>> {
        self.get_json(
            &format!("/channels/{channel_id}/messages"),
            &[
                ("limit", limit.to_string()),
                ("after", snowflake::from_timestamp(after).to_string()),
            ],
        )
        .await
    }
}

#[async_trait]
impl MembershipSource for DiscordClient {
    async fn fetch_all_members(&self, guild_id: &str) -> SourceResult<Vec<Member>> {
        let path = format!("/guilds/{guild_id}/members");
        let mut members: Vec<Member> = Vec::new();
        let mut after = "0".to_string();

        loop {
            let page: Vec<Member> = self
                .get_json(
                    &path,
                    &[
                        ("limit", MEMBERS_PAGE_LIMIT.to_string()),
                        ("after", after.clone()),
                    ],
                )
                .await?;

            let page_len = page.len();
            if let Some(last) = page.last() {
                after = last.user.id.clone();
            }
            members.extend(page);

            if page_len < MEMBERS_PAGE_LIMIT {
                break;
            }
        }

        debug!(guild_id, count = members.len(), "fetched guild members");
        Ok(members)
    }

    async fn list_roles(&self, guild_id: &str) -> SourceResult<Vec<Role>> {
        self.get_json(&format!("/guilds/{guild_id}/roles"), &[]).await
    }
}

#[async_trait]
impl GuildSource for DiscordClient {
    async fn get_guild(&self, guild_id: &str) -> SourceResult<Option<Guild>> {
        match self.get_json(&format!("/guilds/{guild_id}"), &[]).await {
            Ok(guild) => Ok(Some(guild)),
            Err(SourceError::NotFound | SourceError::Forbidden) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn bot_guilds(&self) -> SourceResult<Vec<BotGuild>> {
        let mut guilds: Vec<BotGuild> = Vec::new();
        let mut after = "0".to_string();

        loop {
            let page: Vec<BotGuild> = self
                .get_json(
                    "/users/@me/guilds",
                    &[
                        ("limit", GUILDS_PAGE_LIMIT.to_string()),
                        ("after", after.clone()),
                        ("with_counts", "true".to_string()),
                    ],
                )
                .await?;

            let page_len = page.len();
            if let Some(last) = page.last() {
                after = last.id.clone();
            }
            guilds.extend(page);

            if page_len < GUILDS_PAGE_LIMIT {
                break;
            }
        }

        Ok(guilds)
    }

    async fn bot_member(&self, guild_id: &str) -> SourceResult<Member> {
        let bot_id = self.bot_user().await?.id.clone();
        self.get_json(&format!("/guilds/{guild_id}/members/{bot_id}"), &[])
            .await
    }

    async fn delete_role(&self, guild_id: &str, role_id: &str) -> SourceResult<bool> {
        let response = self
            .request(Method::DELETE, &format!("/guilds/{guild_id}/roles/{role_id}"))
            .send()
            .await?;

        match check_status(response).await {
            Ok(_) => Ok(true),
            Err(SourceError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
