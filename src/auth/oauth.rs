use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::DiscordConfig;
use crate::discord::{User, UserGuild};

const CDN_BASE_URL: &str = "https://cdn.discordapp.com";
const OAUTH_SCOPES: &str = "identify guilds";
/// Administrator; the dashboard needs history, member and role access
const BOT_INVITE_PERMISSIONS: &str = "8";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("oauth request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("discord returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("authorization code rejected: {0}")]
    Rejected(String),
}

/// Successful response of the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Identity shown in the dashboard header
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub avatar: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        let avatar = user
            .avatar
            .as_ref()
            .map(|hash| format!("{CDN_BASE_URL}/avatars/{}/{hash}.png", user.id));
        Self {
            id: user.id,
            username: user.username,
            avatar,
        }
    }
}

/// User-token side of Discord: login, identity and guild membership.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Authorize URL carrying `state`
    fn authorize_url(&self, state: &str) -> String;

    /// URL adding the bot to a guild
    fn bot_invite_url(&self) -> String;

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, OAuthError>;

    async fn current_user(&self, access_token: &str) -> Result<UserProfile, OAuthError>;

    async fn current_user_guilds(&self, access_token: &str) -> Result<Vec<UserGuild>, OAuthError>;
}

#[derive(Clone)]
pub struct DiscordOAuth {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    authorize_endpoint: Url,
    api_base: String,
}

impl DiscordOAuth {
    pub fn from_config(config: &DiscordConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("guildlens-oauth/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("failed to build HTTP client for Discord OAuth")?;

        let oauth_base = config.oauth_base_url.trim_end_matches('/');
        let authorize_endpoint = Url::parse(&format!("{oauth_base}/oauth2/authorize"))
            .with_context(|| format!("invalid DISCORD_OAUTH_BASE_URL '{oauth_base}'"))?;

        Ok(Self {
            client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            authorize_endpoint,
            api_base: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_with_token<T>(&self, path: &str, access_token: &str) -> Result<T, OAuthError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .get(format!("{}{}", self.api_base, path))
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl OAuthProvider for DiscordOAuth {
    fn authorize_url(&self, state: &str) -> String {
        let mut url = self.authorize_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", OAUTH_SCOPES)
            .append_pair("state", state);
        url.into()
    }

    fn bot_invite_url(&self) -> String {
        let mut url = self.authorize_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("permissions", BOT_INVITE_PERMISSIONS)
            .append_pair("scope", "bot");
        url.into()
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, OAuthError> {
        debug!("exchanging authorization code");
        let response = self
            .client
            .post(format!("{}/oauth2/token", self.api_base))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if let Ok(grant) = serde_json::from_str::<TokenGrant>(&body) {
            return Ok(grant);
        }
        if let Ok(rejection) = serde_json::from_str::<TokenErrorBody>(&body) {
            return Err(OAuthError::Rejected(
                rejection.error_description.unwrap_or(rejection.error),
            ));
        }

        Err(OAuthError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn current_user(&self, access_token: &str) -> Result<UserProfile, OAuthError> {
        let user: User = self.get_with_token("/users/@me", access_token).await?;
        Ok(user.into())
    }

    async fn current_user_guilds(&self, access_token: &str) -> Result<Vec<UserGuild>, OAuthError> {
        self.get_with_token("/users/@me/guilds", access_token).await
    }
}
