use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_server: ServerConfig,
    pub discord: DiscordConfig,
    pub cache: CacheConfig,
    pub session: SessionConfig,
    pub frontend: FrontendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub redirect_uri: String,
    #[serde(skip_serializing)]
    pub bot_token: String,
    /// REST base used with the bot token, e.g. `https://discord.com/api/v10`
    #[serde(default = "DiscordConfig::default_api_base_url")]
    pub api_base_url: String,
    /// Host serving the browser-facing `/oauth2/authorize` page
    #[serde(default = "DiscordConfig::default_oauth_base_url")]
    pub oauth_base_url: String,
    #[serde(default = "DiscordConfig::default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of a computed snapshot in seconds
    pub ttl_secs: u64,
    pub max_entries: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Whether the access token cookie carries the `Secure` attribute
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Path to directory containing static frontend files
    /// If None, uses the embedded `public/` assets
    pub static_dir: Option<String>,
}

impl DiscordConfig {
    pub const DEFAULT_API_BASE_URL: &'static str = "https://discord.com/api/v10";
    pub const DEFAULT_OAUTH_BASE_URL: &'static str = "https://discord.com";

    fn default_api_base_url() -> String {
        Self::DEFAULT_API_BASE_URL.to_string()
    }

    fn default_oauth_base_url() -> String {
        Self::DEFAULT_OAUTH_BASE_URL.to_string()
    }

    const fn default_http_timeout_secs() -> u64 {
        30
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_entries: 1000,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secure_cookie: true,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        let client_id =
            std::env::var("DISCORD_CLIENT_ID").context("DISCORD_CLIENT_ID must be set")?;
        let client_secret =
            std::env::var("DISCORD_CLIENT_SECRET").context("DISCORD_CLIENT_SECRET must be set")?;
        let redirect_uri = std::env::var("REDIRECT_URI").context("REDIRECT_URI must be set")?;
        let bot_token =
            std::env::var("DISCORD_BOT_TOKEN").context("DISCORD_BOT_TOKEN must be set")?;

        let api_base_url = std::env::var("DISCORD_API_BASE_URL")
            .unwrap_or_else(|_| DiscordConfig::default_api_base_url());
        let oauth_base_url = std::env::var("DISCORD_OAUTH_BASE_URL")
            .unwrap_or_else(|_| DiscordConfig::default_oauth_base_url());
        let http_timeout_secs = parse_env_or("DISCORD_HTTP_TIMEOUT_SECS", || {
            DiscordConfig::default_http_timeout_secs()
        });

        let cache_defaults = CacheConfig::default();
        let cache = CacheConfig {
            ttl_secs: parse_env_or("ANALYTICS_CACHE_TTL_SECS", || cache_defaults.ttl_secs),
            max_entries: parse_env_or("ANALYTICS_CACHE_MAX_ENTRIES", || {
                cache_defaults.max_entries
            }),
        };

        let secure_cookie = std::env::var("SESSION_COOKIE_SECURE")
            .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);

        let frontend_static_dir = std::env::var("FRONTEND_STATIC_DIR").ok();

        Ok(Config {
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            discord: DiscordConfig {
                client_id,
                client_secret,
                redirect_uri,
                bot_token,
                api_base_url: api_base_url.trim_end_matches('/').to_string(),
                oauth_base_url: oauth_base_url.trim_end_matches('/').to_string(),
                http_timeout_secs,
            },
            cache,
            session: SessionConfig { secure_cookie },
            frontend: FrontendConfig {
                static_dir: frontend_static_dir,
            },
        })
    }
}

/// Parse a numeric env var, falling back (with a warning) on absent or malformed values.
fn parse_env_or<F>(name: &str, default: F) -> u64
where
    F: FnOnce() -> u64,
{
    match std::env::var(name) {
        Ok(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
            tracing::warn!("Invalid value '{raw}' for {name}, falling back to default");
            default()
        }),
        Err(_) => default(),
    }
}
