use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use guildlens::analytics::StatsCache;
use guildlens::api::{self, AppState};
use guildlens::auth::DiscordOAuth;
use guildlens::config::Config;
use guildlens::discord::DiscordClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("guildlens=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    let discord = Arc::new(DiscordClient::from_config(&config.discord)?);
    let oauth = Arc::new(DiscordOAuth::from_config(&config.discord)?);
    info!("Discord API base: {}", config.discord.api_base_url);

    let cache = StatsCache::new(&config.cache);
    info!(
        "Analytics cache: ttl {}s, up to {} entries",
        config.cache.ttl_secs, config.cache.max_entries
    );

    if let Some(ref static_dir) = config.frontend.static_dir {
        info!("🎨 Serving frontend from directory: {}", static_dir);
    } else {
        info!("🎨 Serving embedded frontend");
    }

    let state = Arc::new(AppState {
        discord,
        oauth,
        cache,
        session: config.session.clone(),
        frontend: config.frontend.clone(),
    });
    let app = api::create_app_router(state);

    let addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Dashboard listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
