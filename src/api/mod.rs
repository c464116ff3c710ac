//! Dashboard HTTP surface

pub mod analytics;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod session;
pub mod static_files;

use std::sync::Arc;

use crate::analytics::StatsCache;
use crate::auth::OAuthProvider;
use crate::config::{FrontendConfig, SessionConfig};
use crate::discord::DiscordBackend;

pub use error::ApiError;
pub use routes::create_app_router;

pub struct AppState {
    /// Bot-token access to guilds, history and membership
    pub discord: Arc<dyn DiscordBackend>,
    /// User-token access for login and guild listing
    pub oauth: Arc<dyn OAuthProvider>,
    pub cache: StatsCache,
    pub session: SessionConfig,
    pub frontend: FrontendConfig,
}
