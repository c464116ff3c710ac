pub mod oauth;
pub mod session;

pub use oauth::{DiscordOAuth, OAuthError, OAuthProvider, TokenGrant, UserProfile};
pub use session::{require_session, AccessToken};
