use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::require_session;

use super::analytics::get_guild_stats;
use super::handlers::{bot_invite, current_user, delete_role, health_check, list_roles, list_servers};
use super::session::{callback, login, logout};
use super::static_files::{index, manage_page, serve_static, servers_page};
use super::AppState;

pub fn create_app_router(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route("/servers.html", get(servers_page))
        .route("/manage.html", get(manage_page))
        .route("/api/servers", get(list_servers))
        .route("/api/user", get(current_user))
        .route("/api/bot-invite", get(bot_invite))
        .route("/api/analytics/{server_id}", get(get_guild_stats))
        .route("/api/roles/{server_id}", get(list_roles))
        .route("/api/roles/{server_id}/{role_id}", delete(delete_role))
        .route_layer(middleware::from_fn(require_session));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/login", get(login))
        .route("/callback", get(callback))
        .route("/api/logout", post(logout))
        .merge(protected_routes)
        .fallback(serve_static)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
