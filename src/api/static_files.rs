use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use mime_guess::from_path;
use rust_embed::RustEmbed;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use super::AppState;

#[derive(RustEmbed)]
#[folder = "public"]
pub struct Assets;

const NOT_FOUND_PAGE: &str = "404.html";

/// Landing page
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    serve_page(&state, "index.html").await
}

pub async fn servers_page(State(state): State<Arc<AppState>>) -> Response {
    serve_page(&state, "servers.html").await
}

pub async fn manage_page(State(state): State<Arc<AppState>>) -> Response {
    serve_page(&state, "manage.html").await
}

/// Any other path: a static asset, otherwise the 404 page
pub async fn serve_static(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    serve_page(&state, path).await
}

async fn serve_page(state: &AppState, path: &str) -> Response {
    let static_dir = state.frontend.static_dir.as_deref();

    if let Some(response) = load(static_dir, path).await {
        return (StatusCode::OK, response).into_response();
    }

    tracing::debug!(path, "static asset not found");
    match load(static_dir, NOT_FOUND_PAGE).await {
        Some(page) => (StatusCode::NOT_FOUND, page).into_response(),
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

/// Serve from the filesystem when a static dir is configured, else from embedded assets
async fn load(static_dir: Option<&str>, path: &str) -> Option<Response> {
    if path.is_empty() || !is_safe(path) {
        return None;
    }

    if let Some(dir) = static_dir {
        let file_path = PathBuf::from(dir).join(path);
        if let Ok(content) = tokio::fs::read(&file_path).await {
            return Some(with_mime(path, Body::from(content)));
        }
    }

    Assets::get(path).map(|content| with_mime(path, Body::from(content.data)))
}

fn with_mime(path: &str, body: Body) -> Response {
    let mime = from_path(path).first_or_octet_stream();
    ([(header::CONTENT_TYPE, mime.as_ref().to_string())], body).into_response()
}

/// Rejects absolute paths and `..` segments
fn is_safe(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
}
