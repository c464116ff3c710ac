//! Login, OAuth callback and logout

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::ApiError;
use super::handlers::{SuccessResponse, UrlResponse};
use super::AppState;
use crate::auth::session::{self, STATE_COOKIE};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Authorize URL for the browser to follow, with a fresh CSRF state
pub async fn login(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let csrf_state = session::generate_state();
    let cookie = session::state_cookie(&csrf_state)
        .map_err(|e| ApiError::internal_with("Не удалось начать вход", &e))?;

    let body = Json(UrlResponse {
        url: state.oauth.authorize_url(&csrf_state),
    });

    Ok(([(header::SET_COOKIE, cookie)], body).into_response())
}

pub async fn callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Код не указан").into_response();
    };

    let expected = session::cookie_value(&headers, STATE_COOKIE);
    let state_ok = match (expected.as_deref(), params.state.as_deref()) {
        (Some(expected), Some(received)) => session::states_match(expected, received),
        _ => false,
    };
    if !state_ok {
        tracing::warn!("OAuth callback with missing or mismatched state");
        return (StatusCode::BAD_REQUEST, "Недействительный параметр state").into_response();
    }

    let grant = match state.oauth.exchange_code(&code).await {
        Ok(grant) => grant,
        Err(e) => {
            tracing::error!(error = %e, "failed to exchange authorization code");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Не удалось выполнить проверку подлинности",
            )
                .into_response();
        }
    };

    let cookie = match session::session_cookie(&grant.access_token, state.session.secure_cookie) {
        Ok(cookie) => cookie,
        Err(e) => {
            tracing::error!(error = %e, "access token is not a valid cookie value");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Не удалось выполнить проверку подлинности",
            )
                .into_response();
        }
    };

    let mut response = (StatusCode::FOUND, [(header::LOCATION, "/servers.html")]).into_response();
    let response_headers = response.headers_mut();
    response_headers.append(header::SET_COOKIE, cookie);
    response_headers.append(header::SET_COOKIE, session::clear_state_cookie());
    response
}

pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, session::clear_session_cookie())],
        Json(SuccessResponse {
            success: true,
            message: None,
        }),
    )
}
