//! Analytics API handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Local, Utc};
use serde::Deserialize;
use std::sync::Arc;

use super::error::ApiError;
use super::AppState;
use crate::analytics::{
    compute_stats, local_midnight, parse_date, StatsKey, StatsSnapshot, TimeWindow,
};

pub(crate) const GUILD_NOT_FOUND: &str = "Сервер не найден или бот не является участником.";
const ANALYTICS_FAILED: &str = "Не удалось получить аналитические данные";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQueryParams {
    /// RFC 3339 timestamp or `YYYY-MM-DD`; defaults to today's local midnight
    pub start_date: Option<String>,

    /// RFC 3339 timestamp or `YYYY-MM-DD`; defaults to now
    pub end_date: Option<String>,
}

/// Stats snapshot for a guild over the requested range
pub async fn get_guild_stats(
    State(state): State<Arc<AppState>>,
    Path(server_id): Path<String>,
    Query(params): Query<AnalyticsQueryParams>,
) -> Result<Json<Arc<StatsSnapshot>>, ApiError> {
    let window = resolve_window(&params, Utc::now())?;
    let key = StatsKey::new(
        &server_id,
        params.start_date.as_deref(),
        params.end_date.as_deref(),
    );

    if let Some(cached) = state.cache.get(&key).await {
        tracing::debug!(guild_id = %server_id, "serving cached stats");
        return Ok(Json(cached));
    }

    let guild = state
        .discord
        .get_guild(&server_id)
        .await
        .map_err(|e| {
            tracing::error!(guild_id = %server_id, error = %e, "guild lookup failed");
            ApiError::internal_with(ANALYTICS_FAILED, &e)
        })?
        .ok_or_else(|| ApiError::NotFound(GUILD_NOT_FOUND.to_string()))?;

    let snapshot = compute_stats(state.discord.as_ref(), &guild, &window)
        .await
        .map_err(|e| {
            tracing::error!(guild_id = %server_id, error = %e, "analytics failed");
            ApiError::internal_with(ANALYTICS_FAILED, &e)
        })?;

    let snapshot = Arc::new(snapshot);
    state.cache.insert(key, Arc::clone(&snapshot)).await;

    Ok(Json(snapshot))
}

/// Turn the query into a window, filling in today's range for absent bounds
pub fn resolve_window(
    params: &AnalyticsQueryParams,
    now: DateTime<Utc>,
) -> Result<TimeWindow, ApiError> {
    let end = match params.end_date.as_deref() {
        Some(raw) => parse_param(raw)?,
        None => now,
    };
    let start = match params.start_date.as_deref() {
        Some(raw) => parse_param(raw)?,
        None => local_midnight(now.with_timezone(&Local).date_naive())
            .ok_or_else(|| ApiError::BadRequest("startDate could not be resolved".into()))?,
    };

    TimeWindow::new(start, end)
        .ok_or_else(|| ApiError::BadRequest("startDate must not be after endDate".into()))
}

fn parse_param(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    parse_date(raw).ok_or_else(|| ApiError::BadRequest(format!("invalid date '{}'", raw.trim())))
}
