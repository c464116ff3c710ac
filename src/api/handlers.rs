use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::analytics::GUILD_NOT_FOUND;
use super::error::ApiError;
use super::AppState;
use crate::auth::{AccessToken, UserProfile};
use crate::discord::{permissions, snowflake, Guild, Member, Role};

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct UrlResponse {
    pub url: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub message: String,
}

/// Approximate member count, or `"N/A"` when the bot is not in the guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MemberCount {
    Known(u64),
    Unknown(&'static str),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSummary {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub has_bot: bool,
    pub member_count: MemberCount,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSummary {
    pub id: String,
    pub name: String,
    pub color: String,
    pub position: i64,
    pub member_count: usize,
    pub created_at: Option<DateTime<Utc>>,
    pub can_manage: bool,
}

/// Guilds the signed-in user may manage, annotated with bot presence
pub async fn list_servers(
    State(state): State<Arc<AppState>>,
    Extension(AccessToken(token)): Extension<AccessToken>,
) -> Result<Json<Vec<ServerSummary>>, ApiError> {
    const SERVERS_FAILED: &str = "Не удалось получить доступ к серверам";

    let (user_guilds, bot_guilds) = tokio::join!(
        state.oauth.current_user_guilds(&token),
        state.discord.bot_guilds(),
    );

    let user_guilds = user_guilds.map_err(|e| {
        tracing::error!(error = %e, "failed to fetch user guilds");
        ApiError::internal(SERVERS_FAILED)
    })?;
    let bot_guilds = bot_guilds.map_err(|e| {
        tracing::error!(error = %e, "failed to fetch bot guilds");
        ApiError::internal(SERVERS_FAILED)
    })?;

    let bot_counts: HashMap<String, Option<u64>> = bot_guilds
        .into_iter()
        .map(|g| (g.id, g.approximate_member_count))
        .collect();

    let servers = user_guilds
        .into_iter()
        .filter(permissions::can_manage)
        .map(|guild| {
            let bot_entry = bot_counts.get(&guild.id);
            ServerSummary {
                has_bot: bot_entry.is_some(),
                member_count: match bot_entry {
                    Some(Some(count)) => MemberCount::Known(*count),
                    _ => MemberCount::Unknown("N/A"),
                },
                id: guild.id,
                name: guild.name,
                icon: guild.icon,
            }
        })
        .collect();

    Ok(Json(servers))
}

pub async fn current_user(
    State(state): State<Arc<AppState>>,
    Extension(AccessToken(token)): Extension<AccessToken>,
) -> Result<Json<UserProfile>, ApiError> {
    state.oauth.current_user(&token).await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "failed to fetch user profile");
        ApiError::internal("Не удалось получить пользовательские данные")
    })
}

pub async fn bot_invite(State(state): State<Arc<AppState>>) -> Json<UrlResponse> {
    Json(UrlResponse {
        url: state.oauth.bot_invite_url(),
    })
}

/// Roles of a guild, highest first
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    Path(server_id): Path<String>,
) -> Result<Json<Vec<RoleSummary>>, ApiError> {
    const ROLES_FAILED: &str = "Не удалось получить роли";

    let guild = find_guild(&state, &server_id).await?;

    let (roles, members, bot_member) = tokio::try_join!(
        state.discord.list_roles(&guild.id),
        state.discord.fetch_all_members(&guild.id),
        state.discord.bot_member(&guild.id),
    )
    .map_err(|e| {
        tracing::error!(guild_id = %guild.id, error = %e, "failed to fetch roles");
        ApiError::internal_with(ROLES_FAILED, &e)
    })?;

    Ok(Json(summarize_roles(&guild, roles, &members, &bot_member)))
}

pub async fn delete_role(
    State(state): State<Arc<AppState>>,
    Path((server_id, role_id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let guild = find_guild(&state, &server_id).await?;

    match state.discord.delete_role(&guild.id, &role_id).await {
        Ok(true) => {
            tracing::info!(guild_id = %guild.id, role_id = %role_id, "role deleted");
            Ok(Json(SuccessResponse {
                success: true,
                message: Some("Роль успешно удалена!".to_string()),
            }))
        }
        Ok(false) => Err(ApiError::NotFound("Роль не найдена".to_string())),
        Err(e) => {
            tracing::error!(guild_id = %guild.id, role_id = %role_id, error = %e, "failed to delete role");
            Err(ApiError::internal_with("Не удалось удалить роль", &e))
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "OK".to_string(),
    })
}

async fn find_guild(state: &AppState, server_id: &str) -> Result<Guild, ApiError> {
    state
        .discord
        .get_guild(server_id)
        .await
        .map_err(|e| {
            tracing::error!(guild_id = %server_id, error = %e, "guild lookup failed");
            ApiError::internal_with("Не удалось получить сервер", &e)
        })?
        .ok_or_else(|| ApiError::NotFound(GUILD_NOT_FOUND.to_string()))
}

fn summarize_roles(
    guild: &Guild,
    roles: Vec<Role>,
    members: &[Member],
    bot_member: &Member,
) -> Vec<RoleSummary> {
    let bot_top_position = roles
        .iter()
        .filter(|role| bot_member.holds(role, &guild.id))
        .map(|role| role.position)
        .max()
        .unwrap_or(0);

    let mut summaries: Vec<RoleSummary> = roles
        .into_iter()
        .map(|role| RoleSummary {
            member_count: members.iter().filter(|m| m.holds(&role, &guild.id)).count(),
            created_at: snowflake::timestamp_of(&role.id),
            can_manage: role.id != guild.id && bot_top_position > role.position,
            color: role.hex_color(),
            position: role.position,
            id: role.id,
            name: role.name,
        })
        .collect();

    summaries.sort_by(|a, b| b.position.cmp(&a.position));
    summaries
}
