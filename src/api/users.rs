use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::extract::{Json, Query};
use super::{parse_filter, parse_id};
use crate::error::Result;
use crate::middleware::{ClientInfo, CurrentAdmin};
use crate::models::{
    AuditAction, ListUsersParams, Page, PageParams, ResourceType, UpdateUser, UserBan, UserDetail,
    UserStatus, UserSummary, UserWarning, WarningSeverity,
};
use crate::services::{AuditService, UserService};
use crate::utils::non_blank;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/:id", get(get_user).patch(update_user).delete(delete_user))
        .route("/:id/ban", post(ban_user))
        .route("/:id/unban", post(unban_user))
        .route("/:id/warn", post(warn_user))
        .route("/:id/history", get(get_user_history))
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub gender: Option<String>,
    pub search: Option<String>,
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Page<UserSummary>>> {
    let params = ListUsersParams {
        status: parse_filter::<UserStatus>(query.status, "status")?,
        gender: non_blank(query.gender),
        search: non_blank(query.search),
    };

    let users = UserService::new(state.db.clone())
        .list_users(params, PageParams::new(query.page, query.limit))
        .await?;

    Ok(Json(users))
}

#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    #[serde(flatten)]
    pub user: UserDetail,
    pub is_banned: bool,
    pub warnings_count: i64,
    pub reports_received: i64,
}

async fn get_user(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    client: ClientInfo,
    Path(id): Path<String>,
) -> Result<Json<UserDetailResponse>> {
    let user_id = parse_id(&id, "user")?;

    let user_service = UserService::new(state.db.clone());
    let user = user_service.get_user(user_id).await?;
    let is_banned = user_service.is_user_banned(user_id).await?;
    let warnings_count = user_service.get_warning_count(user_id).await?;
    let reports_received = user_service.get_reports_received(user_id).await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &client,
            AuditAction::ViewUser,
            ResourceType::User,
            user_id,
            None,
        )
        .await;

    Ok(Json(UserDetailResponse {
        user,
        is_banned,
        warnings_count,
        reports_received,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub nickname: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    pub status: Option<UserStatus>,
    pub is_verified: Option<bool>,
}

async fn update_user(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    client: ClientInfo,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserDetail>> {
    current_admin.require(current_admin.role.can_ban_users())?;
    payload.validate()?;
    let user_id = parse_id(&id, "user")?;

    let details = serde_json::json!({
        "nickname": payload.nickname,
        "status": payload.status.map(|s| s.as_str()),
        "is_verified": payload.is_verified,
    });

    let user = UserService::new(state.db.clone())
        .update_user(
            user_id,
            UpdateUser {
                nickname: non_blank(payload.nickname),
                bio: payload.bio,
                status: payload.status,
                is_verified: payload.is_verified,
            },
        )
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &client,
            AuditAction::UpdateUser,
            ResourceType::User,
            user_id,
            Some(details),
        )
        .await;

    Ok(Json(user))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    client: ClientInfo,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    current_admin.require(current_admin.role.can_ban_users())?;
    let user_id = parse_id(&id, "user")?;

    UserService::new(state.db.clone()).delete_user(user_id).await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &client,
            AuditAction::DeleteUser,
            ResourceType::User,
            user_id,
            None,
        )
        .await;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("User {} has been deleted", user_id),
    })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct BanRequest {
    #[validate(length(min = 1, max = 1000, message = "Reason is required"))]
    pub reason: String,
    #[validate(range(min = 1, max = 3650))]
    pub duration_days: Option<i32>,
}

async fn ban_user(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    client: ClientInfo,
    Path(id): Path<String>,
    Json(payload): Json<BanRequest>,
) -> Result<Json<UserBan>> {
    current_admin.require(current_admin.role.can_ban_users())?;
    payload.validate()?;
    let user_id = parse_id(&id, "user")?;

    let ban = UserService::new(state.db.clone())
        .ban_user(user_id, current_admin.id, payload.reason.trim(), payload.duration_days)
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &client,
            AuditAction::BanUser,
            ResourceType::User,
            user_id,
            Some(serde_json::json!({
                "reason": ban.reason,
                "duration_days": ban.duration_days,
                "ban_id": ban.id,
                "expires_at": ban.expires_at,
            })),
        )
        .await;

    Ok(Json(ban))
}

async fn unban_user(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    client: ClientInfo,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    current_admin.require(current_admin.role.can_ban_users())?;
    let user_id = parse_id(&id, "user")?;

    let lifted = UserService::new(state.db.clone())
        .unban_user(user_id, current_admin.id)
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &client,
            AuditAction::UnbanUser,
            ResourceType::User,
            user_id,
            Some(serde_json::json!({ "bans_lifted": lifted })),
        )
        .await;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("User {} has been unbanned", user_id),
        "bans_lifted": lifted,
    })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct WarnRequest {
    #[validate(length(min = 1, max = 1000, message = "Reason is required"))]
    pub reason: String,
    #[serde(default)]
    pub severity: WarningSeverity,
}

async fn warn_user(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    client: ClientInfo,
    Path(id): Path<String>,
    Json(payload): Json<WarnRequest>,
) -> Result<Json<UserWarning>> {
    current_admin.require(current_admin.role.can_moderate_content())?;
    payload.validate()?;
    let user_id = parse_id(&id, "user")?;

    let warning = UserService::new(state.db.clone())
        .warn_user(user_id, current_admin.id, payload.reason.trim(), payload.severity)
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &client,
            AuditAction::WarnUser,
            ResourceType::User,
            user_id,
            Some(serde_json::json!({
                "reason": warning.reason,
                "severity": warning.severity,
                "warning_id": warning.id,
            })),
        )
        .await;

    Ok(Json(warning))
}

#[derive(Debug, Serialize)]
pub struct UserHistoryResponse {
    pub bans: Vec<UserBan>,
    pub warnings: Vec<UserWarning>,
}

async fn get_user_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserHistoryResponse>> {
    let user_id = parse_id(&id, "user")?;

    let user_service = UserService::new(state.db.clone());
    // 404 for unknown users rather than an empty history
    user_service.get_user(user_id).await?;

    Ok(Json(UserHistoryResponse {
        bans: user_service.get_user_bans(user_id).await?,
        warnings: user_service.get_user_warnings(user_id).await?,
    }))
}
