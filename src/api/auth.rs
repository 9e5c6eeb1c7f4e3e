use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::extract::Json;
use crate::error::Result;
use crate::middleware::{ClientInfo, CurrentAdmin};
use crate::models::{Admin, AuditAction, ResourceType};
use crate::services::{AdminService, AuditService, AuthService};
use crate::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh_token))
        .route("/auth/invites/accept", post(accept_invite))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(get_current_admin))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub admin: AdminInfo,
}

#[derive(Debug, Serialize)]
pub struct AdminInfo {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub status: String,
    pub avatar: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<Admin> for AdminInfo {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id.to_string(),
            role: admin.role().as_str().to_string(),
            email: admin.email,
            name: admin.name,
            status: admin.status,
            avatar: admin.avatar,
            last_login_at: admin.last_login_at,
        }
    }
}

async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    payload.validate()?;

    let auth_service = AuthService::new(state.db.clone(), state.config.clone());
    let (admin, tokens) = auth_service
        .authenticate(&payload.email, &payload.password)
        .await?;

    AuditService::new(state.db.clone())
        .record_for(
            admin.id,
            &client,
            AuditAction::Login,
            ResourceType::Session,
            admin.id,
            Some(serde_json::json!({ "login_time": Utc::now().to_rfc3339() })),
        )
        .await;

    Ok(Json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        admin: admin.into(),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

async fn logout(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    client: ClientInfo,
    payload: Option<Json<LogoutRequest>>,
) -> Result<Json<serde_json::Value>> {
    let auth_service = AuthService::new(state.db.clone(), state.config.clone());
    auth_service
        .revoke_token(&current_admin.token_id, current_admin.token_exp)
        .await?;

    let Json(payload) = payload.unwrap_or_default();
    if let Some(refresh_token) = payload.refresh_token {
        auth_service.revoke_refresh_token(&refresh_token).await?;
    }

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &client,
            AuditAction::Logout,
            ResourceType::Session,
            current_admin.id,
            None,
        )
        .await;

    Ok(Json(serde_json::json!({ "message": "Logged out successfully" })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: i64,
}

async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>> {
    payload.validate()?;

    let auth_service = AuthService::new(state.db.clone(), state.config.clone());
    let (access_token, expires_in) = auth_service.refresh(&payload.refresh_token).await?;

    Ok(Json(RefreshResponse {
        access_token,
        expires_in,
    }))
}

async fn get_current_admin(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
) -> Result<Json<AdminInfo>> {
    let admin = AdminService::new(state.db.clone())
        .get_admin(current_admin.id)
        .await?;

    Ok(Json(admin.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AcceptInviteRequest {
    #[validate(length(min = 1, message = "Invite token is required"))]
    pub token: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

async fn accept_invite(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(payload): Json<AcceptInviteRequest>,
) -> Result<(StatusCode, Json<AdminInfo>)> {
    payload.validate()?;

    let auth_service = AuthService::new(state.db.clone(), state.config.clone());
    let admin = auth_service
        .accept_invite(&payload.token, payload.name.trim(), &payload.password)
        .await?;

    AuditService::new(state.db.clone())
        .record_for(
            admin.id,
            &client,
            AuditAction::AcceptInvite,
            ResourceType::Admin,
            admin.id,
            None,
        )
        .await;

    Ok((StatusCode::CREATED, Json(admin.into())))
}
