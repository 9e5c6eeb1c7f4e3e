use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch},
    Extension, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::extract::{Json, Query};
use super::auth::AdminInfo;
use super::{parse_filter, parse_id};
use crate::error::{AppError, Result};
use crate::middleware::{AdminRole, ClientInfo, CurrentAdmin};
use crate::models::{AdminInvite, AdminStatus, AuditAction, Page, PageParams, ResourceType, UpdateAdmin};
use crate::services::{AdminService, AuditService, ListAdminsParams};
use crate::utils::non_blank;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_admins))
        .route("/:id", patch(update_admin))
        .route("/invites", get(list_invites).post(create_invite))
        .route("/invites/:id", delete(revoke_invite))
}

fn parse_role(value: &str) -> Result<AdminRole> {
    AdminRole::parse(value).ok_or_else(|| AppError::BadRequest(format!("Invalid role: {}", value)))
}

#[derive(Debug, Deserialize)]
pub struct ListAdminsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

async fn list_admins(
    State(state): State<AppState>,
    Query(query): Query<ListAdminsQuery>,
) -> Result<Json<Page<AdminInfo>>> {
    let params = ListAdminsParams {
        role: non_blank(query.role).as_deref().map(parse_role).transpose()?,
        status: parse_filter::<AdminStatus>(query.status, "status")?,
        search: non_blank(query.search),
    };

    let admins = AdminService::new(state.db.clone())
        .list_admins(params, PageParams::new(query.page, query.limit))
        .await?;

    Ok(Json(admins.map(AdminInfo::from)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAdminRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub role: Option<String>,
    pub status: Option<AdminStatus>,
}

async fn update_admin(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    client: ClientInfo,
    Path(id): Path<String>,
    Json(payload): Json<UpdateAdminRequest>,
) -> Result<Json<AdminInfo>> {
    payload.validate()?;
    let admin_id = parse_id(&id, "admin")?;

    let update = UpdateAdmin {
        name: non_blank(payload.name),
        role: payload.role.as_deref().map(parse_role).transpose()?,
        status: payload.status,
    };
    let details = serde_json::json!({
        "name": update.name,
        "role": update.role.map(|r| r.as_str()),
        "status": update.status.map(|s| s.as_str()),
    });

    let admin = AdminService::new(state.db.clone())
        .update_admin(current_admin.id, admin_id, update)
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &client,
            AuditAction::UpdateAdmin,
            ResourceType::Admin,
            admin_id,
            Some(details),
        )
        .await;

    Ok(Json(admin.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInviteRequest {
    #[validate(email)]
    pub email: String,
    pub role: String,
}

/// The token is only ever returned here, at creation time.
#[derive(Debug, Serialize)]
pub struct InviteCreatedResponse {
    #[serde(flatten)]
    pub invite: AdminInvite,
    pub token: String,
}

async fn create_invite(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    client: ClientInfo,
    Json(payload): Json<CreateInviteRequest>,
) -> Result<(StatusCode, Json<InviteCreatedResponse>)> {
    payload.validate()?;
    let role = parse_role(&payload.role)?;
    let email = payload.email.trim().to_lowercase();

    let invite = AdminService::new(state.db.clone())
        .create_invite(
            &email,
            role,
            current_admin.id,
            state.config.security.invite_expiry_hours,
        )
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &client,
            AuditAction::InviteAdmin,
            ResourceType::Invite,
            invite.id,
            Some(serde_json::json!({ "email": invite.email, "role": invite.role })),
        )
        .await;

    let token = invite.token.clone();
    Ok((StatusCode::CREATED, Json(InviteCreatedResponse { invite, token })))
}

#[derive(Debug, Serialize)]
pub struct InviteSummary {
    pub id: String,
    pub email: String,
    pub role: String,
    pub invited_by: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

async fn list_invites(
    State(state): State<AppState>,
    Query(query): Query<crate::models::PageQuery>,
) -> Result<Json<Page<InviteSummary>>> {
    let invites = AdminService::new(state.db.clone())
        .list_pending_invites(query.into())
        .await?;

    Ok(Json(invites.map(|i| InviteSummary {
        id: i.id.to_string(),
        email: i.email,
        role: i.role,
        invited_by: i.invited_by.to_string(),
        expires_at: i.expires_at,
        created_at: i.created_at,
    })))
}

async fn revoke_invite(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    client: ClientInfo,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let invite_id = parse_id(&id, "invite")?;

    AdminService::new(state.db.clone())
        .revoke_invite(invite_id)
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &client,
            AuditAction::RevokeInvite,
            ResourceType::Invite,
            invite_id,
            None,
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
