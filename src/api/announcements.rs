use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use super::extract::{Json, Query};
use super::parse_id;
use crate::error::Result;
use crate::middleware::{ClientInfo, CurrentAdmin};
use crate::models::{
    Announcement, AuditAction, CreateAnnouncement, ListAnnouncementsParams, Page, PageParams,
    ResourceType, UpdateAnnouncement,
};
use crate::services::{AnnouncementService, AuditService};
use crate::utils::non_blank;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_announcements).post(create_announcement))
        .route("/live", get(list_live))
        .route(
            "/:id",
            get(get_announcement)
                .patch(update_announcement)
                .delete(delete_announcement),
        )
}

#[derive(Debug, Deserialize)]
pub struct ListAnnouncementsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

async fn list_announcements(
    State(state): State<AppState>,
    Query(query): Query<ListAnnouncementsQuery>,
) -> Result<Json<Page<Announcement>>> {
    let params = ListAnnouncementsParams {
        is_active: query.is_active,
        search: non_blank(query.search),
    };

    let announcements = AnnouncementService::new(state.db.clone())
        .list(params, PageParams::new(query.page, query.limit))
        .await?;

    Ok(Json(announcements))
}

async fn list_live(State(state): State<AppState>) -> Result<Json<Vec<Announcement>>> {
    let live = AnnouncementService::new(state.db.clone()).list_live().await?;
    Ok(Json(live))
}

async fn get_announcement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Announcement>> {
    let announcement_id = parse_id(&id, "announcement")?;
    let announcement = AnnouncementService::new(state.db.clone())
        .get(announcement_id)
        .await?;
    Ok(Json(announcement))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAnnouncementRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    #[validate(range(min = -1000, max = 1000))]
    pub priority: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

async fn create_announcement(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    client: ClientInfo,
    Json(payload): Json<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<Announcement>)> {
    current_admin.require(current_admin.role.can_manage_settings())?;
    payload.validate()?;

    let announcement = AnnouncementService::new(state.db.clone())
        .create(
            CreateAnnouncement {
                title: payload.title.trim().to_string(),
                content: payload.content,
                is_active: payload.is_active,
                priority: payload.priority,
                starts_at: payload.starts_at,
                ends_at: payload.ends_at,
            },
            current_admin.id,
        )
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &client,
            AuditAction::CreateAnnouncement,
            ResourceType::Announcement,
            announcement.id,
            Some(serde_json::json!({
                "title": announcement.title,
                "is_active": announcement.is_active,
            })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(announcement)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAnnouncementRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 10000))]
    pub content: Option<String>,
    pub is_active: Option<bool>,
    #[validate(range(min = -1000, max = 1000))]
    pub priority: Option<i32>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub starts_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub ends_at: Option<Option<DateTime<Utc>>>,
}

async fn update_announcement(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    client: ClientInfo,
    Path(id): Path<String>,
    Json(payload): Json<UpdateAnnouncementRequest>,
) -> Result<Json<Announcement>> {
    current_admin.require(current_admin.role.can_manage_settings())?;
    payload.validate()?;
    let announcement_id = parse_id(&id, "announcement")?;

    let announcement = AnnouncementService::new(state.db.clone())
        .update(
            announcement_id,
            UpdateAnnouncement {
                title: payload.title.map(|t| t.trim().to_string()),
                content: payload.content,
                is_active: payload.is_active,
                priority: payload.priority,
                starts_at: payload.starts_at,
                ends_at: payload.ends_at,
            },
        )
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &client,
            AuditAction::UpdateAnnouncement,
            ResourceType::Announcement,
            announcement_id,
            Some(serde_json::json!({
                "title": announcement.title,
                "is_active": announcement.is_active,
                "starts_at": announcement.starts_at,
                "ends_at": announcement.ends_at,
            })),
        )
        .await;

    Ok(Json(announcement))
}

async fn delete_announcement(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    client: ClientInfo,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    current_admin.require(current_admin.role.can_manage_settings())?;
    let announcement_id = parse_id(&id, "announcement")?;

    AnnouncementService::new(state.db.clone())
        .delete(announcement_id)
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &client,
            AuditAction::DeleteAnnouncement,
            ResourceType::Announcement,
            announcement_id,
            None,
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
