use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use validator::Validate;

use super::extract::{Json, Query};
use super::{parse_filter, parse_id};
use crate::error::Result;
use crate::middleware::{ClientInfo, CurrentAdmin};
use crate::models::{
    AuditAction, BannedWord, CheckResult, CreateBannedWord, ListBannedWordsParams, Page,
    PageParams, ResourceType, Severity, UpdateBannedWord,
};
use crate::services::{AuditService, BannedWordService};
use crate::utils::non_blank;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_words).post(create_word))
        .route("/check", post(check_text))
        .route("/:id", get(get_word).patch(update_word).delete(delete_word))
}

#[derive(Debug, Deserialize)]
pub struct ListBannedWordsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub severity: Option<String>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

async fn list_words(
    State(state): State<AppState>,
    Query(query): Query<ListBannedWordsQuery>,
) -> Result<Json<Page<BannedWord>>> {
    let params = ListBannedWordsParams {
        severity: parse_filter::<Severity>(query.severity, "severity")?,
        is_active: query.is_active,
        search: non_blank(query.search),
    };

    let words = BannedWordService::new(state.db.clone())
        .list(params, PageParams::new(query.page, query.limit))
        .await?;

    Ok(Json(words))
}

async fn get_word(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BannedWord>> {
    let word_id = parse_id(&id, "banned word")?;
    let word = BannedWordService::new(state.db.clone()).get(word_id).await?;
    Ok(Json(word))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBannedWordRequest {
    #[validate(length(min = 1, max = 100))]
    pub word: String,
    pub severity: Severity,
    #[validate(length(max = 50))]
    pub category: Option<String>,
}

async fn create_word(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    client: ClientInfo,
    Json(payload): Json<CreateBannedWordRequest>,
) -> Result<(StatusCode, Json<BannedWord>)> {
    current_admin.require(current_admin.role.can_manage_settings())?;
    payload.validate()?;

    let word = BannedWordService::new(state.db.clone())
        .create(
            CreateBannedWord {
                word: payload.word,
                severity: payload.severity,
                category: non_blank(payload.category),
            },
            current_admin.id,
        )
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &client,
            AuditAction::CreateBannedWord,
            ResourceType::BannedWord,
            word.id,
            Some(serde_json::json!({ "word": word.word, "severity": word.severity })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(word)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBannedWordRequest {
    #[validate(length(min = 1, max = 100))]
    pub word: Option<String>,
    pub severity: Option<Severity>,
    /// `null` or a blank string clears the category.
    #[validate(length(max = 50))]
    #[serde(default, deserialize_with = "super::double_option")]
    pub category: Option<Option<String>>,
    pub is_active: Option<bool>,
}

async fn update_word(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    client: ClientInfo,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBannedWordRequest>,
) -> Result<Json<BannedWord>> {
    current_admin.require(current_admin.role.can_manage_settings())?;
    payload.validate()?;
    let word_id = parse_id(&id, "banned word")?;

    let word = BannedWordService::new(state.db.clone())
        .update(
            word_id,
            UpdateBannedWord {
                word: payload.word,
                severity: payload.severity,
                category: payload.category.map(non_blank),
                is_active: payload.is_active,
            },
        )
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &client,
            AuditAction::UpdateBannedWord,
            ResourceType::BannedWord,
            word_id,
            Some(serde_json::json!({
                "word": word.word,
                "severity": word.severity,
                "is_active": word.is_active,
            })),
        )
        .await;

    Ok(Json(word))
}

async fn delete_word(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    client: ClientInfo,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    current_admin.require(current_admin.role.can_manage_settings())?;
    let word_id = parse_id(&id, "banned word")?;

    BannedWordService::new(state.db.clone()).delete(word_id).await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &client,
            AuditAction::DeleteBannedWord,
            ResourceType::BannedWord,
            word_id,
            None,
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckTextRequest {
    #[validate(length(min = 1, max = 10000))]
    pub text: String,
}

async fn check_text(
    State(state): State<AppState>,
    Json(payload): Json<CheckTextRequest>,
) -> Result<Json<CheckResult>> {
    payload.validate()?;
    let result = BannedWordService::new(state.db.clone())
        .check(&payload.text)
        .await?;
    Ok(Json(result))
}
