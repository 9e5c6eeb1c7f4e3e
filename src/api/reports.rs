use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use validator::Validate;

use super::extract::{Json, Query};
use super::{parse_filter, parse_id};
use crate::error::{AppError, Result};
use crate::middleware::{ClientInfo, CurrentAdmin};
use crate::models::{
    AuditAction, ListReportsParams, Page, PageParams, Report, ReportDetail, ReportStats,
    ReportStatus, ResourceType,
};
use crate::services::{AuditService, ReportService};
use crate::utils::non_blank;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reports))
        .route("/stats", get(get_stats))
        .route("/:id", get(get_report).patch(review_report))
}

#[derive(Debug, Deserialize)]
pub struct ListReportsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub reason: Option<String>,
    pub reporter_id: Option<String>,
    pub reported_user_id: Option<String>,
}

impl ListReportsQuery {
    fn params(self) -> Result<(ListReportsParams, PageParams)> {
        let parse_user = |value: Option<String>, what: &str| {
            non_blank(value).map(|v| parse_id(&v, what)).transpose()
        };

        let params = ListReportsParams {
            status: parse_filter::<ReportStatus>(self.status, "status")?,
            reason: non_blank(self.reason),
            reporter_id: parse_user(self.reporter_id, "reporter")?,
            reported_user_id: parse_user(self.reported_user_id, "reported user")?,
        };

        Ok((params, PageParams::new(self.page, self.limit)))
    }
}

async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ListReportsQuery>,
) -> Result<Json<Page<ReportDetail>>> {
    let (params, page) = query.params()?;

    let reports = ReportService::new(state.db.clone())
        .list_reports(params, page)
        .await?;

    Ok(Json(reports))
}

async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReportDetail>> {
    let report_id = parse_id(&id, "report")?;

    let report = ReportService::new(state.db.clone())
        .get_report(report_id)
        .await?;

    Ok(Json(report))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewReportRequest {
    pub status: ReportStatus,
    #[validate(length(max = 2000))]
    pub resolution_note: Option<String>,
}

async fn review_report(
    State(state): State<AppState>,
    Extension(current_admin): Extension<CurrentAdmin>,
    client: ClientInfo,
    Path(id): Path<String>,
    Json(payload): Json<ReviewReportRequest>,
) -> Result<Json<Report>> {
    current_admin.require(current_admin.role.can_moderate_content())?;
    payload.validate()?;
    let report_id = parse_id(&id, "report")?;

    let action = match payload.status {
        ReportStatus::Resolved => AuditAction::ResolveReport,
        ReportStatus::Rejected => AuditAction::RejectReport,
        ReportStatus::Pending => {
            return Err(AppError::BadRequest(
                "A report can only be moved to RESOLVED or REJECTED".to_string(),
            ))
        }
    };

    let note = non_blank(payload.resolution_note);
    let report = ReportService::new(state.db.clone())
        .review_report(report_id, current_admin.id, payload.status, note.as_deref())
        .await?;

    AuditService::new(state.db.clone())
        .record(
            &current_admin,
            &client,
            action,
            ResourceType::Report,
            report_id,
            Some(serde_json::json!({
                "status": report.status,
                "resolution_note": report.resolution_note,
                "reported_user_id": report.reported_user_id,
            })),
        )
        .await;

    Ok(Json(report))
}

async fn get_stats(State(state): State<AppState>) -> Result<Json<ReportStats>> {
    let stats = ReportService::new(state.db.clone()).get_stats().await?;
    Ok(Json(stats))
}
