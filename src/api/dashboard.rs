use axum::{extract::State, routing::get, Router};
use serde::Deserialize;

use super::extract::{Json, Query};
use crate::error::Result;
use crate::services::{
    clamp_days, AuditService, ChartDataPoint, ChartSeries, DashboardService, DashboardStats,
    RecentActivity, RiskAlert,
};
use crate::AppState;

const DEFAULT_ACTIVITY_LIMIT: u32 = 20;
const MAX_ACTIVITY_LIMIT: u32 = 100;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/charts/users", get(get_user_chart))
        .route("/charts/reports", get(get_report_chart))
        .route("/activity", get(get_recent_activity))
        .route("/risks", get(get_risk_alerts))
}

async fn get_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>> {
    let stats = DashboardService::new(state.db.clone()).get_stats().await?;
    Ok(Json(stats))
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub days: Option<u32>,
}

async fn get_user_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<Vec<ChartDataPoint>>> {
    let data = DashboardService::new(state.db.clone())
        .get_daily_chart(ChartSeries::NewUsers, clamp_days(query.days))
        .await?;
    Ok(Json(data))
}

async fn get_report_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<Vec<ChartDataPoint>>> {
    let data = DashboardService::new(state.db.clone())
        .get_daily_chart(ChartSeries::Reports, clamp_days(query.days))
        .await?;
    Ok(Json(data))
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<u32>,
}

async fn get_recent_activity(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<RecentActivity>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, MAX_ACTIVITY_LIMIT);

    let activities = AuditService::new(state.db.clone())
        .list_recent(limit as i64)
        .await?;
    Ok(Json(activities))
}

async fn get_risk_alerts(State(state): State<AppState>) -> Result<Json<Vec<RiskAlert>>> {
    let alerts = DashboardService::new(state.db.clone())
        .get_risk_alerts()
        .await?;
    Ok(Json(alerts))
}
