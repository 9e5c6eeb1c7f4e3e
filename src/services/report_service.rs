// Report service - review queue for user-submitted complaints
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{ListReportsParams, Page, PageParams, Report, ReportDetail, ReportStats, ReportStatus};

const DETAIL_SELECT: &str = r#"
    SELECT r.*,
           reporter.nickname AS reporter_nickname,
           reported.nickname AS reported_nickname,
           reviewer.name AS reviewer_name
    FROM reports r
    LEFT JOIN users reporter ON reporter.id = r.reporter_id
    LEFT JOIN users reported ON reported.id = r.reported_user_id
    LEFT JOIN admin_users reviewer ON reviewer.id = r.reviewed_by
"#;

pub struct ReportService {
    db: Database,
}

impl ReportService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list_reports(
        &self,
        params: ListReportsParams,
        page: PageParams,
    ) -> Result<Page<ReportDetail>> {
        let mut query = QueryBuilder::<Postgres>::new(DETAIL_SELECT);
        query.push(" WHERE 1=1");
        push_filters(&mut query, &params, "r.");
        // the pending queue is worked oldest first
        if params.status == Some(ReportStatus::Pending) {
            query.push(" ORDER BY r.created_at ASC");
        } else {
            query.push(" ORDER BY r.created_at DESC");
        }
        query
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let reports: Vec<ReportDetail> = query.build_query_as().fetch_all(&self.db.pg).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM reports WHERE 1=1");
        push_filters(&mut count, &params, "");
        let total: i64 = count.build_query_scalar().fetch_one(&self.db.pg).await?;

        Ok(Page::new(reports, total, page))
    }

    pub async fn get_report(&self, report_id: Uuid) -> Result<ReportDetail> {
        let mut query = QueryBuilder::<Postgres>::new(DETAIL_SELECT);
        query.push(" WHERE r.id = ").push_bind(report_id);

        query
            .build_query_as()
            .fetch_optional(&self.db.pg)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))
    }

    /// Review a pending report. The update only applies while the row is still
    /// pending, so concurrent reviews resolve to exactly one winner.
    pub async fn review_report(
        &self,
        report_id: Uuid,
        admin_id: Uuid,
        status: ReportStatus,
        resolution_note: Option<&str>,
    ) -> Result<Report> {
        if status == ReportStatus::Pending {
            return Err(AppError::BadRequest(
                "A report can only be moved to RESOLVED or REJECTED".to_string(),
            ));
        }

        let report: Option<Report> = sqlx::query_as(
            r#"
            UPDATE reports
            SET status = $2,
                resolution_note = $3,
                reviewed_by = $4,
                reviewed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = $5
            RETURNING *
            "#,
        )
        .bind(report_id)
        .bind(status)
        .bind(resolution_note)
        .bind(admin_id)
        .bind(ReportStatus::Pending)
        .fetch_optional(&self.db.pg)
        .await?;

        if let Some(report) = report {
            tracing::info!(
                report_id = %report_id,
                admin_id = %admin_id,
                status = status.as_str(),
                "Report reviewed"
            );
            return Ok(report);
        }

        let current: Option<ReportStatus> =
            sqlx::query_scalar("SELECT status FROM reports WHERE id = $1")
                .bind(report_id)
                .fetch_optional(&self.db.pg)
                .await?;

        match current {
            Some(current) => Err(transition_error(current, status)),
            None => Err(AppError::NotFound(format!("Report {} not found", report_id))),
        }
    }

    pub async fn get_stats(&self) -> Result<ReportStats> {
        let counts: Vec<(ReportStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM reports GROUP BY status")
                .fetch_all(&self.db.pg)
                .await?;

        Ok(ReportStats::from_counts(counts))
    }
}

fn transition_error(from: ReportStatus, to: ReportStatus) -> AppError {
    debug_assert!(!from.can_transition_to(to));
    AppError::Conflict(format!(
        "Report is already {}, cannot move to {}",
        from.as_str(),
        to.as_str()
    ))
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, params: &ListReportsParams, prefix: &str) {
    if let Some(status) = params.status {
        query.push(format!(" AND {}status = ", prefix)).push_bind(status);
    }
    if let Some(reason) = &params.reason {
        query.push(format!(" AND {}reason = ", prefix)).push_bind(reason.clone());
    }
    if let Some(reporter_id) = params.reporter_id {
        query.push(format!(" AND {}reporter_id = ", prefix)).push_bind(reporter_id);
    }
    if let Some(reported_user_id) = params.reported_user_id {
        query
            .push(format!(" AND {}reported_user_id = ", prefix))
            .push_bind(reported_user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_with_prefix() {
        let params = ListReportsParams {
            status: Some(ReportStatus::Pending),
            reported_user_id: Some(Uuid::nil()),
            ..Default::default()
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT 1 FROM reports r WHERE 1=1");
        push_filters(&mut query, &params, "r.");
        assert_eq!(
            query.sql(),
            "SELECT 1 FROM reports r WHERE 1=1 AND r.status = $1 AND r.reported_user_id = $2"
        );
    }

    #[test]
    fn test_transition_error_is_conflict() {
        let err = transition_error(ReportStatus::Resolved, ReportStatus::Rejected);
        assert!(matches!(err, AppError::Conflict(msg) if msg.contains("RESOLVED")));
    }

    #[tokio::test]
    async fn test_moving_back_to_pending_rejected() {
        let config = crate::config::Config::for_tests();
        let service = ReportService::new(Database::connect_lazy(&config).unwrap());

        let result = service
            .review_report(Uuid::new_v4(), Uuid::new_v4(), ReportStatus::Pending, None)
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
