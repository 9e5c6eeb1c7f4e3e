use axum::{extract::State, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::extract::{Json, Query};
use super::parse_id;
use crate::error::{AppError, Result};
use crate::models::{AuditLog, Page, PageParams};
use crate::services::{AuditService, ListAuditLogsParams};
use crate::utils::non_blank;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_audit_logs))
}

#[derive(Debug, Deserialize)]
pub struct ListAuditLogsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub admin_id: Option<String>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

fn parse_timestamp(value: Option<String>, field: &str) -> Result<Option<DateTime<Utc>>> {
    non_blank(value)
        .map(|v| {
            DateTime::parse_from_rfc3339(&v)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| AppError::BadRequest(format!("{} must be an RFC 3339 timestamp", field)))
        })
        .transpose()
}

impl ListAuditLogsQuery {
    fn params(self) -> Result<(ListAuditLogsParams, PageParams)> {
        let params = ListAuditLogsParams {
            admin_id: non_blank(self.admin_id)
                .map(|v| parse_id(&v, "admin"))
                .transpose()?,
            action: non_blank(self.action),
            resource_type: non_blank(self.resource_type),
            resource_id: non_blank(self.resource_id),
            from: parse_timestamp(self.from, "from")?,
            to: parse_timestamp(self.to, "to")?,
        };

        if let (Some(from), Some(to)) = (params.from, params.to) {
            if from > to {
                return Err(AppError::BadRequest("from must not be after to".to_string()));
            }
        }

        Ok((params, PageParams::new(self.page, self.limit)))
    }
}

async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<ListAuditLogsQuery>,
) -> Result<Json<Page<AuditLog>>> {
    let (params, page) = query.params()?;

    let logs = AuditService::new(state.db.clone()).list(params, page).await?;

    Ok(Json(logs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> ListAuditLogsQuery {
        ListAuditLogsQuery {
            page: None,
            limit: None,
            admin_id: None,
            action: None,
            resource_type: None,
            resource_id: None,
            from: None,
            to: None,
        }
    }

    #[test]
    fn test_parse_time_range() {
        let (params, page) = ListAuditLogsQuery {
            from: Some("2024-01-01T00:00:00Z".into()),
            to: Some("2024-01-02T00:00:00+02:00".into()),
            action: Some(" ".into()),
            ..query()
        }
        .params()
        .unwrap();

        assert_eq!(params.from.unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(params.to.unwrap().to_rfc3339(), "2024-01-01T22:00:00+00:00");
        assert_eq!(params.action, None);
        assert_eq!(page, PageParams::new(None, None));
    }

    #[test]
    fn test_rejects_bad_input() {
        let bad_time = ListAuditLogsQuery {
            from: Some("yesterday".into()),
            ..query()
        };
        assert!(matches!(bad_time.params(), Err(AppError::BadRequest(_))));

        let inverted = ListAuditLogsQuery {
            from: Some("2024-02-01T00:00:00Z".into()),
            to: Some("2024-01-01T00:00:00Z".into()),
            ..query()
        };
        assert!(matches!(inverted.params(), Err(AppError::BadRequest(_))));

        let bad_admin = ListAuditLogsQuery {
            admin_id: Some("42".into()),
            ..query()
        };
        assert!(matches!(bad_admin.params(), Err(AppError::BadRequest(_))));
    }
}
