use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::Database;
use crate::error::Result;
use crate::middleware::{ClientInfo, CurrentAdmin};
use crate::models::{AuditAction, AuditLog, CreateAuditLog, Page, PageParams, ResourceType};

pub struct AuditService {
    db: Database,
}

#[derive(Debug, Default)]
pub struct ListAuditLogsParams {
    pub admin_id: Option<Uuid>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow, Serialize)]
pub struct RecentActivity {
    pub id: Uuid,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub admin_name: String,
    pub admin_email: String,
}

impl AuditService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn log(&self, entry: CreateAuditLog) -> Result<AuditLog> {
        let log: AuditLog = sqlx::query_as(
            r#"
            INSERT INTO audit_logs (id, admin_id, action, resource_type, resource_id, details, ip_address, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.admin_id)
        .bind(entry.action.as_str())
        .bind(entry.resource_type.as_str())
        .bind(entry.resource_id)
        .bind(entry.details)
        .bind(entry.ip_address)
        .bind(entry.user_agent)
        .fetch_one(&self.db.pg)
        .await?;

        Ok(log)
    }

    /// Writes an audit entry for an admin action. Failures are logged, never
    /// propagated: the action itself already happened.
    pub async fn record(
        &self,
        admin: &CurrentAdmin,
        client: &ClientInfo,
        action: AuditAction,
        resource_type: ResourceType,
        resource_id: impl ToString,
        details: Option<serde_json::Value>,
    ) {
        self.record_for(admin.id, client, action, resource_type, resource_id, details)
            .await
    }

    pub async fn record_for(
        &self,
        admin_id: Uuid,
        client: &ClientInfo,
        action: AuditAction,
        resource_type: ResourceType,
        resource_id: impl ToString,
        details: Option<serde_json::Value>,
    ) {
        let entry = CreateAuditLog {
            admin_id,
            action,
            resource_type,
            resource_id: Some(resource_id.to_string()),
            details,
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        };

        if let Err(e) = self.log(entry).await {
            tracing::warn!(
                admin_id = %admin_id,
                action = action.as_str(),
                "Failed to write audit log: {}",
                e
            );
        }
    }

    pub async fn list(
        &self,
        params: ListAuditLogsParams,
        page: PageParams,
    ) -> Result<Page<AuditLog>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM audit_logs WHERE 1=1");
        push_filters(&mut query, &params);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let logs: Vec<AuditLog> = query.build_query_as().fetch_all(&self.db.pg).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM audit_logs WHERE 1=1");
        push_filters(&mut count, &params);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db.pg).await?;

        Ok(Page::new(logs, total, page))
    }

    /// Recent audit entries with the acting admin's name, for the activity feed.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<RecentActivity>> {
        let activities: Vec<RecentActivity> = sqlx::query_as(
            r#"
            SELECT
                al.id,
                al.action,
                al.resource_type,
                al.resource_id,
                al.created_at,
                a.name as admin_name,
                a.email as admin_email
            FROM audit_logs al
            JOIN admin_users a ON al.admin_id = a.id
            ORDER BY al.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db.pg)
        .await?;

        Ok(activities)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, params: &ListAuditLogsParams) {
    if let Some(admin_id) = params.admin_id {
        query.push(" AND admin_id = ").push_bind(admin_id);
    }
    if let Some(action) = &params.action {
        query.push(" AND action = ").push_bind(action.clone());
    }
    if let Some(resource_type) = &params.resource_type {
        query.push(" AND resource_type = ").push_bind(resource_type.clone());
    }
    if let Some(resource_id) = &params.resource_id {
        query.push(" AND resource_id = ").push_bind(resource_id.clone());
    }
    if let Some(from) = params.from {
        query.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = params.to {
        query.push(" AND created_at < ").push_bind(to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_are_bound_not_inlined() {
        let params = ListAuditLogsParams {
            action: Some("ban_user'; DROP TABLE audit_logs; --".into()),
            resource_type: Some("user".into()),
            ..Default::default()
        };

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM audit_logs WHERE 1=1");
        push_filters(&mut query, &params);
        let sql = query.sql();

        assert_eq!(
            sql,
            "SELECT * FROM audit_logs WHERE 1=1 AND action = $1 AND resource_type = $2"
        );
        assert!(!sql.contains("DROP"));
    }
}
