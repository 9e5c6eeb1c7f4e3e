// Admin service - operator accounts and invitations
use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::middleware::AdminRole;
use crate::models::{Admin, AdminInvite, AdminStatus, Page, PageParams, UpdateAdmin};
use crate::utils::contains_pattern;

const INVITE_TOKEN_LEN: usize = 48;

pub struct AdminService {
    db: Database,
}

#[derive(Debug, Default)]
pub struct ListAdminsParams {
    pub role: Option<AdminRole>,
    pub status: Option<AdminStatus>,
    pub search: Option<String>,
}

pub fn generate_invite_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(INVITE_TOKEN_LEN)
        .map(char::from)
        .collect()
}

impl AdminService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list_admins(&self, params: ListAdminsParams, page: PageParams) -> Result<Page<Admin>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM admin_users WHERE 1=1");
        push_filters(&mut query, &params);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let admins: Vec<Admin> = query.build_query_as().fetch_all(&self.db.pg).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM admin_users WHERE 1=1");
        push_filters(&mut count, &params);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db.pg).await?;

        Ok(Page::new(admins, total, page))
    }

    pub async fn get_admin(&self, admin_id: Uuid) -> Result<Admin> {
        sqlx::query_as("SELECT * FROM admin_users WHERE id = $1")
            .bind(admin_id)
            .fetch_optional(&self.db.pg)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Admin {} not found", admin_id)))
    }

    pub async fn update_admin(
        &self,
        acting_admin_id: Uuid,
        admin_id: Uuid,
        update: UpdateAdmin,
    ) -> Result<Admin> {
        if acting_admin_id == admin_id {
            let demoting = update
                .role
                .map_or(false, |role| role != AdminRole::SuperAdmin);
            let disabling = update.status == Some(AdminStatus::Disabled);
            if demoting || disabling {
                return Err(AppError::BadRequest(
                    "You cannot demote or disable your own account".to_string(),
                ));
            }
        }

        let admin: Admin = sqlx::query_as(
            r#"
            UPDATE admin_users
            SET name = COALESCE($2, name),
                role = COALESCE($3, role),
                status = COALESCE($4, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(admin_id)
        .bind(update.name)
        .bind(update.role.map(|r| r.as_str()))
        .bind(update.status.map(|s| s.as_str()))
        .fetch_optional(&self.db.pg)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Admin {} not found", admin_id)))?;

        Ok(admin)
    }

    pub async fn create_invite(
        &self,
        email: &str,
        role: AdminRole,
        invited_by: Uuid,
        expiry_hours: i64,
    ) -> Result<AdminInvite> {
        let existing_admin: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM admin_users WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_one(&self.db.pg)
                .await?;
        if existing_admin > 0 {
            return Err(AppError::Conflict(format!("{} already has an account", email)));
        }

        let pending_invites: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM admin_invites
            WHERE LOWER(email) = LOWER($1) AND accepted_at IS NULL AND expires_at > NOW()
            "#,
        )
        .bind(email)
        .fetch_one(&self.db.pg)
        .await?;
        if pending_invites > 0 {
            return Err(AppError::Conflict(format!("{} already has a pending invite", email)));
        }

        let invite: AdminInvite = sqlx::query_as(
            r#"
            INSERT INTO admin_invites (email, role, token, invited_by, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(role.as_str())
        .bind(generate_invite_token())
        .bind(invited_by)
        .bind(Utc::now() + Duration::hours(expiry_hours))
        .fetch_one(&self.db.pg)
        .await?;

        tracing::info!(invite_id = %invite.id, role = role.as_str(), "Admin invite created");

        Ok(invite)
    }

    pub async fn list_pending_invites(&self, page: PageParams) -> Result<Page<AdminInvite>> {
        let invites: Vec<AdminInvite> = sqlx::query_as(
            r#"
            SELECT * FROM admin_invites
            WHERE accepted_at IS NULL AND expires_at > NOW()
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db.pg)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM admin_invites WHERE accepted_at IS NULL AND expires_at > NOW()",
        )
        .fetch_one(&self.db.pg)
        .await?;

        Ok(Page::new(invites, total, page))
    }

    pub async fn revoke_invite(&self, invite_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM admin_invites WHERE id = $1 AND accepted_at IS NULL")
            .bind(invite_id)
            .execute(&self.db.pg)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Invite {} not found", invite_id)));
        }

        Ok(())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, params: &ListAdminsParams) {
    if let Some(role) = params.role {
        query.push(" AND role = ").push_bind(role.as_str());
    }
    if let Some(status) = params.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(search) = &params.search {
        let pattern = contains_pattern(search);
        query
            .push(" AND (email ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '!' OR name ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '!')");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_token() {
        let a = generate_invite_token();
        let b = generate_invite_token();
        assert_eq!(a.len(), INVITE_TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_search_filter_sql() {
        let params = ListAdminsParams {
            role: Some(AdminRole::Moderator),
            search: Some("ops".into()),
            ..Default::default()
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM admin_users WHERE 1=1");
        push_filters(&mut query, &params);
        assert_eq!(
            query.sql(),
            "SELECT * FROM admin_users WHERE 1=1 AND role = $1 AND (email ILIKE $2 ESCAPE '!' OR name ILIKE $3 ESCAPE '!')"
        );
    }

    #[tokio::test]
    async fn test_cannot_demote_self() {
        let config = crate::config::Config::for_tests();
        let service = AdminService::new(Database::connect_lazy(&config).unwrap());
        let me = Uuid::new_v4();

        let result = service
            .update_admin(
                me,
                me,
                UpdateAdmin {
                    role: Some(AdminRole::Admin),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let result = service
            .update_admin(
                me,
                me,
                UpdateAdmin {
                    status: Some(AdminStatus::Disabled),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
