// User service - handles user queries and management operations
use chrono::{Duration, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{
    ListUsersParams, Page, PageParams, UpdateUser, UserBan, UserDetail, UserStatus, UserSummary,
    UserWarning, WarningSeverity,
};
use crate::utils::contains_pattern;

pub struct UserService {
    db: Database,
}

impl UserService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// List users with pagination and filters
    pub async fn list_users(&self, params: ListUsersParams, page: PageParams) -> Result<Page<UserSummary>> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT id, nickname, email, avatar, gender, status, is_verified, created_at, last_active_at
            FROM users
            WHERE 1=1
            "#,
        );
        push_filters(&mut query, &params);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let users: Vec<UserSummary> = query.build_query_as().fetch_all(&self.db.pg).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE 1=1");
        push_filters(&mut count, &params);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db.pg).await?;

        Ok(Page::new(users, total, page))
    }

    /// Get user details by ID
    pub async fn get_user(&self, user_id: Uuid) -> Result<UserDetail> {
        let user: UserDetail = sqlx::query_as(
            r#"
            SELECT id, nickname, email, phone, avatar, bio, gender, birth_date, status,
                   is_verified, created_at, updated_at, last_active_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db.pg)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        Ok(user)
    }

    pub async fn update_user(&self, user_id: Uuid, update: UpdateUser) -> Result<UserDetail> {
        if update.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }

        let user: UserDetail = sqlx::query_as(
            r#"
            UPDATE users
            SET nickname = COALESCE($2, nickname),
                bio = COALESCE($3, bio),
                status = COALESCE($4, status),
                is_verified = COALESCE($5, is_verified),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, nickname, email, phone, avatar, bio, gender, birth_date, status,
                      is_verified, created_at, updated_at, last_active_at
            "#,
        )
        .bind(user_id)
        .bind(update.nickname)
        .bind(update.bio)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.is_verified)
        .fetch_optional(&self.db.pg)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        Ok(user)
    }

    /// Soft delete: the row stays for reports and audit history.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(UserStatus::Deleted.as_str())
            .execute(&self.db.pg)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        Ok(())
    }

    /// Ban a user
    pub async fn ban_user(
        &self,
        user_id: Uuid,
        admin_id: Uuid,
        reason: &str,
        duration_days: Option<i32>,
    ) -> Result<UserBan> {
        let expires_at = duration_days.map(|days| Utc::now() + Duration::days(days as i64));

        let mut tx = self.db.pg.begin().await?;

        let updated = sqlx::query("UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(UserStatus::Banned.as_str())
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let ban: UserBan = sqlx::query_as(
            r#"
            INSERT INTO user_bans (user_id, admin_id, reason, duration_days, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(admin_id)
        .bind(reason)
        .bind(duration_days)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(user_id = %user_id, admin_id = %admin_id, ban_id = %ban.id, "User banned");

        Ok(ban)
    }

    /// Unban a user
    pub async fn unban_user(&self, user_id: Uuid, admin_id: Uuid) -> Result<u64> {
        let mut tx = self.db.pg.begin().await?;

        let lifted = sqlx::query(
            r#"
            UPDATE user_bans
            SET is_active = false, unbanned_at = NOW(), unbanned_by = $2
            WHERE user_id = $1 AND is_active = true
            "#,
        )
        .bind(user_id)
        .bind(admin_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let updated = sqlx::query(
            "UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 AND status = $3",
        )
        .bind(user_id)
        .bind(UserStatus::Active.as_str())
        .bind(UserStatus::Banned.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if lifted == 0 && updated == 0 {
            return Err(AppError::BadRequest(format!("User {} is not banned", user_id)));
        }

        tx.commit().await?;

        tracing::info!(user_id = %user_id, admin_id = %admin_id, lifted, "User unbanned");

        Ok(lifted)
    }

    /// Warn a user
    pub async fn warn_user(
        &self,
        user_id: Uuid,
        admin_id: Uuid,
        reason: &str,
        severity: WarningSeverity,
    ) -> Result<UserWarning> {
        // existence check gives a 404 instead of a foreign key error
        self.get_user(user_id).await?;

        let warning: UserWarning = sqlx::query_as(
            r#"
            INSERT INTO user_warnings (user_id, admin_id, reason, severity)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(admin_id)
        .bind(reason)
        .bind(severity.as_str())
        .fetch_one(&self.db.pg)
        .await?;

        Ok(warning)
    }

    /// Get user's ban history
    pub async fn get_user_bans(&self, user_id: Uuid) -> Result<Vec<UserBan>> {
        let bans: Vec<UserBan> =
            sqlx::query_as("SELECT * FROM user_bans WHERE user_id = $1 ORDER BY banned_at DESC")
                .bind(user_id)
                .fetch_all(&self.db.pg)
                .await?;

        Ok(bans)
    }

    /// Get user's warning history
    pub async fn get_user_warnings(&self, user_id: Uuid) -> Result<Vec<UserWarning>> {
        let warnings: Vec<UserWarning> = sqlx::query_as(
            "SELECT * FROM user_warnings WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db.pg)
        .await?;

        Ok(warnings)
    }

    pub async fn get_warning_count(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_warnings WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db.pg)
            .await?;

        Ok(count)
    }

    pub async fn get_reports_received(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE reported_user_id = $1")
                .bind(user_id)
                .fetch_one(&self.db.pg)
                .await?;

        Ok(count)
    }

    /// Check if user is currently banned
    pub async fn is_user_banned(&self, user_id: Uuid) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM user_bans
            WHERE user_id = $1
            AND is_active = true
            AND (expires_at IS NULL OR expires_at > NOW())
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db.pg)
        .await?;

        Ok(count > 0)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, params: &ListUsersParams) {
    if let Some(status) = params.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(gender) = &params.gender {
        query.push(" AND gender = ").push_bind(gender.clone());
    }
    if let Some(search) = &params.search {
        let pattern = contains_pattern(search);
        query
            .push(" AND (nickname ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '!' OR email ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '!')");
    }
}
