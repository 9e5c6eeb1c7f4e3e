// Announcement service - notices published to the main app
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{
    validate_schedule, Announcement, CreateAnnouncement, ListAnnouncementsParams, Page,
    PageParams, UpdateAnnouncement,
};
use crate::utils::contains_pattern;

const LIVE_CONDITION: &str = "is_active = true \
    AND (starts_at IS NULL OR starts_at <= NOW()) \
    AND (ends_at IS NULL OR ends_at > NOW())";

pub struct AnnouncementService {
    db: Database,
}

impl AnnouncementService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        params: ListAnnouncementsParams,
        page: PageParams,
    ) -> Result<Page<Announcement>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM announcements WHERE 1=1");
        push_filters(&mut query, &params);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items: Vec<Announcement> = query.build_query_as().fetch_all(&self.db.pg).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM announcements WHERE 1=1");
        push_filters(&mut count, &params);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db.pg).await?;

        Ok(Page::new(items, total, page))
    }

    /// Announcements visible to app users right now.
    pub async fn list_live(&self) -> Result<Vec<Announcement>> {
        let items: Vec<Announcement> = sqlx::query_as(&format!(
            "SELECT * FROM announcements WHERE {} ORDER BY priority DESC, created_at DESC",
            LIVE_CONDITION
        ))
        .fetch_all(&self.db.pg)
        .await?;

        Ok(items)
    }

    pub async fn count_live(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM announcements WHERE {}",
            LIVE_CONDITION
        ))
        .fetch_one(&self.db.pg)
        .await?;

        Ok(count)
    }

    pub async fn get(&self, announcement_id: Uuid) -> Result<Announcement> {
        sqlx::query_as("SELECT * FROM announcements WHERE id = $1")
            .bind(announcement_id)
            .fetch_optional(&self.db.pg)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Announcement {} not found", announcement_id))
            })
    }

    pub async fn create(&self, input: CreateAnnouncement, admin_id: Uuid) -> Result<Announcement> {
        validate_schedule(input.starts_at, input.ends_at).map_err(invalid_schedule)?;

        let announcement: Announcement = sqlx::query_as(
            r#"
            INSERT INTO announcements (title, content, is_active, priority, starts_at, ends_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(input.title)
        .bind(input.content)
        .bind(input.is_active)
        .bind(input.priority)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(admin_id)
        .fetch_one(&self.db.pg)
        .await?;

        tracing::info!(announcement_id = %announcement.id, "Announcement created");

        Ok(announcement)
    }

    /// Merges the update into the stored row and validates the resulting schedule.
    pub async fn update(&self, announcement_id: Uuid, update: UpdateAnnouncement) -> Result<Announcement> {
        let mut tx = self.db.pg.begin().await?;

        let current: Announcement =
            sqlx::query_as("SELECT * FROM announcements WHERE id = $1 FOR UPDATE")
                .bind(announcement_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Announcement {} not found", announcement_id))
                })?;

        let merged = update.apply(&current);
        validate_schedule(merged.starts_at, merged.ends_at).map_err(invalid_schedule)?;

        let announcement: Announcement = sqlx::query_as(
            r#"
            UPDATE announcements
            SET title = $2, content = $3, is_active = $4, priority = $5,
                starts_at = $6, ends_at = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(announcement_id)
        .bind(merged.title)
        .bind(merged.content)
        .bind(merged.is_active)
        .bind(merged.priority)
        .bind(merged.starts_at)
        .bind(merged.ends_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(announcement)
    }

    pub async fn delete(&self, announcement_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(announcement_id)
            .execute(&self.db.pg)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Announcement {} not found",
                announcement_id
            )));
        }

        Ok(())
    }
}

fn invalid_schedule(message: String) -> AppError {
    let mut error = ValidationError::new("schedule");
    error.message = Some(message.into());

    let mut errors = ValidationErrors::new();
    errors.add("ends_at", error);
    AppError::Validation(errors)
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, params: &ListAnnouncementsParams) {
    if let Some(is_active) = params.is_active {
        query.push(" AND is_active = ").push_bind(is_active);
    }
    if let Some(search) = &params.search {
        query
            .push(" AND title ILIKE ")
            .push_bind(contains_pattern(search))
            .push(" ESCAPE '!'");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_inverted_schedule_rejected_before_query() {
        let config = crate::config::Config::for_tests();
        let service = AnnouncementService::new(Database::connect_lazy(&config).unwrap());
        let now = Utc::now();

        let result = service
            .create(
                CreateAnnouncement {
                    title: "Maintenance".into(),
                    content: "Down for an hour".into(),
                    is_active: true,
                    priority: 0,
                    starts_at: Some(now),
                    ends_at: Some(now - Duration::hours(1)),
                },
                Uuid::new_v4(),
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_filters() {
        let params = ListAnnouncementsParams {
            is_active: Some(false),
            search: Some("promo".into()),
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM announcements WHERE 1=1");
        push_filters(&mut query, &params);
        assert_eq!(
            query.sql(),
            "SELECT * FROM announcements WHERE 1=1 AND is_active = $1 AND title ILIKE $2 ESCAPE '!'"
        );
    }
}
