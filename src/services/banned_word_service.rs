// Banned word service - moderation vocabulary management
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{
    normalize_word, BannedWord, CheckResult, CreateBannedWord, ListBannedWordsParams, Page,
    PageParams, Severity, UpdateBannedWord, WordFilter,
};
use crate::utils::contains_pattern;

pub struct BannedWordService {
    db: Database,
}

impl BannedWordService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, params: ListBannedWordsParams, page: PageParams) -> Result<Page<BannedWord>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM banned_words WHERE 1=1");
        push_filters(&mut query, &params);
        query
            .push(" ORDER BY severity DESC, word ASC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let words: Vec<BannedWord> = query.build_query_as().fetch_all(&self.db.pg).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM banned_words WHERE 1=1");
        push_filters(&mut count, &params);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db.pg).await?;

        Ok(Page::new(words, total, page))
    }

    pub async fn get(&self, word_id: Uuid) -> Result<BannedWord> {
        sqlx::query_as("SELECT * FROM banned_words WHERE id = $1")
            .bind(word_id)
            .fetch_optional(&self.db.pg)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Banned word {} not found", word_id)))
    }

    pub async fn create(&self, input: CreateBannedWord, admin_id: Uuid) -> Result<BannedWord> {
        let word = normalize_word(&input.word);
        if word.is_empty() {
            return Err(AppError::BadRequest("Word must not be blank".to_string()));
        }

        let created: BannedWord = sqlx::query_as(
            r#"
            INSERT INTO banned_words (word, severity, category, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&word)
        .bind(input.severity)
        .bind(input.category)
        .bind(admin_id)
        .fetch_one(&self.db.pg)
        .await
        .map_err(|e| duplicate_as_conflict(e, &word))?;

        tracing::info!(word_id = %created.id, severity = created.severity.as_str(), "Banned word added");

        Ok(created)
    }

    pub async fn update(&self, word_id: Uuid, update: UpdateBannedWord) -> Result<BannedWord> {
        let word = match update.word.as_deref().map(normalize_word) {
            Some(w) if w.is_empty() => {
                return Err(AppError::BadRequest("Word must not be blank".to_string()))
            }
            other => other,
        };

        let updated: BannedWord = sqlx::query_as(
            r#"
            UPDATE banned_words
            SET word = COALESCE($2, word),
                severity = COALESCE($3, severity),
                category = CASE WHEN $4 THEN $5 ELSE category END,
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(word_id)
        .bind(&word)
        .bind(update.severity)
        .bind(update.category.is_some())
        .bind(update.category.flatten())
        .bind(update.is_active)
        .fetch_optional(&self.db.pg)
        .await
        .map_err(|e| duplicate_as_conflict(e, word.as_deref().unwrap_or_default()))?
        .ok_or_else(|| AppError::NotFound(format!("Banned word {} not found", word_id)))?;

        Ok(updated)
    }

    pub async fn delete(&self, word_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM banned_words WHERE id = $1")
            .bind(word_id)
            .execute(&self.db.pg)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Banned word {} not found", word_id)));
        }

        Ok(())
    }

    /// Runs text against the active word list.
    pub async fn check(&self, text: &str) -> Result<CheckResult> {
        let words: Vec<(String, Severity)> =
            sqlx::query_as("SELECT word, severity FROM banned_words WHERE is_active = true")
                .fetch_all(&self.db.pg)
                .await?;

        Ok(WordFilter::new(words).check(text))
    }
}

fn duplicate_as_conflict(err: sqlx::Error, word: &str) -> AppError {
    match AppError::from(err) {
        AppError::Conflict(_) => AppError::Conflict(format!("\"{}\" is already banned", word)),
        other => other,
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, params: &ListBannedWordsParams) {
    if let Some(severity) = params.severity {
        query.push(" AND severity = ").push_bind(severity);
    }
    if let Some(is_active) = params.is_active {
        query.push(" AND is_active = ").push_bind(is_active);
    }
    if let Some(search) = &params.search {
        query
            .push(" AND word ILIKE ")
            .push_bind(contains_pattern(&normalize_word(search)))
            .push(" ESCAPE '!'");
    }
}
