// Dashboard service - provides statistics and chart data
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use sqlx::Postgres;

use crate::db::Database;
use crate::error::Result;
use crate::models::ReportStatus;
use crate::services::AnnouncementService;

pub const DEFAULT_CHART_DAYS: u32 = 7;
pub const MAX_CHART_DAYS: u32 = 90;

const REPEAT_WARNING_THRESHOLD: i64 = 3;
const BAN_SURGE_THRESHOLD: i64 = 5;
const PENDING_BACKLOG_THRESHOLD: i64 = 20;
const REPORTED_USER_THRESHOLD: i64 = 5;

pub struct DashboardService {
    db: Database,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub active_users_today: i64,
    pub new_users_today: i64,
    pub banned_users: i64,
    pub pending_reports: i64,
    pub reports_today: i64,
    pub active_banned_words: i64,
    pub live_announcements: i64,
    pub admin_actions_today: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartDataPoint {
    pub date: String,
    pub value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Medium,
    High,
}

#[derive(Debug, Serialize)]
pub struct RiskAlert {
    pub kind: &'static str,
    pub level: RiskLevel,
    pub title: String,
    pub description: String,
    pub count: i64,
    pub created_at: DateTime<Utc>,
}

/// Which table a daily chart counts rows from.
#[derive(Debug, Clone, Copy)]
pub enum ChartSeries {
    NewUsers,
    Reports,
}

impl ChartSeries {
    fn table(&self) -> &'static str {
        match self {
            ChartSeries::NewUsers => "users",
            ChartSeries::Reports => "reports",
        }
    }
}

pub fn clamp_days(days: Option<u32>) -> u32 {
    days.unwrap_or(DEFAULT_CHART_DAYS).clamp(1, MAX_CHART_DAYS)
}

/// Lays daily counts onto a contiguous, zero-filled range ending at `today`.
pub fn fill_daily_series(today: NaiveDate, days: u32, counts: &[(NaiveDate, i64)]) -> Vec<ChartDataPoint> {
    (0..days as i64)
        .rev()
        .map(|offset| {
            let date = today - chrono::Duration::days(offset);
            let value = counts
                .iter()
                .find(|(d, _)| *d == date)
                .map(|(_, v)| *v)
                .unwrap_or(0);
            ChartDataPoint {
                date: date.format("%Y-%m-%d").to_string(),
                value,
            }
        })
        .collect()
}

impl DashboardService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn count(&self, sql: &str, since: Option<DateTime<Utc>>) -> Result<i64> {
        let mut query = sqlx::query_scalar::<Postgres, i64>(sql);
        if let Some(since) = since {
            query = query.bind(since);
        }
        Ok(query.fetch_one(&self.db.pg).await?)
    }

    pub async fn get_stats(&self) -> Result<DashboardStats> {
        let today_start = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();

        let total_users = self
            .count("SELECT COUNT(*) FROM users WHERE status <> 'deleted'", None)
            .await?;
        let active_users_today = self
            .count("SELECT COUNT(*) FROM users WHERE last_active_at >= $1", Some(today_start))
            .await?;
        let new_users_today = self
            .count("SELECT COUNT(*) FROM users WHERE created_at >= $1", Some(today_start))
            .await?;
        let banned_users = self
            .count(
                r#"
                SELECT COUNT(DISTINCT user_id) FROM user_bans
                WHERE is_active = true
                AND (expires_at IS NULL OR expires_at > NOW())
                "#,
                None,
            )
            .await?;

        let pending_reports: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE status = $1")
            .bind(ReportStatus::Pending)
            .fetch_one(&self.db.pg)
            .await?;

        let reports_today = self
            .count("SELECT COUNT(*) FROM reports WHERE created_at >= $1", Some(today_start))
            .await?;
        let active_banned_words = self
            .count("SELECT COUNT(*) FROM banned_words WHERE is_active = true", None)
            .await?;
        let live_announcements = AnnouncementService::new(self.db.clone())
            .count_live()
            .await?;
        let admin_actions_today = self
            .count("SELECT COUNT(*) FROM audit_logs WHERE created_at >= $1", Some(today_start))
            .await?;

        Ok(DashboardStats {
            total_users,
            active_users_today,
            new_users_today,
            banned_users,
            pending_reports,
            reports_today,
            active_banned_words,
            live_announcements,
            admin_actions_today,
        })
    }

    /// Daily row counts for the last `days` days, oldest first.
    pub async fn get_daily_chart(&self, series: ChartSeries, days: u32) -> Result<Vec<ChartDataPoint>> {
        let today = Utc::now().date_naive();
        let start = (today - chrono::Duration::days(days as i64 - 1))
            .and_time(NaiveTime::MIN)
            .and_utc();

        let counts: Vec<(NaiveDate, i64)> = sqlx::query_as(&format!(
            r#"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS day, COUNT(*)
            FROM {}
            WHERE created_at >= $1
            GROUP BY day
            "#,
            series.table()
        ))
        .bind(start)
        .fetch_all(&self.db.pg)
        .await?;

        Ok(fill_daily_series(today, days, &counts))
    }

    /// Get risk alerts based on patterns
    pub async fn get_risk_alerts(&self) -> Result<Vec<RiskAlert>> {
        let mut alerts = Vec::new();
        let now = Utc::now();

        let repeat_offenders: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM (
                SELECT user_id FROM user_warnings
                WHERE created_at >= NOW() - INTERVAL '30 days'
                GROUP BY user_id
                HAVING COUNT(*) >= $1
            ) offenders
            "#,
        )
        .bind(REPEAT_WARNING_THRESHOLD)
        .fetch_one(&self.db.pg)
        .await?;

        if repeat_offenders > 0 {
            alerts.push(RiskAlert {
                kind: "repeat_warnings",
                level: RiskLevel::Medium,
                title: "Users with repeated warnings".to_string(),
                description: format!(
                    "{} users received {} or more warnings in the last 30 days",
                    repeat_offenders, REPEAT_WARNING_THRESHOLD
                ),
                count: repeat_offenders,
                created_at: now,
            });
        }

        let recent_bans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_bans WHERE banned_at >= NOW() - INTERVAL '1 hour'",
        )
        .fetch_one(&self.db.pg)
        .await?;

        if recent_bans > BAN_SURGE_THRESHOLD {
            alerts.push(RiskAlert {
                kind: "ban_surge",
                level: RiskLevel::High,
                title: "Ban surge".to_string(),
                description: format!("{} users were banned in the last hour", recent_bans),
                count: recent_bans,
                created_at: now,
            });
        }

        let pending: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE status = $1")
            .bind(ReportStatus::Pending)
            .fetch_one(&self.db.pg)
            .await?;

        if pending > PENDING_BACKLOG_THRESHOLD {
            alerts.push(RiskAlert {
                kind: "report_backlog",
                level: RiskLevel::Medium,
                title: "Report backlog".to_string(),
                description: format!("{} reports are waiting for review", pending),
                count: pending,
                created_at: now,
            });
        }

        let heavily_reported: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM (
                SELECT reported_user_id FROM reports
                WHERE created_at >= NOW() - INTERVAL '24 hours'
                GROUP BY reported_user_id
                HAVING COUNT(*) >= $1
            ) reported
            "#,
        )
        .bind(REPORTED_USER_THRESHOLD)
        .fetch_one(&self.db.pg)
        .await?;

        if heavily_reported > 0 {
            alerts.push(RiskAlert {
                kind: "heavily_reported_users",
                level: RiskLevel::High,
                title: "Heavily reported users".to_string(),
                description: format!(
                    "{} users were reported {} or more times in the last 24 hours",
                    heavily_reported, REPORTED_USER_THRESHOLD
                ),
                count: heavily_reported,
                created_at: now,
            });
        }

        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_days() {
        assert_eq!(clamp_days(None), 7);
        assert_eq!(clamp_days(Some(0)), 1);
        assert_eq!(clamp_days(Some(30)), 30);
        assert_eq!(clamp_days(Some(365)), 90);
    }

    #[test]
    fn test_fill_daily_series_zero_fills() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let counts = vec![
            (NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(), 4),
            (NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(), 2),
            // outside the window, ignored
            (NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), 99),
        ];

        let series = fill_daily_series(today, 3, &counts);
        assert_eq!(
            series,
            vec![
                ChartDataPoint { date: "2024-03-08".into(), value: 4 },
                ChartDataPoint { date: "2024-03-09".into(), value: 0 },
                ChartDataPoint { date: "2024-03-10".into(), value: 2 },
            ]
        );
    }

    #[test]
    fn test_fill_daily_series_crosses_month() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let series = fill_daily_series(today, 2, &[]);
        assert_eq!(series[0].date, "2024-02-29");
        assert_eq!(series[1].date, "2024-03-01");
    }
}
