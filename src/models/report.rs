use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Report lifecycle; a report is reviewed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Pending,
    Resolved,
    Rejected,
}

impl ReportStatus {
    /// pending -> resolved/rejected only
    pub fn can_transition_to(&self, new_status: ReportStatus) -> bool {
        matches!(
            (self, new_status),
            (ReportStatus::Pending, ReportStatus::Resolved)
                | (ReportStatus::Pending, ReportStatus::Rejected)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "PENDING",
            ReportStatus::Resolved => "RESOLVED",
            ReportStatus::Rejected => "REJECTED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_user_id: Uuid,
    pub reason: String,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub resolution_note: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Report joined with the nicknames of both parties.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReportDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub report: Report,
    pub reporter_nickname: Option<String>,
    pub reported_nickname: Option<String>,
    pub reviewer_name: Option<String>,
}

#[derive(Debug, Default)]
pub struct ListReportsParams {
    pub status: Option<ReportStatus>,
    pub reason: Option<String>,
    pub reporter_id: Option<Uuid>,
    pub reported_user_id: Option<Uuid>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ReportStats {
    pub pending: i64,
    pub resolved: i64,
    pub rejected: i64,
    pub total: i64,
}

impl ReportStats {
    pub fn from_counts(counts: impl IntoIterator<Item = (ReportStatus, i64)>) -> Self {
        let mut stats = ReportStats::default();
        for (status, count) in counts {
            match status {
                ReportStatus::Pending => stats.pending += count,
                ReportStatus::Resolved => stats.resolved += count,
                ReportStatus::Rejected => stats.rejected += count,
            }
            stats.total += count;
        }
        stats
    }
}
