use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User summary for list views
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub nickname: String,
    pub email: String,
    pub avatar: Option<String>,
    pub gender: Option<String>,
    pub status: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub last_active_at: Option<DateTime<Utc>>,
}

/// Full user details
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserDetail {
    pub id: Uuid,
    pub nickname: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub status: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_active_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserBan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub admin_id: Uuid,
    pub reason: String,
    pub duration_days: Option<i32>,
    pub banned_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub unbanned_at: Option<DateTime<Utc>>,
    pub unbanned_by: Option<Uuid>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserWarning {
    pub id: Uuid,
    pub user_id: Uuid,
    pub admin_id: Uuid,
    pub reason: String,
    pub severity: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Suspended,
    Banned,
    Deleted,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
            UserStatus::Banned => "banned",
            UserStatus::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    Low,
    Medium,
    High,
}

impl WarningSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningSeverity::Low => "low",
            WarningSeverity::Medium => "medium",
            WarningSeverity::High => "high",
        }
    }
}

impl Default for WarningSeverity {
    fn default() -> Self {
        WarningSeverity::Low
    }
}

#[derive(Debug, Default)]
pub struct ListUsersParams {
    pub status: Option<UserStatus>,
    pub gender: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Default)]
pub struct UpdateUser {
    pub nickname: Option<String>,
    pub bio: Option<String>,
    pub status: Option<UserStatus>,
    pub is_verified: Option<bool>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.nickname.is_none()
            && self.bio.is_none()
            && self.status.is_none()
            && self.is_verified.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_serde() {
        let status: UserStatus = serde_json::from_str("\"suspended\"").unwrap();
        assert_eq!(status, UserStatus::Suspended);
        assert_eq!(status.as_str(), "suspended");
        assert!(serde_json::from_str::<UserStatus>("\"frozen\"").is_err());
    }

    #[test]
    fn test_empty_update() {
        assert!(UpdateUser::default().is_empty());
        let update = UpdateUser {
            is_verified: Some(true),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
