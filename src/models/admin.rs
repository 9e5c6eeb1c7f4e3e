use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::middleware::AdminRole;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub avatar: Option<String>,
    pub status: String,
    pub login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub permissions: serde_json::Value,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    pub fn role(&self) -> AdminRole {
        AdminRole::parse(&self.role).unwrap_or(AdminRole::Moderator)
    }

    pub fn is_active(&self) -> bool {
        self.status == AdminStatus::Active.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminStatus {
    Active,
    Disabled,
}

impl AdminStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminStatus::Active => "active",
            AdminStatus::Disabled => "disabled",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AdminInvite {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub invited_by: Uuid,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AdminInvite {
    pub fn is_pending(&self, now: DateTime<Utc>) -> bool {
        self.accepted_at.is_none() && self.expires_at > now
    }
}

#[derive(Debug, Default)]
pub struct UpdateAdmin {
    pub name: Option<String>,
    pub role: Option<AdminRole>,
    pub status: Option<AdminStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invite(accepted: bool, expires_in: Duration) -> AdminInvite {
        let now = Utc::now();
        AdminInvite {
            id: Uuid::new_v4(),
            email: "new@example.com".into(),
            role: "moderator".into(),
            token: "t".into(),
            invited_by: Uuid::new_v4(),
            expires_at: now + expires_in,
            accepted_at: accepted.then_some(now),
            created_at: now,
        }
    }

    #[test]
    fn test_invite_pending() {
        let now = Utc::now();
        assert!(invite(false, Duration::hours(1)).is_pending(now));
        assert!(!invite(true, Duration::hours(1)).is_pending(now));
        assert!(!invite(false, Duration::hours(-1)).is_pending(now));
    }
}
