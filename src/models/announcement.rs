use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub is_active: bool,
    pub priority: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rejects windows whose end is not after their start.
pub fn validate_schedule(
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<(), String> {
    match (starts_at, ends_at) {
        (Some(start), Some(end)) if end <= start => {
            Err("ends_at must be after starts_at".to_string())
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Default)]
pub struct ListAnnouncementsParams {
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug)]
pub struct CreateAnnouncement {
    pub title: String,
    pub content: String,
    pub is_active: bool,
    pub priority: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Partial update. The outer `Option` on schedule fields means "leave
/// unchanged"; `Some(None)` clears the field.
#[derive(Debug, Default)]
pub struct UpdateAnnouncement {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_active: Option<bool>,
    pub priority: Option<i32>,
    pub starts_at: Option<Option<DateTime<Utc>>>,
    pub ends_at: Option<Option<DateTime<Utc>>>,
}

impl UpdateAnnouncement {
    pub fn apply(&self, current: &Announcement) -> Announcement {
        Announcement {
            title: self.title.clone().unwrap_or_else(|| current.title.clone()),
            content: self
                .content
                .clone()
                .unwrap_or_else(|| current.content.clone()),
            is_active: self.is_active.unwrap_or(current.is_active),
            priority: self.priority.unwrap_or(current.priority),
            starts_at: self.starts_at.unwrap_or(current.starts_at),
            ends_at: self.ends_at.unwrap_or(current.ends_at),
            ..current.clone()
        }
    }
}
