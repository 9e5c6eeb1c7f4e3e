use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct CreateAuditLog {
    pub admin_id: Uuid,
    pub action: AuditAction,
    pub resource_type: ResourceType,
    pub resource_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // Auth
    Login,
    Logout,
    AcceptInvite,
    // Admin management
    InviteAdmin,
    RevokeInvite,
    UpdateAdmin,
    // User management
    ViewUser,
    UpdateUser,
    DeleteUser,
    BanUser,
    UnbanUser,
    WarnUser,
    // Reports
    ResolveReport,
    RejectReport,
    // Banned words
    CreateBannedWord,
    UpdateBannedWord,
    DeleteBannedWord,
    // Announcements
    CreateAnnouncement,
    UpdateAnnouncement,
    DeleteAnnouncement,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
            AuditAction::AcceptInvite => "accept_invite",
            AuditAction::InviteAdmin => "invite_admin",
            AuditAction::RevokeInvite => "revoke_invite",
            AuditAction::UpdateAdmin => "update_admin",
            AuditAction::ViewUser => "view_user",
            AuditAction::UpdateUser => "update_user",
            AuditAction::DeleteUser => "delete_user",
            AuditAction::BanUser => "ban_user",
            AuditAction::UnbanUser => "unban_user",
            AuditAction::WarnUser => "warn_user",
            AuditAction::ResolveReport => "resolve_report",
            AuditAction::RejectReport => "reject_report",
            AuditAction::CreateBannedWord => "create_banned_word",
            AuditAction::UpdateBannedWord => "update_banned_word",
            AuditAction::DeleteBannedWord => "delete_banned_word",
            AuditAction::CreateAnnouncement => "create_announcement",
            AuditAction::UpdateAnnouncement => "update_announcement",
            AuditAction::DeleteAnnouncement => "delete_announcement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Admin,
    Invite,
    User,
    Report,
    BannedWord,
    Announcement,
    Session,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Admin => "admin",
            ResourceType::Invite => "invite",
            ResourceType::User => "user",
            ResourceType::Report => "report",
            ResourceType::BannedWord => "banned_word",
            ResourceType::Announcement => "announcement",
            ResourceType::Session => "session",
        }
    }
}
