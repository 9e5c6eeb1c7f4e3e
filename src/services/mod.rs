mod admin_service;
mod announcement_service;
mod audit_service;
mod auth_service;
mod banned_word_service;
mod dashboard_service;
mod report_service;
mod user_service;

pub use admin_service::*;
pub use announcement_service::*;
pub use audit_service::*;
pub use auth_service::*;
pub use banned_word_service::*;
pub use dashboard_service::*;
pub use report_service::*;
pub use user_service::*;
