mod admin;
mod announcement;
mod audit_log;
mod banned_word;
mod pagination;
mod report;
mod user;

pub use admin::*;
pub use announcement::*;
pub use audit_log::*;
pub use banned_word::*;
pub use pagination::*;
pub use report::*;
pub use user::*;
