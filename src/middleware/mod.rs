mod auth;
mod client_info;

pub use auth::*;
pub use client_info::ClientInfo;
