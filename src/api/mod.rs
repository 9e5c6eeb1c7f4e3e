mod admins;
mod announcements;
mod audit;
mod auth;
mod banned_words;
mod dashboard;
mod extract;
mod reports;
mod users;

use axum::{middleware::from_fn_with_state, Router};
use serde::de::{value::StrDeserializer, DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::{require_auth, require_super_admin};
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(auth::protected_routes())
        .nest(
            "/admins",
            admins::routes().route_layer(axum::middleware::from_fn(require_super_admin)),
        )
        .nest("/users", users::routes())
        .nest("/reports", reports::routes())
        .nest("/banned-words", banned_words::routes())
        .nest("/announcements", announcements::routes())
        .nest("/audit-logs", audit::routes())
        .nest("/dashboard", dashboard::routes())
        .route_layer(from_fn_with_state(state, require_auth));

    Router::new().merge(auth::public_routes()).merge(protected)
}

/// Parses a path id, mapping malformed input to 400.
pub(crate) fn parse_id(id: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| AppError::BadRequest(format!("Invalid {} ID", what)))
}

/// Parses a query-string enum filter using its serde wire name.
pub(crate) fn parse_filter<T: DeserializeOwned>(value: Option<String>, field: &str) -> Result<Option<T>> {
    let Some(value) = crate::utils::non_blank(value) else {
        return Ok(None);
    };

    let deserializer: StrDeserializer<'_, serde::de::value::Error> = value.as_str().into_deserializer();
    T::deserialize(deserializer)
        .map(Some)
        .map_err(|_| AppError::BadRequest(format!("Invalid {}: {}", field, value)))
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReportStatus, UserStatus};

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "user").unwrap(), id);

        let err = parse_id("not-a-uuid", "user").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Invalid user ID"));
    }

    #[test]
    fn test_parse_filter() {
        let status: Option<ReportStatus> = parse_filter(Some("PENDING".into()), "status").unwrap();
        assert_eq!(status, Some(ReportStatus::Pending));

        let status: Option<UserStatus> = parse_filter(Some(" banned ".into()), "status").unwrap();
        assert_eq!(status, Some(UserStatus::Banned));

        let empty: Option<UserStatus> = parse_filter(Some("".into()), "status").unwrap();
        assert_eq!(empty, None);

        let err = parse_filter::<ReportStatus>(Some("pending".into()), "status").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
