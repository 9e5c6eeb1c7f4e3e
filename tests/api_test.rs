//! Router Integration Tests
//!
//! Purpose: Verify authentication, authorization and request validation at the
//! HTTP layer, plus the shape of error bodies.
//! Dependencies: none. The pool connects lazily and Redis points at a closed
//! port, so every request here is answered before any query runs.
//!
//! Run: cargo test --test api_test

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use admin_console::config::Config;
use admin_console::db::Database;
use admin_console::middleware::{AdminRole, Claims, TokenType};
use admin_console::{build_router, AppState};

fn create_test_app() -> Router {
    let config = Config::for_tests();
    let db = Database::connect_lazy(&config).expect("lazy pool");
    build_router(AppState { db, config })
}

fn mint_token(role: AdminRole, token_type: TokenType, ttl_secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        email: "ops@example.com".into(),
        role,
        token_type,
        jti: Uuid::new_v4().to_string(),
        iat: now as usize,
        exp: (now + ttl_secs) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(Config::for_tests().jwt.secret.as_bytes()),
    )
    .unwrap()
}

fn access_token(role: AdminRole) -> String {
    mint_token(role, TokenType::Access, 3600)
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(req: Request<Body>) -> (StatusCode, Value) {
    let response = create_test_app().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn health_check_returns_ok() {
        let response = create_test_app()
            .oneshot(request(Method::GET, "/health", None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let response = create_test_app()
            .oneshot(request(Method::GET, "/api/v2/users", None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

mod authentication {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let (status, body) = send(request(Method::GET, "/api/v1/users", None, None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(&body), "UNAUTHORIZED");
        assert!(body["error"]["message"].is_string());
    }

    #[tokio::test]
    async fn malformed_token_is_rejected() {
        let (status, _) = send(request(
            Method::GET,
            "/api/v1/dashboard/stats",
            Some("not.a.jwt"),
            None,
        ))
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let token = mint_token(AdminRole::SuperAdmin, TokenType::Access, -600);
        let (status, _) = send(request(Method::GET, "/api/v1/auth/me", Some(&token), None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_token_cannot_access_console() {
        let token = mint_token(AdminRole::SuperAdmin, TokenType::Refresh, 3600);
        let (status, _) = send(request(Method::GET, "/api/v1/reports", Some(&token), None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_rejects_invalid_email() {
        let (status, body) = send(request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(serde_json::json!({ "email": "not-an-email", "password": "secret" })),
        ))
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error_code(&body), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn refresh_requires_token() {
        let (status, _) = send(request(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            Some(serde_json::json!({ "refresh_token": "" })),
        ))
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn accept_invite_enforces_password_length() {
        let (status, body) = send(request(
            Method::POST,
            "/api/v1/auth/invites/accept",
            None,
            Some(serde_json::json!({ "token": "abc", "name": "New Mod", "password": "short" })),
        ))
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error_code(&body), "VALIDATION_ERROR");
    }
}

mod authorization {
    use super::*;

    #[tokio::test]
    async fn admin_management_requires_super_admin() {
        for role in [AdminRole::Admin, AdminRole::Moderator] {
            let token = access_token(role);
            let (status, body) =
                send(request(Method::GET, "/api/v1/admins", Some(&token), None)).await;

            assert_eq!(status, StatusCode::FORBIDDEN, "role {:?}", role);
            assert_eq!(error_code(&body), "FORBIDDEN");
        }
    }

    #[tokio::test]
    async fn admin_cannot_create_invites() {
        let token = access_token(AdminRole::Admin);
        let (status, _) = send(request(
            Method::POST,
            "/api/v1/admins/invites",
            Some(&token),
            Some(serde_json::json!({ "email": "new@example.com", "role": "moderator" })),
        ))
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn moderator_cannot_ban_users() {
        let token = access_token(AdminRole::Moderator);
        let uri = format!("/api/v1/users/{}/ban", Uuid::new_v4());
        let (status, _) = send(request(
            Method::POST,
            &uri,
            Some(&token),
            Some(serde_json::json!({ "reason": "spam" })),
        ))
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn moderator_cannot_manage_banned_words() {
        let token = access_token(AdminRole::Moderator);
        let (status, _) = send(request(
            Method::POST,
            "/api/v1/banned-words",
            Some(&token),
            Some(serde_json::json!({ "word": "scam", "severity": "HIGH" })),
        ))
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn moderator_cannot_delete_announcements() {
        let token = access_token(AdminRole::Moderator);
        let uri = format!("/api/v1/announcements/{}", Uuid::new_v4());
        let (status, _) = send(request(Method::DELETE, &uri, Some(&token), None)).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn malformed_user_id_is_bad_request() {
        let token = access_token(AdminRole::Admin);
        let (status, body) = send(request(
            Method::POST,
            "/api/v1/users/not-a-uuid/ban",
            Some(&token),
            Some(serde_json::json!({ "reason": "spam" })),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), "BAD_REQUEST");
        assert_eq!(body["error"]["message"], "Invalid user ID");
    }

    #[tokio::test]
    async fn ban_duration_must_be_in_range() {
        let token = access_token(AdminRole::Admin);
        let uri = format!("/api/v1/users/{}/ban", Uuid::new_v4());

        for days in [0, 3651] {
            let (status, body) = send(request(
                Method::POST,
                &uri,
                Some(&token),
                Some(serde_json::json!({ "reason": "spam", "duration_days": days })),
            ))
            .await;

            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "days {}", days);
            assert_eq!(error_code(&body), "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn empty_user_update_is_bad_request() {
        let token = access_token(AdminRole::Admin);
        let uri = format!("/api/v1/users/{}", Uuid::new_v4());
        let (status, _) = send(request(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(serde_json::json!({})),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_status_filter_is_bad_request() {
        let token = access_token(AdminRole::Moderator);
        let (status, body) = send(request(
            Method::GET,
            "/api/v1/users?status=frozen",
            Some(&token),
            None,
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid status: frozen");
    }

    #[tokio::test]
    async fn report_cannot_be_moved_back_to_pending() {
        let token = access_token(AdminRole::Moderator);
        let uri = format!("/api/v1/reports/{}", Uuid::new_v4());
        let (status, _) = send(request(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(serde_json::json!({ "status": "PENDING" })),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_banned_word_is_rejected() {
        let token = access_token(AdminRole::Admin);
        let (status, body) = send(request(
            Method::POST,
            "/api/v1/banned-words",
            Some(&token),
            Some(serde_json::json!({ "word": "", "severity": "LOW" })),
        ))
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error_code(&body), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn blank_banned_word_is_bad_request() {
        let token = access_token(AdminRole::Admin);
        let (status, _) = send(request(
            Method::POST,
            "/api/v1/banned-words",
            Some(&token),
            Some(serde_json::json!({ "word": "   ", "severity": "LOW" })),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn announcement_schedule_must_be_ordered() {
        let token = access_token(AdminRole::Admin);
        let (status, body) = send(request(
            Method::POST,
            "/api/v1/announcements",
            Some(&token),
            Some(serde_json::json!({
                "title": "Maintenance",
                "content": "Back soon",
                "starts_at": "2030-01-02T00:00:00Z",
                "ends_at": "2030-01-01T00:00:00Z",
            })),
        ))
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error_code(&body), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn audit_log_time_filter_must_be_rfc3339() {
        let token = access_token(AdminRole::Moderator);
        let (status, _) = send(request(
            Method::GET,
            "/api/v1/audit-logs?from=yesterday",
            Some(&token),
            None,
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn admin_update_rejects_unknown_role() {
        let token = access_token(AdminRole::SuperAdmin);
        let uri = format!("/api/v1/admins/{}", Uuid::new_v4());
        let (status, body) = send(request(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(serde_json::json!({ "role": "owner" })),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid role: owner");
    }

    #[tokio::test]
    async fn malformed_json_uses_error_envelope() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), "BAD_REQUEST");
        assert!(body["error"]["message"].is_string());
    }

    #[tokio::test]
    async fn unknown_enum_in_body_is_validation_error() {
        let token = access_token(AdminRole::Admin);
        let (status, body) = send(request(
            Method::POST,
            "/api/v1/banned-words",
            Some(&token),
            Some(serde_json::json!({ "word": "scam", "severity": "EXTREME" })),
        ))
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error_code(&body), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn non_numeric_page_uses_error_envelope() {
        let token = access_token(AdminRole::Moderator);
        let (status, body) = send(request(
            Method::GET,
            "/api/v1/users?page=abc",
            Some(&token),
            None,
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), "BAD_REQUEST");
    }
}
