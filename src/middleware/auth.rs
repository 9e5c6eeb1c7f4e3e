use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::AppState;

const DENYLIST_PREFIX: &str = "token_blacklist:";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Admin ID
    pub email: String,
    pub role: AdminRole,
    pub token_type: TokenType,
    pub jti: String,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    SuperAdmin,
    Admin,
    Moderator,
}

impl AdminRole {
    /// Parses stored role names, tolerating legacy casing (`ADMIN`, `SuperAdmin`).
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && *c != ' ')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "superadmin" => Some(AdminRole::SuperAdmin),
            "admin" => Some(AdminRole::Admin),
            "moderator" => Some(AdminRole::Moderator),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::SuperAdmin => "super_admin",
            AdminRole::Admin => "admin",
            AdminRole::Moderator => "moderator",
        }
    }

    pub fn can_manage_admins(&self) -> bool {
        matches!(self, AdminRole::SuperAdmin)
    }

    pub fn can_ban_users(&self) -> bool {
        matches!(self, AdminRole::SuperAdmin | AdminRole::Admin)
    }

    /// Banned words and announcements.
    pub fn can_manage_settings(&self) -> bool {
        matches!(self, AdminRole::SuperAdmin | AdminRole::Admin)
    }

    pub fn can_moderate_content(&self) -> bool {
        true // All roles can review reports and warn users
    }
}

#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub id: Uuid,
    pub email: String,
    pub role: AdminRole,
    pub token_id: String,
    pub token_exp: usize,
}

impl CurrentAdmin {
    pub fn require(&self, allowed: bool) -> Result<()> {
        if allowed {
            Ok(())
        } else {
            tracing::warn!(admin_id = %self.id, role = ?self.role, "Permission denied");
            Err(AppError::Forbidden)
        }
    }
}

/// Decodes a token and checks it is of the expected kind.
pub fn decode_token(secret: &str, token: &str, expected: TokenType) -> Result<Claims> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Token rejected: {}", e);
        AppError::Unauthorized
    })?
    .claims;

    if claims.token_type != expected {
        return Err(AppError::Unauthorized);
    }

    Ok(claims)
}

pub fn denylist_key(token_id: &str) -> String {
    format!("{}{}", DENYLIST_PREFIX, token_id)
}

/// Whether a token id was revoked. Redis outages are logged and treated as
/// "not revoked" so the console stays usable.
pub async fn is_token_revoked(db: &Database, token_id: &str) -> bool {
    let mut conn = match db.get_redis_conn().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!("Token denylist unavailable: {}", e);
            return false;
        }
    };

    match conn.exists::<_, bool>(denylist_key(token_id)).await {
        Ok(revoked) => revoked,
        Err(e) => {
            tracing::warn!("Token denylist lookup failed: {}", e);
            false
        }
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::Unauthorized)?;

    let claims = decode_token(&state.config.jwt.secret, bearer.token(), TokenType::Access)?;
    let admin_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;

    if is_token_revoked(&state.db, &claims.jti).await {
        return Err(AppError::Unauthorized);
    }

    request.extensions_mut().insert(CurrentAdmin {
        id: admin_id,
        email: claims.email,
        role: claims.role,
        token_id: claims.jti,
        token_exp: claims.exp,
    });

    Ok(next.run(request).await)
}

pub async fn require_super_admin(request: Request, next: Next) -> Result<Response> {
    let current_admin = request
        .extensions()
        .get::<CurrentAdmin>()
        .ok_or(AppError::Unauthorized)?;

    current_admin.require(current_admin.role.can_manage_admins())?;

    Ok(next.run(request).await)
}
