use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use redis::AsyncCommands;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::config::Config;
use crate::db::{is_schema_mismatch, Database};
use crate::error::{AppError, Result};
use crate::middleware::{decode_token, denylist_key, is_token_revoked, AdminRole, Claims, TokenType};
use crate::models::{Admin, AdminInvite, AdminStatus};
use crate::utils::mask_email;

/// A table outside `admin_users` that may still hold operator credentials.
#[derive(Debug, Clone, Copy)]
pub struct LegacyCredentialSource {
    pub table: &'static str,
    pub password_column: &'static str,
}

/// Tried in order when an email is unknown to `admin_users`.
pub const LEGACY_CREDENTIAL_SOURCES: &[LegacyCredentialSource] = &[
    LegacyCredentialSource { table: "admins", password_column: "password_hash" },
    LegacyCredentialSource { table: "users", password_column: "password_hash" },
    LegacyCredentialSource { table: "users", password_column: "password" },
    LegacyCredentialSource { table: "\"User\"", password_column: "password" },
];

impl LegacyCredentialSource {
    pub fn query(&self) -> String {
        format!(
            "SELECT id::text AS id, email::text AS email, {}::text AS password_hash, role::text AS role \
             FROM {} WHERE LOWER(email) = LOWER($1) LIMIT 1",
            self.password_column, self.table
        )
    }
}

#[derive(Debug, FromRow)]
struct LegacyCredential {
    id: String,
    email: String,
    password_hash: Option<String>,
    role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

pub struct AuthService {
    db: Database,
    config: Config,
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?
        .to_string())
}

/// Constant-time check against a PHC-format hash; unparseable hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is not in PHC format: {}", e);
            false
        }
    }
}

/// Runs one verification against a throwaway hash so that a login for an
/// unknown email costs as much as one with a wrong password.
fn verify_against_dummy(password: &str) -> bool {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    DUMMY_HASH
        .get_or_init(|| hash_password(&Uuid::new_v4().to_string()).ok())
        .as_deref()
        .map_or(false, |hash| verify_password(password, hash))
}

impl AuthService {
    pub fn new(db: Database, config: Config) -> Self {
        Self { db, config }
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<(Admin, TokenPair)> {
        let admin = match self.find_admin_by_email(email).await? {
            Some(admin) => admin,
            None if self.config.security.legacy_auth_fallback => {
                self.authenticate_legacy(email, password).await?
            }
            None => {
                verify_against_dummy(password);
                tracing::info!(email = %mask_email(email), "Login failed: unknown email");
                return Err(AppError::Unauthorized);
            }
        };

        if !admin.is_active() {
            tracing::info!(admin_id = %admin.id, "Login rejected: account disabled");
            return Err(AppError::Unauthorized);
        }

        if let Some(locked_until) = admin.locked_until {
            if locked_until > Utc::now() {
                return Err(AppError::AccountLocked(format_lock(locked_until)));
            }
            sqlx::query("UPDATE admin_users SET locked_until = NULL, login_attempts = 0 WHERE id = $1")
                .bind(admin.id)
                .execute(&self.db.pg)
                .await?;
        }

        if !verify_password(password, &admin.password_hash) {
            return Err(self.register_failed_attempt(&admin).await?);
        }

        let tokens = self.issue_tokens(&admin)?;

        let admin: Admin = sqlx::query_as(
            r#"
            UPDATE admin_users
            SET last_login_at = NOW(), login_attempts = 0, locked_until = NULL
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(admin.id)
        .fetch_one(&self.db.pg)
        .await?;

        tracing::info!(admin_id = %admin.id, role = %admin.role, "Admin logged in");

        Ok((admin, tokens))
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let admin: Option<Admin> =
            sqlx::query_as("SELECT * FROM admin_users WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_optional(&self.db.pg)
                .await?;

        Ok(admin)
    }

    /// Walks the legacy credential sources until one yields a matching admin
    /// account, then imports it into `admin_users`.
    async fn authenticate_legacy(&self, email: &str, password: &str) -> Result<Admin> {
        let mut verified = false;

        for source in LEGACY_CREDENTIAL_SOURCES {
            let row: Option<LegacyCredential> = match sqlx::query_as(&source.query())
                .bind(email)
                .fetch_optional(&self.db.pg)
                .await
            {
                Ok(row) => row,
                Err(e) if is_schema_mismatch(&e) => {
                    tracing::debug!(
                        table = source.table,
                        column = source.password_column,
                        "Skipping credential source: {}",
                        e
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let Some(row) = row else { continue };

            let Some(role) = row.role.as_deref().and_then(AdminRole::parse) else {
                tracing::debug!(table = source.table, "Legacy account has no admin role");
                continue;
            };

            let Some(hash) = row.password_hash.as_deref() else { continue };
            verified = true;
            if !verify_password(password, hash) {
                continue;
            }

            tracing::info!(
                table = source.table,
                legacy_id = %row.id,
                "Importing legacy admin account"
            );
            return self.import_legacy_admin(&row, role, password).await;
        }

        if !verified {
            verify_against_dummy(password);
        }
        tracing::info!(email = %mask_email(email), "Login failed: no credential source matched");
        Err(AppError::Unauthorized)
    }

    async fn import_legacy_admin(
        &self,
        row: &LegacyCredential,
        role: AdminRole,
        password: &str,
    ) -> Result<Admin> {
        let password_hash = hash_password(password)?;
        let name = row
            .email
            .split('@')
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or("admin")
            .to_string();

        let admin: Admin = sqlx::query_as(
            r#"
            INSERT INTO admin_users (email, password_hash, name, role, permissions)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&row.email)
        .bind(password_hash)
        .bind(name)
        .bind(role.as_str())
        .bind(serde_json::json!({ "legacy_id": row.id }))
        .fetch_one(&self.db.pg)
        .await?;

        Ok(admin)
    }

    /// Counts a bad password in one statement, so concurrent failures can
    /// not overwrite each other's increments.
    async fn register_failed_attempt(&self, admin: &Admin) -> Result<AppError> {
        let lock_until = Utc::now() + Duration::minutes(self.config.security.lockout_duration_minutes);

        let (attempts, locked_until): (i32, Option<DateTime<Utc>>) = sqlx::query_as(
            r#"
            UPDATE admin_users
            SET login_attempts = login_attempts + 1,
                locked_until = CASE
                    WHEN login_attempts + 1 >= $2 THEN $3
                    ELSE locked_until
                END
            WHERE id = $1
            RETURNING login_attempts, locked_until
            "#,
        )
        .bind(admin.id)
        .bind(self.config.security.max_login_attempts)
        .bind(lock_until)
        .fetch_one(&self.db.pg)
        .await?;

        match locked_until {
            Some(until) if until > Utc::now() => {
                tracing::warn!(admin_id = %admin.id, attempts, "Admin account locked");
                Ok(AppError::AccountLocked(format_lock(until)))
            }
            _ => {
                tracing::info!(admin_id = %admin.id, attempts, "Login failed: bad password");
                Ok(AppError::Unauthorized)
            }
        }
    }

    pub fn issue_tokens(&self, admin: &Admin) -> Result<TokenPair> {
        let access_ttl = Duration::hours(self.config.jwt.expiry_hours as i64);
        let refresh_ttl = Duration::days(self.config.jwt.refresh_expiry_days as i64);

        Ok(TokenPair {
            access_token: self.generate_token(admin, TokenType::Access, access_ttl)?,
            refresh_token: self.generate_token(admin, TokenType::Refresh, refresh_ttl)?,
            expires_in: access_ttl.num_seconds(),
        })
    }

    fn generate_token(&self, admin: &Admin, token_type: TokenType, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: admin.id.to_string(),
            email: admin.email.clone(),
            role: admin.role(),
            token_type,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp() as usize,
            exp: (now + ttl).timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Token generation failed: {}", e)))
    }

    /// Exchanges a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(String, i64)> {
        let claims = decode_token(&self.config.jwt.secret, refresh_token, TokenType::Refresh)?;

        if is_token_revoked(&self.db, &claims.jti).await {
            return Err(AppError::Unauthorized);
        }

        let admin_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;
        let admin: Admin = sqlx::query_as("SELECT * FROM admin_users WHERE id = $1 AND status = $2")
            .bind(admin_id)
            .bind(AdminStatus::Active.as_str())
            .fetch_optional(&self.db.pg)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let ttl = Duration::hours(self.config.jwt.expiry_hours as i64);
        let access_token = self.generate_token(&admin, TokenType::Access, ttl)?;

        Ok((access_token, ttl.num_seconds()))
    }

    /// Adds a token id to the denylist until the token would have expired anyway.
    pub async fn revoke_token(&self, token_id: &str, exp: usize) -> Result<()> {
        let ttl = (exp as i64 - Utc::now().timestamp()).max(1) as u64;

        let mut conn = self
            .db
            .get_redis_conn()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Redis connection failed: {}", e)))?;

        conn.set_ex::<_, _, ()>(denylist_key(token_id), "1", ttl)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Token invalidation failed: {}", e)))?;

        Ok(())
    }

    /// Revokes a refresh token presented at logout. Invalid tokens are ignored.
    pub async fn revoke_refresh_token(&self, refresh_token: &str) -> Result<()> {
        match decode_token(&self.config.jwt.secret, refresh_token, TokenType::Refresh) {
            Ok(claims) => self.revoke_token(&claims.jti, claims.exp).await,
            Err(_) => Ok(()),
        }
    }

    /// Creates the admin account for a pending invite.
    pub async fn accept_invite(&self, token: &str, name: &str, password: &str) -> Result<Admin> {
        let mut tx = self.db.pg.begin().await?;

        let invite: AdminInvite =
            sqlx::query_as("SELECT * FROM admin_invites WHERE token = $1 FOR UPDATE")
                .bind(token)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Invite not found".to_string()))?;

        if !invite.is_pending(Utc::now()) {
            return Err(AppError::BadRequest(
                "Invite has expired or was already used".to_string(),
            ));
        }

        let role = AdminRole::parse(&invite.role).unwrap_or(AdminRole::Moderator);
        let admin: Admin = sqlx::query_as(
            r#"
            INSERT INTO admin_users (email, password_hash, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&invite.email)
        .bind(hash_password(password)?)
        .bind(name)
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE admin_invites SET accepted_at = NOW() WHERE id = $1")
            .bind(invite.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(admin_id = %admin.id, invite_id = %invite.id, "Invite accepted");

        Ok(admin)
    }
}

fn format_lock(until: DateTime<Utc>) -> String {
    until.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
