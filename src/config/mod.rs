use serde::Deserialize;

const MIN_JWT_SECRET_LEN: usize = 16;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Comma separated list of allowed origins, `*` allows any.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: u64,
    #[serde(default = "default_refresh_expiry_days")]
    pub refresh_expiry_days: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_max_login_attempts")]
    pub max_login_attempts: i32,
    #[serde(default = "default_lockout_duration_minutes")]
    pub lockout_duration_minutes: i64,
    /// Try legacy user tables when an email is unknown to `admin_users`.
    #[serde(default = "default_legacy_auth_fallback")]
    pub legacy_auth_fallback: bool,
    #[serde(default = "default_invite_expiry_hours")]
    pub invite_expiry_hours: i64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origins() -> String {
    "*".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_expiry_hours() -> u64 {
    24
}

fn default_refresh_expiry_days() -> u64 {
    30
}

fn default_max_login_attempts() -> i32 {
    5
}

fn default_lockout_duration_minutes() -> i64 {
    15
}

fn default_legacy_auth_fallback() -> bool {
    true
}

fn default_invite_expiry_hours() -> i64 {
    72
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.cors_origins", "*")?
            .set_default("database.url", "postgres://localhost/admin_console")?
            .set_default("database.max_connections", 10)?
            .set_default("redis.url", "redis://localhost:6379")?
            .set_default("jwt.secret", "development-secret-change-in-production")?
            .set_default("jwt.expiry_hours", 24)?
            .set_default("jwt.refresh_expiry_days", 30)?
            .set_default("security.max_login_attempts", 5)?
            .set_default("security.lockout_duration_minutes", 15)?
            .set_default("security.legacy_auth_fallback", true)?
            .set_default("security.invite_expiry_hours", 72)?
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!(
                "JWT secret must be at least {} bytes long",
                MIN_JWT_SECRET_LEN
            );
        }
        if self.security.max_login_attempts < 1 {
            anyhow::bail!("security.max_login_attempts must be positive");
        }
        Ok(())
    }

    /// Allowed CORS origins, `None` when any origin is accepted.
    pub fn allowed_origins(&self) -> Option<Vec<String>> {
        let origins: Vec<String> = self
            .server
            .cors_origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            None
        } else {
            Some(origins)
        }
    }

    /// Configuration used by tests; nothing is read from the environment.
    pub fn for_tests() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                cors_origins: default_cors_origins(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/admin_console_test".to_string(),
                max_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://127.0.0.1:1".to_string(),
            },
            jwt: JwtConfig {
                secret: "test-secret-at-least-16-bytes".to_string(),
                expiry_hours: default_expiry_hours(),
                refresh_expiry_days: default_refresh_expiry_days(),
            },
            security: SecurityConfig {
                max_login_attempts: default_max_login_attempts(),
                lockout_duration_minutes: default_lockout_duration_minutes(),
                legacy_auth_fallback: default_legacy_auth_fallback(),
                invite_expiry_hours: default_invite_expiry_hours(),
            },
        }
    }
}
