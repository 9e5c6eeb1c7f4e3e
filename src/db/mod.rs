use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;

/// SQLSTATE raised when a relation does not exist.
pub const UNDEFINED_TABLE: &str = "42P01";
/// SQLSTATE raised when a column does not exist.
pub const UNDEFINED_COLUMN: &str = "42703";

#[derive(Clone)]
pub struct Database {
    pub pg: PgPool,
    pub redis: redis::Client,
}

impl Database {
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let pg = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database.url)
            .await?;

        tracing::info!("PostgreSQL connection pool established");

        let redis = redis::Client::open(config.redis.url.as_str())?;

        tracing::info!("Redis client created");

        Ok(Self { pg, redis })
    }

    /// Pool that only connects on first use.
    pub fn connect_lazy(config: &Config) -> anyhow::Result<Self> {
        let pg = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(1))
            .connect_lazy(&config.database.url)?;
        let redis = redis::Client::open(config.redis.url.as_str())?;

        Ok(Self { pg, redis })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pg).await?;
        tracing::info!("Database migrations completed");
        Ok(())
    }

    pub async fn get_redis_conn(&self) -> anyhow::Result<redis::aio::MultiplexedConnection> {
        Ok(self.redis.get_multiplexed_async_connection().await?)
    }
}

/// True when the error means the queried table or column is absent.
pub fn is_schema_mismatch(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => matches!(
            db_err.code().as_deref(),
            Some(UNDEFINED_TABLE) | Some(UNDEFINED_COLUMN)
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_schema_mismatch() {
        assert!(!is_schema_mismatch(&sqlx::Error::RowNotFound));
        assert!(!is_schema_mismatch(&sqlx::Error::PoolTimedOut));
    }

    #[tokio::test]
    async fn test_connect_lazy_does_not_touch_network() {
        let db = Database::connect_lazy(&Config::for_tests()).unwrap();
        assert_eq!(db.pg.size(), 0);
    }
}
