//! Creates the initial super admin, or resets its password and role.
//! Run with: cargo run --bin seed

use admin_console::config::Config;
use admin_console::db::Database;
use admin_console::middleware::AdminRole;
use admin_console::services::hash_password;
use admin_console::utils::mask_email;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seed=info,admin_console=info".into()),
        )
        .init();

    let config = Config::load()?;

    let email = std::env::var("ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@console.dev".to_string())
        .trim()
        .to_lowercase();
    let password = std::env::var("ADMIN_PASSWORD")
        .map_err(|_| anyhow::anyhow!("ADMIN_PASSWORD must be set"))?;
    let name = std::env::var("ADMIN_NAME").unwrap_or_else(|_| "System Admin".to_string());

    if password.len() < 8 {
        anyhow::bail!("ADMIN_PASSWORD must be at least 8 characters");
    }

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config).await?;
    db.run_migrations().await?;

    let password_hash = hash_password(&password)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?;

    let created: bool = sqlx::query_scalar(
        r#"
        INSERT INTO admin_users (email, password_hash, name, role, status)
        VALUES ($1, $2, $3, $4, 'active')
        ON CONFLICT (email) DO UPDATE
        SET password_hash = EXCLUDED.password_hash,
            role = EXCLUDED.role,
            status = 'active',
            login_attempts = 0,
            locked_until = NULL,
            updated_at = NOW()
        RETURNING (xmax = 0)
        "#,
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(&name)
    .bind(AdminRole::SuperAdmin.as_str())
    .fetch_one(&db.pg)
    .await?;

    if created {
        tracing::info!(email = %mask_email(&email), "Super admin created");
    } else {
        tracing::info!(email = %mask_email(&email), "Super admin updated");
    }

    println!("Admin account ready: {} ({})", email, AdminRole::SuperAdmin.as_str());

    Ok(())
}
