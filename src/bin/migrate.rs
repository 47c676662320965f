use anyhow::{Context, Result};
use bkms::{
    config::Config,
    passwords::Passwords,
    repositories::{UserRepository, UserRepositoryTrait},
    telemetry,
};
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};
use tracing::info;

const ADMIN_USERNAME: &str = "admin";
const ENV_ADMIN_PASSWORD: &str = "BKMS_ADMIN_PASSWORD";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    telemetry::init(&config);

    let pool: Pool<Postgres> = PgPoolOptions::new()
        .max_connections(5)
        .connect(config.database_url())
        .await
        .context("failed to connect to database")?;

    // runs all pending migrations; no-op if up-to-date
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("migrations applied");

    let users = UserRepository::new(pool);
    if users.count().await? > 0 {
        info!("users present, skipping admin seed");
        return Ok(());
    }

    let password =
        std::env::var(ENV_ADMIN_PASSWORD).unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string());
    let hashed = Passwords::standard().hash(&password)?;
    let admin = users
        .create(ADMIN_USERNAME, &hashed.hash, &hashed.salt)
        .await?;
    info!(user_id = admin.id, username = %admin.username, "default admin user created");

    Ok(())
}
