#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{Router, extract::connect_info::MockConnectInfo};
use bkms::{
    app_state::AppState,
    config::{AppMode, Config},
    passwords::Passwords,
    repositories::{UserRepository, UserRepositoryTrait},
    router::build_router,
};
use sqlx::PgPool;

/// Connects to `TEST_DATABASE_URL` and migrates it, or returns `None` so the
/// calling test can skip.
pub async fn setup_test_db() -> Option<PgPool> {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping database tests: TEST_DATABASE_URL not set");
            return None;
        }
    };

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// Suffixes `prefix` so tests sharing one database never collide on unique columns.
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

/// The full router over a real database, as `main` builds it.
pub fn test_app(pool: PgPool) -> (Router, AppState) {
    let config = Config::default().with_mode(AppMode::Test);
    let state = AppState::new(config, pool).expect("Failed to build app state");
    let app = build_router(state.clone())
        .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 9000))));
    (app, state)
}

/// Inserts a user with an Argon2 hash of `password` and returns its username.
pub async fn create_user(pool: &PgPool, password: &str) -> String {
    let username = unique("user");
    let hashed = Passwords::standard().hash(password).unwrap();
    UserRepository::new(pool.clone())
        .create(&username, &hashed.hash, &hashed.salt)
        .await
        .expect("Failed to create user");
    username
}
