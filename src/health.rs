use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use sqlx::{Pool, Postgres};
use tracing::error;
use utoipa::ToSchema;

use crate::{
    app_state::AppState,
    response::{ApiResponse, CODE_FAILED},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthData {
    status: String,
    database: String,
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses(
        (status = 200, description = "Health check successful", body = HealthData),
        (status = 503, description = "Database unreachable")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Response {
    match check_database_health(&state.db_pool).await {
        Ok(()) => ApiResponse::ok(HealthData {
            status: "ok".to_string(),
            database: "healthy".to_string(),
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "database health check failed");
            let body = ApiResponse {
                code: CODE_FAILED,
                msg: "service unavailable".to_string(),
                data: Some(HealthData {
                    status: "degraded".to_string(),
                    database: "unreachable".to_string(),
                }),
            };
            (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
        }
    }
}

async fn check_database_health(pool: &Pool<Postgres>) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").fetch_one(pool).await?;
    Ok(())
}
