use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    app_state::AppState,
    auth::{self, require_auth},
    bookmarks::handlers as bookmarks,
    health::health_check,
    middleware::{RateLimit, rate_limit_middleware},
    openapi::ApiDoc,
    tags::handlers as tags,
};

/// Login and captcha attempts allowed per client IP and window.
pub const AUTH_RATE_LIMIT: u32 = 20;
pub const AUTH_RATE_WINDOW_SECS: i64 = 60;
/// Upper bound for an uploaded bookmark export.
pub const IMPORT_BODY_LIMIT: usize = 32 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/v1/captcha", get(auth::handlers::captcha))
        .route("/api/v1/auth/login", post(auth::handlers::login))
        .route_layer(from_fn_with_state(
            RateLimit::new(AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECS),
            rate_limit_middleware,
        ));

    let protected = Router::new()
        .route(
            "/api/v1/bookmarks",
            get(bookmarks::list_bookmarks).put(bookmarks::update_bookmark),
        )
        .route(
            "/api/v1/bookmark",
            post(bookmarks::create_bookmark).delete(bookmarks::delete_bookmarks),
        )
        .route("/api/v1/bookmark/{id}/content", get(bookmarks::bookmark_content))
        .route(
            "/api/v1/bookmarks/import",
            post(bookmarks::import_bookmarks).layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT)),
        )
        .route("/api/v1/tags", get(tags::list_tags))
        .route("/api/v1/tags/orphans", delete(tags::prune_orphan_tags))
        .route("/api/v1/tag/{id}", put(tags::rename_tag).delete(tags::delete_tag))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/healthz", get(health_check))
        .merge(public)
        .merge(protected)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
