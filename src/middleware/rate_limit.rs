use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use tracing::warn;

use crate::response::ApiError;

/// Fixed-window request counter per client IP. Cloning shares the table.
#[derive(Clone)]
pub struct RateLimit {
    store: Arc<DashMap<IpAddr, RateLimitData>>,
    max_requests: u32,
    window_seconds: i64,
}

#[derive(Debug, Clone)]
struct RateLimitData {
    count: u32,
    window_start: DateTime<Utc>,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_seconds: i64) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            max_requests,
            window_seconds,
        }
    }

    /// Count one request from `ip`; `false` once it is over the limit.
    fn check(&self, ip: IpAddr, now: DateTime<Utc>) -> bool {
        let window = Duration::seconds(self.window_seconds);

        // Forget clients whose window has long passed
        if self.store.len() > 10_000 {
            self.store
                .retain(|_, data| now.signed_duration_since(data.window_start) < window);
        }

        let mut entry = self.store.entry(ip).or_insert_with(|| RateLimitData {
            count: 0,
            window_start: now,
        });
        let data = entry.value_mut();

        if now.signed_duration_since(data.window_start) >= window {
            data.count = 0;
            data.window_start = now;
        }

        data.count += 1;
        data.count <= self.max_requests
    }
}

/// IP-based rate limiting middleware.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(rate_limit): State<RateLimit>,
    req: Request,
    next: Next,
) -> Response {
    if !rate_limit.check(addr.ip(), Utc::now()) {
        warn!(ip = %addr.ip(), path = %req.uri().path(), "rate limit exceeded");
        return ApiError::RateLimited("too many requests, try again later".to_string())
            .into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        extract::connect_info::MockConnectInfo,
        http::{Request, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
    };
    use tower::ServiceExt;

    #[test]
    fn test_window_counts_and_resets() {
        let limit = RateLimit::new(2, 60);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        let start = Utc::now();

        assert!(limit.check(ip, start));
        assert!(limit.check(ip, start));
        assert!(!limit.check(ip, start));

        // Other clients are unaffected
        assert!(limit.check("10.0.0.2".parse().unwrap(), start));

        assert!(limit.check(ip, start + Duration::seconds(61)));
    }

    #[tokio::test]
    async fn test_middleware_rejects_with_envelope() {
        let limit = RateLimit::new(1, 60);
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(from_fn_with_state(limit, rate_limit_middleware))
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

        let first = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

        let bytes = axum::body::to_bytes(second.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], 429);
    }
}
