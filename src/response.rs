use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

pub const CODE_OK: i32 = 0;
pub const CODE_FAILED: i32 = 1;
pub const CODE_UNAUTHORIZED: i32 = 401;
pub const CODE_NOT_FOUND: i32 = 404;
pub const CODE_CONFLICT: i32 = 409;
pub const CODE_RATE_LIMITED: i32 = 429;

/// `{code, msg, data}` wrapper used by every JSON endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: CODE_OK,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn empty() -> Self {
        Self {
            code: CODE_OK,
            msg: "ok".to_string(),
            data: None,
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("{context}")]
    Internal {
        context: &'static str,
        cause: anyhow::Error,
    },
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Wrap a lower-level failure. Only `context` reaches the client.
    pub fn internal(context: &'static str, cause: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            context,
            cause: cause.into(),
        }
    }

    fn status_and_code(&self) -> (StatusCode, i32) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, CODE_FAILED),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, CODE_UNAUTHORIZED),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, CODE_NOT_FOUND),
            Self::Conflict(_) => (StatusCode::CONFLICT, CODE_CONFLICT),
            Self::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, CODE_RATE_LIMITED),
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, CODE_FAILED),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal { context, cause } = &self {
            error!(error = ?cause, "{context}");
        }

        let (status, code) = self.status_and_code();
        (status, ApiResponse::error(code, self.to_string())).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{Value, json};

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ok_envelope() {
        let response = ApiResponse::ok(json!({"id": 1})).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"code": 0, "msg": "ok", "data": {"id": 1}})
        );
    }

    #[tokio::test]
    async fn test_empty_envelope_omits_data() {
        let response = ApiResponse::empty().into_response();
        assert_eq!(body_json(response).await, json!({"code": 0, "msg": "ok"}));
    }

    #[tokio::test]
    async fn test_error_status_mapping() {
        let cases = [
            (ApiError::bad_request("bad"), StatusCode::BAD_REQUEST, 1),
            (ApiError::unauthorized("who"), StatusCode::UNAUTHORIZED, 401),
            (ApiError::not_found("gone"), StatusCode::NOT_FOUND, 404),
            (ApiError::conflict("taken"), StatusCode::CONFLICT, 409),
        ];

        for (error, status, code) in cases {
            let msg = error.to_string();
            let response = error.into_response();
            assert_eq!(response.status(), status);
            assert_eq!(
                body_json(response).await,
                json!({"code": code, "msg": msg})
            );
        }
    }

    #[tokio::test]
    async fn test_internal_error_hides_source() {
        let error = ApiError::internal(
            "failed to list bookmarks",
            anyhow::anyhow!("relation \"bookmarks\" does not exist"),
        );
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"code": 1, "msg": "failed to list bookmarks"})
        );
    }
}
