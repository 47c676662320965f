use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::{info, instrument, warn};

use crate::{
    app_state::AppState,
    auth::dtos::{CaptchaData, LoginData, LoginRequest},
    passwords::Passwords,
    response::{ApiError, ApiResponse, ApiResult},
};

const INVALID_CREDENTIALS: &str = "invalid username or password";
const INVALID_CAPTCHA: &str = "invalid captcha";

#[utoipa::path(
    get,
    path = "/api/v1/captcha",
    tag = "auth",
    responses(
        (status = 200, description = "New captcha challenge", body = CaptchaData),
        (status = 429, description = "Rate limited")
    )
)]
pub async fn captcha(State(state): State<AppState>) -> ApiResult<CaptchaData> {
    let captcha = state.captchas.generate();
    let captcha_str = (!state.config.mode().is_release()).then_some(captcha.answer);

    Ok(ApiResponse::ok(CaptchaData {
        captcha: captcha.image,
        captcha_id: captcha.id,
        captcha_str,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginData),
        (status = 400, description = "Invalid captcha or request"),
        (status = 401, description = "Invalid username or password"),
        (status = 429, description = "Rate limited")
    )
)]
#[instrument(skip_all, fields(username = tracing::field::Empty))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginData> {
    let Json(payload) = payload?;
    payload.validate().map_err(ApiError::bad_request)?;
    tracing::Span::current().record("username", payload.username.trim());

    if !state.captchas.verify(&payload.captcha_id, &payload.captcha) {
        return Err(ApiError::bad_request(INVALID_CAPTCHA));
    }

    let passwords = Passwords::standard();
    let Some(user) = state
        .user_repo
        .find_by_username(payload.username.trim())
        .await
        .map_err(|e| ApiError::internal("login failed", e))?
    else {
        passwords.verify_missing(&payload.pwd);
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    let verification = passwords
        .verify(&payload.pwd, &user.pw_hash, &user.salt)
        .map_err(|e| ApiError::internal("login failed", e))?;

    if !verification.ok {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    if verification.needs_rehash {
        // Best effort: the login itself already succeeded.
        match passwords.hash(&payload.pwd) {
            Ok(hashed) => {
                if let Err(e) = state
                    .user_repo
                    .update_password(user.id, &hashed.hash, &hashed.salt)
                    .await
                {
                    warn!(user_id = user.id, error = %e, "failed to upgrade password hash");
                } else {
                    info!(user_id = user.id, "password hash upgraded");
                }
            }
            Err(e) => warn!(user_id = user.id, error = %e, "could not rehash password"),
        }
    }

    let token = state
        .jwt
        .generate_token(user.id, &user.username)
        .map_err(|e| ApiError::internal("failed to issue token", e))?;

    info!(user_id = user.id, "user logged in");
    Ok(ApiResponse::ok(LoginData {
        id: user.id,
        username: user.username,
        token,
    }))
}
