use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub pwd: String,
    pub captcha: String,
    pub captcha_id: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("username is required".to_string());
        }
        if self.pwd.is_empty() {
            return Err("password is required".to_string());
        }
        if self.pwd.len() > 512 {
            return Err("password too long".to_string());
        }
        if self.captcha.trim().is_empty() || self.captcha_id.trim().is_empty() {
            return Err("captcha is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginData {
    pub id: i64,
    pub username: String,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CaptchaData {
    /// `data:image/svg+xml;base64,...`
    pub captcha: String,
    pub captcha_id: String,
    /// Plaintext answer, only outside release mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha_str: Option<String>,
}
