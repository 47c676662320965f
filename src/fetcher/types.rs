use chrono::{DateTime, Utc};
use encoding_rs::Encoding;
use reqwest::StatusCode;
use url::Url;

/// An HTML page after redirects, decoded to UTF-8.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub url_final: Url,
    pub status: StatusCode,
    /// Lower-cased `Content-Type` header value.
    pub content_type: String,
    pub body_utf8: String,
    /// Encoding the body was decoded from.
    pub encoding: &'static Encoding,
    /// Some bytes were not valid in `encoding` and became U+FFFD.
    pub lossy: bool,
    pub fetched_at: DateTime<Utc>,
}

impl PageResponse {
    /// A UTF-8 page built in memory, for callers that already hold the markup.
    pub fn from_html(url_final: Url, html: impl Into<String>) -> Self {
        Self {
            url_final,
            status: StatusCode::OK,
            content_type: "text/html; charset=utf-8".to_string(),
            body_utf8: html.into(),
            encoding: encoding_rs::UTF_8,
            lossy: false,
            fetched_at: Utc::now(),
        }
    }
}
