use crate::fetcher::types::PageResponse;
use chrono::Utc;
use encoding_rs::Encoding;
use regex::Regex;
use reqwest::StatusCode;
use std::sync::LazyLock;
use tracing::warn;
use url::Url;

const SNIFF_LEN: usize = 4096;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

static META_HTTP_EQUIV_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?http-equiv\s*=\s*["']?content-type["']?[^>]*?content\s*=\s*["']?[^"'>]*?charset\s*=\s*([^"'\s;/>]+)"#).unwrap()
});

pub fn process_response(
    url_final: Url,
    status: StatusCode,
    content_type: String,
    body_bytes: &[u8],
) -> PageResponse {
    let encoding = detect_encoding(&content_type, body_bytes);
    let (body_utf8, lossy) = decode_to_utf8(body_bytes, encoding);

    PageResponse {
        url_final,
        status,
        content_type,
        body_utf8,
        encoding,
        lossy,
        fetched_at: Utc::now(),
    }
}

fn label_encoding(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = regex.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}

/// Header charset, then `<meta>` declarations in the first 4KB, then a heuristic guess.
fn detect_encoding(content_type: &str, body_bytes: &[u8]) -> &'static Encoding {
    if let Some(encoding) = label_encoding(&CHARSET_REGEX, content_type) {
        return encoding;
    }

    let search_bytes = &body_bytes[..body_bytes.len().min(SNIFF_LEN)];
    let search_str = String::from_utf8_lossy(search_bytes);

    if let Some(encoding) = label_encoding(&META_CHARSET_REGEX, &search_str)
        .or_else(|| label_encoding(&META_HTTP_EQUIV_REGEX, &search_str))
    {
        return encoding;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(search_bytes, false);
    detector.guess(None, true)
}

/// Lossy: a page with a few bad bytes is still worth archiving.
fn decode_to_utf8(body_bytes: &[u8], encoding: &'static Encoding) -> (String, bool) {
    let (decoded, used, had_errors) = encoding.decode(body_bytes);
    if had_errors {
        warn!(encoding = used.name(), "page contained malformed byte sequences");
    }
    (decoded.into_owned(), had_errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_charset_from_content_type() {
        let content_type = "text/html; charset=utf-8";
        let body = b"<html><head><title>Test</title></head></html>";

        let encoding = detect_encoding(content_type, body);
        assert_eq!(encoding, encoding_rs::UTF_8);
    }

    #[test]
    fn test_detect_charset_from_meta_tag() {
        let content_type = "text/html";
        let body = b"<html><head><meta charset=\"iso-8859-1\"><title>Test</title></head></html>";

        // ISO-8859-1 maps to windows-1252 in encoding_rs
        let encoding = detect_encoding(content_type, body);
        assert_eq!(encoding, encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn test_detect_charset_from_meta_http_equiv() {
        let content_type = "text/html";
        let body = b"<html><head><meta http-equiv=\"Content-Type\" content=\"text/html; charset=windows-1252\"><title>Test</title></head></html>";

        let encoding = detect_encoding(content_type, body);
        assert_eq!(encoding, encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn test_decode_utf8() {
        let body = "Hello, 世界!".as_bytes();
        assert_eq!(
            decode_to_utf8(body, encoding_rs::UTF_8),
            ("Hello, 世界!".to_string(), false)
        );
    }

    #[test]
    fn test_decode_is_lossy_on_bad_bytes() {
        let body = b"caf\xff!";
        assert_eq!(
            decode_to_utf8(body, encoding_rs::UTF_8),
            ("caf\u{FFFD}!".to_string(), true)
        );
    }

    #[test]
    fn test_decode_latin1_page() {
        let body = b"<html><head><meta charset=\"iso-8859-1\"></head><body>caf\xe9</body></html>";
        let page = process_response(
            Url::parse("https://example.com/").unwrap(),
            StatusCode::OK,
            "text/html".to_string(),
            body,
        );
        assert!(page.body_utf8.contains("café"));
        assert_eq!(page.encoding, encoding_rs::WINDOWS_1252);
        assert!(!page.lossy);
    }
}
