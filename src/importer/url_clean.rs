use url::Url;

pub const UTM_PARAMS: [&str; 6] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "utm_name",
];

fn is_tracking_param(key: &str) -> bool {
    UTM_PARAMS.contains(&key)
}

/// Parse `raw` and drop the `utm_*` tracking parameters, keeping every
/// other parameter in its original order.
pub fn remove_utm_params(raw: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(raw.trim())?;

    let has_tracking = url.query_pairs().any(|(key, _)| is_tracking_param(&key));
    if has_tracking {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    } else if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_all_tracking_params() {
        let cleaned = remove_utm_params(
            "https://example.com/post?utm_source=x&utm_medium=y&utm_campaign=z&utm_term=a&utm_content=b&utm_name=c",
        )
        .unwrap();
        assert_eq!(cleaned, "https://example.com/post");
    }

    #[test]
    fn test_keeps_other_params_in_order() {
        let cleaned =
            remove_utm_params("https://example.com/?b=2&utm_source=news&a=1&utm_medium=mail")
                .unwrap();
        assert_eq!(cleaned, "https://example.com/?b=2&a=1");
    }

    #[test]
    fn test_untracked_url_unchanged() {
        let raw = "https://example.com/search?q=rust%20lang&page=2";
        assert_eq!(remove_utm_params(raw).unwrap(), raw);
    }

    #[test]
    fn test_keeps_fragment() {
        let cleaned = remove_utm_params("https://example.com/doc?utm_source=x#section").unwrap();
        assert_eq!(cleaned, "https://example.com/doc#section");
    }

    #[test]
    fn test_relative_url_is_rejected() {
        assert!(remove_utm_params("/just/a/path").is_err());
        assert!(remove_utm_params("").is_err());
    }

    #[test]
    fn test_idempotent() {
        let once = remove_utm_params("https://example.com/?x=1&utm_name=9").unwrap();
        assert_eq!(remove_utm_params(&once).unwrap(), once);
    }
}
