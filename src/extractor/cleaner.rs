use ammonia::{Builder, UrlRelative};
use url::Url;

use crate::extractor::model::{ReadabilityResult, normalize_whitespace};

/// Strip scripts, styles and unsafe attributes, and make relative links absolute.
pub fn sanitize_and_resolve_links(result: &mut ReadabilityResult, base_url: &Url) {
    result.html = Builder::default()
        .url_relative(UrlRelative::RewriteWithBase(base_url.clone()))
        .clean(&result.html)
        .to_string();

    result.text = normalize_whitespace(&result.text);
    result.title = result.title.split_whitespace().collect::<Vec<_>>().join(" ");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with_html(html: &str) -> ReadabilityResult {
        ReadabilityResult {
            title: "Test".to_string(),
            byline: None,
            description: None,
            text: "Hello world".to_string(),
            html: html.to_string(),
        }
    }

    #[test]
    fn test_sanitize_removes_dangerous_elements() {
        let mut result = result_with_html(
            r#"<p>Hello world</p><script>alert('xss')</script><style>body{color:red}</style>"#,
        );

        let base_url = Url::parse("https://example.com").unwrap();
        sanitize_and_resolve_links(&mut result, &base_url);

        assert!(!result.html.contains("<script"));
        assert!(!result.html.contains("<style"));
        assert!(result.html.contains("<p>Hello world</p>"));
    }

    #[test]
    fn test_resolve_relative_links() {
        let mut result = result_with_html(
            r#"<p><a href="/page">Click here</a></p><img src="image.jpg" alt="test">"#,
        );

        let base_url = Url::parse("https://example.com/article/").unwrap();
        sanitize_and_resolve_links(&mut result, &base_url);

        assert!(result.html.contains("https://example.com/page"));
        assert!(result.html.contains("https://example.com/article/image.jpg"));
    }

    #[test]
    fn test_title_whitespace_collapsed() {
        let mut result = result_with_html("<p>x</p>");
        result.title = "  A\n   spaced\ttitle ".to_string();

        let base_url = Url::parse("https://example.com").unwrap();
        sanitize_and_resolve_links(&mut result, &base_url);

        assert_eq!(result.title, "A spaced title");
    }

    #[test]
    fn test_normalize_whitespace() {
        let text = "  Hello    world  \n\n\n  Test  ";
        let normalized = normalize_whitespace(text);
        // Newlines survive, runs of spaces do not
        assert_eq!(normalized, "Hello world \n\n Test");
    }
}
