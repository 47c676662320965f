use std::fs;
use url::Url;

use crate::extractor::extract;
use crate::fetcher::PageResponse;

#[test]
fn test_extract_article() {
    let html = fs::read_to_string("src/extractor/tests/fixtures/article.html")
        .expect("Failed to read test fixture");

    let response = create_test_response(html, "https://example.com/article");
    let content = extract(&response).expect("article should extract");

    assert!(content.title.contains("Sample Article"));
    assert_eq!(content.byline.as_deref(), Some("Jane Reporter"));
    assert_eq!(
        content.excerpt,
        "A sample article used to exercise the archiver."
    );
    assert!(content.text.contains("first paragraph"));
    assert!(content.text.contains("second paragraph"));
    assert!(!content.html.contains("<script"));
    assert!(!content.html.contains("<style"));
}

#[test]
fn test_extract_blog_post() {
    let html = fs::read_to_string("src/extractor/tests/fixtures/blog.html")
        .expect("Failed to read test fixture");

    let response = create_test_response(html, "https://blog.example.com/post");
    let content = extract(&response).expect("blog post should extract");

    assert!(content.title.contains("How to Build Better Software"));
    assert_eq!(content.byline.as_deref(), Some("Sam Engineer"));
    assert!(content.text.contains("Building better software"));
    // No meta description, so the excerpt comes from the body text
    assert!(!content.excerpt.is_empty());
    assert!(content.excerpt.chars().count() <= 303);
}

#[test]
fn test_minimal_valid_content() {
    let html = format!(
        r#"<!DOCTYPE html><html><head><title>Valid Article</title></head><body><article><h1>Valid Article</h1><p>{}</p></article></body></html>"#,
        "This is a valid article with enough content to pass the minimum requirements for extraction. ".repeat(20)
    );

    let response = create_test_response(html, "https://example.com/valid");
    let content = extract(&response).expect("valid article should extract");

    assert!(content.title.contains("Valid Article"));
    assert!(content.text.contains("valid article"));
    assert_eq!(content.url.as_str(), "https://example.com/valid");
}

#[test]
fn test_page_without_text_yields_nothing() {
    let html = "<!DOCTYPE html><html><head></head><body></body></html>".to_string();

    let response = create_test_response(html, "https://example.com/blank");
    assert!(extract(&response).is_none());
}

fn create_test_response(html: String, url: &str) -> PageResponse {
    PageResponse::from_html(Url::parse(url).unwrap(), html)
}
