use readability::extractor;
use scraper::{Html, Selector};
use url::Url;

use crate::extractor::model::ReadabilityResult;

pub fn extract(html: &str, url: &Url) -> Option<ReadabilityResult> {
    let document = Html::parse_document(html);
    let byline = extract_byline(&document);
    let description = extract_description(&document);

    // Try readability first
    if let Ok(article) = extractor::extract(&mut html.as_bytes(), url)
        && !article.text.trim().is_empty()
    {
        return Some(ReadabilityResult {
            title: article.title,
            byline,
            description,
            text: article.text,
            html: article.content,
        });
    }

    fallback_extract(&document, byline, description)
}

fn first_meta_content(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        let selector = Selector::parse(selector).ok()?;
        document
            .select(&selector)
            .filter_map(|element| element.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())
            .map(str::to_string)
    })
}

fn extract_byline(document: &Html) -> Option<String> {
    if let Some(author) = first_meta_content(
        document,
        &[
            "meta[name='author']",
            "meta[property='article:author']",
            "meta[name='twitter:creator']",
        ],
    ) {
        return Some(author);
    }

    let selector = Selector::parse("[rel='author'], .byline, .author").ok()?;
    document
        .select(&selector)
        .map(|element| element.text().collect::<Vec<_>>().join(" "))
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|text| !text.is_empty())
}

fn extract_description(document: &Html) -> Option<String> {
    first_meta_content(
        document,
        &[
            "meta[name='description']",
            "meta[property='og:description']",
            "meta[name='twitter:description']",
        ],
    )
}

fn fallback_extract(
    document: &Html,
    byline: Option<String>,
    description: Option<String>,
) -> Option<ReadabilityResult> {
    let title = extract_title(document)?;

    // Extract main content using basic heuristics
    let (text, html_content) = extract_main_content(document);

    if text.trim().is_empty() {
        return None;
    }

    Some(ReadabilityResult {
        title,
        byline,
        description,
        text,
        html: html_content,
    })
}

fn extract_title(document: &Html) -> Option<String> {
    if let Some(title) = first_meta_content(document, &["meta[property='og:title']"]) {
        return Some(title);
    }

    for selector in ["title", "h1"] {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        if let Some(title) = document
            .select(&selector)
            .map(|element| element.text().collect::<String>().trim().to_string())
            .find(|title| !title.is_empty())
        {
            return Some(title);
        }
    }

    None
}

fn extract_main_content(document: &Html) -> (String, String) {
    let content_selectors = [
        "article",
        "main",
        "[role='main']",
        ".content",
        ".post",
        ".article",
        "#content",
        "#main",
        ".entry-content",
    ];

    for selector_str in content_selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            for element in document.select(&selector) {
                let text = element.text().collect::<String>();
                if text.trim().len() > 100 {
                    return (text, element.html());
                }
            }
        }
    }

    // Last resort: the whole body
    if let Ok(body_selector) = Selector::parse("body")
        && let Some(body) = document.select(&body_selector).next()
    {
        return (body.text().collect::<String>(), body.html());
    }

    (String::new(), String::new())
}
