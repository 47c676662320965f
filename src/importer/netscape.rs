use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector, node::Element as ElementData};
use tracing::debug;

use crate::importer::url_clean::remove_utm_params;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dt > a").expect("static selector"));

/// One bookmark pulled out of a Netscape bookmark file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBookmark {
    pub url: String,
    pub title: String,
    pub tags: Vec<String>,
    /// Name of the folder (`<H3>`) that directly contains the entry.
    pub category: String,
    pub modified_at: DateTime<Utc>,
}

/// Parse a Netscape bookmark export (the format every browser writes).
///
/// Entries are deduplicated by their cleaned URL, first occurrence wins.
/// Entries whose URL does not parse as an absolute URL are skipped. With
/// `generate_tags`, the containing folder name is added as a tag.
pub fn parse_netscape_bookmarks(input: &[u8], generate_tags: bool) -> Vec<ParsedBookmark> {
    let html = String::from_utf8_lossy(input);
    let document = Html::parse_document(&html);

    let mut seen = HashSet::new();
    let mut bookmarks = Vec::new();

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let url = match remove_utm_params(href) {
            Ok(url) if is_bookmarkable(&url) => url,
            Ok(_) | Err(_) => {
                debug!(href, "skipping entry without a usable url");
                continue;
            }
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        let title = validate_title(&anchor.text().collect::<String>(), &url);
        let category = folder_name(anchor).unwrap_or_default();

        let mut tags = split_tags(anchor.value().attr("tags").unwrap_or_default());
        if generate_tags && !category.is_empty() && !tags.contains(&category) {
            tags.push(category.clone());
        }

        bookmarks.push(ParsedBookmark {
            modified_at: entry_timestamp(anchor.value()),
            url,
            title,
            tags,
            category,
        });
    }

    bookmarks
}

/// `javascript:`, `data:`, `place:` and friends have nothing to archive.
fn is_bookmarkable(url: &str) -> bool {
    url::Url::parse(url).is_ok_and(|u| !u.cannot_be_a_base())
}

/// Collapse whitespace; an empty or mis-decoded title becomes the URL.
fn validate_title(raw: &str, url: &str) -> String {
    let title = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() || title.contains(char::REPLACEMENT_CHARACTER) {
        url.to_string()
    } else {
        title
    }
}

fn split_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',') {
        let tag = tag.split_whitespace().collect::<Vec<_>>().join(" ");
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// `LAST_MODIFIED` when present, otherwise `ADD_DATE`, in unix seconds.
/// A chosen value that does not parse means now.
fn entry_timestamp(element: &ElementData) -> DateTime<Utc> {
    element
        .attr("last_modified")
        .or_else(|| element.attr("add_date"))
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
}

/// Browsers nest folders as `<DT><H3>name</H3><DL>...</DL>`, so the
/// heading is a sibling of the list that holds the entry.
fn folder_name(anchor: ElementRef<'_>) -> Option<String> {
    let list = anchor.parent()?.parent()?;
    let container = list.parent()?;
    let heading = container
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "h3")?;

    let name = heading.text().collect::<Vec<_>>().join(" ");
    let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
    (!name.is_empty()).then_some(name)
}
