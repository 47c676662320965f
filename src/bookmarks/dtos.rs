use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::{Bookmark, BookmarkWithTags, Tag};
use crate::repositories::BookmarkFilter;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Highest page whose row offset still fits in an `i64`.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;
const MAX_URL_LEN: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TagItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

impl From<Tag> for TagItem {
    fn from(tag: Tag) -> Self {
        Self {
            id: Some(tag.id),
            name: tag.name,
        }
    }
}

pub fn tag_names(tags: &[TagItem]) -> Vec<String> {
    tags.iter().map(|tag| tag.name.clone()).collect()
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookmarkListQuery {
    /// Substring matched against url, title, excerpt and content.
    pub keyword: Option<String>,
    /// Comma-separated tag names; a bookmark must carry all of them.
    pub tags: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl BookmarkListQuery {
    pub fn into_filter(self) -> Result<BookmarkFilter, String> {
        let page = self.page.ok_or_else(|| "page is required".to_string())?;
        if page < 1 {
            return Err("page must be at least 1".to_string());
        }
        if page > MAX_PAGE {
            return Err("page is too large".to_string());
        }

        let page_size = match self.page_size {
            None => DEFAULT_PAGE_SIZE,
            Some(size) if size < 1 => DEFAULT_PAGE_SIZE,
            Some(size) => size.min(MAX_PAGE_SIZE),
        };

        let keyword = self
            .keyword
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let tags = self
            .tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        Ok(BookmarkFilter {
            keyword,
            tags,
            page,
            page_size,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookmarkListItem {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub is_archive: bool,
    /// Unix seconds
    pub created_at: i64,
    /// Unix seconds
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagItem>,
}

impl From<BookmarkWithTags> for BookmarkListItem {
    fn from(row: BookmarkWithTags) -> Self {
        let BookmarkWithTags { bookmark, tags } = row;
        Self {
            id: bookmark.id,
            url: bookmark.url,
            title: bookmark.title,
            excerpt: bookmark.excerpt,
            author: bookmark.author,
            is_archive: bookmark.is_archive,
            created_at: bookmark.created_at.timestamp(),
            updated_at: bookmark.updated_at.timestamp(),
            tags: tags.into_iter().map(TagItem::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PageData<T> {
    pub rows: Vec<T>,
    pub total: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookmarkRequest {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub tags: Vec<TagItem>,
    #[serde(default)]
    pub create_archive: bool,
}

impl CreateBookmarkRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_url(&self.url)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookmarkRequest {
    pub id: i64,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub tags: Vec<TagItem>,
    #[serde(default)]
    pub create_archive: bool,
}

impl UpdateBookmarkRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.id < 1 {
            return Err("id is required".to_string());
        }
        validate_url(&self.url)
    }
}

fn validate_url(raw: &str) -> Result<(), String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("URL cannot be empty".to_string());
    }
    if raw.len() > MAX_URL_LEN {
        return Err("URL too long".to_string());
    }
    match url::Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(_) => Err("URL must use http or https".to_string()),
        Err(_) => Err("URL is not valid".to_string()),
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookmarkCreated {
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletedCount {
    pub deleted: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookmarkContentData {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub html: String,
    /// Unix seconds
    pub created_at: i64,
    /// Unix seconds
    pub update_at: i64,
}

impl From<Bookmark> for BookmarkContentData {
    fn from(bookmark: Bookmark) -> Self {
        Self {
            id: bookmark.id,
            url: bookmark.url,
            title: bookmark.title,
            html: bookmark.html,
            created_at: bookmark.created_at.timestamp(),
            update_at: bookmark.updated_at.timestamp(),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImportQuery {
    /// Add each entry's folder name as a tag.
    #[serde(default)]
    pub generate_tag: bool,
    /// Fetch readable content for every new entry.
    #[serde(default)]
    pub archive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<i64>, page_size: Option<i64>) -> BookmarkListQuery {
        BookmarkListQuery {
            keyword: None,
            tags: None,
            page,
            page_size,
        }
    }

    #[test]
    fn test_page_is_required_and_positive() {
        assert!(query(None, None).into_filter().is_err());
        assert!(query(Some(0), None).into_filter().is_err());
        assert!(query(Some(1), None).into_filter().is_ok());
    }

    #[test]
    fn test_huge_page_is_rejected() {
        assert!(query(Some(i64::MAX), None).into_filter().is_err());
        assert!(query(Some(i64::MAX / 10), Some(100)).into_filter().is_err());
        assert!(query(Some(MAX_PAGE + 1), Some(100)).into_filter().is_err());

        let last = query(Some(MAX_PAGE), Some(5000)).into_filter().unwrap();
        assert_eq!(last.page, MAX_PAGE);
        assert!(last.offset() >= 0);
    }

    #[test]
    fn test_page_size_defaults_and_caps() {
        assert_eq!(query(Some(1), None).into_filter().unwrap().page_size, 10);
        assert_eq!(query(Some(1), Some(0)).into_filter().unwrap().page_size, 10);
        assert_eq!(query(Some(1), Some(25)).into_filter().unwrap().page_size, 25);
        assert_eq!(query(Some(1), Some(5000)).into_filter().unwrap().page_size, 100);
    }

    #[test]
    fn test_tags_split_and_trimmed() {
        let filter = BookmarkListQuery {
            keyword: Some("  ".to_string()),
            tags: Some(" rust, ,web ,".to_string()),
            page: Some(2),
            page_size: None,
        }
        .into_filter()
        .unwrap();

        assert_eq!(filter.keyword, None);
        assert_eq!(filter.tags, vec!["rust", "web"]);
        assert_eq!(filter.page, 2);
    }

    #[test]
    fn test_create_request_url_validation() {
        let request = |url: &str| CreateBookmarkRequest {
            url: url.to_string(),
            title: String::new(),
            excerpt: String::new(),
            tags: vec![],
            create_archive: false,
        };

        assert!(request("https://example.com").validate().is_ok());
        assert!(request("").validate().is_err());
        assert!(request("example.com/no-scheme").validate().is_err());
        assert!(request("ftp://example.com/file").validate().is_err());
        assert!(request(&format!("https://example.com/{}", "a".repeat(2048))).validate().is_err());
    }

    #[test]
    fn test_tag_item_wire_shape() {
        let item: TagItem = serde_json::from_str(r#"{"name": "rust"}"#).unwrap();
        assert_eq!(item.id, None);
        assert_eq!(
            serde_json::to_string(&item).unwrap(),
            r#"{"name":"rust"}"#
        );
    }
}
