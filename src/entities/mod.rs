use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// --- Tables ---

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub pw_hash: String,
    pub salt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Bookmark {
    pub id: i64,
    pub url: String, // unique
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub content: String, // extracted plain text
    pub html: String,    // extracted, sanitized html
    pub is_archive: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, FromRow, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String, // unique
}

/// --- Derived rows ---

/// A tag together with the number of bookmarks referencing it.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TagWithCount {
    pub id: i64,
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkWithTags {
    pub bookmark: Bookmark,
    pub tags: Vec<Tag>,
}

/// Column values for inserting or replacing a bookmark.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBookmark {
    pub url: String,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub content: String,
    pub html: String,
    pub is_archive: bool,
    /// Overrides `created_at`/`updated_at`; imports carry the browser's timestamp.
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewBookmark {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            ..Default::default()
        }
    }
}
