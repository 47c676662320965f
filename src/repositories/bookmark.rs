use std::collections::HashMap;

use crate::entities::{Bookmark, BookmarkWithTags, NewBookmark, Tag};
use crate::repositories::{escape_like, tag::normalize_tag_names};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

const BOOKMARK_COLUMNS: &str =
    "b.id, b.url, b.title, b.excerpt, b.author, b.content, b.html, b.is_archive, b.created_at, b.updated_at";

/// Search and paging parameters for listing bookmarks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkFilter {
    /// Case-insensitive substring over url, title, excerpt and content.
    pub keyword: Option<String>,
    /// Every listed tag must be attached to a matching bookmark.
    pub tags: Vec<String>,
    /// 1-based.
    pub page: i64,
    pub page_size: i64,
}

impl BookmarkFilter {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.page_size.max(0))
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookmarkRepositoryTrait: Send + Sync {
    /// One page of bookmarks plus the total number of matches.
    async fn list(&self, filter: &BookmarkFilter) -> Result<(Vec<BookmarkWithTags>, i64)>;
    async fn find_by_id(&self, id: i64) -> Result<Option<BookmarkWithTags>>;
    async fn find_by_url(&self, url: &str) -> Result<Option<Bookmark>>;
    /// Inserts the bookmark and its tag links in one transaction.
    async fn create(&self, bookmark: &NewBookmark, tag_ids: &[i64]) -> Result<Bookmark>;
    /// Replaces every column and the tag set; `false` when the id is unknown.
    async fn update(&self, id: i64, bookmark: &NewBookmark, tag_ids: &[i64]) -> Result<bool>;
    /// Deletes join rows and bookmarks atomically; returns deleted bookmarks.
    async fn delete(&self, ids: &[i64]) -> Result<u64>;
}

#[derive(Clone)]
pub struct BookmarkRepository {
    pool: Pool<Postgres>,
}

impl BookmarkRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn tags_for(&self, bookmark_ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>> {
        let rows = sqlx::query_as::<_, (i64, i64, String)>(
            r#"
            SELECT bt.bookmark_id, t.id, t.name
            FROM bookmark_tags bt
            JOIN tags t ON t.id = bt.tag_id
            WHERE bt.bookmark_id = ANY($1)
            ORDER BY t.name ASC
            "#,
        )
        .bind(bookmark_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_bookmark: HashMap<i64, Vec<Tag>> = HashMap::new();
        for (bookmark_id, id, name) in rows {
            by_bookmark.entry(bookmark_id).or_default().push(Tag { id, name });
        }
        Ok(by_bookmark)
    }

    async fn attach_tags(&self, bookmarks: Vec<Bookmark>) -> Result<Vec<BookmarkWithTags>> {
        let ids: Vec<i64> = bookmarks.iter().map(|b| b.id).collect();
        let mut tags = if ids.is_empty() {
            HashMap::new()
        } else {
            self.tags_for(&ids).await?
        };

        Ok(bookmarks
            .into_iter()
            .map(|bookmark| BookmarkWithTags {
                tags: tags.remove(&bookmark.id).unwrap_or_default(),
                bookmark,
            })
            .collect())
    }
}

/// Builds `<select> FROM bookmarks b WHERE ...` with the filter's conditions bound.
fn filtered_query(select: &str, filter: &BookmarkFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(select);
    qb.push(" FROM bookmarks b WHERE TRUE");

    if let Some(keyword) = filter
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
    {
        let pattern = format!("%{}%", escape_like(keyword));
        qb.push(" AND (");
        for (i, column) in ["b.url", "b.title", "b.excerpt", "b.content"].iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(*column).push(" ILIKE ").push_bind(pattern.clone());
        }
        qb.push(")");
    }

    let tags = normalize_tag_names(&filter.tags);
    if !tags.is_empty() {
        let wanted = tags.len() as i64;
        qb.push(
            " AND b.id IN (SELECT bt.bookmark_id FROM bookmark_tags bt \
             JOIN tags t ON t.id = bt.tag_id WHERE t.name = ANY(",
        )
        .push_bind(tags)
        .push(") GROUP BY bt.bookmark_id HAVING COUNT(DISTINCT t.id) = ")
        .push_bind(wanted)
        .push(")");
    }

    qb
}

async fn insert_tag_links(
    tx: &mut Transaction<'_, Postgres>,
    bookmark_id: i64,
    tag_ids: &[i64],
) -> Result<()> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        r#"
        INSERT INTO bookmark_tags (bookmark_id, tag_id)
        SELECT $1, UNNEST($2::BIGINT[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(bookmark_id)
    .bind(tag_ids)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl BookmarkRepositoryTrait for BookmarkRepository {
    async fn list(&self, filter: &BookmarkFilter) -> Result<(Vec<BookmarkWithTags>, i64)> {
        let mut count_qb = filtered_query("SELECT COUNT(*)", filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = filtered_query(&format!("SELECT {BOOKMARK_COLUMNS}"), filter);
        qb.push(" ORDER BY b.created_at DESC, b.id DESC LIMIT ")
            .push_bind(filter.page_size)
            .push(" OFFSET ")
            .push_bind(filter.offset());
        let bookmarks: Vec<Bookmark> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok((self.attach_tags(bookmarks).await?, total))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<BookmarkWithTags>> {
        let bookmark = sqlx::query_as::<_, Bookmark>(&format!(
            "SELECT {BOOKMARK_COLUMNS} FROM bookmarks b WHERE b.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match bookmark {
            Some(bookmark) => Ok(self.attach_tags(vec![bookmark]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Bookmark>> {
        let bookmark = sqlx::query_as::<_, Bookmark>(&format!(
            "SELECT {BOOKMARK_COLUMNS} FROM bookmarks b WHERE b.url = $1"
        ))
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(bookmark)
    }

    async fn create(&self, bookmark: &NewBookmark, tag_ids: &[i64]) -> Result<Bookmark> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Bookmark>(
            r#"
            INSERT INTO bookmarks
                  (url, title, excerpt, author, content, html, is_archive, created_at, updated_at)
            VALUES ($1,  $2,    $3,      $4,     $5,      $6,   $7,
                    COALESCE($8, now()), COALESCE($8, now()))
            RETURNING id, url, title, excerpt, author, content, html, is_archive, created_at, updated_at
            "#,
        )
        .bind(&bookmark.url)
        .bind(&bookmark.title)
        .bind(&bookmark.excerpt)
        .bind(&bookmark.author)
        .bind(&bookmark.content)
        .bind(&bookmark.html)
        .bind(bookmark.is_archive)
        .bind(bookmark.timestamp)
        .fetch_one(&mut *tx)
        .await?;

        insert_tag_links(&mut tx, created.id, tag_ids).await?;
        tx.commit().await?;

        Ok(created)
    }

    async fn update(&self, id: i64, bookmark: &NewBookmark, tag_ids: &[i64]) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE bookmarks
            SET url        = $1,
                title      = $2,
                excerpt    = $3,
                author     = $4,
                content    = $5,
                html       = $6,
                is_archive = $7,
                updated_at = COALESCE($8, now())
            WHERE id = $9
            "#,
        )
        .bind(&bookmark.url)
        .bind(&bookmark.title)
        .bind(&bookmark.excerpt)
        .bind(&bookmark.author)
        .bind(&bookmark.content)
        .bind(&bookmark.html)
        .bind(bookmark.is_archive)
        .bind(bookmark.timestamp)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM bookmark_tags WHERE bookmark_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_tag_links(&mut tx, id, tag_ids).await?;
        tx.commit().await?;

        Ok(true)
    }

    async fn delete(&self, ids: &[i64]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM bookmark_tags WHERE bookmark_id = ANY($1)")
            .bind(ids)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM bookmarks WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }
}
