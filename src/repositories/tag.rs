use crate::entities::{Tag, TagWithCount};
use crate::repositories::escape_like;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagRepositoryTrait: Send + Sync {
    /// Tags with their bookmark counts, filtered by a name substring (empty = all).
    async fn list(&self, name: &str) -> Result<Vec<TagWithCount>>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Tag>>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>>;
    /// Resolves every name to a tag row, creating the missing ones. Safe to
    /// call repeatedly with the same names.
    async fn find_or_create(&self, names: &[String]) -> Result<Vec<Tag>>;
    async fn rename(&self, id: i64, name: &str) -> Result<bool>;
    async fn delete(&self, id: i64) -> Result<bool>;
    /// Removes tags no bookmark references any more; returns how many went.
    async fn delete_orphans(&self) -> Result<u64>;
}

/// Trims names, drops empties and keeps only the first of any repeated name.
pub fn normalize_tag_names(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if name.is_empty() || out.iter().any(|n| n == name) {
            continue;
        }
        out.push(name.to_string());
    }
    out
}

#[derive(Clone)]
pub struct TagRepository {
    pool: Pool<Postgres>,
}

impl TagRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepositoryTrait for TagRepository {
    async fn list(&self, name: &str) -> Result<Vec<TagWithCount>> {
        let tags = sqlx::query_as::<_, TagWithCount>(
            r#"
            SELECT t.id, t.name, COUNT(bt.bookmark_id) AS count
            FROM tags t
            LEFT JOIN bookmark_tags bt ON bt.tag_id = t.id
            WHERE $1 = '' OR t.name ILIKE '%' || $1 || '%'
            GROUP BY t.id, t.name
            ORDER BY t.name ASC
            "#,
        )
        .bind(escape_like(name.trim()))
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tag)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tag)
    }

    async fn find_or_create(&self, names: &[String]) -> Result<Vec<Tag>> {
        let mut tags = Vec::new();
        for name in normalize_tag_names(names) {
            // The no-op update makes RETURNING yield the existing row on conflict.
            let tag = sqlx::query_as::<_, Tag>(
                r#"
                INSERT INTO tags (name)
                VALUES ($1)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id, name
                "#,
            )
            .bind(&name)
            .fetch_one(&self.pool)
            .await?;
            tags.push(tag);
        }
        Ok(tags)
    }

    async fn rename(&self, id: i64, name: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE tags SET name = $1 WHERE id = $2")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_orphans(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM tags t
            WHERE NOT EXISTS (SELECT 1 FROM bookmark_tags bt WHERE bt.tag_id = t.id)
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
