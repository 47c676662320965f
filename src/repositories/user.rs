use crate::entities::User;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn create(&self, username: &str, pw_hash: &str, salt: &str) -> Result<User>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn update_password(&self, id: i64, pw_hash: &str, salt: &str) -> Result<bool>;
    async fn count(&self) -> Result<i64>;
}

#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn create(&self, username: &str, pw_hash: &str, salt: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, pw_hash, salt)
            VALUES ($1, $2, $3)
            RETURNING id, username, pw_hash, salt, created_at, updated_at
            "#,
        )
        .bind(username)
        .bind(pw_hash)
        .bind(salt)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, pw_hash, salt, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, pw_hash, salt, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_password(&self, id: i64, pw_hash: &str, salt: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET pw_hash = $1, salt = $2, updated_at = now()
            WHERE id = $3
            "#,
        )
        .bind(pw_hash)
        .bind(salt)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{setup_test_db, unique};

    #[tokio::test]
    async fn test_create_and_find_user() {
        let Some(pool) = setup_test_db().await else {
            return; // Skip test if database not available
        };
        let repo = UserRepository::new(pool);
        let username = unique("alice");

        let created = repo.create(&username, "hash", "salt").await.unwrap();
        assert_eq!(created.username, username);

        let by_name = repo.find_by_username(&username).await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        let by_id = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, username);

        assert!(repo.find_by_username("nobody-here").await.unwrap().is_none());
        assert!(repo.count().await.unwrap() >= 1);
    }

    #[tokio::test]
    async fn test_update_password() {
        let Some(pool) = setup_test_db().await else {
            return;
        };
        let repo = UserRepository::new(pool);
        let user = repo.create(&unique("bob"), "old", "s1").await.unwrap();

        assert!(repo.update_password(user.id, "new", "s2").await.unwrap());
        let reloaded = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.pw_hash, "new");
        assert_eq!(reloaded.salt, "s2");

        assert!(!repo.update_password(-1, "x", "y").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let Some(pool) = setup_test_db().await else {
            return;
        };
        let repo = UserRepository::new(pool);
        let username = unique("carol");
        repo.create(&username, "h", "s").await.unwrap();
        assert!(repo.create(&username, "h", "s").await.is_err());
    }
}
