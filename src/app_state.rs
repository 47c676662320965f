use crate::{
    archive::{ContentFetcher, ReadabilityFetcher},
    auth::{captcha::CaptchaStore, jwt::JwtService},
    config::Config,
    fetcher::{DEFAULT_TIMEOUT, FetchError, HttpFetcher},
    repositories::{
        BookmarkRepository, BookmarkRepositoryTrait, TagRepository, TagRepositoryTrait,
        UserRepository, UserRepositoryTrait,
    },
};
use sqlx::{Pool, Postgres};
use std::sync::Arc;

/// Process-wide handles, built once in `main` and cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub user_repo: Arc<dyn UserRepositoryTrait>,
    pub bookmark_repo: Arc<dyn BookmarkRepositoryTrait>,
    pub tag_repo: Arc<dyn TagRepositoryTrait>,
    pub content_fetcher: Arc<dyn ContentFetcher>,
    pub jwt: Arc<JwtService>,
    pub captchas: CaptchaStore,
    pub db_pool: Pool<Postgres>,
}

impl AppState {
    pub fn new(config: Config, pool: Pool<Postgres>) -> Result<Self, FetchError> {
        let http = HttpFetcher::new(DEFAULT_TIMEOUT)?;
        let jwt = JwtService::new(config.jwt_secret(), config.jwt_expiry());

        Ok(Self {
            config: Arc::new(config),
            user_repo: Arc::new(UserRepository::new(pool.clone())),
            bookmark_repo: Arc::new(BookmarkRepository::new(pool.clone())),
            tag_repo: Arc::new(TagRepository::new(pool.clone())),
            content_fetcher: Arc::new(ReadabilityFetcher::new(http)),
            jwt: Arc::new(jwt),
            captchas: CaptchaStore::default(),
            db_pool: pool,
        })
    }
}

#[cfg(test)]
impl AppState {
    /// State backed by expectation-free mocks and a pool that never connects.
    /// Tests swap in the mocks they need.
    pub fn for_tests(config: Config) -> Self {
        use crate::archive::MockContentFetcher;
        use crate::repositories::{
            bookmark::MockBookmarkRepositoryTrait, tag::MockTagRepositoryTrait,
            user::MockUserRepositoryTrait,
        };

        let pool = Pool::<Postgres>::connect_lazy("postgres://dummy@localhost/dummy")
            .expect("lazy pool");
        let jwt = JwtService::new(config.jwt_secret(), config.jwt_expiry());

        Self {
            config: Arc::new(config),
            user_repo: Arc::new(MockUserRepositoryTrait::new()),
            bookmark_repo: Arc::new(MockBookmarkRepositoryTrait::new()),
            tag_repo: Arc::new(MockTagRepositoryTrait::new()),
            content_fetcher: Arc::new(MockContentFetcher::new()),
            jwt: Arc::new(jwt),
            captchas: CaptchaStore::default(),
            db_pool: pool,
        }
    }
}
