use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::entities::NewBookmark;
use crate::extractor::{self, ExtractedContent};
use crate::fetcher::{FetchError, HttpFetcher};

/// Values the caller already has. Non-empty ones win over whatever the page says.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerFields {
    pub title: String,
    pub excerpt: String,
}

impl CallerFields {
    pub fn new(title: impl Into<String>, excerpt: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            excerpt: excerpt.into(),
        }
    }
}

/// Readable snapshot of a page, ready to store on a bookmark.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkContent {
    pub title: String,
    pub author: String,
    pub excerpt: String,
    pub content: String,
    pub html: String,
}

impl BookmarkContent {
    /// Nothing archivable: the URL stands in for the title.
    pub fn url_only(url: &str, caller: &CallerFields) -> Self {
        Self {
            title: pick(&caller.title, url),
            excerpt: caller.excerpt.clone(),
            ..Self::default()
        }
    }

    pub fn from_article(url: &str, article: ExtractedContent, caller: &CallerFields) -> Self {
        let extracted_title = pick(&article.title, url);
        Self {
            title: pick(&caller.title, &extracted_title),
            author: article.byline.unwrap_or_default(),
            excerpt: pick(&caller.excerpt, &article.excerpt),
            content: article.text,
            html: article.html,
        }
    }

    pub fn has_archive(&self) -> bool {
        !self.html.trim().is_empty()
    }

    pub fn apply_to(self, draft: &mut NewBookmark) {
        draft.is_archive = self.has_archive();
        draft.title = self.title;
        draft.author = self.author;
        draft.excerpt = self.excerpt;
        draft.content = self.content;
        draft.html = self.html;
    }
}

fn pick(preferred: &str, fallback: &str) -> String {
    let preferred = preferred.trim();
    if preferred.is_empty() {
        fallback.trim().to_string()
    } else {
        preferred.to_string()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Download `url` and turn it into readable content.
    ///
    /// Non-2xx and non-HTML answers are not errors: they yield a URL-titled,
    /// body-less result. Transport failures come back as `FetchError`.
    async fn fetch_content(
        &self,
        url: &str,
        caller: &CallerFields,
    ) -> Result<BookmarkContent, FetchError>;
}

pub struct ReadabilityFetcher {
    http: HttpFetcher,
}

impl ReadabilityFetcher {
    pub fn new(http: HttpFetcher) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ContentFetcher for ReadabilityFetcher {
    #[instrument(skip(self, caller))]
    async fn fetch_content(
        &self,
        url: &str,
        caller: &CallerFields,
    ) -> Result<BookmarkContent, FetchError> {
        let page = match self.http.fetch(url).await {
            Ok(page) => page,
            Err(err) if err.is_unarchivable_response() => {
                info!(error = %err, "nothing to archive");
                return Ok(BookmarkContent::url_only(url, caller));
            }
            Err(err) => return Err(err),
        };

        match extractor::extract(&page) {
            Some(mut article) => {
                if page.lossy {
                    debug!(encoding = page.encoding.name(), "page had bytes invalid in its charset");
                    if article.title.contains(char::REPLACEMENT_CHARACTER) {
                        article.title.clear();
                    }
                }
                Ok(BookmarkContent::from_article(url, article, caller))
            }
            None => {
                info!("no readable content found");
                Ok(BookmarkContent::url_only(url, caller))
            }
        }
    }
}
