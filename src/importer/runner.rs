use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::archive::{CallerFields, ContentFetcher};
use crate::entities::NewBookmark;
use crate::importer::events::{ImportEvent, ImportSummary};
use crate::importer::netscape::ParsedBookmark;
use crate::repositories::{BookmarkRepositoryTrait, TagRepositoryTrait};

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Fetch and store readable content for every new entry.
    pub archive: bool,
}

enum EntryOutcome {
    Duplicate,
    Imported { title: String },
    TagError,
    PersistenceError,
}

/// Forwards events to the stream until the client goes away, then keeps quiet.
struct EventSink {
    tx: mpsc::Sender<ImportEvent>,
    open: bool,
}

impl EventSink {
    async fn send(&mut self, event: ImportEvent) {
        if !self.open {
            return;
        }
        if self.tx.send(event).await.is_err() {
            debug!("import stream closed by client, continuing without events");
            self.open = false;
        }
    }
}

pub struct Importer {
    bookmarks: Arc<dyn BookmarkRepositoryTrait>,
    tags: Arc<dyn TagRepositoryTrait>,
    fetcher: Arc<dyn ContentFetcher>,
    options: ImportOptions,
}

impl Importer {
    pub fn new(
        bookmarks: Arc<dyn BookmarkRepositoryTrait>,
        tags: Arc<dyn TagRepositoryTrait>,
        fetcher: Arc<dyn ContentFetcher>,
        options: ImportOptions,
    ) -> Self {
        Self {
            bookmarks,
            tags,
            fetcher,
            options,
        }
    }

    /// Import `entries` in order, reporting progress on `events`.
    ///
    /// A failing entry is reported and the batch moves on.
    #[instrument(skip_all, fields(total = entries.len(), archive = self.options.archive))]
    pub async fn run(
        &self,
        entries: Vec<ParsedBookmark>,
        events: mpsc::Sender<ImportEvent>,
    ) -> ImportSummary {
        let total = entries.len();
        let mut sink = EventSink {
            tx: events,
            open: true,
        };
        let mut summary = ImportSummary {
            total,
            ..ImportSummary::default()
        };

        sink.send(ImportEvent::started(total)).await;

        for (index, entry) in entries.iter().enumerate() {
            let current = index + 1;
            let event = match self.import_one(entry).await {
                EntryOutcome::Duplicate => {
                    summary.skipped += 1;
                    ImportEvent::skipped(current, total, &entry.url)
                }
                EntryOutcome::Imported { title } => {
                    summary.success += 1;
                    ImportEvent::imported(current, total, &entry.url, &title)
                }
                EntryOutcome::TagError => {
                    summary.errors += 1;
                    ImportEvent::failed(current, total, &entry.url, "failed to create tags")
                }
                EntryOutcome::PersistenceError => {
                    summary.errors += 1;
                    ImportEvent::failed(current, total, &entry.url, "failed to save bookmark")
                }
            };
            sink.send(event).await;
        }

        sink.send(ImportEvent::completed(&summary)).await;
        info!(
            success = summary.success,
            skipped = summary.skipped,
            errors = summary.errors,
            "bookmark import finished"
        );
        summary
    }

    async fn import_one(&self, entry: &ParsedBookmark) -> EntryOutcome {
        match self.bookmarks.find_by_url(&entry.url).await {
            Ok(Some(_)) => return EntryOutcome::Duplicate,
            Ok(None) => {}
            Err(e) => {
                error!(url = %entry.url, error = %e, "duplicate check failed");
                return EntryOutcome::PersistenceError;
            }
        }

        let tags = match self.tags.find_or_create(&entry.tags).await {
            Ok(tags) => tags,
            Err(e) => {
                error!(url = %entry.url, error = %e, "tag resolution failed");
                return EntryOutcome::TagError;
            }
        };
        let tag_ids: Vec<i64> = tags.iter().map(|tag| tag.id).collect();

        let mut draft = NewBookmark::new(&entry.url, &entry.title);
        draft.timestamp = Some(entry.modified_at);

        if self.options.archive {
            // A URL standing in for a missing title should not shadow the page's own title.
            let caller_title = if entry.title == entry.url {
                ""
            } else {
                entry.title.as_str()
            };
            match self
                .fetcher
                .fetch_content(&entry.url, &CallerFields::new(caller_title, ""))
                .await
            {
                Ok(content) => content.apply_to(&mut draft),
                Err(e) => warn!(url = %entry.url, error = %e, "archive fetch failed, importing without content"),
            }
        }

        match self.bookmarks.create(&draft, &tag_ids).await {
            Ok(created) => EntryOutcome::Imported {
                title: created.title,
            },
            Err(e) => {
                error!(url = %entry.url, error = %e, "failed to save imported bookmark");
                EntryOutcome::PersistenceError
            }
        }
    }
}
