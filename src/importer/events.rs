use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImportEventKind {
    Progress,
    Success,
    Error,
    Complete,
}

/// One line of the import progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImportEvent {
    #[serde(rename = "type")]
    pub kind: ImportEventKind,
    pub message: String,
    pub current: usize,
    pub total: usize,
    pub url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub total: usize,
    pub success: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl ImportEvent {
    fn new(kind: ImportEventKind, message: String, current: usize, total: usize, url: &str) -> Self {
        Self {
            kind,
            message,
            current,
            total,
            url: url.to_string(),
        }
    }

    pub fn started(total: usize) -> Self {
        Self::new(
            ImportEventKind::Progress,
            format!("found {total} bookmarks, starting import"),
            0,
            total,
            "",
        )
    }

    pub fn skipped(current: usize, total: usize, url: &str) -> Self {
        Self::new(
            ImportEventKind::Progress,
            format!("skipped duplicate: {url}"),
            current,
            total,
            url,
        )
    }

    pub fn imported(current: usize, total: usize, url: &str, title: &str) -> Self {
        Self::new(
            ImportEventKind::Success,
            format!("imported: {title}"),
            current,
            total,
            url,
        )
    }

    pub fn failed(current: usize, total: usize, url: &str, reason: &str) -> Self {
        Self::new(
            ImportEventKind::Error,
            format!("{reason}: {url}"),
            current,
            total,
            url,
        )
    }

    pub fn completed(summary: &ImportSummary) -> Self {
        Self::new(
            ImportEventKind::Complete,
            format!(
                "import finished: {} imported, {} skipped, {} failed",
                summary.success, summary.skipped, summary.errors
            ),
            summary.total,
            summary.total,
            "",
        )
    }
}
