pub mod cleaner;
pub mod model;
pub mod reader;

#[cfg(test)]
mod tests;

pub use model::ExtractedContent;

use crate::fetcher::types::PageResponse;

/// Pull the readable article out of a downloaded page.
///
/// Returns `None` when neither readability nor the heuristic fallback finds any text.
pub fn extract(resp: &PageResponse) -> Option<ExtractedContent> {
    let mut result = reader::extract(&resp.body_utf8, &resp.url_final)?;

    cleaner::sanitize_and_resolve_links(&mut result, &resp.url_final);

    let excerpt = result
        .description
        .take()
        .filter(|description| !description.trim().is_empty())
        .unwrap_or_else(|| model::first_paragraph(&result.text));

    Some(ExtractedContent {
        url: resp.url_final.clone(),
        title: result.title,
        byline: result.byline,
        excerpt,
        text: result.text,
        html: result.html,
        fetched_at: resp.fetched_at,
    })
}
