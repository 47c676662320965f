use axum::{
    Json,
    extract::{
        Multipart, Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Instrument, info, instrument, warn};

use crate::{
    app_state::AppState,
    archive::{CallerFields, ContentFetcher},
    auth::AuthenticatedUser,
    bookmarks::dtos::{
        BookmarkContentData, BookmarkCreated, BookmarkListItem, BookmarkListQuery,
        CreateBookmarkRequest, DeletedCount, ImportQuery, PageData, UpdateBookmarkRequest,
        tag_names,
    },
    entities::NewBookmark,
    importer::{ImportEvent, ImportOptions, Importer, parse_netscape_bookmarks},
    repositories::is_unique_violation,
    response::{ApiError, ApiResponse, ApiResult},
};

const UPLOAD_FIELD: &str = "bookmark_file";
const EVENT_BUFFER: usize = 32;

/// Title the caller typed, or the URL when they left it blank.
fn title_or_url(title: &str, url: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        url.to_string()
    } else {
        title.to_string()
    }
}

/// Merge fetched content into `draft`. Failures are logged and leave it untouched.
async fn archive_into(fetcher: &dyn ContentFetcher, draft: &mut NewBookmark, caller: &CallerFields) {
    match fetcher.fetch_content(&draft.url, caller).await {
        Ok(content) => content.apply_to(draft),
        Err(e) => warn!(url = %draft.url, error = %e, "archive fetch failed, saving without content"),
    }
}

async fn resolve_tag_ids(state: &AppState, names: &[String]) -> Result<Vec<i64>, ApiError> {
    let tags = state
        .tag_repo
        .find_or_create(names)
        .await
        .map_err(|e| ApiError::internal("failed to create tags", e))?;
    Ok(tags.into_iter().map(|tag| tag.id).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/bookmarks",
    tag = "bookmarks",
    params(BookmarkListQuery),
    responses(
        (status = 200, description = "One page of bookmarks", body = PageData<BookmarkListItem>),
        (status = 400, description = "Invalid paging parameters"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = []))
)]
pub async fn list_bookmarks(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    query: Result<Query<BookmarkListQuery>, QueryRejection>,
) -> ApiResult<PageData<BookmarkListItem>> {
    let Query(query) = query?;
    let filter = query.into_filter().map_err(ApiError::bad_request)?;

    let (rows, total) = state
        .bookmark_repo
        .list(&filter)
        .await
        .map_err(|e| ApiError::internal("failed to list bookmarks", e))?;

    Ok(ApiResponse::ok(PageData {
        rows: rows.into_iter().map(BookmarkListItem::from).collect(),
        total,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookmark",
    tag = "bookmarks",
    request_body = CreateBookmarkRequest,
    responses(
        (status = 200, description = "Bookmark created", body = BookmarkCreated),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "URL already bookmarked")
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = auth_user.user_id))]
pub async fn create_bookmark(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateBookmarkRequest>, JsonRejection>,
) -> ApiResult<BookmarkCreated> {
    let Json(payload) = payload?;
    payload.validate().map_err(ApiError::bad_request)?;
    let url = payload.url.trim();

    let existing = state
        .bookmark_repo
        .find_by_url(url)
        .await
        .map_err(|e| ApiError::internal("failed to create bookmark", e))?;
    if existing.is_some() {
        return Err(ApiError::conflict("bookmark already exists"));
    }

    let tag_ids = resolve_tag_ids(&state, &tag_names(&payload.tags)).await?;

    let mut draft = NewBookmark::new(url, title_or_url(&payload.title, url));
    draft.excerpt = payload.excerpt.trim().to_string();

    if payload.create_archive {
        let caller = CallerFields::new(payload.title.trim(), payload.excerpt.trim());
        archive_into(state.content_fetcher.as_ref(), &mut draft, &caller).await;
    }

    let created = state
        .bookmark_repo
        .create(&draft, &tag_ids)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict("bookmark already exists")
            } else {
                ApiError::internal("failed to create bookmark", e)
            }
        })?;

    info!(bookmark_id = created.id, archived = created.is_archive, "bookmark created");
    Ok(ApiResponse::ok(BookmarkCreated { id: created.id }))
}

#[utoipa::path(
    put,
    path = "/api/v1/bookmarks",
    tag = "bookmarks",
    request_body = UpdateBookmarkRequest,
    responses(
        (status = 200, description = "Bookmark updated"),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Bookmark not found"),
        (status = 409, description = "URL belongs to another bookmark")
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = auth_user.user_id))]
pub async fn update_bookmark(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    payload: Result<Json<UpdateBookmarkRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(payload) = payload?;
    payload.validate().map_err(ApiError::bad_request)?;
    let url = payload.url.trim();

    let existing = state
        .bookmark_repo
        .find_by_id(payload.id)
        .await
        .map_err(|e| ApiError::internal("failed to update bookmark", e))?
        .ok_or_else(|| ApiError::not_found("bookmark not found"))?
        .bookmark;

    if url != existing.url {
        let holder = state
            .bookmark_repo
            .find_by_url(url)
            .await
            .map_err(|e| ApiError::internal("failed to update bookmark", e))?;
        if holder.is_some_and(|other| other.id != existing.id) {
            return Err(ApiError::conflict("another bookmark already uses this URL"));
        }
    }

    let tag_ids = resolve_tag_ids(&state, &tag_names(&payload.tags)).await?;

    // Without a fresh fetch the stored archive stays as it is.
    let mut draft = NewBookmark {
        url: url.to_string(),
        title: title_or_url(&payload.title, url),
        excerpt: payload.excerpt.trim().to_string(),
        author: payload.author.trim().to_string(),
        content: existing.content,
        html: existing.html,
        is_archive: existing.is_archive,
        timestamp: None,
    };

    if payload.create_archive {
        let caller = CallerFields::new(payload.title.trim(), payload.excerpt.trim());
        archive_into(state.content_fetcher.as_ref(), &mut draft, &caller).await;
        if !payload.author.trim().is_empty() {
            draft.author = payload.author.trim().to_string();
        }
    }

    let updated = state
        .bookmark_repo
        .update(payload.id, &draft, &tag_ids)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict("another bookmark already uses this URL")
            } else {
                ApiError::internal("failed to update bookmark", e)
            }
        })?;
    if !updated {
        return Err(ApiError::not_found("bookmark not found"));
    }

    info!(bookmark_id = payload.id, "bookmark updated");
    Ok(ApiResponse::empty())
}

#[utoipa::path(
    delete,
    path = "/api/v1/bookmark",
    tag = "bookmarks",
    request_body = Vec<i64>,
    responses(
        (status = 200, description = "Bookmarks deleted", body = DeletedCount),
        (status = 400, description = "Empty id list"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = []))
)]
pub async fn delete_bookmarks(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    payload: Result<Json<Vec<i64>>, JsonRejection>,
) -> ApiResult<DeletedCount> {
    let Json(mut ids) = payload?;
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Err(ApiError::bad_request("no bookmark ids given"));
    }

    let deleted = state
        .bookmark_repo
        .delete(&ids)
        .await
        .map_err(|e| ApiError::internal("failed to delete bookmarks", e))?;

    info!(requested = ids.len(), deleted, "bookmarks deleted");
    Ok(ApiResponse::ok(DeletedCount { deleted }))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookmark/{id}/content",
    tag = "bookmarks",
    params(("id" = i64, Path, description = "Bookmark id")),
    responses(
        (status = 200, description = "Archived content", body = BookmarkContentData),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Bookmark not found")
    ),
    security(("bearer" = []))
)]
pub async fn bookmark_content(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<BookmarkContentData> {
    let Path(id) = id?;

    let found = state
        .bookmark_repo
        .find_by_id(id)
        .await
        .map_err(|e| ApiError::internal("failed to load bookmark", e))?
        .ok_or_else(|| ApiError::not_found("bookmark not found"))?;

    Ok(ApiResponse::ok(BookmarkContentData::from(found.bookmark)))
}

/// Pull the `bookmark_file` upload out of the form.
async fn read_upload(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_ascii_lowercase();
        if !file_name.ends_with(".html") {
            return Err(ApiError::bad_request("bookmark file must be an .html export"));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        return Ok(bytes.to_vec());
    }

    Err(ApiError::bad_request("missing bookmark_file upload"))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookmarks/import",
    tag = "bookmarks",
    params(ImportQuery),
    request_body(
        content = Vec<u8>,
        content_type = "multipart/form-data",
        description = "`bookmark_file`: Netscape bookmark export (.html)"
    ),
    responses(
        (status = 200, description = "Progress events", content_type = "text/event-stream", body = ImportEvent),
        (status = 400, description = "Missing, misnamed or empty upload"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = []))
)]
pub async fn import_bookmarks(
    auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    query: Result<Query<ImportQuery>, QueryRejection>,
    mut multipart: Multipart,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let Query(query) = query?;
    let upload = read_upload(&mut multipart).await?;

    let entries = parse_netscape_bookmarks(&upload, query.generate_tag);
    if entries.is_empty() {
        return Err(ApiError::bad_request("no bookmarks found in file"));
    }
    info!(
        user_id = auth_user.user_id,
        entries = entries.len(),
        generate_tag = query.generate_tag,
        archive = query.archive,
        "starting bookmark import"
    );

    let importer = Importer::new(
        state.bookmark_repo.clone(),
        state.tag_repo.clone(),
        state.content_fetcher.clone(),
        ImportOptions {
            archive: query.archive,
        },
    );

    let (tx, rx) = mpsc::channel::<ImportEvent>(EVENT_BUFFER);
    tokio::spawn(
        async move {
            importer.run(entries, tx).await;
        }
        .in_current_span(),
    );

    let stream = ReceiverStream::new(rx).map(|event| Event::default().json_data(event));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
