use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use tracing::info;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    bookmarks::dtos::DeletedCount,
    repositories::is_unique_violation,
    response::{ApiError, ApiResponse, ApiResult},
    tags::dtos::{RenameTagRequest, TagListItem, TagListQuery},
};

const TAG_NOT_FOUND: &str = "tag not found";
const TAG_NAME_TAKEN: &str = "a tag with this name already exists";

#[utoipa::path(
    get,
    path = "/api/v1/tags",
    tag = "tags",
    params(TagListQuery),
    responses(
        (status = 200, description = "Tags with bookmark counts", body = Vec<TagListItem>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = []))
)]
pub async fn list_tags(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    query: Result<Query<TagListQuery>, QueryRejection>,
) -> ApiResult<Vec<TagListItem>> {
    let Query(query) = query?;

    let tags = state
        .tag_repo
        .list(&query.name)
        .await
        .map_err(|e| ApiError::internal("failed to list tags", e))?;

    Ok(ApiResponse::ok(tags.into_iter().map(TagListItem::from).collect()))
}

#[utoipa::path(
    put,
    path = "/api/v1/tag/{id}",
    tag = "tags",
    params(("id" = i64, Path, description = "Tag id")),
    request_body = RenameTagRequest,
    responses(
        (status = 200, description = "Tag renamed"),
        (status = 400, description = "Empty name"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Tag not found"),
        (status = 409, description = "Name held by another tag")
    ),
    security(("bearer" = []))
)]
pub async fn rename_tag(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RenameTagRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let name = payload.validated_name().map_err(ApiError::bad_request)?;

    let current = state
        .tag_repo
        .find_by_id(id)
        .await
        .map_err(|e| ApiError::internal("failed to rename tag", e))?
        .ok_or_else(|| ApiError::not_found(TAG_NOT_FOUND))?;
    if current.name == name {
        return Ok(ApiResponse::empty());
    }

    let holder = state
        .tag_repo
        .find_by_name(name)
        .await
        .map_err(|e| ApiError::internal("failed to rename tag", e))?;
    if holder.is_some_and(|other| other.id != id) {
        return Err(ApiError::conflict(TAG_NAME_TAKEN));
    }

    let renamed = state.tag_repo.rename(id, name).await.map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::conflict(TAG_NAME_TAKEN)
        } else {
            ApiError::internal("failed to rename tag", e)
        }
    })?;
    if !renamed {
        return Err(ApiError::not_found(TAG_NOT_FOUND));
    }

    info!(tag_id = id, from = %current.name, to = %name, "tag renamed");
    Ok(ApiResponse::empty())
}

#[utoipa::path(
    delete,
    path = "/api/v1/tag/{id}",
    tag = "tags",
    params(("id" = i64, Path, description = "Tag id")),
    responses(
        (status = 200, description = "Tag deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Tag not found")
    ),
    security(("bearer" = []))
)]
pub async fn delete_tag(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;

    let deleted = state
        .tag_repo
        .delete(id)
        .await
        .map_err(|e| ApiError::internal("failed to delete tag", e))?;
    if !deleted {
        return Err(ApiError::not_found(TAG_NOT_FOUND));
    }

    info!(tag_id = id, "tag deleted");
    Ok(ApiResponse::empty())
}

#[utoipa::path(
    delete,
    path = "/api/v1/tags/orphans",
    tag = "tags",
    responses(
        (status = 200, description = "Unused tags removed", body = DeletedCount),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer" = []))
)]
pub async fn prune_orphan_tags(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
) -> ApiResult<DeletedCount> {
    let deleted = state
        .tag_repo
        .delete_orphans()
        .await
        .map_err(|e| ApiError::internal("failed to prune tags", e))?;

    info!(deleted, "orphan tags pruned");
    Ok(ApiResponse::ok(DeletedCount { deleted }))
}
