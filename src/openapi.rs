use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{
    auth::dtos::{CaptchaData, LoginData, LoginRequest},
    bookmarks::dtos::{
        BookmarkContentData, BookmarkCreated, BookmarkListItem, CreateBookmarkRequest,
        DeletedCount, TagItem, UpdateBookmarkRequest,
    },
    health::HealthData,
    importer::{ImportEvent, ImportEventKind},
    tags::dtos::{RenameTagRequest, TagListItem},
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "bkms", description = "Personal bookmark manager API"),
    paths(
        crate::health::health_check,
        crate::auth::handlers::captcha,
        crate::auth::handlers::login,
        crate::bookmarks::handlers::list_bookmarks,
        crate::bookmarks::handlers::create_bookmark,
        crate::bookmarks::handlers::update_bookmark,
        crate::bookmarks::handlers::delete_bookmarks,
        crate::bookmarks::handlers::bookmark_content,
        crate::bookmarks::handlers::import_bookmarks,
        crate::tags::handlers::list_tags,
        crate::tags::handlers::rename_tag,
        crate::tags::handlers::delete_tag,
        crate::tags::handlers::prune_orphan_tags,
    ),
    components(schemas(
        HealthData,
        LoginRequest,
        LoginData,
        CaptchaData,
        TagItem,
        BookmarkListItem,
        CreateBookmarkRequest,
        UpdateBookmarkRequest,
        BookmarkCreated,
        DeletedCount,
        BookmarkContentData,
        ImportEvent,
        ImportEventKind,
        TagListItem,
        RenameTagRequest,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Captcha and login"),
        (name = "bookmarks", description = "Bookmark CRUD, content and import"),
        (name = "tags", description = "Tag maintenance")
    )
)]
pub struct ApiDoc;
