use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::TagWithCount;

const MAX_TAG_NAME_LEN: usize = 250;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TagListQuery {
    /// Case-insensitive substring of the tag name.
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TagListItem {
    pub id: i64,
    pub name: String,
    /// Number of bookmarks carrying the tag.
    pub count: i64,
}

impl From<TagWithCount> for TagListItem {
    fn from(tag: TagWithCount) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            count: tag.count,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenameTagRequest {
    pub name: String,
}

impl RenameTagRequest {
    /// The trimmed new name, or why it cannot be used.
    pub fn validated_name(&self) -> Result<&str, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("tag name cannot be empty".to_string());
        }
        if name.chars().count() > MAX_TAG_NAME_LEN {
            return Err("tag name too long".to_string());
        }
        Ok(name)
    }
}
