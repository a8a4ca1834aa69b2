//! Post and attachment DTOs.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Attachment, Post, UpdatePost};
use crate::utils::validate::not_blank;

/// Attachment as sent by clients; its id is assigned by the server.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "File name is required."))]
    #[schema(example = "diagram.png")]
    pub file_name: String,
}

impl AttachmentRequest {
    fn into_attachment(self, post_id: Uuid) -> Attachment {
        Attachment {
            id: Uuid::new_v4(),
            file_name: self.file_name,
            post_id,
        }
    }
}

/// Request body for creating a post.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub author_id: Uuid,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Title is required."))]
    pub title: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Body is required."))]
    pub body: String,

    #[serde(default)]
    pub is_pinned: bool,

    /// Defaults to the time the request is handled
    #[serde(default)]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub creation_date: Option<Timestamp>,

    #[serde(default)]
    #[validate(nested)]
    pub attachments: Vec<AttachmentRequest>,
}

impl CreatePostRequest {
    pub fn into_post(self, id: Uuid, now: Timestamp) -> Post {
        Post {
            id,
            author_id: self.author_id,
            title: self.title,
            body: self.body,
            is_pinned: self.is_pinned,
            creation_date: self.creation_date.unwrap_or(now),
            deletion_date: None,
            attachments: self
                .attachments
                .into_iter()
                .map(|a| a.into_attachment(id))
                .collect(),
        }
    }
}

/// Request body for replacing a post.
///
/// The attachment list replaces the existing one entirely.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Title is required."))]
    pub title: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Body is required."))]
    pub body: String,

    #[serde(default)]
    pub is_pinned: bool,

    #[serde(default)]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub deletion_date: Option<Timestamp>,

    #[serde(default)]
    #[validate(nested)]
    pub attachments: Vec<AttachmentRequest>,
}

impl UpdatePostRequest {
    pub fn into_update(self, post_id: Uuid) -> UpdatePost {
        UpdatePost {
            title: self.title,
            body: self.body,
            is_pinned: self.is_pinned,
            deletion_date: self.deletion_date,
            attachments: self
                .attachments
                .into_iter()
                .map(|a| a.into_attachment(post_id))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResponse {
    pub id: Uuid,
    pub file_name: String,
    pub post_id: Uuid,
}

impl From<Attachment> for AttachmentResponse {
    fn from(attachment: Attachment) -> Self {
        Self {
            id: attachment.id,
            file_name: attachment.file_name,
            post_id: attachment.post_id,
        }
    }
}

/// Post as returned by the API, attachments ordered by file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub is_pinned: bool,
    #[schema(value_type = String, format = DateTime)]
    pub creation_date: Timestamp,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub deletion_date: Option<Timestamp>,
    pub attachments: Vec<AttachmentResponse>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            title: post.title,
            body: post.body,
            is_pinned: post.is_pinned,
            creation_date: post.creation_date,
            deletion_date: post.deletion_date,
            attachments: post.attachments.into_iter().map(Into::into).collect(),
        }
    }
}
