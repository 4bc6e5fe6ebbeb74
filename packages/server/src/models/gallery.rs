use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{comment, image, user};
use crate::models::outcome::Flash;
use crate::models::user::UserSummary;

/// Longest accepted comment, in characters.
pub const MAX_COMMENT_LEN: usize = 300;

/// A gallery entry.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageSummary {
    #[schema(example = 7)]
    pub id: i32,
    /// Stored (sanitized) filename.
    #[schema(example = "sunset.jpg")]
    pub filename: String,
    /// Where the file is served from.
    #[schema(example = "/uploads/sunset.jpg")]
    pub url: String,
    #[schema(example = "Taken from the pier")]
    pub description: String,
    pub owner: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
}

impl ImageSummary {
    pub fn new(image: image::Model, owner: Option<user::Model>) -> Self {
        Self {
            id: image.id,
            url: format!("/uploads/{}", image.filename),
            filename: image.filename,
            description: image.description,
            owner: owner.map(UserSummary::from),
            created_at: image.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentResponse {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Lovely colours")]
    pub text: String,
    pub author: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
}

impl CommentResponse {
    pub fn new(comment: comment::Model, author: Option<user::Model>) -> Self {
        Self {
            id: comment.id,
            text: comment.text,
            author: author.map(UserSummary::from),
            created_at: comment.created_at,
        }
    }
}

/// Response for `GET /`.
#[derive(Serialize, utoipa::ToSchema)]
pub struct GalleryView {
    pub current_user: Option<UserSummary>,
    pub flash: Option<Flash>,
    pub images: Vec<ImageSummary>,
}

/// Response for `GET /image/{id}`.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageDetailView {
    pub current_user: Option<UserSummary>,
    pub flash: Option<Flash>,
    pub image: ImageSummary,
    pub comments: Vec<CommentResponse>,
    /// Whether the viewer may delete this image.
    pub is_owner: bool,
}

/// Form body for `POST /image/{id}`.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CommentForm {
    #[serde(default)]
    #[schema(example = "Lovely colours")]
    pub comment: String,
}

/// Trim and check a comment. The error is the message shown to the user.
pub fn validate_comment(text: &str) -> Result<&str, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("Comment cannot be empty".into());
    }
    if text.chars().count() > MAX_COMMENT_LEN {
        return Err(format!(
            "Comment must be at most {MAX_COMMENT_LEN} characters"
        ));
    }
    Ok(text)
}

/// Response for `GET /image/{id}/classify`.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ClassificationResponse {
    #[schema(example = 7)]
    pub image_id: i32,
    #[schema(example = "golden retriever")]
    pub label: String,
    #[schema(
        example = "The image was classified as 'golden retriever' because the model assigned the highest probability to this category."
    )]
    pub explanation: String,
}
