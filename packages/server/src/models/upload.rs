use serde::Serialize;

use crate::models::outcome::Flash;
use crate::models::user::UserSummary;

/// Longest accepted image description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Multipart field carrying the file.
pub const IMAGE_FIELD: &str = "image";
/// Multipart field carrying the optional description.
pub const DESCRIPTION_FIELD: &str = "description";

/// Response for `GET /upload`: what the upload form should submit.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadForm {
    pub current_user: Option<UserSummary>,
    pub flash: Option<Flash>,
    #[schema(example = "/upload")]
    pub action: &'static str,
    #[schema(example = "image")]
    pub file_field: &'static str,
    #[schema(example = "description")]
    pub description_field: &'static str,
    /// Request body ceiling in bytes.
    #[schema(example = 16777216)]
    pub max_upload_size: usize,
    #[schema(example = 500)]
    pub max_description_len: usize,
}

pub fn validate_description(description: &str) -> Result<String, String> {
    let description = description.trim();
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(format!(
            "Description must be at most {MAX_DESCRIPTION_LEN} characters"
        ));
    }
    Ok(description.to_string())
}
