use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::user;

/// Public view of an account, as shown next to images and comments.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct UserSummary {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "octocat")]
    pub username: String,
}

impl From<user::Model> for UserSummary {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
        }
    }
}

impl From<&user::Model> for UserSummary {
    fn from(model: &user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username.clone(),
        }
    }
}

/// Response for `GET /me`.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "octocat")]
    pub username: String,
    /// Identifier assigned by the OAuth provider.
    #[schema(example = "583231")]
    pub provider_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for MeResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            provider_id: model.provider_id,
            created_at: model.created_at,
        }
    }
}
