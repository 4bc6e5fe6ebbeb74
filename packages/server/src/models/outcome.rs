use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

pub use crate::utils::flash::{Flash, FlashLevel};
use crate::utils::flash::flash_cookie;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failure,
}

/// Result of a page-flow mutation: a `303 See Other` to `redirect_to` that
/// leaves `message` behind as a flash for the next view.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct Outcome {
    pub status: OutcomeStatus,
    pub level: FlashLevel,
    #[schema(example = "Image uploaded")]
    pub message: String,
    #[schema(example = "/")]
    pub redirect_to: String,
}

impl Outcome {
    pub fn success(
        level: FlashLevel,
        message: impl Into<String>,
        redirect_to: impl Into<String>,
    ) -> Self {
        Self {
            status: OutcomeStatus::Success,
            level,
            message: message.into(),
            redirect_to: redirect_to.into(),
        }
    }

    pub fn failure(
        level: FlashLevel,
        message: impl Into<String>,
        redirect_to: impl Into<String>,
    ) -> Self {
        Self {
            status: OutcomeStatus::Failure,
            level,
            message: message.into(),
            redirect_to: redirect_to.into(),
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let jar = CookieJar::new().add(flash_cookie(&Flash {
            level: self.level,
            message: self.message.clone(),
        }));
        (
            StatusCode::SEE_OTHER,
            [(header::LOCATION, self.redirect_to.clone())],
            jar,
            Json(self),
        )
            .into_response()
    }
}
