use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;

use crate::entity::user;
use crate::error::AppError;
use crate::repository;
use crate::state::AppState;
use crate::utils::session::SESSION_COOKIE;

/// Logged-in user resolved from the `session` cookie.
///
/// Add this as a handler parameter to require a login. Anonymous requests
/// are redirected to `/login` with a warning flash.
pub struct CurrentUser {
    pub user: user::Model,
    pub session_token: String,
}

/// Like [`CurrentUser`], but anonymous requests pass through as `None`.
pub struct MaybeUser(pub Option<user::Model>);

async fn resolve_session(
    parts: &Parts,
    state: &AppState,
) -> Result<Option<(String, user::Model)>, AppError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned()) else {
        return Ok(None);
    };

    let user = repository::session::find_user(&state.db, &token, Utc::now()).await?;
    Ok(user.map(|user| (token, user)))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (session_token, user) = resolve_session(parts, state)
            .await?
            .ok_or(AppError::LoginRequired(
                "Please log in to access this page.",
            ))?;

        Ok(CurrentUser {
            user,
            session_token,
        })
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_session(parts, state).await?.map(|(_, user)| user);
        Ok(MaybeUser(user))
    }
}
