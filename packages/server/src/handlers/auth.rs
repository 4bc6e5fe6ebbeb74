use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use sea_orm::DbErr;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{CurrentUser, MaybeUser};
use crate::models::outcome::{FlashLevel, Outcome};
use crate::models::user::MeResponse;
use crate::oauth::OAuthError;
use crate::repository;
use crate::state::AppState;
use crate::utils::jwt;
use crate::utils::session::{
    OAUTH_STATE_COOKIE, SESSION_COOKIE, new_token, oauth_state_cookie, removal_cookie,
    session_cookie,
};

/// Query string of `GET /login`. Empty on the first visit; filled in by the
/// provider when it redirects back.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginQuery {
    /// Authorization code issued by the provider.
    pub code: Option<String>,
    /// Signed state token echoed back by the provider.
    pub state: Option<String>,
    /// Set by the provider when the user denied access.
    pub error: Option<String>,
}

#[derive(Debug, Error)]
enum LoginError {
    #[error("OAuth state rejected: {0}")]
    State(&'static str),
    #[error(transparent)]
    Provider(#[from] OAuthError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

#[utoipa::path(
    get,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Start or complete the OAuth login",
    description = "Without `code`, redirects to the provider's authorization page and sets a \
        short-lived `oauth_state` cookie. When the provider redirects back with `code` and \
        `state`, verifies the state, exchanges the code, creates the local user on first login \
        and opens a session. Any provider failure redirects home with a failure flash.",
    params(LoginQuery),
    responses(
        (status = 303, description = "Redirect to the provider, or home with an outcome", body = Outcome),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    if let Some(error) = query.error {
        warn!(error = %error, "Provider returned an error");
        return Ok(login_failed(jar));
    }

    let Some(code) = query.code else {
        return start_login(&state, jar);
    };

    match complete_login(&state, &jar, &code, query.state.as_deref()).await {
        Ok((user, token)) => {
            info!(user_id = user.id, username = %user.username, "User logged in");
            let jar = jar
                .remove(removal_cookie(OAUTH_STATE_COOKIE, "/login"))
                .add(session_cookie(
                    token,
                    state.config.auth.session_ttl_hours,
                    state.config.auth.secure_cookies,
                ));
            Ok((
                jar,
                Outcome::success(FlashLevel::Success, "Logged in successfully", "/"),
            )
                .into_response())
        }
        Err(LoginError::Database(e)) => Err(e.into()),
        Err(e) => {
            warn!(error = %e, "Login failed");
            Ok(login_failed(jar))
        }
    }
}

fn start_login(state: &AppState, jar: CookieJar) -> Result<Response, AppError> {
    let nonce = new_token();
    let signed = jwt::sign_state(&nonce, &state.config.auth.secret)
        .map_err(|e| AppError::Internal(format!("Failed to sign OAuth state: {e}")))?;
    let url = state
        .oauth
        .authorize_url(&signed)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let jar = jar.add(oauth_state_cookie(nonce, state.config.auth.secure_cookies));
    Ok((jar, Redirect::to(&url)).into_response())
}

async fn complete_login(
    state: &AppState,
    jar: &CookieJar,
    code: &str,
    signed_state: Option<&str>,
) -> Result<(user::Model, String), LoginError> {
    let signed_state = signed_state.ok_or(LoginError::State("missing"))?;
    let claims = jwt::verify_state(signed_state, &state.config.auth.secret)
        .map_err(|_| LoginError::State("invalid signature or expired"))?;

    let cookie_nonce = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value());
    if cookie_nonce != Some(claims.nonce.as_str()) {
        return Err(LoginError::State("does not match this browser"));
    }

    let access_token = state.oauth.exchange_code(code).await?;
    let profile = state.oauth.fetch_profile(&access_token).await?;

    let user = repository::user::find_or_create(&state.db, &profile).await?;
    let session =
        repository::session::create(&state.db, user.id, state.config.auth.session_ttl_hours)
            .await?;

    Ok((user, session.token))
}

fn login_failed(jar: CookieJar) -> Response {
    (
        jar.remove(removal_cookie(OAUTH_STATE_COOKIE, "/login")),
        Outcome::failure(FlashLevel::Danger, "Login failed", "/"),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "End the current session",
    responses(
        (status = 303, description = "Redirect home (or to /login when anonymous)", body = Outcome),
    ),
)]
#[instrument(skip(state, current, jar), fields(user_id = current.user.id))]
pub async fn logout(
    current: CurrentUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    repository::session::delete(&state.db, &current.session_token).await?;
    info!("User logged out");

    Ok((
        jar.remove(removal_cookie(SESSION_COOKIE, "/")),
        Outcome::success(FlashLevel::Info, "Logged out", "/"),
    ))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "getCurrentUser",
    summary = "Get current user",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "No session (NOT_AUTHENTICATED)", body = ErrorBody),
    ),
)]
#[instrument(skip_all)]
pub async fn me(MaybeUser(user): MaybeUser) -> Result<Json<MeResponse>, AppError> {
    let user = user.ok_or(AppError::NotAuthenticated)?;
    Ok(Json(MeResponse::from(user)))
}
