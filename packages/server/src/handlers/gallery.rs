use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum_extra::extract::cookie::CookieJar;
use sea_orm::ConnectionTrait;
use tracing::{info, instrument, warn};

use crate::entity::image;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{CurrentUser, MaybeUser};
use crate::extractors::form::AppForm;
use crate::models::gallery::{
    CommentForm, CommentResponse, GalleryView, ImageDetailView, ImageSummary, validate_comment,
};
use crate::models::outcome::{FlashLevel, Outcome};
use crate::models::user::UserSummary;
use crate::repository;
use crate::repository::comment::NewComment;
use crate::state::AppState;
use crate::utils::flash::take_flash;

#[utoipa::path(
    get,
    path = "/",
    tag = "Gallery",
    operation_id = "listImages",
    summary = "List all images",
    description = "Returns every image, oldest first, with its owner. Consumes the pending flash.",
    responses(
        (status = 200, description = "Gallery", body = GalleryView),
    ),
)]
#[instrument(skip_all)]
pub async fn index(
    MaybeUser(user): MaybeUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let images = repository::image::list_with_owners(&state.db)
        .await?
        .into_iter()
        .map(|(image, owner)| ImageSummary::new(image, owner))
        .collect();

    let (jar, flash) = take_flash(jar);
    Ok((
        jar,
        Json(GalleryView {
            current_user: user.as_ref().map(UserSummary::from),
            flash,
            images,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/image/{id}",
    tag = "Gallery",
    operation_id = "getImage",
    summary = "Get an image with its comments",
    params(("id" = i32, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Image detail", body = ImageDetailView),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(user, state, jar))]
pub async fn image_detail(
    MaybeUser(user): MaybeUser,
    State(state): State<AppState>,
    Path(image_id): Path<i32>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let (image, owner) = repository::image::find_with_owner(&state.db, image_id)
        .await?
        .ok_or_else(image_not_found)?;

    let comments = repository::comment::list_for_image(&state.db, image_id)
        .await?
        .into_iter()
        .map(|(comment, author)| CommentResponse::new(comment, author))
        .collect();

    let is_owner = user.as_ref().is_some_and(|u| u.id == image.user_id);
    let (jar, flash) = take_flash(jar);

    Ok((
        jar,
        Json(ImageDetailView {
            current_user: user.as_ref().map(UserSummary::from),
            flash,
            image: ImageSummary::new(image, owner),
            comments,
            is_owner,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/image/{id}",
    tag = "Gallery",
    operation_id = "postComment",
    summary = "Comment on an image",
    description = "Anonymous visitors are redirected to `/login` and nothing is stored. \
        An empty comment redirects back to the image with a failure flash.",
    params(("id" = i32, Path, description = "Image ID")),
    request_body(content = CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect with outcome", body = Outcome),
        (status = 400, description = "Malformed form body (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(user, state, form))]
pub async fn post_comment(
    MaybeUser(user): MaybeUser,
    State(state): State<AppState>,
    Path(image_id): Path<i32>,
    form: Result<AppForm<CommentForm>, AppError>,
) -> Result<Outcome, AppError> {
    find_image(&state.db, image_id).await?;

    let Some(user) = user else {
        return Ok(Outcome::failure(
            FlashLevel::Warning,
            "Please log in to comment",
            "/login",
        ));
    };
    // Body errors only matter once the caller may comment.
    let AppForm(form) = form?;

    let detail_url = format!("/image/{image_id}");
    let text = match validate_comment(&form.comment) {
        Ok(text) => text.to_string(),
        Err(message) => return Ok(Outcome::failure(FlashLevel::Danger, message, detail_url)),
    };

    let comment = repository::comment::create(
        &state.db,
        NewComment {
            text,
            image_id,
            user_id: user.id,
        },
    )
    .await?;
    info!(comment_id = comment.id, user_id = user.id, "Comment added");

    Ok(Outcome::success(
        FlashLevel::Success,
        "Comment added",
        detail_url,
    ))
}

#[utoipa::path(
    post,
    path = "/delete/{id}",
    tag = "Gallery",
    operation_id = "deleteImage",
    summary = "Delete one of your images",
    description = "Only the owner may delete an image. The stored file is removed best-effort; \
        the image row and its comments are always removed.",
    params(("id" = i32, Path, description = "Image ID")),
    responses(
        (status = 303, description = "Redirect with outcome", body = Outcome),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(current, state), fields(user_id = current.user.id))]
pub async fn delete_image(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(image_id): Path<i32>,
) -> Result<Outcome, AppError> {
    let image = find_image(&state.db, image_id).await?;

    if image.user_id != current.user.id {
        warn!(owner_id = image.user_id, "Refused to delete another user's image");
        return Ok(Outcome::failure(
            FlashLevel::Danger,
            "You can only delete your own images",
            "/",
        ));
    }

    match state.store.delete(&image.filename).await {
        Ok(true) => {}
        Ok(false) => warn!(filename = %image.filename, "Image file was already gone"),
        Err(e) => warn!(filename = %image.filename, error = %e, "Failed to remove image file"),
    }

    repository::image::delete_with_comments(&state.db, image_id).await?;

    Ok(Outcome::success(FlashLevel::Info, "Image deleted", "/"))
}

pub(crate) async fn find_image<C: ConnectionTrait>(
    db: &C,
    image_id: i32,
) -> Result<image::Model, AppError> {
    repository::image::find(db, image_id)
        .await?
        .ok_or_else(image_not_found)
}

fn image_not_found() -> AppError {
    AppError::NotFound("Image not found".into())
}
