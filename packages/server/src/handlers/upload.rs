use axum::Json;
use axum::body::Body;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use common::storage::{BoxReader, FileStore, StoredFile};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::CurrentUser;
use crate::models::outcome::{FlashLevel, Outcome};
use crate::models::upload::{
    DESCRIPTION_FIELD, IMAGE_FIELD, MAX_DESCRIPTION_LEN, UploadForm, validate_description,
};
use crate::models::user::UserSummary;
use crate::repository;
use crate::repository::image::NewImage;
use crate::state::AppState;
use crate::utils::filename::{secure_filename, validate_flat_filename};
use crate::utils::flash::take_flash;

pub fn upload_body_limit(max_upload_size: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_upload_size)
}

#[utoipa::path(
    get,
    path = "/upload",
    tag = "Upload",
    operation_id = "uploadForm",
    summary = "Describe the upload form",
    responses(
        (status = 200, description = "Upload form descriptor", body = UploadForm),
        (status = 303, description = "Redirect to /login when anonymous", body = Outcome),
    ),
)]
#[instrument(skip_all, fields(user_id = current.user.id))]
pub async fn upload_form(
    current: CurrentUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> impl IntoResponse {
    let (jar, flash) = take_flash(jar);
    (
        jar,
        Json(UploadForm {
            current_user: Some(UserSummary::from(current.user)),
            flash,
            action: "/upload",
            file_field: IMAGE_FIELD,
            description_field: DESCRIPTION_FIELD,
            max_upload_size: state.config.storage.max_upload_size,
            max_description_len: MAX_DESCRIPTION_LEN,
        }),
    )
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Upload",
    operation_id = "uploadImage",
    summary = "Upload an image",
    description = "Multipart body with a required `image` file field and an optional \
        `description` text field. The filename is sanitized before storing; a name that is \
        already taken is stored under a suffixed name instead of overwriting. \
        The content type is not checked.",
    request_body(content_type = "multipart/form-data", description = "Image file with optional description"),
    responses(
        (status = 303, description = "Redirect with outcome", body = Outcome),
        (status = 400, description = "Malformed multipart body (VALIDATION_ERROR)", body = ErrorBody),
        (status = 413, description = "Body exceeds the upload limit (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
)]
#[instrument(skip(current, state, multipart), fields(user_id = current.user.id))]
pub async fn upload_image(
    current: CurrentUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Outcome, AppError> {
    let mut fields = UploadFields::default();
    let read = read_upload_fields(&mut multipart, &*state.store, &mut fields).await;
    if !matches!(read, Ok(None)) {
        if let Some(stored) = &fields.stored {
            discard(&*state.store, &stored.name).await;
        }
    }
    if let Some(outcome) = read? {
        return Ok(outcome);
    }

    let UploadFields {
        stored,
        description,
    } = fields;
    let Some(stored) = stored else {
        return Ok(Outcome::failure(
            FlashLevel::Danger,
            "No image selected",
            "/upload",
        ));
    };

    let description = match validate_description(&description) {
        Ok(description) => description,
        Err(message) => {
            discard(&*state.store, &stored.name).await;
            return Ok(Outcome::failure(FlashLevel::Danger, message, "/upload"));
        }
    };

    let image = match repository::image::create(
        &state.db,
        NewImage {
            filename: stored.name.clone(),
            description,
            user_id: current.user.id,
        },
    )
    .await
    {
        Ok(image) => image,
        Err(e) => {
            discard(&*state.store, &stored.name).await;
            return Err(e.into());
        }
    };

    info!(image_id = image.id, filename = %image.filename, size = stored.size, "Image uploaded");
    Ok(Outcome::success(
        FlashLevel::Success,
        "Image uploaded",
        "/",
    ))
}

#[derive(Default)]
struct UploadFields {
    stored: Option<StoredFile>,
    description: String,
}

/// Read every multipart field into `fields`.
///
/// `Ok(Some(_))` is an early failure outcome. Whatever was stored before an
/// early return is left in `fields.stored` for the caller to discard.
async fn read_upload_fields(
    multipart: &mut Multipart,
    store: &dyn FileStore,
    fields: &mut UploadFields,
) -> Result<Option<Outcome>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some(IMAGE_FIELD) if fields.stored.is_none() => {
                let original = field.file_name().unwrap_or_default().to_string();
                if original.is_empty() {
                    continue;
                }
                let filename = secure_filename(&original);
                if filename.is_empty() {
                    return Ok(Some(Outcome::failure(
                        FlashLevel::Danger,
                        "Invalid filename",
                        "/upload",
                    )));
                }
                fields.stored = Some(stream_field_to_store(field, store, &filename).await?);
            }
            Some(DESCRIPTION_FIELD) => {
                fields.description = field.text().await.map_err(multipart_error)?;
            }
            _ => {} // Ignore unknown fields.
        }
    }
    Ok(None)
}

/// Spool a multipart field to a temp file, then hand it to the store.
async fn stream_field_to_store(
    mut field: Field<'_>,
    store: &dyn FileStore,
    filename: &str,
) -> Result<StoredFile, AppError> {
    let temp_path = std::env::temp_dir().join(format!("pixboard-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut temp_file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;
        drop(temp_file);

        let file = tokio::fs::File::open(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
        let reader: BoxReader = Box::new(file);
        Ok(store.put_stream(filename, reader).await?)
    }
    .await;

    // Best effort.
    let _ = tokio::fs::remove_file(&temp_path).await;

    result
}

async fn discard(store: &dyn FileStore, name: &str) {
    if let Err(e) = store.delete(name).await {
        tracing::warn!(filename = %name, error = %e, "Failed to discard stored upload");
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Multipart error: {}", e.body_text()))
    }
}

#[utoipa::path(
    get,
    path = "/uploads/{filename}",
    tag = "Upload",
    operation_id = "serveUpload",
    summary = "Download a stored image",
    description = "Streams the stored file. The content type is guessed from the extension. \
        Only flat stored names are accepted; anything else is 404.",
    params(("filename" = String, Path, description = "Stored filename")),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "No such file (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let filename = validate_flat_filename(&filename)
        .map_err(|e| AppError::NotFound(e.message().into()))?;

    let (reader, size) = state.store.get_stream(filename).await?;
    let mime = mime_guess::from_path(filename).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(e.to_string()))
}
