use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::handlers::gallery::find_image;
use crate::models::gallery::ClassificationResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/image/{id}/classify",
    tag = "Gallery",
    operation_id = "classifyImage",
    summary = "Classify a stored image",
    description = "Runs the image classifier on the stored file and returns the most likely \
        label with a short explanation.",
    params(("id" = i32, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Classification", body = ClassificationResponse),
        (status = 400, description = "File is not a decodable image (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Image or its file not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Classifier disabled (CLASSIFIER_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn classify_image(
    State(state): State<AppState>,
    Path(image_id): Path<i32>,
) -> Result<Json<ClassificationResponse>, AppError> {
    let classifier = state
        .classifier
        .as_ref()
        .map(Arc::clone)
        .ok_or(AppError::ClassifierUnavailable)?;

    let image = find_image(&state.db, image_id).await?;
    let path = state.store.local_path(&image.filename)?;

    let classification = tokio::task::spawn_blocking(move || classifier.classify(&path))
        .await
        .map_err(|e| AppError::Internal(format!("Classifier task failed: {e}")))??;

    info!(label = %classification.label, "Image classified");
    Ok(Json(ClassificationResponse {
        image_id,
        label: classification.label,
        explanation: classification.explanation,
    }))
}
