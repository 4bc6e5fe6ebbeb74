use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Label file not found: {0}")]
    LabelsNotFound(PathBuf),

    #[error("Label file {0} contains no labels")]
    EmptyLabels(PathBuf),

    #[error("Image file not found: {0}")]
    ImageNotFound(PathBuf),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image has zero width or height")]
    EmptyImage,

    #[error("Model returned an empty output batch")]
    EmptyOutput,

    #[error("Model returned no usable prediction scores")]
    EmptyPrediction,

    #[error("Predicted class {index} is out of range for {len} labels")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Model error: {0}")]
    Model(String),

    #[error("No inference backend compiled in (enable the `onnx` feature)")]
    BackendUnavailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
