pub mod config;
pub mod error;
pub mod labels;
pub mod network;
pub mod preprocess;

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

pub use config::ClassifierConfig;
pub use error::ClassifyError;
pub use labels::Labels;
pub use network::Network;

/// Result of classifying one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub label: String,
    pub explanation: String,
}

/// Pretrained classifier plus its label list, loaded once and shared
/// read-only.
pub struct Classifier {
    labels: Labels,
    network: Box<dyn Network>,
}

impl Classifier {
    pub fn new(labels: Labels, network: impl Network + 'static) -> Self {
        Self {
            labels,
            network: Box::new(network),
        }
    }

    /// Load labels and model from configuration.
    ///
    /// The label file is checked first so a missing or empty file fails
    /// before the (slow) model load.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        let labels = Labels::load(&config.labels_path)?;
        info!(
            path = %config.labels_path.display(),
            count = labels.len(),
            "Class labels loaded"
        );
        Self::with_default_backend(labels, &config.model_path)
    }

    #[cfg(feature = "onnx")]
    fn with_default_backend(labels: Labels, model_path: &Path) -> Result<Self, ClassifyError> {
        Ok(Self::new(labels, network::OnnxNetwork::load(model_path)?))
    }

    #[cfg(not(feature = "onnx"))]
    fn with_default_backend(_labels: Labels, _model_path: &Path) -> Result<Self, ClassifyError> {
        Err(ClassifyError::BackendUnavailable)
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Classify the image at `path`.
    ///
    /// Blocks for the duration of decoding and the forward pass.
    pub fn classify(&self, path: &Path) -> Result<Classification, ClassifyError> {
        info!(path = %path.display(), "Classifying image");

        if !path.exists() {
            return Err(ClassifyError::ImageNotFound(path.to_path_buf()));
        }

        let img = image::open(path)?;
        debug!(width = img.width(), height = img.height(), "Image decoded");

        let input = preprocess::preprocess(&img)?;
        let outputs = self.network.forward(&input)?;
        debug!(batch = outputs.len(), "Forward pass finished");

        let scores = outputs.first().ok_or(ClassifyError::EmptyOutput)?;
        let index = argmax(scores).ok_or(ClassifyError::EmptyPrediction)?;
        debug!(index, "Predicted class index");

        let label = self
            .labels
            .get(index)
            .ok_or(ClassifyError::IndexOutOfRange {
                index,
                len: self.labels.len(),
            })?
            .to_string();

        Ok(Classification {
            explanation: explain(&label),
            label,
        })
    }
}

/// Index of the highest score; the first one wins on ties.
///
/// NaN scores are skipped, so an output made only of NaN has no maximum.
fn argmax(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (i, &s)| match best {
            Some((_, b)) if s <= b => best,
            _ => Some((i, s)),
        })
        .map(|(i, _)| i)
}

fn explain(label: &str) -> String {
    format!(
        "The image was classified as '{label}' because the model assigned the highest probability to this category."
    )
}
