use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    /// Load the model at startup and expose the classification route.
    #[serde(default)]
    pub enabled: bool,
    /// ONNX export of the pretrained network.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    /// Newline-delimited class labels, one per output index.
    #[serde(default = "default_labels_path")]
    pub labels_path: PathBuf,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/resnet50.onnx")
}

fn default_labels_path() -> PathBuf {
    PathBuf::from("imagenet_classes.txt")
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model_path: default_model_path(),
            labels_path: default_labels_path(),
        }
    }
}
