use crate::error::ClassifyError;
use crate::preprocess::InputTensor;

/// A pretrained image classifier that maps a preprocessed batch to one row of
/// class scores per batch item.
///
/// Implementations must be safe to share across threads; forward passes take
/// `&self` and never mutate weights.
pub trait Network: Send + Sync {
    fn forward(&self, input: &InputTensor) -> Result<Vec<Vec<f32>>, ClassifyError>;
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxNetwork;

#[cfg(feature = "onnx")]
mod onnx {
    use std::path::Path;

    use tract_onnx::prelude::*;
    use tracing::info;

    use super::Network;
    use crate::error::ClassifyError;
    use crate::preprocess::{INPUT_SIZE, InputTensor};

    /// ONNX model executed with tract.
    pub struct OnnxNetwork {
        plan: TypedRunnableModel<TypedModel>,
    }

    fn model_err(e: impl std::fmt::Display) -> ClassifyError {
        ClassifyError::Model(e.to_string())
    }

    impl OnnxNetwork {
        pub fn load(path: &Path) -> Result<Self, ClassifyError> {
            let side = INPUT_SIZE as usize;
            let plan = tract_onnx::onnx()
                .model_for_path(path)
                .and_then(|m| m.with_input_fact(0, f32::fact([1, 3, side, side]).into()))
                .and_then(|m| m.into_optimized())
                .and_then(|m| m.into_runnable())
                .map_err(model_err)?;
            info!(path = %path.display(), "ONNX model loaded");
            Ok(Self { plan })
        }
    }

    impl Network for OnnxNetwork {
        fn forward(&self, input: &InputTensor) -> Result<Vec<Vec<f32>>, ClassifyError> {
            let tensor = Tensor::from_shape(&input.shape, &input.data).map_err(model_err)?;
            let outputs = self.plan.run(tvec!(tensor.into())).map_err(model_err)?;
            let Some(first) = outputs.first() else {
                return Ok(Vec::new());
            };
            let scores = first.to_array_view::<f32>().map_err(model_err)?;
            if scores.ndim() == 0 {
                return Ok(Vec::new());
            }
            Ok(scores
                .outer_iter()
                .map(|row| row.iter().copied().collect())
                .collect())
        }
    }
}
