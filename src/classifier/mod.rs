mod backend;
mod executor;
mod loader;
mod onnx;

pub use backend::{InferenceError, LesionClassifier};
pub use executor::{InferenceExecutor, InferenceResult, FALLBACK_BASE_RISK};
pub use loader::{ClassifierLoader, HttpClassifierLoader};
pub use onnx::OnnxClassifier;

use serde::{Deserialize, Serialize};

/// One entry of a classifier's output distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassPrediction {
    pub label: String,
    pub probability: f32,
}

impl ClassPrediction {
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}
