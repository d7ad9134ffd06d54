use std::collections::HashMap;
use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use super::backend::{InferenceError, LesionClassifier};
use super::ClassPrediction;
use crate::model_manager::LoadError;
use crate::models::ModelMetadata;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Default classifier backend: an ONNX Runtime session over the fetched
/// model definition, with labels and input size taken from the metadata
/// asset.
pub struct OnnxClassifier {
    session: Session,
    input_name: String,
    labels: Vec<String>,
    input_size: u32,
}

impl OnnxClassifier {
    /// Builds a session from a model definition on disk.
    pub fn from_file(model_path: &Path, metadata: ModelMetadata) -> Result<Self, LoadError> {
        Self::with_runtime_config(model_path, metadata, &RuntimeConfig::default())
    }

    pub fn with_runtime_config(
        model_path: &Path,
        metadata: ModelMetadata,
        config: &RuntimeConfig,
    ) -> Result<Self, LoadError> {
        let session = create_session_builder(config)
            .map_err(|e| LoadError::Session(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| LoadError::Session(e.to_string()))?;

        Self::validate_model(&session, &metadata)?;
        let input_name = session.inputs[0].name.clone();

        log::info!(
            "classifier session ready: {} classes, {}x{} input",
            metadata.labels.len(),
            metadata.image_size,
            metadata.image_size
        );

        Ok(Self {
            session,
            input_name,
            labels: metadata.labels,
            input_size: metadata.image_size,
        })
    }

    /// Checks that the model shape matches what the metadata promises.
    fn validate_model(session: &Session, metadata: &ModelMetadata) -> Result<(), LoadError> {
        if session.inputs.is_empty() {
            return Err(LoadError::Session(
                "model must have an image input tensor".to_string(),
            ));
        }
        if session.outputs.is_empty() {
            return Err(LoadError::Session(
                "model must have a class-probability output tensor".to_string(),
            ));
        }
        if metadata.labels.is_empty() {
            return Err(LoadError::Metadata("metadata lists no class labels".to_string()));
        }
        Ok(())
    }

    /// Resizes and scales the photograph into the NHWC float tensor the
    /// training export expects (pixels in [-1, 1], MobileNet convention).
    fn image_tensor(&self, image: &DynamicImage) -> Array4<f32> {
        let side = self.input_size;
        let rgb = image
            .resize_exact(side, side, FilterType::Triangle)
            .to_rgb8();

        let mut input = Array4::<f32>::zeros((1, side as usize, side as usize, 3));
        for (x, y, pixel) in rgb.enumerate_pixels() {
            for channel in 0..3 {
                input[[0, y as usize, x as usize, channel]] =
                    f32::from(pixel[channel]) / 127.5 - 1.0;
            }
        }
        input
    }
}

impl LesionClassifier for OnnxClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Vec<ClassPrediction>, InferenceError> {
        let input = self.image_tensor(image).into_dyn();
        let input = input.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input)
                .map_err(|e| InferenceError::Backend(format!("failed to create input tensor: {e}")))?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| InferenceError::Backend(format!("failed to run model: {e}")))?;
        let scores = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Backend(format!("failed to extract output tensor: {e}")))?;

        let probabilities: Vec<f32> = scores.iter().copied().collect();
        if probabilities.len() < self.labels.len() {
            return Err(InferenceError::Backend(format!(
                "model returned {} scores for {} labels",
                probabilities.len(),
                self.labels.len()
            )));
        }

        Ok(self
            .labels
            .iter()
            .zip(probabilities)
            .map(|(label, probability)| ClassPrediction::new(label.clone(), probability))
            .collect())
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}
