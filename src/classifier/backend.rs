use image::DynamicImage;

use super::ClassPrediction;

/// Errors raised while turning a photograph into a prediction set.
///
/// These never escape the executor: every variant is absorbed into the
/// fallback `InferenceResult` so the surrounding assessment always completes.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InferenceError {
    /// The submitted bytes could not be decoded as an image
    #[error("image decode failed: {0}")]
    Decode(String),
    /// The forward pass itself failed
    #[error("classifier backend error: {0}")]
    Backend(String),
}

/// The opaque classification capability: given a decoded photograph, return
/// one `(label, probability)` pair per known class.
///
/// Implementations must be immutable once constructed; the lifecycle manager
/// shares a single instance across concurrent inference calls.
pub trait LesionClassifier: Send + Sync {
    /// Runs one forward pass. Pairs are returned in the model's emission
    /// order; ranking is the executor's job.
    fn classify(&self, image: &DynamicImage) -> Result<Vec<ClassPrediction>, InferenceError>;

    /// The class labels this model was trained on, in emission order.
    fn labels(&self) -> &[String];
}
