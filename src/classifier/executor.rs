use serde::Serialize;

use super::backend::{InferenceError, LesionClassifier};
use super::ClassPrediction;
use crate::model_manager::ModelLifecycleManager;
use crate::triage::LesionClass;

/// Base risk used when the classifier never loaded or inference failed.
///
/// Fixed by policy: a symptom-only assessment lands near the SAFE/CAUTION
/// boundary instead of artificially at zero.
pub const FALLBACK_BASE_RISK: f64 = 0.1;

/// Outcome of one inference call, successful or degraded.
#[derive(Debug, Clone, Serialize)]
pub struct InferenceResult {
    /// Predictions ranked by descending probability (stable for ties).
    pub predictions: Vec<ClassPrediction>,
    /// Label of the first ranked entry, `"Unknown"` when degraded.
    pub top_label: String,
    /// Probability-weighted risk over the whole distribution, in [0,1].
    pub base_risk: f64,
    pub succeeded: bool,
    pub error: Option<String>,
}

impl InferenceResult {
    /// The degraded shape: no predictions, fixed fallback risk.
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            predictions: Vec::new(),
            top_label: "Unknown".to_string(),
            base_risk: FALLBACK_BASE_RISK,
            succeeded: false,
            error: Some(reason.into()),
        }
    }
}

/// Runs inference against the managed classifier resource.
///
/// Never fails: a not-ready resource, an undecodable image, or a backend
/// error all degrade to the fallback result so the surrounding assessment
/// completes with reduced accuracy instead of stalling.
#[derive(Clone)]
pub struct InferenceExecutor {
    manager: ModelLifecycleManager,
}

impl InferenceExecutor {
    pub fn new(manager: ModelLifecycleManager) -> Self {
        Self { manager }
    }

    pub async fn run(&self, image_bytes: &[u8]) -> InferenceResult {
        let Some(classifier) = self.manager.classifier() else {
            let reason = match self.manager.last_error() {
                Some(err) => format!("classifier not ready: {err}"),
                None => "classifier not ready: load() has not completed".to_string(),
            };
            log::warn!("{reason}; using fallback base risk {FALLBACK_BASE_RISK}");
            return InferenceResult::fallback(reason);
        };

        match infer(classifier.as_ref(), image_bytes) {
            Ok(result) => result,
            Err(err) => {
                log::warn!("inference failed: {err}; using fallback base risk {FALLBACK_BASE_RISK}");
                InferenceResult::fallback(err.to_string())
            }
        }
    }
}

fn infer(
    classifier: &dyn LesionClassifier,
    image_bytes: &[u8],
) -> Result<InferenceResult, InferenceError> {
    let image =
        image::load_from_memory(image_bytes).map_err(|e| InferenceError::Decode(e.to_string()))?;

    let mut predictions = classifier.classify(&image)?;
    // Stable sort: ties keep the model's emission order.
    predictions.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let base_risk = weighted_base_risk(&predictions);
    let top_label = predictions
        .first()
        .map(|p| p.label.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    log::info!(
        "inference complete: top {} ({:.1}%), base risk {:.1}%",
        top_label,
        predictions.first().map_or(0.0, |p| p.probability * 100.0),
        base_risk * 100.0
    );

    Ok(InferenceResult {
        predictions,
        top_label,
        base_risk,
        succeeded: true,
        error: None,
    })
}

/// `Σ risk(class) · probability` over every returned pair. Unknown labels
/// contribute zero. The whole distribution is weighted, not just the top
/// class, so risk mass from low-ranked classes still counts.
fn weighted_base_risk(predictions: &[ClassPrediction]) -> f64 {
    predictions
        .iter()
        .map(|p| {
            let risk = LesionClass::from_label(&p.label).map_or(0.0, LesionClass::base_risk);
            risk * f64::from(p.probability)
        })
        .sum()
}
