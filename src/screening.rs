use std::io;
use std::sync::Arc;

use crate::classifier::{ClassifierLoader, InferenceExecutor, InferenceResult};
use crate::model_manager::{LoadError, ModelLifecycleManager};
use crate::models::ModelSource;
use crate::store::ScanRecord;
use crate::triage::{fuse, RiskAssessment, SymptomFlags};

/// A completed assessment: the inference outcome, the symptom snapshot it was
/// fused with, and the resulting scored classification.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub inference: InferenceResult,
    pub symptoms: SymptomFlags,
    pub risk: RiskAssessment,
}

impl Assessment {
    /// Serializes this assessment into the persistence record the store
    /// collaborator transmits.
    pub fn record(&self, image_url: impl Into<String>) -> ScanRecord {
        ScanRecord {
            image_url: image_url.into(),
            symptoms: self.symptoms,
            ai_prediction: self.inference.top_label.clone(),
            ai_base_risk: self.risk.base_risk,
            risk_score: self.risk.final_score,
            status: "completed".to_string(),
            status_label: self.risk.tier.label().to_string(),
            status_color: self.risk.tier.color().to_string(),
        }
    }
}

/// End-to-end flow: managed classifier -> inference -> fusion -> tier.
///
/// The AI stage degrades to the fallback base risk when unavailable, so
/// `assess` always completes with a usable result.
#[derive(Clone)]
pub struct ScreeningPipeline {
    manager: ModelLifecycleManager,
    executor: InferenceExecutor,
}

impl ScreeningPipeline {
    pub fn new(source: ModelSource) -> io::Result<Self> {
        Ok(Self::from_manager(ModelLifecycleManager::new(source)?))
    }

    pub fn with_loader(source: ModelSource, loader: Arc<dyn ClassifierLoader>) -> Self {
        Self::from_manager(ModelLifecycleManager::with_loader(source, loader))
    }

    fn from_manager(manager: ModelLifecycleManager) -> Self {
        let executor = InferenceExecutor::new(manager.clone());
        Self { manager, executor }
    }

    pub fn manager(&self) -> &ModelLifecycleManager {
        &self.manager
    }

    /// Brings the classifier up (single-flight; idempotent once ready).
    pub async fn ensure_loaded(&self) -> Result<(), LoadError> {
        self.manager.load().await
    }

    /// Runs the full assessment for one photograph and symptom snapshot.
    pub async fn assess(&self, image_bytes: &[u8], symptoms: SymptomFlags) -> Assessment {
        let inference = self.executor.run(image_bytes).await;
        let risk = fuse(inference.base_risk, symptoms);

        log::debug!(
            "assessment: base {:.3}, raw {:.3}, override {}, final {:.3} -> {}",
            risk.base_risk,
            risk.raw_score,
            risk.override_applied,
            risk.final_score,
            risk.tier
        );

        Assessment {
            inference,
            symptoms,
            risk,
        }
    }
}
