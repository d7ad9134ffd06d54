//! Skin-lesion triage engine: a managed ONNX classifier fused with a symptom
//! checklist into a bounded risk score and a three-tier recommendation.
//!
//! # Scoring
//!
//! The fusion step is pure and deterministic; it needs no model at all:
//!
//! ```rust
//! use dermascan::{fuse, RiskTier, SymptomFlags};
//!
//! let symptoms = SymptomFlags { itch: false, bleed: true, growth: false };
//! let assessment = fuse(0.0, symptoms);
//!
//! // Bleeding floors the score at 0.75 regardless of the AI output.
//! assert!(assessment.override_applied);
//! assert_eq!(assessment.tier, RiskTier::Danger);
//! ```
//!
//! # Full pipeline
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use dermascan::{ModelSource, ScreeningPipeline, SymptomFlags};
//!
//! let pipeline = ScreeningPipeline::new(ModelSource::from_env())?;
//!
//! // Loads are single-flight: concurrent callers share one fetch, and a
//! // failed load degrades inference to a fixed fallback base risk instead
//! // of blocking the assessment.
//! if let Err(err) = pipeline.ensure_loaded().await {
//!     eprintln!("continuing without AI: {err}");
//! }
//!
//! let photo = std::fs::read("spot.jpg")?;
//! let assessment = pipeline.assess(&photo, SymptomFlags::none()).await;
//! println!("{}", assessment.risk.tier.label());
//! # Ok(())
//! # }
//! ```
//!
//! # Thread safety
//!
//! [`ModelLifecycleManager`] is cheaply cloneable and shares one resource;
//! the classifier is immutable once `Ready`, so concurrent inference calls
//! need no further coordination.

pub mod classifier;
pub mod model_manager;
pub mod models;
mod runtime;
pub mod screening;
pub mod store;
pub mod triage;

pub use classifier::{
    ClassPrediction, ClassifierLoader, HttpClassifierLoader, InferenceError, InferenceExecutor,
    InferenceResult, LesionClassifier, OnnxClassifier, FALLBACK_BASE_RISK,
};
pub use model_manager::{LoadError, ModelLifecycleManager};
pub use models::{default_cache_dir, ModelMetadata, ModelSource};
pub use runtime::{create_session_builder, RuntimeConfig};
pub use screening::{Assessment, ScreeningPipeline};
pub use store::{ScanRecord, ScanStore, StoreError, StoredScan};
pub use triage::{
    fuse, LesionClass, RiskAssessment, RiskTier, SymptomFlags, AI_WEIGHT, BLEED_WEIGHT,
    CRITICAL_FLOOR, DANGER_THRESHOLD, GROWTH_WEIGHT, ITCH_WEIGHT, SAFE_THRESHOLD,
};

pub fn init_logger() {
    env_logger::init();
}
