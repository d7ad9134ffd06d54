use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use dermascan::{
    ClassPrediction, ClassifierLoader, InferenceError, LesionClassifier, LoadError, ModelSource,
    RiskTier, ScreeningPipeline, SymptomFlags, FALLBACK_BASE_RISK,
};

struct StaticClassifier {
    labels: Vec<String>,
    probabilities: Vec<f32>,
}

impl StaticClassifier {
    fn new(pairs: &[(&str, f32)]) -> Self {
        Self {
            labels: pairs.iter().map(|(label, _)| label.to_string()).collect(),
            probabilities: pairs.iter().map(|(_, probability)| *probability).collect(),
        }
    }
}

impl LesionClassifier for StaticClassifier {
    fn classify(
        &self,
        _image: &image::DynamicImage,
    ) -> Result<Vec<ClassPrediction>, InferenceError> {
        Ok(self
            .labels
            .iter()
            .zip(&self.probabilities)
            .map(|(label, &probability)| ClassPrediction::new(label.clone(), probability))
            .collect())
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}

struct FixedLoader {
    classifier: Arc<dyn LesionClassifier>,
}

#[async_trait]
impl ClassifierLoader for FixedLoader {
    async fn load(&self, _source: &ModelSource) -> Result<Arc<dyn LesionClassifier>, LoadError> {
        Ok(Arc::clone(&self.classifier))
    }
}

fn pipeline_with(pairs: &[(&str, f32)]) -> ScreeningPipeline {
    let loader = Arc::new(FixedLoader {
        classifier: Arc::new(StaticClassifier::new(pairs)),
    });
    ScreeningPipeline::with_loader(
        ModelSource::new("lesion-test", "https://example.com/export/"),
        loader,
    )
}

fn png_bytes() -> Vec<u8> {
    let image = image::DynamicImage::ImageRgb8(image::RgbImage::new(8, 8));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

#[tokio::test]
async fn test_assessment_flows_inference_into_fusion() {
    let pipeline = pipeline_with(&[("4_Malignant", 0.9), ("0_Normal", 0.1)]);
    pipeline.ensure_loaded().await.unwrap();

    let assessment = pipeline.assess(&png_bytes(), SymptomFlags::none()).await;

    assert!(assessment.inference.succeeded);
    assert_eq!(assessment.inference.top_label, "4_Malignant");
    // base = 0.8*0.9; final = base * 0.7
    assert!((assessment.risk.base_risk - 0.72).abs() < 1e-6);
    assert!((assessment.risk.final_score - 0.504).abs() < 1e-6);
    assert_eq!(assessment.risk.tier, RiskTier::Caution);
}

#[tokio::test]
async fn test_assessment_completes_without_a_model() {
    let pipeline = pipeline_with(&[("0_Normal", 1.0)]);
    // ensure_loaded() deliberately not called.

    let symptoms = SymptomFlags {
        itch: true,
        bleed: false,
        growth: false,
    };
    let assessment = pipeline.assess(&png_bytes(), symptoms).await;

    assert!(!assessment.inference.succeeded);
    assert_eq!(assessment.risk.base_risk, FALLBACK_BASE_RISK);
    // 0.1*0.7 + 0.10 = 0.17 -> SAFE: the AI outage never blocks triage.
    assert!((assessment.risk.final_score - 0.17).abs() < 1e-12);
    assert_eq!(assessment.risk.tier, RiskTier::Safe);
}

#[tokio::test]
async fn test_critical_symptom_dominates_even_in_fallback_mode() {
    let pipeline = pipeline_with(&[("0_Normal", 1.0)]);

    let symptoms = SymptomFlags {
        itch: false,
        bleed: true,
        growth: false,
    };
    let assessment = pipeline.assess(&png_bytes(), symptoms).await;

    assert!(assessment.risk.override_applied);
    assert_eq!(assessment.risk.final_score, 0.75);
    assert_eq!(assessment.risk.tier, RiskTier::Danger);
}

#[tokio::test]
async fn test_record_carries_the_wire_fields() {
    let pipeline = pipeline_with(&[("3_Benign", 0.7), ("0_Normal", 0.3)]);
    pipeline.ensure_loaded().await.unwrap();

    let assessment = pipeline.assess(&png_bytes(), SymptomFlags::none()).await;
    let record = assessment.record("file:///tmp/spot.jpg");

    assert_eq!(record.image_url, "file:///tmp/spot.jpg");
    assert_eq!(record.ai_prediction, "3_Benign");
    assert_eq!(record.status, "completed");
    assert!((record.ai_base_risk - 0.14).abs() < 1e-6);
    assert_eq!(record.risk_score, assessment.risk.final_score);
    assert_eq!(record.status_label, assessment.risk.tier.label());
    assert_eq!(record.status_color, assessment.risk.tier.color());

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["symptoms"]["itch_val"], false);
    assert_eq!(json["status_label"], "Safe - Normal Spot");
}
