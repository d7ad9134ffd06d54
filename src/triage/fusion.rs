use serde::{Deserialize, Serialize};

use super::policy::RiskTier;

/// Weight of the AI-derived base risk in the fused score.
pub const AI_WEIGHT: f64 = 0.70;
/// Weight contributed by active itching (minor symptom).
pub const ITCH_WEIGHT: f64 = 0.10;
/// Weight contributed by bleeding or crusting (critical symptom).
pub const BLEED_WEIGHT: f64 = 0.15;
/// Weight contributed by rapid growth (critical symptom).
pub const GROWTH_WEIGHT: f64 = 0.15;
/// Minimum fused score enforced when a critical symptom is present.
pub const CRITICAL_FLOOR: f64 = 0.75;

/// The symptom checklist, snapshotted once per assessment.
///
/// Serialized field names match the persistence wire format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomFlags {
    #[serde(rename = "itch_val")]
    pub itch: bool,
    #[serde(rename = "bleed_val")]
    pub bleed: bool,
    #[serde(rename = "growth_val")]
    pub growth: bool,
}

impl SymptomFlags {
    pub fn none() -> Self {
        Self::default()
    }

    /// Bleeding or rapid growth warrants the safety override on its own.
    pub fn is_critical(self) -> bool {
        self.bleed || self.growth
    }

    /// Human-readable names of the flags that are set.
    pub fn descriptions(self) -> Vec<&'static str> {
        let mut set = Vec::new();
        if self.itch {
            set.push("Actively Itching");
        }
        if self.bleed {
            set.push("Bleeding/Crusting");
        }
        if self.growth {
            set.push("Rapid Growth");
        }
        set
    }
}

/// The fused scoring outcome. Built once per assessment, never mutated.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RiskAssessment {
    /// AI-derived scalar the fusion started from, in [0,1].
    pub base_risk: f64,
    /// Weighted sum before the override and clamp.
    pub raw_score: f64,
    /// Whether the critical floor lifted the raw score.
    pub override_applied: bool,
    /// Final bounded score in [0,1].
    pub final_score: f64,
    pub tier: RiskTier,
}

/// Fuses the AI base risk with the symptom checklist.
///
/// `raw = base·W_AI + itch·W_ITCH + bleed·W_BLEED + growth·W_GROWTH`; a
/// critical symptom floors the score at [`CRITICAL_FLOOR`] (a floor, never a
/// bonus: scores already above it are untouched); the result is clamped to
/// [0,1]. Deterministic and side-effect-free, and monotonically
/// non-decreasing in the base risk and in each flag independently.
pub fn fuse(base_risk: f64, symptoms: SymptomFlags) -> RiskAssessment {
    let raw_score = base_risk * AI_WEIGHT
        + if symptoms.itch { ITCH_WEIGHT } else { 0.0 }
        + if symptoms.bleed { BLEED_WEIGHT } else { 0.0 }
        + if symptoms.growth { GROWTH_WEIGHT } else { 0.0 };

    let override_applied = symptoms.is_critical() && raw_score < CRITICAL_FLOOR;
    let floored = if symptoms.is_critical() {
        raw_score.max(CRITICAL_FLOOR)
    } else {
        raw_score
    };
    let final_score = floored.clamp(0.0, 1.0);

    RiskAssessment {
        base_risk,
        raw_score,
        override_applied,
        final_score,
        tier: RiskTier::for_score(final_score),
    }
}
