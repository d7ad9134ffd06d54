use std::fmt;

use serde::{Deserialize, Serialize};

/// Fused score at or above which a lesion is classified `Danger`.
pub const DANGER_THRESHOLD: f64 = 0.71;
/// Fused score at or below which a lesion is classified `Safe`.
pub const SAFE_THRESHOLD: f64 = 0.30;

/// Traffic-light classification of a fused risk score.
///
/// A static table: each tier carries a fixed label, color, and recommended
/// action. `Danger` is closed at 0.71, `Safe` is closed at 0.30, `Caution`
/// is the open interval between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Safe,
    Caution,
    Danger,
}

impl RiskTier {
    pub fn for_score(score: f64) -> Self {
        if score >= DANGER_THRESHOLD {
            RiskTier::Danger
        } else if score > SAFE_THRESHOLD {
            RiskTier::Caution
        } else {
            RiskTier::Safe
        }
    }

    /// User-facing status line, as persisted in scan records.
    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Safe => "Safe - Normal Spot",
            RiskTier::Caution => "Caution - Visit Local Clinic",
            RiskTier::Danger => "Danger - See Specialist Urgently",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            RiskTier::Safe => "#388E3C",
            RiskTier::Caution => "#FBC02D",
            RiskTier::Danger => "#D32F2F",
        }
    }

    pub fn action(self) -> &'static str {
        match self {
            RiskTier::Safe => "normal spot, monitor",
            RiskTier::Caution => "visit local clinic",
            RiskTier::Danger => "see specialist urgently",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskTier::Safe => "SAFE",
            RiskTier::Caution => "CAUTION",
            RiskTier::Danger => "DANGER",
        };
        write!(f, "{name}")
    }
}
