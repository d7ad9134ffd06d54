mod classes;
mod fusion;
mod policy;

pub use classes::LesionClass;
pub use fusion::{
    fuse, RiskAssessment, SymptomFlags, AI_WEIGHT, BLEED_WEIGHT, CRITICAL_FLOOR, GROWTH_WEIGHT,
    ITCH_WEIGHT,
};
pub use policy::{RiskTier, DANGER_THRESHOLD, SAFE_THRESHOLD};
