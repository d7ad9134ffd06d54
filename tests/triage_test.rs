use dermascan::{fuse, RiskTier, SymptomFlags, CRITICAL_FLOOR, FALLBACK_BASE_RISK};

const ALL_FLAG_COMBOS: [(bool, bool, bool); 8] = [
    (false, false, false),
    (true, false, false),
    (false, true, false),
    (false, false, true),
    (true, true, false),
    (true, false, true),
    (false, true, true),
    (true, true, true),
];

fn flags(itch: bool, bleed: bool, growth: bool) -> SymptomFlags {
    SymptomFlags { itch, bleed, growth }
}

#[test]
fn test_scenario_midline_without_symptoms() {
    let assessment = fuse(0.5, SymptomFlags::none());
    assert!((assessment.raw_score - 0.35).abs() < 1e-12);
    assert!(!assessment.override_applied);
    assert_eq!(assessment.tier, RiskTier::Caution);
}

#[test]
fn test_scenario_bleeding_overrides_zero_base() {
    let assessment = fuse(0.0, flags(false, true, false));
    assert!((assessment.raw_score - 0.15).abs() < 1e-12);
    assert!(assessment.override_applied);
    assert_eq!(assessment.final_score, 0.75);
    assert_eq!(assessment.tier, RiskTier::Danger);
}

#[test]
fn test_scenario_everything_elevated_clamps_to_one() {
    let assessment = fuse(0.9, flags(true, true, true));
    assert!((assessment.raw_score - 1.03).abs() < 1e-12);
    assert_eq!(assessment.final_score, 1.0);
    assert_eq!(assessment.tier, RiskTier::Danger);
}

#[test]
fn test_scenario_fallback_base_without_symptoms_is_safe() {
    let assessment = fuse(FALLBACK_BASE_RISK, SymptomFlags::none());
    assert!((assessment.raw_score - 0.07).abs() < 1e-12);
    assert_eq!(assessment.tier, RiskTier::Safe);
}

#[test]
fn test_final_score_monotone_in_base_risk() {
    for (itch, bleed, growth) in ALL_FLAG_COMBOS {
        let symptoms = flags(itch, bleed, growth);
        let mut previous = f64::MIN;
        for step in 0..=100 {
            let base_risk = f64::from(step) / 100.0;
            let score = fuse(base_risk, symptoms).final_score;
            assert!(
                score >= previous,
                "score decreased at base {base_risk} with flags {symptoms:?}"
            );
            previous = score;
        }
    }
}

#[test]
fn test_setting_any_flag_never_lowers_the_score() {
    for step in 0..=100 {
        let base_risk = f64::from(step) / 100.0;
        for (itch, bleed, growth) in ALL_FLAG_COMBOS {
            let baseline = fuse(base_risk, flags(itch, bleed, growth)).final_score;
            assert!(fuse(base_risk, flags(true, bleed, growth)).final_score >= baseline);
            assert!(fuse(base_risk, flags(itch, true, growth)).final_score >= baseline);
            assert!(fuse(base_risk, flags(itch, bleed, true)).final_score >= baseline);
        }
    }
}

#[test]
fn test_critical_symptom_floors_the_score() {
    for step in 0..=100 {
        let base_risk = f64::from(step) / 100.0;
        for (itch, bleed, growth) in ALL_FLAG_COMBOS {
            if !(bleed || growth) {
                continue;
            }
            let assessment = fuse(base_risk, flags(itch, bleed, growth));
            assert!(assessment.final_score >= CRITICAL_FLOOR);
            assert_eq!(assessment.tier, RiskTier::Danger);
        }
    }
}

#[test]
fn test_final_score_always_bounded() {
    // Including garbage base risk outside [0,1], which the fusion tolerates.
    for base_risk in [-1.0, -0.01, 0.0, 0.5, 1.0, 1.5, 10.0] {
        for (itch, bleed, growth) in ALL_FLAG_COMBOS {
            let assessment = fuse(base_risk, flags(itch, bleed, growth));
            assert!((0.0..=1.0).contains(&assessment.final_score));
        }
    }
}

#[test]
fn test_tier_boundaries_are_exact() {
    assert_eq!(RiskTier::for_score(0.30), RiskTier::Safe);
    assert_eq!(RiskTier::for_score(0.300001), RiskTier::Caution);
    assert_eq!(RiskTier::for_score(0.709999), RiskTier::Caution);
    assert_eq!(RiskTier::for_score(0.71), RiskTier::Danger);
}
