//! Risk scorer: formula, rounding, classification boundaries.

mod common;

use common::{clean_customer, customer};
use delinquency_core::{
    score,
    scorer::{round_half_up, RiskModel},
    CollectionAction, RiskTier, ScoreError,
};

/// Worst case on every factor with DTI at 1.0 scores 0.912, HIGH.
#[test]
fn worst_case_customer_scores_0_912() {
    let r = customer("c-worst", 6, 1.0, 300, 1.0);
    let s = score(&r).unwrap();
    assert_eq!(s.delinquency_probability, 0.912);
    assert_eq!(s.risk_tier, RiskTier::High);
    assert_eq!(s.collection_action, CollectionAction::ImmediateAction);
}

/// A healthy customer scores 0.060, LOW.
#[test]
fn healthy_customer_scores_0_060() {
    let r = customer("c-healthy", 0, 0.1, 800, 0.1);
    let s = score(&r).unwrap();
    assert_eq!(s.delinquency_probability, 0.060);
    assert_eq!(s.risk_tier, RiskTier::Low);
    assert_eq!(s.collection_action, CollectionAction::LowPriority);
}

/// A zero-risk customer scores exactly 0.
#[test]
fn zero_risk_customer_scores_zero() {
    let s = score(&clean_customer("c-zero")).unwrap();
    assert_eq!(s.delinquency_probability, 0.0);
    assert_eq!(s.risk_tier, RiskTier::Low);
}

/// DTI 1.5 alone is scored unclamped: 0.2 * 1.5 = 0.300, on the MEDIUM boundary.
#[test]
fn dti_above_one_is_not_clamped() {
    let r = customer("c-dti", 0, 0.0, 850, 1.5);
    let s = score(&r).unwrap();
    assert_eq!(s.delinquency_probability, 0.300);
    assert_eq!(s.risk_tier, RiskTier::Medium);
    assert_eq!(s.collection_action, CollectionAction::StandardMonitoring);
}

/// Very high DTI can push the probability above 1.0.
#[test]
fn extreme_dti_can_exceed_one() {
    let r = customer("c-dti-extreme", 6, 1.0, 300, 2.0);
    let s = score(&r).unwrap();
    assert!(s.delinquency_probability > 1.0, "got {}", s.delinquency_probability);
    assert_eq!(s.risk_tier, RiskTier::High);
}

/// Exactly 0.70 is HIGH; 0.699 is MEDIUM.
#[test]
fn high_boundary_is_inclusive() {
    // 0.30 + 0.25 + 0.2 * 0.75
    let at = score(&customer("c-at-70", 6, 1.0, 850, 0.75)).unwrap();
    assert_eq!(at.delinquency_probability, 0.70);
    assert_eq!(at.risk_tier, RiskTier::High);
    assert_eq!(at.collection_action, CollectionAction::ImmediateAction);

    let below = score(&customer("c-below-70", 6, 1.0, 850, 0.745)).unwrap();
    assert_eq!(below.delinquency_probability, 0.699);
    assert_eq!(below.risk_tier, RiskTier::Medium);
    assert_eq!(below.collection_action, CollectionAction::ProactiveMonitoring);
}

/// Exactly 0.50 is PROACTIVE_MONITORING; 0.499 is STANDARD_MONITORING. Both MEDIUM.
#[test]
fn proactive_boundary_is_inclusive() {
    // 0.15 + 0.25 + 0.2 * 0.5
    let at = score(&customer("c-at-50", 3, 1.0, 850, 0.5)).unwrap();
    assert_eq!(at.delinquency_probability, 0.50);
    assert_eq!(at.risk_tier, RiskTier::Medium);
    assert_eq!(at.collection_action, CollectionAction::ProactiveMonitoring);

    let below = score(&customer("c-below-50", 3, 1.0, 850, 0.495)).unwrap();
    assert_eq!(below.delinquency_probability, 0.499);
    assert_eq!(below.risk_tier, RiskTier::Medium);
    assert_eq!(below.collection_action, CollectionAction::StandardMonitoring);
}

/// Exactly 0.30 is MEDIUM; 0.299 is LOW.
#[test]
fn medium_boundary_is_inclusive() {
    // 0.25 + 0.2 * 0.25
    let at = score(&customer("c-at-30", 0, 1.0, 850, 0.25)).unwrap();
    assert_eq!(at.delinquency_probability, 0.30);
    assert_eq!(at.risk_tier, RiskTier::Medium);
    assert_eq!(at.collection_action, CollectionAction::StandardMonitoring);

    let below = score(&customer("c-below-30", 0, 1.0, 850, 0.245)).unwrap();
    assert_eq!(below.delinquency_probability, 0.299);
    assert_eq!(below.risk_tier, RiskTier::Low);
    assert_eq!(below.collection_action, CollectionAction::LowPriority);
}

/// Tier and action come from the rounded probability, not the raw sum.
#[test]
fn classification_uses_rounded_probability() {
    let model = RiskModel::default();
    // raw 0.6995 rounds half-up to 0.700
    assert_eq!(round_half_up(0.6995, 3), 0.7);
    assert_eq!(model.tier_for(round_half_up(0.6995, 3)), RiskTier::High);
    assert_eq!(model.tier_for(0.6995), RiskTier::Medium);
}

/// Components sum to the unrounded total and name the dominant factor.
#[test]
fn components_explain_the_score() {
    let r = customer("c-components", 6, 0.2, 850, 0.1);
    let s = score(&r).unwrap();
    assert!((s.components.payment - 0.30).abs() < 1e-12);
    assert!((s.components.utilization - 0.05).abs() < 1e-12);
    assert!(s.components.score.abs() < 1e-12);
    assert!((s.components.dti - 0.02).abs() < 1e-12);
    assert_eq!(s.components.primary_driver(), "missed_payments");
    assert_eq!(s.delinquency_probability, round_half_up(s.components.total(), 3));
}

/// Flipping the delinquency label never changes the score.
#[test]
fn label_does_not_influence_score() {
    let mut r = customer("c-label", 2, 0.55, 640, 0.4);
    r.delinquent_account = false;
    let a = score(&r).unwrap();
    r.delinquent_account = true;
    let b = score(&r).unwrap();
    assert_eq!(a.delinquency_probability.to_bits(), b.delinquency_probability.to_bits());
    assert_eq!(a.risk_tier, b.risk_tier);
    assert_eq!(a.collection_action, b.collection_action);
}

/// Scoring the same record twice gives identical output.
#[test]
fn scoring_is_deterministic() {
    let r = customer("c-det", 4, 0.81, 512, 0.67);
    assert_eq!(score(&r).unwrap(), score(&r).unwrap());
}

/// A directly built record with credit_score -1 is rejected, not scored.
#[test]
fn negative_credit_score_is_invalid_input() {
    let r = customer("c-neg", 0, 0.2, -1, 0.2);
    match score(&r) {
        Err(ScoreError::InvalidInput { customer_id, field, .. }) => {
            assert_eq!(customer_id, "c-neg");
            assert_eq!(field, "credit_score");
        }
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

/// Utilization outside [0, 1] is rejected.
#[test]
fn utilization_out_of_domain_is_invalid_input() {
    let r = customer("c-util", 0, 1.2, 700, 0.2);
    let err = score(&r).unwrap_err();
    assert_eq!(err.field(), Some("credit_utilization"));
}

/// Missed payments above the six-month window are rejected.
#[test]
fn missed_payments_above_six_is_invalid_input() {
    let r = customer("c-missed", 7, 0.2, 700, 0.2);
    let err = score(&r).unwrap_err();
    assert_eq!(err.field(), Some("missed_payments"));
}

/// Negative or non-finite DTI is rejected even though values above 1 are allowed.
#[test]
fn negative_or_nan_dti_is_invalid_input() {
    assert_eq!(
        score(&customer("c-neg-dti", 0, 0.2, 700, -0.1)).unwrap_err().field(),
        Some("debt_to_income_ratio")
    );
    assert_eq!(
        score(&customer("c-nan-dti", 0, 0.2, 700, f64::NAN)).unwrap_err().field(),
        Some("debt_to_income_ratio")
    );
}

/// A model with custom thresholds still classifies from one probability.
#[test]
fn custom_thresholds_shift_classification() {
    let mut model = RiskModel::default();
    model.tiers.high = 0.60;
    model.actions.immediate = 0.60;
    model.validate().unwrap();

    let s = model.score(&customer("c-custom", 3, 1.0, 850, 0.5)).unwrap();
    assert_eq!(s.delinquency_probability, 0.50);
    assert_eq!(s.risk_tier, RiskTier::Medium);

    let s = model.score(&customer("c-custom-hi", 6, 1.0, 850, 0.25)).unwrap();
    assert_eq!(s.delinquency_probability, 0.60);
    assert_eq!(s.risk_tier, RiskTier::High);
    assert_eq!(s.collection_action, CollectionAction::ImmediateAction);
}

/// A model whose action scale drifts from its tier scale refuses to score.
#[test]
fn mismatched_action_scale_refuses_to_score() {
    let mut model = RiskModel::default();
    model.actions.immediate = 0.75;

    let err = model.score(&customer("c-drift", 6, 1.0, 0, 0.5)).unwrap_err();
    assert!(matches!(err, ScoreError::InvalidConfig(_)), "got: {err}");
}
