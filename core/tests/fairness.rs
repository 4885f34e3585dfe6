//! Fairness checks over segment rates.

mod common;

use common::customer;
use delinquency_core::{
    aggregate::{Aggregator, Dimension},
    bands::Bands,
    batch::score_batch,
    fairness::{assess, FairnessConfig},
    RiskModel,
};

/// Ten customers in Houston all HIGH, ten in Phoenix with two HIGH.
fn skewed_portfolio() -> Vec<delinquency_core::ScoredRecord> {
    let mut records = Vec::new();
    for i in 0..10 {
        let mut r = customer(&format!("h{i}"), 6, 1.0, 300, 0.5);
        r.location = "Houston".into();
        r.delinquent_account = i < 5;
        records.push(r);
    }
    for i in 0..10 {
        let mut r = if i < 2 {
            customer(&format!("p{i}"), 6, 1.0, 300, 0.5)
        } else {
            customer(&format!("p{i}"), 0, 0.1, 800, 0.1)
        };
        r.location = "Phoenix".into();
        r.delinquent_account = i < 2;
        records.push(r);
    }
    let outcome = score_batch(&RiskModel::default(), &records);
    assert!(outcome.rejected.is_empty());
    outcome.scored
}

/// A group below four-fifths of the highest rate is flagged.
#[test]
fn four_fifths_rule_flags_low_ratio_group() {
    let scored = skewed_portfolio();
    let agg = Aggregator::new(Bands::default());
    let rows = agg.summarize(&scored, &[Dimension::Location]);
    let report = assess(Dimension::Location, &rows, &agg.overall(&scored), &FairnessConfig::default());

    assert_eq!(report.dimension, "location");
    assert!((report.overall_high_rate - 0.6).abs() < 1e-12);

    let houston = &report.findings[0];
    assert_eq!(houston.group, "Houston");
    assert_eq!(houston.disparate_impact, Some(1.0));
    assert!(!houston.disparate_impact_flag);

    let phoenix = &report.findings[1];
    assert_eq!(phoenix.group, "Phoenix");
    assert!((phoenix.disparate_impact.unwrap() - 0.2).abs() < 1e-12);
    assert!(phoenix.disparate_impact_flag);
    // 0.2 - 0.6
    assert!((phoenix.deviation + 0.4).abs() < 1e-12);
    assert!(phoenix.deviation_flag);
    // predicted 0.2 vs actual 0.2
    assert!(phoenix.calibration_gap.abs() < 1e-12);
    assert!(!phoenix.calibration_flag);

    // Houston: predicted 1.0 vs actual 0.5
    assert!((houston.calibration_gap - 0.5).abs() < 1e-12);
    assert!(houston.calibration_flag);

    assert_eq!(report.flagged().count(), 2);
}

/// With no HIGH customers anywhere the ratio is undefined and not flagged.
#[test]
fn no_high_risk_means_no_disparate_impact() {
    let records: Vec<_> = (0..6).map(|i| customer(&format!("l{i}"), 0, 0.1, 800, 0.1)).collect();
    let scored = score_batch(&RiskModel::default(), &records).scored;
    let agg = Aggregator::new(Bands::default());
    let rows = agg.summarize(&scored, &[Dimension::AgeBracket]);
    let report = assess(Dimension::AgeBracket, &rows, &agg.overall(&scored), &FairnessConfig::default());

    for f in &report.findings {
        assert_eq!(f.disparate_impact, None);
        assert!(!f.is_flagged());
    }
}

/// A looser threshold stops the flag.
#[test]
fn threshold_is_configurable() {
    let scored = skewed_portfolio();
    let agg = Aggregator::new(Bands::default());
    let rows = agg.summarize(&scored, &[Dimension::Location]);
    let config = FairnessConfig { four_fifths_threshold: 0.15, deviation_tolerance: 0.5 };
    let report = assess(Dimension::Location, &rows, &agg.overall(&scored), &config);

    assert!(!report.findings[1].disparate_impact_flag);
    assert!(!report.findings[1].deviation_flag);
}
