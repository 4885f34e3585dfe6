//! Segment aggregation over scored records.

mod common;

use common::customer;
use delinquency_core::{
    aggregate::{Aggregator, Dimension, GroupTable},
    bands::Bands,
    batch::score_batch,
    population::generate_portfolio,
    RiskModel, ScoredRecord,
};

fn scored(records: &[delinquency_core::CustomerRecord]) -> Vec<ScoredRecord> {
    let outcome = score_batch(&RiskModel::default(), records);
    assert!(outcome.rejected.is_empty());
    outcome.scored
}

/// Rates and the prediction gap per group.
#[test]
fn group_rates_and_gap() {
    let mut records = vec![
        customer("a1", 6, 1.0, 300, 1.0), // HIGH
        customer("a2", 6, 1.0, 850, 0.75), // HIGH (0.70)
        customer("a3", 0, 0.1, 800, 0.1), // LOW
        customer("a4", 0, 0.0, 850, 0.0), // LOW
    ];
    records[0].delinquent_account = true;
    for r in records.iter_mut().take(2) {
        r.employment_status = "Unemployed".into();
    }
    let scored = scored(&records);

    let rows = Aggregator::new(Bands::default()).summarize(&scored, &[Dimension::EmploymentStatus]);
    assert_eq!(rows.len(), 2);

    // BTreeMap order: Employed < Unemployed
    let employed = &rows[0];
    assert_eq!(employed.key, vec!["Employed".to_string()]);
    assert_eq!(employed.count, 2);
    assert_eq!(employed.high_risk_rate, 0.0);
    assert!((employed.avg_probability - 0.030).abs() < 1e-12);

    let unemployed = &rows[1];
    assert_eq!(unemployed.count, 2);
    assert_eq!(unemployed.high_risk_rate, 1.0);
    assert_eq!(unemployed.actual_delinquency_rate, 0.5);
    assert!((unemployed.prediction_gap - 0.5).abs() < 1e-12);
    assert!((unemployed.avg_probability - 0.806).abs() < 1e-12);
}

/// Bucketed dimensions use the band tables, with exclusive upper bounds.
#[test]
fn banded_dimensions_use_band_labels() {
    let mut a = customer("b1", 0, 0.30, 700, 0.36);
    a.income = 30_000.0;
    a.age = 25;
    let mut b = customer("b2", 0, 0.29, 700, 0.35);
    b.income = 29_999.0;
    b.age = 26;
    let scored = scored(&[a, b]);
    let agg = Aggregator::new(Bands::default());

    assert_eq!(agg.key_for(&scored[0], &[Dimension::IncomeBracket]), vec!["30K-80K"]);
    assert_eq!(agg.key_for(&scored[1], &[Dimension::IncomeBracket]), vec!["<30K"]);
    assert_eq!(agg.key_for(&scored[0], &[Dimension::AgeBracket]), vec!["18-25"]);
    assert_eq!(agg.key_for(&scored[1], &[Dimension::AgeBracket]), vec!["26-35"]);
    assert_eq!(agg.key_for(&scored[0], &[Dimension::UtilizationBand]), vec!["Moderate (30-50%)"]);
    assert_eq!(agg.key_for(&scored[1], &[Dimension::UtilizationBand]), vec!["Low (<30%)"]);
    assert_eq!(agg.key_for(&scored[0], &[Dimension::DtiBand]), vec!["Elevated (36-60%)"]);
    assert_eq!(agg.key_for(&scored[1], &[Dimension::DtiBand]), vec!["Manageable (20-36%)"]);
}

/// DTI above 1.0 lands in the open-ended top band.
#[test]
fn stressed_dti_lands_in_top_band() {
    let scored = scored(&[customer("s1", 0, 0.0, 850, 1.5)]);
    let agg = Aggregator::new(Bands::default());
    assert_eq!(agg.key_for(&scored[0], &[Dimension::DtiBand]), vec!["Severe (60%+)"]);
}

/// Crossed dimensions produce compound keys and labels.
#[test]
fn crossed_dimensions_build_compound_keys() {
    let mut r = customer("x1", 1, 0.2, 700, 0.2);
    r.income = 95_000.0;
    let scored = scored(&[r]);
    let rows = Aggregator::new(Bands::default())
        .summarize(&scored, &[Dimension::EmploymentStatus, Dimension::IncomeBracket]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].label(), "Employed / 80K-150K");
    assert_eq!(rows[0].dimension_label(), "employment_status / income_bracket");
}

/// Parallel grouping matches sequential: counts exactly, sums within tolerance.
#[test]
fn parallel_grouping_matches_sequential() {
    let scored = scored(&generate_portfolio(7, 2_000));
    let agg = Aggregator::new(Bands::default());
    let dims = [Dimension::Location, Dimension::CreditScoreBand];

    let seq = agg.summarize(&scored, &dims);
    let par = agg.summarize_par(&scored, &dims);
    assert_eq!(seq.len(), par.len());
    for (s, p) in seq.iter().zip(&par) {
        assert_eq!(s.key, p.key);
        assert_eq!(s.count, p.count);
        assert_eq!(s.high_risk_rate, p.high_risk_rate);
        assert_eq!(s.actual_delinquency_rate, p.actual_delinquency_rate);
        assert!((s.avg_probability - p.avg_probability).abs() < 1e-9);
    }
    let total: u64 = seq.iter().map(|r| r.count).sum();
    assert_eq!(total, 2_000);
}

/// Merging partial tables equals grouping everything at once.
#[test]
fn partial_tables_merge_by_addition() {
    let scored = scored(&generate_portfolio(11, 300));
    let agg = Aggregator::new(Bands::default());
    let dims = [Dimension::RiskTier];

    let (left, right) = scored.split_at(120);
    let merged: GroupTable = agg.group(left, &dims).merge(agg.group(right, &dims));
    let whole = agg.group(&scored, &dims);

    assert_eq!(merged.len(), whole.len());
    for ((mk, ms), (wk, ws)) in merged.iter().zip(whole.iter()) {
        assert_eq!(mk, wk);
        assert_eq!(ms.count, ws.count);
        assert_eq!(ms.high_risk_count, ws.high_risk_count);
        assert_eq!(ms.delinquent_count, ws.delinquent_count);
    }
}

/// An empty portfolio yields no rows and a zeroed overall group.
#[test]
fn empty_portfolio_has_no_groups() {
    let agg = Aggregator::new(Bands::default());
    assert!(agg.summarize(&[], &[Dimension::Location]).is_empty());
    let overall = agg.overall(&[]);
    assert_eq!(overall.count, 0);
    assert_eq!(overall.high_risk_rate(), 0.0);
}
