//! Portfolio reports built on scored records.
//!
//! This module:
//!   1. Summarises portfolio health (size, delinquency, mean probability)
//!   2. Counts customers per risk tier and per collection action
//!   3. Profiles the HIGH tier
//!   4. Correlates each risk driver with the delinquency label
//!   5. Counts payment statuses per history month
//!   6. Summarises data quality for a batch
//!
//! Everything here is a read-only reduction; nothing feeds back into
//! scoring.

use crate::{
    batch::BatchOutcome,
    customer::{CustomerRecord, PaymentStatus},
    scorer::{CollectionAction, RiskTier, ScoredRecord},
    types::HISTORY_MONTHS,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

// ── Overview ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioOverview {
    pub total_customers:  u64,
    pub delinquent_count: u64,
    pub delinquency_rate: f64,
    pub avg_probability:  f64,
}

pub fn portfolio_overview(records: &[ScoredRecord]) -> PortfolioOverview {
    let total = records.len() as u64;
    let delinquent = records.iter().filter(|r| r.record.delinquent_account).count() as u64;
    let prob_sum: f64 = records.iter().map(|r| r.delinquency_probability).sum();
    PortfolioOverview {
        total_customers:  total,
        delinquent_count: delinquent,
        delinquency_rate: share(delinquent, total),
        avg_probability:  if total == 0 { 0.0 } else { prob_sum / total as f64 },
    }
}

fn share(count: u64, total: u64) -> f64 {
    if total == 0 { 0.0 } else { count as f64 / total as f64 }
}

// ── Distributions ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassCount {
    pub class: String,
    pub count: u64,
    pub share: f64,
}

/// Tier counts in HIGH, MEDIUM, LOW order. Empty tiers are kept.
pub fn tier_distribution(records: &[ScoredRecord]) -> Vec<ClassCount> {
    let total = records.len() as u64;
    RiskTier::ALL
        .iter()
        .map(|tier| {
            let count = records.iter().filter(|r| r.risk_tier == *tier).count() as u64;
            ClassCount { class: tier.as_str().into(), count, share: share(count, total) }
        })
        .collect()
}

/// Action counts, most urgent first. Empty actions are kept.
pub fn action_distribution(records: &[ScoredRecord]) -> Vec<ClassCount> {
    let total = records.len() as u64;
    CollectionAction::ALL
        .iter()
        .map(|action| {
            let count = records.iter().filter(|r| r.collection_action == *action).count() as u64;
            ClassCount { class: action.as_str().into(), count, share: share(count, total) }
        })
        .collect()
}

// ── High-risk profile ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HighRiskProfile {
    pub customers:              u64,
    pub avg_income:             f64,
    pub avg_credit_score:       f64,
    pub avg_credit_utilization: f64,
    pub avg_missed_payments:    f64,
    pub avg_debt_to_income:     f64,
}

/// Averages over HIGH-tier customers. `None` when there are none.
pub fn high_risk_profile(records: &[ScoredRecord]) -> Option<HighRiskProfile> {
    let high: Vec<_> = records.iter().filter(|r| r.is_high_risk()).map(|r| &r.record).collect();
    if high.is_empty() {
        return None;
    }
    Some(HighRiskProfile {
        customers:              high.len() as u64,
        avg_income:             mean_of(&high, |r| r.income),
        avg_credit_score:       mean_of(&high, |r| f64::from(r.credit_score)),
        avg_credit_utilization: mean_of(&high, |r| r.credit_utilization),
        avg_missed_payments:    mean_of(&high, |r| f64::from(r.missed_payments)),
        avg_debt_to_income:     mean_of(&high, |r| r.debt_to_income_ratio),
    })
}

fn mean_of(records: &[&CustomerRecord], f: impl Fn(&CustomerRecord) -> f64) -> f64 {
    records.iter().map(|r| f(r)).sum::<f64>() / records.len() as f64
}

// ── Risk drivers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverCorrelation {
    pub driver:      String,
    /// Pearson r against the delinquency label. `None` on zero variance.
    pub correlation: Option<f64>,
}

/// Correlation of each driver with `delinquent_account`, strongest
/// positive first; undefined correlations sort last.
pub fn driver_correlations(records: &[ScoredRecord]) -> Vec<DriverCorrelation> {
    let label: Vec<f64> = records
        .iter()
        .map(|r| if r.record.delinquent_account { 1.0 } else { 0.0 })
        .collect();

    let drivers: [(&str, fn(&ScoredRecord) -> f64); 5] = [
        ("missed_payments", |r| f64::from(r.record.missed_payments)),
        ("credit_utilization", |r| r.record.credit_utilization),
        ("credit_score", |r| f64::from(r.record.credit_score)),
        ("debt_to_income_ratio", |r| r.record.debt_to_income_ratio),
        ("delinquency_probability", |r| r.delinquency_probability),
    ];

    let mut out: Vec<DriverCorrelation> = drivers
        .iter()
        .map(|(name, extract)| {
            let xs: Vec<f64> = records.iter().map(extract).collect();
            DriverCorrelation { driver: (*name).into(), correlation: pearson(&xs, &label) }
        })
        .collect();

    out.sort_by(|a, b| match (a.correlation, b.correlation) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None)    => Ordering::Less,
        (None, Some(_))    => Ordering::Greater,
        (None, None)       => Ordering::Equal,
    });
    out
}

pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= f64::EPSILON || var_y <= f64::EPSILON {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

// ── Payment patterns ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthPattern {
    /// 1 = most recent.
    pub month:   usize,
    pub on_time: u64,
    pub late:    u64,
    pub missed:  u64,
}

pub fn payment_patterns(records: &[ScoredRecord]) -> Vec<MonthPattern> {
    (0..HISTORY_MONTHS)
        .map(|i| {
            let mut pattern = MonthPattern { month: i + 1, on_time: 0, late: 0, missed: 0 };
            for r in records {
                match r.record.payment_history[i] {
                    PaymentStatus::OnTime => pattern.on_time += 1,
                    PaymentStatus::Late   => pattern.late += 1,
                    PaymentStatus::Missed => pattern.missed += 1,
                }
            }
            pattern
        })
        .collect()
}

// ── Data quality ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataQuality {
    pub rows_read:             u64,
    pub rows_scored:           u64,
    pub rejected_by_field:     BTreeMap<String, u64>,
    /// DTI above 1.0, scored unclamped.
    pub dti_above_one:         u64,
    /// Scored above 1.0 as a consequence.
    pub probability_above_one: u64,
    pub without_loan:          u64,
}

pub fn data_quality(outcome: &BatchOutcome) -> DataQuality {
    let scored = &outcome.scored;
    let quality = DataQuality {
        rows_read:   outcome.total() as u64,
        rows_scored: scored.len() as u64,
        rejected_by_field: outcome
            .rejections_by_field()
            .into_iter()
            .map(|(field, n)| (field.to_string(), n as u64))
            .collect(),
        dti_above_one: scored.iter().filter(|r| r.record.debt_to_income_ratio > 1.0).count() as u64,
        probability_above_one: scored.iter().filter(|r| r.delinquency_probability > 1.0).count() as u64,
        without_loan: scored.iter().filter(|r| r.record.loan_balance.is_none()).count() as u64,
    };
    if quality.dti_above_one > 0 {
        log::warn!(
            "data quality: {} customers with DTI above 1.0 scored unclamped ({} above probability 1.0)",
            quality.dti_above_one,
            quality.probability_above_one,
        );
    }
    quality
}
