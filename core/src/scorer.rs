//! Risk scorer: customer record in, delinquency probability out.
//!
//! The probability is a weighted sum of four normalised factors:
//!
//!   payment     = missed_payments / 6            (weight 0.30)
//!   utilization = credit_utilization             (weight 0.25)
//!   score       = (850 - credit_score) / 850     (weight 0.25)
//!   dti         = debt_to_income_ratio           (weight 0.20)
//!
//! rounded half-up to 3 decimals. Risk tier and collection action are
//! both step functions of that one rounded value.
//!
//! RULES:
//!   - The weighted sum is computed once per record.
//!   - DTI is never clamped. A DTI above 1.0 can push the probability
//!     above 1.0 and that is reported as-is.
//!   - `delinquent_account` is never read here.

use crate::{
    customer::{CustomerRecord, MAX_CREDIT_SCORE, MAX_MISSED_PAYMENTS},
    error::{ScoreError, ScoreResult},
};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PROBABILITY_DECIMALS: u32 = 3;

// ── Classes ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    High,
    Medium,
    Low,
}

impl RiskTier {
    /// Report order: most severe first.
    pub const ALL: [RiskTier; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High   => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low    => "LOW",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionAction {
    ImmediateAction,
    ProactiveMonitoring,
    StandardMonitoring,
    LowPriority,
}

impl CollectionAction {
    pub const ALL: [CollectionAction; 4] = [
        Self::ImmediateAction,
        Self::ProactiveMonitoring,
        Self::StandardMonitoring,
        Self::LowPriority,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImmediateAction     => "IMMEDIATE_ACTION",
            Self::ProactiveMonitoring => "PROACTIVE_MONITORING",
            Self::StandardMonitoring  => "STANDARD_MONITORING",
            Self::LowPriority         => "LOW_PRIORITY",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl fmt::Display for CollectionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Model parameters ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskWeights {
    pub missed_payments:      f64,
    pub credit_utilization:   f64,
    pub credit_score:         f64,
    pub debt_to_income_ratio: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            missed_payments:      0.30,
            credit_utilization:   0.25,
            credit_score:         0.25,
            debt_to_income_ratio: 0.20,
        }
    }
}

/// Inclusive lower bounds of the tier scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TierThresholds {
    pub high:   f64,
    pub medium: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self { high: 0.70, medium: 0.30 }
    }
}

/// Inclusive lower bounds of the collection-action scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ActionThresholds {
    pub immediate: f64,
    pub proactive: f64,
    pub standard:  f64,
}

impl Default for ActionThresholds {
    fn default() -> Self {
        Self { immediate: 0.70, proactive: 0.50, standard: 0.30 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskModel {
    pub model_version: String,
    pub weights:       RiskWeights,
    pub tiers:         TierThresholds,
    pub actions:       ActionThresholds,
}

impl Default for RiskModel {
    fn default() -> Self {
        Self {
            model_version: "rule-v1".into(),
            weights:       RiskWeights::default(),
            tiers:         TierThresholds::default(),
            actions:       ActionThresholds::default(),
        }
    }
}

impl RiskModel {
    /// Reject parameter sets the classification tables cannot honour.
    ///
    /// The action scale must share the tier scale's boundaries so that
    /// HIGH always maps to IMMEDIATE_ACTION and LOW to LOW_PRIORITY.
    pub fn validate(&self) -> ScoreResult<()> {
        let w = &self.weights;
        for (name, weight) in [
            ("missed_payments", w.missed_payments),
            ("credit_utilization", w.credit_utilization),
            ("credit_score", w.credit_score),
            ("debt_to_income_ratio", w.debt_to_income_ratio),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ScoreError::InvalidConfig(format!(
                    "weight '{name}' must be finite and >= 0, got {weight}"
                )));
            }
        }

        let t = &self.tiers;
        if !(t.high > t.medium && t.medium > 0.0) {
            return Err(ScoreError::InvalidConfig(format!(
                "tier thresholds must descend: high={} medium={}",
                t.high, t.medium
            )));
        }

        let a = &self.actions;
        if !(a.immediate > a.proactive && a.proactive > a.standard && a.standard > 0.0) {
            return Err(ScoreError::InvalidConfig(format!(
                "action thresholds must descend: immediate={} proactive={} standard={}",
                a.immediate, a.proactive, a.standard
            )));
        }
        if a.immediate != t.high || a.standard != t.medium {
            return Err(ScoreError::InvalidConfig(format!(
                "action scale boundaries ({}, {}) must match tier scale ({}, {})",
                a.immediate, a.standard, t.high, t.medium
            )));
        }
        Ok(())
    }

    /// Score one record. Pure: same record, same result.
    ///
    /// The model is validated first, so a hand-built model whose tier and
    /// action scales disagree yields `InvalidConfig` instead of a record.
    pub fn score(&self, record: &CustomerRecord) -> ScoreResult<ScoredRecord> {
        self.validate()?;
        record.check()?;

        let components = self.components(record);
        let delinquency_probability = round_half_up(components.total(), PROBABILITY_DECIMALS);

        Ok(ScoredRecord {
            record: record.clone(),
            delinquency_probability,
            risk_tier: self.tier_for(delinquency_probability),
            collection_action: self.action_for(delinquency_probability),
            components,
        })
    }

    /// Weighted factor contributions, before rounding.
    pub fn components(&self, record: &CustomerRecord) -> RiskComponents {
        let w = &self.weights;
        let max_score = MAX_CREDIT_SCORE as f64;

        let payment = f64::from(record.missed_payments) / MAX_MISSED_PAYMENTS as f64;
        let utilization = record.credit_utilization;
        let score = (max_score - f64::from(record.credit_score)) / max_score;
        let dti = record.debt_to_income_ratio;

        RiskComponents {
            payment:     w.missed_payments * payment,
            utilization: w.credit_utilization * utilization,
            score:       w.credit_score * score,
            dti:         w.debt_to_income_ratio * dti,
        }
    }

    pub fn tier_for(&self, probability: f64) -> RiskTier {
        let t = &self.tiers;
        if probability >= t.high {
            RiskTier::High
        } else if probability >= t.medium {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn action_for(&self, probability: f64) -> CollectionAction {
        let a = &self.actions;
        if probability >= a.immediate {
            CollectionAction::ImmediateAction
        } else if probability >= a.proactive {
            CollectionAction::ProactiveMonitoring
        } else if probability >= a.standard {
            CollectionAction::StandardMonitoring
        } else {
            CollectionAction::LowPriority
        }
    }
}

/// Score with the default model.
pub fn score(record: &CustomerRecord) -> ScoreResult<ScoredRecord> {
    RiskModel::default().score(record)
}

// ── Output ───────────────────────────────────────────────────────────────────

/// Weighted contribution of each factor to the unrounded total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskComponents {
    pub payment:     f64,
    pub utilization: f64,
    pub score:       f64,
    pub dti:         f64,
}

impl RiskComponents {
    pub fn total(&self) -> f64 {
        self.payment + self.utilization + self.score + self.dti
    }

    /// Name of the largest contribution. Ties go to the earlier factor.
    pub fn primary_driver(&self) -> &'static str {
        [
            ("missed_payments", self.payment),
            ("credit_utilization", self.utilization),
            ("credit_score", self.score),
            ("debt_to_income_ratio", self.dti),
        ]
        .into_iter()
        .fold(("missed_payments", f64::NEG_INFINITY), |best, cur| {
            if cur.1 > best.1 { cur } else { best }
        })
        .0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record:                  CustomerRecord,
    pub delinquency_probability: f64,
    pub risk_tier:               RiskTier,
    pub collection_action:       CollectionAction,
    pub components:              RiskComponents,
}

impl ScoredRecord {
    pub fn customer_id(&self) -> &str {
        &self.record.customer_id
    }

    pub fn is_high_risk(&self) -> bool {
        self.risk_tier == RiskTier::High
    }
}

// ── Rounding ─────────────────────────────────────────────────────────────────

/// Round half away from zero at `decimals` places.
///
/// The scaled value is first snapped to 1e-9 so that binary noise such as
/// 59.4999999999 (from a sum that is exactly 0.0595 in decimal) rounds up
/// the way a decimal engine would.
pub fn round_half_up(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    let snapped = (scaled * 1e9).round() / 1e9;
    let rounded = if snapped >= 0.0 {
        (snapped + 0.5).floor()
    } else {
        (snapped - 0.5).ceil()
    };
    rounded / factor
}
