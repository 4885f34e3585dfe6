//! Fairness checks over segment summaries.
//!
//! For each group of a dimension:
//!   - disparate-impact ratio: the group's HIGH-tier rate divided by the
//!     highest group's rate; below the four-fifths threshold is flagged
//!   - deviation: group HIGH-tier rate minus the portfolio rate; flagged
//!     beyond the tolerance
//!   - calibration gap: predicted HIGH-tier rate minus actual delinquency
//!     rate; flagged beyond the tolerance
//!
//! These are screening heuristics, not significance tests.

use crate::aggregate::{Dimension, GroupStats, SegmentSummary};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FairnessConfig {
    pub four_fifths_threshold: f64,
    pub deviation_tolerance:   f64,
}

impl Default for FairnessConfig {
    fn default() -> Self {
        Self {
            four_fifths_threshold: 0.80,
            deviation_tolerance:   0.10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FairnessFinding {
    pub dimension:             String,
    pub group:                 String,
    pub count:                 u64,
    pub high_risk_rate:        f64,
    /// `None` when no group in the dimension has any HIGH-tier customer.
    pub disparate_impact:      Option<f64>,
    pub disparate_impact_flag: bool,
    pub deviation:             f64,
    pub deviation_flag:        bool,
    pub calibration_gap:       f64,
    pub calibration_flag:      bool,
}

impl FairnessFinding {
    pub fn is_flagged(&self) -> bool {
        self.disparate_impact_flag || self.deviation_flag || self.calibration_flag
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FairnessReport {
    pub dimension:         String,
    pub overall_high_rate: f64,
    pub findings:          Vec<FairnessFinding>,
}

impl FairnessReport {
    pub fn flagged(&self) -> impl Iterator<Item = &FairnessFinding> {
        self.findings.iter().filter(|f| f.is_flagged())
    }
}

/// Check one dimension's summary rows against the portfolio totals.
/// Rows come in key order from the aggregator and keep that order.
pub fn assess(
    dimension: Dimension,
    rows: &[SegmentSummary],
    overall: &GroupStats,
    config: &FairnessConfig,
) -> FairnessReport {
    let overall_rate = overall.high_risk_rate();
    let max_rate = rows.iter().map(|r| r.high_risk_rate).fold(0.0_f64, f64::max);

    let findings = rows
        .iter()
        .map(|row| {
            let disparate_impact = if max_rate > 0.0 {
                Some(row.high_risk_rate / max_rate)
            } else {
                None
            };
            let deviation = row.high_risk_rate - overall_rate;
            FairnessFinding {
                dimension: dimension.as_str().into(),
                group: row.label(),
                count: row.count,
                high_risk_rate: row.high_risk_rate,
                disparate_impact,
                disparate_impact_flag: disparate_impact
                    .is_some_and(|ratio| ratio < config.four_fifths_threshold),
                deviation,
                deviation_flag: deviation.abs() > config.deviation_tolerance,
                calibration_gap: row.prediction_gap,
                calibration_flag: row.prediction_gap.abs() > config.deviation_tolerance,
            }
        })
        .collect::<Vec<_>>();

    let flagged = findings.iter().filter(|f| f.is_flagged()).count();
    if flagged > 0 {
        log::warn!("fairness: {dimension} has {flagged} flagged group(s)");
    }

    FairnessReport {
        dimension: dimension.as_str().into(),
        overall_high_rate: overall_rate,
        findings,
    }
}
