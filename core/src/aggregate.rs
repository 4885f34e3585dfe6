//! Segment aggregation: grouped reduction over scored records.
//!
//! Records are partitioned by one or more dimensions. Each group keeps
//! a `GroupStats` accumulator of plain sums and counts, so partial
//! results from independent chunks merge by addition. The parallel path
//! folds per rayon chunk and reduces with `merge`. Counts match the
//! sequential path exactly; probability sums match up to float
//! summation order.

use crate::{bands::Bands, scorer::ScoredRecord};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ── Dimensions ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    EmploymentStatus,
    Location,
    CreditCardType,
    IncomeBracket,
    AgeBracket,
    CreditScoreBand,
    UtilizationBand,
    TenureBand,
    DtiBand,
    RiskTier,
}

impl Dimension {
    pub const ALL: [Dimension; 10] = [
        Self::EmploymentStatus,
        Self::Location,
        Self::CreditCardType,
        Self::IncomeBracket,
        Self::AgeBracket,
        Self::CreditScoreBand,
        Self::UtilizationBand,
        Self::TenureBand,
        Self::DtiBand,
        Self::RiskTier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmploymentStatus => "employment_status",
            Self::Location         => "location",
            Self::CreditCardType   => "credit_card_type",
            Self::IncomeBracket    => "income_bracket",
            Self::AgeBracket       => "age_bracket",
            Self::CreditScoreBand  => "credit_score_band",
            Self::UtilizationBand  => "utilization_band",
            Self::TenureBand       => "tenure_band",
            Self::DtiBand          => "dti_band",
            Self::RiskTier         => "risk_tier",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == raw.trim())
    }

    /// The group label this record falls under.
    pub fn key_for(&self, scored: &ScoredRecord, bands: &Bands) -> String {
        let r = &scored.record;
        match self {
            Self::EmploymentStatus => r.employment_status.clone(),
            Self::Location         => r.location.clone(),
            Self::CreditCardType   => r.credit_card_type.clone(),
            Self::IncomeBracket    => bands.income.label_for(r.income).to_string(),
            Self::AgeBracket       => bands.age.label_for(f64::from(r.age)).to_string(),
            Self::CreditScoreBand  => bands.credit_score.label_for(f64::from(r.credit_score)).to_string(),
            Self::UtilizationBand  => bands.credit_utilization.label_for(r.credit_utilization).to_string(),
            Self::TenureBand       => bands.account_tenure.label_for(f64::from(r.account_tenure)).to_string(),
            Self::DtiBand          => bands.debt_to_income.label_for(r.debt_to_income_ratio).to_string(),
            Self::RiskTier         => scored.risk_tier.as_str().to_string(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Accumulator ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct GroupStats {
    pub count:            u64,
    pub probability_sum:  f64,
    pub high_risk_count:  u64,
    pub delinquent_count: u64,
}

impl GroupStats {
    pub fn add(&mut self, scored: &ScoredRecord) {
        self.count += 1;
        self.probability_sum += scored.delinquency_probability;
        if scored.is_high_risk() {
            self.high_risk_count += 1;
        }
        if scored.record.delinquent_account {
            self.delinquent_count += 1;
        }
    }

    pub fn merge(&mut self, other: &GroupStats) {
        self.count += other.count;
        self.probability_sum += other.probability_sum;
        self.high_risk_count += other.high_risk_count;
        self.delinquent_count += other.delinquent_count;
    }

    pub fn avg_probability(&self) -> f64 {
        ratio(self.probability_sum, self.count)
    }

    pub fn high_risk_rate(&self) -> f64 {
        ratio(self.high_risk_count as f64, self.count)
    }

    pub fn actual_delinquency_rate(&self) -> f64 {
        ratio(self.delinquent_count as f64, self.count)
    }
}

fn ratio(num: f64, count: u64) -> f64 {
    if count == 0 { 0.0 } else { num / count as f64 }
}

pub type GroupKey = Vec<String>;

/// Partial aggregate keyed by group. Mergeable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupTable {
    groups: BTreeMap<GroupKey, GroupStats>,
}

impl GroupTable {
    pub fn add(&mut self, key: GroupKey, scored: &ScoredRecord) {
        self.groups.entry(key).or_default().add(scored);
    }

    pub fn merge(mut self, other: GroupTable) -> GroupTable {
        for (key, stats) in other.groups {
            self.groups.entry(key).or_default().merge(&stats);
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &GroupStats)> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// ── Summary rows ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentSummary {
    pub dimensions:              Vec<Dimension>,
    pub key:                     GroupKey,
    pub count:                   u64,
    pub avg_probability:         f64,
    pub high_risk_rate:          f64,
    pub actual_delinquency_rate: f64,
    /// high_risk_rate - actual_delinquency_rate. Positive = over-predicts.
    pub prediction_gap:          f64,
}

impl SegmentSummary {
    fn from_stats(dimensions: &[Dimension], key: GroupKey, stats: &GroupStats) -> Self {
        let high_risk_rate = stats.high_risk_rate();
        let actual = stats.actual_delinquency_rate();
        Self {
            dimensions: dimensions.to_vec(),
            key,
            count: stats.count,
            avg_probability: stats.avg_probability(),
            high_risk_rate,
            actual_delinquency_rate: actual,
            prediction_gap: high_risk_rate - actual,
        }
    }

    /// Human-readable group label, e.g. `Employed / <30K`.
    pub fn label(&self) -> String {
        self.key.join(" / ")
    }

    /// Dimension names joined the same way, e.g. `employment_status / income_bracket`.
    pub fn dimension_label(&self) -> String {
        self.dimensions.iter().map(Dimension::as_str).collect::<Vec<_>>().join(" / ")
    }
}

// ── Aggregator ───────────────────────────────────────────────────────────────

pub struct Aggregator {
    bands: Bands,
}

impl Aggregator {
    pub fn new(bands: Bands) -> Self {
        Self { bands }
    }

    pub fn key_for(&self, scored: &ScoredRecord, dimensions: &[Dimension]) -> GroupKey {
        dimensions.iter().map(|d| d.key_for(scored, &self.bands)).collect()
    }

    pub fn group(&self, records: &[ScoredRecord], dimensions: &[Dimension]) -> GroupTable {
        let mut table = GroupTable::default();
        for scored in records {
            table.add(self.key_for(scored, dimensions), scored);
        }
        table
    }

    pub fn group_par(&self, records: &[ScoredRecord], dimensions: &[Dimension]) -> GroupTable {
        records
            .par_iter()
            .fold(GroupTable::default, |mut table, scored| {
                table.add(self.key_for(scored, dimensions), scored);
                table
            })
            .reduce(GroupTable::default, GroupTable::merge)
    }

    /// One summary row per group, ordered by key.
    pub fn summarize(&self, records: &[ScoredRecord], dimensions: &[Dimension]) -> Vec<SegmentSummary> {
        summaries(dimensions, &self.group(records, dimensions))
    }

    pub fn summarize_par(&self, records: &[ScoredRecord], dimensions: &[Dimension]) -> Vec<SegmentSummary> {
        summaries(dimensions, &self.group_par(records, dimensions))
    }

    /// The whole portfolio as a single group.
    pub fn overall(&self, records: &[ScoredRecord]) -> GroupStats {
        let mut stats = GroupStats::default();
        for scored in records {
            stats.add(scored);
        }
        stats
    }
}

pub fn summaries(dimensions: &[Dimension], table: &GroupTable) -> Vec<SegmentSummary> {
    table
        .iter()
        .map(|(key, stats)| SegmentSummary::from_stats(dimensions, key.clone(), stats))
        .collect()
}
