//! The scoring engine: one scoring run from source rows to reports.
//!
//! EXECUTION ORDER (fixed):
//!   1. Load customer rows (store table or caller-supplied rows)
//!   2. Validate and score every row in parallel, isolating failures
//!   3. Aggregate each configured grouping
//!   4. Persist the run, scored rows, rejections and summaries
//!   5. Run fairness checks on the configured dimensions
//!   6. Build the portfolio reports
//!
//! RULES:
//!   - Scoring is pure; all persistence happens in step 4.
//!   - One malformed or duplicated row never fails the run.
//!   - A run's writes commit together or not at all.
//!   - Each run gets a fresh run id; earlier runs are never modified.

use crate::{
    aggregate::{Aggregator, Dimension, SegmentSummary},
    batch::{score_batch_par, BatchOutcome},
    config::ScoringConfig,
    customer::{CustomerRecord, CustomerRow},
    error::ScoreResult,
    fairness::{self, FairnessReport},
    population::generate_portfolio,
    report::{self, ClassCount, DataQuality, DriverCorrelation, HighRiskProfile, MonthPattern, PortfolioOverview},
    scorer::ScoredRecord,
    store::ScoreStore,
    types::RunId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringRun {
    pub run_id:        RunId,
    pub model_version: String,
    pub created_at:    DateTime<Utc>,
    pub rows_read:     u64,
    pub rows_scored:   u64,
    pub rows_rejected: u64,
}

/// Everything a run produced, for printing or serialising.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run:               ScoringRun,
    pub overview:          PortfolioOverview,
    pub tiers:             Vec<ClassCount>,
    pub actions:           Vec<ClassCount>,
    pub high_risk_profile: Option<HighRiskProfile>,
    pub drivers:           Vec<DriverCorrelation>,
    pub payment_patterns:  Vec<MonthPattern>,
    pub data_quality:      DataQuality,
    pub segments:          Vec<SegmentSummary>,
    pub fairness:          Vec<FairnessReport>,
    #[serde(skip)]
    pub scored:            Vec<ScoredRecord>,
}

impl RunReport {
    /// Summary rows of one grouping, in key order.
    pub fn segments_for(&self, dimensions: &[Dimension]) -> Vec<&SegmentSummary> {
        self.segments.iter().filter(|s| s.dimensions == dimensions).collect()
    }
}

pub struct ScoringEngine {
    pub config: ScoringConfig,
    pub store:  ScoreStore,
    aggregator: Aggregator,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig, store: ScoreStore) -> Self {
        let aggregator = Aggregator::new(config.bands.clone());
        Self { config, store, aggregator }
    }

    /// In-memory store, migrated, with the default test config.
    pub fn build_test() -> ScoreResult<Self> {
        let store = ScoreStore::in_memory()?;
        store.migrate()?;
        Ok(Self::new(ScoringConfig::default_test(), store))
    }

    /// Fill an empty customer table with a synthetic portfolio.
    /// Returns the number of customers inserted (0 if already populated).
    pub fn seed_synthetic(&self, seed: u64, size: usize) -> ScoreResult<usize> {
        if self.store.customer_count()? > 0 {
            log::debug!("engine: customer table already populated, not seeding");
            return Ok(0);
        }
        let portfolio = generate_portfolio(seed, size);
        self.store.insert_customers(&portfolio)?;
        log::info!("engine: seeded {size} synthetic customers (seed={seed})");
        Ok(portfolio.len())
    }

    pub fn import_records(&self, records: &[CustomerRecord]) -> ScoreResult<()> {
        self.store.insert_customers(records)
    }

    /// Score every row of the customer table.
    pub fn run(&self) -> ScoreResult<RunReport> {
        self.config.validate()?;
        let rows = self.store.customer_rows()?;
        log::debug!("engine: loaded {} customer rows", rows.len());
        let outcome = score_batch_par(&self.config.model, &rows);
        self.finish(outcome)
    }

    /// Score caller-supplied rows, e.g. parsed from a JSON file.
    pub fn run_rows(&self, rows: &[ScoreResult<CustomerRow>]) -> ScoreResult<RunReport> {
        self.config.validate()?;
        let outcome = score_batch_par(&self.config.model, rows);
        self.finish(outcome)
    }

    fn finish(&self, outcome: BatchOutcome) -> ScoreResult<RunReport> {
        let run = ScoringRun {
            run_id:        uuid::Uuid::new_v4().to_string(),
            model_version: self.config.model.model_version.clone(),
            created_at:    Utc::now(),
            rows_read:     outcome.total() as u64,
            rows_scored:   outcome.scored.len() as u64,
            rows_rejected: outcome.rejected.len() as u64,
        };

        let scored = &outcome.scored;
        let segments: Vec<SegmentSummary> = self
            .config
            .reporting
            .summary_dimensions
            .iter()
            .flat_map(|dimensions| self.aggregator.summarize_par(scored, dimensions))
            .collect();

        self.store.transaction(|| {
            self.store.insert_scoring_run(&run)?;
            self.store.insert_scored(&run.run_id, scored)?;
            self.store.insert_rejected(&run.run_id, &outcome.rejected)?;
            self.store.save_segment_summaries(&run.run_id, &segments)
        })?;
        log::debug!("engine: {} segment rows saved", segments.len());

        let overall = self.aggregator.overall(scored);
        let fairness = self
            .config
            .reporting
            .fairness_dimensions
            .iter()
            .map(|dim| {
                let rows = self.aggregator.summarize(scored, &[*dim]);
                fairness::assess(*dim, &rows, &overall, &self.config.reporting.fairness)
            })
            .collect();

        let report = RunReport {
            overview:          report::portfolio_overview(scored),
            tiers:             report::tier_distribution(scored),
            actions:           report::action_distribution(scored),
            high_risk_profile: report::high_risk_profile(scored),
            drivers:           report::driver_correlations(scored),
            payment_patterns:  report::payment_patterns(scored),
            data_quality:      report::data_quality(&outcome),
            segments,
            fairness,
            scored:            outcome.scored,
            run,
        };

        log::info!(
            "run {} complete: read={} scored={} rejected={} avg_probability={:.3}",
            report.run.run_id,
            report.run.rows_read,
            report.run.rows_scored,
            report.run.rows_rejected,
            report.overview.avg_probability,
        );
        Ok(report)
    }
}
