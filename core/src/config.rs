use crate::{
    aggregate::Dimension,
    bands::Bands,
    error::{ScoreError, ScoreResult},
    fairness::FairnessConfig,
    scorer::RiskModel,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_POPULATION: usize = 1000;

// ── Reporting ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportingConfig {
    /// Each entry is one grouping; multi-dimension entries cross the keys.
    pub summary_dimensions:  Vec<Vec<Dimension>>,
    pub fairness_dimensions: Vec<Dimension>,
    pub fairness:            FairnessConfig,
    #[serde(default = "default_population")]
    pub synthetic_population: usize,
}

fn default_population() -> usize {
    DEFAULT_POPULATION
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            summary_dimensions: vec![
                vec![Dimension::EmploymentStatus],
                vec![Dimension::IncomeBracket],
                vec![Dimension::AgeBracket],
                vec![Dimension::CreditScoreBand],
                vec![Dimension::UtilizationBand],
                vec![Dimension::TenureBand],
                vec![Dimension::DtiBand],
                vec![Dimension::Location],
                vec![Dimension::CreditCardType],
                vec![Dimension::EmploymentStatus, Dimension::IncomeBracket],
            ],
            fairness_dimensions: vec![
                Dimension::AgeBracket,
                Dimension::Location,
                Dimension::EmploymentStatus,
                Dimension::IncomeBracket,
            ],
            fairness: FairnessConfig::default(),
            synthetic_population: DEFAULT_POPULATION,
        }
    }
}

// ── Top level ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringConfig {
    pub model:     RiskModel,
    pub bands:     Bands,
    pub reporting: ReportingConfig,
}

impl ScoringConfig {
    /// Load from the data/ directory.
    /// In tests, use ScoringConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let model_path = format!("{data_dir}/scoring/risk_model.json");
        let model_content = std::fs::read_to_string(&model_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {model_path}: {e}"))?;
        let model: RiskModel = serde_json::from_str(&model_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {model_path}: {e}"))?;

        let bands_path = format!("{data_dir}/scoring/bands.json");
        let bands_content = std::fs::read_to_string(&bands_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {bands_path}: {e}"))?;
        let bands: Bands = serde_json::from_str(&bands_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {bands_path}: {e}"))?;

        let reporting_path = format!("{data_dir}/scoring/reporting.json");
        let reporting_content = std::fs::read_to_string(&reporting_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {reporting_path}: {e}"))?;
        let reporting: ReportingConfig = serde_json::from_str(&reporting_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {reporting_path}: {e}"))?;

        let config = Self { model, bands, reporting };
        config.validate()?;
        log::debug!(
            "config: loaded model {} from {data_dir}",
            config.model.model_version
        );
        Ok(config)
    }

    pub fn validate(&self) -> ScoreResult<()> {
        self.model.validate()?;
        self.bands.validate()?;

        let f = &self.reporting.fairness;
        if !(f.four_fifths_threshold > 0.0 && f.four_fifths_threshold <= 1.0) {
            return Err(ScoreError::InvalidConfig(format!(
                "four_fifths_threshold must be in (0, 1], got {}",
                f.four_fifths_threshold
            )));
        }
        if !(f.deviation_tolerance >= 0.0 && f.deviation_tolerance.is_finite()) {
            return Err(ScoreError::InvalidConfig(format!(
                "deviation_tolerance must be finite and >= 0, got {}",
                f.deviation_tolerance
            )));
        }
        let mut groupings: HashSet<&[Dimension]> = HashSet::new();
        for grouping in &self.reporting.summary_dimensions {
            if grouping.is_empty() {
                return Err(ScoreError::InvalidConfig(
                    "summary_dimensions entries must name at least one dimension".into(),
                ));
            }
            let mut seen: HashSet<Dimension> = HashSet::new();
            if let Some(dim) = grouping.iter().find(|d| !seen.insert(**d)) {
                return Err(ScoreError::InvalidConfig(format!(
                    "summary_dimensions entry repeats dimension {dim}"
                )));
            }
            if !groupings.insert(grouping.as_slice()) {
                return Err(ScoreError::InvalidConfig(format!(
                    "summary_dimensions lists grouping [{}] more than once",
                    grouping.iter().map(Dimension::as_str).collect::<Vec<_>>().join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self::default()
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            model:     RiskModel::default(),
            bands:     Bands::default(),
            reporting: ReportingConfig::default(),
        }
    }
}
