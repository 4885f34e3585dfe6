//! Band tables: ordered range-to-label bucketing.
//!
//! A table is a list of `(upper, label)` pairs in ascending order.
//! A value falls in the first band whose `upper` is strictly greater
//! than it. The last band has no upper bound, so every value lands
//! somewhere. Adjusting a band is a config edit, not a code change.

use crate::error::{ScoreError, ScoreResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Band {
    /// Exclusive upper bound. `None` on the last band only.
    pub upper: Option<f64>,
    pub label: String,
}

impl Band {
    pub fn below(upper: f64, label: &str) -> Self {
        Self { upper: Some(upper), label: label.into() }
    }

    pub fn rest(label: &str) -> Self {
        Self { upper: None, label: label.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct BandTable {
    bands: Vec<Band>,
}

impl BandTable {
    pub fn new(bands: Vec<Band>) -> ScoreResult<Self> {
        let table = Self { bands };
        table.validate()?;
        Ok(table)
    }

    /// Check ordering and the open-ended tail.
    pub fn validate(&self) -> ScoreResult<()> {
        let Some((last, head)) = self.bands.split_last() else {
            return Err(ScoreError::InvalidConfig("band table is empty".into()));
        };
        if last.upper.is_some() {
            return Err(ScoreError::InvalidConfig(format!(
                "last band '{}' must have no upper bound",
                last.label
            )));
        }

        let mut prev = f64::NEG_INFINITY;
        for band in head {
            let upper = band.upper.ok_or_else(|| {
                ScoreError::InvalidConfig(format!("band '{}' is unbounded but not last", band.label))
            })?;
            if !upper.is_finite() || upper <= prev {
                return Err(ScoreError::InvalidConfig(format!(
                    "band '{}' upper bound {upper} must be finite and above {prev}",
                    band.label
                )));
            }
            prev = upper;
        }
        Ok(())
    }

    pub fn label_for(&self, value: f64) -> &str {
        self.bands
            .iter()
            .find(|b| b.upper.map_or(true, |upper| value < upper))
            .or(self.bands.last())
            .map(|b| b.label.as_str())
            .unwrap_or("")
    }

    /// Labels in ascending band order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.bands.iter().map(|b| b.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

/// Every bucketed dimension the reports know about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bands {
    pub income:             BandTable,
    pub age:                BandTable,
    pub credit_score:       BandTable,
    pub credit_utilization: BandTable,
    pub account_tenure:     BandTable,
    pub debt_to_income:     BandTable,
}

impl Bands {
    pub fn validate(&self) -> ScoreResult<()> {
        self.income.validate()?;
        self.age.validate()?;
        self.credit_score.validate()?;
        self.credit_utilization.validate()?;
        self.account_tenure.validate()?;
        self.debt_to_income.validate()?;
        Ok(())
    }
}

impl Default for Bands {
    fn default() -> Self {
        let table = |bands: Vec<Band>| BandTable { bands };
        Self {
            income: table(vec![
                Band::below(30_000.0, "<30K"),
                Band::below(80_000.0, "30K-80K"),
                Band::below(150_000.0, "80K-150K"),
                Band::rest(">150K"),
            ]),
            age: table(vec![
                Band::below(26.0, "18-25"),
                Band::below(36.0, "26-35"),
                Band::below(46.0, "36-45"),
                Band::below(56.0, "46-55"),
                Band::below(66.0, "56-65"),
                Band::rest("66+"),
            ]),
            credit_score: table(vec![
                Band::below(580.0, "Poor (300-579)"),
                Band::below(670.0, "Fair (580-669)"),
                Band::below(740.0, "Good (670-739)"),
                Band::below(800.0, "Very Good (740-799)"),
                Band::rest("Excellent (800-850)"),
            ]),
            credit_utilization: table(vec![
                Band::below(0.30, "Low (<30%)"),
                Band::below(0.50, "Moderate (30-50%)"),
                Band::below(0.75, "High (50-75%)"),
                Band::rest("Very High (75%+)"),
            ]),
            account_tenure: table(vec![
                Band::below(12.0, "<1 year"),
                Band::below(36.0, "1-3 years"),
                Band::below(60.0, "3-5 years"),
                Band::rest("5+ years"),
            ]),
            debt_to_income: table(vec![
                Band::below(0.20, "Healthy (<20%)"),
                Band::below(0.36, "Manageable (20-36%)"),
                Band::below(0.60, "Elevated (36-60%)"),
                Band::rest("Severe (60%+)"),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_bound_is_exclusive() {
        let bands = Bands::default();
        assert_eq!(bands.income.label_for(29_999.99), "<30K");
        assert_eq!(bands.income.label_for(30_000.0), "30K-80K");
        assert_eq!(bands.income.label_for(1e9), ">150K");
        assert_eq!(bands.age.label_for(18.0), "18-25");
        assert_eq!(bands.age.label_for(66.0), "66+");
    }

    #[test]
    fn default_tables_are_valid() {
        Bands::default().validate().unwrap();
    }

    #[test]
    fn unordered_table_is_rejected() {
        let result = BandTable::new(vec![
            Band::below(10.0, "a"),
            Band::below(5.0, "b"),
            Band::rest("c"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn bounded_tail_is_rejected() {
        let result = BandTable::new(vec![Band::below(10.0, "a")]);
        assert!(result.is_err());
    }
}
