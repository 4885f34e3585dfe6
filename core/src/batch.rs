//! Batch scoring with per-record isolation.
//!
//! A malformed row is rejected on its own; the rest of the batch is
//! still scored. Rejections keep their input position so callers can
//! trace them back to the source.

use crate::{
    customer::{CustomerRecord, CustomerRow},
    error::{ScoreError, ScoreResult},
    scorer::{RiskModel, ScoredRecord},
};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug)]
pub struct RejectedRecord {
    /// Position in the input sequence.
    pub index:       usize,
    pub customer_id: Option<String>,
    pub error:       ScoreError,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Scored records in input order.
    pub scored:   Vec<ScoredRecord>,
    pub rejected: Vec<RejectedRecord>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.scored.len() + self.rejected.len()
    }

    /// Rejection counts keyed by offending field.
    pub fn rejections_by_field(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.rejected {
            *counts.entry(r.error.field().unwrap_or("<other>")).or_insert(0) += 1;
        }
        counts
    }
}

/// Anything the batch scorer can turn into a checked record.
pub trait ScoreInput: Sync {
    fn id_hint(&self) -> Option<&str>;
    fn to_record(&self) -> ScoreResult<CustomerRecord>;
}

impl ScoreInput for CustomerRow {
    fn id_hint(&self) -> Option<&str> {
        CustomerRow::id_hint(self)
    }

    fn to_record(&self) -> ScoreResult<CustomerRecord> {
        self.validate()
    }
}

impl ScoreInput for CustomerRecord {
    fn id_hint(&self) -> Option<&str> {
        Some(&self.customer_id)
    }

    fn to_record(&self) -> ScoreResult<CustomerRecord> {
        Ok(self.clone())
    }
}

impl<T: ScoreInput + Send> ScoreInput for ScoreResult<T> {
    fn id_hint(&self) -> Option<&str> {
        match self {
            Ok(input) => input.id_hint(),
            Err(ScoreError::InvalidInput { customer_id, .. }) if customer_id != "<unknown>" => {
                Some(customer_id.as_str())
            }
            Err(_) => None,
        }
    }

    fn to_record(&self) -> ScoreResult<CustomerRecord> {
        match self {
            Ok(input) => input.to_record(),
            Err(ScoreError::InvalidInput { customer_id, field, reason }) => {
                Err(ScoreError::invalid(customer_id, *field, reason.clone()))
            }
            Err(other) => Err(ScoreError::invalid("<unknown>", "<row>", other.to_string())),
        }
    }
}

fn score_one<T: ScoreInput>(model: &RiskModel, input: &T) -> ScoreResult<ScoredRecord> {
    let record = input.to_record()?;
    model.score(&record)
}

/// Rows arrive in input order. A row whose id was already scored is
/// rejected as a duplicate; the first occurrence wins.
fn collect(results: Vec<(usize, Option<String>, ScoreResult<ScoredRecord>)>) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    let mut seen: HashSet<String> = HashSet::new();
    for (index, customer_id, result) in results {
        let result = result.and_then(|scored| {
            if seen.insert(scored.customer_id().to_string()) {
                Ok(scored)
            } else {
                Err(ScoreError::invalid(scored.customer_id(), "customer_id", "is duplicated in the batch"))
            }
        });
        match result {
            Ok(scored) => outcome.scored.push(scored),
            Err(error) => {
                log::warn!(
                    "rejected row {index} ({}): {error}",
                    customer_id.as_deref().unwrap_or("<unknown>"),
                );
                outcome.rejected.push(RejectedRecord { index, customer_id, error });
            }
        }
    }
    log::debug!(
        "batch: scored={} rejected={}",
        outcome.scored.len(),
        outcome.rejected.len(),
    );
    outcome
}

pub fn score_batch<T: ScoreInput>(model: &RiskModel, inputs: &[T]) -> BatchOutcome {
    let results = inputs
        .iter()
        .enumerate()
        .map(|(i, input)| (i, input.id_hint().map(str::to_string), score_one(model, input)))
        .collect();
    collect(results)
}

/// Data-parallel variant. Output order matches `score_batch`.
pub fn score_batch_par<T: ScoreInput>(model: &RiskModel, inputs: &[T]) -> BatchOutcome {
    let results = inputs
        .par_iter()
        .enumerate()
        .map(|(i, input)| (i, input.id_hint().map(str::to_string), score_one(model, input)))
        .collect();
    collect(results)
}
