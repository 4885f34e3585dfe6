use super::ScoreStore;
use crate::{
    batch::RejectedRecord,
    engine::ScoringRun,
    error::{ScoreError, ScoreResult},
    scorer::{CollectionAction, RiskTier, ScoredRecord},
};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

/// A scored row as persisted; the customer attributes live in `customer`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredScore {
    pub customer_id:             String,
    pub delinquency_probability: f64,
    pub risk_tier:               RiskTier,
    pub collection_action:       CollectionAction,
    pub delinquent_account:      bool,
}

impl ScoreStore {
    // ── Scoring run ───────────────────────────────────────────────

    pub fn insert_scoring_run(&self, run: &ScoringRun) -> ScoreResult<()> {
        self.conn.execute(
            "INSERT INTO scoring_run
                (run_id, model_version, created_at, rows_read, rows_scored, rows_rejected)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run.run_id,
                run.model_version,
                run.created_at.to_rfc3339(),
                run.rows_read as i64,
                run.rows_scored as i64,
                run.rows_rejected as i64,
            ],
        )?;
        Ok(())
    }

    pub fn scoring_run(&self, run_id: &str) -> ScoreResult<ScoringRun> {
        let row = self
            .conn
            .query_row(
                "SELECT run_id, model_version, created_at, rows_read, rows_scored, rows_rejected
                 FROM scoring_run WHERE run_id = ?1",
                params![run_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()?;

        let (run_id, model_version, created_at, read, scored, rejected) =
            row.ok_or_else(|| ScoreError::RunNotFound { run_id: run_id.to_string() })?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| anyhow::anyhow!("Bad created_at {created_at:?}: {e}"))?
            .with_timezone(&chrono::Utc);

        Ok(ScoringRun {
            run_id,
            model_version,
            created_at,
            rows_read:     read as u64,
            rows_scored:   scored as u64,
            rows_rejected: rejected as u64,
        })
    }

    /// Run ids, newest first.
    pub fn scoring_run_ids(&self) -> ScoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT run_id FROM scoring_run ORDER BY created_at DESC, rowid DESC")?;
        let ids = stmt.query_map([], |row| row.get(0))?;
        ids.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Scored customers ──────────────────────────────────────────

    /// Not transactional on its own; the engine wraps a run's writes in
    /// `transaction`.
    pub fn insert_scored(&self, run_id: &str, records: &[ScoredRecord]) -> ScoreResult<()> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO scored_customer (
                run_id, customer_id, delinquency_probability, risk_tier, collection_action,
                payment_component, utilization_component, score_component, dti_component,
                delinquent_account
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        for s in records {
            stmt.execute(params![
                run_id,
                s.customer_id(),
                s.delinquency_probability,
                s.risk_tier.as_str(),
                s.collection_action.as_str(),
                s.components.payment,
                s.components.utilization,
                s.components.score,
                s.components.dti,
                i64::from(s.record.delinquent_account),
            ])?;
        }
        Ok(())
    }

    pub fn insert_rejected(&self, run_id: &str, rejected: &[RejectedRecord]) -> ScoreResult<()> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO rejected_record (run_id, row_index, customer_id, field, reason)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for r in rejected {
            stmt.execute(params![
                run_id,
                r.index as i64,
                r.customer_id,
                r.error.field().unwrap_or("<other>"),
                r.error.to_string(),
            ])?;
        }
        Ok(())
    }

    pub fn scored_for_run(&self, run_id: &str) -> ScoreResult<Vec<StoredScore>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id, delinquency_probability, risk_tier, collection_action,
                    delinquent_account
             FROM scored_customer WHERE run_id = ?1
             ORDER BY customer_id ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(customer_id, probability, tier, action, delinquent)| -> ScoreResult<StoredScore> {
                let risk_tier = RiskTier::parse(&tier)
                    .ok_or_else(|| anyhow::anyhow!("Unknown risk tier {tier:?} for {customer_id}"))?;
                let collection_action = CollectionAction::parse(&action)
                    .ok_or_else(|| anyhow::anyhow!("Unknown action {action:?} for {customer_id}"))?;
                Ok(StoredScore {
                    customer_id,
                    delinquency_probability: probability,
                    risk_tier,
                    collection_action,
                    delinquent_account: delinquent != 0,
                })
            })
            .collect()
    }

    pub fn scored_count(&self, run_id: &str) -> ScoreResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM scored_customer WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    pub fn rejected_count(&self, run_id: &str) -> ScoreResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM rejected_record WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// Count per tier for a run, as stored.
    pub fn tier_count(&self, run_id: &str, tier: RiskTier) -> ScoreResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM scored_customer WHERE run_id = ?1 AND risk_tier = ?2",
            params![run_id, tier.as_str()],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}
