use super::ScoreStore;
use crate::{
    aggregate::{Dimension, SegmentSummary},
    error::ScoreResult,
};
use rusqlite::params;

impl ScoreStore {
    // ── Segment summaries ─────────────────────────────────────────

    /// Group keys are stored as JSON arrays so multi-dimension keys
    /// round-trip without a separator convention.
    pub fn save_segment_summaries(&self, run_id: &str, rows: &[SegmentSummary]) -> ScoreResult<()> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO segment_summary (
                run_id, dimensions, group_key, customer_count, avg_probability,
                high_risk_rate, actual_delinquency_rate, prediction_gap
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for row in rows {
            stmt.execute(params![
                run_id,
                row.dimension_label(),
                serde_json::to_string(&row.key)?,
                row.count as i64,
                row.avg_probability,
                row.high_risk_rate,
                row.actual_delinquency_rate,
                row.prediction_gap,
            ])?;
        }
        Ok(())
    }

    /// Summary rows for one grouping of a run, ordered by key.
    pub fn segment_summaries(
        &self,
        run_id: &str,
        dimensions: &[Dimension],
    ) -> ScoreResult<Vec<SegmentSummary>> {
        let label = dimensions.iter().map(Dimension::as_str).collect::<Vec<_>>().join(" / ");
        let mut stmt = self.conn.prepare(
            "SELECT group_key, customer_count, avg_probability, high_risk_rate,
                    actual_delinquency_rate, prediction_gap
             FROM segment_summary WHERE run_id = ?1 AND dimensions = ?2",
        )?;
        let raw = stmt
            .query_map(params![run_id, label], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, f64>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = raw
            .into_iter()
            .map(|(key, count, avg, high, actual, gap)| -> ScoreResult<SegmentSummary> {
                Ok(SegmentSummary {
                    dimensions:              dimensions.to_vec(),
                    key:                     serde_json::from_str(&key)?,
                    count:                   count as u64,
                    avg_probability:         avg,
                    high_risk_rate:          high,
                    actual_delinquency_rate: actual,
                    prediction_gap:          gap,
                })
            })
            .collect::<ScoreResult<Vec<_>>>()?;
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(rows)
    }

    pub fn segment_summary_count(&self, run_id: &str) -> ScoreResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM segment_summary WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}
