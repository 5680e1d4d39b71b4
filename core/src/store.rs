//! SQLite export of the decision tables.
//!
//! RULE: Only store.rs talks to the database.
//! Callers hand over a finished PipelineOutputs; they never execute SQL.
//!
//! This is a hand-off for the presentation collaborator, not durability
//! for the core: the pipeline itself stays purely in-memory and a rerun
//! regenerates every table from scratch.

use crate::{error::PipelineResult, pipeline::PipelineOutputs};
use chrono::NaiveDate;
use rusqlite::{params, Connection};

pub struct DecisionStore {
    conn: Connection,
}

impl DecisionStore {
    /// Open (or create) the export database at `path`.
    pub fn open(path: &str) -> PipelineResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PipelineResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> PipelineResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_decisions.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        snapshot_date: NaiveDate,
        segment_version: &str,
    ) -> PipelineResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, snapshot_date, segment_version) VALUES (?1, ?2, ?3)",
            params![run_id, snapshot_date.to_string(), segment_version],
        )?;
        Ok(())
    }

    // ── Output tables ──────────────────────────────────────────

    /// Write every output table for a run in a single transaction.
    pub fn insert_outputs(&mut self, run_id: &str, outputs: &PipelineOutputs) -> PipelineResult<()> {
        let tx = self.conn.transaction()?;

        for f in &outputs.features {
            tx.execute(
                "INSERT INTO customer_features
                 (run_id, customer_id, recency_days, frequency, monetary,
                  lifetime_value, spend_trend, frequency_trend)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    run_id,
                    f.customer_id,
                    f.recency_days,
                    f.frequency,
                    f.monetary,
                    f.lifetime_value,
                    f.spend_trend,
                    f.frequency_trend,
                ],
            )?;
        }

        for s in &outputs.segments {
            tx.execute(
                "INSERT INTO segment_records
                 (run_id, customer_id, lifecycle_stage, value_segment,
                  segment_label, segment_version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    run_id,
                    s.customer_id,
                    s.lifecycle_stage.label(),
                    s.value_segment.name(),
                    s.segment_label,
                    s.segment_version,
                ],
            )?;
        }

        for r in &outputs.risks {
            tx.execute(
                "INSERT INTO risk_records (run_id, customer_id, risk_score, risk_level)
                 VALUES (?1, ?2, ?3, ?4)",
                params![run_id, r.customer_id, r.risk_score, r.risk_level.label()],
            )?;
        }

        for a in &outputs.actions {
            tx.execute(
                "INSERT INTO action_records
                 (run_id, customer_id, recommended_action, action_priority, action_rationale)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    run_id,
                    a.customer_id,
                    a.recommended_action,
                    a.action_priority.label(),
                    a.action_rationale,
                ],
            )?;
        }

        for r in &outputs.rois {
            tx.execute(
                "INSERT INTO roi_records
                 (run_id, customer_id, action_cost, expected_benefit, estimated_roi, roi_feasible)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    run_id,
                    r.customer_id,
                    r.action_cost,
                    r.expected_benefit,
                    r.estimated_roi,
                    r.roi_feasible as i64,
                ],
            )?;
        }

        for e in &outputs.explanations {
            tx.execute(
                "INSERT INTO explanation_records (run_id, customer_id, decision_explanation)
                 VALUES (?1, ?2, ?3)",
                params![run_id, e.customer_id, e.decision_explanation],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    // ── Read-only queries ──────────────────────────────────────

    pub fn customer_count(&self, run_id: &str) -> PipelineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM customer_features WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn risk_level_counts(&self, run_id: &str) -> PipelineResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT risk_level, COUNT(*) FROM risk_records
             WHERE run_id = ?1 GROUP BY risk_level ORDER BY risk_level",
        )?;
        let counts = stmt
            .query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    pub fn total_estimated_roi(&self, run_id: &str) -> PipelineResult<f64> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(estimated_roi), 0.0) FROM roi_records WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    pub fn explanation_for(
        &self,
        run_id: &str,
        customer_id: &str,
    ) -> PipelineResult<Option<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT decision_explanation FROM explanation_records
             WHERE run_id = ?1 AND customer_id = ?2",
        )?;
        let result = stmt
            .query_row(params![run_id, customer_id], |row| row.get(0))
            .ok();
        Ok(result)
    }
}
