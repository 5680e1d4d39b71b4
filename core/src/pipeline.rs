//! One-shot pipeline orchestration.
//!
//! Execution order is fixed:
//!   1. Configuration validation
//!   2. Ledger validation, canonical sort, snapshot resolution
//!   3. Feature Engine
//!   4. Segmentation Engine and Risk Engine (both read features only)
//!   5. Decision Engine
//!
//! Every output table is regenerated in full per invocation and sorted by
//! customer_id. Identical inputs produce byte-identical serialized outputs.
//! There is no partial-success mode: the first error aborts the run.

use crate::{
    config::PipelineConfig,
    decision_engine::{self, ActionRecord, ExplanationRecord, RoiRecord},
    error::PipelineResult,
    feature_engine::{self, CustomerFeatures},
    ledger::{self, Transaction},
    risk_engine::{self, RiskRecord, RiskSignals},
    segmentation_engine::{self, SegmentRecord},
};
use chrono::NaiveDate;
use serde::Serialize;

/// Read-only snapshot of one run's derived tables, handed to the
/// presentation collaborator. The presentation layer only filters,
/// sorts, and renders; it never writes back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutputs {
    pub snapshot_date: NaiveDate,
    pub features: Vec<CustomerFeatures>,
    pub segments: Vec<SegmentRecord>,
    pub signals: Vec<RiskSignals>,
    pub risks: Vec<RiskRecord>,
    pub actions: Vec<ActionRecord>,
    pub rois: Vec<RoiRecord>,
    pub explanations: Vec<ExplanationRecord>,
}

/// Run the full pipeline once over the given ledger.
pub fn run_pipeline(
    ledger: &[Transaction],
    config: &PipelineConfig,
) -> PipelineResult<PipelineOutputs> {
    config.validate()?;
    ledger::validate_ledger(ledger)?;

    let mut working: Vec<Transaction> = ledger.to_vec();
    ledger::canonical_sort(&mut working);
    let snapshot_date = ledger::resolve_snapshot_date(&working, config)?;
    log::info!(
        "pipeline start: {} transactions, snapshot {}",
        working.len(),
        snapshot_date
    );

    let features = feature_engine::compute_features(&working, snapshot_date, config)?;
    log::info!("feature engine: {} customers", features.len());

    let segments = segmentation_engine::assign_segments(&features, config)?;
    log::info!("segmentation engine: {} records", segments.len());

    let signals = risk_engine::compute_signals(&features);
    let risks = risk_engine::score_risk(&signals, config);
    log::info!("risk engine: {} records", risks.len());

    let tables = decision_engine::decide(&features, &segments, &signals, &risks, config)?;
    log::info!("decision engine: {} actions", tables.actions.len());

    Ok(PipelineOutputs {
        snapshot_date,
        features,
        segments,
        signals,
        risks,
        actions: tables.actions,
        rois: tables.rois,
        explanations: tables.explanations,
    })
}
