//! The canonical transaction ledger.
//!
//! Transactions arrive from the ingestion collaborator already validated:
//! required fields non-null, amounts positive. The pipeline still rejects
//! records that break that contract with a typed error instead of
//! computing nonsense from them.
//!
//! RULE: the core never mutates the caller's ledger. The pipeline sorts a
//! working copy into canonical order (customer_id, transaction_date,
//! transaction_id) so outputs are independent of input row order, float
//! summation included.

use crate::{
    config::PipelineConfig,
    error::{PipelineError, PipelineResult},
    types::CustomerId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One canonical ledger row. Immutable input to the Feature Engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub customer_id: CustomerId,
    pub transaction_date: NaiveDate,
    pub amount: f64,
    pub product_id: String,
    pub category: String,
    pub channel: String,
    pub region: String,
}

/// Load a ledger from a JSON array file, the format the ingestion
/// collaborator emits.
pub fn load_ledger(path: &str) -> anyhow::Result<Vec<Transaction>> {
    let content =
        std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    let ledger: Vec<Transaction> = serde_json::from_str(&content)?;
    Ok(ledger)
}

/// Re-check the canonical-ledger contract.
pub fn validate_ledger(ledger: &[Transaction]) -> PipelineResult<()> {
    for txn in ledger {
        if txn.transaction_id.trim().is_empty() {
            return Err(PipelineError::InvalidTransaction {
                transaction_id: txn.transaction_id.clone(),
                reason: "empty transaction_id".to_string(),
            });
        }
        if txn.customer_id.trim().is_empty() {
            return Err(PipelineError::InvalidTransaction {
                transaction_id: txn.transaction_id.clone(),
                reason: "empty customer_id".to_string(),
            });
        }
        if !txn.amount.is_finite() || txn.amount <= 0.0 {
            return Err(PipelineError::InvalidTransaction {
                transaction_id: txn.transaction_id.clone(),
                reason: format!("amount must be a positive finite number, got {}", txn.amount),
            });
        }
    }
    Ok(())
}

/// Sort into canonical order: (customer_id, transaction_date, transaction_id).
pub fn canonical_sort(ledger: &mut [Transaction]) {
    ledger.sort_by(|a, b| {
        a.customer_id
            .cmp(&b.customer_id)
            .then_with(|| a.transaction_date.cmp(&b.transaction_date))
            .then_with(|| a.transaction_id.cmp(&b.transaction_id))
    });
}

/// Resolve the snapshot date: the configured date if set, otherwise the
/// latest transaction date in the ledger. A configured date earlier than
/// the ledger's latest transaction is a lookahead violation.
pub fn resolve_snapshot_date(
    ledger: &[Transaction],
    config: &PipelineConfig,
) -> PipelineResult<NaiveDate> {
    let latest = ledger
        .iter()
        .map(|t| t.transaction_date)
        .max()
        .ok_or(PipelineError::EmptyCohort { cohort_size: 0 })?;

    let snapshot = config.snapshot_date.unwrap_or(latest);
    if latest > snapshot {
        return Err(PipelineError::InvalidSnapshot {
            snapshot_date: snapshot,
            latest_transaction: latest,
        });
    }
    Ok(snapshot)
}
