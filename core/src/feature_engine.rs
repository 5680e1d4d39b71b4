//! Feature Engine: RFM and trend features per customer as of a snapshot date.
//!
//! Window arithmetic is whole-day, half-open on the older side:
//!   current window: snapshot - window_days < date <= snapshot
//!   prior window:   snapshot - 2*window_days < date <= snapshot - window_days
//! Frequency and monetary come from the current window only; lifetime_value
//! is the unbounded all-time sum.
//!
//! Trend policy: (current - prior) / prior as a signed ratio, so -0.18 means
//! an 18% decline. A prior-window value of zero yields a trend of 0.0,
//! never NaN and never a sentinel.
//!
//! Customers with zero transactions are absent from the output, not
//! zero-filled. Downstream stages must treat absence as "no feature basis",
//! a distinct case from a computed zero.

use crate::{
    config::PipelineConfig,
    error::{PipelineError, PipelineResult},
    ledger::Transaction,
    types::CustomerId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerFeatures {
    pub customer_id: CustomerId,
    pub recency_days: i64,
    pub frequency: u32,
    pub monetary: f64,
    pub lifetime_value: f64,
    pub spend_trend: f64,
    pub frequency_trend: f64,
}

#[derive(Default)]
struct Accumulator {
    last_date: Option<NaiveDate>,
    current_count: u32,
    current_sum: f64,
    prior_count: u32,
    prior_sum: f64,
    lifetime_sum: f64,
}

/// Compute one CustomerFeatures record per customer with at least one
/// transaction. Any transaction dated after the snapshot is a lookahead
/// violation and aborts the run.
pub fn compute_features(
    ledger: &[Transaction],
    snapshot_date: NaiveDate,
    config: &PipelineConfig,
) -> PipelineResult<Vec<CustomerFeatures>> {
    if let Some(latest) = ledger.iter().map(|t| t.transaction_date).max() {
        if latest > snapshot_date {
            return Err(PipelineError::InvalidSnapshot {
                snapshot_date,
                latest_transaction: latest,
            });
        }
    }

    let window = i64::from(config.window_days);
    let mut by_customer: BTreeMap<&str, Accumulator> = BTreeMap::new();

    for txn in ledger {
        let acc = by_customer.entry(txn.customer_id.as_str()).or_default();

        // age 0 = the snapshot day itself.
        let age = (snapshot_date - txn.transaction_date).num_days();
        if age < window {
            acc.current_count += 1;
            acc.current_sum += txn.amount;
        } else if age < 2 * window {
            acc.prior_count += 1;
            acc.prior_sum += txn.amount;
        }
        acc.lifetime_sum += txn.amount;

        if acc.last_date.map_or(true, |d| txn.transaction_date > d) {
            acc.last_date = Some(txn.transaction_date);
        }
    }

    let mut features = Vec::with_capacity(by_customer.len());
    for (customer_id, acc) in by_customer {
        let last_date = match acc.last_date {
            Some(d) => d,
            // Unreachable for a customer that appeared in the ledger.
            None => continue,
        };
        let record = CustomerFeatures {
            customer_id: customer_id.to_string(),
            recency_days: (snapshot_date - last_date).num_days(),
            frequency: acc.current_count,
            monetary: acc.current_sum,
            lifetime_value: acc.lifetime_sum,
            spend_trend: trend_ratio(acc.current_sum, acc.prior_sum),
            frequency_trend: trend_ratio(f64::from(acc.current_count), f64::from(acc.prior_count)),
        };
        log::debug!(
            "features {}: recency {} frequency {} monetary {:.2}",
            record.customer_id,
            record.recency_days,
            record.frequency,
            record.monetary
        );
        features.push(record);
    }
    Ok(features)
}

/// Signed ratio change between windows. Zero prior value yields 0.0.
fn trend_ratio(current: f64, prior: f64) -> f64 {
    if prior <= 0.0 {
        return 0.0;
    }
    (current - prior) / prior
}
