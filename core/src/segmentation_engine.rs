//! Segmentation Engine: lifecycle staging and cohort-relative value tiers.
//!
//! Lifecycle is an ordered, first-match threshold ladder on recency_days.
//! Value segmentation ranks monetary within the full cohort; cut points are
//! recomputed per run, so a customer's tier can shift when the cohort
//! changes even if their own value did not.
//!
//! RULE: percentile ranks are computed once from the complete feature set
//! before any customer is classified. Classifying row-by-row would make
//! value_segment depend on processing order.
//!
//! Tie rule: tied monetary values share the highest rank among them, so
//! ties promote to the higher segment.

use crate::{
    config::{LifecycleThresholds, PipelineConfig},
    error::{PipelineError, PipelineResult},
    feature_engine::CustomerFeatures,
    types::CustomerId,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleStage {
    Active,
    #[serde(rename = "At-Risk")]
    AtRisk,
    Dormant,
    Churned,
}

impl LifecycleStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::AtRisk => "At-Risk",
            Self::Dormant => "Dormant",
            Self::Churned => "Churned",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueSegment {
    High,
    Medium,
    Low,
}

impl ValueSegment {
    /// Short name, as stored and serialized.
    pub fn name(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Human label used in segment_label and explanations.
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High Value",
            Self::Medium => "Medium Value",
            Self::Low => "Low Value",
        }
    }
}

impl fmt::Display for ValueSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub customer_id: CustomerId,
    pub lifecycle_stage: LifecycleStage,
    pub value_segment: ValueSegment,
    pub segment_label: String,
    pub segment_version: String,
}

/// First match wins, inclusive upper bounds.
pub fn lifecycle_stage_for(recency_days: i64, thresholds: &LifecycleThresholds) -> LifecycleStage {
    if recency_days <= thresholds.active_max_days {
        LifecycleStage::Active
    } else if recency_days <= thresholds.at_risk_max_days {
        LifecycleStage::AtRisk
    } else if recency_days <= thresholds.dormant_max_days {
        LifecycleStage::Dormant
    } else {
        LifecycleStage::Churned
    }
}

/// Assign every customer exactly one lifecycle stage and one value segment.
/// Percentile segmentation is undefined for cohorts of zero or one customer.
pub fn assign_segments(
    features: &[CustomerFeatures],
    config: &PipelineConfig,
) -> PipelineResult<Vec<SegmentRecord>> {
    if features.len() <= 1 {
        return Err(PipelineError::EmptyCohort {
            cohort_size: features.len(),
        });
    }

    // Inclusive percentile rank: the share of the cohort with monetary at
    // or below the customer's own. partition_point on the sorted values
    // gives the count in O(log n) per customer.
    let mut sorted_monetary: Vec<f64> = features.iter().map(|f| f.monetary).collect();
    sorted_monetary.sort_by(f64::total_cmp);
    let cohort_size = sorted_monetary.len() as f64;

    let mut records = Vec::with_capacity(features.len());
    for f in features {
        let rank = sorted_monetary.partition_point(|&m| m <= f.monetary);
        let percentile = 100.0 * rank as f64 / cohort_size;

        // Zero current-window spend is always Low Value, whatever the
        // cohort looks like.
        let value_segment = if f.monetary <= 0.0 {
            ValueSegment::Low
        } else if percentile > config.percentile_cuts.high {
            ValueSegment::High
        } else if percentile > config.percentile_cuts.medium {
            ValueSegment::Medium
        } else {
            ValueSegment::Low
        };

        let lifecycle_stage = lifecycle_stage_for(f.recency_days, &config.lifecycle_thresholds);

        records.push(SegmentRecord {
            customer_id: f.customer_id.clone(),
            lifecycle_stage,
            value_segment,
            segment_label: format!("{} / {}", lifecycle_stage.label(), value_segment.label()),
            segment_version: config.segment_version.clone(),
        });
    }
    Ok(records)
}
