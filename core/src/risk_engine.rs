//! Risk Engine: normalized disengagement signals and a weighted 0-100 score.
//!
//! Each signal lives in [0, 1] with a documented saturation point:
//!   recency: 180 days of inactivity saturates the signal at 1.0.
//!   spend/frequency drop: 0 for a flat or rising trend, saturating at a
//!   50% decline (trend ratio -0.5).
//!
//! The score is the fixed-weight combination scaled to [0, 100], clamped
//! first, then rounded to two decimals, then leveled. Leveling on the
//! rounded value keeps the reported score and the level consistent.
//!
//! Levels partition the score range: <=30 Low, <=60 Medium, else High.

use crate::{
    config::PipelineConfig,
    feature_engine::CustomerFeatures,
    types::{round2, CustomerId},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Days of inactivity at which the recency signal reaches 1.0.
pub const RECENCY_SATURATION_DAYS: f64 = 180.0;

/// Trend decline (as a positive ratio) at which a drop signal reaches 1.0.
pub const TREND_DROP_SATURATION: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Expects a score already clamped to [0, 100].
    pub fn for_score(score: f64) -> Self {
        if score <= 30.0 {
            Self::Low
        } else if score <= 60.0 {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Intermediate normalized signals, kept alongside the score so the
/// explanation stage can narrate them without recomputing anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSignals {
    pub customer_id: CustomerId,
    pub recency_signal: f64,
    pub spend_drop_signal: f64,
    pub frequency_drop_signal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    pub customer_id: CustomerId,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

/// Normalize the three risk signals for every feature record.
pub fn compute_signals(features: &[CustomerFeatures]) -> Vec<RiskSignals> {
    features
        .iter()
        .map(|f| RiskSignals {
            customer_id: f.customer_id.clone(),
            recency_signal: (f.recency_days as f64 / RECENCY_SATURATION_DAYS).clamp(0.0, 1.0),
            spend_drop_signal: drop_signal(f.spend_trend),
            frequency_drop_signal: drop_signal(f.frequency_trend),
        })
        .collect()
}

/// Score and level every customer from their signals.
pub fn score_risk(signals: &[RiskSignals], config: &PipelineConfig) -> Vec<RiskRecord> {
    let w = &config.signal_weights;
    signals
        .iter()
        .map(|s| {
            let raw = 100.0
                * (w.recency * s.recency_signal
                    + w.frequency_drop * s.frequency_drop_signal
                    + w.spend_drop * s.spend_drop_signal);
            let risk_score = round2(raw.clamp(0.0, 100.0));
            RiskRecord {
                customer_id: s.customer_id.clone(),
                risk_score,
                risk_level: RiskLevel::for_score(risk_score),
            }
        })
        .collect()
}

/// 0 for flat or rising trends; a decline saturates at TREND_DROP_SATURATION.
fn drop_signal(trend: f64) -> f64 {
    if trend >= 0.0 {
        0.0
    } else {
        (trend.abs() / TREND_DROP_SATURATION).min(1.0)
    }
}
