//! Pipeline configuration.
//!
//! RULE: every stage receives the configuration as an explicit argument.
//! Nothing reads ambient or global parameters, so runs with different
//! settings can coexist in a single process without interference.
//!
//! `segment_version` tags the rule revision. Bump it whenever thresholds,
//! cuts, weights, or the action tables change.

use crate::decision_engine::{
    ACTION_CROSS_SELL_CAMPAIGN, ACTION_CROSS_SELL_COMPLEMENTARY, ACTION_MAINTAIN, ACTION_MONITOR,
    ACTION_NURTURE, ACTION_PREVENTIVE_ENGAGEMENT, ACTION_REACTIVATION, ACTION_RETENTION_OUTREACH,
    ACTION_UPSELL, ACTION_WIN_BACK,
};
use crate::error::{PipelineError, PipelineResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fixed weights for the three risk signals. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalWeights {
    pub recency: f64,
    pub frequency_drop: f64,
    pub spend_drop: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            recency: 0.40,
            frequency_drop: 0.25,
            spend_drop: 0.35,
        }
    }
}

/// Inclusive upper bounds of the lifecycle ladder, in days of recency.
/// Anything past `dormant_max_days` is Churned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LifecycleThresholds {
    pub active_max_days: i64,
    pub at_risk_max_days: i64,
    pub dormant_max_days: i64,
}

impl Default for LifecycleThresholds {
    fn default() -> Self {
        Self {
            active_max_days: 30,
            at_risk_max_days: 90,
            dormant_max_days: 180,
        }
    }
}

/// Value-segment percentile cuts: strictly above `high` is High Value,
/// strictly above `medium` is Medium Value, the rest is Low Value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PercentileCuts {
    pub high: f64,
    pub medium: f64,
}

impl Default for PercentileCuts {
    fn default() -> Self {
        Self {
            high: 80.0,
            medium: 40.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// As-of date for recency and windowed features.
    /// `None` = latest transaction date in the ledger.
    #[serde(default)]
    pub snapshot_date: Option<NaiveDate>,

    /// Trailing window length in days for frequency/monetary and trends.
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    #[serde(default)]
    pub signal_weights: SignalWeights,

    #[serde(default)]
    pub lifecycle_thresholds: LifecycleThresholds,

    #[serde(default)]
    pub percentile_cuts: PercentileCuts,

    /// Heuristic cost per action type.
    #[serde(default = "default_action_costs")]
    pub action_costs: HashMap<String, f64>,

    /// Assumed fraction of lifetime value recoverable per action type.
    #[serde(default = "default_recovery_rates")]
    pub recovery_rates: HashMap<String, f64>,

    /// Cost applied to actions absent from the cost table.
    #[serde(default = "default_action_cost")]
    pub default_action_cost: f64,

    /// Recovery rate applied to actions absent from the rate table.
    #[serde(default = "default_recovery_rate")]
    pub default_recovery_rate: f64,

    #[serde(default = "default_segment_version")]
    pub segment_version: String,
}

fn default_window_days() -> u32 {
    90
}

fn default_action_cost() -> f64 {
    50.0
}

fn default_recovery_rate() -> f64 {
    0.10
}

fn default_segment_version() -> String {
    "1.0.0".to_string()
}

fn default_action_costs() -> HashMap<String, f64> {
    [
        (ACTION_RETENTION_OUTREACH, 500.0),
        (ACTION_WIN_BACK, 300.0),
        (ACTION_REACTIVATION, 50.0),
        (ACTION_PREVENTIVE_ENGAGEMENT, 100.0),
        (ACTION_CROSS_SELL_CAMPAIGN, 75.0),
        (ACTION_NURTURE, 25.0),
        (ACTION_UPSELL, 150.0),
        (ACTION_CROSS_SELL_COMPLEMENTARY, 50.0),
        (ACTION_MAINTAIN, 10.0),
        (ACTION_MONITOR, 0.0),
    ]
    .into_iter()
    .map(|(action, cost)| (action.to_string(), cost))
    .collect()
}

fn default_recovery_rates() -> HashMap<String, f64> {
    [
        (ACTION_RETENTION_OUTREACH, 0.25),
        (ACTION_WIN_BACK, 0.20),
        (ACTION_REACTIVATION, 0.08),
        (ACTION_PREVENTIVE_ENGAGEMENT, 0.18),
        (ACTION_CROSS_SELL_CAMPAIGN, 0.12),
        (ACTION_NURTURE, 0.05),
        (ACTION_UPSELL, 0.30),
        (ACTION_CROSS_SELL_COMPLEMENTARY, 0.10),
        (ACTION_MAINTAIN, 0.02),
        (ACTION_MONITOR, 0.0),
    ]
    .into_iter()
    .map(|(action, rate)| (action.to_string(), rate))
    .collect()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            snapshot_date: None,
            window_days: default_window_days(),
            signal_weights: SignalWeights::default(),
            lifecycle_thresholds: LifecycleThresholds::default(),
            percentile_cuts: PercentileCuts::default(),
            action_costs: default_action_costs(),
            recovery_rates: default_recovery_rates(),
            default_action_cost: default_action_cost(),
            default_recovery_rate: default_recovery_rate(),
            segment_version: default_segment_version(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file. Missing fields fall back to the defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Check every recognized option. The pipeline validates once at entry;
    /// stages may assume a valid configuration afterwards.
    pub fn validate(&self) -> PipelineResult<()> {
        let w = &self.signal_weights;
        for (name, value) in [
            ("recency", w.recency),
            ("frequency_drop", w.frequency_drop),
            ("spend_drop", w.spend_drop),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!(
                    "signal weight '{name}' must lie in [0, 1], got {value}"
                )));
            }
        }
        let weight_sum = w.recency + w.frequency_drop + w.spend_drop;
        if (weight_sum - 1.0).abs() > 1e-9 {
            return Err(invalid(format!(
                "signal weights must sum to 1.0, got {weight_sum}"
            )));
        }

        if self.window_days == 0 {
            return Err(invalid("window_days must be at least 1".to_string()));
        }

        let t = &self.lifecycle_thresholds;
        if t.active_max_days < 0 {
            return Err(invalid(format!(
                "lifecycle thresholds must be non-negative, got active_max_days {}",
                t.active_max_days
            )));
        }
        if !(t.active_max_days < t.at_risk_max_days && t.at_risk_max_days < t.dormant_max_days) {
            return Err(invalid(format!(
                "lifecycle thresholds must be strictly increasing, got {}/{}/{}",
                t.active_max_days, t.at_risk_max_days, t.dormant_max_days
            )));
        }

        let c = &self.percentile_cuts;
        if !(0.0 < c.medium && c.medium < c.high && c.high < 100.0) {
            return Err(invalid(format!(
                "percentile cuts must satisfy 0 < medium < high < 100, got high {} / medium {}",
                c.high, c.medium
            )));
        }

        for (action, cost) in &self.action_costs {
            if !cost.is_finite() || *cost < 0.0 {
                return Err(invalid(format!(
                    "action cost for '{action}' must be non-negative, got {cost}"
                )));
            }
        }
        if !self.default_action_cost.is_finite() || self.default_action_cost < 0.0 {
            return Err(invalid(format!(
                "default action cost must be non-negative, got {}",
                self.default_action_cost
            )));
        }

        for (action, rate) in &self.recovery_rates {
            if !rate.is_finite() || !(0.0..=1.0).contains(rate) {
                return Err(invalid(format!(
                    "recovery rate for '{action}' must lie in [0, 1], got {rate}"
                )));
            }
        }
        if !self.default_recovery_rate.is_finite()
            || !(0.0..=1.0).contains(&self.default_recovery_rate)
        {
            return Err(invalid(format!(
                "default recovery rate must lie in [0, 1], got {}",
                self.default_recovery_rate
            )));
        }

        if self.segment_version.trim().is_empty() {
            return Err(invalid("segment_version must not be empty".to_string()));
        }

        Ok(())
    }

    /// Cost table lookup with the documented default for unknown actions.
    pub fn action_cost(&self, action: &str) -> f64 {
        self.action_costs
            .get(action)
            .copied()
            .unwrap_or(self.default_action_cost)
    }

    /// Recovery-rate table lookup with the documented default.
    pub fn recovery_rate(&self, action: &str) -> f64 {
        self.recovery_rates
            .get(action)
            .copied()
            .unwrap_or(self.default_recovery_rate)
    }
}

fn invalid(reason: String) -> PipelineError {
    PipelineError::InvalidConfiguration { reason }
}
