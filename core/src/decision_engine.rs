//! Decision Engine: ordered action rules, ROI estimation, explanations.
//!
//! RULE: the rule table is evaluated top-down and the first match wins.
//! The explicit fallback guarantees every (risk level, value segment) pair
//! resolves to exactly one action.
//!
//! ROI figures are heuristic estimates for prioritization, not predictions.
//! estimated_roi = expected_benefit - action_cost, never clamped: a
//! negative ROI means the action is not cost-justified and is surfaced
//! as such.
//!
//! Explanations narrate already-computed values. They never re-derive or
//! alter a number, so the upstream records stay the single source of truth.

use crate::{
    config::PipelineConfig,
    error::{PipelineError, PipelineResult},
    feature_engine::CustomerFeatures,
    risk_engine::{RiskLevel, RiskRecord, RiskSignals},
    segmentation_engine::{SegmentRecord, ValueSegment},
    types::{round2, CustomerId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ── Action vocabulary ──────────────────────────────────────────────

pub const ACTION_RETENTION_OUTREACH: &str = "Retention incentive + personal outreach";
pub const ACTION_WIN_BACK: &str = "Targeted win-back offer";
pub const ACTION_REACTIVATION: &str = "Automated reactivation campaign";
pub const ACTION_PREVENTIVE_ENGAGEMENT: &str = "Preventive engagement (loyalty program, nudges)";
pub const ACTION_CROSS_SELL_CAMPAIGN: &str = "Cross-sell recommendation campaign";
pub const ACTION_NURTURE: &str = "Engagement nurture sequence";
pub const ACTION_UPSELL: &str = "Upsell premium offerings";
pub const ACTION_CROSS_SELL_COMPLEMENTARY: &str = "Cross-sell complementary products";
pub const ACTION_MAINTAIN: &str = "Maintain relationship (standard communications)";
pub const ACTION_MONITOR: &str = "Monitor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionPriority {
    High,
    Medium,
    Low,
}

impl ActionPriority {
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for ActionPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Rule table ─────────────────────────────────────────────────────

/// One rule row. `None` matches any value of that dimension.
pub struct ActionRule {
    pub risk: Option<RiskLevel>,
    pub value: Option<ValueSegment>,
    pub action: &'static str,
    pub priority: ActionPriority,
    pub rationale: &'static str,
}

/// Evaluated top-down; order matters.
pub const ACTION_RULES: &[ActionRule] = &[
    // High risk
    ActionRule {
        risk: Some(RiskLevel::High),
        value: Some(ValueSegment::High),
        action: ACTION_RETENTION_OUTREACH,
        priority: ActionPriority::High,
        rationale: "High-value customers at churn risk need immediate 1:1 attention",
    },
    ActionRule {
        risk: Some(RiskLevel::High),
        value: Some(ValueSegment::Medium),
        action: ACTION_WIN_BACK,
        priority: ActionPriority::High,
        rationale: "Medium-value at-risk customers merit targeted retention effort",
    },
    ActionRule {
        risk: Some(RiskLevel::High),
        value: Some(ValueSegment::Low),
        action: ACTION_REACTIVATION,
        priority: ActionPriority::Medium,
        rationale: "Lower-value churning customers handled via scalable automation",
    },
    // Medium risk
    ActionRule {
        risk: Some(RiskLevel::Medium),
        value: Some(ValueSegment::High),
        action: ACTION_PREVENTIVE_ENGAGEMENT,
        priority: ActionPriority::Medium,
        rationale: "Proactive engagement prevents decay in high-value customers",
    },
    ActionRule {
        risk: Some(RiskLevel::Medium),
        value: Some(ValueSegment::Medium),
        action: ACTION_CROSS_SELL_CAMPAIGN,
        priority: ActionPriority::Medium,
        rationale: "Cross-sell strengthens engagement and increases value",
    },
    ActionRule {
        risk: Some(RiskLevel::Medium),
        value: Some(ValueSegment::Low),
        action: ACTION_NURTURE,
        priority: ActionPriority::Low,
        rationale: "Low-touch nurturing for lower-value customers",
    },
    // Low risk
    ActionRule {
        risk: Some(RiskLevel::Low),
        value: Some(ValueSegment::High),
        action: ACTION_UPSELL,
        priority: ActionPriority::Medium,
        rationale: "Healthy high-value customers are ideal upsell candidates",
    },
    ActionRule {
        risk: Some(RiskLevel::Low),
        value: Some(ValueSegment::Medium),
        action: ACTION_CROSS_SELL_COMPLEMENTARY,
        priority: ActionPriority::Low,
        rationale: "Expand wallet share with engaged customers",
    },
    ActionRule {
        risk: Some(RiskLevel::Low),
        value: Some(ValueSegment::Low),
        action: ACTION_MAINTAIN,
        priority: ActionPriority::Low,
        rationale: "Low-touch maintenance for stable low-value customers",
    },
];

/// Catch-all applied when no rule row matches.
pub const FALLBACK_RULE: ActionRule = ActionRule {
    risk: None,
    value: None,
    action: ACTION_MONITOR,
    priority: ActionPriority::Low,
    rationale: "No matching rule; customer requires observation or manual review",
};

/// First matching rule, or the fallback.
pub fn match_rule(risk: RiskLevel, value: ValueSegment) -> &'static ActionRule {
    ACTION_RULES
        .iter()
        .find(|r| r.risk.map_or(true, |x| x == risk) && r.value.map_or(true, |x| x == value))
        .unwrap_or(&FALLBACK_RULE)
}

// ── Output records ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub customer_id: CustomerId,
    pub recommended_action: String,
    pub action_priority: ActionPriority,
    pub action_rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiRecord {
    pub customer_id: CustomerId,
    pub action_cost: f64,
    pub expected_benefit: f64,
    pub estimated_roi: f64,
    /// Informational flag, never used to suppress an action.
    pub roi_feasible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationRecord {
    pub customer_id: CustomerId,
    pub decision_explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionTables {
    pub actions: Vec<ActionRecord>,
    pub rois: Vec<RoiRecord>,
    pub explanations: Vec<ExplanationRecord>,
}

// ── Decision stage ─────────────────────────────────────────────────

/// Join segments, risk records, signals, and features by customer_id and
/// produce the action, ROI, and explanation tables. A missing upstream
/// record for any expected customer aborts the run; the Decision Engine
/// never substitutes defaults for absent inputs.
pub fn decide(
    features: &[CustomerFeatures],
    segments: &[SegmentRecord],
    signals: &[RiskSignals],
    risks: &[RiskRecord],
    config: &PipelineConfig,
) -> PipelineResult<DecisionTables> {
    let features_by_id: BTreeMap<&str, &CustomerFeatures> = features
        .iter()
        .map(|f| (f.customer_id.as_str(), f))
        .collect();
    let signals_by_id: BTreeMap<&str, &RiskSignals> = signals
        .iter()
        .map(|s| (s.customer_id.as_str(), s))
        .collect();
    let risks_by_id: BTreeMap<&str, &RiskRecord> =
        risks.iter().map(|r| (r.customer_id.as_str(), r)).collect();

    let mut actions = Vec::with_capacity(segments.len());
    let mut rois = Vec::with_capacity(segments.len());
    let mut explanations = Vec::with_capacity(segments.len());

    for segment in segments {
        let id = segment.customer_id.as_str();
        let feature = features_by_id
            .get(id)
            .ok_or_else(|| missing(id, "feature"))?;
        let signal = signals_by_id
            .get(id)
            .ok_or_else(|| missing(id, "risk signal"))?;
        let risk = risks_by_id.get(id).ok_or_else(|| missing(id, "risk"))?;

        let rule = match_rule(risk.risk_level, segment.value_segment);
        actions.push(ActionRecord {
            customer_id: segment.customer_id.clone(),
            recommended_action: rule.action.to_string(),
            action_priority: rule.priority,
            action_rationale: rule.rationale.to_string(),
        });

        let action_cost = config.action_cost(rule.action);
        let expected_benefit = round2(feature.lifetime_value.max(0.0) * config.recovery_rate(rule.action));
        let estimated_roi = round2(expected_benefit - action_cost);
        rois.push(RoiRecord {
            customer_id: segment.customer_id.clone(),
            action_cost,
            expected_benefit,
            estimated_roi,
            roi_feasible: estimated_roi > 0.0,
        });

        explanations.push(ExplanationRecord {
            customer_id: segment.customer_id.clone(),
            decision_explanation: build_explanation(segment, risk, signal, rule.action),
        });
    }

    Ok(DecisionTables {
        actions,
        rois,
        explanations,
    })
}

fn missing(customer_id: &str, stage: &'static str) -> PipelineError {
    PipelineError::MissingFeature {
        customer_id: customer_id.to_string(),
        stage,
    }
}

// ── Explanation assembly ───────────────────────────────────────────

// Explanation aides, not decision logic.
const RECENCY_SIGNAL_MENTION: f64 = 0.3;
const DROP_SIGNAL_MENTION: f64 = 0.2;

/// Which signals are elevated enough to name in the explanation.
fn dominant_signals(signals: &RiskSignals) -> Vec<&'static str> {
    let mut dominant = Vec::new();
    if signals.recency_signal >= RECENCY_SIGNAL_MENTION {
        dominant.push("prolonged inactivity");
    }
    if signals.spend_drop_signal >= DROP_SIGNAL_MENTION {
        dominant.push("declining spend");
    }
    if signals.frequency_drop_signal >= DROP_SIGNAL_MENTION {
        dominant.push("reduced purchase frequency");
    }
    dominant
}

/// Concise, factual narration of the computed records, suitable for
/// business stakeholders.
fn build_explanation(
    segment: &SegmentRecord,
    risk: &RiskRecord,
    signals: &RiskSignals,
    action: &str,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    match risk.risk_level {
        RiskLevel::High | RiskLevel::Medium => {
            let dominant = dominant_signals(signals);
            if dominant.is_empty() {
                parts.push(format!(
                    "Customer is classified as {} Risk based on overall behavior.",
                    risk.risk_level
                ));
            } else {
                parts.push(format!(
                    "Customer is classified as {} Risk due to {}.",
                    risk.risk_level,
                    dominant.join(" and ")
                ));
            }
        }
        RiskLevel::Low => {
            parts.push("Customer shows stable behavior and is classified as Low Risk.".to_string());
        }
    }

    parts.push(format!(
        "Overall risk score is {:.1} out of 100.",
        risk.risk_score
    ));

    parts.push(format!(
        "As a {} customer, the recommended action is {}.",
        segment.value_segment.label(),
        action.to_lowercase()
    ));

    parts.join(" ")
}
