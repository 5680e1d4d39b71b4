use lifecycle_core::{
    config::PipelineConfig,
    decision_engine::{
        decide, match_rule, ActionPriority, ACTION_CROSS_SELL_CAMPAIGN,
        ACTION_CROSS_SELL_COMPLEMENTARY, ACTION_MAINTAIN, ACTION_NURTURE,
        ACTION_PREVENTIVE_ENGAGEMENT, ACTION_REACTIVATION, ACTION_RETENTION_OUTREACH,
        ACTION_UPSELL, ACTION_WIN_BACK,
    },
    error::PipelineError,
    feature_engine::CustomerFeatures,
    risk_engine::{RiskLevel, RiskRecord, RiskSignals},
    segmentation_engine::{LifecycleStage, SegmentRecord, ValueSegment},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn feat(id: &str, lifetime_value: f64) -> CustomerFeatures {
    CustomerFeatures {
        customer_id: id.to_string(),
        recency_days: 120,
        frequency: 2,
        monetary: 100.0,
        lifetime_value,
        spend_trend: -0.3,
        frequency_trend: -0.1,
    }
}

fn segment(id: &str, value: ValueSegment) -> SegmentRecord {
    SegmentRecord {
        customer_id: id.to_string(),
        lifecycle_stage: LifecycleStage::Dormant,
        value_segment: value,
        segment_label: format!("Dormant / {}", value.label()),
        segment_version: "1.0.0".to_string(),
    }
}

fn signal(id: &str, recency: f64, spend: f64, frequency: f64) -> RiskSignals {
    RiskSignals {
        customer_id: id.to_string(),
        recency_signal: recency,
        spend_drop_signal: spend,
        frequency_drop_signal: frequency,
    }
}

fn risk(id: &str, score: f64) -> RiskRecord {
    RiskRecord {
        customer_id: id.to_string(),
        risk_score: score,
        risk_level: RiskLevel::for_score(score),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Every (risk level, value segment) pair resolves through the ordered rule
/// table to exactly one action.
#[test]
fn rule_table_covers_the_full_matrix() {
    let cases = [
        (RiskLevel::High, ValueSegment::High, ACTION_RETENTION_OUTREACH, ActionPriority::High),
        (RiskLevel::High, ValueSegment::Medium, ACTION_WIN_BACK, ActionPriority::High),
        (RiskLevel::High, ValueSegment::Low, ACTION_REACTIVATION, ActionPriority::Medium),
        (RiskLevel::Medium, ValueSegment::High, ACTION_PREVENTIVE_ENGAGEMENT, ActionPriority::Medium),
        (RiskLevel::Medium, ValueSegment::Medium, ACTION_CROSS_SELL_CAMPAIGN, ActionPriority::Medium),
        (RiskLevel::Medium, ValueSegment::Low, ACTION_NURTURE, ActionPriority::Low),
        (RiskLevel::Low, ValueSegment::High, ACTION_UPSELL, ActionPriority::Medium),
        (RiskLevel::Low, ValueSegment::Medium, ACTION_CROSS_SELL_COMPLEMENTARY, ActionPriority::Low),
        (RiskLevel::Low, ValueSegment::Low, ACTION_MAINTAIN, ActionPriority::Low),
    ];

    for (risk_level, value, expected_action, expected_priority) in cases {
        let rule = match_rule(risk_level, value);
        assert_eq!(rule.action, expected_action, "{risk_level:?}/{value:?}");
        assert_eq!(rule.priority, expected_priority, "{risk_level:?}/{value:?}");
        assert!(!rule.rationale.is_empty());
    }
}

/// ROI is expected_benefit minus action_cost, where the benefit is the
/// recoverable share of lifetime value for the chosen action.
#[test]
fn roi_arithmetic_follows_the_cost_tables() {
    let features = vec![feat("C001", 4000.0)];
    let segments = vec![segment("C001", ValueSegment::High)];
    let signals = vec![signal("C001", 1.0, 0.6, 0.2)];
    let risks = vec![risk("C001", 66.0)];
    let config = PipelineConfig::default();

    let tables = decide(&features, &segments, &signals, &risks, &config).unwrap();

    assert_eq!(tables.actions[0].recommended_action, ACTION_RETENTION_OUTREACH);
    let roi = &tables.rois[0];
    assert_eq!(roi.action_cost, 500.0);
    assert_eq!(roi.expected_benefit, 1000.0, "25% of a 4000 lifetime value");
    assert_eq!(roi.estimated_roi, 500.0);
    assert!(roi.roi_feasible);
}

/// A healthy high-value customer: the upsell costs 150 and recovers 30%
/// of a 1000 lifetime value, netting 150.
#[test]
fn upsell_roi_for_a_healthy_customer() {
    let features = vec![feat("C001", 1000.0)];
    let segments = vec![segment("C001", ValueSegment::High)];
    let signals = vec![signal("C001", 0.1, 0.0, 0.0)];
    let risks = vec![risk("C001", 4.0)];
    let config = PipelineConfig::default();

    let tables = decide(&features, &segments, &signals, &risks, &config).unwrap();

    assert_eq!(tables.actions[0].recommended_action, ACTION_UPSELL);
    let roi = &tables.rois[0];
    assert_eq!(roi.action_cost, 150.0);
    assert_eq!(roi.expected_benefit, 300.0);
    assert_eq!(roi.estimated_roi, 150.0);
    assert!(roi.roi_feasible);
}

/// A negative ROI is reported as computed. The action is still recommended;
/// feasibility is informational only.
#[test]
fn negative_roi_is_surfaced_not_clamped() {
    let features = vec![feat("C001", 100.0)];
    let segments = vec![segment("C001", ValueSegment::High)];
    let signals = vec![signal("C001", 1.0, 0.6, 0.2)];
    let risks = vec![risk("C001", 66.0)];
    let config = PipelineConfig::default();

    let tables = decide(&features, &segments, &signals, &risks, &config).unwrap();

    let roi = &tables.rois[0];
    assert_eq!(roi.expected_benefit, 25.0);
    assert_eq!(roi.estimated_roi, -475.0);
    assert!(!roi.roi_feasible);
    assert_eq!(
        tables.actions[0].recommended_action, ACTION_RETENTION_OUTREACH,
        "a non-feasible ROI never suppresses the action"
    );
}

/// Explanations narrate the already-computed records: elevated signals by
/// name, the rounded score, and the recommended action.
#[test]
fn explanations_narrate_computed_values() {
    let features = vec![feat("C001", 4000.0)];
    let segments = vec![segment("C001", ValueSegment::High)];
    let signals = vec![signal("C001", 1.0, 0.6, 0.2)];
    let risks = vec![risk("C001", 66.0)];
    let config = PipelineConfig::default();

    let tables = decide(&features, &segments, &signals, &risks, &config).unwrap();
    let text = &tables.explanations[0].decision_explanation;

    assert!(text.contains("High Risk"), "{text}");
    assert!(text.contains("prolonged inactivity"), "{text}");
    assert!(text.contains("declining spend"), "{text}");
    assert!(text.contains("reduced purchase frequency"), "{text}");
    assert!(text.contains("Overall risk score is 66.0 out of 100."), "{text}");
    assert!(text.contains("As a High Value customer"), "{text}");
    assert!(
        text.contains("retention incentive + personal outreach"),
        "{text}"
    );
}

#[test]
fn low_risk_explanation_reports_stable_behavior() {
    let features = vec![feat("C001", 500.0)];
    let segments = vec![segment("C001", ValueSegment::Medium)];
    let signals = vec![signal("C001", 0.1, 0.0, 0.0)];
    let risks = vec![risk("C001", 4.0)];
    let config = PipelineConfig::default();

    let tables = decide(&features, &segments, &signals, &risks, &config).unwrap();
    let text = &tables.explanations[0].decision_explanation;

    assert!(
        text.contains("Customer shows stable behavior and is classified as Low Risk."),
        "{text}"
    );
}

/// A segment without its upstream records aborts the run instead of
/// defaulting anything.
#[test]
fn missing_upstream_records_abort() {
    let segments = vec![segment("C001", ValueSegment::High)];
    let signals = vec![signal("C001", 1.0, 0.6, 0.2)];
    let risks = vec![risk("C001", 66.0)];
    let config = PipelineConfig::default();

    let err = decide(&[], &segments, &signals, &risks, &config).unwrap_err();
    assert!(matches!(err, PipelineError::MissingFeature { .. }));

    let features = vec![feat("C001", 4000.0)];
    let err = decide(&features, &segments, &[], &risks, &config).unwrap_err();
    assert!(matches!(err, PipelineError::MissingFeature { .. }));

    let err = decide(&features, &segments, &signals, &[], &config).unwrap_err();
    assert!(matches!(err, PipelineError::MissingFeature { .. }));
}
