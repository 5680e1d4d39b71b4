use lifecycle_core::{
    config::PipelineConfig,
    pipeline::{run_pipeline, PipelineOutputs},
    store::DecisionStore,
    synthetic::{generate_ledger, GeneratorConfig},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn small_outputs(seed: u64) -> PipelineOutputs {
    let ledger = generate_ledger(&GeneratorConfig {
        seed,
        customers: 30,
        ..GeneratorConfig::default()
    });
    run_pipeline(&ledger, &PipelineConfig::default()).unwrap()
}

fn exported_store(run_id: &str, outputs: &PipelineOutputs) -> DecisionStore {
    let mut store = DecisionStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
        .insert_run(run_id, outputs.snapshot_date, "1.0.0")
        .unwrap();
    store.insert_outputs(run_id, outputs).unwrap();
    store
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn migrations_are_idempotent() {
    let store = DecisionStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.migrate().unwrap();
}

#[test]
fn exported_row_counts_match_the_outputs() {
    let outputs = small_outputs(7);
    let store = exported_store("run-export", &outputs);

    let count = store.customer_count("run-export").unwrap();
    assert_eq!(count, outputs.features.len() as i64);
}

#[test]
fn risk_level_counts_cover_the_cohort() {
    let outputs = small_outputs(7);
    let store = exported_store("run-risk", &outputs);

    let counts = store.risk_level_counts("run-risk").unwrap();
    let total: i64 = counts.iter().map(|(_, n)| n).sum();
    assert_eq!(total, outputs.risks.len() as i64);
    for (level, _) in &counts {
        assert!(
            ["Low", "Medium", "High"].contains(&level.as_str()),
            "unexpected level '{level}'"
        );
    }
}

#[test]
fn total_roi_matches_the_in_memory_sum() {
    let outputs = small_outputs(7);
    let store = exported_store("run-roi", &outputs);

    let expected: f64 = outputs.rois.iter().map(|r| r.estimated_roi).sum();
    let stored = store.total_estimated_roi("run-roi").unwrap();
    assert!(
        (stored - expected).abs() < 1e-6,
        "stored {stored} vs computed {expected}"
    );
}

#[test]
fn explanations_round_trip_per_customer() {
    let outputs = small_outputs(7);
    let store = exported_store("run-explain", &outputs);

    let first = &outputs.explanations[0];
    let fetched = store
        .explanation_for("run-explain", &first.customer_id)
        .unwrap();
    assert_eq!(fetched.as_deref(), Some(first.decision_explanation.as_str()));

    let absent = store.explanation_for("run-explain", "C99999").unwrap();
    assert_eq!(absent, None);
}

/// Runs are isolated by run_id; a second export never disturbs the first.
#[test]
fn runs_are_keyed_independently() {
    let outputs_a = small_outputs(7);
    let outputs_b = small_outputs(8);

    let mut store = exported_store("run-a", &outputs_a);
    store
        .insert_run("run-b", outputs_b.snapshot_date, "1.0.0")
        .unwrap();
    store.insert_outputs("run-b", &outputs_b).unwrap();

    assert_eq!(
        store.customer_count("run-a").unwrap(),
        outputs_a.features.len() as i64
    );
    assert_eq!(
        store.customer_count("run-b").unwrap(),
        outputs_b.features.len() as i64
    );
}
