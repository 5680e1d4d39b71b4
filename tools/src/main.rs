//! pipeline-runner: one-shot decision pipeline over a transaction ledger.
//!
//! Usage:
//!   pipeline-runner --ledger transactions.json --db decisions.db
//!   pipeline-runner --synthetic --seed 42 --customers 200 --days 365
//!   pipeline-runner --ledger transactions.json --config pipeline.json --snapshot 2024-06-30

use anyhow::{Context, Result};
use chrono::NaiveDate;
use lifecycle_core::{
    config::PipelineConfig,
    ledger,
    pipeline::{self, PipelineOutputs},
    store::DecisionStore,
    synthetic::{self, GeneratorConfig},
};
use std::collections::BTreeMap;
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let synthetic_mode = args.iter().any(|a| a == "--synthetic");
    let seed = parse_arg(&args, "--seed", 42u64);
    let customers = parse_arg(&args, "--customers", 200u32);
    let days = parse_arg(&args, "--days", 365u32);
    let ledger_path = str_arg(&args, "--ledger");
    let config_path = str_arg(&args, "--config");
    let snapshot = str_arg(&args, "--snapshot");
    let db = str_arg(&args, "--db");

    let mut config = match config_path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(date) = snapshot {
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .with_context(|| format!("Invalid --snapshot date: {date}"))?;
        config.snapshot_date = Some(parsed);
    }

    let transactions = match ledger_path {
        Some(path) => ledger::load_ledger(path)?,
        None if synthetic_mode => {
            let gen = GeneratorConfig {
                seed,
                customers,
                end_date: config
                    .snapshot_date
                    .unwrap_or_else(|| chrono::Utc::now().date_naive()),
                history_days: days,
            };
            println!("Generating synthetic ledger (seed {seed}, {customers} customers, {days} days)");
            synthetic::generate_ledger(&gen)
        }
        None => anyhow::bail!("Either --ledger <path> or --synthetic is required"),
    };

    let outputs = pipeline::run_pipeline(&transactions, &config)?;
    print_summary(&outputs, transactions.len());

    if let Some(db_path) = db {
        let run_id = format!("run-{}", uuid::Uuid::new_v4());
        let mut store = DecisionStore::open(db_path)?;
        store.migrate()?;
        store.insert_run(&run_id, outputs.snapshot_date, &config.segment_version)?;
        store.insert_outputs(&run_id, &outputs)?;
        println!();
        println!("Exported {} customers to {db_path} as {run_id}", outputs.features.len());
    }

    Ok(())
}

fn print_summary(outputs: &PipelineOutputs, transaction_count: usize) {
    println!("=== RUN SUMMARY ===");
    println!("  snapshot:     {}", outputs.snapshot_date);
    println!("  transactions: {transaction_count}");
    println!("  customers:    {}", outputs.features.len());

    println!();
    println!("=== LIFECYCLE DISTRIBUTION ===");
    for (stage, count) in count_by(outputs.segments.iter().map(|s| s.lifecycle_stage.label())) {
        println!("  {stage:<10} {count}");
    }

    println!();
    println!("=== RISK DISTRIBUTION ===");
    for (level, count) in count_by(outputs.risks.iter().map(|r| r.risk_level.label())) {
        println!("  {level:<10} {count}");
    }

    println!();
    println!("=== ACTION DISTRIBUTION ===");
    for (action, count) in count_by(outputs.actions.iter().map(|a| a.recommended_action.as_str())) {
        println!("  {count:>4}  {action}");
    }

    let total_cost: f64 = outputs.rois.iter().map(|r| r.action_cost).sum();
    let total_benefit: f64 = outputs.rois.iter().map(|r| r.expected_benefit).sum();
    let total_roi: f64 = outputs.rois.iter().map(|r| r.estimated_roi).sum();
    let feasible = outputs.rois.iter().filter(|r| r.roi_feasible).count();

    println!();
    println!("=== ROI SUMMARY ===");
    println!("  total cost:       ${total_cost:.2}");
    println!("  expected benefit: ${total_benefit:.2}");
    println!("  estimated ROI:    ${total_roi:.2}");
    println!("  feasible actions: {feasible} / {}", outputs.rois.len());

    let mut ranked: Vec<_> = outputs.rois.iter().collect();
    ranked.sort_by(|a, b| {
        b.estimated_roi
            .total_cmp(&a.estimated_roi)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });

    println!();
    println!("=== TOP OPPORTUNITIES ===");
    for roi in ranked.iter().take(5) {
        println!(
            "  {}  ROI ${:.2}  (cost ${:.2}, benefit ${:.2})",
            roi.customer_id, roi.estimated_roi, roi.action_cost, roi.expected_benefit
        );
    }
}

fn count_by<'a>(labels: impl Iterator<Item = &'a str>) -> BTreeMap<&'a str, usize> {
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
