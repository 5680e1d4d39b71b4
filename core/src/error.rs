use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Missing {stage} record for customer '{customer_id}'")]
    MissingFeature {
        customer_id: String,
        stage: &'static str,
    },

    #[error("Invalid snapshot: {snapshot_date} precedes latest transaction on {latest_transaction}")]
    InvalidSnapshot {
        snapshot_date: NaiveDate,
        latest_transaction: NaiveDate,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Cohort of {cohort_size} customer(s) is too small for percentile segmentation")]
    EmptyCohort { cohort_size: usize },

    #[error("Invalid transaction '{transaction_id}': {reason}")]
    InvalidTransaction {
        transaction_id: String,
        reason: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
