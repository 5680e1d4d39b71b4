//! Shared primitive types used across the entire pipeline.

/// A stable, unique identifier for a customer.
pub type CustomerId = String;

/// Round to two decimal places, the reported precision for scores
/// and currency amounts.
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
