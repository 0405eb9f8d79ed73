//! Grouped roll-ups over filtered rows.
//!
//! [`aggregate`] groups rows by a list of [`GroupKey`]s and applies one
//! [`Reduction`] per output column. Ratios are never averaged row by row; they
//! are derived afterwards from aggregated numerator and denominator columns
//! with [`AggTable::derive_ratio`], which maps a zero denominator to 0.

pub mod engine;
pub mod spec;
pub mod table;

pub use engine::{aggregate, summarize};
pub use spec::{AggColumn, AggSpec, GroupKey, Reduction, ValueSource};
pub use table::{AggRow, AggTable, KeyValue, RowRef, Value};

/// `numerator / denominator`, or 0 when the denominator is zero or either side
/// is not finite.
///
/// # Examples
///
/// ```
/// use dentalytics::aggregation::rate;
/// assert_eq!(rate(3.0, 4.0), 0.75);
/// assert_eq!(rate(3.0, 0.0), 0.0);
/// ```
pub fn rate(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !numerator.is_finite() || !denominator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

/// [`rate`] scaled to a percentage.
pub fn percentage(numerator: f64, denominator: f64) -> f64 {
    rate(numerator, denominator) * 100.0
}

/// Mean of `values`, 0 when empty.
pub fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_of_zero_denominator() {
        assert_eq!(percentage(5.0, 0.0), 0.0);
        assert_eq!(percentage(1.0, 4.0), 25.0);
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean_or_zero(&[]), 0.0);
        assert_eq!(mean_or_zero(&[2.0, 4.0]), 3.0);
    }
}
