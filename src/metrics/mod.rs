//! Business metrics over a [`JointView`](crate::filter::JointView).
//!
//! One function per reported figure or table, grouped by source:
//! [`operations`] (daily practice operations, equipment and staffing),
//! [`financial`] (monthly statements) and [`revenue`] (billed patient visits).
//! Every function returns an [`Outcome`](crate::filter::Outcome) so callers can
//! tell a failed source from a filter that matched nothing.

pub mod financial;
pub mod operations;
pub mod revenue;

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregation::{percentage, AggSpec, GroupKey, Reduction};
use crate::core::dates::month_start;
use crate::core::period::PeriodGranularity;
use crate::store::{Row, Schema, TableSpec};

/// A labelled amount with its share of the total, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub label: String,
    pub amount: f64,
    pub share: f64,
}

impl Share {
    /// Shares of `total` for each `(label, amount)`.
    pub fn of_total(amounts: Vec<(String, f64)>, total: f64) -> Vec<Share> {
        amounts
            .into_iter()
            .map(|(label, amount)| Share {
                share: percentage(amount, total),
                label,
                amount,
            })
            .collect()
    }
}

/// Time key for a daily table under `granularity`.
pub(crate) fn daily_key<T: TableSpec>(granularity: PeriodGranularity) -> GroupKey<T> {
    GroupKey::time(granularity)
}

/// Time key for a monthly table: daily granularity falls back to months.
pub(crate) fn monthly_key<T: TableSpec>(granularity: PeriodGranularity) -> GroupKey<T> {
    match granularity {
        PeriodGranularity::Day => GroupKey::Period(PeriodGranularity::Month),
        other => GroupKey::Period(other),
    }
}

/// Add one `reduction` column per measure the schema carries.
pub(crate) fn present<T: TableSpec>(
    spec: AggSpec<T>,
    schema: &Schema<T>,
    columns: &[T::Measure],
    reduction: Reduction,
) -> AggSpec<T> {
    columns
        .iter()
        .filter(|column| schema.has_measure(**column))
        .fold(spec, |spec, column| spec.measure(*column, reduction))
}

/// Mean of a measure over rows; `None` when the schema lacks the column or no
/// row has a value.
pub(crate) fn mean_of<T: TableSpec>(
    rows: &[&Row<T>],
    schema: &Schema<T>,
    column: T::Measure,
) -> Option<f64> {
    if !schema.has_measure(column) {
        return None;
    }
    let values: Vec<f64> = rows.iter().filter_map(|row| row.measure(column)).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sum of a measure over rows; missing cells count as zero.
pub(crate) fn sum_of<T: TableSpec>(rows: &[&Row<T>], column: T::Measure) -> f64 {
    rows.iter().filter_map(|row| row.measure(column)).sum()
}

/// The latest month present in `rows` and the rows dated in it.
pub(crate) fn latest_month<'a, T: TableSpec>(
    rows: &[&'a Row<T>],
) -> Option<(NaiveDate, Vec<&'a Row<T>>)> {
    let latest = rows.iter().filter_map(|row| row.date()).map(month_start).max()?;
    let in_month = rows
        .iter()
        .copied()
        .filter(|row| row.date().map(month_start) == Some(latest))
        .collect();
    Some((latest, in_month))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Staff, StaffMeasure};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn latest_month_collects_its_rows() {
        let rows = vec![
            Row::<Staff>::on(ymd(2024, 2, 3)).with_measure(StaffMeasure::HoursWorked, 1.0),
            Row::<Staff>::on(ymd(2024, 3, 9)).with_measure(StaffMeasure::HoursWorked, 2.0),
            Row::<Staff>::on(ymd(2024, 3, 1)).with_measure(StaffMeasure::HoursWorked, 3.0),
        ];
        let refs: Vec<&Row<Staff>> = rows.iter().collect();

        let (month, in_month) = latest_month(&refs).unwrap();
        assert_eq!(month, ymd(2024, 3, 1));
        assert_eq!(sum_of(&in_month, StaffMeasure::HoursWorked), 5.0);
    }

    #[test]
    fn mean_of_absent_column_is_none() {
        let rows = vec![Row::<Staff>::on(ymd(2024, 2, 3))];
        let refs: Vec<&Row<Staff>> = rows.iter().collect();
        assert_eq!(mean_of(&refs, &Schema::empty(), StaffMeasure::HoursWorked), None);
        assert_eq!(mean_of(&refs, &Schema::complete(), StaffMeasure::HoursWorked), None);
    }

    #[test]
    fn shares_of_zero_total_are_zero() {
        let shares = Share::of_total(vec![("A".into(), 5.0)], 0.0);
        assert_eq!(shares[0].share, 0.0);
    }
}
