use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregation::{aggregate, AggSpec, AggTable, GroupKey, Reduction};
use crate::core::dates::{following_month_starts, month_start};
use crate::core::period::PeriodGranularity;
use crate::filter::{JointView, Outcome};
use crate::store::{Column, FinancialMeasure};

/// Values indexed by month start, ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlySeries {
    points: Vec<(NaiveDate, f64)>,
}

impl MonthlySeries {
    /// Build from `(month, value)` pairs; pairs are sorted by month.
    pub fn new(mut points: Vec<(NaiveDate, f64)>) -> Self {
        points.sort_by_key(|(date, _)| *date);
        Self { points }
    }

    /// Consecutive months starting at `start`.
    pub fn from_values(start: NaiveDate, values: &[f64]) -> Self {
        let dates = std::iter::once(month_start(start))
            .chain(following_month_starts(start, values.len().saturating_sub(1)));
        Self {
            points: dates.zip(values.iter().copied()).collect(),
        }
    }

    /// Read one value column of a month-keyed aggregate. Rows whose first key
    /// is not a date are skipped.
    pub fn from_table(table: &AggTable, column: &str) -> Self {
        let Some(index) = table.value_index(column) else {
            return Self::default();
        };
        let points = table
            .rows()
            .iter()
            .filter_map(|row| {
                let date = row.keys.first()?.as_date()?;
                Some((date, row.values[index].as_number()?))
            })
            .collect();
        Self::new(points)
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, value)| *value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        self.points.last().copied()
    }

    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .iter()
            .find(|(d, _)| *d == date)
            .map(|(_, value)| *value)
    }
}

/// Monthly series of one financial measure over the filtered view.
pub fn financial_series(
    view: &JointView<'_>,
    measure: FinancialMeasure,
    reduction: Reduction,
) -> Outcome<MonthlySeries> {
    view.financial
        .compute(&[measure], |rows, _| {
            let table = aggregate(
                rows,
                &[GroupKey::Period(PeriodGranularity::Month)],
                &AggSpec::new().measure(measure, reduction),
            );
            MonthlySeries::from_table(&table, measure.header())
        })
        .and_then(|series| {
            if series.is_empty() {
                Outcome::Empty
            } else {
                Outcome::Ready(series)
            }
        })
}
