//! Monthly normalization of the Financial table.
//!
//! Financial rows are folded to one row per location per calendar month, dated
//! the first of that month. Flows are summed, balances keep the value of the
//! latest row in the month, rates are averaged and the EBITDA margin is derived
//! again from the folded totals.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::columns::Column;
use super::kinds::{Financial, FinancialAttr, FinancialMeasure, MonthlyFold};
use super::row::Row;
use super::table::Table;
use crate::aggregation::percentage;
use crate::core::dates::{month_start, ParsedDate};

type MonthKey = (NaiveDate, Option<String>);

pub(crate) fn fold_monthly(table: &mut Table<Financial>) {
    let (_, rows) = table.parts_mut();
    let before = rows.len();

    let mut groups: BTreeMap<MonthKey, Vec<Row<Financial>>> = BTreeMap::new();
    let mut undated = Vec::new();
    for row in rows.drain(..) {
        match row.date() {
            Some(date) => {
                let key = (month_start(date), row.location_id().map(str::to_string));
                groups.entry(key).or_default().push(row);
            }
            None => undated.push(row),
        }
    }

    let mut folded: Vec<Row<Financial>> = groups
        .into_iter()
        .map(|((month, _), group)| fold_group(month, group))
        .collect();
    folded.extend(undated);

    if folded.len() != before {
        log::debug!(
            "Folded {} financial rows into {} monthly rows",
            before,
            folded.len()
        );
    }
    *rows = folded;
}

fn fold_group(month: NaiveDate, mut group: Vec<Row<Financial>>) -> Row<Financial> {
    // Stable sort keeps file order for rows on the same day, so the last row is the latest.
    group.sort_by_key(|row| row.date());

    if group.len() == 1 {
        let mut row = group.remove(0);
        row.set_date(ParsedDate::Parsed(month));
        return row;
    }

    let sources = group
        .iter()
        .flat_map(|row| row.sources().iter().cloned())
        .collect();
    let latest = &group[group.len() - 1];
    let mut folded = Row::<Financial>::on(month);
    for attr in FinancialAttr::ALL {
        let value = group
            .iter()
            .rev()
            .find_map(|row| row.attr(*attr))
            .map(str::to_string);
        folded.set_attr(*attr, value);
    }

    for measure in FinancialMeasure::ALL {
        let values: Vec<f64> = group.iter().filter_map(|row| row.measure(*measure)).collect();
        let value = match measure.monthly_fold() {
            MonthlyFold::Sum => sum(&values),
            MonthlyFold::Latest => group
                .iter()
                .rev()
                .find_map(|row| row.measure(*measure))
                .unwrap_or(f64::NAN),
            MonthlyFold::Mean | MonthlyFold::Recompute => mean(&values),
        };
        folded.set_measure(*measure, value);
    }

    if let (Some(ebitda), Some(revenue)) = (
        folded.measure(FinancialMeasure::Ebitda),
        folded.measure(FinancialMeasure::TotalRevenue),
    ) {
        folded.set_measure(FinancialMeasure::EbitdaMargin, percentage(ebitda, revenue));
    }

    let width = latest.dynamic_values().len();
    let dynamic = (0..width)
        .map(|index| {
            let values: Vec<f64> = group.iter().filter_map(|row| row.dynamic(index)).collect();
            sum(&values)
        })
        .collect();
    *folded.dynamic_mut() = dynamic;
    *folded.sources_mut() = sources;

    folded
}

fn sum(values: &[f64]) -> f64 {
    if values.is_empty() {
        f64::NAN
    } else {
        values.iter().sum()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
