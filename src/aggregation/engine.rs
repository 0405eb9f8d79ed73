use chrono::Datelike;
use std::collections::{BTreeMap, BTreeSet};

use super::spec::{AggColumn, AggSpec, GroupKey, Reduction, ValueSource};
use super::table::{AggRow, AggTable, KeyValue, Value};
use crate::core::dates::weekday_rank;
use crate::store::{Row, TableSpec};

/// Group `rows` by `keys` and reduce each group per `spec`.
///
/// Rows whose key cannot be computed (missing attribute, null date) are left
/// out, so only key combinations present in the input appear. Output rows are
/// sorted by key; dates and periods sort chronologically and weekdays sort
/// Monday first.
pub fn aggregate<T: TableSpec>(rows: &[&Row<T>], keys: &[GroupKey<T>], spec: &AggSpec<T>) -> AggTable {
    let mut groups: BTreeMap<Vec<KeyValue>, Vec<Accumulator>> = BTreeMap::new();

    for row in rows {
        let Some(key) = keys.iter().map(|k| key_of(row, k)).collect::<Option<Vec<_>>>() else {
            continue;
        };
        let accumulators = groups
            .entry(key)
            .or_insert_with(|| spec.columns().iter().map(Accumulator::for_column).collect());
        for (acc, column) in accumulators.iter_mut().zip(spec.columns()) {
            acc.push(read(row, column));
        }
    }

    let rows = groups
        .into_iter()
        .map(|(keys, accumulators)| AggRow {
            keys,
            values: accumulators.into_iter().map(Accumulator::finish).collect(),
        })
        .collect();

    AggTable::new(
        keys.iter().map(GroupKey::name).collect(),
        spec.columns().iter().map(|c| c.name.clone()).collect(),
        rows,
    )
}

/// Reduce all rows into a single set of values, without grouping.
///
/// Unlike [`aggregate`] with no keys this always yields values: sums of no
/// rows are 0 and means of no rows are [`Value::Null`].
pub fn summarize<T: TableSpec>(rows: &[&Row<T>], spec: &AggSpec<T>) -> Vec<Value> {
    let mut accumulators: Vec<Accumulator> =
        spec.columns().iter().map(Accumulator::for_column).collect();
    for row in rows {
        for (acc, column) in accumulators.iter_mut().zip(spec.columns()) {
            acc.push(read(row, column));
        }
    }
    accumulators.into_iter().map(Accumulator::finish).collect()
}

fn key_of<T: TableSpec>(row: &Row<T>, key: &GroupKey<T>) -> Option<KeyValue> {
    match key {
        GroupKey::Attribute(column) => row.attr(*column).map(|v| KeyValue::Text(v.to_string())),
        GroupKey::Date => row.date().map(KeyValue::Date),
        GroupKey::Period(granularity) => row.date().map(|d| KeyValue::Period(granularity.period_of(d))),
        GroupKey::DayName => {
            let name = row.calendar()?.day_name;
            weekday_rank(name).map(|rank| KeyValue::Weekday { rank, name })
        }
        GroupKey::MonthName => {
            let date = row.date()?;
            let name = row.calendar()?.month_name;
            Some(KeyValue::Month {
                number: date.month(),
                name,
            })
        }
        GroupKey::MonthYear => row
            .calendar()
            .map(|c| KeyValue::Text(c.month_year.clone())),
    }
}

enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

fn read<T: TableSpec>(row: &Row<T>, column: &AggColumn<T>) -> Cell {
    let value = match column.source {
        ValueSource::Measure(m) => row.measure(m).map(Cell::Number),
        ValueSource::Dynamic(index) => row.dynamic(index).map(Cell::Number),
        ValueSource::Attribute(a) => row.attr(a).map(|v| Cell::Text(v.to_string())),
    };
    value.unwrap_or(Cell::Missing)
}

enum Accumulator {
    Sum(f64),
    Mean { total: f64, count: usize },
    Count(usize),
    NUnique(BTreeSet<String>),
    First(Option<Value>),
}

impl Accumulator {
    fn for_column<T: TableSpec>(column: &AggColumn<T>) -> Self {
        match column.reduction {
            Reduction::Sum => Self::Sum(0.0),
            Reduction::Mean => Self::Mean { total: 0.0, count: 0 },
            Reduction::Count => Self::Count(0),
            Reduction::NUnique => Self::NUnique(BTreeSet::new()),
            Reduction::First => Self::First(None),
        }
    }

    fn push(&mut self, cell: Cell) {
        if matches!(cell, Cell::Missing) {
            return;
        }
        match self {
            Self::Sum(total) => {
                if let Cell::Number(v) = cell {
                    *total += v;
                }
            }
            Self::Mean { total, count } => {
                if let Cell::Number(v) = cell {
                    *total += v;
                    *count += 1;
                }
            }
            Self::Count(n) => *n += 1,
            Self::NUnique(seen) => {
                let key = match cell {
                    Cell::Number(v) => v.to_string(),
                    Cell::Text(t) => t,
                    Cell::Missing => return,
                };
                seen.insert(key);
            }
            Self::First(first) => {
                if first.is_none() {
                    *first = Some(match cell {
                        Cell::Number(v) => Value::Number(v),
                        Cell::Text(t) => Value::Text(t),
                        Cell::Missing => Value::Null,
                    });
                }
            }
        }
    }

    fn finish(self) -> Value {
        match self {
            Self::Sum(total) => Value::Number(total),
            Self::Mean { count: 0, .. } => Value::Null,
            Self::Mean { total, count } => Value::Number(total / count as f64),
            Self::Count(n) => Value::Number(n as f64),
            Self::NUnique(seen) => Value::Number(seen.len() as f64),
            Self::First(first) => first.unwrap_or(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::period::PeriodGranularity;
    use crate::store::{PatientVisits, Staff, StaffAttr, StaffMeasure, VisitAttr, VisitMeasure};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn shift(date: NaiveDate, role: &str, staff: &str, hours: f64) -> Row<Staff> {
        Row::on(date)
            .with_attr(StaffAttr::LocationId, "L1")
            .with_attr(StaffAttr::StaffRole, role)
            .with_attr(StaffAttr::StaffId, staff)
            .with_measure(StaffMeasure::HoursWorked, hours)
            .with_measure(StaffMeasure::LaborCost, hours * 40.0)
    }

    #[test]
    fn groups_by_attribute_with_all_reductions() {
        let rows = vec![
            shift(ymd(2024, 1, 1), "Hygienist", "S1", 8.0),
            shift(ymd(2024, 1, 2), "Hygienist", "S1", 6.0),
            shift(ymd(2024, 1, 2), "Dentist", "S2", 9.0),
        ];
        let refs: Vec<&Row<Staff>> = rows.iter().collect();
        let spec = AggSpec::new()
            .sum(StaffMeasure::HoursWorked)
            .mean(StaffMeasure::LaborCost)
            .nunique(StaffAttr::StaffId)
            .push("Shifts", ValueSource::Attribute(StaffAttr::StaffId), Reduction::Count)
            .push("First_Hours", ValueSource::Measure(StaffMeasure::HoursWorked), Reduction::First);

        let table = aggregate(&refs, &[GroupKey::Attribute(StaffAttr::StaffRole)], &spec);

        assert_eq!(table.labels(), vec!["Dentist", "Hygienist"]);
        assert_eq!(table.column("Hours_Worked"), vec![9.0, 14.0]);
        assert_eq!(table.column("Labor_Cost"), vec![360.0, 280.0]);
        assert_eq!(table.column("Staff_ID"), vec![1.0, 1.0]);
        assert_eq!(table.column("Shifts"), vec![1.0, 2.0]);
        assert_eq!(table.column("First_Hours"), vec![9.0, 8.0]);
    }

    #[test]
    fn missing_keys_are_dropped() {
        let mut rows = vec![shift(ymd(2024, 1, 1), "Hygienist", "S1", 8.0)];
        rows.push(Row::on(ymd(2024, 1, 1)).with_measure(StaffMeasure::HoursWorked, 4.0));
        let refs: Vec<&Row<Staff>> = rows.iter().collect();

        let table = aggregate(
            &refs,
            &[GroupKey::Attribute(StaffAttr::StaffRole)],
            &AggSpec::new().sum(StaffMeasure::HoursWorked),
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.sum_of("Hours_Worked"), 8.0);
    }

    #[test]
    fn weekday_keys_sort_monday_first() {
        // 2024-01-07 is a Sunday, 2024-01-03 a Wednesday, 2024-01-01 a Monday
        let rows = vec![
            shift(ymd(2024, 1, 7), "A", "S1", 1.0),
            shift(ymd(2024, 1, 3), "A", "S1", 2.0),
            shift(ymd(2024, 1, 1), "A", "S1", 3.0),
        ];
        let refs: Vec<&Row<Staff>> = rows.iter().collect();
        let table = aggregate(&refs, &[GroupKey::DayName], &AggSpec::new().sum(StaffMeasure::HoursWorked));

        assert_eq!(table.labels(), vec!["Monday", "Wednesday", "Sunday"]);
    }

    #[test]
    fn quarter_periods_sort_chronologically() {
        let rows = vec![
            shift(ymd(2024, 4, 2), "A", "S1", 1.0),
            shift(ymd(2023, 11, 2), "A", "S1", 2.0),
            shift(ymd(2024, 5, 2), "A", "S1", 3.0),
        ];
        let refs: Vec<&Row<Staff>> = rows.iter().collect();
        let table = aggregate(
            &refs,
            &[GroupKey::Period(PeriodGranularity::Quarter)],
            &AggSpec::new().sum(StaffMeasure::HoursWorked),
        );

        assert_eq!(table.labels(), vec!["2023Q4", "2024Q2"]);
        assert_eq!(table.column("Hours_Worked"), vec![2.0, 4.0]);
    }

    #[test]
    fn collection_rate_from_sums_not_row_rates() {
        let visit = |charged: f64, collected: f64| {
            Row::<PatientVisits>::on(ymd(2024, 1, 1))
                .with_attr(VisitAttr::ProcedureDescription, "Crown")
                .with_measure(VisitMeasure::ChargedAmount, charged)
                .with_measure(VisitMeasure::CollectedAmount, collected)
        };
        let rows = vec![visit(1000.0, 900.0), visit(100.0, 10.0)];
        let refs: Vec<&Row<PatientVisits>> = rows.iter().collect();

        let mut table = aggregate(
            &refs,
            &[GroupKey::Attribute(VisitAttr::ProcedureDescription)],
            &AggSpec::new()
                .sum(VisitMeasure::ChargedAmount)
                .sum(VisitMeasure::CollectedAmount),
        );
        table.derive_ratio("Collection_Rate", "Collected_Amount", "Charged_Amount", 100.0);

        // (900 + 10) / 1100, not the mean of 90% and 10%
        let rate = table.column("Collection_Rate")[0];
        assert!((rate - 82.727_272).abs() < 1e-3);
    }

    #[test]
    fn summarize_without_rows() {
        let spec = AggSpec::<Staff>::new()
            .sum(StaffMeasure::HoursWorked)
            .mean(StaffMeasure::LaborCost);
        assert_eq!(summarize(&[], &spec), vec![Value::Number(0.0), Value::Null]);
    }
}
