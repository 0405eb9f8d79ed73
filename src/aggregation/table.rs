use chrono::NaiveDate;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use super::rate;
use crate::core::period::PeriodKey;

/// One component of a group key. Ordering within a key position is
/// chronological for dates and periods and Monday-first for weekdays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyValue {
    Text(String),
    Date(NaiveDate),
    Period(PeriodKey),
    Weekday { rank: usize, name: &'static str },
    Month { number: u32, name: &'static str },
}

impl KeyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            Self::Period(period) => Some(period.start),
            _ => None,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Period(period) => f.write_str(&period.label),
            Self::Weekday { name, .. } | Self::Month { name, .. } => f.write_str(name),
        }
    }
}

impl Serialize for KeyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A reduced value. `Null` marks a reduction with no input (mean of nothing,
/// first of nothing) and reads as zero in arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Null,
}

impl Value {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Number(value) => *value,
            Self::Text(_) | Self::Null => 0.0,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value:.2}"),
            Self::Text(text) => f.write_str(text),
            Self::Null => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggRow {
    pub keys: Vec<KeyValue>,
    pub values: Vec<Value>,
}

/// Read access to one row by column name, used by derived columns.
#[derive(Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a AggTable,
    row: &'a AggRow,
}

impl RowRef<'_> {
    /// Numeric value of column `name`; unknown columns and nulls read as zero.
    pub fn get(&self, name: &str) -> f64 {
        self.table
            .value_index(name)
            .map(|index| self.row.values[index].as_f64())
            .unwrap_or(0.0)
    }

    pub fn key(&self, position: usize) -> Option<&KeyValue> {
        self.row.keys.get(position)
    }
}

/// Result of a grouped aggregation: key columns followed by value columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggTable {
    key_names: Vec<String>,
    value_names: Vec<String>,
    rows: Vec<AggRow>,
}

impl AggTable {
    pub fn new(key_names: Vec<String>, value_names: Vec<String>, rows: Vec<AggRow>) -> Self {
        Self {
            key_names,
            value_names,
            rows,
        }
    }

    pub fn key_names(&self) -> &[String] {
        &self.key_names
    }

    pub fn value_names(&self) -> &[String] {
        &self.value_names
    }

    pub fn rows(&self) -> &[AggRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn value_index(&self, name: &str) -> Option<usize> {
        self.value_names.iter().position(|n| n == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.value_index(name).is_some()
    }

    /// Column values in row order; nulls read as zero.
    pub fn column(&self, name: &str) -> Vec<f64> {
        match self.value_index(name) {
            Some(index) => self.rows.iter().map(|r| r.values[index].as_f64()).collect(),
            None => Vec::new(),
        }
    }

    /// Numeric column values, skipping nulls.
    pub fn numbers(&self, name: &str) -> Vec<f64> {
        match self.value_index(name) {
            Some(index) => self
                .rows
                .iter()
                .filter_map(|r| r.values[index].as_number())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let index = self.value_index(name)?;
        self.rows.get(row).map(|r| &r.values[index])
    }

    /// Key labels of the first key column, in row order.
    pub fn labels(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|r| r.keys.first().map(ToString::to_string))
            .collect()
    }

    pub fn sum_of(&self, name: &str) -> f64 {
        self.numbers(name).iter().sum()
    }

    /// Mean over rows with a value; zero when there are none.
    pub fn mean_of(&self, name: &str) -> f64 {
        let values = self.numbers(name);
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    }

    pub fn max_of(&self, name: &str) -> Option<f64> {
        self.numbers(name).into_iter().reduce(f64::max)
    }

    /// Append a column computed from each row.
    pub fn derive(&mut self, name: impl Into<String>, f: impl Fn(RowRef<'_>) -> f64) -> &mut Self {
        let values: Vec<f64> = self
            .rows
            .iter()
            .map(|row| f(RowRef { table: self, row }))
            .collect();
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.values.push(Value::Number(value));
        }
        self.value_names.push(name.into());
        self
    }

    /// Append a column of precomputed values, one per row in row order.
    /// Rows past the end of `values` get [`Value::Null`].
    pub fn append_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> &mut Self {
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.values.push(values.next().map_or(Value::Null, Value::Number));
        }
        self.value_names.push(name.into());
        self
    }

    /// Append `numerator / denominator * scale` computed from aggregated
    /// columns; a zero denominator yields 0.
    pub fn derive_ratio(
        &mut self,
        name: impl Into<String>,
        numerator: &str,
        denominator: &str,
        scale: f64,
    ) -> &mut Self {
        let numerator = numerator.to_string();
        let denominator = denominator.to_string();
        self.derive(name, move |row| {
            rate(row.get(&numerator), row.get(&denominator)) * scale
        })
    }

    /// Stable sort on a value column; nulls sort as zero.
    pub fn sort_by(&mut self, name: &str, descending: bool) -> &mut Self {
        if let Some(index) = self.value_index(name) {
            self.rows.sort_by(|a, b| {
                let ordering = a.values[index]
                    .as_f64()
                    .partial_cmp(&b.values[index].as_f64())
                    .unwrap_or(Ordering::Equal);
                if descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }
        self
    }

    /// Keep rows matching `predicate`.
    pub fn retain(&mut self, predicate: impl Fn(RowRef<'_>) -> bool) -> &mut Self {
        let keep: Vec<bool> = self
            .rows
            .iter()
            .map(|row| predicate(RowRef { table: self, row }))
            .collect();
        let mut flags = keep.into_iter();
        self.rows.retain(|_| flags.next().unwrap_or(false));
        self
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Self {
        Self {
            key_names: self.key_names.clone(),
            value_names: self.value_names.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

/// Serialized as a list of records keyed by column name.
impl Serialize for AggTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows.iter().map(|row| RecordView { table: self, row }))
    }
}

struct RecordView<'a> {
    table: &'a AggTable,
    row: &'a AggRow,
}

impl Serialize for RecordView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let width = self.table.key_names.len() + self.table.value_names.len();
        let mut map = serializer.serialize_map(Some(width))?;
        for (name, key) in self.table.key_names.iter().zip(&self.row.keys) {
            map.serialize_entry(name, key)?;
        }
        for (name, value) in self.table.value_names.iter().zip(&self.row.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> AggTable {
        AggTable::new(
            vec!["Procedure".into()],
            vec!["Charged".into(), "Collected".into()],
            vec![
                AggRow {
                    keys: vec![KeyValue::Text("Cleaning".into())],
                    values: vec![Value::Number(200.0), Value::Number(150.0)],
                },
                AggRow {
                    keys: vec![KeyValue::Text("Sealant".into())],
                    values: vec![Value::Number(0.0), Value::Number(0.0)],
                },
            ],
        )
    }

    #[test]
    fn ratio_with_zero_denominator_is_zero_and_row_stays() {
        let mut t = table();
        t.derive_ratio("Collection_Rate", "Collected", "Charged", 100.0);

        assert_eq!(t.len(), 2);
        assert_eq!(t.column("Collection_Rate"), vec![75.0, 0.0]);
    }

    #[test]
    fn sort_and_retain() {
        let mut t = table();
        t.sort_by("Charged", false);
        assert_eq!(t.labels(), vec!["Sealant", "Cleaning"]);

        t.retain(|row| row.get("Charged") > 100.0);
        assert_eq!(t.labels(), vec!["Cleaning"]);
    }

    #[test]
    fn serializes_as_records() {
        let json = serde_json::to_value(table().head(1)).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "Procedure": "Cleaning", "Charged": 200.0, "Collected": 150.0 }])
        );
    }

    #[test]
    fn null_reads_as_zero() {
        assert_eq!(Value::Null.as_f64(), 0.0);
        assert_eq!(Value::Null.as_number(), None);
    }
}
