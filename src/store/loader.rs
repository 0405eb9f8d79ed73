//! CSV ingestion for the source tables.

use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::columns::Column;
use super::kinds::TableSpec;
use super::row::{Row, SourceRecord};
use super::table::{DynamicColumn, Schema, Table};
use crate::core::dates::parse_date;
use crate::errors::DataLoadError;

/// Where a header's cells go in a row.
#[derive(Debug, Clone, Copy)]
enum Slot<T: TableSpec> {
    Date,
    Attribute(T::Attribute),
    Measure(T::Measure),
    SecondaryDate(T::DateField),
    Dynamic(usize),
    Ignored,
}

struct HeaderLayout<T: TableSpec> {
    slots: Vec<Slot<T>>,
    schema: Schema<T>,
}

impl<T: TableSpec> HeaderLayout<T> {
    fn resolve(headers: &StringRecord) -> Self {
        let mut schema = Schema::<T>::empty();
        let mut dynamic = Vec::new();
        let slots = headers
            .iter()
            .map(|header| {
                if header == T::DATE_COLUMN {
                    Slot::Date
                } else if let Some(column) = T::Attribute::from_header(header) {
                    schema.mark_attribute(column);
                    Slot::Attribute(column)
                } else if let Some(column) = T::Measure::from_header(header) {
                    schema.mark_measure(column);
                    Slot::Measure(column)
                } else if let Some(column) = T::DateField::from_header(header) {
                    schema.mark_date_field(column);
                    Slot::SecondaryDate(column)
                } else if let Some(family) = T::classify_dynamic(header) {
                    dynamic.push(DynamicColumn::new(header, family));
                    Slot::Dynamic(dynamic.len() - 1)
                } else {
                    Slot::Ignored
                }
            })
            .collect();

        Self {
            slots,
            schema: schema.with_dynamic(dynamic),
        }
    }

    fn missing_required(headers: &StringRecord) -> Vec<String> {
        T::required_headers()
            .into_iter()
            .filter(|required| !headers.iter().any(|h| h == *required))
            .map(str::to_string)
            .collect()
    }

    fn parse_row(&self, record: &StringRecord, stats: &mut LoadStats) -> Row<T> {
        let date_cell = self
            .slots
            .iter()
            .position(|slot| matches!(slot, Slot::Date))
            .and_then(|index| record.get(index))
            .unwrap_or("");
        let mut row = Row::<T>::new(parse_date(date_cell));
        let mut dynamic = vec![f64::NAN; self.schema.dynamic_columns().len()];

        for (slot, cell) in self.slots.iter().zip(record.iter()) {
            match slot {
                Slot::Date | Slot::Ignored => {}
                Slot::Attribute(column) => {
                    let value = (!cell.is_empty()).then(|| cell.to_string());
                    row.set_attr(*column, value);
                }
                Slot::Measure(column) => row.set_measure(*column, parse_number(cell, stats)),
                Slot::SecondaryDate(column) => {
                    row = row.with_secondary_date(*column, parse_date(cell));
                }
                Slot::Dynamic(index) => dynamic[*index] = parse_number(cell, stats),
            }
        }

        if row.date().is_none() {
            stats.undated += 1;
        }
        row.with_dynamic(dynamic)
    }
}

#[derive(Debug, Default)]
struct LoadStats {
    undated: usize,
    unparsed_numbers: usize,
}

/// Parse a numeric cell; empty or malformed cells become `NaN`.
fn parse_number(cell: &str, stats: &mut LoadStats) -> f64 {
    let cleaned = cell.trim();
    if cleaned.is_empty() {
        return f64::NAN;
    }
    let cleaned = cleaned
        .trim_start_matches('$')
        .trim_end_matches('%')
        .replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            stats.unparsed_numbers += 1;
            f64::NAN
        }
    }
}

/// Load a table from a CSV file.
pub fn load_path<T: TableSpec>(path: &Path) -> Result<Table<T>, DataLoadError> {
    let file = File::open(path).map_err(|e| DataLoadError::io(T::KIND, path, e))?;
    load_reader::<T, _>(file, path)
}

/// Load a table from any CSV byte stream; `source` identifies it in errors.
pub fn load_reader<T: TableSpec, R: Read>(
    reader: R,
    source: &Path,
) -> Result<Table<T>, DataLoadError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let raw_headers = reader
        .headers()
        .map_err(|e| DataLoadError::csv(T::KIND, source, e))?
        .clone();
    let mut headers = raw_headers.clone();
    headers.trim();
    if headers.iter().all(str::is_empty) {
        return Err(DataLoadError::empty(T::KIND, source));
    }

    let missing = HeaderLayout::<T>::missing_required(&headers);
    if !missing.is_empty() {
        return Err(DataLoadError::missing_columns(T::KIND, source, missing));
    }

    let layout = HeaderLayout::<T>::resolve(&headers);
    let mut stats = LoadStats::default();
    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let cells = record.map_err(|e| DataLoadError::csv(T::KIND, source, e))?;
        let mut trimmed = cells.clone();
        trimmed.trim();
        let row = layout.parse_row(&trimmed, &mut stats);
        rows.push(row.with_source(SourceRecord { index, cells }));
    }

    if stats.undated > 0 {
        log::warn!(
            "{} rows of {} have no usable {} and are excluded from date filters",
            stats.undated,
            T::KIND,
            T::DATE_COLUMN
        );
    }
    if stats.unparsed_numbers > 0 {
        log::debug!(
            "{} numeric cells in {} could not be parsed",
            stats.unparsed_numbers,
            T::KIND
        );
    }

    let table = Table::from_rows(source, layout.schema, rows).with_header(raw_headers);
    log::info!(
        "Loaded {} {} rows from {}",
        table.len(),
        T::KIND,
        source.display()
    );
    Ok(table)
}
