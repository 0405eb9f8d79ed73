use chrono::NaiveDate;
use csv::StringRecord;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use super::columns::Column;
use super::kinds::{DynamicFamily, PatientVisits, TableSpec, VisitMeasure};
use super::row::Row;
use crate::errors::DataLoadError;

/// A column outside the fixed layout, discovered from the header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DynamicColumn {
    pub header: String,
    pub family: DynamicFamily,
    /// Display name with the family prefix removed (`Revenue_Oral_Surgery` -> `Oral Surgery`)
    pub label: String,
}

impl DynamicColumn {
    pub fn new(header: impl Into<String>, family: DynamicFamily) -> Self {
        let header = header.into();
        let stripped = match family {
            DynamicFamily::ServiceLine => header.strip_prefix("Revenue_"),
            DynamicFamily::Payor => header.strip_prefix("Payor_"),
            DynamicFamily::Expense => None,
        };
        let label = stripped.unwrap_or(&header).replace('_', " ");
        Self {
            header,
            family,
            label,
        }
    }
}

/// Which optional columns a loaded table actually carries.
#[derive(Debug, Clone)]
pub struct Schema<T: TableSpec> {
    measures: Vec<bool>,
    attributes: Vec<bool>,
    dates: Vec<bool>,
    dynamic: Vec<DynamicColumn>,
    _table: PhantomData<T>,
}

impl<T: TableSpec> Schema<T> {
    /// Schema with nothing present yet.
    pub fn empty() -> Self {
        Self {
            measures: vec![false; T::Measure::count()],
            attributes: vec![false; T::Attribute::count()],
            dates: vec![false; T::DateField::count()],
            dynamic: Vec::new(),
            _table: PhantomData,
        }
    }

    /// Schema declaring every fixed column present.
    pub fn complete() -> Self {
        Self {
            measures: vec![true; T::Measure::count()],
            attributes: vec![true; T::Attribute::count()],
            dates: vec![true; T::DateField::count()],
            dynamic: Vec::new(),
            _table: PhantomData,
        }
    }

    pub fn with_dynamic(mut self, columns: Vec<DynamicColumn>) -> Self {
        self.dynamic = columns;
        self
    }

    /// Declare `columns` present.
    pub fn with_measures(mut self, columns: &[T::Measure]) -> Self {
        for column in columns {
            self.mark_measure(*column);
        }
        self
    }

    pub fn has_measure(&self, column: T::Measure) -> bool {
        self.measures[column.index()]
    }

    pub fn has_attribute(&self, column: T::Attribute) -> bool {
        self.attributes[column.index()]
    }

    pub fn has_date_field(&self, column: T::DateField) -> bool {
        self.dates[column.index()]
    }

    pub fn has_all_measures(&self, columns: &[T::Measure]) -> bool {
        columns.iter().all(|c| self.has_measure(*c))
    }

    pub fn present_measures(&self) -> impl Iterator<Item = T::Measure> + '_ {
        T::Measure::ALL
            .iter()
            .copied()
            .filter(|c| self.has_measure(*c))
    }

    pub fn present_attributes(&self) -> impl Iterator<Item = T::Attribute> + '_ {
        T::Attribute::ALL
            .iter()
            .copied()
            .filter(|c| self.has_attribute(*c))
    }

    pub fn present_date_fields(&self) -> impl Iterator<Item = T::DateField> + '_ {
        T::DateField::ALL
            .iter()
            .copied()
            .filter(|c| self.has_date_field(*c))
    }

    pub fn dynamic_columns(&self) -> &[DynamicColumn] {
        &self.dynamic
    }

    /// Dynamic columns of one family, with their slot index.
    pub fn family(&self, family: DynamicFamily) -> impl Iterator<Item = (usize, &DynamicColumn)> {
        self.dynamic
            .iter()
            .enumerate()
            .filter(move |(_, column)| column.family == family)
    }

    pub(crate) fn mark_measure(&mut self, column: T::Measure) {
        self.measures[column.index()] = true;
    }

    pub(crate) fn mark_attribute(&mut self, column: T::Attribute) {
        self.attributes[column.index()] = true;
    }

    pub(crate) fn mark_date_field(&mut self, column: T::DateField) {
        self.dates[column.index()] = true;
    }
}

/// A loaded, normalized source table.
#[derive(Debug, Clone)]
pub struct Table<T: TableSpec> {
    source: PathBuf,
    schema: Schema<T>,
    rows: Vec<Row<T>>,
    header: Option<StringRecord>,
}

impl<T: TableSpec> Table<T> {
    /// Build a table and run the table's normalization pass over it.
    pub fn from_rows(source: impl Into<PathBuf>, schema: Schema<T>, rows: Vec<Row<T>>) -> Self {
        let mut table = Self {
            source: source.into(),
            schema,
            rows,
            header: None,
        };
        T::normalize(&mut table);
        table
    }

    pub(crate) fn with_header(mut self, header: StringRecord) -> Self {
        self.header = Some(header);
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn schema(&self) -> &Schema<T> {
        &self.schema
    }

    pub fn rows(&self) -> &[Row<T>] {
        &self.rows
    }

    /// Header row exactly as read; `None` for tables built in memory.
    pub fn header(&self) -> Option<&StringRecord> {
        self.header.as_ref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows kept in the table whose primary date did not parse.
    pub fn undated_rows(&self) -> usize {
        self.rows.iter().filter(|row| row.date().is_none()).count()
    }

    /// Earliest and latest parsed primary date.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.rows.iter().filter_map(Row::date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut Schema<T>, &mut Vec<Row<T>>) {
        (&mut self.schema, &mut self.rows)
    }
}

impl Table<PatientVisits> {
    /// `Collected_Amount = Insurance_Covered_Amount + Out_of_Pocket - Discount_Applied`.
    /// Missing components count as zero so every visit carries a collected amount.
    pub(crate) fn derive_collected_amount(&mut self) {
        for row in &mut self.rows {
            let collected = row.measure_or_zero(VisitMeasure::InsuranceCoveredAmount)
                + row.measure_or_zero(VisitMeasure::OutOfPocket)
                - row.measure_or_zero(VisitMeasure::DiscountApplied);
            row.set_measure(VisitMeasure::CollectedAmount, collected);
        }
        self.schema.mark_measure(VisitMeasure::CollectedAmount);
    }
}

/// A table as held by the store: loaded, or the reason it is not.
#[derive(Debug)]
pub enum TableSlot<T: TableSpec> {
    Loaded(Table<T>),
    Unavailable(DataLoadError),
}

impl<T: TableSpec> TableSlot<T> {
    pub fn table(&self) -> Option<&Table<T>> {
        match self {
            Self::Loaded(table) => Some(table),
            Self::Unavailable(_) => None,
        }
    }

    pub fn error(&self) -> Option<&DataLoadError> {
        match self {
            Self::Loaded(_) => None,
            Self::Unavailable(err) => Some(err),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

impl<T: TableSpec> From<Result<Table<T>, DataLoadError>> for TableSlot<T> {
    fn from(result: Result<Table<T>, DataLoadError>) -> Self {
        match result {
            Ok(table) => Self::Loaded(table),
            Err(err) => Self::Unavailable(err),
        }
    }
}

impl<T: TableSpec> From<Table<T>> for TableSlot<T> {
    fn from(table: Table<T>) -> Self {
        Self::Loaded(table)
    }
}
