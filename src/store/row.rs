use chrono::NaiveDate;
use csv::StringRecord;
use std::marker::PhantomData;

use super::columns::Column;
use super::kinds::TableSpec;
use crate::core::dates::{CalendarFields, DateParseFailure, ParsedDate};

/// A record as it appeared in the source file, cell text untrimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    /// Position below the header row, from zero
    pub index: usize,
    pub cells: StringRecord,
}

/// One normalized source record.
///
/// Fixed columns are stored in slots addressed by the table's column enums.
/// Numeric cells that were empty or unparseable hold `NaN` and read back as
/// `None`; reductions skip them.
#[derive(Debug, Clone)]
pub struct Row<T: TableSpec> {
    date: ParsedDate,
    calendar: Option<CalendarFields>,
    attributes: Vec<Option<String>>,
    measures: Vec<f64>,
    secondary_dates: Vec<ParsedDate>,
    dynamic: Vec<f64>,
    sources: Vec<SourceRecord>,
    _table: PhantomData<T>,
}

impl<T: TableSpec> Row<T> {
    /// Empty row for `date`, with calendar fields derived when the date parsed.
    pub fn new(date: ParsedDate) -> Self {
        let calendar = date.date().map(CalendarFields::from_date);
        Self {
            date,
            calendar,
            attributes: vec![None; T::Attribute::count()],
            measures: vec![f64::NAN; T::Measure::count()],
            secondary_dates: vec![ParsedDate::Null(DateParseFailure::Empty); T::DateField::count()],
            dynamic: Vec::new(),
            sources: Vec::new(),
            _table: PhantomData,
        }
    }

    /// Shorthand for building rows in memory.
    pub fn on(date: NaiveDate) -> Self {
        Self::new(ParsedDate::Parsed(date))
    }

    pub fn with_attr(mut self, column: T::Attribute, value: impl Into<String>) -> Self {
        self.set_attr(column, Some(value.into()));
        self
    }

    pub fn with_measure(mut self, column: T::Measure, value: f64) -> Self {
        self.set_measure(column, value);
        self
    }

    pub fn with_secondary_date(mut self, column: T::DateField, date: ParsedDate) -> Self {
        self.secondary_dates[column.index()] = date;
        self
    }

    pub fn with_dynamic(mut self, values: Vec<f64>) -> Self {
        self.dynamic = values;
        self
    }

    pub(crate) fn with_source(mut self, record: SourceRecord) -> Self {
        self.sources.push(record);
        self
    }

    pub fn parsed_date(&self) -> &ParsedDate {
        &self.date
    }

    /// Primary date, `None` when it failed to parse.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date.date()
    }

    pub fn calendar(&self) -> Option<&CalendarFields> {
        self.calendar.as_ref()
    }

    pub fn attr(&self, column: T::Attribute) -> Option<&str> {
        self.attributes[column.index()].as_deref()
    }

    pub fn measure(&self, column: T::Measure) -> Option<f64> {
        let value = self.measures[column.index()];
        (!value.is_nan()).then_some(value)
    }

    /// Measure value with a missing cell read as zero.
    pub fn measure_or_zero(&self, column: T::Measure) -> f64 {
        self.measure(column).unwrap_or(0.0)
    }

    pub fn secondary_date(&self, column: T::DateField) -> Option<NaiveDate> {
        self.secondary_dates[column.index()].date()
    }

    /// Value of the dynamic column at `index` in the table's schema.
    pub fn dynamic(&self, index: usize) -> Option<f64> {
        self.dynamic
            .get(index)
            .copied()
            .filter(|value| !value.is_nan())
    }

    pub fn dynamic_values(&self) -> &[f64] {
        &self.dynamic
    }

    /// Source records this row was read or folded from; empty for rows built
    /// in memory.
    pub fn sources(&self) -> &[SourceRecord] {
        &self.sources
    }

    pub fn location_id(&self) -> Option<&str> {
        self.attr(T::LOCATION_ID)
    }

    pub fn location_name(&self) -> Option<&str> {
        T::LOCATION_NAME.and_then(|column| self.attr(column))
    }

    pub(crate) fn set_attr(&mut self, column: T::Attribute, value: Option<String>) {
        self.attributes[column.index()] = value;
    }

    pub(crate) fn set_measure(&mut self, column: T::Measure, value: f64) {
        self.measures[column.index()] = value;
    }

    pub(crate) fn set_date(&mut self, date: ParsedDate) {
        self.calendar = date.date().map(CalendarFields::from_date);
        self.date = date;
    }

    pub(crate) fn dynamic_mut(&mut self) -> &mut Vec<f64> {
        &mut self.dynamic
    }

    pub(crate) fn sources_mut(&mut self) -> &mut Vec<SourceRecord> {
        &mut self.sources
    }
}
