use chrono::{NaiveDate, Weekday};
use serde::Serialize;
use std::collections::BTreeSet;

use super::predicates;
use crate::core::period::PeriodGranularity;
use crate::store::{LocationDirectory, Row, Table, TableSpec};

/// Inclusive date bounds. `start <= end` is the caller's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whole days between the bounds (`end - start`).
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl From<(NaiveDate, NaiveDate)> for DateRange {
    fn from((start, end): (NaiveDate, NaiveDate)) -> Self {
        Self::new(start, end)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationFilter {
    #[default]
    All,
    /// A location id or display name
    Selected(String),
}

impl LocationFilter {
    pub fn selected(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Selected(location) => Some(location),
        }
    }

    /// Location ids the selection stands for; empty when nothing is selected
    /// or the directory does not know the location.
    pub fn resolve(&self, directory: &LocationDirectory) -> BTreeSet<String> {
        match self {
            Self::All => BTreeSet::new(),
            Self::Selected(location) => directory.resolve(location),
        }
    }
}

/// The filter state of one interaction.
///
/// A `FilterContext` is built once per request and passed by reference to every
/// view and metric. Unset fields impose no constraint.
///
/// ```rust
/// use chrono::{NaiveDate, Weekday};
/// use dentalytics::filter::FilterContext;
/// use dentalytics::core::PeriodGranularity;
///
/// let ctx = FilterContext::new()
///     .with_date_range(
///         NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///         NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
///     )
///     .with_location("Downtown")
///     .with_day_of_week(Weekday::Mon)
///     .with_granularity(PeriodGranularity::Quarter);
///
/// assert_eq!(ctx.location().selected(), Some("Downtown"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FilterContext {
    date_range: Option<DateRange>,
    location: LocationFilter,
    day_of_week: Option<Weekday>,
    staff_role: Option<String>,
    service_line: Option<String>,
    provider: Option<String>,
    insurance_provider: Option<String>,
    granularity: PeriodGranularity,
}

impl FilterContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some(DateRange::new(start, end));
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = LocationFilter::Selected(location.into());
        self
    }

    pub fn with_day_of_week(mut self, day: Weekday) -> Self {
        self.day_of_week = Some(day);
        self
    }

    pub fn with_staff_role(mut self, role: impl Into<String>) -> Self {
        self.staff_role = Some(role.into());
        self
    }

    pub fn with_service_line(mut self, service_line: impl Into<String>) -> Self {
        self.service_line = Some(service_line.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_insurance_provider(mut self, insurer: impl Into<String>) -> Self {
        self.insurance_provider = Some(insurer.into());
        self
    }

    pub fn with_granularity(mut self, granularity: PeriodGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }

    pub fn location(&self) -> &LocationFilter {
        &self.location
    }

    pub fn day_of_week(&self) -> Option<Weekday> {
        self.day_of_week
    }

    pub fn staff_role(&self) -> Option<&str> {
        self.staff_role.as_deref()
    }

    /// Service line selecting which service-line revenue columns are reported.
    /// Matched against the cleaned label (`Oral Surgery`) or the raw header.
    pub fn service_line(&self) -> Option<&str> {
        self.service_line.as_deref()
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn insurance_provider(&self) -> Option<&str> {
        self.insurance_provider.as_deref()
    }

    pub fn granularity(&self) -> PeriodGranularity {
        self.granularity
    }

    /// Rows of `table` satisfying every set field, in table order.
    ///
    /// The result borrows the table's rows unmodified. An empty result is a
    /// valid answer and distinct from an unavailable table.
    pub fn apply<'a, T: TableSpec>(
        &self,
        table: &'a Table<T>,
        directory: &LocationDirectory,
    ) -> Vec<&'a Row<T>> {
        let ids = self.location.resolve(directory);
        table
            .rows()
            .iter()
            .filter(|row| self.matches(row, &ids))
            .collect()
    }

    /// Whether one row passes every set field. `location_ids` is the resolved
    /// location selection (see [`LocationFilter::resolve`]).
    pub fn matches<T: TableSpec>(&self, row: &Row<T>, location_ids: &BTreeSet<String>) -> bool {
        predicates::within_dates(row, self.date_range.as_ref())
            && predicates::at_location(row, self.location.selected(), location_ids)
            && (!T::WEEKDAY_FILTERED || predicates::on_weekday(row, self.day_of_week))
            && predicates::attribute_equals(row, T::STAFF_ROLE, self.staff_role())
            && predicates::attribute_equals(row, T::PROVIDER, self.provider())
            && predicates::attribute_equals(row, T::INSURANCE_PROVIDER, self.insurance_provider())
    }
}
