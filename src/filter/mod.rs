//! Filter context and filtered views over the record store.
//!
//! A [`FilterContext`] selects rows; a [`JointView`] applies one context to
//! all five tables at once, keeping the tables consistent with each other
//! (shared location set, shared sampled dates). Metric functions take a
//! `JointView` and return an [`Outcome`].

pub mod context;
pub mod predicates;
pub mod sampling;
pub mod view;

use serde::Serialize;

pub use context::{DateRange, FilterContext, LocationFilter};
pub use sampling::{sample_dates, SampledDates, SamplingPolicy};
pub use view::{JointView, TableView};

use crate::aggregation::AggTable;
use crate::errors::DataLoadError;
use crate::store::TableKind;

/// Result of a metric over a filtered view.
///
/// `Empty` means the source loaded but nothing matched the filter (or the
/// source lacks the optional columns the metric reads). `Unavailable` means
/// the source failed to load.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Outcome<R> {
    Ready(R),
    Empty,
    Unavailable { table: TableKind, reason: String },
}

impl<R> Outcome<R> {
    pub fn unavailable(err: &DataLoadError) -> Self {
        Self::Unavailable {
            table: err.table(),
            reason: err.to_string(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    pub fn ready(self) -> Option<R> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_ready(&self) -> Option<&R> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(R) -> U) -> Outcome<U> {
        self.and_then(|value| Outcome::Ready(f(value)))
    }

    pub fn and_then<U>(self, f: impl FnOnce(R) -> Outcome<U>) -> Outcome<U> {
        match self {
            Self::Ready(value) => f(value),
            Self::Empty => Outcome::Empty,
            Self::Unavailable { table, reason } => Outcome::Unavailable { table, reason },
        }
    }
}

impl Outcome<AggTable> {
    /// `Ready` unless the table has no rows.
    pub fn of_table(table: AggTable) -> Self {
        if table.is_empty() {
            Self::Empty
        } else {
            Self::Ready(table)
        }
    }
}
