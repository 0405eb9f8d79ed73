use crate::core::period::PeriodGranularity;
use crate::store::{Column, TableSpec};

/// What to group rows by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey<T: TableSpec> {
    Attribute(T::Attribute),
    /// The row's primary date
    Date,
    Period(PeriodGranularity),
    /// Weekday name, ordered Monday first
    DayName,
    MonthName,
    /// `YYYY-MM`
    MonthYear,
}

impl<T: TableSpec> GroupKey<T> {
    /// Time key for trend views at `granularity`: daily views key on the date itself.
    pub fn time(granularity: PeriodGranularity) -> Self {
        match granularity {
            PeriodGranularity::Day => Self::Date,
            other => Self::Period(other),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::Attribute(column) => column.header().to_string(),
            Self::Date => T::DATE_COLUMN.to_string(),
            Self::Period(_) => "Period".to_string(),
            Self::DayName => "Day_Name".to_string(),
            Self::MonthName => "Month_Name".to_string(),
            Self::MonthYear => "Month_Year".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Sum,
    Mean,
    /// Non-missing values
    Count,
    /// Distinct non-missing values
    NUnique,
    /// First non-missing value in row order
    First,
}

/// Input column of a reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource<T: TableSpec> {
    Measure(T::Measure),
    Attribute(T::Attribute),
    /// Dynamic column by schema index
    Dynamic(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggColumn<T: TableSpec> {
    pub name: String,
    pub source: ValueSource<T>,
    pub reduction: Reduction,
}

/// Ordered list of output columns and how each is reduced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggSpec<T: TableSpec> {
    columns: Vec<AggColumn<T>>,
}

impl<T: TableSpec> Default for AggSpec<T> {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
        }
    }
}

impl<T: TableSpec> AggSpec<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[AggColumn<T>] {
        &self.columns
    }

    pub fn push(mut self, name: impl Into<String>, source: ValueSource<T>, reduction: Reduction) -> Self {
        self.columns.push(AggColumn {
            name: name.into(),
            source,
            reduction,
        });
        self
    }

    /// Reduce a measure into a column named after its header.
    pub fn measure(self, column: T::Measure, reduction: Reduction) -> Self {
        self.push(column.header(), ValueSource::Measure(column), reduction)
    }

    pub fn sum(self, column: T::Measure) -> Self {
        self.measure(column, Reduction::Sum)
    }

    pub fn mean(self, column: T::Measure) -> Self {
        self.measure(column, Reduction::Mean)
    }

    pub fn first(self, column: T::Measure) -> Self {
        self.measure(column, Reduction::First)
    }

    pub fn nunique(self, column: T::Attribute) -> Self {
        self.push(column.header(), ValueSource::Attribute(column), Reduction::NUnique)
    }

    pub fn count(self, column: T::Attribute) -> Self {
        self.push(column.header(), ValueSource::Attribute(column), Reduction::Count)
    }

    pub fn dynamic_sum(self, name: impl Into<String>, index: usize) -> Self {
        self.push(name, ValueSource::Dynamic(index), Reduction::Sum)
    }
}
