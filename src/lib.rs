// Export modules for library usage
pub mod aggregation;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod errors;
pub mod filter;
pub mod forecast;
pub mod io;
pub mod metrics;
pub mod scenario;
pub mod store;

// Re-export commonly used types
pub use crate::aggregation::{
    aggregate, percentage, rate, AggSpec, AggTable, GroupKey, Reduction, Value,
};

pub use crate::core::dates::{parse_date, ParsedDate};
pub use crate::core::period::PeriodGranularity;

pub use crate::errors::{DataLoadError, Error, Result};

pub use crate::filter::{
    DateRange, FilterContext, JointView, LocationFilter, Outcome, SamplingPolicy,
};

pub use crate::forecast::{
    cash_flow_forecast, forecast, forecast_with, revenue_forecast, Forecast, ForecastConfig,
    ForecastOutcome, ForecastStrategy, MonthlySeries, MovingAverage,
};

pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};

pub use crate::scenario::{
    evaluate, Baseline, ScenarioComparison, ScenarioDeltas, ScenarioLimits, ScenarioResult,
};

pub use crate::store::{DataSources, RecordStore, StoreCache, TableKind};
