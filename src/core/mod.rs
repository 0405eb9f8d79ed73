//! Calendar primitives shared by the store, filters and aggregations.

pub mod dates;
pub mod period;

pub use dates::{
    parse_date, weekday_rank, CalendarFields, DateParseFailure, ParsedDate, WEEKDAY_ORDER,
};
pub use period::{PeriodGranularity, PeriodKey};
