//! Two-stage date parsing and calendar helpers.
//!
//! Every date cell goes through [`parse_date`]: first the strict ISO format the
//! source exports use, then a fixed list of lenient formats. The result is a
//! tagged [`ParsedDate`]; a failure keeps its reason so the row can be audited
//! later, and is never coerced to a default date.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, Weekday};
use serde::Serialize;

/// Format every source is expected to use.
pub const PRIMARY_FORMAT: &str = "%Y-%m-%d";

const LENIENT_DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%m-%d-%Y",
    "%Y%m%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

const LENIENT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

/// Canonical Monday-first weekday sequence used for every day-name ordering.
pub const WEEKDAY_ORDER: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Why a date cell could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DateParseFailure {
    /// The cell was empty or whitespace
    Empty,
    /// Neither the strict nor any lenient format matched
    Unrecognized(String),
}

impl std::fmt::Display for DateParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty date"),
            Self::Unrecognized(raw) => write!(f, "unrecognized date `{raw}`"),
        }
    }
}

/// Outcome of parsing one date cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ParsedDate {
    Parsed(NaiveDate),
    Null(DateParseFailure),
}

impl ParsedDate {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Parsed(date) => Some(*date),
            Self::Null(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&DateParseFailure> {
        match self {
            Self::Parsed(_) => None,
            Self::Null(reason) => Some(reason),
        }
    }
}

impl From<NaiveDate> for ParsedDate {
    fn from(date: NaiveDate) -> Self {
        Self::Parsed(date)
    }
}

/// Parse a date cell: strict format first, lenient formats second.
pub fn parse_date(raw: &str) -> ParsedDate {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ParsedDate::Null(DateParseFailure::Empty);
    }

    match parse_strict(trimmed).or_else(|| parse_lenient(trimmed)) {
        Some(date) => ParsedDate::Parsed(date),
        None => ParsedDate::Null(DateParseFailure::Unrecognized(trimmed.to_string())),
    }
}

fn parse_strict(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, PRIMARY_FORMAT).ok()
}

fn parse_lenient(raw: &str) -> Option<NaiveDate> {
    LENIENT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            LENIENT_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Calendar columns derived once at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarFields {
    pub day_name: &'static str,
    pub month_name: &'static str,
    /// `YYYY-MM` period key
    pub month_year: String,
}

impl CalendarFields {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day_name: day_name(date.weekday()),
            month_name: MONTH_NAMES[date.month0() as usize],
            month_year: date.format("%Y-%m").to_string(),
        }
    }
}

pub fn day_name(weekday: Weekday) -> &'static str {
    WEEKDAY_ORDER[weekday.num_days_from_monday() as usize]
}

/// Position of a day name in the Monday-first week; case-insensitive.
pub fn weekday_rank(name: &str) -> Option<usize> {
    WEEKDAY_ORDER
        .iter()
        .position(|day| day.eq_ignore_ascii_case(name.trim()))
}

/// Parse a full or abbreviated day name.
pub fn parse_weekday(name: &str) -> Option<Weekday> {
    name.trim().parse::<Weekday>().ok()
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month following `date`'s month.
pub fn next_month_start(date: NaiveDate) -> NaiveDate {
    let start = month_start(date);
    start.checked_add_months(Months::new(1)).unwrap_or(start)
}

/// Consecutive month starts following the month of `last`.
pub fn following_month_starts(last: NaiveDate, count: usize) -> Vec<NaiveDate> {
    std::iter::successors(Some(next_month_start(last)), |d| Some(next_month_start(*d)))
        .take(count)
        .collect()
}

/// Parse a `YYYY-MM` period key into the month's first day.
pub fn parse_month_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", key.trim()), PRIMARY_FORMAT).ok()
}
