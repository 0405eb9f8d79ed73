use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::dates::month_start;

/// Time bucket used for grouping trend views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodGranularity {
    Day,
    #[default]
    Month,
    Quarter,
    Year,
    /// Whole selected range; trend views fall back to monthly buckets
    AllTime,
}

impl PeriodGranularity {
    /// Bucket a date into this granularity's period.
    pub fn period_of(self, date: NaiveDate) -> PeriodKey {
        match self {
            Self::Day => PeriodKey {
                start: date,
                label: date.format("%Y-%m-%d").to_string(),
            },
            Self::Month | Self::AllTime => PeriodKey {
                start: month_start(date),
                label: date.format("%Y-%m").to_string(),
            },
            Self::Quarter => {
                let quarter = date.month0() / 3;
                let start = NaiveDate::from_ymd_opt(date.year(), quarter * 3 + 1, 1).unwrap_or(date);
                PeriodKey {
                    start,
                    label: format!("{}Q{}", date.year(), quarter + 1),
                }
            }
            Self::Year => PeriodKey {
                start: NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
                label: date.year().to_string(),
            },
        }
    }

    /// Human label used in result metadata (`"Monthly"`, `"Quarterly"`, ...).
    pub fn title(self) -> &'static str {
        match self {
            Self::Day => "Daily",
            Self::Month => "Monthly",
            Self::Quarter => "Quarterly",
            Self::Year => "Annual",
            Self::AllTime => "All Time",
        }
    }
}

impl fmt::Display for PeriodGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Day => "day",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
            Self::AllTime => "all_time",
        };
        write!(f, "{name}")
    }
}

impl FromStr for PeriodGranularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "day" | "daily" => Ok(Self::Day),
            "month" | "monthly" => Ok(Self::Month),
            "quarter" | "quarterly" => Ok(Self::Quarter),
            "year" | "annual" | "yearly" => Ok(Self::Year),
            "all" | "all_time" | "alltime" => Ok(Self::AllTime),
            other => Err(format!("unknown period granularity `{other}`")),
        }
    }
}

/// One period bucket. Ordered by its start date, so keys sort chronologically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PeriodKey {
    pub start: NaiveDate,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn quarter_buckets() {
        let key = PeriodGranularity::Quarter.period_of(ymd(2024, 8, 17));
        assert_eq!(key.label, "2024Q3");
        assert_eq!(key.start, ymd(2024, 7, 1));
    }

    #[test]
    fn all_time_groups_monthly() {
        let key = PeriodGranularity::AllTime.period_of(ymd(2024, 8, 17));
        assert_eq!(key.label, "2024-08");
        assert_eq!(key.start, ymd(2024, 8, 1));
    }

    #[test]
    fn keys_sort_chronologically() {
        let a = PeriodGranularity::Year.period_of(ymd(2023, 12, 31));
        let b = PeriodGranularity::Year.period_of(ymd(2024, 1, 1));
        assert!(a < b);
    }

    #[test]
    fn parses_labels() {
        assert_eq!("Quarter".parse::<PeriodGranularity>(), Ok(PeriodGranularity::Quarter));
        assert_eq!("All Time".parse::<PeriodGranularity>(), Ok(PeriodGranularity::AllTime));
        assert!("fortnight".parse::<PeriodGranularity>().is_err());
    }
}
