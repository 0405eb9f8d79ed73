use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Down-sampling of long daily time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingPolicy {
    /// Ranges longer than this many days are sampled
    #[serde(default = "default_max_days")]
    pub max_days: i64,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            max_days: default_max_days(),
        }
    }
}

fn default_max_days() -> i64 {
    180
}

impl SamplingPolicy {
    pub fn applies(&self, days: i64) -> bool {
        self.max_days > 0 && days > self.max_days
    }

    /// `max(1, days / max_days)`
    pub fn rate(&self, days: i64) -> usize {
        if self.max_days <= 0 {
            return 1;
        }
        usize::try_from(days / self.max_days).unwrap_or(0).max(1)
    }
}

/// The dates a sampled view keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampledDates {
    pub rate: usize,
    pub dates: BTreeSet<NaiveDate>,
}

/// Every `rate`-th distinct date in ascending order, starting with the first.
pub fn sample_dates(dates: impl IntoIterator<Item = NaiveDate>, rate: usize) -> BTreeSet<NaiveDate> {
    let distinct: BTreeSet<NaiveDate> = dates.into_iter().collect();
    distinct.into_iter().step_by(rate.max(1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rate_for_long_ranges() {
        let policy = SamplingPolicy::default();
        assert_eq!(policy.rate(400), 2);
        assert_eq!(policy.rate(181), 1);
        assert_eq!(policy.rate(30), 1);
        assert!(policy.applies(181));
        assert!(!policy.applies(180));
    }

    #[test]
    fn keeps_every_nth_distinct_date() {
        let start = ymd(2024, 1, 1);
        let dates = (0..6u64)
            .flat_map(|d| [start + Days::new(d), start + Days::new(d)])
            .rev();

        let sampled = sample_dates(dates, 2);
        assert_eq!(
            sampled.into_iter().collect::<Vec<_>>(),
            vec![ymd(2024, 1, 1), ymd(2024, 1, 3), ymd(2024, 1, 5)]
        );
    }
}
