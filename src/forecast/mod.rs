//! Point forecasts over monthly series.
//!
//! A forecast projects a [`MonthlySeries`] forward with a [`ForecastStrategy`]
//! (a trailing [`MovingAverage`] unless another is supplied) and attaches a
//! symmetric band of a fixed fraction around each point. Series shorter than
//! the configured minimum history give
//! [`ForecastOutcome::InsufficientData`] instead of a forecast.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use dentalytics::forecast::{forecast, ForecastOutcome, MonthlySeries};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let series = MonthlySeries::from_values(start, &[100.0, 110.0, 120.0, 130.0, 140.0, 150.0]);
//!
//! let ForecastOutcome::Available(result) = forecast(&series, 3, 3) else {
//!     panic!("six months is enough history");
//! };
//! assert_eq!(result.point_estimates, vec![140.0; 3]);
//! ```

pub mod cash_flow;
pub mod series;
pub mod strategy;
pub mod summary;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use cash_flow::{cash_flow_forecast, project_cash_flow, CashFlowPoint, CashFlowProjection};
pub use series::{financial_series, MonthlySeries};
pub use strategy::{ForecastStrategy, MovingAverage};
pub use summary::{revenue_forecast, ForecastSummary, RevenueForecast};

use crate::core::dates::following_month_starts;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Months to project
    #[serde(default = "default_periods")]
    pub periods: usize,

    /// Moving-average window, in months
    #[serde(default = "default_window")]
    pub window: usize,

    /// Fewest observed months a forecast needs
    #[serde(default = "default_min_history")]
    pub min_history: usize,

    /// Band half-width as a fraction of the point estimate
    #[serde(default = "default_band_fraction")]
    pub band_fraction: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            periods: default_periods(),
            window: default_window(),
            min_history: default_min_history(),
            band_fraction: default_band_fraction(),
        }
    }
}

fn default_periods() -> usize {
    3
}
fn default_window() -> usize {
    3
}
fn default_min_history() -> usize {
    6
}
fn default_band_fraction() -> f64 {
    0.10
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub strategy: &'static str,
    /// Consecutive month starts after the last observed month
    pub dates: Vec<NaiveDate>,
    pub point_estimates: Vec<f64>,
    pub lower_band: Vec<f64>,
    pub upper_band: Vec<f64>,
}

impl Forecast {
    pub fn total(&self) -> f64 {
        self.point_estimates.iter().sum()
    }
}

/// A projection, or the reason there is none.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastOutcome<T = Forecast> {
    Available(T),
    InsufficientData { observed: usize, required: usize },
}

impl<T> ForecastOutcome<T> {
    pub fn available(self) -> Option<T> {
        match self {
            Self::Available(value) => Some(value),
            Self::InsufficientData { .. } => None,
        }
    }

    pub fn as_available(&self) -> Option<&T> {
        match self {
            Self::Available(value) => Some(value),
            Self::InsufficientData { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Moving-average forecast with the default band and minimum history.
pub fn forecast(series: &MonthlySeries, periods: usize, window: usize) -> ForecastOutcome {
    let config = ForecastConfig {
        periods,
        window,
        ..ForecastConfig::default()
    };
    forecast_with(series, &MovingAverage::new(window), &config)
}

/// Forecast `series` with any strategy. `config.window` is ignored here; the
/// strategy carries its own parameters.
pub fn forecast_with(
    series: &MonthlySeries,
    strategy: &dyn ForecastStrategy,
    config: &ForecastConfig,
) -> ForecastOutcome {
    let Some((last, _)) = series.last() else {
        return insufficient(0, config);
    };
    if series.len() < config.min_history {
        return insufficient(series.len(), config);
    }

    let point_estimates = strategy.project(&series.values(), config.periods);
    let band = config.band_fraction;
    ForecastOutcome::Available(Forecast {
        strategy: strategy.name(),
        dates: following_month_starts(last, config.periods),
        lower_band: point_estimates.iter().map(|p| p * (1.0 - band)).collect(),
        upper_band: point_estimates.iter().map(|p| p * (1.0 + band)).collect(),
        point_estimates,
    })
}

fn insufficient<T>(observed: usize, config: &ForecastConfig) -> ForecastOutcome<T> {
    log::debug!(
        "Forecast skipped: {observed} months observed, {} required",
        config.min_history
    );
    ForecastOutcome::InsufficientData {
        observed,
        required: config.min_history,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(values: &[f64]) -> MonthlySeries {
        MonthlySeries::from_values(ymd(2024, 1, 1), values)
    }

    #[test]
    fn six_months_forecast_flat_with_band() {
        let result = forecast(&series(&[100.0, 110.0, 120.0, 130.0, 140.0, 150.0]), 3, 3)
            .available()
            .unwrap();

        assert_eq!(result.point_estimates, vec![140.0; 3]);
        for (lower, upper) in result.lower_band.iter().zip(&result.upper_band) {
            assert!((lower - 126.0).abs() < 1e-9);
            assert!((upper - 154.0).abs() < 1e-9);
        }
        assert_eq!(
            result.dates,
            vec![ymd(2024, 7, 1), ymd(2024, 8, 1), ymd(2024, 9, 1)]
        );
    }

    #[test]
    fn five_months_is_insufficient() {
        let outcome = forecast(&series(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3, 3);
        assert_eq!(
            outcome,
            ForecastOutcome::InsufficientData {
                observed: 5,
                required: 6
            }
        );
    }

    #[test]
    fn empty_series_is_insufficient() {
        assert!(!forecast(&MonthlySeries::default(), 3, 3).is_available());
    }

    struct LastValue;

    impl ForecastStrategy for LastValue {
        fn name(&self) -> &'static str {
            "last_value"
        }

        fn project(&self, history: &[f64], periods: usize) -> Vec<f64> {
            vec![history.last().copied().unwrap_or(0.0); periods]
        }
    }

    #[test]
    fn custom_strategy_plugs_in() {
        let config = ForecastConfig {
            periods: 2,
            ..ForecastConfig::default()
        };
        let result = forecast_with(&series(&[1.0, 2.0, 3.0, 4.0, 5.0, 9.0]), &LastValue, &config)
            .available()
            .unwrap();
        assert_eq!(result.strategy, "last_value");
        assert_eq!(result.point_estimates, vec![9.0, 9.0]);
    }
}
