use serde::Serialize;

use super::series::{financial_series, MonthlySeries};
use super::strategy::MovingAverage;
use super::{forecast_with, Forecast, ForecastConfig, ForecastOutcome};
use crate::aggregation::{percentage, Reduction};
use crate::filter::{JointView, Outcome};
use crate::store::FinancialMeasure;

/// How a forecast compares with recent history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub next_period: f64,
    pub last_observed: f64,
    /// Next period against the last observed month, percent
    pub change_vs_last: f64,
    pub forecast_total: f64,
    /// Σ of the last three observed months
    pub recent_total: f64,
    /// Forecast total against the recent total, percent
    pub change_vs_recent: f64,
}

const RECENT_MONTHS: usize = 3;

impl ForecastSummary {
    pub fn new(series: &MonthlySeries, forecast: &Forecast) -> Option<Self> {
        let (_, last_observed) = series.last()?;
        let next_period = *forecast.point_estimates.first()?;
        let values = series.values();
        let recent_total: f64 = values.iter().rev().take(RECENT_MONTHS).sum();
        let forecast_total = forecast.total();
        Some(Self {
            next_period,
            last_observed,
            change_vs_last: percentage(next_period - last_observed, last_observed),
            forecast_total,
            recent_total,
            change_vs_recent: percentage(forecast_total - recent_total, recent_total),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueForecast {
    pub history: MonthlySeries,
    pub forecast: ForecastOutcome,
    pub summary: Option<ForecastSummary>,
}

/// Moving-average forecast of monthly Σ revenue over the filtered view.
pub fn revenue_forecast(view: &JointView<'_>, config: &ForecastConfig) -> Outcome<RevenueForecast> {
    financial_series(view, FinancialMeasure::TotalRevenue, Reduction::Sum).map(|history| {
        let forecast = forecast_with(&history, &MovingAverage::new(config.window), config);
        let summary = forecast
            .as_available()
            .and_then(|fc| ForecastSummary::new(&history, fc));
        RevenueForecast {
            history,
            forecast,
            summary,
        }
    })
}
