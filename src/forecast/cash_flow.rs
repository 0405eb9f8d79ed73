use chrono::NaiveDate;
use serde::Serialize;

use super::series::{financial_series, MonthlySeries};
use super::strategy::MovingAverage;
use super::{forecast_with, ForecastConfig, ForecastOutcome};
use crate::aggregation::Reduction;
use crate::filter::{JointView, Outcome};
use crate::store::FinancialMeasure;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowPoint {
    pub date: NaiveDate,
    pub revenue: f64,
    pub collection_rate: f64,
    pub expenses: f64,
    /// `revenue × collection_rate / 100`
    pub collections: f64,
    /// `collections − expenses`
    pub cash_flow: f64,
}

impl CashFlowPoint {
    fn new(date: NaiveDate, revenue: f64, collection_rate: f64, expenses: f64) -> Self {
        let collections = revenue * collection_rate / 100.0;
        Self {
            date,
            revenue,
            collection_rate,
            expenses,
            collections,
            cash_flow: collections - expenses,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowProjection {
    /// Observed months present in all three series
    pub history: Vec<CashFlowPoint>,
    pub projected: Vec<CashFlowPoint>,
}

/// Project revenue, collection rate and expenses independently, then derive
/// collections and cash flow from the projected components.
pub fn project_cash_flow(
    revenue: &MonthlySeries,
    collection_rate: &MonthlySeries,
    expenses: &MonthlySeries,
    config: &ForecastConfig,
) -> ForecastOutcome<CashFlowProjection> {
    let strategy = MovingAverage::new(config.window);
    let projections = (
        forecast_with(revenue, &strategy, config),
        forecast_with(collection_rate, &strategy, config),
        forecast_with(expenses, &strategy, config),
    );
    let (revenue_fc, rate_fc, expense_fc) = match projections {
        (
            ForecastOutcome::Available(r),
            ForecastOutcome::Available(c),
            ForecastOutcome::Available(e),
        ) => (r, c, e),
        _ => {
            let observed = revenue.len().min(collection_rate.len()).min(expenses.len());
            return ForecastOutcome::InsufficientData {
                observed,
                required: config.min_history,
            };
        }
    };

    let history = revenue
        .points()
        .iter()
        .filter_map(|(date, rev)| {
            let rate = collection_rate.value_at(*date)?;
            let exp = expenses.value_at(*date)?;
            Some(CashFlowPoint::new(*date, *rev, rate, exp))
        })
        .collect();

    let projected = revenue_fc
        .dates
        .iter()
        .zip(&revenue_fc.point_estimates)
        .zip(rate_fc.point_estimates.iter().zip(&expense_fc.point_estimates))
        .map(|((date, rev), (rate, exp))| CashFlowPoint::new(*date, *rev, *rate, *exp))
        .collect();

    ForecastOutcome::Available(CashFlowProjection { history, projected })
}

/// Cash-flow projection from the filtered financial table: monthly Σ revenue,
/// mean collection rate and Σ expenses.
pub fn cash_flow_forecast(
    view: &JointView<'_>,
    config: &ForecastConfig,
) -> Outcome<ForecastOutcome<CashFlowProjection>> {
    let revenue = financial_series(view, FinancialMeasure::TotalRevenue, Reduction::Sum);
    let rate = financial_series(view, FinancialMeasure::CollectionRate, Reduction::Mean);
    let expenses = financial_series(view, FinancialMeasure::TotalExpenses, Reduction::Sum);

    revenue.and_then(|revenue| {
        rate.and_then(|rate| {
            expenses.map(|expenses| project_cash_flow(&revenue, &rate, &expenses, config))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn flat(value: f64, months: usize) -> MonthlySeries {
        MonthlySeries::from_values(ymd(2024, 1, 1), &vec![value; months])
    }

    #[test]
    fn cash_flow_from_projected_components() {
        let projection = project_cash_flow(
            &flat(100_000.0, 6),
            &flat(95.0, 6),
            &flat(70_000.0, 6),
            &ForecastConfig::default(),
        )
        .available()
        .unwrap();

        assert_eq!(projection.history.len(), 6);
        assert_eq!(projection.projected.len(), 3);
        let first = &projection.projected[0];
        assert_eq!(first.date, ymd(2024, 7, 1));
        assert_eq!(first.collections, 95_000.0);
        assert_eq!(first.cash_flow, 25_000.0);
    }

    #[test]
    fn any_short_component_is_insufficient() {
        let outcome = project_cash_flow(
            &flat(1.0, 6),
            &flat(95.0, 4),
            &flat(1.0, 6),
            &ForecastConfig::default(),
        );
        assert_eq!(
            outcome,
            ForecastOutcome::InsufficientData {
                observed: 4,
                required: 6
            }
        );
    }
}
