use anyhow::Result;

use super::{emit, Session};
use crate::cli::{FilterArgs, OutputArgs, SourceArgs};
use crate::forecast::{cash_flow_forecast, revenue_forecast};

pub fn run_forecast(
    source: &SourceArgs,
    filters: &FilterArgs,
    output: &OutputArgs,
    periods: Option<usize>,
    window: Option<usize>,
) -> Result<()> {
    let mut session = Session::open(source, filters)?;
    if let Some(periods) = periods {
        session.config = session.config.with_forecast_periods(periods);
    }
    if let Some(window) = window {
        session.config = session.config.with_forecast_window(window);
    }

    let view = session.view();
    let config = &session.config.forecast;
    let mut report = session.report("Forecast");
    report
        .push_value("Settings", config)?
        .push("Revenue Forecast", &revenue_forecast(&view, config))?
        .push("Cash Flow Forecast", &cash_flow_forecast(&view, config))?;

    emit(&report, output)
}
