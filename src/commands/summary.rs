use anyhow::Result;

use super::{emit, Session};
use crate::cli::{FilterArgs, OutputArgs, SourceArgs, SummarySection};
use crate::errors;
use crate::filter::JointView;
use crate::io::Report;
use crate::metrics::{financial, operations, revenue};

pub fn run_summary(
    source: &SourceArgs,
    filters: &FilterArgs,
    output: &OutputArgs,
    sections: &[SummarySection],
) -> Result<()> {
    let session = Session::open(source, filters)?;
    let view = session.view();
    let report = build_summary(&session, &view, sections)?;
    emit(&report, output)
}

/// Every dashboard in `sections` (all of them when empty) as one report.
pub fn build_summary(
    session: &Session,
    view: &JointView<'_>,
    sections: &[SummarySection],
) -> errors::Result<Report> {
    let wanted = |section| sections.is_empty() || sections.contains(&section);
    let mut report = session.report("Practice Summary");

    if let Some(sampled) = view.sampled() {
        let summary = serde_json::json!({
            "sample_rate": sampled.rate,
            "sampled_dates": sampled.dates.len(),
        });
        report.push_value("Sampling", &summary)?;
    }
    if wanted(SummarySection::Operations) {
        operations_sections(&mut report, session, view)?;
    }
    if wanted(SummarySection::Financial) {
        financial_sections(&mut report, session, view)?;
    }
    if wanted(SummarySection::Revenue) {
        revenue_sections(&mut report, view)?;
    }
    Ok(report)
}

fn operations_sections(
    report: &mut Report,
    session: &Session,
    view: &JointView<'_>,
) -> errors::Result<()> {
    let plan_target = session.config.targets.plan_completion;
    report
        .push("Operations KPIs", &operations::headline_kpis(view))?
        .push("Chair Utilization", &operations::chair_utilization_trend(view))?
        .push("Equipment Utilization", &operations::equipment_by_type(view))?
        .push("Appointment Capacity", &operations::appointment_capacity(view))?
        .push("Staff by Role", &operations::staff_by_role(view))?
        .push("Staff Productivity", &operations::staff_productivity(view))?
        .push("Patient Flow", &operations::patient_flow(view))?
        .push("Cancellations by Weekday", &operations::cancellations_by_weekday(view))?
        .push("Wait Time", &operations::wait_time_trend(view))?
        .push("Days to Payment", &operations::days_to_payment_trend(view))?
        .push("Treatment Plans", &operations::treatment_plans(view, plan_target))?
        .push("Claims Processing", &operations::claims_processing(view))?
        .push("Claim Aging", &operations::claim_aging(view))?
        .push("Collection Rate", &operations::collection_rate_trend(view))?
        .push("Revenue per Unit", &operations::revenue_per_unit_trend(view))?
        .push("Cost Breakdown", &operations::cost_breakdown(view))?
        .push("Location Profitability", &operations::location_profitability(view))?;
    Ok(())
}

fn financial_sections(
    report: &mut Report,
    session: &Session,
    view: &JointView<'_>,
) -> errors::Result<()> {
    let config = &session.config;
    report
        .push("Financial KPIs", &financial::key_metrics(view))?
        .push("Revenue Trend", &financial::revenue_trend(view))?
        .push("Service Line Revenue", &financial::service_line_revenue(view))?
        .push("Service Lines by Location", &financial::service_line_by_location(view))?
        .push("Location Profit", &financial::location_profit(view))?
        .push("Expense Breakdown", &financial::expense_breakdown(view))?
        .push("Cost Percentages", &financial::cost_percentage_trend(view))?
        .push("AR Aging", &financial::ar_aging(view))?
        .push("AR Trend", &financial::ar_trend(view))?
        .push("Collections", &financial::collections_performance(view))?
        .push(
            "Claims Denials",
            &financial::claims_denials(view, config.targets.denial_rate),
        )?
        .push("Payor Mix", &financial::payor_mix(view))?
        .push("KPI Trends", &financial::kpi_trends(view))?
        .push("KPIs by Location", &financial::kpi_by_location(view))?
        .push(
            "Benchmarks",
            &financial::benchmark_comparison(view, &config.benchmarks),
        )?
        .push("Monthly Summary", &financial::monthly_summary(view))?;
    Ok(())
}

fn revenue_sections(report: &mut Report, view: &JointView<'_>) -> errors::Result<()> {
    report
        .push("Visit Revenue", &revenue::revenue_totals(view))?
        .push("Revenue by Procedure", &revenue::revenue_by_month_procedure(view))?
        .push("Monthly Revenue", &revenue::monthly_revenue(view))?
        .push("Procedure Profitability", &revenue::procedure_profitability(view))?
        .push("Location Performance", &revenue::location_performance(view))?
        .push("Insurance by Procedure", &revenue::insurance_by_procedure(view))?
        .push("Treatment Plan Performance", &revenue::treatment_plan_performance(view))?
        .push("Average Rating", &revenue::average_rating(view))?;
    Ok(())
}
