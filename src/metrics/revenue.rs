//! Revenue from billed patient visits.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{mean_of, sum_of};
use crate::aggregation::{
    aggregate, mean_or_zero, percentage, AggSpec, AggTable, GroupKey, Reduction, ValueSource,
};
use crate::filter::{JointView, Outcome};
use crate::store::{Column, PatientVisits, Row, VisitAttr, VisitDate, VisitMeasure as V};

/// Procedures below this many charged dollars are left out of the best and
/// worst collection-rate rankings.
pub const RANKING_MIN_CHARGED: f64 = 100.0;

const RANKING_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueTotals {
    pub total_billed: f64,
    pub total_collected: f64,
    pub collection_rate: f64,
    /// Month-over-month change of collected revenue in the latest month, percent
    pub latest_mom_growth: f64,
}

pub fn revenue_totals(view: &JointView<'_>) -> Outcome<RevenueTotals> {
    view.visits.compute(&[], |rows, _| {
        let total_billed = sum_of(rows, V::ChargedAmount);
        let total_collected = sum_of(rows, V::CollectedAmount);
        let growth = monthly_table(rows).column("MoM_Growth");
        RevenueTotals {
            total_billed,
            total_collected,
            collection_rate: percentage(total_collected, total_billed),
            latest_mom_growth: growth.last().copied().unwrap_or(0.0),
        }
    })
}

/// Charged amount per month and procedure.
pub fn revenue_by_month_procedure(view: &JointView<'_>) -> Outcome<AggTable> {
    view.visits
        .compute(&[], |rows, _| {
            aggregate(
                rows,
                &[GroupKey::MonthYear, GroupKey::Attribute(VisitAttr::ProcedureDescription)],
                &AggSpec::new().sum(V::ChargedAmount),
            )
        })
        .and_then(Outcome::of_table)
}

fn monthly_table(rows: &[&Row<PatientVisits>]) -> AggTable {
    let spec = AggSpec::new().sum(V::ChargedAmount).sum(V::CollectedAmount);
    let mut table = aggregate(rows, &[GroupKey::MonthYear], &spec);
    let collected = table.column(V::CollectedAmount.header());
    let growth: Vec<f64> = collected
        .iter()
        .enumerate()
        .map(|(i, current)| match i.checked_sub(1).and_then(|p| collected.get(p)) {
            Some(previous) => percentage(current - previous, *previous),
            None => 0.0,
        })
        .collect();
    table.append_column("MoM_Growth", growth);
    table
}

/// Charged and collected revenue per month with month-over-month growth of
/// collections. The first month's growth is 0.
pub fn monthly_revenue(view: &JointView<'_>) -> Outcome<AggTable> {
    view.visits
        .compute(&[], |rows, _| monthly_table(rows))
        .and_then(Outcome::of_table)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcedureReport {
    /// Every procedure, highest collections first
    pub by_procedure: AggTable,
    /// Best collection rates among procedures charged above the minimum
    pub top: AggTable,
    pub bottom: AggTable,
}

pub fn procedure_profitability(view: &JointView<'_>) -> Outcome<ProcedureReport> {
    view.visits
        .compute(&[], |rows, _| {
            let spec = AggSpec::new().sum(V::ChargedAmount).sum(V::CollectedAmount);
            let mut table = aggregate(
                rows,
                &[GroupKey::Attribute(VisitAttr::ProcedureDescription)],
                &spec,
            );
            table.derive_ratio(
                "Collection_Rate",
                V::CollectedAmount.header(),
                V::ChargedAmount.header(),
                100.0,
            );

            let mut ranked = table.clone();
            ranked.retain(|row| row.get(V::ChargedAmount.header()) > RANKING_MIN_CHARGED);
            ranked.sort_by("Collection_Rate", true);
            let top = ranked.head(RANKING_SIZE);
            ranked.sort_by("Collection_Rate", false);
            let bottom = ranked.head(RANKING_SIZE);

            table.sort_by(V::CollectedAmount.header(), true);
            ProcedureReport {
                by_procedure: table,
                top,
                bottom,
            }
        })
        .and_then(|report| {
            if report.by_procedure.is_empty() {
                Outcome::Empty
            } else {
                Outcome::Ready(report)
            }
        })
}

/// Billing, collections, visit count and rating per location.
pub fn location_performance(view: &JointView<'_>) -> Outcome<AggTable> {
    view.visits
        .compute(&[], |rows, schema| {
            let mut spec = AggSpec::new().sum(V::ChargedAmount).sum(V::CollectedAmount);
            if schema.has_measure(V::GoogleRating) {
                spec = spec.first(V::GoogleRating);
            }
            let spec = spec.push("Visit_Count", ValueSource::Attribute(VisitAttr::VisitId), Reduction::NUnique);
            let mut table = aggregate(rows, &[GroupKey::Attribute(VisitAttr::LocationName)], &spec);
            table
                .derive_ratio(
                    "Collection_Rate",
                    V::CollectedAmount.header(),
                    V::ChargedAmount.header(),
                    100.0,
                )
                .derive_ratio("Revenue_Per_Visit", V::CollectedAmount.header(), "Visit_Count", 1.0);
            table
        })
        .and_then(Outcome::of_table)
}

/// Reimbursement and collection rates per insurer and procedure.
pub fn insurance_by_procedure(view: &JointView<'_>) -> Outcome<AggTable> {
    view.visits
        .compute(&[], |rows, _| {
            let spec = AggSpec::new()
                .sum(V::ChargedAmount)
                .sum(V::InsuranceCoveredAmount)
                .sum(V::CollectedAmount)
                .push("Visit_Count", ValueSource::Attribute(VisitAttr::VisitId), Reduction::NUnique);
            let mut table = aggregate(
                rows,
                &[
                    GroupKey::Attribute(VisitAttr::InsuranceProvider),
                    GroupKey::Attribute(VisitAttr::ProcedureDescription),
                ],
                &spec,
            );
            table
                .derive_ratio(
                    "Reimbursement_Rate",
                    V::InsuranceCoveredAmount.header(),
                    V::ChargedAmount.header(),
                    100.0,
                )
                .derive_ratio(
                    "Collection_Rate",
                    V::CollectedAmount.header(),
                    V::ChargedAmount.header(),
                    100.0,
                );
            table
        })
        .and_then(Outcome::of_table)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub plan_id: String,
    pub estimated_cost: f64,
    pub collected: f64,
    pub completion_rate: f64,
    /// Collected as a percentage of the estimate
    pub forecasting_accuracy: f64,
    pub duration_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSegment {
    pub label: &'static str,
    pub plans: usize,
    pub estimated: f64,
    pub collected: f64,
    pub collection_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatmentPlanReport {
    pub plans: Vec<PlanSummary>,
    pub average_completion: f64,
    pub average_accuracy: f64,
    pub average_duration_days: Option<f64>,
    pub segments: Vec<PlanSegment>,
}

/// Completion-rate bins, upper bound inclusive, lower bound exclusive.
const SEGMENTS: [(f64, f64, &str); 4] = [
    (0.0, 25.0, "0-25%"),
    (25.0, 50.0, "26-50%"),
    (50.0, 75.0, "51-75%"),
    (75.0, 100.0, "76-100%"),
];

#[derive(Default)]
struct PlanDates {
    created: Option<NaiveDate>,
    completed: Option<NaiveDate>,
}

/// Per-plan collections against estimates, durations and completion segments.
/// Only visits that belong to a treatment plan are considered.
pub fn treatment_plan_performance(view: &JointView<'_>) -> Outcome<TreatmentPlanReport> {
    view.visits
        .compute(&[V::EstimatedTotalCost, V::TreatmentPlanCompletionRate], |rows, schema| {
            let in_plan: Vec<&Row<PatientVisits>> = rows
                .iter()
                .copied()
                .filter(|row| row.attr(VisitAttr::TreatmentPlanId).is_some())
                .collect();
            if in_plan.is_empty() {
                return None;
            }

            let spec = AggSpec::new()
                .first(V::EstimatedTotalCost)
                .sum(V::CollectedAmount)
                .first(V::TreatmentPlanCompletionRate);
            let by_plan = aggregate(&in_plan, &[GroupKey::Attribute(VisitAttr::TreatmentPlanId)], &spec);

            let track_dates = schema.has_date_field(VisitDate::TreatmentPlanCreation)
                && schema.has_date_field(VisitDate::TreatmentPlanCompletion);
            let mut dates: BTreeMap<&str, PlanDates> = BTreeMap::new();
            for row in &in_plan {
                let Some(id) = row.attr(VisitAttr::TreatmentPlanId) else { continue };
                let entry = dates.entry(id).or_default();
                entry.created = entry
                    .created
                    .or_else(|| row.secondary_date(VisitDate::TreatmentPlanCreation));
                entry.completed = entry
                    .completed
                    .or_else(|| row.secondary_date(VisitDate::TreatmentPlanCompletion));
            }

            let plans: Vec<PlanSummary> = by_plan
                .rows()
                .iter()
                .enumerate()
                .map(|(i, agg)| {
                    let plan_id = agg.keys[0].to_string();
                    let value = |name: &str| by_plan.value(i, name).map_or(0.0, |v| v.as_f64());
                    let estimated_cost = value(V::EstimatedTotalCost.header());
                    let collected = value(V::CollectedAmount.header());
                    let duration_days = track_dates
                        .then(|| dates.get(plan_id.as_str()))
                        .flatten()
                        .and_then(|d| Some((d.completed? - d.created?).num_days()));
                    PlanSummary {
                        estimated_cost,
                        collected,
                        completion_rate: value(V::TreatmentPlanCompletionRate.header()),
                        forecasting_accuracy: percentage(collected, estimated_cost),
                        duration_days,
                        plan_id,
                    }
                })
                .collect();

            Some(summarize_plans(plans))
        })
        .and_then(|report| report.map_or(Outcome::Empty, Outcome::Ready))
}

fn summarize_plans(plans: Vec<PlanSummary>) -> TreatmentPlanReport {
    let completion: Vec<f64> = plans.iter().map(|p| p.completion_rate).collect();
    let accuracy: Vec<f64> = plans.iter().map(|p| p.forecasting_accuracy).collect();
    let durations: Vec<f64> = plans
        .iter()
        .filter_map(|p| p.duration_days)
        .map(|days| days as f64)
        .collect();

    let segments = SEGMENTS
        .iter()
        .map(|(low, high, label)| {
            let members: Vec<&PlanSummary> = plans
                .iter()
                .filter(|p| p.completion_rate > *low && p.completion_rate <= *high)
                .collect();
            let estimated = members.iter().map(|p| p.estimated_cost).sum();
            let collected = members.iter().map(|p| p.collected).sum();
            PlanSegment {
                label: *label,
                plans: members.len(),
                estimated,
                collected,
                collection_rate: percentage(collected, estimated),
            }
        })
        .collect();

    TreatmentPlanReport {
        average_completion: mean_or_zero(&completion),
        average_accuracy: mean_or_zero(&accuracy),
        average_duration_days: (!durations.is_empty()).then(|| mean_or_zero(&durations)),
        segments,
        plans,
    }
}

/// Mean Google rating across the filtered visits.
pub fn average_rating(view: &JointView<'_>) -> Outcome<f64> {
    view.visits
        .compute(&[V::GoogleRating], |rows, schema| mean_of(rows, schema, V::GoogleRating))
        .and_then(|rating| rating.map_or(Outcome::Empty, Outcome::Ready))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dates::ParsedDate;
    use crate::errors::DataLoadError;
    use crate::filter::FilterContext;
    use crate::store::{RecordStore, Schema, Table, TableSlot, TableSpec};
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn missing<T: TableSpec>() -> TableSlot<T> {
        TableSlot::Unavailable(DataLoadError::empty(T::KIND, Path::new("none.csv")))
    }

    fn visit(id: &str, date: NaiveDate, procedure: &str, charged: f64, covered: f64) -> Row<PatientVisits> {
        Row::on(date)
            .with_attr(VisitAttr::VisitId, id)
            .with_attr(VisitAttr::LocationId, "L1")
            .with_attr(VisitAttr::LocationName, "Downtown")
            .with_attr(VisitAttr::InsuranceProvider, "Delta")
            .with_attr(VisitAttr::ProcedureDescription, procedure)
            .with_measure(V::ChargedAmount, charged)
            .with_measure(V::InsuranceCoveredAmount, covered)
            .with_measure(V::OutOfPocket, 0.0)
            .with_measure(V::DiscountApplied, 0.0)
    }

    fn store(rows: Vec<Row<PatientVisits>>) -> RecordStore {
        RecordStore::from_slots(
            missing(),
            missing(),
            missing(),
            Table::from_rows("visits.csv", Schema::complete(), rows).into(),
            missing(),
        )
    }

    #[test]
    fn zero_charge_procedure_stays_with_zero_rate() {
        let store = store(vec![
            visit("V1", ymd(2024, 1, 2), "Crown", 1_000.0, 800.0),
            visit("V2", ymd(2024, 1, 3), "Consultation", 0.0, 0.0),
        ]);
        let ctx = FilterContext::new();
        let view = JointView::build(&store, &ctx);

        let report = procedure_profitability(&view).ready().unwrap();
        assert_eq!(report.by_procedure.labels(), vec!["Crown", "Consultation"]);
        assert_eq!(report.by_procedure.column("Collection_Rate"), vec![80.0, 0.0]);
        assert_eq!(report.top.labels(), vec!["Crown"]);
    }

    #[test]
    fn month_over_month_growth_of_collections() {
        let store = store(vec![
            visit("V1", ymd(2024, 1, 2), "Crown", 1_000.0, 400.0),
            visit("V2", ymd(2024, 2, 3), "Crown", 1_000.0, 500.0),
        ]);
        let ctx = FilterContext::new();
        let view = JointView::build(&store, &ctx);

        let table = monthly_revenue(&view).ready().unwrap();
        assert_eq!(table.labels(), vec!["2024-01", "2024-02"]);
        assert_eq!(table.column("MoM_Growth"), vec![0.0, 25.0]);

        let totals = revenue_totals(&view).ready().unwrap();
        assert_eq!(totals.latest_mom_growth, 25.0);
        assert_eq!(totals.collection_rate, 45.0);
    }

    #[test]
    fn plan_accuracy_duration_and_segments() {
        let created = ParsedDate::Parsed(ymd(2024, 1, 1));
        let completed = ParsedDate::Parsed(ymd(2024, 1, 31));
        let plan_visit = |id: &str, covered: f64| {
            visit(id, ymd(2024, 1, 5), "Implant", 2_000.0, covered)
                .with_attr(VisitAttr::TreatmentPlanId, "TP1")
                .with_measure(V::EstimatedTotalCost, 4_000.0)
                .with_measure(V::TreatmentPlanCompletionRate, 60.0)
                .with_secondary_date(VisitDate::TreatmentPlanCreation, created.clone())
                .with_secondary_date(VisitDate::TreatmentPlanCompletion, completed.clone())
        };
        let store = store(vec![
            plan_visit("V1", 1_000.0),
            plan_visit("V2", 2_000.0),
            visit("V3", ymd(2024, 1, 6), "Cleaning", 100.0, 100.0),
        ]);
        let ctx = FilterContext::new();
        let view = JointView::build(&store, &ctx);

        let report = treatment_plan_performance(&view).ready().unwrap();
        assert_eq!(report.plans.len(), 1);
        assert_eq!(report.plans[0].forecasting_accuracy, 75.0);
        assert_eq!(report.plans[0].duration_days, Some(30));
        assert_eq!(report.segments[2].label, "51-75%");
        assert_eq!(report.segments[2].plans, 1);
        assert_eq!(report.segments[0].plans, 0);
    }
}
