//! Practice operations: chairs, appointments, staffing, equipment, claims.
//!
//! Trend tables are keyed by the context's granularity (the date itself for
//! daily views). Rates are derived from aggregated counts; columns that only
//! exist as per-row percentages are averaged.

use serde::Serialize;

use super::{daily_key, mean_of, present, sum_of, Share};
use crate::aggregation::{aggregate, percentage, AggSpec, AggTable, GroupKey, Reduction, ValueSource};
use crate::filter::{JointView, Outcome};
use crate::store::{
    Column, EquipmentAttr, EquipmentMeasure, OperationsAttr, OperationsMeasure as M, StaffAttr,
    StaffMeasure,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationsKpis {
    pub chair_utilization: Option<f64>,
    pub target_chair_utilization: Option<f64>,
    pub cancellation_rate: Option<f64>,
    pub no_show_rate: Option<f64>,
    pub collection_rate: Option<f64>,
    pub target_collection_rate: Option<f64>,
}

/// Headline means over the filtered operations rows.
pub fn headline_kpis(view: &JointView<'_>) -> Outcome<OperationsKpis> {
    view.operations.compute(&[], |rows, schema| OperationsKpis {
        chair_utilization: mean_of(rows, schema, M::ChairUtilization),
        target_chair_utilization: mean_of(rows, schema, M::TargetChairUtilization),
        cancellation_rate: mean_of(rows, schema, M::CancellationRate),
        no_show_rate: mean_of(rows, schema, M::NoShowRate),
        collection_rate: mean_of(rows, schema, M::ActualCollectionRate),
        target_collection_rate: mean_of(rows, schema, M::TargetCollectionRate),
    })
}

/// Mean chair utilization (and target, when present) per period.
pub fn chair_utilization_trend(view: &JointView<'_>) -> Outcome<AggTable> {
    let key = daily_key(view.context.granularity());
    view.operations
        .compute(&[M::ChairUtilization], |rows, schema| {
            let spec = present(
                AggSpec::new(),
                schema,
                &[M::ChairUtilization, M::TargetChairUtilization],
                Reduction::Mean,
            );
            aggregate(rows, &[key], &spec)
        })
        .and_then(Outcome::of_table)
}

/// Equipment usage per type, most utilized first.
pub fn equipment_by_type(view: &JointView<'_>) -> Outcome<AggTable> {
    view.equipment
        .compute(&[], |rows, _| {
            let spec = AggSpec::new()
                .mean(EquipmentMeasure::UtilizationRate)
                .sum(EquipmentMeasure::UsageCount)
                .sum(EquipmentMeasure::UsageTimeMinutes);
            let mut table = aggregate(rows, &[GroupKey::Attribute(EquipmentAttr::EquipmentType)], &spec);
            table.sort_by(EquipmentMeasure::UtilizationRate.header(), true);
            table
        })
        .and_then(Outcome::of_table)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityReport {
    pub by_period: AggTable,
    pub mean_scheduled_utilization: f64,
    pub mean_actual_utilization: f64,
}

/// Appointment capacity against scheduled and attended appointments.
pub fn appointment_capacity(view: &JointView<'_>) -> Outcome<CapacityReport> {
    let key = daily_key(view.context.granularity());
    view.operations.compute(
        &[M::AppointmentCapacity, M::ScheduledAppointments, M::ActualAppointments],
        |rows, _| {
            let spec = AggSpec::new()
                .sum(M::AppointmentCapacity)
                .sum(M::ScheduledAppointments)
                .sum(M::ActualAppointments);
            let mut by_period = aggregate(rows, &[key], &spec);
            by_period
                .derive_ratio(
                    "Scheduled_Utilization",
                    M::ScheduledAppointments.header(),
                    M::AppointmentCapacity.header(),
                    100.0,
                )
                .derive_ratio(
                    "Actual_Utilization",
                    M::ActualAppointments.header(),
                    M::AppointmentCapacity.header(),
                    100.0,
                );
            CapacityReport {
                mean_scheduled_utilization: by_period.mean_of("Scheduled_Utilization"),
                mean_actual_utilization: by_period.mean_of("Actual_Utilization"),
                by_period,
            }
        },
    )
}

/// Hours, labor cost and headcount per staff role, busiest role first.
pub fn staff_by_role(view: &JointView<'_>) -> Outcome<AggTable> {
    view.staff
        .compute(&[], |rows, _| {
            let spec = AggSpec::new()
                .sum(StaffMeasure::HoursWorked)
                .sum(StaffMeasure::LaborCost)
                .push("Staff_Count", ValueSource::Attribute(StaffAttr::StaffId), Reduction::NUnique);
            let mut table = aggregate(rows, &[GroupKey::Attribute(StaffAttr::StaffRole)], &spec);
            table
                .derive_ratio(
                    "Cost_Per_Hour",
                    StaffMeasure::LaborCost.header(),
                    StaffMeasure::HoursWorked.header(),
                    1.0,
                )
                .sort_by(StaffMeasure::HoursWorked.header(), true);
            table
        })
        .and_then(Outcome::of_table)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductivityReport {
    pub by_period: AggTable,
    pub mean_patients_per_labor_hour: f64,
    pub mean_revenue_per_hour: Option<f64>,
}

/// Patients seen per labor hour, with revenue per hour when recorded.
pub fn staff_productivity(view: &JointView<'_>) -> Outcome<ProductivityReport> {
    let key = daily_key(view.context.granularity());
    view.operations
        .compute(&[M::TotalPatientsSeen, M::TotalLaborHours], |rows, schema| {
            let spec = present(
                AggSpec::new(),
                schema,
                &[M::TotalPatientsSeen, M::TotalLaborHours, M::TotalLaborCost],
                Reduction::Sum,
            );
            let spec = present(spec, schema, &[M::RevenuePerHour], Reduction::Mean);
            let mut by_period = aggregate(rows, &[key], &spec);
            by_period.derive_ratio(
                "Patients_Per_Labor_Hour",
                M::TotalPatientsSeen.header(),
                M::TotalLaborHours.header(),
                1.0,
            );
            ProductivityReport {
                mean_patients_per_labor_hour: by_period.mean_of("Patients_Per_Labor_Hour"),
                mean_revenue_per_hour: by_period
                    .has_column(M::RevenuePerHour.header())
                    .then(|| by_period.mean_of(M::RevenuePerHour.header())),
                by_period,
            }
        })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientFlowReport {
    pub by_period: AggTable,
    pub total_new: f64,
    pub total_returning: f64,
    /// New patients as a percentage of new plus returning
    pub new_patient_share: f64,
}

pub fn patient_flow(view: &JointView<'_>) -> Outcome<PatientFlowReport> {
    let key = daily_key(view.context.granularity());
    view.operations
        .compute(&[M::NewPatientCount, M::ReturningPatientCount], |rows, schema| {
            let spec = present(
                AggSpec::new(),
                schema,
                &[
                    M::NewPatientCount,
                    M::ReturningPatientCount,
                    M::TotalPatientsSeen,
                    M::TargetNewPatients,
                ],
                Reduction::Sum,
            );
            let mut by_period = aggregate(rows, &[key], &spec);
            by_period.derive("New_Patient_Share", |row| {
                let new = row.get(M::NewPatientCount.header());
                percentage(new, new + row.get(M::ReturningPatientCount.header()))
            });

            let total_new = sum_of(rows, M::NewPatientCount);
            let total_returning = sum_of(rows, M::ReturningPatientCount);
            PatientFlowReport {
                by_period,
                total_new,
                total_returning,
                new_patient_share: percentage(total_new, total_new + total_returning),
            }
        })
}

/// Cancellation and no-show rates per weekday, Monday first.
pub fn cancellations_by_weekday(view: &JointView<'_>) -> Outcome<AggTable> {
    view.operations
        .compute(&[M::CancellationRate, M::NoShowRate], |rows, schema| {
            let spec = AggSpec::new().mean(M::CancellationRate).mean(M::NoShowRate);
            let spec = present(
                spec,
                schema,
                &[M::CancellationCount, M::NoShowCount],
                Reduction::Sum,
            );
            aggregate(rows, &[GroupKey::DayName], &spec)
        })
        .and_then(Outcome::of_table)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub by_period: AggTable,
    pub average: f64,
    pub max: f64,
}

fn mean_trend(view: &JointView<'_>, column: M) -> Outcome<TrendSummary> {
    let key = daily_key(view.context.granularity());
    view.operations
        .compute(&[column], |rows, _| {
            aggregate(rows, &[key], &AggSpec::new().mean(column))
        })
        .and_then(Outcome::of_table)
        .map(|by_period| TrendSummary {
            average: by_period.mean_of(column.header()),
            max: by_period.max_of(column.header()).unwrap_or(0.0),
            by_period,
        })
}

/// Average patient wait time per period.
pub fn wait_time_trend(view: &JointView<'_>) -> Outcome<TrendSummary> {
    mean_trend(view, M::AvgWaitTime)
}

/// Average days from claim to payment per period.
pub fn days_to_payment_trend(view: &JointView<'_>) -> Outcome<TrendSummary> {
    mean_trend(view, M::AvgDaysToPayment)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatmentPlanReport {
    pub completion_trend: Option<AggTable>,
    pub not_started: f64,
    pub in_progress: f64,
    pub completed: f64,
    pub delayed: f64,
    pub total: f64,
    /// Completed plans as a percentage of all plans
    pub conversion_rate: f64,
    /// Completion-rate target, percent
    pub target: f64,
}

pub fn treatment_plans(view: &JointView<'_>, target: f64) -> Outcome<TreatmentPlanReport> {
    let key = daily_key(view.context.granularity());
    view.operations.compute(
        &[M::PlansNotStarted, M::PlansInProgress, M::PlansCompleted, M::PlansDelayed],
        |rows, schema| {
            let completion_trend = schema
                .has_measure(M::TreatmentPlanCompletionRate)
                .then(|| aggregate(rows, &[key], &AggSpec::new().mean(M::TreatmentPlanCompletionRate)));
            let not_started = sum_of(rows, M::PlansNotStarted);
            let in_progress = sum_of(rows, M::PlansInProgress);
            let completed = sum_of(rows, M::PlansCompleted);
            let delayed = sum_of(rows, M::PlansDelayed);
            let total = not_started + in_progress + completed + delayed;
            TreatmentPlanReport {
                completion_trend,
                not_started,
                in_progress,
                completed,
                delayed,
                total,
                conversion_rate: percentage(completed, total),
                target,
            }
        },
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimsReport {
    pub submitted: f64,
    pub processed: f64,
    pub paid: f64,
    pub denied: f64,
    /// Processed / submitted
    pub processing_rate: f64,
    /// Paid / processed
    pub approval_rate: f64,
    /// Denied / processed
    pub denial_rate: f64,
}

pub fn claims_processing(view: &JointView<'_>) -> Outcome<ClaimsReport> {
    view.operations.compute(
        &[M::ClaimsSubmitted, M::ClaimsProcessed, M::ClaimsPaid, M::ClaimsDenied],
        |rows, _| {
            let submitted = sum_of(rows, M::ClaimsSubmitted);
            let processed = sum_of(rows, M::ClaimsProcessed);
            let paid = sum_of(rows, M::ClaimsPaid);
            let denied = sum_of(rows, M::ClaimsDenied);
            ClaimsReport {
                submitted,
                processed,
                paid,
                denied,
                processing_rate: percentage(processed, submitted),
                approval_rate: percentage(paid, processed),
                denial_rate: percentage(denied, processed),
            }
        },
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimAging {
    pub buckets: Vec<Share>,
    pub total: f64,
    /// Share of claims aged beyond 60 days, in percent
    pub share_over_60: f64,
}

const AGING_BUCKETS: [(M, &str); 4] = [
    (M::ClaimsAging0To30, "0-30"),
    (M::ClaimsAging31To60, "31-60"),
    (M::ClaimsAging61To90, "61-90"),
    (M::ClaimsAging90Plus, "90+"),
];

pub fn claim_aging(view: &JointView<'_>) -> Outcome<ClaimAging> {
    let required: Vec<M> = AGING_BUCKETS.iter().map(|(column, _)| *column).collect();
    view.operations.compute(&required, |rows, _| {
        let amounts: Vec<(String, f64)> = AGING_BUCKETS
            .iter()
            .map(|(column, label)| (label.to_string(), sum_of(rows, *column)))
            .collect();
        let total: f64 = amounts.iter().map(|(_, amount)| amount).sum();
        let over_60 = sum_of(rows, M::ClaimsAging61To90) + sum_of(rows, M::ClaimsAging90Plus);
        ClaimAging {
            buckets: Share::of_total(amounts, total),
            total,
            share_over_60: percentage(over_60, total),
        }
    })
}

/// Mean actual and target collection rate per period, with the gap between them.
pub fn collection_rate_trend(view: &JointView<'_>) -> Outcome<AggTable> {
    let key = daily_key(view.context.granularity());
    view.operations
        .compute(&[M::ActualCollectionRate, M::TargetCollectionRate], |rows, _| {
            let spec = AggSpec::new()
                .mean(M::ActualCollectionRate)
                .mean(M::TargetCollectionRate);
            let mut table = aggregate(rows, &[key], &spec);
            table.derive("Collection_Gap", |row| {
                row.get(M::ActualCollectionRate.header()) - row.get(M::TargetCollectionRate.header())
            });
            table
        })
        .and_then(Outcome::of_table)
}

/// Mean revenue per hour, chair and patient per period.
pub fn revenue_per_unit_trend(view: &JointView<'_>) -> Outcome<AggTable> {
    let key = daily_key(view.context.granularity());
    let columns = [M::RevenuePerHour, M::RevenuePerChair, M::RevenuePerPatient];
    view.operations
        .compute(&columns, |rows, schema| {
            aggregate(rows, &[key], &present(AggSpec::new(), schema, &columns, Reduction::Mean))
        })
        .and_then(Outcome::of_table)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub labor: f64,
    pub supply: f64,
    pub overhead: f64,
    /// What remains of revenue after the three cost shares
    pub profit_margin: f64,
}

const COST_SHARES: [M; 3] = [M::LaborCostPercentage, M::SupplyCostPercentage, M::OverheadPercentage];

pub fn cost_breakdown(view: &JointView<'_>) -> Outcome<CostBreakdown> {
    view.operations.compute(&COST_SHARES, |rows, schema| {
        let mean = |column| mean_of(rows, schema, column).unwrap_or(0.0);
        let (labor, supply, overhead) = (
            mean(M::LaborCostPercentage),
            mean(M::SupplyCostPercentage),
            mean(M::OverheadPercentage),
        );
        CostBreakdown {
            labor,
            supply,
            overhead,
            profit_margin: 100.0 - labor - supply - overhead,
        }
    })
}

/// Revenue per hour and cost shares per location, most profitable first.
pub fn location_profitability(view: &JointView<'_>) -> Outcome<AggTable> {
    let mut required = vec![M::RevenuePerHour];
    required.extend(COST_SHARES);
    view.operations
        .compute(&required, |rows, _| {
            let spec = required
                .iter()
                .fold(AggSpec::new(), |spec, column| spec.mean(*column));
            let mut table = aggregate(rows, &[GroupKey::Attribute(OperationsAttr::LocationName)], &spec);
            table
                .derive("Profit_Margin", |row| {
                    100.0 - COST_SHARES.iter().map(|c| row.get(c.header())).sum::<f64>()
                })
                .sort_by("Profit_Margin", true);
            table
        })
        .and_then(Outcome::of_table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DataLoadError;
    use crate::filter::FilterContext;
    use crate::store::{
        Equipment, Operations, RecordStore, Row, Schema, Staff, Table, TableSlot, TableSpec,
    };
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn missing<T: TableSpec>() -> TableSlot<T> {
        TableSlot::Unavailable(DataLoadError::empty(T::KIND, Path::new("none.csv")))
    }

    fn day(date: NaiveDate, id: &str, name: &str) -> Row<Operations> {
        Row::on(date)
            .with_attr(OperationsAttr::LocationId, id)
            .with_attr(OperationsAttr::LocationName, name)
    }

    fn store_with(ops: Vec<Row<Operations>>, schema: Schema<Operations>) -> RecordStore {
        RecordStore::from_slots(
            Table::from_rows("ops.csv", schema, ops).into(),
            missing(),
            missing(),
            missing(),
            missing(),
        )
    }

    #[test]
    fn claims_rates_use_processed_as_denominator() {
        let ops = vec![day(ymd(2024, 1, 1), "L1", "Downtown")
            .with_measure(M::ClaimsSubmitted, 100.0)
            .with_measure(M::ClaimsProcessed, 80.0)
            .with_measure(M::ClaimsPaid, 60.0)
            .with_measure(M::ClaimsDenied, 8.0)];
        let store = store_with(ops, Schema::complete());
        let ctx = FilterContext::new();
        let view = JointView::build(&store, &ctx);

        let report = claims_processing(&view).ready().unwrap();
        assert_eq!(report.processing_rate, 80.0);
        assert_eq!(report.approval_rate, 75.0);
        assert_eq!(report.denial_rate, 10.0);
    }

    #[test]
    fn missing_optional_columns_give_empty() {
        let ops = vec![day(ymd(2024, 1, 1), "L1", "Downtown")];
        let store = store_with(ops, Schema::empty());
        let ctx = FilterContext::new();
        let view = JointView::build(&store, &ctx);

        assert!(wait_time_trend(&view).is_empty());
        assert!(claim_aging(&view).is_empty());
        assert!(equipment_by_type(&view).is_unavailable());
    }

    #[test]
    fn aging_share_over_sixty_days() {
        let ops = vec![day(ymd(2024, 1, 1), "L1", "Downtown")
            .with_measure(M::ClaimsAging0To30, 50.0)
            .with_measure(M::ClaimsAging31To60, 25.0)
            .with_measure(M::ClaimsAging61To90, 15.0)
            .with_measure(M::ClaimsAging90Plus, 10.0)];
        let store = store_with(ops, Schema::complete());
        let ctx = FilterContext::new();
        let view = JointView::build(&store, &ctx);

        let aging = claim_aging(&view).ready().unwrap();
        assert_eq!(aging.total, 100.0);
        assert_eq!(aging.share_over_60, 25.0);
        assert_eq!(aging.buckets[0].label, "0-30");
    }

    #[test]
    fn location_ranking_by_residual_margin() {
        let row = |id: &str, name: &str, labor: f64| {
            day(ymd(2024, 1, 1), id, name)
                .with_measure(M::RevenuePerHour, 300.0)
                .with_measure(M::LaborCostPercentage, labor)
                .with_measure(M::SupplyCostPercentage, 6.0)
                .with_measure(M::OverheadPercentage, 20.0)
        };
        let store = store_with(
            vec![row("L1", "Downtown", 34.0), row("L2", "Uptown", 24.0)],
            Schema::complete(),
        );
        let ctx = FilterContext::new();
        let view = JointView::build(&store, &ctx);

        let table = location_profitability(&view).ready().unwrap();
        assert_eq!(table.labels(), vec!["Uptown", "Downtown"]);
        assert_eq!(table.column("Profit_Margin"), vec![50.0, 40.0]);
    }

    #[test]
    fn staff_cost_per_hour_from_sums() {
        let shift = |staff: &str, hours: f64, cost: f64| {
            Row::<Staff>::on(ymd(2024, 1, 1))
                .with_attr(StaffAttr::LocationId, "L1")
                .with_attr(StaffAttr::StaffId, staff)
                .with_attr(StaffAttr::StaffRole, "Hygienist")
                .with_measure(StaffMeasure::HoursWorked, hours)
                .with_measure(StaffMeasure::LaborCost, cost)
        };
        let store = RecordStore::from_slots(
            missing(),
            missing::<Equipment>(),
            Table::from_rows(
                "staff.csv",
                Schema::complete(),
                vec![shift("S1", 8.0, 400.0), shift("S2", 2.0, 200.0)],
            )
            .into(),
            missing(),
            missing(),
        );
        let ctx = FilterContext::new();
        let view = JointView::build(&store, &ctx);

        let table = staff_by_role(&view).ready().unwrap();
        assert_eq!(table.column("Cost_Per_Hour"), vec![60.0]);
        assert_eq!(table.column("Staff_Count"), vec![2.0]);
    }
}
