//! Monthly financial statements: revenue, EBITDA, receivables, collections,
//! payor mix and KPI benchmarks.
//!
//! Financial rows are one per location per month (see the store's monthly
//! fold), so trends are keyed by month or coarser even when the context asks
//! for daily granularity.

use chrono::NaiveDate;
use serde::Serialize;

use super::{latest_month, mean_of, monthly_key, present, sum_of, Share};
use crate::aggregation::{aggregate, percentage, AggSpec, AggTable, GroupKey, Reduction};
use crate::config::BenchmarkConfig;
use crate::filter::{JointView, Outcome};
use crate::store::{
    Column, DynamicColumn, DynamicFamily, Financial, FinancialAttr, FinancialMeasure as F, Row,
    Schema,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialKpis {
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub total_ebitda: f64,
    /// Σ EBITDA / Σ revenue, percent
    pub ebitda_margin: f64,
    pub collection_rate: Option<f64>,
    pub dso: Option<f64>,
    pub revenue_yoy_change: Option<f64>,
    pub ebitda_yoy_change: Option<f64>,
}

/// EBITDA of a set of rows: the recorded column when present, otherwise
/// revenue less expenses.
fn ebitda_of(rows: &[&Row<Financial>], schema: &Schema<Financial>) -> f64 {
    if schema.has_measure(F::Ebitda) {
        sum_of(rows, F::Ebitda)
    } else {
        sum_of(rows, F::TotalRevenue) - sum_of(rows, F::TotalExpenses)
    }
}

pub fn key_metrics(view: &JointView<'_>) -> Outcome<FinancialKpis> {
    view.financial.compute(&[], |rows, schema| {
        let total_revenue = sum_of(rows, F::TotalRevenue);
        let total_ebitda = ebitda_of(rows, schema);
        FinancialKpis {
            total_revenue,
            total_expenses: sum_of(rows, F::TotalExpenses),
            total_ebitda,
            ebitda_margin: percentage(total_ebitda, total_revenue),
            collection_rate: mean_of(rows, schema, F::CollectionRate),
            dso: mean_of(rows, schema, F::Dso),
            revenue_yoy_change: mean_of(rows, schema, F::RevenueYoyChange),
            ebitda_yoy_change: mean_of(rows, schema, F::EbitdaYoyChange),
        }
    })
}

/// Σ revenue, expenses and recorded EBITDA.
fn profit_sums(spec: AggSpec<Financial>, schema: &Schema<Financial>) -> AggSpec<Financial> {
    present(
        spec,
        schema,
        &[F::TotalRevenue, F::TotalExpenses, F::Ebitda],
        Reduction::Sum,
    )
}

/// Complete a table built on [`profit_sums`]: EBITDA falls back to revenue
/// less expenses, and the margin is Σ EBITDA / Σ revenue per group.
fn with_margin(mut table: AggTable) -> AggTable {
    if !table.has_column(F::Ebitda.header()) {
        table.derive(F::Ebitda.header(), |row| {
            row.get(F::TotalRevenue.header()) - row.get(F::TotalExpenses.header())
        });
    }
    table.derive_ratio(
        F::EbitdaMargin.header(),
        F::Ebitda.header(),
        F::TotalRevenue.header(),
        100.0,
    );
    table
}

/// Revenue, expenses and EBITDA per period with the margin from the sums.
pub fn revenue_trend(view: &JointView<'_>) -> Outcome<AggTable> {
    let key = monthly_key(view.context.granularity());
    view.financial
        .compute(&[], |rows, schema| {
            with_margin(aggregate(rows, &[key], &profit_sums(AggSpec::new(), schema)))
        })
        .and_then(Outcome::of_table)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItemReport {
    /// One column per line item, labelled by its display name
    pub by_month: AggTable,
    /// Σ per line item, largest first
    pub totals: Vec<Share>,
}

fn selected_service_lines<'s>(
    schema: &'s Schema<Financial>,
    wanted: Option<&str>,
) -> Vec<(usize, &'s DynamicColumn)> {
    schema
        .family(DynamicFamily::ServiceLine)
        .filter(|(_, column)| match wanted {
            None => true,
            Some(wanted) => {
                column.label.eq_ignore_ascii_case(wanted.trim()) || column.header == wanted.trim()
            }
        })
        .collect()
}

fn line_item_report(
    rows: &[&Row<Financial>],
    columns: &[(usize, &DynamicColumn)],
    key: GroupKey<Financial>,
) -> LineItemReport {
    let spec = columns
        .iter()
        .fold(AggSpec::new(), |spec, (index, column)| {
            spec.dynamic_sum(column.label.clone(), *index)
        });
    let by_month = aggregate(rows, &[key], &spec);

    let mut amounts: Vec<(String, f64)> = columns
        .iter()
        .map(|(_, column)| (column.label.clone(), by_month.sum_of(&column.label)))
        .collect();
    amounts.sort_by(|a, b| b.1.total_cmp(&a.1));
    let total = amounts.iter().map(|(_, amount)| amount).sum();

    LineItemReport {
        by_month,
        totals: Share::of_total(amounts, total),
    }
}

/// Service-line revenue per month, restricted to the context's service line
/// when one is set.
pub fn service_line_revenue(view: &JointView<'_>) -> Outcome<LineItemReport> {
    let key = monthly_key(view.context.granularity());
    let wanted = view.context.service_line();
    view.financial
        .compute(&[], |rows, schema| {
            let columns = selected_service_lines(schema, wanted);
            (!columns.is_empty()).then(|| line_item_report(rows, &columns, key))
        })
        .and_then(|report| report.map_or(Outcome::Empty, Outcome::Ready))
}

/// Service-line revenue totals per location.
pub fn service_line_by_location(view: &JointView<'_>) -> Outcome<AggTable> {
    let wanted = view.context.service_line();
    view.financial
        .compute(&[], |rows, schema| {
            let spec = selected_service_lines(schema, wanted)
                .into_iter()
                .fold(AggSpec::new(), |spec, (index, column)| {
                    spec.dynamic_sum(column.label.clone(), index)
                });
            if spec.columns().is_empty() {
                return AggTable::default();
            }
            aggregate(rows, &[GroupKey::Attribute(FinancialAttr::LocationName)], &spec)
        })
        .and_then(Outcome::of_table)
}

/// Revenue, expenses and EBITDA per location, highest EBITDA first.
pub fn location_profit(view: &JointView<'_>) -> Outcome<AggTable> {
    view.financial
        .compute(&[], |rows, schema| {
            let spec = profit_sums(AggSpec::new(), schema);
            let mut table = with_margin(aggregate(
                rows,
                &[GroupKey::Attribute(FinancialAttr::LocationName)],
                &spec,
            ));
            table.sort_by(F::Ebitda.header(), true);
            table
        })
        .and_then(Outcome::of_table)
}

/// Expense line items per month and in total.
pub fn expense_breakdown(view: &JointView<'_>) -> Outcome<LineItemReport> {
    let key = monthly_key(view.context.granularity());
    view.financial
        .compute(&[], |rows, schema| {
            let columns: Vec<_> = schema.family(DynamicFamily::Expense).collect();
            (!columns.is_empty()).then(|| line_item_report(rows, &columns, key))
        })
        .and_then(|report| report.map_or(Outcome::Empty, Outcome::Ready))
}

/// Mean labor and supply cost percentages per period.
pub fn cost_percentage_trend(view: &JointView<'_>) -> Outcome<AggTable> {
    let key = monthly_key(view.context.granularity());
    let columns = [F::LaborCostPercentage, F::SupplyCostPercentage];
    view.financial
        .compute(&columns, |rows, _| {
            let spec = AggSpec::new()
                .mean(F::LaborCostPercentage)
                .mean(F::SupplyCostPercentage);
            aggregate(rows, &[key], &spec)
        })
        .and_then(Outcome::of_table)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArAging {
    pub month: NaiveDate,
    pub buckets: Vec<Share>,
    pub total: f64,
    /// Share of receivables older than 90 days, percent
    pub share_over_90: f64,
}

const AR_BUCKETS: [(F, &str); 4] = [
    (F::ArCurrent, "Current"),
    (F::Ar31To60, "31-60 Days"),
    (F::Ar61To90, "61-90 Days"),
    (F::Ar91Plus, "90+ Days"),
];

/// Receivables by age for the latest month in view.
pub fn ar_aging(view: &JointView<'_>) -> Outcome<ArAging> {
    let required: Vec<F> = AR_BUCKETS.iter().map(|(column, _)| *column).collect();
    view.financial
        .compute(&required, |rows, schema| {
            let (month, latest) = latest_month(rows)?;
            let amounts: Vec<(String, f64)> = AR_BUCKETS
                .iter()
                .map(|(column, label)| (label.to_string(), sum_of(&latest, *column)))
                .collect();
            let total = if schema.has_measure(F::TotalAr) {
                sum_of(&latest, F::TotalAr)
            } else {
                amounts.iter().map(|(_, amount)| amount).sum()
            };
            let over_90 = sum_of(&latest, F::Ar91Plus);
            Some(ArAging {
                month,
                buckets: Share::of_total(amounts, total),
                total,
                share_over_90: percentage(over_90, total),
            })
        })
        .and_then(|aging| aging.map_or(Outcome::Empty, Outcome::Ready))
}

/// Receivable buckets summed per period.
pub fn ar_trend(view: &JointView<'_>) -> Outcome<AggTable> {
    let key = monthly_key(view.context.granularity());
    let required: Vec<F> = AR_BUCKETS.iter().map(|(column, _)| *column).collect();
    view.financial
        .compute(&required, |rows, schema| {
            let mut columns = required.clone();
            columns.push(F::TotalAr);
            aggregate(rows, &[key], &present(AggSpec::new(), schema, &columns, Reduction::Sum))
        })
        .and_then(Outcome::of_table)
}

/// Expected against actual collections per period.
pub fn collections_performance(view: &JointView<'_>) -> Outcome<AggTable> {
    let key = monthly_key(view.context.granularity());
    view.financial
        .compute(&[F::CollectionsExpected, F::CollectionsActual], |rows, schema| {
            let spec = AggSpec::new()
                .sum(F::CollectionsExpected)
                .sum(F::CollectionsActual);
            let spec = present(spec, schema, &[F::CollectionRate], Reduction::Mean);
            aggregate(rows, &[key], &spec)
        })
        .and_then(Outcome::of_table)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DenialReport {
    pub by_period: AggTable,
    /// Target denial rate, percent
    pub target: f64,
}

/// Claims submitted and denied per period with the denial rate.
pub fn claims_denials(view: &JointView<'_>, target: f64) -> Outcome<DenialReport> {
    let key = monthly_key(view.context.granularity());
    view.financial
        .compute(&[F::TotalClaimsSubmitted, F::ClaimsDenied], |rows, schema| {
            let spec = present(
                AggSpec::new(),
                schema,
                &[F::TotalClaimsSubmitted, F::ClaimsOutstanding, F::ClaimsDenied],
                Reduction::Sum,
            );
            let spec = present(spec, schema, &[F::AvgDaysToPayment], Reduction::Mean);
            let mut by_period = aggregate(rows, &[key], &spec);
            by_period.derive_ratio(
                "Denial_Rate",
                F::ClaimsDenied.header(),
                F::TotalClaimsSubmitted.header(),
                100.0,
            );
            by_period
        })
        .and_then(Outcome::of_table)
        .map(|by_period| DenialReport { by_period, target })
}

/// Payor amounts for the latest month, largest first.
pub fn payor_mix(view: &JointView<'_>) -> Outcome<Vec<Share>> {
    view.financial
        .compute(&[], |rows, schema| {
            let payors: Vec<_> = schema.family(DynamicFamily::Payor).collect();
            let (_, latest) = latest_month(rows)?;
            if payors.is_empty() {
                return None;
            }
            let mut amounts: Vec<(String, f64)> = payors
                .iter()
                .map(|(index, column)| {
                    let amount = latest.iter().filter_map(|row| row.dynamic(*index)).sum();
                    (column.label.clone(), amount)
                })
                .collect();
            amounts.sort_by(|a, b| b.1.total_cmp(&a.1));
            let total = amounts.iter().map(|(_, amount)| amount).sum();
            Some(Share::of_total(amounts, total))
        })
        .and_then(|mix| mix.map_or(Outcome::Empty, Outcome::Ready))
}

const KPI_TREND_COLUMNS: [F; 7] = [
    F::RevenuePerPatient,
    F::RevenuePerChair,
    F::RevenuePerHour,
    F::ChairUtilization,
    F::PatientRetentionRate,
    F::CaseAcceptanceRate,
    F::TreatmentCompletionRate,
];

const KPI_LOCATION_COLUMNS: [F; 4] = [
    F::RevenuePerPatient,
    F::RevenuePerChair,
    F::CollectionRate,
    F::ChairUtilization,
];

fn kpi_means(view: &JointView<'_>, keys: &[GroupKey<Financial>], columns: &[F]) -> Outcome<AggTable> {
    view.financial
        .compute(&[], |rows, schema| {
            let spec = present(AggSpec::new(), schema, columns, Reduction::Mean);
            if spec.columns().is_empty() {
                return AggTable::default();
            }
            aggregate(rows, keys, &spec)
        })
        .and_then(Outcome::of_table)
}

/// Per-unit and rate KPIs averaged per period; only recorded KPIs appear.
pub fn kpi_trends(view: &JointView<'_>) -> Outcome<AggTable> {
    kpi_means(view, &[monthly_key(view.context.granularity())], &KPI_TREND_COLUMNS)
}

/// Headline KPIs averaged per location, with the EBITDA margin recomputed
/// from each location's summed revenue and EBITDA.
pub fn kpi_by_location(view: &JointView<'_>) -> Outcome<AggTable> {
    view.financial
        .compute(&[], |rows, schema| {
            let spec = present(AggSpec::new(), schema, &KPI_LOCATION_COLUMNS, Reduction::Mean);
            let spec = profit_sums(spec, schema);
            with_margin(aggregate(
                rows,
                &[GroupKey::Attribute(FinancialAttr::LocationName)],
                &spec,
            ))
        })
        .and_then(Outcome::of_table)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkStatus {
    Good,
    NeedsImprovement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkRow {
    pub metric: &'static str,
    pub actual: f64,
    pub benchmark: f64,
    /// Actual as a percentage of the benchmark
    pub percent_of_benchmark: f64,
    pub direction: Direction,
    pub status: BenchmarkStatus,
}

impl BenchmarkRow {
    fn new(metric: F, actual: f64, benchmark: f64, direction: Direction) -> Self {
        let good = match direction {
            Direction::HigherIsBetter => actual >= benchmark,
            Direction::LowerIsBetter => actual <= benchmark,
        };
        Self {
            metric: metric.header(),
            actual,
            benchmark,
            percent_of_benchmark: percentage(actual, benchmark),
            direction,
            status: if good {
                BenchmarkStatus::Good
            } else {
                BenchmarkStatus::NeedsImprovement
            },
        }
    }
}

/// Latest-month KPIs against the configured benchmarks. Rates are averaged
/// over the month's rows except the EBITDA margin, which comes from the
/// month's summed EBITDA and revenue. KPIs the table does not record are
/// left out.
pub fn benchmark_comparison(
    view: &JointView<'_>,
    benchmarks: &BenchmarkConfig,
) -> Outcome<Vec<BenchmarkRow>> {
    use Direction::{HigherIsBetter, LowerIsBetter};
    let targets = [
        (F::LaborCostPercentage, benchmarks.labor_cost_percentage, LowerIsBetter),
        (F::SupplyCostPercentage, benchmarks.supply_cost_percentage, LowerIsBetter),
        (F::EbitdaMargin, benchmarks.ebitda_margin, HigherIsBetter),
        (F::CollectionRate, benchmarks.collection_rate, HigherIsBetter),
        (F::Dso, benchmarks.dso, LowerIsBetter),
        (F::ChairUtilization, benchmarks.chair_utilization, HigherIsBetter),
    ];
    view.financial
        .compute(&[], |rows, schema| {
            let (_, latest) = latest_month(rows)?;
            let comparison: Vec<BenchmarkRow> = targets
                .iter()
                .filter_map(|(metric, benchmark, direction)| {
                    let actual = match metric {
                        F::EbitdaMargin => Some(percentage(
                            ebitda_of(&latest, schema),
                            sum_of(&latest, F::TotalRevenue),
                        )),
                        _ => mean_of(&latest, schema, *metric),
                    };
                    actual.map(|actual| BenchmarkRow::new(*metric, actual, *benchmark, *direction))
                })
                .collect();
            (!comparison.is_empty()).then_some(comparison)
        })
        .and_then(|rows| rows.map_or(Outcome::Empty, Outcome::Ready))
}

/// Month-by-month revenue, EBITDA and headline rates.
pub fn monthly_summary(view: &JointView<'_>) -> Outcome<AggTable> {
    view.financial
        .compute(&[], |rows, schema| {
            let spec = profit_sums(AggSpec::new(), schema);
            let spec = present(spec, schema, &[F::CollectionRate, F::Dso], Reduction::Mean);
            with_margin(aggregate(rows, &[GroupKey::MonthYear], &spec))
        })
        .and_then(Outcome::of_table)
}
