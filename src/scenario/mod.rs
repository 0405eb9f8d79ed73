//! What-if evaluation of percentage adjustments against a baseline month.
//!
//! The baseline is the mean of the latest month's financial rows in the
//! filtered view. Expenses split into a labor portion, a supply portion and an
//! unchanged remainder using the baseline cost percentages; each delta scales
//! only its own portion. EBITDA is recomputed from collections rather than
//! revenue. A comparison also carries the baseline's reported EBITDA, revenue
//! less expenses, as the financial statements state it.
//!
//! ```rust
//! use dentalytics::scenario::{evaluate, Baseline, ScenarioDeltas};
//!
//! let baseline = Baseline {
//!     revenue: 100_000.0,
//!     expenses: 80_000.0,
//!     labor_cost_percentage: 50.0,
//!     supply_cost_percentage: 10.0,
//!     collection_rate: 95.0,
//! };
//! let result = evaluate(&baseline, &ScenarioDeltas::default().with_labor_cost_change(-10.0));
//! assert_eq!(result.expenses, 76_000.0);
//! assert_eq!(result.ebitda, 19_000.0);
//! ```

pub mod deltas;

use chrono::NaiveDate;
use serde::Serialize;

pub use deltas::{ScenarioDeltas, ScenarioLimits};

use crate::errors::Result;
use crate::filter::{JointView, Outcome};
use crate::metrics::{latest_month, mean_of};
use crate::store::FinancialMeasure as F;

/// Snapshot the adjustments apply to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Baseline {
    pub revenue: f64,
    pub expenses: f64,
    /// Zero when the source has no labor cost column
    pub labor_cost_percentage: f64,
    pub supply_cost_percentage: f64,
    /// Zero when the source has no collection rate column; collections then
    /// equal revenue
    pub collection_rate: f64,
}

impl Baseline {
    /// The baseline evaluated with no adjustments.
    pub fn result(&self) -> ScenarioResult {
        evaluate(self, &ScenarioDeltas::default())
    }

    /// Revenue less expenses, before any collection rate applies.
    pub fn reported_ebitda(&self) -> f64 {
        self.revenue - self.expenses
    }

    pub fn reported_ebitda_margin(&self) -> f64 {
        margin(self.reported_ebitda(), self.revenue)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScenarioResult {
    pub revenue: f64,
    pub expenses: f64,
    pub collections: f64,
    /// Collections less expenses
    pub ebitda: f64,
    /// EBITDA as a percentage of revenue; 0 when revenue is not positive
    pub ebitda_margin: f64,
}

impl ScenarioResult {
    fn minus(&self, other: &Self) -> Self {
        Self {
            revenue: self.revenue - other.revenue,
            expenses: self.expenses - other.expenses,
            collections: self.collections - other.collections,
            ebitda: self.ebitda - other.ebitda,
            ebitda_margin: self.ebitda_margin - other.ebitda_margin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioComparison {
    /// First day of the month the baseline was taken from
    pub month: Option<NaiveDate>,
    pub inputs: Baseline,
    pub deltas: ScenarioDeltas,
    /// Baseline EBITDA on the statements' basis, revenue less expenses
    pub reported_ebitda: f64,
    pub reported_ebitda_margin: f64,
    /// The baseline evaluated on the collections basis, comparable with
    /// `scenario`
    pub baseline: ScenarioResult,
    pub scenario: ScenarioResult,
    /// `scenario − baseline`, field by field
    pub differences: ScenarioResult,
}

/// Apply `deltas` to `baseline`.
pub fn evaluate(baseline: &Baseline, deltas: &ScenarioDeltas) -> ScenarioResult {
    let revenue = baseline.revenue * (1.0 + deltas.revenue_change / 100.0);

    let labor = portion(baseline.expenses, baseline.labor_cost_percentage);
    let supply = portion(baseline.expenses, baseline.supply_cost_percentage);
    let other = baseline.expenses - labor - supply;
    let expenses = labor * (1.0 + deltas.labor_cost_change / 100.0)
        + supply * (1.0 + deltas.supply_cost_change / 100.0)
        + other;

    let collections = if baseline.collection_rate > 0.0 {
        revenue * (baseline.collection_rate + deltas.collection_rate_change) / 100.0
    } else {
        revenue
    };
    let ebitda = collections - expenses;

    ScenarioResult {
        revenue,
        expenses,
        collections,
        ebitda,
        ebitda_margin: margin(ebitda, revenue),
    }
}

fn margin(ebitda: f64, revenue: f64) -> f64 {
    if revenue > 0.0 {
        ebitda / revenue * 100.0
    } else {
        0.0
    }
}

fn portion(expenses: f64, percentage: f64) -> f64 {
    if percentage > 0.0 {
        expenses * percentage / 100.0
    } else {
        0.0
    }
}

pub fn compare(baseline: &Baseline, deltas: &ScenarioDeltas) -> ScenarioComparison {
    let base = baseline.result();
    let scenario = evaluate(baseline, deltas);
    ScenarioComparison {
        month: None,
        inputs: *baseline,
        deltas: *deltas,
        reported_ebitda: baseline.reported_ebitda(),
        reported_ebitda_margin: baseline.reported_ebitda_margin(),
        differences: scenario.minus(&base),
        baseline: base,
        scenario,
    }
}

/// Means of the latest month's financial rows in the view.
pub fn baseline_from_view(view: &JointView<'_>) -> Outcome<(NaiveDate, Baseline)> {
    view.financial
        .compute(&[F::TotalRevenue], |rows, schema| {
            let (month, latest) = latest_month(rows)?;
            let mean = |column: F| mean_of(&latest, schema, column).unwrap_or(0.0);
            Some((
                month,
                Baseline {
                    revenue: mean(F::TotalRevenue),
                    expenses: mean(F::TotalExpenses),
                    labor_cost_percentage: mean(F::LaborCostPercentage),
                    supply_cost_percentage: mean(F::SupplyCostPercentage),
                    collection_rate: mean(F::CollectionRate),
                },
            ))
        })
        .and_then(|found| found.map_or(Outcome::Empty, Outcome::Ready))
}

/// Validate `deltas` and compare them against the view's baseline month.
pub fn run_scenario(
    view: &JointView<'_>,
    deltas: &ScenarioDeltas,
    limits: &ScenarioLimits,
) -> Result<Outcome<ScenarioComparison>> {
    deltas.validate(limits)?;
    Ok(baseline_from_view(view).map(|(month, baseline)| {
        log::debug!("Scenario baseline month {month}: {baseline:?}");
        ScenarioComparison {
            month: Some(month),
            ..compare(&baseline, deltas)
        }
    }))
}
