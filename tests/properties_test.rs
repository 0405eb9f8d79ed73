//! Property-based tests for filtering, grouping, forecasting and scenarios
//!
//! These tests verify invariants that should hold for all inputs:
//! - Filtering only ever removes rows, and every kept row satisfies the context
//! - Weekday groups come out Monday first
//! - A constant history forecasts the same constant
//! - Zero adjustments leave the baseline unchanged

use chrono::{Datelike, Days, NaiveDate};
use dentalytics::aggregation::{aggregate, AggSpec, GroupKey};
use dentalytics::core::dates::weekday_rank;
use dentalytics::store::{LocationDirectory, Row, Schema, Staff, StaffAttr, StaffMeasure, Table};
use dentalytics::{evaluate, forecast, Baseline, FilterContext, MonthlySeries, ScenarioDeltas};
use proptest::prelude::*;

const ROLES: &[&str] = &["Dentist", "Hygienist", "Assistant"];
const LOCATIONS: &[&str] = &["L1", "L2", "L3"];

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn shift() -> impl Strategy<Value = (u64, usize, usize, f64)> {
    (0u64..90, 0..LOCATIONS.len(), 0..ROLES.len(), 0.0f64..12.0)
}

fn staff_table(shifts: &[(u64, usize, usize, f64)]) -> Table<Staff> {
    let rows = shifts
        .iter()
        .map(|(offset, location, role, hours)| {
            let date = base_date().checked_add_days(Days::new(*offset)).unwrap();
            Row::<Staff>::on(date)
                .with_attr(StaffAttr::LocationId, LOCATIONS[*location])
                .with_attr(StaffAttr::StaffRole, ROLES[*role])
                .with_measure(StaffMeasure::HoursWorked, *hours)
        })
        .collect();
    Table::from_rows("staff.csv", Schema::complete(), rows)
}

fn baseline() -> impl Strategy<Value = Baseline> {
    (
        1.0f64..1_000_000.0,
        0.0f64..1_000_000.0,
        0.0f64..60.0,
        0.0f64..20.0,
        0.0f64..100.0,
    )
        .prop_map(|(revenue, expenses, labor, supply, rate)| Baseline {
            revenue,
            expenses,
            labor_cost_percentage: labor,
            supply_cost_percentage: supply,
            collection_rate: rate,
        })
}

proptest! {
    /// Property: every row a context keeps satisfies each of its set fields
    #[test]
    fn prop_filter_keeps_only_matching_rows(
        shifts in prop::collection::vec(shift(), 0..60),
        start in 0u64..90,
        span in 0u64..60,
        location in prop::option::of(0..LOCATIONS.len()),
        role in prop::option::of(0..ROLES.len()),
    ) {
        let table = staff_table(&shifts);
        let from = base_date().checked_add_days(Days::new(start)).unwrap();
        let to = from.checked_add_days(Days::new(span)).unwrap();

        let mut ctx = FilterContext::new().with_date_range(from, to);
        if let Some(location) = location {
            ctx = ctx.with_location(LOCATIONS[location]);
        }
        if let Some(role) = role {
            ctx = ctx.with_staff_role(ROLES[role]);
        }

        let kept = ctx.apply(&table, &LocationDirectory::default());
        prop_assert!(kept.len() <= table.len());
        for row in kept {
            let date = row.date().unwrap();
            prop_assert!(from <= date && date <= to);
            if let Some(location) = location {
                prop_assert_eq!(row.location_id(), Some(LOCATIONS[location]));
            }
            if let Some(role) = role {
                prop_assert_eq!(row.attr(StaffAttr::StaffRole), Some(ROLES[role]));
            }
        }
    }

    /// Property: loosening a context never drops rows
    #[test]
    fn prop_unset_context_is_a_superset(
        shifts in prop::collection::vec(shift(), 0..60),
        role in 0..ROLES.len(),
    ) {
        let table = staff_table(&shifts);
        let directory = LocationDirectory::default();
        let narrow = FilterContext::new().with_staff_role(ROLES[role]).apply(&table, &directory);
        let wide = FilterContext::new().apply(&table, &directory);

        prop_assert_eq!(wide.len(), table.len());
        prop_assert!(narrow.len() <= wide.len());
    }

    /// Property: weekday groups are ordered Monday first and never repeat
    #[test]
    fn prop_weekday_groups_are_monday_first(
        shifts in prop::collection::vec(shift(), 1..60),
    ) {
        let table = staff_table(&shifts);
        let rows: Vec<&Row<Staff>> = table.rows().iter().collect();
        let grouped = aggregate(&rows, &[GroupKey::DayName], &AggSpec::new().sum(StaffMeasure::HoursWorked));

        let ranks: Vec<usize> = grouped
            .labels()
            .iter()
            .map(|label| weekday_rank(label).unwrap())
            .collect();
        prop_assert!(ranks.windows(2).all(|pair| pair[0] < pair[1]));

        let distinct_days: std::collections::HashSet<_> =
            rows.iter().filter_map(|row| row.date()).map(|d| d.weekday()).collect();
        prop_assert_eq!(ranks.len(), distinct_days.len());
    }

    /// Property: a constant history forecasts that constant inside its band
    #[test]
    fn prop_constant_history_forecasts_flat(
        level in 0.0f64..1_000_000.0,
        months in 6usize..24,
        periods in 1usize..6,
        window in 1usize..6,
    ) {
        let series = MonthlySeries::from_values(base_date(), &vec![level; months]);
        let projected = forecast(&series, periods, window).available().unwrap();

        prop_assert_eq!(projected.point_estimates.len(), periods);
        for (i, point) in projected.point_estimates.iter().enumerate() {
            prop_assert!((point - level).abs() <= level * 1e-9 + 1e-9);
            prop_assert!(projected.lower_band[i] <= *point);
            prop_assert!(*point <= projected.upper_band[i]);
        }
    }

    /// Property: zero adjustments reproduce the baseline result
    #[test]
    fn prop_zero_deltas_are_identity(baseline in baseline()) {
        prop_assert_eq!(evaluate(&baseline, &ScenarioDeltas::default()), baseline.result());
    }

    /// Property: evaluation is deterministic for any adjustment in range
    #[test]
    fn prop_evaluation_is_idempotent(
        baseline in baseline(),
        revenue in -20.0f64..=20.0,
        labor in -10.0f64..=10.0,
        supply in -10.0f64..=10.0,
        rate in -10.0f64..=10.0,
    ) {
        let deltas = ScenarioDeltas::default()
            .with_revenue_change(revenue)
            .with_labor_cost_change(labor)
            .with_supply_cost_change(supply)
            .with_collection_rate_change(rate);

        prop_assert_eq!(evaluate(&baseline, &deltas), evaluate(&baseline, &deltas));
    }

    /// Property: cutting labor cost never raises expenses
    #[test]
    fn prop_labor_cuts_lower_expenses(baseline in baseline(), cut in 0.0f64..=10.0) {
        let deltas = ScenarioDeltas::default().with_labor_cost_change(-cut);
        let result = evaluate(&baseline, &deltas);
        prop_assert!(result.expenses <= baseline.expenses + 1e-6);
    }
}
