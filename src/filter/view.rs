use chrono::NaiveDate;
use csv::StringRecord;
use std::collections::BTreeSet;

use super::context::FilterContext;
use super::predicates::{in_date_set, in_location_set};
use super::sampling::{sample_dates, SampledDates, SamplingPolicy};
use super::Outcome;
use crate::errors::DataLoadError;
use crate::store::{
    Equipment, Financial, LocationDirectory, Operations, PatientVisits, RecordStore, Row, Schema,
    Staff, TableSlot, TableSpec,
};

/// One table seen through a filter context.
#[derive(Debug)]
pub enum TableView<'a, T: TableSpec> {
    Unavailable(&'a DataLoadError),
    Rows {
        schema: &'a Schema<T>,
        header: Option<&'a StringRecord>,
        rows: Vec<&'a Row<T>>,
    },
}

impl<'a, T: TableSpec> TableView<'a, T> {
    pub fn filter(slot: &'a TableSlot<T>, ctx: &FilterContext, directory: &LocationDirectory) -> Self {
        match slot {
            TableSlot::Loaded(table) => Self::Rows {
                schema: table.schema(),
                header: table.header(),
                rows: ctx.apply(table, directory),
            },
            TableSlot::Unavailable(err) => Self::Unavailable(err),
        }
    }

    /// Filtered rows; an unavailable table has none.
    pub fn rows(&self) -> &[&'a Row<T>] {
        match self {
            Self::Rows { rows, .. } => rows,
            Self::Unavailable(_) => &[],
        }
    }

    pub fn schema(&self) -> Option<&'a Schema<T>> {
        match self {
            Self::Rows { schema, .. } => Some(*schema),
            Self::Unavailable(_) => None,
        }
    }

    /// Source header of the underlying table.
    pub fn header(&self) -> Option<&'a StringRecord> {
        match self {
            Self::Rows { header, .. } => *header,
            Self::Unavailable(_) => None,
        }
    }

    pub fn error(&self) -> Option<&'a DataLoadError> {
        match self {
            Self::Unavailable(err) => Some(*err),
            Self::Rows { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Rows { .. })
    }

    /// Distinct location ids among the filtered rows, `None` when unavailable.
    pub fn location_ids(&self) -> Option<BTreeSet<String>> {
        match self {
            Self::Rows { rows, .. } => Some(
                rows.iter()
                    .filter_map(|row| row.location_id())
                    .map(str::to_string)
                    .collect(),
            ),
            Self::Unavailable(_) => None,
        }
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows().iter().filter_map(|row| row.date())
    }

    /// Drop filtered rows failing `keep`.
    pub fn restrict(&mut self, keep: impl Fn(&Row<T>) -> bool) {
        if let Self::Rows { rows, .. } = self {
            rows.retain(|row| keep(row));
        }
    }

    /// Run `f` over the filtered rows when the table is available, carries
    /// every column in `required` and has at least one row.
    pub fn compute<R>(
        &self,
        required: &[T::Measure],
        f: impl FnOnce(&[&'a Row<T>], &'a Schema<T>) -> R,
    ) -> Outcome<R> {
        match self {
            Self::Unavailable(err) => Outcome::unavailable(err),
            Self::Rows { schema, .. } if !schema.has_all_measures(required) => Outcome::Empty,
            Self::Rows { rows, .. } if rows.is_empty() => Outcome::Empty,
            Self::Rows { schema, rows, .. } => Outcome::Ready(f(rows, *schema)),
        }
    }
}

/// All five tables under one filter context.
///
/// A day-of-week selection narrows Operations only. When a location is
/// selected, Equipment, Staff and Patient visits are further restricted to the
/// location ids present in the filtered Operations table (the filtered
/// Financial table when Operations is unavailable).
#[derive(Debug)]
pub struct JointView<'a> {
    pub context: &'a FilterContext,
    pub locations: &'a LocationDirectory,
    pub operations: TableView<'a, Operations>,
    pub equipment: TableView<'a, Equipment>,
    pub staff: TableView<'a, Staff>,
    pub visits: TableView<'a, PatientVisits>,
    pub financial: TableView<'a, Financial>,
    sampled: Option<SampledDates>,
}

impl<'a> JointView<'a> {
    pub fn build(store: &'a RecordStore, ctx: &'a FilterContext) -> Self {
        let directory = store.locations();
        let operations = TableView::filter(store.operations(), ctx, directory);
        let financial = TableView::filter(store.financial(), ctx, directory);
        let mut visits = TableView::filter(store.visits(), ctx, directory);
        let mut equipment = TableView::filter(store.equipment(), ctx, directory);
        let mut staff = TableView::filter(store.staff(), ctx, directory);

        if ctx.location().selected().is_some() {
            let anchor = operations.location_ids().or_else(|| financial.location_ids());
            if let Some(ids) = &anchor {
                equipment.restrict(|row| in_location_set(row, Some(ids)));
                staff.restrict(|row| in_location_set(row, Some(ids)));
                visits.restrict(|row| in_location_set(row, Some(ids)));
            }
        }

        Self {
            context: ctx,
            locations: directory,
            operations,
            equipment,
            staff,
            visits,
            financial,
            sampled: None,
        }
    }

    /// Like [`build`](Self::build), then down-sample the daily tables to one
    /// shared date set when the range is longer than `policy` allows.
    ///
    /// The range is the context's date range, or the span of the filtered
    /// dates when the context has none. Sampled dates come from Operations, or
    /// the first available daily table. Financial rows are monthly and are not
    /// sampled.
    pub fn build_sampled(store: &'a RecordStore, ctx: &'a FilterContext, policy: SamplingPolicy) -> Self {
        let mut view = Self::build(store, ctx);

        let anchor_dates: Vec<NaiveDate> = if view.operations.is_available() {
            view.operations.dates().collect()
        } else if view.equipment.is_available() {
            view.equipment.dates().collect()
        } else if view.staff.is_available() {
            view.staff.dates().collect()
        } else {
            view.visits.dates().collect()
        };

        let days = match ctx.date_range() {
            Some(range) => range.days(),
            None => span_days(&anchor_dates),
        };
        if !policy.applies(days) {
            return view;
        }

        let rate = policy.rate(days);
        let dates = sample_dates(anchor_dates, rate);
        log::debug!(
            "Sampling {days}-day range at every {rate} dates ({} kept)",
            dates.len()
        );

        view.operations.restrict(|row| in_date_set(row, Some(&dates)));
        view.equipment.restrict(|row| in_date_set(row, Some(&dates)));
        view.staff.restrict(|row| in_date_set(row, Some(&dates)));
        view.visits.restrict(|row| in_date_set(row, Some(&dates)));
        view.sampled = Some(SampledDates { rate, dates });
        view
    }

    pub fn sampled(&self) -> Option<&SampledDates> {
        self.sampled.as_ref()
    }
}

fn span_days(dates: &[NaiveDate]) -> i64 {
    match (dates.iter().min(), dates.iter().max()) {
        (Some(lo), Some(hi)) => (*hi - *lo).num_days(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EquipmentAttr, OperationsAttr, OperationsMeasure, Table, TableKind};
    use chrono::Days;
    use std::path::Path;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn missing<T: TableSpec>() -> TableSlot<T> {
        TableSlot::Unavailable(DataLoadError::empty(T::KIND, Path::new("none.csv")))
    }

    fn store(days: u64) -> RecordStore {
        let start = ymd(2024, 1, 1);
        let mut ops = Vec::new();
        let mut equipment = Vec::new();
        for d in 0..days {
            let date = start + Days::new(d);
            for (id, name) in [("L1", "Downtown"), ("L2", "Uptown")] {
                ops.push(
                    Row::<Operations>::on(date)
                        .with_attr(OperationsAttr::LocationId, id)
                        .with_attr(OperationsAttr::LocationName, name)
                        .with_measure(OperationsMeasure::ChairUtilization, 80.0),
                );
                equipment.push(
                    Row::<Equipment>::on(date)
                        .with_attr(EquipmentAttr::LocationId, id)
                        .with_attr(EquipmentAttr::EquipmentType, "X-Ray"),
                );
            }
        }
        RecordStore::from_slots(
            Table::from_rows("ops.csv", Schema::complete(), ops).into(),
            Table::from_rows("eq.csv", Schema::complete(), equipment).into(),
            missing(),
            missing(),
            missing(),
        )
    }

    #[test]
    fn equipment_follows_operations_locations() {
        let store = store(3);
        let ctx = FilterContext::new().with_location("Uptown");
        let view = JointView::build(&store, &ctx);

        assert_eq!(view.operations.rows().len(), 3);
        assert_eq!(view.equipment.rows().len(), 3);
        assert!(view
            .equipment
            .rows()
            .iter()
            .all(|row| row.attr(EquipmentAttr::LocationId) == Some("L2")));
    }

    #[test]
    fn unavailable_tables_stay_unavailable() {
        let store = store(1);
        let ctx = FilterContext::new();
        let view = JointView::build(&store, &ctx);

        let err = view.staff.error().map(DataLoadError::table);
        assert_eq!(err, Some(TableKind::Staff));
        let outcome = view.staff.compute(&[], |rows, _| rows.len());
        assert!(outcome.is_unavailable());
    }

    #[test]
    fn long_ranges_share_one_sampled_date_set() {
        let store = store(401);
        let ctx = FilterContext::new().with_date_range(ymd(2024, 1, 1), ymd(2025, 2, 4));
        let view = JointView::build_sampled(&store, &ctx, SamplingPolicy::default());

        let sampled = view.sampled().map(|s| s.rate);
        assert_eq!(sampled, Some(2));
        let ops: BTreeSet<_> = view.operations.dates().collect();
        let eq: BTreeSet<_> = view.equipment.dates().collect();
        assert_eq!(ops, eq);
        assert_eq!(ops.len(), 201);
    }

    #[test]
    fn short_ranges_are_not_sampled() {
        let store = store(10);
        let ctx = FilterContext::new().with_date_range(ymd(2024, 1, 1), ymd(2024, 1, 10));
        let view = JointView::build_sampled(&store, &ctx, SamplingPolicy::default());

        assert!(view.sampled().is_none());
        assert_eq!(view.operations.rows().len(), 20);
    }

    #[test]
    fn weekday_narrows_operations_only() {
        // 2024-01-01 is a Monday
        let store = store(7);
        let ctx = FilterContext::new().with_day_of_week(chrono::Weekday::Mon);
        let view = JointView::build(&store, &ctx);

        assert_eq!(view.operations.rows().len(), 2);
        assert!(view.operations.dates().all(|date| date == ymd(2024, 1, 1)));
        assert_eq!(view.equipment.rows().len(), 14);
    }

    #[test]
    fn location_restriction_needs_a_selected_location() {
        let day = ymd(2024, 1, 1);
        let ops = vec![Row::<Operations>::on(day)
            .with_attr(OperationsAttr::LocationId, "L1")
            .with_attr(OperationsAttr::LocationName, "Downtown")];
        let equipment = ["L1", "L9"]
            .into_iter()
            .map(|id| {
                Row::<Equipment>::on(day)
                    .with_attr(EquipmentAttr::LocationId, id)
                    .with_attr(EquipmentAttr::EquipmentType, "Chair")
            })
            .collect();
        let store = RecordStore::from_slots(
            Table::from_rows("ops.csv", Schema::complete(), ops).into(),
            Table::from_rows("eq.csv", Schema::complete(), equipment).into(),
            missing(),
            missing(),
            missing(),
        );

        let all = FilterContext::new();
        assert_eq!(JointView::build(&store, &all).equipment.rows().len(), 2);

        let downtown = FilterContext::new().with_location("Downtown");
        let view = JointView::build(&store, &downtown);
        assert_eq!(view.equipment.rows().len(), 1);
        assert_eq!(view.equipment.rows()[0].location_id(), Some("L1"));
    }

    #[test]
    fn staff_role_does_not_filter_other_tables() {
        let store = store(2);
        let ctx = FilterContext::new().with_staff_role("Dentist");
        let view = JointView::build(&store, &ctx);
        assert_eq!(view.operations.rows().len(), 4);
        assert_eq!(view.equipment.rows().len(), 4);
    }
}
