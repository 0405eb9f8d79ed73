//! Row predicates behind [`FilterContext::apply`](super::FilterContext::apply).
//!
//! Each predicate answers for one filter field. An unset field never rejects
//! a row, and a field the table has no column for is not applied to that table.

use chrono::{NaiveDate, Weekday};
use std::collections::BTreeSet;

use super::context::DateRange;
use crate::core::dates::day_name;
use crate::store::{Row, TableSpec};

/// Inclusive date bound. Rows without a parsed date never satisfy a bound.
pub fn within_dates<T: TableSpec>(row: &Row<T>, range: Option<&DateRange>) -> bool {
    match range {
        None => true,
        Some(range) => row.date().is_some_and(|date| range.contains(date)),
    }
}

pub fn on_weekday<T: TableSpec>(row: &Row<T>, weekday: Option<Weekday>) -> bool {
    match weekday {
        None => true,
        Some(weekday) => row
            .calendar()
            .is_some_and(|calendar| calendar.day_name == day_name(weekday)),
    }
}

/// Equality on an optional attribute column.
pub fn attribute_equals<T: TableSpec>(
    row: &Row<T>,
    column: Option<T::Attribute>,
    wanted: Option<&str>,
) -> bool {
    match (column, wanted) {
        (Some(column), Some(wanted)) => row.attr(column) == Some(wanted),
        _ => true,
    }
}

/// Location match by id, by display name, or by membership in `ids`.
pub fn at_location<T: TableSpec>(
    row: &Row<T>,
    selected: Option<&str>,
    ids: &BTreeSet<String>,
) -> bool {
    let Some(selected) = selected else {
        return true;
    };
    match row.location_id() {
        Some(id) if id == selected || ids.contains(id) => true,
        _ => row.location_name() == Some(selected),
    }
}

/// Membership in a restricting id set; `None` restricts nothing.
pub fn in_location_set<T: TableSpec>(row: &Row<T>, ids: Option<&BTreeSet<String>>) -> bool {
    match ids {
        None => true,
        Some(ids) => row.location_id().is_some_and(|id| ids.contains(id)),
    }
}

/// Membership in a sampled date set; `None` restricts nothing.
pub fn in_date_set<T: TableSpec>(row: &Row<T>, dates: Option<&BTreeSet<NaiveDate>>) -> bool {
    match dates {
        None => true,
        Some(dates) => row.date().is_some_and(|date| dates.contains(&date)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dates::ParsedDate;
    use crate::core::dates::DateParseFailure;
    use crate::store::{Operations, OperationsAttr, Staff, StaffAttr};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn undated_rows_fail_any_date_bound() {
        let row = Row::<Staff>::new(ParsedDate::Null(DateParseFailure::Empty));
        let range = DateRange::new(ymd(2024, 1, 1), ymd(2024, 12, 31));

        assert!(within_dates(&row, None));
        assert!(!within_dates(&row, Some(&range)));
        assert!(!on_weekday(&row, Some(Weekday::Mon)));
    }

    #[test]
    fn range_is_inclusive() {
        let range = DateRange::new(ymd(2024, 1, 1), ymd(2024, 1, 31));
        assert!(within_dates(&Row::<Staff>::on(ymd(2024, 1, 31)), Some(&range)));
        assert!(!within_dates(&Row::<Staff>::on(ymd(2024, 2, 1)), Some(&range)));
    }

    #[test]
    fn location_matches_id_name_or_resolved_ids() {
        let row = Row::<Operations>::on(ymd(2024, 1, 1))
            .with_attr(OperationsAttr::LocationId, "L1")
            .with_attr(OperationsAttr::LocationName, "Downtown");
        let none = BTreeSet::new();
        let resolved = BTreeSet::from(["L1".to_string()]);

        assert!(at_location(&row, Some("L1"), &none));
        assert!(at_location(&row, Some("Downtown"), &none));
        assert!(at_location(&row, Some("Main Office"), &resolved));
        assert!(!at_location(&row, Some("L2"), &none));
    }

    #[test]
    fn role_filter_ignores_tables_without_role() {
        let shift = Row::<Staff>::on(ymd(2024, 1, 1)).with_attr(StaffAttr::StaffRole, "Dentist");
        assert!(attribute_equals(&shift, Some(StaffAttr::StaffRole), Some("Dentist")));
        assert!(!attribute_equals(&shift, Some(StaffAttr::StaffRole), Some("Hygienist")));
        assert!(attribute_equals(&shift, None, Some("Hygienist")));
    }
}
