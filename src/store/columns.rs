//! Typed column identifiers.
//!
//! Each source table names its fixed columns through an enum generated by
//! [`define_columns!`]. The enum discriminant doubles as the slot index inside a
//! [`Row`](super::Row), so column lookups never go through string matching once a
//! table is loaded.

use std::fmt::Debug;
use std::hash::Hash;

/// A fixed, named column of a source table.
pub trait Column: Copy + Eq + Hash + Ord + Debug + 'static {
    /// Every column of this kind, in declaration order.
    const ALL: &'static [Self];

    /// Header text as it appears in the source CSV.
    fn header(self) -> &'static str;

    /// Slot index inside a row.
    fn index(self) -> usize;

    fn from_header(header: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.header() == header)
    }

    fn count() -> usize {
        Self::ALL.len()
    }
}

/// Declare a column enum together with its [`Column`] impl.
///
/// ```ignore
/// define_columns! {
///     pub enum StaffMeasure {
///         HoursWorked => "Hours_Worked",
///         LaborCost => "Labor_Cost",
///     }
/// }
/// ```
macro_rules! define_columns {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $header:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $crate::store::columns::Column for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn header(self) -> &'static str {
                match self {
                    $(Self::$variant => $header),+
                }
            }

            fn index(self) -> usize {
                self as usize
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::store::columns::Column::header(*self))
            }
        }
    };
}

pub(crate) use define_columns;

/// Column kind for tables that carry no secondary date columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NoColumns {}

impl Column for NoColumns {
    const ALL: &'static [Self] = &[];

    fn header(self) -> &'static str {
        match self {}
    }

    fn index(self) -> usize {
        match self {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    define_columns! {
        enum Sample {
            First => "First_Col",
            Second => "Second_Col",
        }
    }

    #[test]
    fn header_and_index_follow_declaration() {
        assert_eq!(Sample::First.header(), "First_Col");
        assert_eq!(Sample::Second.index(), 1);
        assert_eq!(Sample::count(), 2);
        assert_eq!(Sample::Second.to_string(), "Second_Col");
    }

    #[test]
    fn from_header_is_exact() {
        assert_eq!(Sample::from_header("Second_Col"), Some(Sample::Second));
        assert_eq!(Sample::from_header("second_col"), None);
    }

    #[test]
    fn empty_column_kind_has_no_members() {
        assert_eq!(NoColumns::count(), 0);
    }
}
