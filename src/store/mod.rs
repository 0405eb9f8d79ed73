//! Record store: the five source tables, loaded once and read-only afterwards.
//!
//! Each table lives in a [`TableSlot`]: either a normalized [`Table`] or the
//! [`DataLoadError`](crate::errors::DataLoadError) that kept it from loading. A
//! failed table never turns into an empty one, so downstream views can tell
//! "unavailable" apart from "nothing matched the filter".
//!
//! # Example
//!
//! ```rust
//! use dentalytics::store::{DataSources, RecordStore, TableKind};
//!
//! let store = RecordStore::load(&DataSources::in_dir("/nonexistent"));
//! assert!(store.unavailable().iter().any(|e| e.table() == TableKind::Operations));
//! ```

pub mod cache;
pub mod columns;
pub mod export;
pub mod kinds;
pub mod loader;
mod monthly;
pub mod row;
pub mod table;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub use cache::StoreCache;
pub use columns::Column;
pub use kinds::{
    DynamicFamily, Equipment, EquipmentAttr, EquipmentMeasure, Financial, FinancialAttr,
    FinancialMeasure, Operations, OperationsAttr, OperationsMeasure, PatientVisits, Staff,
    StaffAttr, StaffMeasure, TableKind, TableSpec, VisitAttr, VisitDate, VisitMeasure,
};
pub use row::{Row, SourceRecord};
pub use table::{DynamicColumn, Schema, Table, TableSlot};

use crate::errors::DataLoadError;

pub type OperationsRecord = Row<Operations>;
pub type EquipmentRecord = Row<Equipment>;
pub type StaffRecord = Row<Staff>;
pub type PatientVisitRecord = Row<PatientVisits>;
pub type FinancialRecord = Row<Financial>;

/// File locations of the five source tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataSources {
    pub operations: PathBuf,
    pub equipment: PathBuf,
    pub staff: PathBuf,
    pub visits: PathBuf,
    pub financial: PathBuf,
}

impl DataSources {
    pub const OPERATIONS_FILE: &'static str = "Operations_Data.csv";
    pub const EQUIPMENT_FILE: &'static str = "Equipment_Usage_Data.csv";
    pub const STAFF_FILE: &'static str = "Staff_Hours_Data.csv";
    pub const VISITS_FILE: &'static str = "Pat_App_Data.csv";
    pub const FINANCIAL_FILE: &'static str = "Financial_Data.csv";

    /// The conventional file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            operations: dir.join(Self::OPERATIONS_FILE),
            equipment: dir.join(Self::EQUIPMENT_FILE),
            staff: dir.join(Self::STAFF_FILE),
            visits: dir.join(Self::VISITS_FILE),
            financial: dir.join(Self::FINANCIAL_FILE),
        }
    }
}

/// Location id to display name, gathered from every table that names locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocationDirectory {
    names: BTreeMap<String, String>,
}

impl LocationDirectory {
    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.names.entry(id.into()).or_insert_with(|| name.into());
    }

    fn absorb<T: TableSpec>(&mut self, slot: &TableSlot<T>) {
        let Some(table) = slot.table() else { return };
        for row in table.rows() {
            if let (Some(id), Some(name)) = (row.location_id(), row.location_name()) {
                self.insert(id, name);
            }
        }
    }

    pub fn name(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Ids whose display name is `name`.
    pub fn ids_named(&self, name: &str) -> BTreeSet<String> {
        self.names
            .iter()
            .filter(|(_, n)| n.as_str() == name)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Resolve a user-supplied location (id or display name) to location ids.
    pub fn resolve(&self, id_or_name: &str) -> BTreeSet<String> {
        if self.names.contains_key(id_or_name) {
            return BTreeSet::from([id_or_name.to_string()]);
        }
        self.ids_named(id_or_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(id, name)| (id.as_str(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Immutable snapshot of the five source tables.
#[derive(Debug)]
pub struct RecordStore {
    operations: TableSlot<Operations>,
    equipment: TableSlot<Equipment>,
    staff: TableSlot<Staff>,
    visits: TableSlot<PatientVisits>,
    financial: TableSlot<Financial>,
    locations: LocationDirectory,
}

impl RecordStore {
    /// Load every table; a table that fails keeps its error in its slot.
    pub fn load(sources: &DataSources) -> Self {
        let store = Self::from_slots(
            loader::load_path::<Operations>(&sources.operations).into(),
            loader::load_path::<Equipment>(&sources.equipment).into(),
            loader::load_path::<Staff>(&sources.staff).into(),
            loader::load_path::<PatientVisits>(&sources.visits).into(),
            loader::load_path::<Financial>(&sources.financial).into(),
        );
        for err in store.unavailable() {
            log::warn!("{err}");
        }
        store
    }

    pub fn from_slots(
        operations: TableSlot<Operations>,
        equipment: TableSlot<Equipment>,
        staff: TableSlot<Staff>,
        visits: TableSlot<PatientVisits>,
        financial: TableSlot<Financial>,
    ) -> Self {
        let mut locations = LocationDirectory::default();
        locations.absorb(&operations);
        locations.absorb(&visits);
        locations.absorb(&financial);

        Self {
            operations,
            equipment,
            staff,
            visits,
            financial,
            locations,
        }
    }

    pub fn operations(&self) -> &TableSlot<Operations> {
        &self.operations
    }

    pub fn equipment(&self) -> &TableSlot<Equipment> {
        &self.equipment
    }

    pub fn staff(&self) -> &TableSlot<Staff> {
        &self.staff
    }

    pub fn visits(&self) -> &TableSlot<PatientVisits> {
        &self.visits
    }

    pub fn financial(&self) -> &TableSlot<Financial> {
        &self.financial
    }

    /// Slot of any table, selected by type.
    pub fn slot<T: TableSpec>(&self) -> &TableSlot<T> {
        T::slot(self)
    }

    pub fn locations(&self) -> &LocationDirectory {
        &self.locations
    }

    /// Load failures, one per unavailable table.
    pub fn unavailable(&self) -> Vec<&DataLoadError> {
        [
            self.operations.error(),
            self.equipment.error(),
            self.staff.error(),
            self.visits.error(),
            self.financial.error(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Earliest and latest date across every loaded table.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        [
            self.operations.table().and_then(Table::date_span),
            self.equipment.table().and_then(Table::date_span),
            self.staff.table().and_then(Table::date_span),
            self.visits.table().and_then(Table::date_span),
            self.financial.table().and_then(Table::date_span),
        ]
        .into_iter()
        .flatten()
        .reduce(|(lo, hi), (l, h)| (lo.min(l), hi.max(h)))
    }
}
