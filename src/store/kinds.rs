//! The five source tables and their column layouts.

use serde::Serialize;
use std::fmt;

use super::columns::{define_columns, Column, NoColumns};
use super::table::{Table, TableSlot};
use super::RecordStore;

/// Identifies one of the five source tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Operations,
    Equipment,
    Staff,
    PatientVisits,
    Financial,
}

impl TableKind {
    pub const ALL: [TableKind; 5] = [
        TableKind::Operations,
        TableKind::Equipment,
        TableKind::Staff,
        TableKind::PatientVisits,
        TableKind::Financial,
    ];
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Operations => "Operations",
            Self::Equipment => "Equipment",
            Self::Staff => "Staff",
            Self::PatientVisits => "Patient visits",
            Self::Financial => "Financial",
        };
        f.write_str(name)
    }
}

/// Discovered column family of the Financial table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicFamily {
    /// `Revenue_<service line>`
    ServiceLine,
    /// `Payor_<payor>`
    Payor,
    /// Expense line items
    Expense,
}

/// Static description of a source table: its columns, which of them are
/// required, and any table-specific normalization run after parsing.
pub trait TableSpec:
    fmt::Debug + Clone + Copy + Default + PartialEq + Eq + std::hash::Hash + Send + Sync + 'static
{
    type Measure: Column;
    type Attribute: Column;
    type DateField: Column;

    const KIND: TableKind;
    const DATE_COLUMN: &'static str;
    const LOCATION_ID: Self::Attribute;
    const LOCATION_NAME: Option<Self::Attribute> = None;
    const STAFF_ROLE: Option<Self::Attribute> = None;
    const PROVIDER: Option<Self::Attribute> = None;
    const INSURANCE_PROVIDER: Option<Self::Attribute> = None;
    /// Whether a day-of-week selection narrows this table
    const WEEKDAY_FILTERED: bool = false;
    const REQUIRED_ATTRIBUTES: &'static [Self::Attribute];
    const REQUIRED_MEASURES: &'static [Self::Measure] = &[];

    /// Headers the table cannot be interpreted without.
    fn required_headers() -> Vec<&'static str> {
        std::iter::once(Self::DATE_COLUMN)
            .chain(Self::REQUIRED_ATTRIBUTES.iter().map(|c| c.header()))
            .chain(Self::REQUIRED_MEASURES.iter().map(|c| c.header()))
            .collect()
    }

    /// Family of a header that is not one of the fixed columns.
    fn classify_dynamic(_header: &str) -> Option<DynamicFamily> {
        None
    }

    /// Post-parse normalization pass.
    fn normalize(_table: &mut Table<Self>) {}

    /// This table's slot in a store.
    fn slot(store: &RecordStore) -> &TableSlot<Self>;
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Daily per-location operations snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Operations;

define_columns! {
    pub enum OperationsAttr {
        LocationId => "Location_ID",
        LocationName => "Location_Name",
        DayOfWeek => "Day_of_Week",
    }
}

define_columns! {
    pub enum OperationsMeasure {
        ChairUtilization => "Chair_Utilization",
        TargetChairUtilization => "Target_Chair_Utilization",
        CancellationRate => "Cancellation_Rate",
        NoShowRate => "No_Show_Rate",
        CancellationCount => "Cancellation_Count",
        NoShowCount => "No_Show_Count",
        AppointmentCapacity => "Appointment_Capacity",
        ScheduledAppointments => "Scheduled_Appointments",
        ActualAppointments => "Actual_Appointments",
        NewPatientCount => "New_Patient_Count",
        ReturningPatientCount => "Returning_Patient_Count",
        TotalPatientsSeen => "Total_Patients_Seen",
        TargetNewPatients => "Target_New_Patients",
        TotalLaborHours => "Total_Labor_Hours",
        TotalLaborCost => "Total_Labor_Cost",
        TreatmentPlanCompletionRate => "Treatment_Plan_Completion_Rate",
        PlansNotStarted => "Treatment_Plans_Not_Started",
        PlansInProgress => "Treatment_Plans_In_Progress",
        PlansCompleted => "Treatment_Plans_Completed",
        PlansDelayed => "Treatment_Plans_Delayed",
        ClaimsSubmitted => "Insurance_Claims_Submitted",
        ClaimsProcessed => "Insurance_Claims_Processed",
        ClaimsPaid => "Insurance_Claims_Paid",
        ClaimsDenied => "Insurance_Claims_Denied",
        ClaimsAging0To30 => "Claims_Aging_0_30",
        ClaimsAging31To60 => "Claims_Aging_31_60",
        ClaimsAging61To90 => "Claims_Aging_61_90",
        ClaimsAging90Plus => "Claims_Aging_90_Plus",
        AvgWaitTime => "Avg_Wait_Time",
        AvgDaysToPayment => "Avg_Days_To_Payment",
        ActualCollectionRate => "Actual_Collection_Rate",
        TargetCollectionRate => "Target_Collection_Rate",
        RevenuePerHour => "Revenue_Per_Hour",
        RevenuePerChair => "Revenue_Per_Chair",
        RevenuePerPatient => "Revenue_Per_Patient",
        LaborCostPercentage => "Labor_Cost_Percentage",
        SupplyCostPercentage => "Supply_Cost_Percentage",
        OverheadPercentage => "Overhead_Percentage",
    }
}

impl TableSpec for Operations {
    type Measure = OperationsMeasure;
    type Attribute = OperationsAttr;
    type DateField = NoColumns;

    const KIND: TableKind = TableKind::Operations;
    const DATE_COLUMN: &'static str = "Date";
    const LOCATION_ID: OperationsAttr = OperationsAttr::LocationId;
    const LOCATION_NAME: Option<OperationsAttr> = Some(OperationsAttr::LocationName);
    const WEEKDAY_FILTERED: bool = true;
    const REQUIRED_ATTRIBUTES: &'static [OperationsAttr] =
        &[OperationsAttr::LocationId, OperationsAttr::LocationName];

    fn slot(store: &RecordStore) -> &TableSlot<Self> {
        store.operations()
    }
}

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

/// Per-device daily usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Equipment;

define_columns! {
    pub enum EquipmentAttr {
        LocationId => "Location_ID",
        EquipmentId => "Equipment_ID",
        EquipmentType => "Equipment_Type",
    }
}

define_columns! {
    pub enum EquipmentMeasure {
        UtilizationRate => "Utilization_Rate",
        UsageCount => "Usage_Count",
        UsageTimeMinutes => "Usage_Time_Minutes",
    }
}

impl TableSpec for Equipment {
    type Measure = EquipmentMeasure;
    type Attribute = EquipmentAttr;
    type DateField = NoColumns;

    const KIND: TableKind = TableKind::Equipment;
    const DATE_COLUMN: &'static str = "Date";
    const LOCATION_ID: EquipmentAttr = EquipmentAttr::LocationId;
    const REQUIRED_ATTRIBUTES: &'static [EquipmentAttr] =
        &[EquipmentAttr::LocationId, EquipmentAttr::EquipmentType];
    const REQUIRED_MEASURES: &'static [EquipmentMeasure] = &[
        EquipmentMeasure::UtilizationRate,
        EquipmentMeasure::UsageCount,
        EquipmentMeasure::UsageTimeMinutes,
    ];

    fn slot(store: &RecordStore) -> &TableSlot<Self> {
        store.equipment()
    }
}

// ---------------------------------------------------------------------------
// Staff
// ---------------------------------------------------------------------------

/// Hours and labor cost per staff member per day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Staff;

define_columns! {
    pub enum StaffAttr {
        LocationId => "Location_ID",
        StaffId => "Staff_ID",
        StaffRole => "Staff_Role",
    }
}

define_columns! {
    pub enum StaffMeasure {
        HoursWorked => "Hours_Worked",
        LaborCost => "Labor_Cost",
    }
}

impl TableSpec for Staff {
    type Measure = StaffMeasure;
    type Attribute = StaffAttr;
    type DateField = NoColumns;

    const KIND: TableKind = TableKind::Staff;
    const DATE_COLUMN: &'static str = "Date";
    const LOCATION_ID: StaffAttr = StaffAttr::LocationId;
    const STAFF_ROLE: Option<StaffAttr> = Some(StaffAttr::StaffRole);
    const REQUIRED_ATTRIBUTES: &'static [StaffAttr] =
        &[StaffAttr::LocationId, StaffAttr::StaffId, StaffAttr::StaffRole];
    const REQUIRED_MEASURES: &'static [StaffMeasure] =
        &[StaffMeasure::HoursWorked, StaffMeasure::LaborCost];

    fn slot(store: &RecordStore) -> &TableSlot<Self> {
        store.staff()
    }
}

// ---------------------------------------------------------------------------
// Patient visits
// ---------------------------------------------------------------------------

/// One billed patient visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PatientVisits;

define_columns! {
    pub enum VisitAttr {
        VisitId => "Visit_ID",
        LocationId => "Location_ID",
        LocationName => "Location_Name",
        ProviderId => "Provider_ID",
        InsuranceProvider => "Insurance_Provider",
        ProcedureDescription => "Procedure_Description",
        TreatmentPlanId => "Treatment_Plan_ID",
    }
}

define_columns! {
    pub enum VisitMeasure {
        ChargedAmount => "Charged_Amount",
        InsuranceCoveredAmount => "Insurance_Covered_Amount",
        OutOfPocket => "Out_of_Pocket",
        DiscountApplied => "Discount_Applied",
        /// Derived at load
        CollectedAmount => "Collected_Amount",
        TreatmentPlanCompletionRate => "Treatment_Plan_Completion_Rate",
        EstimatedTotalCost => "Estimated_Total_Cost",
        GoogleRating => "Google_Rating",
    }
}

define_columns! {
    pub enum VisitDate {
        TreatmentPlanCreation => "Treatment_Plan_Creation_Date",
        TreatmentPlanCompletion => "Treatment_Plan_Completion_Date",
        ClaimSubmission => "Insurance_Claim_Submission_Date",
        ClaimPayment => "Insurance_Claim_Payment_Date",
    }
}

impl TableSpec for PatientVisits {
    type Measure = VisitMeasure;
    type Attribute = VisitAttr;
    type DateField = VisitDate;

    const KIND: TableKind = TableKind::PatientVisits;
    const DATE_COLUMN: &'static str = "Date_of_Service";
    const LOCATION_ID: VisitAttr = VisitAttr::LocationId;
    const LOCATION_NAME: Option<VisitAttr> = Some(VisitAttr::LocationName);
    const PROVIDER: Option<VisitAttr> = Some(VisitAttr::ProviderId);
    const INSURANCE_PROVIDER: Option<VisitAttr> = Some(VisitAttr::InsuranceProvider);
    const REQUIRED_ATTRIBUTES: &'static [VisitAttr] = &[
        VisitAttr::VisitId,
        VisitAttr::LocationId,
        VisitAttr::LocationName,
    ];
    const REQUIRED_MEASURES: &'static [VisitMeasure] = &[
        VisitMeasure::ChargedAmount,
        VisitMeasure::InsuranceCoveredAmount,
        VisitMeasure::OutOfPocket,
        VisitMeasure::DiscountApplied,
    ];

    fn normalize(table: &mut Table<Self>) {
        table.derive_collected_amount();
    }

    fn slot(store: &RecordStore) -> &TableSlot<Self> {
        store.visits()
    }
}

// ---------------------------------------------------------------------------
// Financial
// ---------------------------------------------------------------------------

/// Monthly per-location financial statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Financial;

define_columns! {
    pub enum FinancialAttr {
        LocationId => "Location_ID",
        LocationName => "Location_Name",
    }
}

define_columns! {
    pub enum FinancialMeasure {
        TotalRevenue => "Total_Revenue",
        TotalExpenses => "Total_Expenses",
        Ebitda => "EBITDA",
        EbitdaMargin => "EBITDA_Margin",
        CollectionRate => "Collection_Rate",
        Dso => "DSO",
        ArCurrent => "AR_Current",
        Ar31To60 => "AR_31_60",
        Ar61To90 => "AR_61_90",
        Ar91Plus => "AR_91_Plus",
        TotalAr => "Total_AR",
        LaborCostPercentage => "Labor_Cost_Percentage",
        SupplyCostPercentage => "Supply_Cost_Percentage",
        RevenueMomChange => "Revenue_MoM_Change",
        RevenueYoyChange => "Revenue_YoY_Change",
        EbitdaMomChange => "EBITDA_MoM_Change",
        EbitdaYoyChange => "EBITDA_YoY_Change",
        CollectionsExpected => "Collections_Expected",
        CollectionsActual => "Collections_Actual",
        TotalClaimsSubmitted => "Total_Claims_Submitted",
        ClaimsOutstanding => "Claims_Outstanding",
        ClaimsDenied => "Claims_Denied",
        AvgDaysToPayment => "Avg_Days_To_Payment",
        RevenuePerPatient => "Revenue_Per_Patient",
        RevenuePerChair => "Revenue_Per_Chair",
        RevenuePerHour => "Revenue_Per_Hour",
        RevenuePerSquareFoot => "Revenue_Per_Square_Foot",
        ChairUtilization => "Chair_Utilization",
        PatientRetentionRate => "Patient_Retention_Rate",
        CaseAcceptanceRate => "Case_Acceptance_Rate",
        TreatmentCompletionRate => "Treatment_Completion_Rate",
    }
}

/// How a financial column combines when several rows share a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthlyFold {
    /// Flow amounts
    Sum,
    /// Balances at a point in time
    Latest,
    /// Rates, ratios and per-unit KPIs
    Mean,
    /// Derived again from the folded sums
    Recompute,
}

impl FinancialMeasure {
    pub fn monthly_fold(self) -> MonthlyFold {
        use FinancialMeasure::*;
        match self {
            TotalRevenue | TotalExpenses | Ebitda | CollectionsExpected | CollectionsActual
            | TotalClaimsSubmitted | ClaimsDenied => MonthlyFold::Sum,
            ArCurrent | Ar31To60 | Ar61To90 | Ar91Plus | TotalAr | ClaimsOutstanding => {
                MonthlyFold::Latest
            }
            EbitdaMargin => MonthlyFold::Recompute,
            _ => MonthlyFold::Mean,
        }
    }
}

const EXPENSE_LINES: &[&str] = &[
    "Rent_Lease",
    "Utilities",
    "Equipment_Costs",
    "Marketing",
    "Insurance",
    "Professional_Fees",
    "Lab_Fees",
    "Software_IT",
];

impl TableSpec for Financial {
    type Measure = FinancialMeasure;
    type Attribute = FinancialAttr;
    type DateField = NoColumns;

    const KIND: TableKind = TableKind::Financial;
    const DATE_COLUMN: &'static str = "Date";
    const LOCATION_ID: FinancialAttr = FinancialAttr::LocationId;
    const LOCATION_NAME: Option<FinancialAttr> = Some(FinancialAttr::LocationName);
    const REQUIRED_ATTRIBUTES: &'static [FinancialAttr] =
        &[FinancialAttr::LocationId, FinancialAttr::LocationName];
    const REQUIRED_MEASURES: &'static [FinancialMeasure] = &[
        FinancialMeasure::TotalRevenue,
        FinancialMeasure::TotalExpenses,
    ];

    fn classify_dynamic(header: &str) -> Option<DynamicFamily> {
        if header.ends_with("_Percentage") {
            return None;
        }
        if let Some(rest) = header.strip_prefix("Revenue_") {
            let excluded = matches!(rest, "MoM_Change" | "YoY_Change") || rest.starts_with("Per_");
            return (!excluded).then_some(DynamicFamily::ServiceLine);
        }
        if header.starts_with("Payor_") {
            return Some(DynamicFamily::Payor);
        }
        if header.starts_with("Labor_")
            || header.starts_with("Supplies_")
            || EXPENSE_LINES.contains(&header)
        {
            return Some(DynamicFamily::Expense);
        }
        None
    }

    fn normalize(table: &mut Table<Self>) {
        super::monthly::fold_monthly(table);
    }

    fn slot(store: &RecordStore) -> &TableSlot<Self> {
        store.financial()
    }
}
