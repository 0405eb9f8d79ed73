// Test utility module for dentalytics integration tests
#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use dentalytics::{DataSources, RecordStore};
use indoc::indoc;
use std::fmt::Write as _;
use std::path::Path;
use tempfile::TempDir;

pub const OPERATIONS_CSV: &str = indoc! {"
    Date,Location_ID,Location_Name,Day_of_Week,Chair_Utilization,Target_Chair_Utilization,Cancellation_Rate,No_Show_Rate,Appointment_Capacity,Scheduled_Appointments,Actual_Appointments,New_Patient_Count,Returning_Patient_Count
    2024-01-01,L1,Downtown,Monday,80,85,5,2,40,36,34,4,30
    2024-01-02,L1,Downtown,Tuesday,70,85,8,3,40,32,29,3,26
    2024-01-01,L2,Uptown,Monday,60,85,10,4,30,24,21,2,19
    2024-01-07,L2,Uptown,Sunday,50,85,12,5,30,20,17,1,16
    2024-01-08,L1,Downtown,Monday,90,85,4,1,40,38,37,5,32
"};

pub const EQUIPMENT_CSV: &str = indoc! {"
    Date,Location_ID,Equipment_ID,Equipment_Type,Utilization_Rate,Usage_Count,Usage_Time_Minutes
    2024-01-01,L1,E1,X-Ray,75,10,120
    2024-01-02,L1,E1,X-Ray,65,8,100
    2024-01-01,L2,E2,Chair,55,6,300
    2024-01-08,L3,E3,Chair,45,4,200
"};

pub const STAFF_CSV: &str = indoc! {"
    Date,Location_ID,Staff_ID,Staff_Role,Hours_Worked,Labor_Cost
    2024-01-01,L1,S1,Hygienist,8,320
    2024-01-01,L1,S2,Dentist,8,800
    2024-01-02,L1,S1,Hygienist,6,240
    2024-01-01,L2,S3,Hygienist,7,280
"};

/// Collected amounts work out to 180, 750, 130 and 250.
pub const VISITS_CSV: &str = indoc! {"
    Visit_ID,Date_of_Service,Location_ID,Location_Name,Provider_ID,Insurance_Provider,Procedure_Description,Charged_Amount,Insurance_Covered_Amount,Out_of_Pocket,Discount_Applied,Treatment_Plan_ID,Google_Rating
    V1,2024-01-01,L1,Downtown,P1,Delta,Cleaning,$200,120,60,0,,5
    V2,2024-01-02,L1,Downtown,P2,Aetna,Crown,\"1,000\",500,300,50,TP1,4
    V3,2024-01-01,L2,Uptown,P1,Delta,Cleaning,150,100,40,10,,3
    V4,not-a-date,L2,Uptown,P3,Cigna,Filling,300,150,100,0,,4
"};

/// Downtown reports January through June 2024 with revenue climbing by 10k a
/// month; Uptown reports June only.
pub const FINANCIAL_CSV: &str = indoc! {"
    Date,Location_ID,Location_Name,Total_Revenue,Total_Expenses,Collection_Rate,Labor_Cost_Percentage,Supply_Cost_Percentage,DSO,Revenue_Preventive,Revenue_Restorative,Payor_Delta,Payor_Self_Pay
    2024-01-01,L1,Downtown,100000,80000,95,50,10,30,40000,60000,70,30
    2024-02-01,L1,Downtown,110000,80000,95,50,10,30,44000,66000,70,30
    2024-03-01,L1,Downtown,120000,80000,95,50,10,30,48000,72000,70,30
    2024-04-01,L1,Downtown,130000,80000,95,50,10,30,52000,78000,70,30
    2024-05-01,L1,Downtown,140000,80000,95,50,10,30,56000,84000,70,30
    2024-06-01,L1,Downtown,150000,80000,95,50,10,30,60000,90000,70,30
    2024-06-01,L2,Uptown,50000,45000,90,40,8,40,20000,30000,60,40
"};

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A data directory holding all five fixture tables.
pub fn practice_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_table(dir.path(), DataSources::OPERATIONS_FILE, OPERATIONS_CSV);
    write_table(dir.path(), DataSources::EQUIPMENT_FILE, EQUIPMENT_CSV);
    write_table(dir.path(), DataSources::STAFF_FILE, STAFF_CSV);
    write_table(dir.path(), DataSources::VISITS_FILE, VISITS_CSV);
    write_table(dir.path(), DataSources::FINANCIAL_FILE, FINANCIAL_CSV);
    dir
}

pub fn write_table(dir: &Path, file: &str, contents: &str) {
    std::fs::write(dir.join(file), contents).unwrap();
}

/// Load the fixture tables. The store owns its rows, so the directory is
/// dropped once loading finishes.
pub fn load_store() -> RecordStore {
    let dir = practice_dir();
    RecordStore::load(&DataSources::in_dir(dir.path()))
}

/// One Operations row per day for `days` consecutive days at Downtown.
pub fn daily_operations(start: NaiveDate, days: u64) -> String {
    let mut csv = String::from("Date,Location_ID,Location_Name,Chair_Utilization,Cancellation_Rate\n");
    for offset in 0..days {
        let date = start.checked_add_days(Days::new(offset)).unwrap();
        let utilization = 60 + offset % 30;
        writeln!(csv, "{},L1,Downtown,{utilization},5", date.format("%Y-%m-%d")).unwrap();
    }
    csv
}

pub fn approx_eq(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-6
}
