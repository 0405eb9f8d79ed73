mod common;

use common::{daily_operations, practice_dir, write_table, ymd};
use dentalytics::cli::{ExportTable, FilterArgs, SourceArgs, SummarySection};
use dentalytics::commands::summary::build_summary;
use dentalytics::commands::{export_table, Session};
use dentalytics::io::{JsonWriter, SectionBody};
use dentalytics::{DataSources, OutputWriter};
use indoc::indoc;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn source(dir: &TempDir) -> SourceArgs {
    SourceArgs {
        data_dir: Some(dir.path().to_path_buf()),
        config: None,
    }
}

#[test]
fn export_writes_the_filtered_table() {
    let dir = practice_dir();
    let out = dir.path().join("out").join("staff.csv");
    let filters = FilterArgs {
        location: Some("Downtown".into()),
        ..FilterArgs::default()
    };

    export_table(&source(&dir), &filters, ExportTable::Staff, Some(&out)).unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains("Staff_Role"));
    assert!(lines[1..].iter().all(|line| line.contains("L1")));
}

#[test]
fn export_reproduces_source_text() {
    let dir = practice_dir();
    let staff = indoc! {r#"
        Date,Location_ID,Staff_ID,Staff_Role,Hours_Worked,Labor_Cost,Badge_Color
        01/05/2024,L1,S1,Hygienist,8.0,"$1,320.00",teal
        2024-01-06,L1,S2,Dentist, 7 ,900,
    "#};
    write_table(dir.path(), DataSources::STAFF_FILE, staff);
    let out = dir.path().join("staff.csv");

    export_table(&source(&dir), &FilterArgs::default(), ExportTable::Staff, Some(&out)).unwrap();

    assert_eq!(std::fs::read_to_string(&out).unwrap(), staff);
}

#[test]
fn export_keeps_every_day_of_a_long_range() {
    let dir = practice_dir();
    write_table(
        dir.path(),
        DataSources::OPERATIONS_FILE,
        &daily_operations(ymd(2023, 1, 1), 400),
    );
    let out = dir.path().join("operations.csv");

    export_table(&source(&dir), &FilterArgs::default(), ExportTable::Operations, Some(&out)).unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written.lines().count(), 401);
}

#[test]
fn summary_sections_carry_their_status() {
    let dir = practice_dir();
    let session = Session::open(&source(&dir), &FilterArgs::default()).unwrap();
    let view = session.view();

    let report = build_summary(&session, &view, &[SummarySection::Financial]).unwrap();

    assert!(report.section("Operations KPIs").is_none());
    assert!(matches!(
        report.section("Financial KPIs").unwrap().body,
        SectionBody::Ready(_)
    ));
    assert_eq!(report.section("AR Aging").unwrap().body, SectionBody::Empty);
}

#[test]
fn json_report_round_trips_through_serde() {
    let dir = practice_dir();
    let session = Session::open(&source(&dir), &FilterArgs::default()).unwrap();
    let view = session.view();
    let report = build_summary(&session, &view, &[SummarySection::Revenue]).unwrap();

    let mut buffer = Vec::new();
    JsonWriter::new(&mut buffer).write_report(&report).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

    assert_eq!(json["title"], "Practice Summary");
    assert_eq!(json["sections"][0]["heading"], "Visit Revenue");
    assert_eq!(json["sections"][0]["body"]["status"], "ready");
    assert_eq!(
        json["sections"][0]["body"]["data"]["total_billed"],
        serde_json::json!(1650.0)
    );
}

#[test]
fn session_reads_the_given_config_file() {
    let dir = practice_dir();
    let config = dir.path().join("practice.toml");
    std::fs::write(&config, "[forecast]\nperiods = 6\n\n[sampling]\nmax_days = 90\n").unwrap();
    let source = SourceArgs {
        config: Some(config),
        ..source(&dir)
    };

    let session = Session::open(&source, &FilterArgs::default()).unwrap();

    assert_eq!(session.config.forecast.periods, 6);
    assert_eq!(session.config.sampling.max_days, 90);
    assert_eq!(session.config.data.directory.as_deref(), Some(dir.path()));
}

#[test]
fn session_fails_when_no_table_loads() {
    let empty = TempDir::new().unwrap();
    let result = Session::open(&source(&empty), &FilterArgs::default());
    assert!(result.is_err());
}
