use chrono::{Days, NaiveDate};
use criterion::{criterion_group, criterion_main, Criterion};
use dentalytics::aggregation::{aggregate, AggSpec, GroupKey};
use dentalytics::store::{
    Operations, OperationsAttr, OperationsMeasure, PatientVisits, Row, Schema, Table, VisitAttr,
    VisitMeasure,
};
use dentalytics::{FilterContext, PeriodGranularity};
use std::hint::black_box;

const LOCATIONS: &[(&str, &str)] = &[("L1", "Downtown"), ("L2", "Uptown"), ("L3", "Riverside")];
const PROCEDURES: &[&str] = &["Cleaning", "Filling", "Crown", "Root Canal", "Extraction"];

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()
}

fn operations_rows(days: u64) -> Vec<Row<Operations>> {
    let mut rows = Vec::new();
    for offset in 0..days {
        let date = start().checked_add_days(Days::new(offset)).unwrap();
        for (i, (id, name)) in LOCATIONS.iter().enumerate() {
            let utilization = 55.0 + ((offset as usize + i * 7) % 40) as f64;
            rows.push(
                Row::on(date)
                    .with_attr(OperationsAttr::LocationId, *id)
                    .with_attr(OperationsAttr::LocationName, *name)
                    .with_measure(OperationsMeasure::ChairUtilization, utilization)
                    .with_measure(OperationsMeasure::CancellationRate, (offset % 12) as f64)
                    .with_measure(OperationsMeasure::ActualAppointments, 20.0 + i as f64),
            );
        }
    }
    rows
}

fn visit_rows(count: u64) -> Vec<Row<PatientVisits>> {
    (0..count)
        .map(|n| {
            let date = start().checked_add_days(Days::new(n % 1095)).unwrap();
            let (id, name) = LOCATIONS[n as usize % LOCATIONS.len()];
            let charged = 100.0 + (n % 900) as f64;
            Row::on(date)
                .with_attr(VisitAttr::VisitId, format!("V{n}"))
                .with_attr(VisitAttr::LocationId, id)
                .with_attr(VisitAttr::LocationName, name)
                .with_attr(
                    VisitAttr::ProcedureDescription,
                    PROCEDURES[n as usize % PROCEDURES.len()],
                )
                .with_measure(VisitMeasure::ChargedAmount, charged)
                .with_measure(VisitMeasure::CollectedAmount, charged * 0.85)
        })
        .collect()
}

fn benchmark_operations_trend(c: &mut Criterion) {
    let rows = operations_rows(1095);
    let refs: Vec<&Row<Operations>> = rows.iter().collect();
    let spec = AggSpec::new()
        .mean(OperationsMeasure::ChairUtilization)
        .mean(OperationsMeasure::CancellationRate)
        .sum(OperationsMeasure::ActualAppointments);

    for granularity in [PeriodGranularity::Day, PeriodGranularity::Month] {
        let key = GroupKey::time(granularity);
        c.bench_function(&format!("operations_trend_{granularity}"), |b| {
            b.iter(|| aggregate(black_box(&refs), &[key], &spec))
        });
    }

    c.bench_function("operations_by_weekday", |b| {
        b.iter(|| aggregate(black_box(&refs), &[GroupKey::DayName], &spec))
    });
}

fn benchmark_visit_grouping(c: &mut Criterion) {
    let rows = visit_rows(50_000);
    let refs: Vec<&Row<PatientVisits>> = rows.iter().collect();
    let spec = AggSpec::new()
        .sum(VisitMeasure::ChargedAmount)
        .sum(VisitMeasure::CollectedAmount);
    let keys = [
        GroupKey::MonthYear,
        GroupKey::Attribute(VisitAttr::ProcedureDescription),
    ];

    c.bench_function("visits_by_month_and_procedure", |b| {
        b.iter(|| aggregate(black_box(&refs), &keys, &spec))
    });
}

fn benchmark_filtering(c: &mut Criterion) {
    let table = Table::from_rows("visits.csv", Schema::complete(), visit_rows(50_000));
    let mut directory = dentalytics::store::LocationDirectory::default();
    for (id, name) in LOCATIONS {
        directory.insert(*id, *name);
    }
    let ctx = FilterContext::new()
        .with_date_range(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        )
        .with_location("Uptown");

    c.bench_function("filter_visits_by_year_and_location", |b| {
        b.iter(|| ctx.apply(black_box(&table), &directory).len())
    });
}

criterion_group!(
    benches,
    benchmark_operations_trend,
    benchmark_visit_grouping,
    benchmark_filtering
);
criterion_main!(benches);
