use anyhow::Result;

use super::{emit, Session};
use crate::cli::{FilterArgs, OutputArgs, SourceArgs};
use crate::scenario::{run_scenario, ScenarioDeltas};

pub fn run_scenario_command(
    source: &SourceArgs,
    filters: &FilterArgs,
    output: &OutputArgs,
    deltas: &[(String, f64)],
) -> Result<()> {
    let deltas = ScenarioDeltas::from_pairs(deltas.iter().map(|(name, value)| (name, *value)))?;
    let session = Session::open(source, filters)?;
    let view = session.view();

    let comparison = run_scenario(&view, &deltas, &session.config.scenario)?;
    let mut report = session.report("What-If Scenario");
    report.push("Scenario Impact", &comparison)?;

    emit(&report, output)
}
