use anyhow::{Context, Result};
use std::io::Write;

use super::Session;
use crate::cli::{ExportTable, FilterArgs, SourceArgs};
use crate::filter::{JointView, TableView};
use crate::io::open_output;
use crate::store::{export::write_csv, TableSpec};

/// Write one filtered table as CSV. Exports never sample long ranges.
pub fn export_table(
    source: &SourceArgs,
    filters: &FilterArgs,
    table: ExportTable,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let session = Session::open(source, filters)?;
    let view = JointView::build(&session.store, &session.context);
    let out = open_output(output)?;

    let written = match table {
        ExportTable::Operations => write_view(&view.operations, out)?,
        ExportTable::Equipment => write_view(&view.equipment, out)?,
        ExportTable::Staff => write_view(&view.staff, out)?,
        ExportTable::Visits => write_view(&view.visits, out)?,
        ExportTable::Financial => write_view(&view.financial, out)?,
    };
    log::info!("Exported {written} records");
    Ok(())
}

fn write_view<T: TableSpec>(view: &TableView<'_, T>, out: impl Write) -> Result<usize> {
    if let Some(err) = view.error() {
        anyhow::bail!("Cannot export {}: {err}", T::KIND);
    }
    let header = view
        .header()
        .with_context(|| format!("{} was not read from a file", T::KIND))?;
    Ok(write_csv(header, view.rows().iter().copied(), out)?)
}
