//! CSV export of filtered tables.
//!
//! Exports are verbatim: the source header, then the source records behind the
//! kept rows in file order with their cell text untouched. Columns the loader
//! ignored are written and columns it derived are not. A monthly Financial row
//! exports every record folded into it.

use csv::StringRecord;
use std::io::Write;

use super::kinds::TableSpec;
use super::row::{Row, SourceRecord};
use crate::errors::Result;

/// Write the source records behind `rows` under `header`. Returns the number
/// of records written.
pub fn write_csv<'a, T, W, I>(header: &StringRecord, rows: I, writer: W) -> Result<usize>
where
    T: TableSpec + 'a,
    W: Write,
    I: IntoIterator<Item = &'a Row<T>>,
{
    let mut records: Vec<&SourceRecord> = rows.into_iter().flat_map(Row::sources).collect();
    records.sort_by_key(|record| record.index);
    records.dedup_by_key(|record| record.index);

    let mut out = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    out.write_record(header)?;
    for record in &records {
        out.write_record(&record.cells)?;
    }
    out.flush()?;

    log::debug!("Exported {} {} records", records.len(), T::KIND);
    Ok(records.len())
}
