use serde_json::{Map, Value};
use std::io::Write;

use super::report::{Report, Section, SectionBody};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
}

pub trait OutputWriter {
    fn write_report(&mut self, report: &Report) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_report(&mut self, report: &Report) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_report(&mut self, report: &Report) -> anyhow::Result<()> {
        self.write_header(report)?;
        for section in &report.sections {
            self.write_section(section)?;
        }
        Ok(())
    }
}

impl<W: Write> MarkdownWriter<W> {
    fn write_header(&mut self, report: &Report) -> anyhow::Result<()> {
        writeln!(self.writer, "# {}", report.title)?;
        writeln!(self.writer)?;
        let context = serde_json::to_value(&report.context)?;
        if let Value::Object(fields) = context {
            let set: Vec<String> = fields
                .iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(name, value)| format!("{name}: {}", format_scalar(value)))
                .collect();
            if !set.is_empty() {
                writeln!(self.writer, "Filters: {}", set.join(", "))?;
                writeln!(self.writer)?;
            }
        }
        Ok(())
    }

    fn write_section(&mut self, section: &Section) -> anyhow::Result<()> {
        writeln!(self.writer, "## {}", section.heading)?;
        writeln!(self.writer)?;
        match &section.body {
            SectionBody::Ready(value) => self.write_value(value, 3)?,
            SectionBody::Empty => {
                writeln!(self.writer, "_No data for the selected filters._")?;
                writeln!(self.writer)?;
            }
            SectionBody::Unavailable { table, reason } => {
                writeln!(self.writer, "_{table} data unavailable: {reason}_")?;
                writeln!(self.writer)?;
            }
        }
        Ok(())
    }

    fn write_value(&mut self, value: &Value, depth: usize) -> anyhow::Result<()> {
        match value {
            Value::Array(items) if items.iter().all(Value::is_object) && !items.is_empty() => {
                self.write_records(items)
            }
            Value::Object(fields) => self.write_object(fields, depth),
            other => {
                writeln!(self.writer, "{}", format_scalar(other))?;
                writeln!(self.writer)?;
                Ok(())
            }
        }
    }

    /// Scalar fields as a two-column table, nested fields as sub-sections.
    fn write_object(&mut self, fields: &Map<String, Value>, depth: usize) -> anyhow::Result<()> {
        let (scalars, nested): (Vec<_>, Vec<_>) =
            fields.iter().partition(|(_, value)| is_scalar(value));

        if !scalars.is_empty() {
            writeln!(self.writer, "| Metric | Value |")?;
            writeln!(self.writer, "|--------|-------|")?;
            for (name, value) in scalars {
                writeln!(self.writer, "| {name} | {} |", format_scalar(value))?;
            }
            writeln!(self.writer)?;
        }

        for (name, value) in nested {
            writeln!(self.writer, "{} {name}", "#".repeat(depth.min(6)))?;
            writeln!(self.writer)?;
            self.write_value(value, depth + 1)?;
        }
        Ok(())
    }

    /// An array of objects as a table; columns in first-seen order.
    fn write_records(&mut self, records: &[Value]) -> anyhow::Result<()> {
        let mut columns: Vec<&str> = Vec::new();
        for record in records {
            if let Value::Object(fields) = record {
                for name in fields.keys() {
                    if !columns.contains(&name.as_str()) {
                        columns.push(name);
                    }
                }
            }
        }

        writeln!(self.writer, "| {} |", columns.join(" | "))?;
        writeln!(
            self.writer,
            "|{}|",
            columns.iter().map(|_| "---").collect::<Vec<_>>().join("|")
        )?;
        for record in records {
            let cells: Vec<String> = columns
                .iter()
                .map(|column| record.get(*column).map_or_else(String::new, format_scalar))
                .collect();
            writeln!(self.writer, "| {} |", cells.join(" | "))?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn format_scalar(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() != 0.0 => format!("{f:.2}"),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(format_scalar).collect::<Vec<_>>().join(", "),
        Value::Object(fields) => fields
            .iter()
            .map(|(name, value)| format!("{name}={}", format_scalar(value)))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

pub fn create_writer<'a>(format: OutputFormat, out: Box<dyn Write + 'a>) -> Box<dyn OutputWriter + 'a> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(out)),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(out)),
    }
}
