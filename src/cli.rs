use chrono::{NaiveDate, Weekday};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::dates::parse_weekday;
use crate::core::period::PeriodGranularity;
use crate::filter::FilterContext;

#[derive(Parser, Debug)]
#[command(name = "dentalytics")]
#[command(about = "Dental practice metrics, forecasts and what-if scenarios", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// KPIs and breakdowns for the filtered data
    Summary {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filters: FilterArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Dashboards to include (defaults to all)
        #[arg(long = "section", value_enum, value_delimiter = ',')]
        sections: Vec<SummarySection>,
    },

    /// Revenue and cash-flow forecasts
    Forecast {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filters: FilterArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Months to project
        #[arg(long)]
        periods: Option<usize>,

        /// Moving-average window, in months
        #[arg(long)]
        window: Option<usize>,
    },

    /// Evaluate percentage adjustments against the latest month
    Scenario {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filters: FilterArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Adjustment as name=value, e.g. revenue_change=5 (repeatable)
        #[arg(long = "delta", value_parser = parse_delta)]
        deltas: Vec<(String, f64)>,
    },

    /// Write one filtered source table as CSV
    Export {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Table to export
        #[arg(value_enum)]
        table: ExportTable,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Initialize a configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Directory holding the source CSV files
    #[arg(long = "data-dir", env = "DENTALYTICS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Configuration file (defaults to .dentalytics.toml discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// First day of the range (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day of the range (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Location id or name
    #[arg(long)]
    pub location: Option<String>,

    /// Day of week, e.g. Monday (narrows Operations only)
    #[arg(long = "day", value_parser = parse_day)]
    pub day_of_week: Option<Weekday>,

    /// Staff role
    #[arg(long = "role")]
    pub staff_role: Option<String>,

    /// Service line, e.g. Preventive
    #[arg(long = "service-line")]
    pub service_line: Option<String>,

    /// Provider id
    #[arg(long)]
    pub provider: Option<String>,

    /// Insurance provider
    #[arg(long = "insurance")]
    pub insurance_provider: Option<String>,

    /// Period granularity: day, month, quarter, year, all
    #[arg(long = "period")]
    pub granularity: Option<PeriodGranularity>,

    /// Do not down-sample long daily ranges
    #[arg(long = "no-sampling")]
    pub no_sampling: bool,
}

impl FilterArgs {
    /// Build a context. A missing range bound falls back to `span`, the
    /// loaded data's first or last date.
    pub fn to_context(&self, span: Option<(NaiveDate, NaiveDate)>) -> FilterContext {
        let mut ctx = FilterContext::new();

        let start = self.start.or(span.map(|(first, _)| first));
        let end = self.end.or(span.map(|(_, last)| last));
        if self.start.is_some() || self.end.is_some() {
            if let (Some(start), Some(end)) = (start, end) {
                ctx = ctx.with_date_range(start, end);
            }
        }
        if let Some(location) = &self.location {
            ctx = ctx.with_location(location.clone());
        }
        if let Some(day) = self.day_of_week {
            ctx = ctx.with_day_of_week(day);
        }
        if let Some(role) = &self.staff_role {
            ctx = ctx.with_staff_role(role.clone());
        }
        if let Some(line) = &self.service_line {
            ctx = ctx.with_service_line(line.clone());
        }
        if let Some(provider) = &self.provider {
            ctx = ctx.with_provider(provider.clone());
        }
        if let Some(insurer) = &self.insurance_provider {
            ctx = ctx.with_insurance_provider(insurer.clone());
        }
        if let Some(granularity) = self.granularity {
            ctx = ctx.with_granularity(granularity);
        }
        ctx
    }
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "markdown")]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
}

impl From<OutputFormat> for crate::io::output::OutputFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Json => crate::io::output::OutputFormat::Json,
            OutputFormat::Markdown => crate::io::output::OutputFormat::Markdown,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum SummarySection {
    Operations,
    Financial,
    Revenue,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportTable {
    Operations,
    Equipment,
    Staff,
    Visits,
    Financial,
}

fn parse_day(raw: &str) -> Result<Weekday, String> {
    parse_weekday(raw).ok_or_else(|| format!("`{raw}` is not a day of the week"))
}

fn parse_delta(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("`{raw}` is not name=value"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("`{value}` is not a number: {e}"))?;
    Ok((name.trim().to_string(), value))
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_output_format_conversion() {
        assert_eq!(
            crate::io::output::OutputFormat::from(OutputFormat::Json),
            crate::io::output::OutputFormat::Json
        );
        assert_eq!(
            crate::io::output::OutputFormat::from(OutputFormat::Markdown),
            crate::io::output::OutputFormat::Markdown
        );
    }

    #[test]
    fn test_cli_parsing_summary_command() {
        let cli = Cli::try_parse_from([
            "dentalytics",
            "summary",
            "--start",
            "2024-01-01",
            "--end",
            "2024-03-31",
            "--day",
            "tuesday",
            "--period",
            "quarter",
            "--section",
            "financial,revenue",
            "-f",
            "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Summary {
                filters,
                output,
                sections,
                ..
            } => {
                assert_eq!(filters.start, Some(ymd(2024, 1, 1)));
                assert_eq!(filters.day_of_week, Some(Weekday::Tue));
                assert_eq!(filters.granularity, Some(PeriodGranularity::Quarter));
                assert_eq!(output.format, OutputFormat::Json);
                assert_eq!(sections, vec![SummarySection::Financial, SummarySection::Revenue]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_parsing_scenario_deltas() {
        let cli = Cli::try_parse_from([
            "dentalytics",
            "scenario",
            "--delta",
            "revenue_change=5",
            "--delta",
            "labor_cost_change=-2.5",
        ])
        .unwrap();
        match cli.command {
            Commands::Scenario { deltas, .. } => assert_eq!(
                deltas,
                vec![
                    ("revenue_change".to_string(), 5.0),
                    ("labor_cost_change".to_string(), -2.5)
                ]
            ),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_malformed_delta_is_rejected() {
        assert!(Cli::try_parse_from(["dentalytics", "scenario", "--delta", "revenue"]).is_err());
        assert!(
            Cli::try_parse_from(["dentalytics", "scenario", "--delta", "revenue_change=lots"])
                .is_err()
        );
    }

    #[test]
    fn test_open_range_filled_from_span() {
        let filters = FilterArgs {
            start: Some(ymd(2024, 2, 1)),
            ..FilterArgs::default()
        };
        let ctx = filters.to_context(Some((ymd(2024, 1, 1), ymd(2024, 6, 30))));
        let range = ctx.date_range().unwrap();
        assert_eq!((range.start, range.end), (ymd(2024, 2, 1), ymd(2024, 6, 30)));

        let unbounded = FilterArgs::default().to_context(Some((ymd(2024, 1, 1), ymd(2024, 6, 30))));
        assert!(unbounded.date_range().is_none());
    }
}
