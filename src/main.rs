use anyhow::Result;
use clap::Parser;
use dentalytics::cli::{Cli, Commands};
use dentalytics::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    match cli.command {
        Commands::Summary {
            source,
            filters,
            output,
            sections,
        } => commands::run_summary(&source, &filters, &output, &sections),
        Commands::Forecast {
            source,
            filters,
            output,
            periods,
            window,
        } => commands::run_forecast(&source, &filters, &output, periods, window),
        Commands::Scenario {
            source,
            filters,
            output,
            deltas,
        } => commands::run_scenario_command(&source, &filters, &output, &deltas),
        Commands::Export {
            source,
            filters,
            table,
            output,
        } => commands::export_table(&source, &filters, table, output.as_deref()),
        Commands::Init { force } => commands::init_config(force),
    }
}

// RUST_LOG takes precedence over -v
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
