//! CLI command implementations.
//!
//! Available commands:
//! - **summary**: Operations, financial and patient-revenue dashboards
//! - **forecast**: Revenue and cash-flow projections
//! - **scenario**: What-if adjustments against the latest month
//! - **export**: A filtered source table as CSV
//! - **init**: Initialize a new configuration file
//!
//! Every data command starts from a [`Session`]: the resolved configuration,
//! the loaded record store and the filter context built from the arguments.

pub mod export;
pub mod forecast;
pub mod init;
pub mod scenario;
pub mod summary;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::cli::{FilterArgs, OutputArgs, SourceArgs};
use crate::config::{load_config, load_config_from_path_result, DentalyticsConfig};
use crate::filter::{FilterContext, JointView};
use crate::io::{create_writer, open_output, Report};
use crate::store::{RecordStore, StoreCache};

pub use export::export_table;
pub use forecast::run_forecast;
pub use init::init_config;
pub use scenario::run_scenario_command;
pub use summary::run_summary;

pub struct Session {
    pub config: DentalyticsConfig,
    pub store: Arc<RecordStore>,
    pub context: FilterContext,
    pub sampling: bool,
}

impl Session {
    pub fn open(source: &SourceArgs, filters: &FilterArgs) -> Result<Self> {
        let mut config = match &source.config {
            Some(path) => load_config_from_path_result(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => load_config(),
        };
        if let Some(dir) = &source.data_dir {
            config = config.with_data_dir(dir.clone());
        }

        let sources = config.sources();
        log::info!("Loading practice data from {}", sources.operations.display());
        let store = StoreCache::global().get_or_load(&sources);
        if store.unavailable().len() == 5 {
            anyhow::bail!(
                "No source table could be loaded from {}",
                sources
                    .operations
                    .parent()
                    .map_or_else(|| ".".into(), |p| p.display().to_string())
            );
        }

        let context = filters.to_context(store.date_span());
        Ok(Self {
            config,
            store,
            context,
            sampling: !filters.no_sampling,
        })
    }

    pub fn view(&self) -> JointView<'_> {
        if self.sampling {
            JointView::build_sampled(&self.store, &self.context, self.config.sampling)
        } else {
            JointView::build(&self.store, &self.context)
        }
    }

    pub fn report(&self, title: &str) -> Report {
        Report::new(title, self.context.clone())
    }
}

/// Write `report` in the requested format.
pub fn emit(report: &Report, output: &OutputArgs) -> Result<()> {
    let out = open_output(output.output.as_deref())?;
    let mut writer = create_writer(output.format.into(), out);
    writer.write_report(report)?;
    if let Some(path) = &output.output {
        log::info!("Wrote {}", path.display());
    }
    Ok(())
}
