use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::thresholds::{BenchmarkConfig, TargetConfig};
use crate::filter::SamplingPolicy;
use crate::forecast::ForecastConfig;
use crate::scenario::ScenarioLimits;
use crate::store::DataSources;

/// Environment variable overriding `[data] directory`
pub const DATA_DIR_ENV: &str = "DENTALYTICS_DATA_DIR";

/// Root configuration structure for dentalytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DentalyticsConfig {
    /// Where the five source tables live
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub forecast: ForecastConfig,

    /// Down-sampling of long daily ranges
    #[serde(default)]
    pub sampling: SamplingPolicy,

    /// Industry benchmarks for the financial comparison
    #[serde(default)]
    pub benchmarks: BenchmarkConfig,

    #[serde(default)]
    pub targets: TargetConfig,

    /// Bounds on what-if adjustments
    #[serde(default)]
    pub scenario: ScenarioLimits,
}

impl DentalyticsConfig {
    /// Source files, with [`DATA_DIR_ENV`] taking precedence over the file's
    /// directory.
    pub fn sources(&self) -> DataSources {
        let env_dir = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
        self.data.sources_in(env_dir.as_deref())
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data.directory = Some(dir.into());
        self
    }

    pub fn with_forecast_periods(mut self, periods: usize) -> Self {
        self.forecast.periods = periods;
        self
    }

    pub fn with_forecast_window(mut self, window: usize) -> Self {
        self.forecast.window = window;
        self
    }

    pub fn with_max_days(mut self, max_days: i64) -> Self {
        self.sampling.max_days = max_days;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the source files; the working directory when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,

    #[serde(default = "default_operations_file")]
    pub operations: String,

    #[serde(default = "default_equipment_file")]
    pub equipment: String,

    #[serde(default = "default_staff_file")]
    pub staff: String,

    #[serde(default = "default_visits_file")]
    pub visits: String,

    #[serde(default = "default_financial_file")]
    pub financial: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            directory: None,
            operations: default_operations_file(),
            equipment: default_equipment_file(),
            staff: default_staff_file(),
            visits: default_visits_file(),
            financial: default_financial_file(),
        }
    }
}

impl DataConfig {
    /// Resolve file names against `override_dir`, else the configured
    /// directory, else `.`.
    pub fn sources_in(&self, override_dir: Option<&Path>) -> DataSources {
        let dir = override_dir
            .or(self.directory.as_deref())
            .unwrap_or_else(|| Path::new("."));
        DataSources {
            operations: dir.join(&self.operations),
            equipment: dir.join(&self.equipment),
            staff: dir.join(&self.staff),
            visits: dir.join(&self.visits),
            financial: dir.join(&self.financial),
        }
    }
}

fn default_operations_file() -> String {
    DataSources::OPERATIONS_FILE.to_string()
}
fn default_equipment_file() -> String {
    DataSources::EQUIPMENT_FILE.to_string()
}
fn default_staff_file() -> String {
    DataSources::STAFF_FILE.to_string()
}
fn default_visits_file() -> String {
    DataSources::VISITS_FILE.to_string()
}
fn default_financial_file() -> String {
    DataSources::FINANCIAL_FILE.to_string()
}
