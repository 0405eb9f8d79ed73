// Sub-modules
mod thresholds;

// Core configuration types
mod core;
mod loader;

// Re-export threshold types
pub use thresholds::{BenchmarkConfig, TargetConfig};

// Re-export core types
pub use core::{DataConfig, DentalyticsConfig, DATA_DIR_ENV};

// Re-export loader functions
pub use loader::{
    directory_ancestors, load_config, load_config_from, load_config_from_path_result,
    parse_and_validate_config, CONFIG_FILE_NAME,
};
