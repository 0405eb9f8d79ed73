use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::core::DentalyticsConfig;
use crate::errors::{Error, Result};
use crate::filter::SamplingPolicy;
use crate::forecast::ForecastConfig;

pub const CONFIG_FILE_NAME: &str = ".dentalytics.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Pure function to read config file contents
pub(crate) fn read_config_file(path: &Path) -> std::result::Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Parse TOML and replace invalid sections with their defaults.
pub fn parse_and_validate_config(contents: &str) -> std::result::Result<DentalyticsConfig, String> {
    let mut config = toml::from_str::<DentalyticsConfig>(contents)
        .map_err(|e| format!("Failed to parse {CONFIG_FILE_NAME}: {e}"))?;

    if let Err(e) = validate_forecast(&config.forecast) {
        log::warn!("Invalid [forecast] section: {e}. Using defaults.");
        config.forecast = ForecastConfig::default();
    }
    if config.sampling.max_days < 1 {
        log::warn!(
            "Invalid [sampling] max_days {}. Using defaults.",
            config.sampling.max_days
        );
        config.sampling = SamplingPolicy::default();
    }

    Ok(config)
}

fn validate_forecast(forecast: &ForecastConfig) -> std::result::Result<(), String> {
    if forecast.periods == 0 {
        return Err("periods must be at least 1".into());
    }
    if forecast.window == 0 {
        return Err("window must be at least 1".into());
    }
    if !(0.0..1.0).contains(&forecast.band_fraction) {
        return Err(format!(
            "band_fraction {} is outside [0, 1)",
            forecast.band_fraction
        ));
    }
    Ok(())
}

/// Pure function to try loading config from a specific path
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<DentalyticsConfig> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{e}. Using defaults.");
            None
        }
    }
}

/// Handle file read errors with appropriate logging
pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    // Only log actual errors, not "file not found"
    if error.kind() != std::io::ErrorKind::NotFound {
        log::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// Pure function to generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Search `start` and its ancestors for [`CONFIG_FILE_NAME`].
pub fn load_config_from(start: PathBuf) -> DentalyticsConfig {
    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            log::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            DentalyticsConfig::default()
        })
}

pub fn load_config() -> DentalyticsConfig {
    match std::env::current_dir() {
        Ok(dir) => load_config_from(dir),
        Err(e) => {
            log::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            DentalyticsConfig::default()
        }
    }
}

/// Load an explicitly named config file; unlike discovery, a missing or
/// malformed file is an error.
pub fn load_config_from_path_result(path: &Path) -> Result<DentalyticsConfig> {
    let contents = read_config_file(path)?;
    parse_and_validate_config(&contents).map_err(Error::configuration)
}
