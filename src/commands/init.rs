use crate::config::CONFIG_FILE_NAME;
use crate::io;
use anyhow::Result;
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = r#"# Dentalytics Configuration

[data]
# directory = "data"
operations = "Operations_Data.csv"
equipment = "Equipment_Usage_Data.csv"
staff = "Staff_Hours_Data.csv"
visits = "Pat_App_Data.csv"
financial = "Financial_Data.csv"

[forecast]
periods = 3
window = 3
min_history = 6
band_fraction = 0.10

[sampling]
max_days = 180

[benchmarks]
labor_cost_percentage = 27.0
supply_cost_percentage = 6.0
ebitda_margin = 18.0
collection_rate = 98.0
dso = 35.0
chair_utilization = 85.0

[targets]
denial_rate = 5.0
plan_completion = 100.0

[scenario]
revenue_change = 20.0
labor_cost_change = 10.0
supply_cost_change = 10.0
collection_rate_change = 10.0
"#;

pub fn init_config(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    io::write_file(&config_path, DEFAULT_CONFIG)?;
    println!("Created {CONFIG_FILE_NAME} configuration file");

    Ok(())
}
