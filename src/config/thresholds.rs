use serde::{Deserialize, Serialize};

/// Industry benchmarks the financial KPIs are compared against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Labor cost as a percentage of revenue (lower is better)
    #[serde(default = "default_labor_cost_percentage")]
    pub labor_cost_percentage: f64,

    /// Supply cost as a percentage of revenue (lower is better)
    #[serde(default = "default_supply_cost_percentage")]
    pub supply_cost_percentage: f64,

    #[serde(default = "default_ebitda_margin")]
    pub ebitda_margin: f64,

    #[serde(default = "default_collection_rate")]
    pub collection_rate: f64,

    /// Days sales outstanding (lower is better)
    #[serde(default = "default_dso")]
    pub dso: f64,

    #[serde(default = "default_chair_utilization")]
    pub chair_utilization: f64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            labor_cost_percentage: default_labor_cost_percentage(),
            supply_cost_percentage: default_supply_cost_percentage(),
            ebitda_margin: default_ebitda_margin(),
            collection_rate: default_collection_rate(),
            dso: default_dso(),
            chair_utilization: default_chair_utilization(),
        }
    }
}

fn default_labor_cost_percentage() -> f64 {
    27.0
}
fn default_supply_cost_percentage() -> f64 {
    6.0
}
fn default_ebitda_margin() -> f64 {
    18.0
}
fn default_collection_rate() -> f64 {
    98.0
}
fn default_dso() -> f64 {
    35.0
}
fn default_chair_utilization() -> f64 {
    85.0
}

/// Operating targets drawn as reference lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Claims denial rate target, percent
    #[serde(default = "default_denial_rate")]
    pub denial_rate: f64,

    /// Treatment plan completion target, percent
    #[serde(default = "default_plan_completion")]
    pub plan_completion: f64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            denial_rate: default_denial_rate(),
            plan_completion: default_plan_completion(),
        }
    }
}

fn default_denial_rate() -> f64 {
    5.0
}
fn default_plan_completion() -> f64 {
    100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_tables_keep_defaults() {
        let benchmarks: BenchmarkConfig = toml::from_str("dso = 40.0").unwrap();
        assert_eq!(benchmarks.dso, 40.0);
        assert_eq!(benchmarks.labor_cost_percentage, 27.0);

        let targets: TargetConfig = toml::from_str("").unwrap();
        assert_eq!(targets, TargetConfig::default());
    }
}
