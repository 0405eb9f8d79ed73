use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Percentage adjustments applied to a baseline.
///
/// `revenue_change`, `labor_cost_change` and `supply_cost_change` scale their
/// amount by `1 + change / 100`. `collection_rate_change` is added to the
/// collection rate in percentage points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDeltas {
    #[serde(default)]
    pub revenue_change: f64,
    #[serde(default)]
    pub labor_cost_change: f64,
    #[serde(default)]
    pub supply_cost_change: f64,
    #[serde(default)]
    pub collection_rate_change: f64,
}

impl ScenarioDeltas {
    pub const NAMES: [&'static str; 4] = [
        "revenue_change",
        "labor_cost_change",
        "supply_cost_change",
        "collection_rate_change",
    ];

    /// Build from `(name, value)` pairs. Later pairs override earlier ones;
    /// unknown names are rejected.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut deltas = Self::default();
        for (name, value) in pairs {
            *deltas.slot_mut(name.as_ref())? = value;
        }
        Ok(deltas)
    }

    pub fn with_revenue_change(mut self, change: f64) -> Self {
        self.revenue_change = change;
        self
    }

    pub fn with_labor_cost_change(mut self, change: f64) -> Self {
        self.labor_cost_change = change;
        self
    }

    pub fn with_supply_cost_change(mut self, change: f64) -> Self {
        self.supply_cost_change = change;
        self
    }

    pub fn with_collection_rate_change(mut self, change: f64) -> Self {
        self.collection_rate_change = change;
        self
    }

    fn slot_mut(&mut self, name: &str) -> Result<&mut f64> {
        match name {
            "revenue_change" => Ok(&mut self.revenue_change),
            "labor_cost_change" => Ok(&mut self.labor_cost_change),
            "supply_cost_change" => Ok(&mut self.supply_cost_change),
            "collection_rate_change" => Ok(&mut self.collection_rate_change),
            other => Err(Error::validation(format!(
                "unknown scenario delta `{other}` (expected one of: {})",
                Self::NAMES.join(", ")
            ))),
        }
    }

    fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("revenue_change", self.revenue_change),
            ("labor_cost_change", self.labor_cost_change),
            ("supply_cost_change", self.supply_cost_change),
            ("collection_rate_change", self.collection_rate_change),
        ]
    }

    /// Reject non-finite deltas and deltas outside `limits`.
    pub fn validate(&self, limits: &ScenarioLimits) -> Result<()> {
        for (name, value) in self.entries() {
            let limit = limits.limit_for(name);
            if !value.is_finite() {
                return Err(Error::validation(format!("{name} must be a finite number")));
            }
            if value.abs() > limit {
                return Err(Error::validation(format!(
                    "{name} of {value}% is outside ±{limit}%"
                )));
            }
        }
        Ok(())
    }
}

/// Largest absolute delta accepted per adjustment, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioLimits {
    #[serde(default = "default_revenue_limit")]
    pub revenue_change: f64,

    #[serde(default = "default_cost_limit")]
    pub labor_cost_change: f64,

    #[serde(default = "default_cost_limit")]
    pub supply_cost_change: f64,

    #[serde(default = "default_cost_limit")]
    pub collection_rate_change: f64,
}

impl Default for ScenarioLimits {
    fn default() -> Self {
        Self {
            revenue_change: default_revenue_limit(),
            labor_cost_change: default_cost_limit(),
            supply_cost_change: default_cost_limit(),
            collection_rate_change: default_cost_limit(),
        }
    }
}

impl ScenarioLimits {
    fn limit_for(&self, name: &str) -> f64 {
        match name {
            "revenue_change" => self.revenue_change,
            "labor_cost_change" => self.labor_cost_change,
            "supply_cost_change" => self.supply_cost_change,
            _ => self.collection_rate_change,
        }
    }
}

fn default_revenue_limit() -> f64 {
    20.0
}
fn default_cost_limit() -> f64 {
    10.0
}
