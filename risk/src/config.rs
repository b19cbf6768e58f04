//! Engine configuration
//!
//! Every field has a serde default, so a partial YAML document such as
//!
//! ```yaml
//! var:
//!   method: evt
//! simulation:
//!   seed: 42
//! ```
//!
//! is a complete configuration.

use crate::error::{ensure_confidence, ensure_threshold_quantile, RiskError, Result};
use crate::var::VarMethod;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete risk engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default)]
    pub var: VarConfig,

    #[serde(default)]
    pub tail: TailConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Value-at-Risk defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarConfig {
    /// Confidence level used when the caller does not pick one
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,

    #[serde(default)]
    pub method: VarMethod,

    /// Loss quantile used as the EVT threshold
    #[serde(default = "default_evt_threshold_quantile")]
    pub evt_threshold_quantile: f64,

    /// Minimum clean observations before any VaR is defined
    #[serde(default = "default_min_observations")]
    pub min_observations: usize,
}

/// GPD tail fitting parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailConfig {
    /// Fewer exceedances than this leave the EVT estimate undefined
    #[serde(default = "default_min_exceedances")]
    pub min_exceedances: usize,

    /// Likelihood search tolerance
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

/// Monte Carlo settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Random seed for reproducible simulations (None = entropy)
    #[serde(default)]
    pub seed: Option<u64>,

    /// Sample draws on the rayon pool
    #[serde(default)]
    pub parallel: bool,

    /// Draws per independently seeded chunk in parallel mode
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Slack when deciding a call expired worthless
    #[serde(default = "default_worthless_tolerance")]
    pub worthless_tolerance: f64,
}

fn default_confidence_level() -> f64 {
    0.95
}

fn default_evt_threshold_quantile() -> f64 {
    0.90
}

fn default_min_observations() -> usize {
    2
}

fn default_min_exceedances() -> usize {
    10
}

fn default_tolerance() -> f64 {
    1e-10
}

fn default_max_iterations() -> u32 {
    2_000
}

fn default_chunk_size() -> usize {
    4_096
}

fn default_worthless_tolerance() -> f64 {
    1e-12
}

impl Default for VarConfig {
    fn default() -> Self {
        Self {
            confidence_level: default_confidence_level(),
            method: VarMethod::default(),
            evt_threshold_quantile: default_evt_threshold_quantile(),
            min_observations: default_min_observations(),
        }
    }
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            min_exceedances: default_min_exceedances(),
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            parallel: false,
            chunk_size: default_chunk_size(),
            worthless_tolerance: default_worthless_tolerance(),
        }
    }
}

impl RiskConfig {
    /// Load configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: RiskConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: RiskConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| RiskError::ConfigError(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path.as_ref(), yaml).map_err(|e| RiskError::ConfigError(e.to_string()))?;
        Ok(())
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        ensure_confidence(self.var.confidence_level)?;
        ensure_threshold_quantile(self.var.evt_threshold_quantile)?;

        if self.var.min_observations < 2 {
            return Err(RiskError::ConfigError(
                "var.min_observations must be at least 2".to_string(),
            ));
        }
        if self.tail.min_exceedances < 2 {
            return Err(RiskError::ConfigError(
                "tail.min_exceedances must be at least 2".to_string(),
            ));
        }
        if !(self.tail.tolerance > 0.0) || self.tail.max_iterations == 0 {
            return Err(RiskError::ConfigError(
                "tail.tolerance and tail.max_iterations must be positive".to_string(),
            ));
        }
        if self.simulation.chunk_size == 0 {
            return Err(RiskError::ConfigError(
                "simulation.chunk_size must be positive".to_string(),
            ));
        }
        if !(self.simulation.worthless_tolerance >= 0.0) {
            return Err(RiskError::ConfigError(
                "simulation.worthless_tolerance must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
