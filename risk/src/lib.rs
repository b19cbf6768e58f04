//! # qf-risk: Value-at-Risk, Tail Risk and Speculation Analytics
//!
//! This library estimates risk metrics from a series of asset returns and
//! simulates option-based speculative payoffs under geometric Brownian
//! motion.
//!
//! ## Core Components
//!
//! - **VarEngine**: Historical, parametric and EVT (peaks-over-threshold) VaR
//! - **TailFitter**: Generalized Pareto maximum-likelihood fit of loss exceedances
//! - **GbmSimulator**: Exact lognormal terminal-price sampling with injected randomness
//! - **OptionPayoffAnalyzer**: Stock vs. call returns, gearing and simulated aggregates
//!
//! Data insufficiency is never an error: estimators return
//! [`Estimate::Undefined`] with the reason, while invalid arguments surface
//! as [`RiskError`].
//!
//! The [`stats`] module is public so callers can compute the same
//! interpolated quantiles and summary statistics the estimators use, for
//! example the empirical loss quantile an EVT estimate is checked against.
//!
//! ## Example Usage
//!
//! ```rust
//! use qf_risk::{OptionPayoffAnalyzer, ReturnSeries, VarEngine, VarMethod};
//!
//! let returns = ReturnSeries::new(vec![
//!     -0.05, -0.02, 0.01, 0.03, -0.01, 0.02, -0.04, 0.00, 0.015, -0.03,
//! ]);
//!
//! let engine = VarEngine::default();
//! let var = engine.estimate(&returns, 0.95, VarMethod::Historical).unwrap();
//! assert!((var.estimate.value().unwrap() + 0.0255).abs() < 1e-12);
//!
//! // Too few tail observations for EVT: undefined, not an error
//! let evt = engine.estimate(&returns, 0.99, VarMethod::Evt).unwrap();
//! assert!(!evt.estimate.is_defined());
//!
//! let analyzer = OptionPayoffAnalyzer::default();
//! let scenario = analyzer.analyze_scenario(666.0, 680.0, 39.0, 730.0).unwrap();
//! assert_eq!(scenario.call_payoff, 50.0);
//! ```

mod config;
mod error;
mod estimate;
mod gbm;
mod loader;
mod optimize;
mod payoff;
mod series;
pub mod stats;
mod tail;
mod var;

pub use config::{RiskConfig, SimulationConfig, TailConfig, VarConfig};
pub use error::{Result, RiskError};
pub use estimate::{Estimate, Undefined};
pub use gbm::GbmSimulator;
pub use loader::{load_returns_csv, read_returns_csv, SeriesCache};
pub use optimize::{nelder_mead, OptimizationConfig, OptimizationResult};
pub use payoff::{
    OptionPayoffAnalyzer, OutcomeColumn, PayoffPoint, ScenarioAnalysis, ScenarioParameters,
    SimulatedOutcome, SimulationBatch, SimulationSummary,
};
pub use series::{ReturnSeries, SeriesSummary};
pub use stats::HistogramBin;
pub use tail::{gpd_log_likelihood, TailFit, TailFitter};
pub use var::{historical_var, parametric_var, VarEngine, VarMethod, VarResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing subscriber (for examples and tests)
///
/// Honours `RUST_LOG`, defaulting to `qf_risk=info`. Calling it twice is
/// harmless.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("qf_risk=info"));

    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

/// Risk components built from one [`RiskConfig`]
///
/// # Example
///
/// ```
/// use qf_risk::{ReturnSeries, RiskToolkit};
///
/// let toolkit = RiskToolkit::from_yaml("var:\n  confidence_level: 0.99\n").unwrap();
/// let returns = ReturnSeries::new(vec![0.01, -0.02, 0.005, -0.01]);
/// let result = toolkit.default_var(&returns).unwrap();
/// assert_eq!(result.confidence_level, 0.99);
/// ```
#[derive(Debug, Clone)]
pub struct RiskToolkit {
    pub config: RiskConfig,
    pub var: VarEngine,
    pub tail: TailFitter,
    pub payoff: OptionPayoffAnalyzer,
}

impl RiskToolkit {
    pub fn new(config: RiskConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            var: VarEngine::new(config.var.clone(), config.tail.clone()),
            tail: TailFitter::new(config.tail.clone()),
            payoff: OptionPayoffAnalyzer::new(config.simulation.clone()),
            config,
        })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::new(RiskConfig::from_yaml(yaml)?)
    }

    /// VaR at the configured confidence level and method
    pub fn default_var(&self, returns: &ReturnSeries) -> Result<VarResult> {
        self.var
            .estimate(returns, self.config.var.confidence_level, self.config.var.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolkit_from_config() {
        let toolkit = RiskToolkit::new(RiskConfig::default()).unwrap();
        assert_eq!(toolkit.var.config().evt_threshold_quantile, 0.90);
        assert_eq!(toolkit.tail.config().min_exceedances, 10);
        assert_eq!(toolkit.payoff.config().worthless_tolerance, 1e-12);
    }

    #[test]
    fn test_toolkit_rejects_invalid_config() {
        let mut config = RiskConfig::default();
        config.var.confidence_level = 0.0;
        assert!(RiskToolkit::new(config).is_err());
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
    }
}
