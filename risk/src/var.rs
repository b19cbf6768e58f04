//! Value at Risk (VaR) calculation engine
//!
//! Implements three VaR methodologies over a [`ReturnSeries`]:
//! - Historical VaR: empirical loss quantile with linear interpolation
//! - Parametric VaR: normal losses, VaR = -(μ - z_α σ)
//! - EVT VaR: peaks-over-threshold extrapolation from a fitted GPD tail
//!
//! VaR is stated in loss units (loss = -return) at confidence α.

use crate::config::{TailConfig, VarConfig};
use crate::error::{ensure_confidence, ensure_threshold_quantile, RiskError, Result};
use crate::estimate::{Estimate, Undefined};
use crate::series::ReturnSeries;
use crate::stats;
use crate::tail::TailFitter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// VaR calculation method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarMethod {
    #[default]
    Historical,
    Parametric,
    Evt,
}

impl VarMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            VarMethod::Historical => "historical",
            VarMethod::Parametric => "parametric",
            VarMethod::Evt => "evt",
        }
    }
}

impl fmt::Display for VarMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VarMethod {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "historical" => Ok(VarMethod::Historical),
            "parametric" => Ok(VarMethod::Parametric),
            "evt" => Ok(VarMethod::Evt),
            _ => Err(RiskError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// VaR calculation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarResult {
    /// VaR in loss units, or the reason it is undefined
    pub estimate: Estimate<f64>,

    /// Confidence level (e.g., 0.95, 0.99)
    pub confidence_level: f64,

    /// Calculation method used
    pub method: VarMethod,

    /// Clean observations the estimate was computed from
    pub observations: usize,

    /// Timestamp of calculation
    pub timestamp: DateTime<Utc>,
}

impl VarResult {
    /// VaR in currency for a position of the given notional
    pub fn notional_loss(&self, notional: f64) -> Estimate<f64> {
        self.estimate.map(|var| var * notional)
    }
}

/// VaR calculation engine
#[derive(Debug, Clone, Default)]
pub struct VarEngine {
    config: VarConfig,
    tail_fitter: TailFitter,
}

impl VarEngine {
    /// Create a new VaR engine with configuration
    pub fn new(config: VarConfig, tail: TailConfig) -> Self {
        Self {
            config,
            tail_fitter: TailFitter::new(tail),
        }
    }

    pub fn config(&self) -> &VarConfig {
        &self.config
    }

    /// Estimate VaR with the configured EVT threshold quantile
    ///
    /// # Example
    ///
    /// ```
    /// use qf_risk::{ReturnSeries, VarEngine, VarMethod};
    ///
    /// let engine = VarEngine::default();
    /// let returns = ReturnSeries::new(vec![-0.02; 5]);
    /// let result = engine.estimate(&returns, 0.95, VarMethod::Historical).unwrap();
    /// assert!((result.estimate.value().unwrap() - 0.02).abs() < 1e-12);
    /// ```
    pub fn estimate(
        &self,
        returns: &ReturnSeries,
        confidence_level: f64,
        method: VarMethod,
    ) -> Result<VarResult> {
        self.estimate_with_threshold(
            returns,
            confidence_level,
            method,
            self.config.evt_threshold_quantile,
        )
    }

    /// Estimate VaR with an explicit EVT threshold quantile
    ///
    /// The threshold quantile is validated for every method so a bad
    /// request fails the same way regardless of the method chosen.
    pub fn estimate_with_threshold(
        &self,
        returns: &ReturnSeries,
        confidence_level: f64,
        method: VarMethod,
        threshold_quantile: f64,
    ) -> Result<VarResult> {
        ensure_confidence(confidence_level)?;
        ensure_threshold_quantile(threshold_quantile)?;

        let clean = returns.clean_values();
        let observations = clean.len();

        let estimate = if observations < self.config.min_observations {
            debug!(
                "VaR undefined: {} clean observations, {} required",
                observations, self.config.min_observations
            );
            Estimate::Undefined(Undefined::InsufficientObservations {
                required: self.config.min_observations,
                available: observations,
            })
        } else {
            match method {
                VarMethod::Historical => Estimate::Defined(historical_var(&clean, confidence_level)?),
                VarMethod::Parametric => Estimate::Defined(parametric_var(&clean, confidence_level)?),
                VarMethod::Evt => self.evt_var(returns, confidence_level, threshold_quantile)?,
            }
        };

        debug!(
            "{} VaR at {}: {} ({} observations)",
            method, confidence_level, estimate, observations
        );

        Ok(VarResult {
            estimate,
            confidence_level,
            method,
            observations,
            timestamp: Utc::now(),
        })
    }

    /// Estimate VaR from a method name such as `"parametric"`
    pub fn estimate_named(
        &self,
        returns: &ReturnSeries,
        confidence_level: f64,
        method: &str,
    ) -> Result<VarResult> {
        let method: VarMethod = method.parse()?;
        self.estimate(returns, confidence_level, method)
    }

    fn evt_var(
        &self,
        returns: &ReturnSeries,
        confidence_level: f64,
        threshold_quantile: f64,
    ) -> Result<Estimate<f64>> {
        match self.tail_fitter.fit(returns, threshold_quantile)? {
            Estimate::Defined(fit) => Ok(Estimate::Defined(fit.tail_quantile(confidence_level)?)),
            Estimate::Undefined(reason) => Ok(Estimate::Undefined(reason)),
        }
    }
}

/// Historical VaR of clean returns
///
/// The (1 - α)-quantile of losses, equivalently minus the α-quantile of
/// returns, with linear interpolation between order statistics.
pub fn historical_var(returns: &[f64], confidence_level: f64) -> Result<f64> {
    ensure_confidence(confidence_level)?;
    let losses: Vec<f64> = returns.iter().map(|r| -r).collect();
    stats::quantile(&losses, 1.0 - confidence_level).ok_or_else(|| {
        RiskError::CalculationError("Historical VaR needs at least one return".to_string())
    })
}

/// Parametric (normal) VaR of clean returns
///
/// VaR = -(μ - z_α σ) with the unbiased sample standard deviation.
pub fn parametric_var(returns: &[f64], confidence_level: f64) -> Result<f64> {
    ensure_confidence(confidence_level)?;
    let (Some(mu), Some(sigma)) = (stats::mean(returns), stats::sample_std_dev(returns)) else {
        return Err(RiskError::CalculationError(
            "Parametric VaR needs at least two returns".to_string(),
        ));
    };
    let z = stats::standard_normal_quantile(confidence_level)?;
    Ok(-(mu - z * sigma))
}
