//! Peaks-over-threshold tail fitting
//!
//! Losses above a fixed threshold quantile `u` are modelled with a
//! Generalized Pareto Distribution (location 0, shape ξ, scale β):
//!
//! ```text
//! G(y) = 1 - (1 + ξ y / β)^(-1/ξ)     ξ != 0
//! G(y) = 1 - exp(-y / β)              ξ == 0
//! ```
//!
//! ξ and β are maximum-likelihood estimates; the threshold is not fitted
//! jointly.

use crate::config::TailConfig;
use crate::error::{ensure_confidence, ensure_threshold_quantile, RiskError, Result};
use crate::estimate::{Estimate, Undefined};
use crate::optimize::{nelder_mead, OptimizationConfig};
use crate::series::ReturnSeries;
use crate::stats;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Shapes closer to zero than this use the exponential likelihood
const EXPONENTIAL_SHAPE_EPS: f64 = 1e-10;

/// Fitted GPD tail over threshold exceedances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailFit {
    /// Threshold u in loss units
    pub threshold: f64,

    /// Shape ξ (negative: bounded tail, zero: exponential, positive: heavy)
    pub shape: f64,

    /// Scale β, always positive
    pub scale: f64,

    /// Number of losses above the threshold (m)
    pub exceedances: usize,

    /// Number of clean losses the threshold was taken from (n)
    pub observations: usize,
}

impl TailFit {
    /// Empirical probability of exceeding the threshold, m / n
    pub fn exceedance_probability(&self) -> f64 {
        self.exceedances as f64 / self.observations as f64
    }

    /// Loss quantile at confidence `alpha` extrapolated from the tail
    ///
    /// With p = 1 - alpha and p_u = m / n:
    ///
    /// ```text
    /// ξ != 0:  u + (β / ξ) * ((p / p_u)^(-ξ) - 1)
    /// ξ == 0:  u + β * ln(p_u / p)
    /// ```
    pub fn tail_quantile(&self, alpha: f64) -> Result<f64> {
        ensure_confidence(alpha)?;
        let p = 1.0 - alpha;
        let p_u = self.exceedance_probability();

        let var = if self.shape != 0.0 {
            self.threshold + (self.scale / self.shape) * ((p / p_u).powf(-self.shape) - 1.0)
        } else {
            self.threshold + self.scale * (p_u / p).ln()
        };
        Ok(var)
    }
}

/// GPD log-likelihood of an exceedance sample
///
/// Returns `f64::NEG_INFINITY` outside the parameter support.
pub fn gpd_log_likelihood(excess: &[f64], shape: f64, scale: f64) -> f64 {
    if scale <= 0.0 || !scale.is_finite() || shape <= -1.0 {
        return f64::NEG_INFINITY;
    }
    let m = excess.len() as f64;

    if shape.abs() < EXPONENTIAL_SHAPE_EPS {
        return -m * scale.ln() - excess.iter().sum::<f64>() / scale;
    }

    let mut log_sum = 0.0;
    for &y in excess {
        let t = 1.0 + shape * y / scale;
        if t <= 0.0 {
            return f64::NEG_INFINITY;
        }
        log_sum += t.ln();
    }
    -m * scale.ln() - (1.0 + 1.0 / shape) * log_sum
}

/// Fits GPD tails to loss exceedances
#[derive(Debug, Clone, Default)]
pub struct TailFitter {
    config: TailConfig,
}

impl TailFitter {
    pub fn new(config: TailConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TailConfig {
        &self.config
    }

    /// Fit a GPD to the losses above the `threshold_quantile` loss quantile
    ///
    /// Yields [`Undefined::InsufficientExceedances`] when fewer than
    /// `min_exceedances` losses lie strictly above the threshold.
    pub fn fit(&self, returns: &ReturnSeries, threshold_quantile: f64) -> Result<Estimate<TailFit>> {
        ensure_threshold_quantile(threshold_quantile)?;

        let losses = stats::sorted(&returns.losses());
        let Some(threshold) = stats::quantile_sorted(&losses, threshold_quantile) else {
            return Ok(Estimate::Undefined(Undefined::InsufficientExceedances {
                required: self.config.min_exceedances,
                available: 0,
            }));
        };

        let excess: Vec<f64> = losses
            .iter()
            .filter(|&&loss| loss > threshold)
            .map(|loss| loss - threshold)
            .collect();

        debug!(
            "Tail threshold {:.6} at q={} leaves {} of {} losses",
            threshold,
            threshold_quantile,
            excess.len(),
            losses.len()
        );

        if excess.len() < self.config.min_exceedances {
            warn!(
                "EVT tail has {} exceedances, {} required",
                excess.len(),
                self.config.min_exceedances
            );
            return Ok(Estimate::Undefined(Undefined::InsufficientExceedances {
                required: self.config.min_exceedances,
                available: excess.len(),
            }));
        }

        let (shape, scale) = self.fit_gpd(&excess)?;

        Ok(Estimate::Defined(TailFit {
            threshold,
            shape,
            scale,
            exceedances: excess.len(),
            observations: losses.len(),
        }))
    }

    /// Maximum-likelihood (shape, scale) for a positive exceedance sample
    pub fn fit_gpd(&self, excess: &[f64]) -> Result<(f64, f64)> {
        if excess.len() < 2 {
            return Err(RiskError::InvalidParameter(format!(
                "GPD fit needs at least 2 exceedances, got {}",
                excess.len()
            )));
        }
        if excess.iter().any(|y| !y.is_finite() || *y < 0.0) {
            return Err(RiskError::InvalidParameter(
                "Exceedances must be finite and non-negative".to_string(),
            ));
        }

        let mean = stats::mean(excess).unwrap_or(0.0);
        if mean <= 0.0 {
            return Err(RiskError::NumericalInstability(
                "Exceedance sample has zero mean".to_string(),
            ));
        }
        let max = excess.iter().copied().fold(0.0, f64::max);

        // Optimise over (ξ, ln β) so the scale stays positive
        let objective = |p: &[f64]| -> f64 {
            let ll = gpd_log_likelihood(excess, p[0], p[1].exp());
            if ll.is_finite() {
                -ll
            } else {
                f64::INFINITY
            }
        };

        let opt_config = OptimizationConfig {
            tolerance: self.config.tolerance,
            max_iterations: self.config.max_iterations,
            ..Default::default()
        };

        let mut best: Option<(Vec<f64>, f64, bool)> = None;
        for start in Self::starting_points(excess, mean, max) {
            if !objective(&start).is_finite() {
                continue;
            }
            let result = nelder_mead(&objective, &start, &opt_config)?;
            let better = best
                .as_ref()
                .map_or(true, |(_, value, _)| result.objective_value < *value);
            if better {
                best = Some((result.parameters, result.objective_value, result.converged));
            }
        }

        let (params, nll, converged) = best.ok_or_else(|| {
            RiskError::NumericalInstability("No feasible GPD starting point".to_string())
        })?;
        if !converged {
            warn!("GPD likelihood search hit the iteration limit (nll={:.6})", nll);
        }

        let shape = params[0];
        let scale = params[1].exp();
        debug!("Fitted GPD shape={:.6} scale={:.6} nll={:.6}", shape, scale, nll);
        Ok((shape, scale))
    }

    /// Method-of-moments and exponential starting values in (ξ, ln β)
    fn starting_points(excess: &[f64], mean: f64, max: f64) -> Vec<Vec<f64>> {
        let mut starts = vec![vec![0.0, mean.ln()]];

        if let Some(sd) = stats::sample_std_dev(excess) {
            let var = sd * sd;
            if var > 0.0 {
                let ratio = mean * mean / var;
                let shape = (0.5 * (1.0 - ratio)).clamp(-0.9, 0.9);
                let mut scale = 0.5 * mean * (1.0 + ratio);
                // A bounded tail must still cover the largest exceedance
                if shape < 0.0 {
                    scale = scale.max(-shape * max * 1.01);
                }
                starts.push(vec![shape, scale.ln()]);
            }
        }
        starts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{Rng, SeedableRng};

    /// Inverse-CDF draws from a GPD
    fn gpd_sample(shape: f64, scale: f64, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let u: f64 = rng.gen_range(0.0..1.0);
                if shape == 0.0 {
                    -scale * (1.0 - u).ln()
                } else {
                    scale / shape * ((1.0 - u).powf(-shape) - 1.0)
                }
            })
            .collect()
    }

    #[test]
    fn test_log_likelihood_support() {
        let excess = [0.5, 1.0, 2.0];
        assert_eq!(gpd_log_likelihood(&excess, 0.1, -1.0), f64::NEG_INFINITY);
        // 1 + (-0.5)(2.0)/1.0 = 0 -> outside support
        assert_eq!(gpd_log_likelihood(&excess, -0.5, 1.0), f64::NEG_INFINITY);
        assert!(gpd_log_likelihood(&excess, 0.2, 1.0).is_finite());
    }

    #[test]
    fn test_log_likelihood_exponential_limit() {
        let excess = [0.3, 0.7, 1.1];
        let exp_ll = gpd_log_likelihood(&excess, 0.0, 0.8);
        let near_ll = gpd_log_likelihood(&excess, 1e-7, 0.8);
        assert_relative_eq!(exp_ll, near_ll, epsilon = 1e-5);
    }

    #[test]
    fn test_fit_recovers_heavy_tail() {
        let fitter = TailFitter::default();
        let excess = gpd_sample(0.3, 0.02, 4_000, 7);
        let (shape, scale) = fitter.fit_gpd(&excess).unwrap();
        assert!((shape - 0.3).abs() < 0.08, "shape {}", shape);
        assert!((scale - 0.02).abs() < 0.003, "scale {}", scale);
    }

    #[test]
    fn test_fit_recovers_exponential_tail() {
        let fitter = TailFitter::default();
        let excess = gpd_sample(0.0, 1.5, 4_000, 11);
        let (shape, scale) = fitter.fit_gpd(&excess).unwrap();
        assert!(shape.abs() < 0.06, "shape {}", shape);
        assert!((scale - 1.5).abs() < 0.12, "scale {}", scale);
    }

    #[test]
    fn test_fit_bounded_tail() {
        let fitter = TailFitter::default();
        let excess = gpd_sample(-0.3, 1.0, 4_000, 3);
        let (shape, scale) = fitter.fit_gpd(&excess).unwrap();
        assert!(shape < 0.0, "shape {}", shape);
        assert!(scale > 0.0);
    }

    #[test]
    fn test_fit_threshold_and_counts() {
        let returns: ReturnSeries = (1..=200).map(|i| -(i as f64) / 1000.0).collect();
        let fit = TailFitter::default()
            .fit(&returns, 0.9)
            .unwrap()
            .value()
            .expect("enough exceedances");

        // losses are 0.001..=0.200; h = 199 * 0.9 = 179.1
        assert_relative_eq!(fit.threshold, 0.1801, epsilon = 1e-12);
        assert_eq!(fit.exceedances, 20);
        assert_eq!(fit.observations, 200);
        assert!(fit.scale > 0.0);
    }

    #[test]
    fn test_insufficient_exceedances() {
        let returns: ReturnSeries = (0..50).map(|i| (i as f64) / 100.0 - 0.25).collect();
        let fit = TailFitter::default().fit(&returns, 0.9).unwrap();
        assert_eq!(
            fit.undefined_reason(),
            Some(Undefined::InsufficientExceedances {
                required: 10,
                available: 5
            })
        );
    }

    #[test]
    fn test_constant_series_has_no_tail() {
        let returns = ReturnSeries::new(vec![-0.01; 100]);
        let fit = TailFitter::default().fit(&returns, 0.9).unwrap();
        assert!(!fit.is_defined());
    }

    #[test]
    fn test_tail_quantile_branches() {
        let fit = TailFit {
            threshold: 0.02,
            shape: 0.0,
            scale: 0.01,
            exceedances: 100,
            observations: 1000,
        };
        // p_u = 0.1, p = 0.01 -> u + β ln 10
        assert_relative_eq!(
            fit.tail_quantile(0.99).unwrap(),
            0.02 + 0.01 * 10.0_f64.ln(),
            epsilon = 1e-12
        );

        let heavy = TailFit { shape: 0.25, ..fit };
        let expected = 0.02 + (0.01 / 0.25) * (0.1_f64.powf(-0.25) - 1.0);
        assert_relative_eq!(heavy.tail_quantile(0.99).unwrap(), expected, epsilon = 1e-12);

        assert!(fit.tail_quantile(1.0).is_err());
    }

    #[test]
    fn test_invalid_threshold_quantile() {
        let returns = ReturnSeries::new(vec![0.01, -0.02]);
        assert!(matches!(
            TailFitter::default().fit(&returns, 1.0),
            Err(RiskError::InvalidThresholdQuantile(_))
        ));
    }
}
