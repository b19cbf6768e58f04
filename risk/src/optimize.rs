//! Derivative-free minimization
//!
//! Nelder-Mead simplex search, used for the GPD likelihood where the
//! objective is infinite outside the parameter support.

use crate::error::{RiskError, Result};

/// Configuration for the simplex search
#[derive(Debug, Clone, Copy)]
pub struct OptimizationConfig {
    /// Stop when the simplex values and vertices agree within this tolerance
    pub tolerance: f64,
    /// Maximum number of iterations
    pub max_iterations: u32,
    /// Offset of the initial simplex vertices from the start point
    pub initial_step: f64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 2_000,
            initial_step: 0.1,
        }
    }
}

/// Result of an optimization run
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Best parameters found
    pub parameters: Vec<f64>,
    /// Objective value at `parameters`
    pub objective_value: f64,
    pub iterations: u32,
    pub converged: bool,
}

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimize `f` starting from `initial`
///
/// `f` may return `f64::INFINITY` for infeasible points; such vertices are
/// simply ranked last. The start point itself must be feasible.
pub fn nelder_mead<F>(
    f: F,
    initial: &[f64],
    config: &OptimizationConfig,
) -> Result<OptimizationResult>
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return Err(RiskError::InvalidParameter(
            "Cannot optimize over zero parameters".to_string(),
        ));
    }
    let start_value = f(initial);
    if !start_value.is_finite() {
        return Err(RiskError::NumericalInstability(
            "Objective is not finite at the start point".to_string(),
        ));
    }

    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    simplex.push((initial.to_vec(), start_value));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        vertex[i] += config.initial_step;
        let value = f(&vertex);
        simplex.push((vertex, value));
    }

    for iteration in 0..config.max_iterations {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

        let best = simplex[0].1;
        let worst = simplex[n].1;
        let spread = (worst - best).abs();
        let size = simplex[1..]
            .iter()
            .flat_map(|(v, _)| v.iter().zip(&simplex[0].0).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max);
        if worst.is_finite() && spread <= config.tolerance && size <= config.tolerance.sqrt() {
            return Ok(finish(simplex, iteration, true));
        }

        // Centroid of all vertices except the worst
        let mut centroid = vec![0.0; n];
        for (vertex, _) in &simplex[..n] {
            for (c, x) in centroid.iter_mut().zip(vertex) {
                *c += x / n as f64;
            }
        }

        let along = |t: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(&simplex[n].0)
                .map(|(c, w)| c + t * (c - w))
                .collect()
        };

        let reflected = along(REFLECTION);
        let f_reflected = f(&reflected);

        if f_reflected < simplex[0].1 {
            let expanded = along(EXPANSION);
            let f_expanded = f(&expanded);
            simplex[n] = if f_expanded < f_reflected {
                (expanded, f_expanded)
            } else {
                (reflected, f_reflected)
            };
            continue;
        }

        if f_reflected < simplex[n - 1].1 {
            simplex[n] = (reflected, f_reflected);
            continue;
        }

        // Outside contraction when the reflection beat the worst vertex,
        // inside contraction otherwise
        let (contracted, f_contracted) = if f_reflected < simplex[n].1 {
            let p = along(CONTRACTION);
            let v = f(&p);
            (p, v)
        } else {
            let p = along(-CONTRACTION);
            let v = f(&p);
            (p, v)
        };

        if f_contracted < simplex[n].1.min(f_reflected) {
            simplex[n] = (contracted, f_contracted);
            continue;
        }

        let anchor = simplex[0].0.clone();
        for (vertex, value) in simplex.iter_mut().skip(1) {
            for (x, a) in vertex.iter_mut().zip(&anchor) {
                *x = a + SHRINK * (*x - a);
            }
            *value = f(vertex.as_slice());
        }

        if iteration + 1 == config.max_iterations {
            break;
        }
    }

    simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(finish(simplex, config.max_iterations, false))
}

fn finish(mut simplex: Vec<(Vec<f64>, f64)>, iterations: u32, converged: bool) -> OptimizationResult {
    let (parameters, objective_value) = simplex.swap_remove(0);
    OptimizationResult {
        parameters,
        objective_value,
        iterations,
        converged,
    }
}
