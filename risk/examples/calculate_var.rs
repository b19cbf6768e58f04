//! VaR calculation example
//!
//! Demonstrates historical, parametric and EVT Value at Risk on a return
//! series, either from a `date,ret` CSV given as the first argument or
//! from a synthetic fat-tailed sample.
//!
//! Run with: cargo run --example calculate_var [-- returns.csv]

use qf_risk::*;
use rand::SeedableRng;
use rand_distr::{Distribution, StudentT};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    println!("=== Value at Risk (VaR) Calculation Example ===\n");

    // 1. Load returns, or simulate ~4 years of daily returns
    let returns = match std::env::args().nth(1) {
        Some(path) => {
            let mut cache = SeriesCache::new();
            (*cache.load(&path)?).clone()
        }
        None => {
            let mut rng = rand::rngs::StdRng::seed_from_u64(42);
            let t = StudentT::new(3.5)?;
            (0..1_000).map(|_| 0.012 * t.sample(&mut rng)).collect()
        }
    };

    let summary = returns.summary();
    println!("Sample returns statistics:");
    println!("  Observations: {}", summary.observations);
    println!("  Mean (daily): {:.4}", summary.mean.unwrap_or(f64::NAN));
    println!("  Std (daily): {:.4}", summary.std_dev.unwrap_or(f64::NAN));
    println!("  Skew: {:.2}", summary.skewness.unwrap_or(f64::NAN));
    println!();

    // 2. Engine with default configuration (EVT threshold at the 90% loss quantile)
    let toolkit = RiskToolkit::new(RiskConfig::default())?;
    let notional = 100_000.0;

    // 3. Compare methods across confidence levels
    println!("{:<12} {:>8} {:>14} {:>16}", "Method", "Alpha", "VaR", "VaR (EUR)");
    println!("{:-<53}", "");
    for alpha in [0.90, 0.95, 0.99] {
        for method in [VarMethod::Historical, VarMethod::Parametric, VarMethod::Evt] {
            let result = toolkit.var.estimate(&returns, alpha, method)?;
            println!(
                "{:<12} {:>8.2} {:>14.6} {:>16.0}",
                method.as_str(),
                alpha,
                result.estimate,
                result.notional_loss(notional)
            );
        }
    }
    println!();

    // 4. Inspect the fitted tail
    println!("--- GPD tail fit ---");
    match toolkit.tail.fit(&returns, toolkit.config.var.evt_threshold_quantile)? {
        Estimate::Defined(fit) => {
            println!("Threshold u: {:.6}", fit.threshold);
            println!("Shape ξ: {:.4}", fit.shape);
            println!("Scale β: {:.6}", fit.scale);
            println!("Exceedances: {} of {}", fit.exceedances, fit.observations);
        }
        Estimate::Undefined(reason) => println!("Tail fit undefined: {}", reason),
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
