//! Benchmarks for the risk estimators and simulator
//!
//! Run with: cargo bench

use qf_risk::*;
use rand::SeedableRng;

fn main() {
    println!("=== qf-risk Performance Benchmarks ===\n");

    benchmark_var_calculations();
    benchmark_tail_fitting();
    benchmark_simulation();
}

fn sample_returns(n: usize) -> ReturnSeries {
    (0..n)
        .map(|i| (i as f64 * 0.37).sin() * 0.02 + (i as f64 * 1.3).cos().powi(5) * 0.01)
        .collect()
}

fn benchmark_var_calculations() {
    println!("## VaR Calculations");

    let returns = sample_returns(2_500);
    let engine = VarEngine::default();

    for method in [VarMethod::Historical, VarMethod::Parametric, VarMethod::Evt] {
        let iterations = if method == VarMethod::Evt { 20 } else { 1_000 };
        let start = std::time::Instant::now();
        for _ in 0..iterations {
            let _ = engine.estimate(&returns, 0.99, method);
        }
        let elapsed = start.elapsed();
        println!("  {} VaR ({} iterations): {:?}", method, iterations, elapsed);
        println!("  Average: {:?}", elapsed / iterations);
    }

    println!();
}

fn benchmark_tail_fitting() {
    println!("## GPD Tail Fitting");

    let fitter = TailFitter::default();
    for n in [500, 5_000, 50_000] {
        let returns = sample_returns(n);
        let start = std::time::Instant::now();
        let fit = fitter.fit(&returns, 0.90);
        let elapsed = start.elapsed();
        match fit {
            Ok(Estimate::Defined(fit)) => println!(
                "  {} returns: {:?} (shape {:.4}, scale {:.6})",
                n, elapsed, fit.shape, fit.scale
            ),
            Ok(Estimate::Undefined(reason)) => println!("  {} returns: undefined ({})", n, reason),
            Err(e) => println!("  {} returns: error {}", n, e),
        }
    }

    println!();
}

fn benchmark_simulation() {
    println!("## GBM Simulation + Payoff Aggregation");

    let analyzer = OptionPayoffAnalyzer::default();
    let params = ScenarioParameters {
        simulations: 200_000,
        ..Default::default()
    };

    let start = std::time::Instant::now();
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let _ = analyzer.run(&params, &mut rng);
    println!("  Sequential (200,000 draws): {:?}", start.elapsed());

    let start = std::time::Instant::now();
    let _ = analyzer.run_parallel(&params, 42);
    println!("  Parallel (200,000 draws): {:?}", start.elapsed());

    println!();
}
