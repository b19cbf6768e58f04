//! Speculation and gearing example
//!
//! Compares buying the stock outright against buying a call, first for a
//! single assumed future price and then across GBM-simulated prices.
//!
//! Run with: cargo run --example speculation_gearing [-- outcomes.csv]

use qf_risk::*;
use rand::SeedableRng;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    println!("=== Speculation and Gearing Example ===\n");

    let params = ScenarioParameters::default();
    let analyzer = OptionPayoffAnalyzer::default();

    println!("Spot: {:.2}  Strike: {:.2}  Premium: {:.2}", params.spot, params.strike, params.premium);
    println!("Drift: {:.2}  Volatility: {:.2}  Years: {:.2}\n", params.drift, params.volatility, params.years);

    // 1. Single scenario
    println!("--- Scenario at future price {:.2} ---", params.future_price);
    let scenario = analyzer.analyze_scenario(
        params.spot,
        params.strike,
        params.premium,
        params.future_price,
    )?;
    println!("Stock return: {:.2}%", scenario.stock_return_pct);
    println!("Call payoff: {:.2}", scenario.call_payoff);
    println!("Call profit: {:.2}", scenario.call_profit);
    println!("Call return: {:.2}%", scenario.call_return_pct);
    println!("Gearing: {:.2}", scenario.gearing);
    println!();

    // 2. Payoff at expiry
    println!("--- Payoff diagram ---");
    println!("{:>12} {:>12} {:>12}", "Price", "Stock PnL", "Call PnL");
    for point in analyzer
        .payoff_diagram(params.spot, params.strike, params.premium, 11)?
        .iter()
    {
        println!(
            "{:>12.2} {:>12.2} {:>12.2}",
            point.terminal_price, point.stock_pnl, point.call_pnl
        );
    }
    println!();

    // 3. Monte Carlo
    println!("--- Simulation ({} draws) ---", params.simulations);
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let batch = analyzer.run(&params, &mut rng)?;
    let s = &batch.summary;
    println!("P(option expires worthless): {:.2}%", s.probability_worthless * 100.0);
    println!("E[stock return]: {:.2}%", s.expected_stock_return_pct);
    println!("E[call return]: {:.2}%", s.expected_call_return_pct);
    println!();

    println!("Call return distribution:");
    for bin in batch.histogram(OutcomeColumn::CallReturnPct, 10)? {
        println!("  [{:>9.1}, {:>9.1}) {}", bin.lower, bin.upper, bin.count);
    }

    // 4. Optional export
    if let Some(path) = std::env::args().nth(1) {
        let file = std::fs::File::create(&path)?;
        batch.write_csv(file)?;
        println!("\nOutcomes written to {}", path);
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
