//! Stock vs. call-option speculation analytics
//!
//! Compares buying the stock with buying a call on it:
//!
//! ```text
//! stock %  R_S = (S_T - S_0) / S_0 * 100
//! payoff       = max(S_T - K, 0)
//! call %   R_C = (payoff - C) / C * 100
//! gearing      = R_C / R_S
//! ```
//!
//! A deterministic scenario evaluates one future price; the simulated mode
//! evaluates a GBM batch and aggregates it.

use crate::config::SimulationConfig;
use crate::error::{ensure_positive, RiskError, Result};
use crate::estimate::{Estimate, Undefined};
use crate::gbm::GbmSimulator;
use crate::stats::{self, HistogramBin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io;
use tracing::{debug, info};

/// Inputs of one speculation analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParameters {
    /// Spot price S_0
    pub spot: f64,

    /// Call strike K
    pub strike: f64,

    /// Call premium C paid up front
    pub premium: f64,

    /// Future price S_T of the deterministic scenario
    pub future_price: f64,

    /// Annualized drift μ
    pub drift: f64,

    /// Annualized volatility σ
    pub volatility: f64,

    /// Time to expiry in years
    pub years: f64,

    /// Number of Monte Carlo draws N
    pub simulations: usize,
}

impl Default for ScenarioParameters {
    fn default() -> Self {
        Self {
            spot: 666.0,
            strike: 680.0,
            premium: 39.0,
            future_price: 730.0,
            drift: 0.10,
            volatility: 0.25,
            years: 0.35,
            simulations: 20_000,
        }
    }
}

impl ScenarioParameters {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("spot", self.spot)?;
        ensure_positive("strike", self.strike)?;
        ensure_positive("premium", self.premium)?;
        ensure_positive("future_price", self.future_price)?;
        if self.simulations == 0 {
            return Err(RiskError::InvalidSimulationCount);
        }
        // Drift, volatility and horizon are checked by the simulator
        self.simulator().map(|_| ())
    }

    pub fn simulator(&self) -> Result<GbmSimulator> {
        GbmSimulator::new(self.spot, self.drift, self.volatility, self.years)
    }
}

/// Metrics of the deterministic scenario
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    pub stock_return_pct: f64,
    pub call_payoff: f64,
    /// Payoff net of premium
    pub call_profit: f64,
    pub call_return_pct: f64,
    /// Undefined when the stock return is exactly zero
    pub gearing: Estimate<f64>,
}

/// One simulated draw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatedOutcome {
    pub terminal_price: f64,
    pub stock_return_pct: f64,
    pub call_return_pct: f64,
}

impl SimulatedOutcome {
    /// Call profit in currency, recovered from the percentage return
    pub fn call_profit(&self, premium: f64) -> f64 {
        self.call_return_pct / 100.0 * premium
    }
}

/// Aggregates over a simulated batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub simulations: usize,
    /// Share of draws where the whole premium is lost, in [0, 1]
    pub probability_worthless: f64,
    pub expected_stock_return_pct: f64,
    pub expected_call_return_pct: f64,
}

/// Column of a simulation batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeColumn {
    TerminalPrice,
    StockReturnPct,
    CallReturnPct,
}

/// Stock and call PnL at expiry for one terminal price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoffPoint {
    pub terminal_price: f64,
    pub stock_pnl: f64,
    pub call_pnl: f64,
}

/// Parameters, draws and aggregates of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationBatch {
    pub parameters: ScenarioParameters,
    pub outcomes: Vec<SimulatedOutcome>,
    pub summary: SimulationSummary,
}

impl SimulationBatch {
    /// Write the draws as `terminal_price,stock_return_pct,call_return_pct`
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for outcome in &self.outcomes {
            wtr.serialize(outcome)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Read draws written by [`write_csv`](Self::write_csv)
    pub fn read_csv<R: io::Read>(reader: R) -> Result<Vec<SimulatedOutcome>> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut outcomes = Vec::new();
        for record in rdr.deserialize() {
            outcomes.push(record?);
        }
        Ok(outcomes)
    }

    pub fn column(&self, column: OutcomeColumn) -> Vec<f64> {
        self.outcomes
            .iter()
            .map(|o| match column {
                OutcomeColumn::TerminalPrice => o.terminal_price,
                OutcomeColumn::StockReturnPct => o.stock_return_pct,
                OutcomeColumn::CallReturnPct => o.call_return_pct,
            })
            .collect()
    }

    pub fn histogram(&self, column: OutcomeColumn, bins: usize) -> Result<Vec<HistogramBin>> {
        stats::histogram(&self.column(column), bins)
    }
}

/// Derives speculation statistics from scenarios and GBM draws
#[derive(Debug, Clone, Default)]
pub struct OptionPayoffAnalyzer {
    config: SimulationConfig,
}

impl OptionPayoffAnalyzer {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Evaluate stock and call returns at a single future price
    ///
    /// # Example
    ///
    /// ```
    /// use qf_risk::OptionPayoffAnalyzer;
    ///
    /// let analyzer = OptionPayoffAnalyzer::default();
    /// let a = analyzer.analyze_scenario(666.0, 680.0, 39.0, 730.0).unwrap();
    /// assert_eq!(a.call_payoff, 50.0);
    /// assert!((a.gearing.value().unwrap() - 2.9351).abs() < 1e-4);
    /// ```
    pub fn analyze_scenario(
        &self,
        spot: f64,
        strike: f64,
        premium: f64,
        future_price: f64,
    ) -> Result<ScenarioAnalysis> {
        ensure_positive("spot", spot)?;
        ensure_positive("strike", strike)?;
        ensure_positive("premium", premium)?;
        ensure_positive("future_price", future_price)?;

        let stock_return_pct = stock_return_pct(spot, future_price);
        let call_payoff = (future_price - strike).max(0.0);
        let call_profit = call_payoff - premium;
        let call_return_pct = call_profit / premium * 100.0;

        let gearing = if stock_return_pct == 0.0 {
            Estimate::Undefined(Undefined::ZeroStockReturn)
        } else {
            Estimate::Defined(call_return_pct / stock_return_pct)
        };

        Ok(ScenarioAnalysis {
            stock_return_pct,
            call_payoff,
            call_profit,
            call_return_pct,
            gearing,
        })
    }

    /// Per-draw stock and call percentage returns
    pub fn outcomes(
        &self,
        terminal_prices: &[f64],
        spot: f64,
        strike: f64,
        premium: f64,
    ) -> Result<Vec<SimulatedOutcome>> {
        ensure_positive("spot", spot)?;
        ensure_positive("strike", strike)?;
        ensure_positive("premium", premium)?;

        let derive = |&terminal_price: &f64| SimulatedOutcome {
            terminal_price,
            stock_return_pct: stock_return_pct(spot, terminal_price),
            call_return_pct: ((terminal_price - strike).max(0.0) - premium) / premium * 100.0,
        };

        let outcomes = if self.config.parallel {
            terminal_prices.par_iter().map(derive).collect()
        } else {
            terminal_prices.iter().map(derive).collect()
        };
        Ok(outcomes)
    }

    /// Aggregate a batch of draws
    pub fn analyze_simulation(
        &self,
        outcomes: &[SimulatedOutcome],
        premium: f64,
    ) -> Result<SimulationSummary> {
        ensure_positive("premium", premium)?;
        if outcomes.is_empty() {
            return Err(RiskError::InvalidSimulationCount);
        }

        let n = outcomes.len() as f64;
        let floor = -premium + self.config.worthless_tolerance;
        let worthless = outcomes
            .iter()
            .filter(|o| o.call_profit(premium) <= floor)
            .count();

        Ok(SimulationSummary {
            simulations: outcomes.len(),
            probability_worthless: worthless as f64 / n,
            expected_stock_return_pct: outcomes.iter().map(|o| o.stock_return_pct).sum::<f64>() / n,
            expected_call_return_pct: outcomes.iter().map(|o| o.call_return_pct).sum::<f64>() / n,
        })
    }

    /// Simulate and aggregate with a caller-supplied generator
    pub fn run<R: Rng + ?Sized>(
        &self,
        parameters: &ScenarioParameters,
        rng: &mut R,
    ) -> Result<SimulationBatch> {
        parameters.validate()?;
        let prices = parameters
            .simulator()?
            .simulate(rng, parameters.simulations)?;
        self.assemble(parameters, &prices)
    }

    /// Simulate on the rayon pool, reproducible from `seed`
    pub fn run_parallel(&self, parameters: &ScenarioParameters, seed: u64) -> Result<SimulationBatch> {
        parameters.validate()?;
        let prices = parameters.simulator()?.simulate_parallel(
            seed,
            parameters.simulations,
            self.config.chunk_size,
        )?;
        self.assemble(parameters, &prices)
    }

    /// Simulate using the configured seed and execution mode
    ///
    /// Without a configured seed the generator is seeded from OS entropy.
    pub fn run_configured(&self, parameters: &ScenarioParameters) -> Result<SimulationBatch> {
        match (self.config.parallel, self.config.seed) {
            (true, Some(seed)) => self.run_parallel(parameters, seed),
            (true, None) => self.run_parallel(parameters, rand::random()),
            (false, Some(seed)) => self.run(parameters, &mut StdRng::seed_from_u64(seed)),
            (false, None) => self.run(parameters, &mut StdRng::from_entropy()),
        }
    }

    fn assemble(&self, parameters: &ScenarioParameters, prices: &[f64]) -> Result<SimulationBatch> {
        let outcomes = self.outcomes(prices, parameters.spot, parameters.strike, parameters.premium)?;
        let summary = self.analyze_simulation(&outcomes, parameters.premium)?;
        info!(
            "Simulated {} draws: P(worthless)={:.4}, E[stock %]={:.4}, E[call %]={:.4}",
            summary.simulations,
            summary.probability_worthless,
            summary.expected_stock_return_pct,
            summary.expected_call_return_pct
        );
        Ok(SimulationBatch {
            parameters: *parameters,
            outcomes,
            summary,
        })
    }

    /// Stock and call PnL at expiry on `points` prices over [0.5 S_0, 1.5 S_0]
    pub fn payoff_diagram(
        &self,
        spot: f64,
        strike: f64,
        premium: f64,
        points: usize,
    ) -> Result<Vec<PayoffPoint>> {
        ensure_positive("spot", spot)?;
        ensure_positive("strike", strike)?;
        ensure_positive("premium", premium)?;
        if points < 2 {
            return Err(RiskError::InvalidParameter(format!(
                "Payoff diagram needs at least 2 points, got {}",
                points
            )));
        }

        let (lo, hi) = (0.5 * spot, 1.5 * spot);
        let step = (hi - lo) / (points - 1) as f64;
        debug!("Payoff diagram over [{}, {}] with {} points", lo, hi, points);

        Ok((0..points)
            .map(|i| {
                let terminal_price = lo + i as f64 * step;
                PayoffPoint {
                    terminal_price,
                    stock_pnl: terminal_price - spot,
                    call_pnl: (terminal_price - strike).max(0.0) - premium,
                }
            })
            .collect())
    }
}

fn stock_return_pct(spot: f64, terminal_price: f64) -> f64 {
    (terminal_price - spot) / spot * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_textbook_scenario() {
        let analyzer = OptionPayoffAnalyzer::default();
        let a = analyzer.analyze_scenario(666.0, 680.0, 39.0, 730.0).unwrap();

        assert_relative_eq!(a.stock_return_pct, 9.6096, epsilon = 1e-4);
        assert_eq!(a.call_payoff, 50.0);
        assert_eq!(a.call_profit, 11.0);
        assert_relative_eq!(a.call_return_pct, 28.2051, epsilon = 1e-4);
        assert_relative_eq!(a.gearing.value().unwrap(), 2.9351, epsilon = 1e-4);
    }

    #[test]
    fn test_zero_stock_return_gearing_undefined() {
        let analyzer = OptionPayoffAnalyzer::default();
        let a = analyzer.analyze_scenario(666.0, 680.0, 39.0, 666.0).unwrap();

        assert_eq!(a.stock_return_pct, 0.0);
        assert_eq!(a.gearing, Estimate::Undefined(Undefined::ZeroStockReturn));
        assert_eq!(a.call_return_pct, -100.0);
    }

    #[test]
    fn test_out_of_the_money_loses_premium() {
        let analyzer = OptionPayoffAnalyzer::default();
        let a = analyzer.analyze_scenario(666.0, 680.0, 39.0, 600.0).unwrap();
        assert_eq!(a.call_payoff, 0.0);
        assert_eq!(a.call_return_pct, -100.0);
        assert!(a.gearing.value().unwrap() > 0.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let analyzer = OptionPayoffAnalyzer::default();
        assert!(analyzer.analyze_scenario(0.0, 680.0, 39.0, 730.0).is_err());
        assert!(analyzer.analyze_scenario(666.0, 680.0, -1.0, 730.0).is_err());
        assert!(analyzer.analyze_simulation(&[], 39.0).is_err());

        let params = ScenarioParameters {
            simulations: 0,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(RiskError::InvalidSimulationCount)));

        let params = ScenarioParameters {
            years: -1.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_analyze_simulation_counts_worthless() {
        let analyzer = OptionPayoffAnalyzer::default();
        let prices = [600.0, 680.0, 700.0, 760.0];
        let outcomes = analyzer.outcomes(&prices, 666.0, 680.0, 39.0).unwrap();
        let summary = analyzer.analyze_simulation(&outcomes, 39.0).unwrap();

        // 600 and exactly-at-strike 680 expire worthless
        assert_eq!(summary.simulations, 4);
        assert_relative_eq!(summary.probability_worthless, 0.5);

        let expected_stock = prices.iter().map(|p| (p - 666.0) / 666.0 * 100.0).sum::<f64>() / 4.0;
        assert_relative_eq!(summary.expected_stock_return_pct, expected_stock, epsilon = 1e-12);
        let expected_call = [-100.0, -100.0, (20.0 - 39.0) / 39.0 * 100.0, (80.0 - 39.0) / 39.0 * 100.0]
            .iter()
            .sum::<f64>()
            / 4.0;
        assert_relative_eq!(summary.expected_call_return_pct, expected_call, epsilon = 1e-12);
    }

    #[test]
    fn test_run_is_reproducible() {
        let analyzer = OptionPayoffAnalyzer::default();
        let params = ScenarioParameters {
            simulations: 2_000,
            ..Default::default()
        };

        let a = analyzer.run(&params, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = analyzer.run(&params, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.outcomes.len(), 2_000);
        assert!((0.0..=1.0).contains(&a.summary.probability_worthless));
    }

    #[test]
    fn test_run_configured_uses_seed() {
        let config = SimulationConfig {
            seed: Some(5),
            parallel: true,
            chunk_size: 256,
            ..Default::default()
        };
        let analyzer = OptionPayoffAnalyzer::new(config);
        let params = ScenarioParameters {
            simulations: 1_000,
            ..Default::default()
        };

        let a = analyzer.run_configured(&params).unwrap();
        let b = analyzer.run_parallel(&params, 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_csv_export_round_trip() {
        let analyzer = OptionPayoffAnalyzer::default();
        let params = ScenarioParameters {
            simulations: 25,
            ..Default::default()
        };
        let batch = analyzer.run(&params, &mut StdRng::seed_from_u64(1)).unwrap();

        let mut buf = Vec::new();
        batch.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("terminal_price,stock_return_pct,call_return_pct"));
        assert_eq!(text.lines().count(), 26);

        let outcomes = SimulationBatch::read_csv(buf.as_slice()).unwrap();
        assert_eq!(outcomes.len(), 25);
        for (read, original) in outcomes.iter().zip(&batch.outcomes) {
            assert_relative_eq!(read.terminal_price, original.terminal_price, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_payoff_diagram() {
        let analyzer = OptionPayoffAnalyzer::default();
        let points = analyzer.payoff_diagram(666.0, 680.0, 39.0, 400).unwrap();

        assert_eq!(points.len(), 400);
        assert_relative_eq!(points[0].terminal_price, 333.0);
        assert_relative_eq!(points[399].terminal_price, 999.0, epsilon = 1e-9);
        assert_eq!(points[0].call_pnl, -39.0);
        assert_relative_eq!(points[399].call_pnl, 999.0 - 680.0 - 39.0, epsilon = 1e-9);
        assert!(analyzer.payoff_diagram(666.0, 680.0, 39.0, 1).is_err());
    }

    #[test]
    fn test_histogram_covers_batch() {
        let analyzer = OptionPayoffAnalyzer::default();
        let params = ScenarioParameters {
            simulations: 500,
            ..Default::default()
        };
        let batch = analyzer.run(&params, &mut StdRng::seed_from_u64(3)).unwrap();
        let bins = batch.histogram(OutcomeColumn::CallReturnPct, 60).unwrap();

        assert_eq!(bins.len(), 60);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 500);
    }
}
