use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Triangular};
use rayon::prelude::*;

use super::types::{InflationSeries, ReturnSeries, SimulationParameters, SimulationResult};
use crate::error::{Result, SimulationError};

/// Source of the two random draws each run needs.
pub trait HorizonSampler {
    /// Historical start index in `[0, series_len)`.
    fn start_year(&mut self, series_len: usize) -> usize;

    /// Retirement length in whole years.
    fn duration(&mut self) -> u32;
}

/// Draws start years uniformly and durations from the triangular
/// `(min_years, max_years, most_likely_years)` distribution.
pub struct HistoricalSampler<R> {
    rng: R,
    horizon: Triangular<f64>,
}

impl<R: Rng> HistoricalSampler<R> {
    pub fn new(rng: R, params: &SimulationParameters) -> Result<Self> {
        let horizon = Triangular::new(
            params.min_years() as f64,
            params.max_years() as f64,
            params.most_likely_years() as f64,
        )
        .map_err(|e| SimulationError::Distribution(e.to_string()))?;
        Ok(Self { rng, horizon })
    }
}

impl<R: Rng> HorizonSampler for HistoricalSampler<R> {
    fn start_year(&mut self, series_len: usize) -> usize {
        self.rng.random_range(0..series_len)
    }

    fn duration(&mut self) -> u32 {
        // Truncated, not rounded.
        self.horizon.sample(&mut self.rng) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunOutcome {
    value: i64,
    bankrupt: bool,
    years_simulated: u32,
}

impl RunOutcome {
    fn reported_value(self) -> i64 {
        if self.bankrupt { 0 } else { self.value }
    }
}

/// Runs `num_sim` trials in order, all drawing from `sampler`.
pub fn run<S: HorizonSampler + ?Sized>(
    params: &SimulationParameters,
    returns: &ReturnSeries,
    inflation: &InflationSeries,
    sampler: &mut S,
) -> SimulationResult {
    let runs = (0..params.num_sim())
        .map(|_| sample_and_simulate(params, returns, inflation, &mut *sampler));
    collect_result(runs, params.num_sim() as usize)
}

/// Runs trials in parallel; run `i` draws from its own generator seeded with
/// `derive_seed(master_seed, i)`, so the result depends only on `master_seed`.
pub fn run_seeded(
    params: &SimulationParameters,
    returns: &ReturnSeries,
    inflation: &InflationSeries,
    master_seed: u64,
) -> Result<SimulationResult> {
    // Fail on distribution parameters once, before fanning out.
    HistoricalSampler::new(StdRng::seed_from_u64(master_seed), params)?;

    let runs = (0..params.num_sim())
        .into_par_iter()
        .map(|run_index| -> Result<RunOutcome> {
            let rng = StdRng::seed_from_u64(derive_seed(master_seed, run_index));
            let mut sampler = HistoricalSampler::new(rng, params)?;
            Ok(sample_and_simulate(params, returns, inflation, &mut sampler))
        })
        .collect::<Result<Vec<_>>>()?;

    let result = collect_result(runs, params.num_sim() as usize);
    tracing::debug!(
        seed = master_seed,
        runs = result.outcomes.len(),
        bankrupt = result.bankrupt_count,
        "seeded simulation finished"
    );
    Ok(result)
}

fn collect_result(
    runs: impl IntoIterator<Item = RunOutcome>,
    capacity: usize,
) -> SimulationResult {
    let mut outcomes = Vec::with_capacity(capacity);
    let mut bankrupt_count = 0_u32;
    for run in runs {
        if run.bankrupt {
            bankrupt_count += 1;
        }
        outcomes.push(run.reported_value());
    }
    SimulationResult {
        outcomes,
        bankrupt_count,
    }
}

fn sample_and_simulate<S: HorizonSampler + ?Sized>(
    params: &SimulationParameters,
    returns: &ReturnSeries,
    inflation: &InflationSeries,
    sampler: &mut S,
) -> RunOutcome {
    let start_year = sampler.start_year(returns.len());
    let duration = sampler.duration();
    simulate_run(params, returns, inflation, start_year, duration)
}

fn simulate_run(
    params: &SimulationParameters,
    returns: &ReturnSeries,
    inflation: &InflationSeries,
    start_year: usize,
    duration: u32,
) -> RunOutcome {
    let mut portfolio = params.start_value();
    let mut withdrawal = params.withdrawal();

    for (index, year) in (start_year..start_year + duration as usize).enumerate() {
        if index > 0 {
            withdrawal = (withdrawal as f64 * (1.0 + inflation.rate(year))) as i64;
        }

        portfolio -= withdrawal;
        portfolio = (portfolio as f64 * (1.0 + returns.rate(year))) as i64;

        if portfolio <= 0 {
            return RunOutcome {
                value: portfolio,
                bankrupt: true,
                years_simulated: index as u32 + 1,
            };
        }
    }

    RunOutcome {
        value: portfolio,
        bankrupt: false,
        years_simulated: duration,
    }
}

pub fn derive_seed(master_seed: u64, run_index: u32) -> u64 {
    let mixed = master_seed ^ ((run_index as u64) << 32) ^ run_index as u64;
    splitmix64(mixed)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
