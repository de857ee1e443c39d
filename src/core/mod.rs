mod engine;
mod stats;
mod types;

pub use engine::{HistoricalSampler, HorizonSampler, derive_seed, run, run_seeded};
pub use stats::{compute, compute_result};
pub use types::{
    InflationSeries, InvestmentType, MAX_RETIREMENT_YEARS, RateSeries, RawParameters,
    ReturnSeries, SimulationParameters, SimulationResult, Statistics,
};
