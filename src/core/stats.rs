use super::types::{SimulationResult, Statistics};
use crate::error::{Result, SimulationError};

/// Reduces outcomes to bankruptcy odds and average/min/max.
///
/// The average is floored; odds are a percentage rounded to one decimal.
pub fn compute(outcomes: &[i64], bankrupt_count: u32) -> Result<Statistics> {
    let (Some(&minimum), Some(&maximum)) = (outcomes.iter().min(), outcomes.iter().max()) else {
        return Err(SimulationError::NoOutcomes);
    };

    let runs = outcomes.len();
    let total: i128 = outcomes.iter().map(|&v| v as i128).sum();
    let average = total.div_euclid(runs as i128) as i64;
    let odds = round_to_tenth(100.0 * bankrupt_count as f64 / runs as f64);
    let zero_outcome_count = outcomes.iter().filter(|&&v| v == 0).count();

    if zero_outcome_count != bankrupt_count as usize {
        tracing::warn!(
            zero_outcomes = zero_outcome_count,
            bankrupt = bankrupt_count,
            "zero-valued outcomes and bankrupt runs disagree"
        );
    }

    Ok(Statistics {
        runs,
        bankrupt_count,
        zero_outcome_count,
        odds_of_bankruptcy: odds,
        average_outcome: average,
        minimum_outcome: minimum,
        maximum_outcome: maximum,
    })
}

pub fn compute_result(result: &SimulationResult) -> Result<Statistics> {
    compute(&result.outcomes, result.bankrupt_count)
}

/// Rounds the stored value in decimal; exact ties go to even.
fn round_to_tenth(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}
