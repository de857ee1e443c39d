use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ValidationError;

/// Years in retirement must stay strictly below this bound.
pub const MAX_RETIREMENT_YEARS: u32 = 99;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum InvestmentType {
    #[serde(rename = "stocks")]
    Stocks,
    #[serde(rename = "bonds")]
    Bonds,
    #[serde(rename = "50_50_blend")]
    Blend5050,
    #[serde(rename = "40_50_10_blend")]
    Blend405010,
}

impl InvestmentType {
    pub const ALL: [InvestmentType; 4] = [
        InvestmentType::Stocks,
        InvestmentType::Bonds,
        InvestmentType::Blend5050,
        InvestmentType::Blend405010,
    ];

    pub fn label(self) -> &'static str {
        match self {
            InvestmentType::Stocks => "stocks",
            InvestmentType::Bonds => "bonds",
            InvestmentType::Blend5050 => "50_50_blend",
            InvestmentType::Blend405010 => "40_50_10_blend",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            InvestmentType::Stocks => "S&P 500 Index",
            InvestmentType::Bonds => "10-year Treasury Bond",
            InvestmentType::Blend5050 => "50% S&P 500, 50% Treasury Bond",
            InvestmentType::Blend405010 => "40% S&P 500, 50% Treasury Bond, 10% Cash",
        }
    }

    /// Historical annual return file for this allocation.
    pub fn file_name(self) -> &'static str {
        match self {
            InvestmentType::Stocks => "SP500_1926_2013.txt",
            InvestmentType::Bonds => "10yr_treasury_bond_1926-2013.txt",
            InvestmentType::Blend5050 => "50_50_blend_1926-2013.txt",
            InvestmentType::Blend405010 => "40_50_10_blend_1926-2013.txt",
        }
    }
}

impl fmt::Display for InvestmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for InvestmentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        InvestmentType::ALL
            .into_iter()
            .find(|t| t.label() == wanted)
            .ok_or_else(|| ValidationError::UnknownInvestmentType(s.trim().to_string()))
    }
}

/// Annual rates as decimal fractions, indexed cyclically.
///
/// A series is never empty, so [`RateSeries::rate`] is total for every index.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSeries {
    rates: Vec<f64>,
}

pub type ReturnSeries = RateSeries;
pub type InflationSeries = RateSeries;

impl RateSeries {
    /// Returns `None` for an empty sequence.
    pub fn new(rates: Vec<f64>) -> Option<Self> {
        if rates.is_empty() {
            None
        } else {
            Some(Self { rates })
        }
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn rate(&self, index: usize) -> f64 {
        self.rates[index % self.rates.len()]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.rates
    }
}

/// Unchecked parameter values as they arrive from a flag, a prompt or a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawParameters {
    pub invest_type: InvestmentType,
    pub start_value: i64,
    pub withdrawal: i64,
    pub min_years: u32,
    pub most_likely_years: u32,
    pub max_years: u32,
    pub num_sim: u32,
}

/// Parameters that passed every cross-field check; the engine relies on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationParameters {
    invest_type: InvestmentType,
    start_value: i64,
    withdrawal: i64,
    min_years: u32,
    most_likely_years: u32,
    max_years: u32,
    num_sim: u32,
}

impl SimulationParameters {
    pub fn validate(raw: RawParameters) -> Result<Self, ValidationError> {
        if raw.min_years == 0
            || raw.min_years >= raw.most_likely_years
            || raw.most_likely_years >= raw.max_years
            || raw.max_years >= MAX_RETIREMENT_YEARS
        {
            return Err(ValidationError::IllogicalYears {
                min: raw.min_years,
                most_likely: raw.most_likely_years,
                max: raw.max_years,
            });
        }

        if raw.withdrawal >= raw.start_value {
            return Err(ValidationError::WithdrawalTooLarge {
                withdrawal: raw.withdrawal,
                start_value: raw.start_value,
            });
        }

        if raw.start_value <= 0 {
            return Err(ValidationError::NonPositiveStartValue(raw.start_value));
        }

        if raw.withdrawal < 0 {
            return Err(ValidationError::NegativeWithdrawal(raw.withdrawal));
        }

        if raw.num_sim == 0 {
            return Err(ValidationError::NoSimulations);
        }

        Ok(Self {
            invest_type: raw.invest_type,
            start_value: raw.start_value,
            withdrawal: raw.withdrawal,
            min_years: raw.min_years,
            most_likely_years: raw.most_likely_years,
            max_years: raw.max_years,
            num_sim: raw.num_sim,
        })
    }

    pub fn invest_type(&self) -> InvestmentType {
        self.invest_type
    }

    pub fn start_value(&self) -> i64 {
        self.start_value
    }

    pub fn withdrawal(&self) -> i64 {
        self.withdrawal
    }

    pub fn min_years(&self) -> u32 {
        self.min_years
    }

    pub fn most_likely_years(&self) -> u32 {
        self.most_likely_years
    }

    pub fn max_years(&self) -> u32 {
        self.max_years
    }

    pub fn num_sim(&self) -> u32 {
        self.num_sim
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationResult {
    /// Final value per run in execution order; `0` for bankrupt runs.
    pub outcomes: Vec<i64>,
    pub bankrupt_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub runs: usize,
    pub bankrupt_count: u32,
    pub zero_outcome_count: usize,
    pub odds_of_bankruptcy: f64,
    pub average_outcome: i64,
    pub minimum_outcome: i64,
    pub maximum_outcome: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawParameters {
        RawParameters {
            invest_type: InvestmentType::Stocks,
            start_value: 1_000_000,
            withdrawal: 40_000,
            min_years: 20,
            most_likely_years: 30,
            max_years: 40,
            num_sim: 1_000,
        }
    }

    #[test]
    fn validate_accepts_ordered_years() {
        let params = SimulationParameters::validate(raw()).expect("valid parameters");
        assert_eq!(params.min_years(), 20);
        assert_eq!(params.most_likely_years(), 30);
        assert_eq!(params.max_years(), 40);
        assert_eq!(params.num_sim(), 1_000);
    }

    #[test]
    fn validate_rejects_out_of_order_years() {
        for (min, mode, max) in [(30, 20, 40), (20, 20, 40), (20, 40, 40), (20, 30, 99), (0, 5, 10)]
        {
            let mut r = raw();
            r.min_years = min;
            r.most_likely_years = mode;
            r.max_years = max;
            assert_eq!(
                SimulationParameters::validate(r),
                Err(ValidationError::IllogicalYears {
                    min,
                    most_likely: mode,
                    max
                })
            );
        }
    }

    #[test]
    fn validate_accepts_max_years_of_ninety_eight() {
        let mut r = raw();
        r.max_years = 98;
        assert!(SimulationParameters::validate(r).is_ok());
    }

    #[test]
    fn validate_rejects_withdrawal_at_or_above_start() {
        let mut r = raw();
        r.withdrawal = r.start_value;
        assert!(matches!(
            SimulationParameters::validate(r),
            Err(ValidationError::WithdrawalTooLarge { .. })
        ));
    }

    #[test]
    fn validate_allows_zero_withdrawal() {
        let mut r = raw();
        r.withdrawal = 0;
        assert!(SimulationParameters::validate(r).is_ok());
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        let mut r = raw();
        r.num_sim = 0;
        assert_eq!(
            SimulationParameters::validate(r),
            Err(ValidationError::NoSimulations)
        );

        let mut r = raw();
        r.start_value = -5;
        r.withdrawal = -10;
        assert_eq!(
            SimulationParameters::validate(r),
            Err(ValidationError::NonPositiveStartValue(-5))
        );

        let mut r = raw();
        r.withdrawal = -1;
        assert_eq!(
            SimulationParameters::validate(r),
            Err(ValidationError::NegativeWithdrawal(-1))
        );
    }

    #[test]
    fn investment_type_parses_labels_case_insensitively() {
        assert_eq!("STOCKS".parse::<InvestmentType>(), Ok(InvestmentType::Stocks));
        assert_eq!(
            " 40_50_10_blend ".parse::<InvestmentType>(),
            Ok(InvestmentType::Blend405010)
        );
        assert!("gold".parse::<InvestmentType>().is_err());
        for t in InvestmentType::ALL {
            assert_eq!(t.label().parse::<InvestmentType>(), Ok(t));
        }
    }

    #[test]
    fn rate_series_wraps_cyclically() {
        assert!(RateSeries::new(Vec::new()).is_none());
        let series = RateSeries::new(vec![0.1, 0.2, 0.3]).expect("non-empty");
        assert_eq!(series.rate(0), 0.1);
        assert_eq!(series.rate(4), 0.2);
        assert_eq!(series.rate(302), 0.3);
    }
}
