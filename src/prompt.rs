//! Interactive parameter collection.
//!
//! Malformed literals are re-prompted; cross-field violations are returned as
//! fatal [`ValidationError`](crate::error::ValidationError)s once every value has been read.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::core::{InvestmentType, RawParameters, SimulationParameters};
use crate::error::Result;

/// Values already supplied elsewhere (flags); `None` fields are prompted for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterOverrides {
    pub invest_type: Option<InvestmentType>,
    pub start_value: Option<i64>,
    pub withdrawal: Option<i64>,
    pub min_years: Option<u32>,
    pub most_likely_years: Option<u32>,
    pub max_years: Option<u32>,
    pub num_sim: Option<u32>,
}

impl ParameterOverrides {
    pub fn is_complete(&self) -> bool {
        self.invest_type.is_some()
            && self.start_value.is_some()
            && self.withdrawal.is_some()
            && self.min_years.is_some()
            && self.most_likely_years.is_some()
            && self.max_years.is_some()
            && self.num_sim.is_some()
    }
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Prompts for every value missing from `overrides`, then validates.
    pub fn collect(&mut self, overrides: ParameterOverrides) -> Result<SimulationParameters> {
        let invest_type = match overrides.invest_type {
            Some(t) => t,
            None => self.ask_investment_type()?,
        };
        let start_value = self.value_or_ask(
            overrides.start_value,
            "How much money will you invest? (enter number):  ",
        )?;
        let withdrawal = self.value_or_ask(
            overrides.withdrawal,
            "How much will you withdrawal each year?:  ",
        )?;
        let min_years = self.value_or_ask(
            overrides.min_years,
            "Enter minimum number of years in retirement:  ",
        )?;
        let most_likely_years = self.value_or_ask(
            overrides.most_likely_years,
            "Enter most-likely number of years in retirement:  ",
        )?;
        let max_years = self.value_or_ask(
            overrides.max_years,
            "Enter maximum number of years in retirement:  ",
        )?;
        let num_sim =
            self.value_or_ask(overrides.num_sim, "Enter number of simulations to run:  ")?;

        let params = SimulationParameters::validate(RawParameters {
            invest_type,
            start_value,
            withdrawal,
            min_years,
            most_likely_years,
            max_years,
            num_sim,
        })?;
        Ok(params)
    }

    fn ask_investment_type(&mut self) -> Result<InvestmentType> {
        writeln!(self.output, "\nList of investment types:\n")?;
        for t in InvestmentType::ALL {
            writeln!(self.output, "{:<16} =  {}", t.label(), t.description())?;
        }
        writeln!(self.output)?;

        let mut answer =
            self.ask("Enter investment type (stocks, bonds, 50_50_blend, 40_50_10_blend):  ")?;
        loop {
            match answer.parse::<InvestmentType>() {
                Ok(t) => return Ok(t),
                Err(_) => {
                    tracing::debug!(input = %answer, "rejected investment type");
                    answer = self.ask("Invalid investment. Enter investment type as listed:  ")?;
                }
            }
        }
    }

    fn value_or_ask<T: FromStr>(&mut self, preset: Option<T>, question: &str) -> Result<T> {
        match preset {
            Some(v) => Ok(v),
            None => self.ask_integer(question),
        }
    }

    fn ask_integer<T: FromStr>(&mut self, question: &str) -> Result<T> {
        let mut answer = self.ask(question)?;
        loop {
            if let Some(v) = parse_digits(&answer) {
                return Ok(v);
            }
            tracing::debug!(input = %answer, "rejected integer literal");
            answer = self.ask("Invalid input. Enter integer only:  ")?;
        }
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed").into());
        }
        Ok(line.trim().to_string())
    }
}

/// Accepts only non-empty runs of ASCII digits that fit in `T`.
fn parse_digits<T: FromStr>(text: &str) -> Option<T> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SimulationError, ValidationError};
    use std::io::Cursor;

    fn collect(
        script: &str,
        overrides: ParameterOverrides,
    ) -> (Result<SimulationParameters>, String) {
        let mut prompter = Prompter::new(Cursor::new(script.to_string()), Vec::new());
        let result = prompter.collect(overrides);
        let (_, output) = prompter.into_inner();
        (result, String::from_utf8(output).expect("utf8 output"))
    }

    #[test]
    fn collects_all_values_in_order() {
        let (params, output) = collect(
            "Stocks\n1000000\n40000\n20\n30\n40\n500\n",
            ParameterOverrides::default(),
        );
        let params = params.expect("valid parameters");
        assert_eq!(params.invest_type(), InvestmentType::Stocks);
        assert_eq!(params.start_value(), 1_000_000);
        assert_eq!(params.withdrawal(), 40_000);
        assert_eq!(params.min_years(), 20);
        assert_eq!(params.most_likely_years(), 30);
        assert_eq!(params.max_years(), 40);
        assert_eq!(params.num_sim(), 500);
        assert!(output.contains("stocks           =  S&P 500 Index"));
        assert!(output.contains("Enter number of simulations to run:"));
    }

    #[test]
    fn malformed_literals_are_reprompted() {
        let (params, output) = collect(
            "gold\nbonds\n1e6\n-5\n100000\n4000\nten\n10\n15\n25\n\n50\n",
            ParameterOverrides::default(),
        );
        let params = params.expect("valid parameters");
        assert_eq!(params.invest_type(), InvestmentType::Bonds);
        assert_eq!(params.start_value(), 100_000);
        assert_eq!(params.min_years(), 10);
        assert_eq!(params.num_sim(), 50);
        assert_eq!(output.matches("Invalid investment.").count(), 1);
        assert_eq!(output.matches("Invalid input. Enter integer only:").count(), 4);
    }

    #[test]
    fn overflowing_literal_is_reprompted() {
        let (params, _) = collect(
            "stocks\n1000\n10\n1\n2\n3\n99999999999\n7\n",
            ParameterOverrides::default(),
        );
        assert_eq!(params.expect("valid parameters").num_sim(), 7);
    }

    #[test]
    fn ordering_violation_is_fatal_without_retry() {
        let (result, output) = collect(
            "stocks\n1000\n10\n30\n20\n40\n5\n",
            ParameterOverrides::default(),
        );
        assert!(matches!(
            result,
            Err(SimulationError::Validation(ValidationError::IllogicalYears { .. }))
        ));
        assert!(!output.contains("Invalid input"));
    }

    #[test]
    fn withdrawal_above_start_is_fatal() {
        let (result, _) = collect(
            "stocks\n1000\n1000\n10\n20\n30\n5\n",
            ParameterOverrides::default(),
        );
        assert!(matches!(
            result,
            Err(SimulationError::Validation(ValidationError::WithdrawalTooLarge { .. }))
        ));
    }

    #[test]
    fn overrides_skip_their_prompts() {
        let overrides = ParameterOverrides {
            invest_type: Some(InvestmentType::Blend5050),
            start_value: Some(250_000),
            withdrawal: Some(10_000),
            min_years: Some(15),
            most_likely_years: None,
            max_years: Some(35),
            num_sim: Some(100),
        };
        assert!(!overrides.is_complete());

        let (params, output) = collect("25\n", overrides);
        assert_eq!(params.expect("valid").most_likely_years(), 25);
        assert!(!output.contains("List of investment types"));
        assert!(!output.contains("How much money"));
        assert!(output.contains("Enter most-likely number of years in retirement:"));
    }

    #[test]
    fn closed_input_is_an_error() {
        let (result, _) = collect("stocks\n1000\n", ParameterOverrides::default());
        assert!(matches!(result, Err(SimulationError::Io(_))));
    }
}
