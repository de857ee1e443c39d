//! Report sinks for simulation statistics and the plotted outcome prefix.

use std::io::{self, Write};

use serde::Serialize;

use crate::core::{InvestmentType, SimulationParameters, Statistics};

/// Number of leading outcomes handed to chart renderers.
pub const PLOT_LIMIT: usize = 3000;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<'a> {
    pub invest_type: InvestmentType,
    pub start_value: i64,
    pub withdrawal: i64,
    pub min_years: u32,
    pub most_likely_years: u32,
    pub max_years: u32,
    pub statistics: &'a Statistics,
    /// First [`PLOT_LIMIT`] outcomes in run order.
    pub plotted_outcomes: &'a [i64],
}

impl<'a> Report<'a> {
    pub fn new(
        params: &SimulationParameters,
        statistics: &'a Statistics,
        outcomes: &'a [i64],
    ) -> Self {
        Self {
            invest_type: params.invest_type(),
            start_value: params.start_value(),
            withdrawal: params.withdrawal(),
            min_years: params.min_years(),
            most_likely_years: params.most_likely_years(),
            max_years: params.max_years(),
            statistics,
            plotted_outcomes: &outcomes[..outcomes.len().min(PLOT_LIMIT)],
        }
    }
}

pub trait ReportSink {
    fn render(&mut self, report: &Report<'_>) -> io::Result<()>;
}

/// The plain-text summary block.
pub struct TextSummary<W> {
    out: W,
}

impl<W: Write> TextSummary<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ReportSink for TextSummary<W> {
    fn render(&mut self, report: &Report<'_>) -> io::Result<()> {
        let stats = report.statistics;
        writeln!(self.out, "\nInvestment Type:  {}", report.invest_type)?;
        writeln!(self.out, "Starting Value:  ${}", thousands(report.start_value))?;
        writeln!(self.out, "Annual Withdrawal:  ${}", thousands(report.withdrawal))?;
        writeln!(
            self.out,
            "Years in Retirement (min-med-max):  {}-{}-{}",
            report.min_years, report.most_likely_years, report.max_years
        )?;
        writeln!(self.out, "Number of runs:  {}", thousands(stats.runs as i64))?;
        writeln!(self.out, "Odds of Bankruptcy:  {:.1}%", stats.odds_of_bankruptcy)?;
        writeln!(self.out, "Average Outcome:  ${}", thousands(stats.average_outcome))?;
        writeln!(self.out, "Minimum Outcome:  ${}", thousands(stats.minimum_outcome))?;
        writeln!(self.out, "Maximum Outcome:  ${}", thousands(stats.maximum_outcome))?;
        self.out.flush()
    }
}

/// Terminal bar chart of money remaining per run.
///
/// Runs are grouped left to right into `width` columns; each column shows the
/// mean outcome of its group, so bankrupt stretches appear as gaps.
pub struct BarChart<W> {
    out: W,
    width: usize,
    height: usize,
}

impl<W: Write> BarChart<W> {
    pub fn new(out: W, width: usize, height: usize) -> Self {
        Self {
            out,
            width: width.max(1),
            height: height.max(1),
        }
    }

    fn columns(&self, outcomes: &[i64]) -> Vec<i64> {
        let chunk = outcomes.len().div_ceil(self.width).max(1);
        outcomes
            .chunks(chunk)
            .map(|c| {
                let sum: i128 = c.iter().map(|&v| v as i128).sum();
                (sum / c.len() as i128) as i64
            })
            .collect()
    }
}

impl<W: Write> ReportSink for BarChart<W> {
    fn render(&mut self, report: &Report<'_>) -> io::Result<()> {
        let outcomes = report.plotted_outcomes;
        writeln!(
            self.out,
            "\nOdds of Bankruptcy = {:.1}%",
            report.statistics.odds_of_bankruptcy
        )?;
        writeln!(self.out, "Showing first {} simulated outcomes", outcomes.len())?;

        let columns = self.columns(outcomes);
        let peak = columns.iter().copied().max().unwrap_or(0).max(0);
        let label_width = thousands(peak).len().max(1);

        for row in (1..=self.height).rev() {
            let label = if row == self.height {
                thousands(peak)
            } else {
                String::new()
            };
            let threshold = peak as f64 * (row as f64 - 0.5) / self.height as f64;
            let bars: String = columns
                .iter()
                .map(|&v| if v > 0 && v as f64 >= threshold { '#' } else { ' ' })
                .collect();
            writeln!(self.out, "{label:>label_width$} |{bars}")?;
        }

        writeln!(self.out, "{:>label_width$} +{}", 0, "-".repeat(columns.len()))?;
        let last = outcomes.len().to_string();
        let gap = columns.len().saturating_sub(1 + last.len());
        writeln!(
            self.out,
            "{:>label_width$}  1{}{}",
            "",
            " ".repeat(gap),
            if outcomes.len() > 1 { last.as_str() } else { "" }
        )?;
        writeln!(self.out, "Money remaining per individual outcome")?;
        self.out.flush()
    }
}

/// Pretty-printed JSON of the whole report.
pub struct JsonReport<W> {
    out: W,
}

impl<W: Write> JsonReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ReportSink for JsonReport<W> {
    fn render(&mut self, report: &Report<'_>) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, report)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

/// Formats an integer with comma thousands separators.
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
