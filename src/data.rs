//! Historical annual return and inflation tables.
//!
//! Each file holds one percentage per line (e.g. `5.25` for 5.25%). Values are
//! converted to decimal fractions rounded to five places.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::core::{InflationSeries, InvestmentType, RateSeries, ReturnSeries};
use crate::error::DataLoadError;

pub const INFLATION_FILE: &str = "inflation_rate_1926-2013.txt";

#[derive(Debug, Clone)]
pub struct HistoricalData {
    stocks: ReturnSeries,
    bonds: ReturnSeries,
    blend_50_50: ReturnSeries,
    blend_40_50_10: ReturnSeries,
    inflation: InflationSeries,
}

impl HistoricalData {
    /// Loads all five series from `dir`; the first failure aborts.
    pub fn load(dir: &Path) -> Result<Self, DataLoadError> {
        let data = Self {
            bonds: load_series(&dir.join(InvestmentType::Bonds.file_name()))?,
            stocks: load_series(&dir.join(InvestmentType::Stocks.file_name()))?,
            blend_40_50_10: load_series(&dir.join(InvestmentType::Blend405010.file_name()))?,
            blend_50_50: load_series(&dir.join(InvestmentType::Blend5050.file_name()))?,
            inflation: load_series(&dir.join(INFLATION_FILE))?,
        };
        tracing::info!(
            dir = %dir.display(),
            years = data.stocks.len(),
            inflation_years = data.inflation.len(),
            "historical data loaded"
        );
        Ok(data)
    }

    pub fn from_series(
        stocks: ReturnSeries,
        bonds: ReturnSeries,
        blend_50_50: ReturnSeries,
        blend_40_50_10: ReturnSeries,
        inflation: InflationSeries,
    ) -> Self {
        Self {
            stocks,
            bonds,
            blend_50_50,
            blend_40_50_10,
            inflation,
        }
    }

    pub fn returns_for(&self, invest_type: InvestmentType) -> &ReturnSeries {
        match invest_type {
            InvestmentType::Stocks => &self.stocks,
            InvestmentType::Bonds => &self.bonds,
            InvestmentType::Blend5050 => &self.blend_50_50,
            InvestmentType::Blend405010 => &self.blend_40_50_10,
        }
    }

    pub fn inflation(&self) -> &InflationSeries {
        &self.inflation
    }
}

pub fn load_series(path: &Path) -> Result<RateSeries, DataLoadError> {
    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_series_from_reader(BufReader::new(file), path)
}

/// Parses percentages from `reader`; `path` only labels errors.
pub fn load_series_from_reader<R: BufRead>(
    reader: R,
    path: &Path,
) -> Result<RateSeries, DataLoadError> {
    let mut rates = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| DataLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let percent = trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| DataLoadError::Parse {
                path: path.to_path_buf(),
                line: idx + 1,
                value: trimmed.to_string(),
            })?;
        rates.push(percent_to_fraction(percent));
    }

    RateSeries::new(rates).ok_or_else(|| DataLoadError::Empty {
        path: PathBuf::from(path),
    })
}

fn percent_to_fraction(percent: f64) -> f64 {
    let fraction = percent / 100.0;
    format!("{fraction:.5}").parse().unwrap_or(fraction)
}
