use std::path::PathBuf;

use thiserror::Error;

/// Parameter problems caught before any simulation runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(
        "Input value of retirement years was illogical ({min}-{most_likely}-{max}). \
         Requirement: minimum < most-likely < maximum < 99"
    )]
    IllogicalYears {
        min: u32,
        most_likely: u32,
        max: u32,
    },

    #[error(
        "You cannot withdrawal more than you started with ({withdrawal} >= {start_value}). \
         Requirement: withdrawal < starting investment"
    )]
    WithdrawalTooLarge { withdrawal: i64, start_value: i64 },

    #[error("Starting investment must be > 0, got {0}")]
    NonPositiveStartValue(i64),

    #[error("Annual withdrawal must be >= 0, got {0}")]
    NegativeWithdrawal(i64),

    #[error("Number of simulations must be > 0")]
    NoSimulations,

    #[error("Unknown investment type '{0}' (expected stocks, bonds, 50_50_blend or 40_50_10_blend)")]
    UnknownInvestmentType(String),
}

#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: '{value}' is not a number", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("{}: no data points", .path.display())]
    Empty { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Data(#[from] DataLoadError),

    #[error("Cannot compute statistics over zero simulation outcomes")]
    NoOutcomes,

    #[error("Invalid retirement duration distribution: {0}")]
    Distribution(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = SimulationError> = std::result::Result<T, E>;
