pub mod api;
pub mod core;
pub mod data;
pub mod error;
pub mod logging;
pub mod prompt;
pub mod report;
