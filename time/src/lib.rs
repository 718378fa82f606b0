pub mod date_time;
pub mod duration;

pub use date_time::DateTime;
pub use duration::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("wrong time format: {0}")]
    Format(String),
    #[error("value out of range in {0}")]
    OutOfRange(String),
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
