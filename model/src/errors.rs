use thiserror::Error;

/// Fatal errors of a scheduling run. Budget exhaustion and infeasible branching nodes are not
/// errors, they are reported through optimality flags.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulingError {
    /// Malformed or inconsistent input, raised before any optimization starts.
    #[error("data error: {0}")]
    Data(String),
    /// Violated internal invariant, aborts the current planning horizon.
    #[error("logic error: {0}")]
    Logic(String),
}

pub type Result<T> = std::result::Result<T, SchedulingError>;

impl SchedulingError {
    pub fn data(message: impl Into<String>) -> SchedulingError {
        SchedulingError::Data(message.into())
    }

    pub fn logic(message: impl Into<String>) -> SchedulingError {
        SchedulingError::Logic(message.into())
    }
}
