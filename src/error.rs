use thiserror::Error;

use crate::types::SensorType;

/// Filter error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Covariance not positive definite: {stage}")]
    NotPositiveDefinite { stage: &'static str },

    #[error("Innovation covariance is singular in {0} update")]
    SingularInnovation(SensorType),

    #[error("Measurement at {current} us is older than previous one at {previous} us")]
    OutOfOrder { previous: i64, current: i64 },

    #[error("Invalid {sensor} measurement: expected {expected} finite values, got {got}")]
    InvalidMeasurement {
        sensor: SensorType,
        expected: usize,
        got: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;
