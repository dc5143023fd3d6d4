use thiserror::Error;

/// Contract violations detected while wiring a form together.
///
/// Runtime anomalies such as out-of-range list indices never surface here;
/// they are ignored and logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{what} requires a non-empty path")]
    EmptyPath { what: &'static str },
    #[error("list bounds are inverted: min {min} > max {max}")]
    InvalidBounds { min: usize, max: usize },
    #[error("history capacity must be at least 1")]
    InvalidCapacity,
}
