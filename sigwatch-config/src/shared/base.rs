use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The notification timeout cannot be zero.
    #[error("`timeout_ms` cannot be zero")]
    TimeoutZero,
    /// At least one signal has to be watched.
    #[error("`signals` cannot be empty")]
    NoSignals,
    /// A signal appears more than once.
    #[error("signal `{0}` is listed more than once")]
    DuplicateSignal(&'static str),
    /// A field holds a value outside of its allowed range.
    #[error("Invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
}
