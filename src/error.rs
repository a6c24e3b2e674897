//! Timeline error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    #[error("start or end date is missing")]
    MissingBound,

    #[error("end date has to be a date after start date ({start} .. {end})")]
    InvalidRange { start: String, end: String },

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl TimelineError {
    /// True for the errors that abort a layout pass because the visible window
    /// cannot be built.
    pub fn is_range_error(&self) -> bool {
        matches!(
            self,
            Self::MissingBound | Self::InvalidRange { .. } | Self::InvalidDate(_)
        )
    }
}
