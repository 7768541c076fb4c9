//! Error types for control system operations.

use thiserror::Error;

/// Result type for control system operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in control system operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

impl From<tk_core::TkError> for ControlError {
    fn from(err: tk_core::TkError) -> Self {
        match err {
            tk_core::TkError::NonFinite { what, .. } | tk_core::TkError::InvalidArg { what } => {
                ControlError::InvalidArg { what }
            }
        }
    }
}
