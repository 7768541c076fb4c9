//! Error types for simulation operations.

use thiserror::Error;

/// Errors raised before or during a level-loop run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid parameter: {what}")]
    InvalidParameter { what: &'static str },

    #[error("Negative tank height {height} has no real square root")]
    Domain { height: f64 },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<tk_controls::ControlError> for SimError {
    fn from(e: tk_controls::ControlError) -> Self {
        match e {
            tk_controls::ControlError::InvalidArg { what } => SimError::InvalidParameter { what },
        }
    }
}

impl From<tk_core::TkError> for SimError {
    fn from(e: tk_core::TkError) -> Self {
        match e {
            tk_core::TkError::NonFinite { what, .. } | tk_core::TkError::InvalidArg { what } => {
                SimError::InvalidParameter { what }
            }
        }
    }
}
