//! Error types for the tk-app service layer.

use std::path::PathBuf;

/// Application error wrapping the backend crates' errors behind one
/// interface for every frontend.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error("Failed to read scenario file: {path}")]
    ScenarioFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write scenario file: {path}")]
    ScenarioFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Scenario validation failed: {0}")]
    Validation(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tk-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<tk_project::ProjectError> for AppError {
    fn from(err: tk_project::ProjectError) -> Self {
        match err {
            tk_project::ProjectError::Validation(inner) => AppError::Validation(inner.to_string()),
            other => AppError::Scenario(other.to_string()),
        }
    }
}

impl From<tk_project::ValidationError> for AppError {
    fn from(err: tk_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<tk_sim::SimError> for AppError {
    fn from(err: tk_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}
