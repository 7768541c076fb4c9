//! Shared application service layer for the tank simulator.
//!
//! Frontends go through this crate for scenario handling, run execution,
//! the previous-run overlay and result queries.

pub mod error;
pub mod progress;
pub mod query;
pub mod run_service;
pub mod scenario_service;
pub mod session;

pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage, StepProgress};
pub use query::{
    RunComparison, RunSummary, SeriesVariable, compare_runs, extract_series, get_run_summary,
    height_tail, overlay_csv, series_csv,
};
pub use run_service::{RunRequest, RunResponse, RunTimingSummary, execute, execute_with_progress};
pub use scenario_service::{load_scenario, save_scenario, scenario_from_request, validate_scenario};
pub use session::RunSession;
