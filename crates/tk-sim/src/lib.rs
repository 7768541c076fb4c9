//! Level-loop simulation for a single drained tank under PI control.
//!
//! Provides:
//! - Square-root drain plant advanced by an explicit Euler step
//! - Simulation parameters, loop constants and their validation
//! - The fixed-step loop coupling plant and controller
//! - The `SimulationRun` record with cumulative diagnostics

pub mod error;
pub mod params;
pub mod plant;
pub mod run;
pub mod sim;

pub use error::{SimError, SimResult};
pub use params::{LoopConstants, SimulationParameters};
pub use plant::{OutflowDomain, TankPlant};
pub use run::SimulationRun;
pub use sim::{
    LevelLoop, SimOptions, SimPhase, SimProgress, simulate, simulate_with,
    simulate_with_progress,
};
