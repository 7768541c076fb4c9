//! tk-core: shared foundation for tankflow.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;

pub use error::{TkError, TkResult};
pub use numeric::*;
