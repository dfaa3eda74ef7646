#![forbid(unsafe_code)]

//! Background reclamation of idle server-side session state.
//!
//! One watchdog task per open session polls activity timestamps and closes
//! expired sessions and inactive sub-resources without waiting for the
//! hosting framework's own coarse-grained timeout.

pub mod clock;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod orchestrator;

pub use config::TimeoutPolicy;
pub use errors::{AppError, Result};
