//! Session reclaim orchestration modules.
//!
//! Covers the per-session watchdog loop, sub-resource reaping, and
//! process-wide watchdog spawning.

pub mod reaper;
pub mod supervisor;
pub mod watchdog;
