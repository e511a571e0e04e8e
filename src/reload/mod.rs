//! Reload subsystem.
//!
//! # Data Flow
//! ```text
//! UpdateWorker (after persist)
//!     → controller.rs (spawn admin client, pipe "RELOAD", wait with timeout)
//!     → outcome.rs (trim output, check confirmation token)
//!     → ReloadOutcome | ReloadError
//! ```
//!
//! # Design Decisions
//! - Success is decided by the output token, not the exit code
//! - An unconfirmed reload is a returned error, never a panic
//! - Every reload has a deadline

pub mod controller;
pub mod outcome;

pub use controller::{ReloadCommand, ReloadController};
pub use outcome::{ReloadError, ReloadOutcome, CONFIRMATION_TOKEN};
