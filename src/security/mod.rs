//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → auth.rs (Basic credentials, when configured)
//!     → Pass to update handler
//! ```
//!
//! # Design Decisions
//! - Auth is enabled as soon as a username or password is configured
//! - Fail closed: a missing or malformed header is rejected with a challenge

pub mod auth;
