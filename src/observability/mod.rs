//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http, editor, reload produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and histograms)
//! ```
//!
//! # Design Decisions
//! - Request ID is attached to every update log line
//! - Update values are never logged, only keys
//! - Metrics endpoint is optional

pub mod logging;
pub mod metrics;
