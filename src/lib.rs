//! HTTP configuration API for a PgBouncer instance.
//!
//! Merges `key=value` updates into `pgbouncer.ini`, then asks PgBouncer to
//! reload and reports whether the reload was confirmed.

pub mod config;
pub mod editor;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod reload;
pub mod security;

pub use config::schema::AppConfig;
pub use editor::{UpdateHandle, UpdateSet, UpdateValue, UpdateWorker};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use reload::{ReloadController, ReloadError, ReloadOutcome};
