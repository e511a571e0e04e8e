//! Configuration editing subsystem.
//!
//! # Data Flow
//! ```text
//! UpdateJob (uploads + parameters)
//!     → worker.rs (queue, one job at a time)
//!     → store.rs (take pgbouncer.ini.lock, place uploads, read pgbouncer.ini)
//!     → merger.rs (drop managed lines, append new entries)
//!     → store.rs (temp file + rename, skipped when nothing changed)
//!     → reload::ReloadController
//! ```

pub mod merger;
pub mod store;
pub mod update_set;
pub mod worker;

use std::path::PathBuf;
use thiserror::Error;

pub use merger::merge;
pub use update_set::{UpdateSet, UpdateValue};
pub use worker::{Upload, UpdateError, UpdateHandle, UpdateJob, UpdateWorker};

/// Errors raised while reading or writing configuration files.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The configuration file is missing or unreadable.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or renaming the new file failed. The previous file is intact.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The advisory lock next to the configuration file could not be taken.
    #[error("failed to lock {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Upload field names must be plain file names.
    #[error("invalid upload name `{0}`")]
    InvalidUploadName(String),
}
