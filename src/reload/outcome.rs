//! Reload results and errors.

use std::time::Duration;
use thiserror::Error;

/// Token the admin console prints after a successful reload.
pub const CONFIRMATION_TOKEN: &str = "reload";

/// Captured output of one reload attempt, trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadOutcome {
    pub stdout: String,
    pub stderr: String,
}

impl ReloadOutcome {
    pub fn new(stdout: &str, stderr: &str) -> Self {
        Self {
            stdout: stdout.trim().to_string(),
            stderr: stderr.trim().to_string(),
        }
    }

    /// True when stdout is exactly the confirmation token, ignoring case.
    pub fn is_confirmed(&self) -> bool {
        self.stdout.to_lowercase() == CONFIRMATION_TOKEN
    }

    /// First non-blank stream, stdout before stderr.
    pub fn status(&self) -> Option<&str> {
        [self.stdout.as_str(), self.stderr.as_str()]
            .into_iter()
            .find(|s| !s.trim().is_empty())
    }
}

/// Errors raised while reloading the managed process.
#[derive(Debug, Error)]
pub enum ReloadError {
    /// The reload program could not be started.
    #[error("failed to start reload command `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Talking to the running reload program failed.
    #[error("reload command I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The reload program did not finish in time and was killed.
    #[error("reload command timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The reload program ran but did not confirm the reload.
    #[error("reload not confirmed: {}", .outcome.status().unwrap_or("no output"))]
    Verification { outcome: ReloadOutcome },
}
