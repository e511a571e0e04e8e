//! Reload driver for the managed PgBouncer process.
//!
//! # Responsibilities
//! - Spawn the admin client with the reload directive on stdin
//! - Bound the whole exchange with a timeout, killing the child on expiry
//! - Classify the trimmed output as confirmed or not

use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time;

use crate::config::ReloadConfig;
use crate::observability::metrics;
use crate::reload::outcome::{ReloadError, ReloadOutcome};

/// Fully resolved command line for a reload.
#[derive(Debug, Clone)]
pub struct ReloadCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Text written to the child's stdin, followed by a newline.
    pub directive: Option<String>,
    pub timeout: Duration,
}

impl From<&ReloadConfig> for ReloadCommand {
    fn from(config: &ReloadConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            directive: Some(config.directive.clone()).filter(|d| !d.trim().is_empty()),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Asks the managed process to reload and verifies the answer.
#[derive(Debug, Clone)]
pub struct ReloadController {
    command: ReloadCommand,
}

impl ReloadController {
    pub fn new(command: ReloadCommand) -> Self {
        Self { command }
    }

    pub fn from_config(config: &ReloadConfig) -> Self {
        Self::new(ReloadCommand::from(config))
    }

    /// Run the reload command once.
    ///
    /// Returns the outcome only when stdout carries the confirmation token.
    pub async fn reload(&self) -> Result<ReloadOutcome, ReloadError> {
        let start = Instant::now();
        tracing::info!(program = %self.command.program, "Reload started");

        let result = match time::timeout(self.command.timeout, self.exchange()).await {
            Ok(result) => result,
            Err(_) => Err(ReloadError::Timeout(self.command.timeout)),
        };

        let label = match &result {
            Ok(_) => "ok",
            Err(ReloadError::Verification { .. }) => "unconfirmed",
            Err(ReloadError::Timeout(_)) => "timeout",
            Err(_) => "failed",
        };
        metrics::record_reload(label, start);

        match &result {
            Ok(outcome) => tracing::info!(status = ?outcome.status(), "Reload complete"),
            Err(e) => tracing::error!(error = %e, "Reload failed"),
        }
        result
    }

    async fn exchange(&self) -> Result<ReloadOutcome, ReloadError> {
        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ReloadError::Spawn {
                program: self.command.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Some(directive) = &self.command.directive {
                let line = format!("{}\n", directive);
                match stdin.write_all(line.as_bytes()).await {
                    // The child may exit without reading its input.
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                    other => other?,
                }
            }
        }

        let output = child.wait_with_output().await?;
        let outcome = ReloadOutcome::new(
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        );

        tracing::debug!(
            exit_status = %output.status,
            stdout = %outcome.stdout,
            stderr = %outcome.stderr,
            "Reload command finished"
        );

        if outcome.is_confirmed() {
            Ok(outcome)
        } else {
            Err(ReloadError::Verification { outcome })
        }
    }
}
