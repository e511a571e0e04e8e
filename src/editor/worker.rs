//! Single-writer worker for merge + reload jobs.
//!
//! All jobs for one configuration file flow through one task, so the
//! read-modify-write cycle and the reload never interleave between requests.
//! The edit itself also holds `<ini>.lock` against other processes.

use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};

use crate::config::AppConfig;
use crate::editor::{merger, store, EditorError, UpdateSet};
use crate::reload::{ReloadController, ReloadError, ReloadOutcome};

/// Default number of queued jobs before submitters wait.
const QUEUE_DEPTH: usize = 64;

/// A file received with the request, not yet written to disk.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Form field name; also the file name and the configuration key.
    pub name: String,
    pub data: Vec<u8>,
}

/// One update request.
#[derive(Debug, Default)]
pub struct UpdateJob {
    /// Lowest precedence: each upload becomes `name=<conf_dir>/name`.
    pub uploads: Vec<Upload>,
    /// Body and query parameters, already ordered by precedence.
    pub updates: UpdateSet,
}

/// Errors returned to the submitter of a job.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Reload(#[from] ReloadError),

    #[error("update worker is not running")]
    WorkerClosed,
}

type Reply = oneshot::Sender<Result<ReloadOutcome, UpdateError>>;

/// Cloneable handle used by request handlers.
#[derive(Debug, Clone)]
pub struct UpdateHandle {
    tx: mpsc::Sender<(UpdateJob, Reply)>,
}

impl UpdateHandle {
    /// Queue a job and wait for its result.
    pub async fn submit(&self, job: UpdateJob) -> Result<ReloadOutcome, UpdateError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((job, reply_tx))
            .await
            .map_err(|_| UpdateError::WorkerClosed)?;
        reply_rx.await.map_err(|_| UpdateError::WorkerClosed)?
    }
}

/// Owns the configuration file and the reload channel.
pub struct UpdateWorker {
    ini_path: PathBuf,
    conf_dir: PathBuf,
    controller: ReloadController,
    rx: mpsc::Receiver<(UpdateJob, Reply)>,
}

impl UpdateWorker {
    /// Create a worker and the handle feeding it.
    pub fn new(
        ini_path: PathBuf,
        conf_dir: PathBuf,
        controller: ReloadController,
    ) -> (Self, UpdateHandle) {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        (
            Self {
                ini_path,
                conf_dir,
                controller,
                rx,
            },
            UpdateHandle { tx },
        )
    }

    pub fn from_config(config: &AppConfig) -> (Self, UpdateHandle) {
        Self::new(
            config.pgbouncer.ini_path(),
            config.pgbouncer.conf_dir.clone(),
            ReloadController::from_config(&config.reload),
        )
    }

    /// Start the worker on the current runtime and return its handle.
    pub fn spawn(config: &AppConfig) -> UpdateHandle {
        let (worker, handle) = Self::from_config(config);
        tokio::spawn(worker.run());
        handle
    }

    /// Process jobs one at a time until every handle is dropped.
    pub async fn run(mut self) {
        tracing::info!(path = %self.ini_path.display(), "Update worker started");
        while let Some((job, reply)) = self.rx.recv().await {
            if reply.is_closed() {
                tracing::warn!("Update submitter went away while queued; job dropped");
                continue;
            }
            let result = self.process(job).await;
            if reply.send(result).is_err() {
                tracing::warn!("Update submitter went away before the result was ready");
            }
        }
        tracing::info!("Update worker stopped");
    }

    async fn process(&self, job: UpdateJob) -> Result<ReloadOutcome, UpdateError> {
        self.apply(job).await?;
        Ok(self.controller.reload().await?)
    }

    /// Place uploads and rewrite the ini under `<ini>.lock`.
    async fn apply(&self, job: UpdateJob) -> Result<(), EditorError> {
        let _lock = store::lock(&self.ini_path).await?;

        let mut updates = UpdateSet::new();
        for upload in job.uploads {
            let path = store::place_upload(&self.conf_dir, &upload.name, &upload.data).await?;
            tracing::debug!(key = %upload.name, path = %path.display(), "Upload placed");
            updates.insert_upload(upload.name, path);
        }
        updates.extend(job.updates);

        let keys: Vec<&str> = updates.keys().collect();
        tracing::info!(keys = ?keys, "Applying configuration update");

        let current = store::read(&self.ini_path).await?;
        let next = merger::merge(&current, &updates);
        if next == current {
            tracing::debug!("Configuration unchanged; write skipped");
            return Ok(());
        }
        store::persist(&self.ini_path, &next).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::ReloadCommand;
    use std::time::Duration;

    fn echo_reload() -> ReloadController {
        ReloadController::new(ReloadCommand {
            program: "sh".into(),
            args: vec!["-c".into(), "cat".into()],
            directive: Some("RELOAD".into()),
            timeout: Duration::from_secs(5),
        })
    }

    fn job(pairs: &[(&str, &str)]) -> UpdateJob {
        let mut updates = UpdateSet::new();
        for (k, v) in pairs {
            updates.insert_raw(*k, v);
        }
        UpdateJob { uploads: vec![], updates }
    }

    #[tokio::test]
    async fn test_job_merges_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let ini = dir.path().join("pgbouncer.ini");
        std::fs::write(&ini, "a=1\nb=2\nc=3").unwrap();

        let (worker, handle) = UpdateWorker::new(ini.clone(), dir.path().into(), echo_reload());
        tokio::spawn(worker.run());

        let outcome = handle.submit(job(&[("b", ""), ("d", "9")])).await.unwrap();
        assert_eq!(outcome.status(), Some("RELOAD"));
        assert_eq!(std::fs::read_to_string(&ini).unwrap(), "a=1\nc=3\nd=9");
    }

    #[tokio::test]
    async fn test_upload_overridden_by_parameter() {
        let dir = tempfile::tempdir().unwrap();
        let ini = dir.path().join("pgbouncer.ini");
        std::fs::write(&ini, "[pgbouncer]").unwrap();

        let (worker, handle) = UpdateWorker::new(ini.clone(), dir.path().into(), echo_reload());
        tokio::spawn(worker.run());

        let mut job = job(&[("auth_type", "md5")]);
        job.uploads.push(Upload {
            name: "auth_file".into(),
            data: b"\"u\" \"p\"".to_vec(),
        });
        job.uploads.push(Upload {
            name: "auth_type".into(),
            data: b"ignored".to_vec(),
        });
        handle.submit(job).await.unwrap();

        let expected = format!(
            "[pgbouncer]\nauth_file={}\nauth_type=md5",
            dir.path().join("auth_file").display()
        );
        assert_eq!(std::fs::read_to_string(&ini).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_missing_ini_reports_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let (worker, handle) = UpdateWorker::new(
            dir.path().join("missing.ini"),
            dir.path().into(),
            echo_reload(),
        );
        tokio::spawn(worker.run());

        let err = handle.submit(job(&[("a", "1")])).await.unwrap_err();
        assert!(matches!(err, UpdateError::Editor(EditorError::Read { .. })));
    }

    #[tokio::test]
    async fn test_file_written_even_when_reload_unconfirmed() {
        let dir = tempfile::tempdir().unwrap();
        let ini = dir.path().join("pgbouncer.ini");
        std::fs::write(&ini, "a=1").unwrap();

        let controller = ReloadController::new(ReloadCommand {
            program: "sh".into(),
            args: vec!["-c".into(), "echo 'ERROR: invalid value'".into()],
            directive: None,
            timeout: Duration::from_secs(5),
        });
        let (worker, handle) = UpdateWorker::new(ini.clone(), dir.path().into(), controller);
        tokio::spawn(worker.run());

        let err = handle.submit(job(&[("a", "2")])).await.unwrap_err();
        assert!(matches!(
            err,
            UpdateError::Reload(ReloadError::Verification { .. })
        ));
        assert_eq!(std::fs::read_to_string(&ini).unwrap(), "a=2");
    }

    #[tokio::test]
    async fn test_concurrent_disjoint_updates_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let ini = dir.path().join("pgbouncer.ini");
        std::fs::write(&ini, "[pgbouncer]").unwrap();

        let (worker, handle) = UpdateWorker::new(ini.clone(), dir.path().into(), echo_reload());
        tokio::spawn(worker.run());

        let mut tasks = Vec::new();
        for i in 0..16 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                let key = format!("key_{}", i);
                let value = i.to_string();
                handle.submit(job(&[(key.as_str(), value.as_str())])).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let content = std::fs::read_to_string(&ini).unwrap();
        for i in 0..16 {
            assert!(content.lines().any(|l| l == format!("key_{}={}", i, i)));
        }
        assert_eq!(content.lines().count(), 17);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unchanged_file_not_rewritten() {
        use std::os::unix::fs::MetadataExt;

        let dir = tempfile::tempdir().unwrap();
        let ini = dir.path().join("pgbouncer.ini");
        std::fs::write(&ini, "[pgbouncer]\na=1").unwrap();
        let inode = std::fs::metadata(&ini).unwrap().ino();

        let (worker, handle) = UpdateWorker::new(ini.clone(), dir.path().into(), echo_reload());
        tokio::spawn(worker.run());

        // Still reloads even though nothing was written.
        let outcome = handle.submit(job(&[("a", "1"), ("b", "")])).await.unwrap();
        assert_eq!(outcome.status(), Some("RELOAD"));
        assert_eq!(std::fs::metadata(&ini).unwrap().ino(), inode);

        handle.submit(job(&[("a", "2")])).await.unwrap();
        assert_ne!(std::fs::metadata(&ini).unwrap().ino(), inode);
        assert_eq!(std::fs::read_to_string(&ini).unwrap(), "[pgbouncer]\na=2");
    }

    #[tokio::test]
    async fn test_abandoned_job_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let ini = dir.path().join("pgbouncer.ini");
        std::fs::write(&ini, "a=1").unwrap();

        let (worker, handle) = UpdateWorker::new(ini.clone(), dir.path().into(), echo_reload());

        // The submitter gives up before the worker picks the job up.
        let (reply_tx, reply_rx) = oneshot::channel();
        drop(reply_rx);
        handle.tx.send((job(&[("gone", "1")]), reply_tx)).await.unwrap();
        tokio::spawn(worker.run());

        handle.submit(job(&[("b", "2")])).await.unwrap();
        assert_eq!(std::fs::read_to_string(&ini).unwrap(), "a=1\nb=2");
    }

    #[tokio::test]
    async fn test_closed_worker() {
        let dir = tempfile::tempdir().unwrap();
        let (worker, handle) =
            UpdateWorker::new(dir.path().join("x.ini"), dir.path().into(), echo_reload());
        drop(worker);
        let err = handle.submit(UpdateJob::default()).await.unwrap_err();
        assert!(matches!(err, UpdateError::WorkerClosed));
    }
}
