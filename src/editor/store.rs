//! Reading, locking and atomically rewriting files on disk.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::editor::EditorError;

/// Read the current configuration file.
///
/// A missing file is an error; there is no empty-file fallback.
pub async fn read(path: &Path) -> Result<String, EditorError> {
    fs::read_to_string(path)
        .await
        .map_err(|source| EditorError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Replace the contents of `path` with `text`.
///
/// The data is written to a sibling temp file, flushed to disk and renamed
/// over `path`, so readers see either the old or the new contents. Symlinks
/// are followed and the existing mode and owner are carried over.
pub async fn persist(path: &Path, text: &str) -> Result<(), EditorError> {
    write_atomic(path, text.as_bytes()).await
}

/// Store an uploaded file as `dir/name` and return its path.
pub async fn place_upload(dir: &Path, name: &str, data: &[u8]) -> Result<PathBuf, EditorError> {
    if !is_plain_file_name(name) {
        return Err(EditorError::InvalidUploadName(name.to_string()));
    }
    fs::create_dir_all(dir)
        .await
        .map_err(|source| EditorError::Write {
            path: dir.to_path_buf(),
            source,
        })?;

    let target = dir.join(name);
    write_atomic(&target, data).await?;
    Ok(target)
}

/// Exclusive advisory lock on `<file>.lock`, released on drop.
#[derive(Debug)]
pub struct FileLock {
    _file: std::fs::File,
}

/// Take the lock guarding `path`, waiting for other holders.
///
/// Any process that edits the same file through `<file>.lock` is serialized
/// with this one.
pub async fn lock(path: &Path) -> Result<FileLock, EditorError> {
    let lock_path = lock_path_for(path);
    let blocking_path = lock_path.clone();
    tokio::task::spawn_blocking(move || acquire_lock(&blocking_path))
        .await
        .unwrap_or_else(|e| Err(std::io::Error::other(e)))
        .map(|file| FileLock { _file: file })
        .map_err(|source| EditorError::Lock {
            path: lock_path,
            source,
        })
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

#[cfg(unix)]
fn acquire_lock(path: &Path) -> std::io::Result<std::fs::File> {
    use std::os::unix::io::AsRawFd;

    let file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    // SAFETY: `file` owns the descriptor for the duration of the call.
    let ret = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
    if ret != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(file)
}

#[cfg(not(unix))]
fn acquire_lock(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_name = format!(".{}.{:016x}.tmp", file_name, fastrand::u64(..));
    path.with_file_name(tmp_name)
}

async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), EditorError> {
    // Rename onto the real file so a symlinked path keeps its link.
    let target = fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf());
    let existing = fs::metadata(&target).await.ok();
    let tmp = temp_path_for(&target);

    let result = async {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp)
            .await?;
        if let Some(meta) = &existing {
            preserve_owner(&file, meta);
            file.set_permissions(meta.permissions()).await?;
        }
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, &target).await
    }
    .await;

    if let Err(source) = result {
        let _ = fs::remove_file(&tmp).await;
        return Err(EditorError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

#[cfg(unix)]
fn preserve_owner(file: &fs::File, meta: &std::fs::Metadata) {
    use std::os::unix::fs::MetadataExt;

    // Only root may hand a file to another user; keep our own ownership then.
    if let Err(e) = std::os::unix::fs::fchown(file, Some(meta.uid()), Some(meta.gid())) {
        tracing::debug!(error = %e, uid = meta.uid(), gid = meta.gid(), "Owner not preserved");
    }
}

#[cfg(not(unix))]
fn preserve_owner(_file: &fs::File, _meta: &std::fs::Metadata) {}
