//! Crash-safe file replacement.
//!
//! Readers observe either the previous file or the complete new one, never a
//! truncated write: bytes go to a temp file in the destination directory,
//! are synced, then renamed over the target.

use std::io::Write;
use std::path::{Path, PathBuf};
use warden_core::error::{WardenError, WardenResult};

/// Directory that holds `path`. A bare file name resolves to `.`.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Atomically replaces `final_path` with `bytes`, creating the parent
/// directory if needed.
pub fn atomic_write(final_path: &Path, bytes: &[u8]) -> WardenResult<()> {
    let dir = parent_dir(final_path);
    std::fs::create_dir_all(&dir).map_err(|e| {
        WardenError::Persist(format!("cannot create directory {}: {e}", dir.display()))
    })?;

    // Same directory as the target so the rename never crosses filesystems.
    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| {
        WardenError::Persist(format!("cannot create temp file in {}: {e}", dir.display()))
    })?;

    tmp.as_file_mut()
        .write_all(bytes)
        .map_err(|e| WardenError::Persist(format!("cannot write temp file: {e}")))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| WardenError::Persist(format!("cannot sync temp file: {e}")))?;

    tmp.persist(final_path).map_err(|e| {
        WardenError::Persist(format!(
            "cannot rename temp file -> {}: {}",
            final_path.display(),
            e.error
        ))
    })?;

    sync_dir(&dir);
    Ok(())
}

/// Best effort: makes the rename itself durable on filesystems that need it.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = std::fs::File::open(dir).and_then(|d| d.sync_all()) {
        tracing::debug!(dir = %dir.display(), error = %e, "directory sync failed");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_file_name_resolves_to_cwd() {
        assert_eq!(parent_dir(Path::new("whitelist.json")), PathBuf::from("."));
        assert_eq!(
            parent_dir(Path::new("conf/whitelist.json")),
            PathBuf::from("conf")
        );
    }

    #[test]
    fn replaces_existing_file_and_creates_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("nested/deeper/out.json");

        atomic_write(&target, b"first").unwrap();
        atomic_write(&target, b"second").unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"second");
        let leftovers: Vec<_> = std::fs::read_dir(target.parent().unwrap())
            .unwrap()
            .collect();
        assert_eq!(leftovers.len(), 1, "temp file left behind");
    }

    #[test]
    fn rename_onto_directory_fails_cleanly() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("taken");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();

        let err = atomic_write(&target, b"data").unwrap_err();
        assert!(matches!(err, WardenError::Persist(_)));
        assert!(target.join("keep").exists());
    }
}
