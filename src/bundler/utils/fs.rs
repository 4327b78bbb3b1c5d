//! File system utilities for the build pipeline.
//!
//! Idempotent directory creation and removal, plus copy, move and write
//! helpers that report the offending path on failure.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{io, path::Path};
use tokio::fs;

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }

    // create_dir_all is already idempotent - succeeds even if dir exists
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(e).fs_context("removing directory", path),
    }
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Err(Error::GenericError(format!("{from:?} does not exist")));
    }
    if !from.is_file() {
        return Err(Error::GenericError(format!("{from:?} is not a file")));
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying file", from)?;
    Ok(())
}

/// Moves a file, falling back to copy + remove when a plain rename is not
/// possible (e.g. across file systems).
pub async fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating directory", dest_dir)?;
    }
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(e).fs_context("moving file", from),
        Err(e) => {
            log::debug!("rename of {} failed ({}), copying instead", from.display(), e);
            copy_file(from, to).await?;
            fs::remove_file(from)
                .await
                .fs_context("removing moved file", from)
        }
    }
}

/// Writes `contents` to `path` (create or truncate), creating parent directories.
pub async fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .fs_context("creating directory", parent)?;
    }
    fs::write(path, contents).await.fs_context("writing file", path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_dir_all_erases_existing_contents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("staging");
        std::fs::create_dir_all(target.join("old")).unwrap();
        std::fs::write(target.join("old").join("stale.bin"), b"x").unwrap();

        create_dir_all(&target, true).await.unwrap();
        assert!(target.is_dir());
        assert!(!target.join("old").exists());

        // idempotent without erase
        create_dir_all(&target, false).await.unwrap();
        assert!(target.is_dir());
    }

    #[tokio::test]
    async fn test_remove_missing_dir_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        remove_dir_all(&dir.path().join("never-created")).await.unwrap();
    }

    #[tokio::test]
    async fn test_move_file_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("artifact");
        let to = dir.path().join("a").join("b").join("artifact");
        std::fs::write(&from, b"payload").unwrap();

        move_file(&from, &to).await.unwrap();
        assert!(!from.exists());
        assert_eq!(std::fs::read(&to).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_move_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("missing");
        let err = move_file(&from, &dir.path().join("dest")).await.unwrap_err();
        assert!(matches!(err, Error::Fs { ref path, .. } if *path == from));
    }

    #[tokio::test]
    async fn test_copy_file_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = copy_file(dir.path(), &dir.path().join("copy")).await.unwrap_err();
        assert!(err.to_string().contains("is not a file"));
    }
}
