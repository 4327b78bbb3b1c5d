//! Artifact checksum calculation.
//!
//! SHA-256 of a produced standalone, streamed in fixed-size chunks so large
//! executables never have to fit in memory.

use crate::bundler::{Result, error::ErrorExt};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

const CHUNK_SIZE: usize = 8192;

/// Calculates the SHA-256 of a file.
///
/// # Returns
///
/// * `Ok(Some(String))` - Lowercase hex digest (64 characters)
/// * `Ok(None)` - The file does not exist (not built yet)
/// * `Err` - The file exists but could not be read
pub async fn hash_file(path: &Path) -> Result<Option<String>> {
    let mut file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).fs_context("opening file for hashing", path),
    };

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(Some(hex::encode(hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_file_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();

        let digest = hash_file(&path).await.unwrap().unwrap();
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let digest = hash_file(&dir.path().join("not-built-yet")).await.unwrap();
        assert!(digest.is_none());
    }

    #[tokio::test]
    async fn test_multi_chunk_file_matches_one_shot_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("large");
        let content: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &content).unwrap();

        let expected = hex::encode(Sha256::digest(&content));
        let digest = hash_file(&path).await.unwrap().unwrap();
        assert_eq!(digest, expected);
        assert_eq!(digest.len(), 64);
    }
}
