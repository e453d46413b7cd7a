//! Per-repository mutual exclusion.
//!
//! Fetches into a shared working directory serialize on an exclusive
//! advisory file lock keyed by the canonical repository string. Distinct
//! remotes use distinct lock files and proceed concurrently; the same
//! remote serializes across threads and processes alike.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs4::FileExt;
use sha2::{Digest, Sha256};

const LOCKS_DIR: &str = "locks";

/// Holds the exclusive lock for one repository; released on drop.
#[derive(Debug)]
pub(crate) struct RepoLockGuard {
    _file: File,
}

fn lock_path(cache_root: &Path, key: &str) -> PathBuf {
    let filename = if !key.is_empty()
        && key.bytes().all(|b| {
            matches!(
                b,
                b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'_' | b'-'
            )
        }) {
        key.to_string()
    } else {
        hex::encode(Sha256::digest(key.as_bytes()))
    };
    cache_root.join(LOCKS_DIR).join(format!("{filename}.lock"))
}

/// Block until this process holds the exclusive lock for `repository`.
pub(crate) fn lock_repository(cache_root: &Path, repository: &str) -> Result<RepoLockGuard> {
    let path = lock_path(cache_root, repository);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create lock directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(true)
        .open(&path)
        .with_context(|| format!("failed to open lock {}", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("failed to lock {}", path.display()))?;
    Ok(RepoLockGuard { _file: file })
}
