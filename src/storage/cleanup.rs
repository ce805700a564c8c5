// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Best-effort index directory removal
//!
//! Index files can stay locked for a moment after the store is dropped (memory
//! maps on Windows, antivirus scanners, a second process reading the index).
//! Removal therefore:
//!
//! | Step | Action                                                         |
//! |------|----------------------------------------------------------------|
//! | 1    | Missing path counts as removed                                 |
//! | 2    | Wait `settle_delay` so dropped handles are released            |
//! | 3    | Try `remove_dir_all` up to `max_attempts` times                |
//! | 4    | Between attempts that fail on a lock, wait `retry_delay`       |
//! | 5    | If the last attempt is locked too, rename to `<path>_old_<ts>` |
//!
//! Any other error gives up immediately. Nothing is ever propagated to the
//! caller: the result is a plain `bool`.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Wait before the first attempt (1 second)
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Wait between locked attempts (2 seconds)
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Direct removal attempts before falling back to rename
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct CleanupPolicy {
    pub settle_delay: Duration,
    pub retry_delay: Duration,
    pub max_attempts: u32,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            retry_delay: DEFAULT_RETRY_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl CleanupPolicy {
    /// Same retry shape without any waiting
    pub fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            retry_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Filesystem operations used by cleanup
pub trait StoreFs: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl StoreFs for RealFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }
}

/// Whether an error means "someone still holds the files"
pub fn is_lock_error(error: &io::Error) -> bool {
    if error.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
    cfg!(windows) && matches!(error.raw_os_error(), Some(32) | Some(33))
}

/// `<path>_old_<unix seconds>`
pub fn parked_path(path: &Path, unix_seconds: u64) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_os_string();
    name.push(format!("_old_{}", unix_seconds));
    PathBuf::from(name)
}

/// Remove an index directory with bounded retries; see module docs
pub async fn safe_remove_database(path: &Path, policy: &CleanupPolicy) -> bool {
    safe_remove_database_with(&RealFs, path, policy).await
}

pub async fn safe_remove_database_with(
    fs: &dyn StoreFs,
    path: &Path,
    policy: &CleanupPolicy,
) -> bool {
    if !fs.exists(path) {
        return true;
    }

    if !policy.settle_delay.is_zero() {
        tokio::time::sleep(policy.settle_delay).await;
    }

    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        match fs.remove_dir_all(path) {
            Ok(()) => {
                info!("Removed index directory {}", path.display());
                return true;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Index directory {} already gone", path.display());
                return true;
            }
            Err(e) if is_lock_error(&e) => {
                warn!(
                    "Index directory {} locked (attempt {}/{}): {}",
                    path.display(),
                    attempt,
                    attempts,
                    e
                );
                if attempt < attempts && !policy.retry_delay.is_zero() {
                    tokio::time::sleep(policy.retry_delay).await;
                }
            }
            Err(e) => {
                warn!("Failed to remove index directory {}: {}", path.display(), e);
                return false;
            }
        }
    }

    let target = parked_path(path, chrono::Utc::now().timestamp().max(0) as u64);
    match fs.rename(path, &target) {
        Ok(()) => {
            warn!(
                "Index directory {} still locked, moved aside to {}",
                path.display(),
                target.display()
            );
            true
        }
        Err(e) => {
            warn!(
                "Failed to move locked index directory {} aside: {}",
                path.display(),
                e
            );
            false
        }
    }
}
