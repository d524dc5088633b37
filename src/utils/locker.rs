//! File-based locking so two runs never dump the same source at once

use anyhow::{Context, Result};
use fd_lock::RwLock;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Lock guard for one source run
pub struct BackupLock {
    // Guard and lock live in the same box; the guard is dropped first
    _lock: Box<(RwLock<File>, Option<fd_lock::RwLockWriteGuard<'static, File>>)>,
    lock_path: PathBuf,
}

impl BackupLock {
    /// Acquire an exclusive lock for a source inside `lock_dir`
    /// Returns error if the source is already being backed up
    pub fn acquire(lock_dir: &Path, source_name: &str) -> Result<Self> {
        let lock_path = Self::lock_path(lock_dir, source_name);

        debug!("Attempting to acquire lock: {:?}", lock_path);

        std::fs::create_dir_all(lock_dir).context("Failed to create lock directory")?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .context(format!("Failed to open lock file: {:?}", lock_path))?;

        let mut boxed_lock = Box::new((RwLock::new(file), None));

        // SAFETY: the RwLock sits in a heap allocation that never moves, and
        // the guard stored next to it is always dropped before it (tuple field
        // order), so extending the borrow to 'static never outlives the lock.
        let lock_ptr = &mut boxed_lock.0 as *mut RwLock<File>;
        let guard = unsafe { (*lock_ptr).try_write() }.context(format!(
            "Source '{}' is already being backed up (lock held)",
            source_name
        ))?;

        let static_guard: fd_lock::RwLockWriteGuard<'static, File> =
            unsafe { std::mem::transmute(guard) };
        boxed_lock.1 = Some(static_guard);

        info!("Acquired backup lock for source: {}", source_name);

        Ok(Self {
            _lock: boxed_lock,
            lock_path,
        })
    }

    fn lock_path(lock_dir: &Path, source_name: &str) -> PathBuf {
        lock_dir.join(format!("db-backup-manager-{}.lock", source_name))
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for BackupLock {
    fn drop(&mut self) {
        debug!("Released backup lock: {:?}", self.lock_path);

        if let Err(e) = std::fs::remove_file(&self.lock_path) {
            debug!("Failed to remove lock file: {}", e);
        }
    }
}
