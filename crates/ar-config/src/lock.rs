//! `config.json` critical section (spec.md §4.5, §5: "always acquired via
//! `flock(LOCK_EX)` on a sibling lock file; released on all exit paths").
//!
//! Unlike the teacher's per-tool `csa-lock` (which uses `LOCK_EX | LOCK_NB`
//! and fails fast), this lock blocks: two concurrent `Execute` invocations
//! against the same config root must serialise (P6), not race.

use std::fs::{self, File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Guard holding the blocking exclusive `flock` on `config.json.lock`.
/// Released on `Drop` via an explicit `LOCK_UN`.
pub struct ConfigLock {
    file: File,
    lock_path: PathBuf,
}

impl std::fmt::Debug for ConfigLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLock")
            .field("lock_path", &self.lock_path)
            .finish()
    }
}

impl Drop for ConfigLock {
    fn drop(&mut self) {
        let fd = self.file.as_raw_fd();
        // SAFETY: `fd` is owned by `self.file` and still open.
        unsafe {
            libc::flock(fd, libc::LOCK_UN);
        }
    }
}

impl ConfigLock {
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Block until the exclusive lock on `<config_root>/config.json.lock`
    /// is acquired. Creates `config_root` and the lock file if absent.
    pub fn acquire(config_root: &Path) -> Result<Self, ConfigError> {
        fs::create_dir_all(config_root)
            .map_err(|e| ConfigError::Lock(format!("create config dir: {e}")))?;
        let lock_path = crate::paths::config_lock_path(config_root);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| ConfigError::Lock(format!("open {}: {e}", lock_path.display())))?;

        let fd = file.as_raw_fd();
        // SAFETY: `fd` is a valid descriptor from the file just opened.
        // This blocks (no LOCK_NB) until the exclusive lock is available.
        let ret = unsafe { libc::flock(fd, libc::LOCK_EX) };
        if ret != 0 {
            return Err(ConfigError::Lock(format!(
                "flock failed on {}: {}",
                lock_path.display(),
                std::io::Error::last_os_error()
            )));
        }

        Ok(Self { file, lock_path })
    }
}
