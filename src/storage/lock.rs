use crate::error::{Result, WizardError};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::time::{Duration, Instant};

const RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Exclusive lock on a sidecar `.lock` file, released on drop.
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Lock `<path>.lock`, retrying until `timeout` elapses
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let lock_path = path.with_extension("lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)?;

        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(FileLock { file }),
                Err(_) if start.elapsed() < timeout => std::thread::sleep(RETRY_INTERVAL),
                Err(_) => {
                    tracing::warn!(path = %lock_path.display(), "timed out waiting for storage lock");
                    return Err(WizardError::StorageLocked);
                }
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_is_exclusive_until_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let first = FileLock::acquire(&path, Duration::from_millis(100)).unwrap();
        let second = FileLock::acquire(&path, Duration::from_millis(100));
        assert!(matches!(second, Err(WizardError::StorageLocked)));

        drop(first);
        assert!(FileLock::acquire(&path, Duration::from_millis(100)).is_ok());
    }
}
