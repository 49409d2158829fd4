//! Advisory lock on a store directory.
//!
//! Held exclusively for the duration of a save so two builders cannot
//! interleave their index and metadata files. Loads take it shared, so they
//! never observe a save halfway through.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

use crate::domain::DomainError;

pub const LOCK_FILE_NAME: &str = "coursesearch.lock";

#[derive(Debug, Clone, Copy)]
enum LockMode {
    Exclusive,
    Shared,
}

/// A held directory lock, released on drop.
#[derive(Debug)]
pub struct FileLock {
    #[allow(dead_code)]
    file: File,
}

impl FileLock {
    /// Takes the lock without waiting; fails if anyone else holds it.
    pub fn try_acquire(dir: &Path) -> Result<Self, DomainError> {
        Self::acquire(dir, LockMode::Exclusive)
    }

    /// Takes the lock alongside other readers; fails while a writer holds it.
    pub fn try_acquire_shared(dir: &Path) -> Result<Self, DomainError> {
        Self::acquire(dir, LockMode::Shared)
    }

    fn acquire(dir: &Path, mode: LockMode) -> Result<Self, DomainError> {
        let lock_path = dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| {
                DomainError::persistence(format!(
                    "cannot open lock file {}: {}",
                    lock_path.display(),
                    e
                ))
            })?;

        Self::try_lock(&file, mode).map_err(|e| {
            if e.kind() == io::ErrorKind::WouldBlock {
                DomainError::persistence(format!(
                    "{} is locked by another process",
                    dir.display()
                ))
            } else {
                DomainError::persistence(format!("cannot lock {}: {}", dir.display(), e))
            }
        })?;

        Ok(FileLock { file })
    }

    #[cfg(unix)]
    fn try_lock(file: &File, mode: LockMode) -> io::Result<()> {
        let fd = file.as_raw_fd();
        let operation = match mode {
            LockMode::Exclusive => libc::LOCK_EX,
            LockMode::Shared => libc::LOCK_SH,
        };
        let result = unsafe { libc::flock(fd, operation | libc::LOCK_NB) };
        if result != 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::WouldBlock
                || err.raw_os_error() == Some(libc::EWOULDBLOCK)
                || err.raw_os_error() == Some(libc::EAGAIN)
            {
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "store is locked"));
            }
            return Err(err);
        }
        Ok(())
    }

    // No advisory locking off unix.
    #[cfg(not(unix))]
    fn try_lock(_file: &File, _mode: LockMode) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(unix)]
impl Drop for FileLock {
    fn drop(&mut self) {
        let fd = self.file.as_raw_fd();
        unsafe { libc::flock(fd, libc::LOCK_UN) };
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn second_holder_is_refused_until_release() {
        let dir = tempfile::tempdir().unwrap();

        let first = FileLock::try_acquire(dir.path());
        assert!(first.is_ok());

        let second = FileLock::try_acquire(dir.path());
        assert!(second.unwrap_err().is_persistence_error());

        drop(first);

        assert!(FileLock::try_acquire(dir.path()).is_ok());
    }

    #[test]
    fn readers_share_but_exclude_writers() {
        let dir = tempfile::tempdir().unwrap();

        let reader = FileLock::try_acquire_shared(dir.path()).unwrap();
        let other_reader = FileLock::try_acquire_shared(dir.path());
        assert!(other_reader.is_ok());

        let writer = FileLock::try_acquire(dir.path());
        assert!(matches!(writer, Err(e) if e.is_persistence_error()));

        drop(reader);
        drop(other_reader);

        let writer = FileLock::try_acquire(dir.path()).unwrap();
        assert!(FileLock::try_acquire_shared(dir.path()).is_err());
        drop(writer);
    }
}
