//! Core abstractions shared by every directory backend: the `Directory`
//! trait consumed by external collaborators, the crate-wide `Result` alias,
//! the typed error conditions callers branch on, and the directory-scoped
//! write-lock guard.

use std::io::{Read, Seek, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Error conditions a caller is expected to branch on.
///
/// Everything else travels through `anyhow` as context on the underlying
/// error. Match with `err.downcast_ref::<StoreError>()`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The named file is not present in the directory.
    #[error("file not found: {0}")]
    FileNotFound(String),
    /// The directory's exclusive write lock is already held.
    #[error("write lock already held")]
    LockBusy,
}

/// A readable, seekable stream over one file's bytes.
///
/// The length is fixed when the stream is opened; bytes appended to the
/// underlying file afterwards are not visible through an open stream, so a
/// reader observes an append completely or not at all.
pub trait InputStream: Read + Seek + Send {
    /// Total stream length in bytes, captured at open time.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A flat, named-file directory as its consumers (e.g. an indexing engine)
/// see it. Implementations decide where the bytes live.
///
/// Output streams are append-only: a `create_output` stream never truncates
/// or rewrites bytes already written through it.
pub trait Directory: Send + Sync {
    /// All filenames currently present. No ordering guarantee.
    fn list_all(&self) -> Result<Vec<String>>;

    /// Opens a read stream over an existing file.
    /// Fails with [`StoreError::FileNotFound`] if `name` is absent.
    fn open_input(&self, name: &str) -> Result<Box<dyn InputStream>>;

    /// Creates `name` (replacing any existing file) and returns an
    /// append-only write stream over it.
    fn create_output(&self, name: &str) -> Result<Box<dyn Write + Send>>;

    /// Removes `name` from the directory.
    /// Fails with [`StoreError::FileNotFound`] if `name` is absent.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// Logical length of `name` in bytes.
    /// Fails with [`StoreError::FileNotFound`] if `name` is absent.
    fn file_length(&self, name: &str) -> Result<u64>;

    /// Acquires the directory's exclusive write lock for the duration of a
    /// writing session. Fails with [`StoreError::LockBusy`] while another
    /// holder exists.
    fn acquire_write_lock(&self) -> Result<DirLock>;
}

/// Guard for a directory's exclusive write lock.
///
/// Single-instance policy: at most one guard exists per directory at any
/// time. The lock is released when the guard is dropped.
#[derive(Debug)]
pub struct DirLock {
    held: Arc<AtomicBool>,
}

impl DirLock {
    pub(crate) fn acquire(held: &Arc<AtomicBool>) -> Result<DirLock> {
        if held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(StoreError::LockBusy.into());
        }
        Ok(DirLock {
            held: Arc::clone(held),
        })
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}
