//! An owning, in-memory collection of named files.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, RwLock};

use anyhow::{Context, anyhow};
use log::debug;

use crate::core::{DirLock, Directory, InputStream, Result, StoreError};
use crate::ram::RamFile;
use crate::ram::io::{RamInput, RamOutput};

/// Capability producing the files a directory hands out.
///
/// Substituting the factory is how specialized file variants (e.g. a
/// different buffer capacity) are obtained without a new directory type.
pub type FileFactory = Arc<dyn Fn() -> RamFile + Send + Sync>;

/// An in-memory directory: a flat map from unique filename to [`RamFile`].
///
/// Files belong to exactly one directory; copying into a new directory
/// always produces new, independent files and buffers. Not intended for huge
/// data sets: everything is resident on the heap in fixed-size chunks.
///
/// ### Locking
///
/// Lock acquisition order is directory first, then file: the internal file
/// map lock is taken (and released) before any file's buffer lock. The
/// separate [write lock](Directory::acquire_write_lock) is a single-instance
/// exclusive lock serializing writer sessions; readers are not blocked by it.
pub struct RamDirectory {
    files: RwLock<BTreeMap<String, Arc<RamFile>>>,
    factory: FileFactory,
    write_lock: Arc<AtomicBool>,
}

impl RamDirectory {
    /// Creates an empty directory with its write lock initialized.
    pub fn new() -> Self {
        Self::with_factory(Arc::new(RamFile::new))
    }

    /// Creates an empty directory whose [`new_file`](Self::new_file) hook is
    /// the given factory.
    pub fn with_factory(factory: FileFactory) -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
            factory,
            write_lock: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Deep-copies every file of `source` into a fresh directory, streaming
    /// bytes in chunks of `chunk_size`, preserving filenames and exact
    /// content. The result is fully independent of `source`. Releasing
    /// `source` afterwards is the caller's concern.
    pub fn copy_from(source: &dyn Directory, chunk_size: usize) -> Result<RamDirectory> {
        let dir = RamDirectory::new();
        dir.copy_all_from(source, chunk_size)?;
        Ok(dir)
    }

    /// Copies every file `source` lists into this directory; exhaustive,
    /// no skips, no duplicates. Copy order across filenames follows the
    /// source listing but carries no contract.
    ///
    /// Each file's copy is independently atomic: a file is installed into
    /// the map only once fully copied, so a failure propagates to the caller
    /// while every previously copied file stays valid and accessible.
    pub fn copy_all_from(&self, source: &dyn Directory, chunk_size: usize) -> Result<()> {
        if chunk_size == 0 {
            return Err(anyhow!("chunk size must be positive"));
        }
        let mut chunk = vec![0u8; chunk_size];
        for name in source.list_all()? {
            let mut input = source
                .open_input(&name)
                .with_context(|| format!("copy of '{}' failed", name))?;
            let file = Arc::new(self.new_file());
            let mut remaining = input.len();
            while remaining > 0 {
                let take = chunk.len().min(remaining as usize);
                input
                    .read_exact(&mut chunk[..take])
                    .with_context(|| format!("copy of '{}' failed", name))?;
                file.append(&chunk[..take]);
                remaining -= take as u64;
            }
            debug!("copied '{}' ({} bytes)", name, file.len());
            self.install(name, file);
        }
        Ok(())
    }

    /// Produces a new, detached file from the directory's factory. Used by
    /// the snapshot reconstruction path and by `create_output`.
    pub fn new_file(&self) -> RamFile {
        (self.factory)()
    }

    /// Looks up a file by name. Returns `None` when absent; absence is an
    /// ordinary outcome here, not an error.
    pub fn get_file(&self, name: &str) -> Option<Arc<RamFile>> {
        self.files.read().unwrap().get(name).cloned()
    }

    /// All `(name, file)` pairs currently present, in name order.
    pub fn entries(&self) -> Vec<(String, Arc<RamFile>)> {
        self.files
            .read()
            .unwrap()
            .iter()
            .map(|(name, file)| (name.clone(), Arc::clone(file)))
            .collect()
    }

    /// Physically allocated bytes across all files.
    pub fn size_in_bytes(&self) -> u64 {
        self.entries().iter().map(|(_, f)| f.size_in_bytes()).sum()
    }

    fn install(&self, name: String, file: Arc<RamFile>) {
        self.files.write().unwrap().insert(name, file);
    }
}

impl Default for RamDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl Directory for RamDirectory {
    fn list_all(&self) -> Result<Vec<String>> {
        Ok(self.files.read().unwrap().keys().cloned().collect())
    }

    fn open_input(&self, name: &str) -> Result<Box<dyn InputStream>> {
        match self.get_file(name) {
            Some(file) => Ok(Box::new(RamInput::new(file))),
            None => Err(StoreError::FileNotFound(name.to_string()).into()),
        }
    }

    /// Creates `name`, replacing any existing file of that name. The old
    /// file is dropped once its remaining readers release their handles.
    fn create_output(&self, name: &str) -> Result<Box<dyn Write + Send>> {
        let file = Arc::new(self.new_file());
        self.install(name.to_string(), Arc::clone(&file));
        Ok(Box::new(RamOutput::new(file)))
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        match self.files.write().unwrap().remove(name) {
            Some(_) => {
                debug!("deleted '{}'", name);
                Ok(())
            }
            None => Err(StoreError::FileNotFound(name.to_string()).into()),
        }
    }

    fn file_length(&self, name: &str) -> Result<u64> {
        match self.get_file(name) {
            Some(file) => Ok(file.len()),
            None => Err(StoreError::FileNotFound(name.to_string()).into()),
        }
    }

    fn acquire_write_lock(&self) -> Result<DirLock> {
        DirLock::acquire(&self.write_lock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Directory with a few files of known content.
    fn setup_test_dir() -> RamDirectory {
        let dir = RamDirectory::new();
        for (name, content) in [
            ("alpha.bin", vec![1u8; 100]),
            ("beta.bin", vec![2u8; 2500]),
            ("gamma.bin", Vec::new()),
        ] {
            let mut out = dir.create_output(name).unwrap();
            out.write_all(&content).unwrap();
        }
        dir
    }

    mod lookup {
        use super::*;

        #[test]
        fn test_list_all_is_exhaustive() {
            let dir = setup_test_dir();
            let mut names = dir.list_all().unwrap();
            names.sort();
            assert_eq!(names, ["alpha.bin", "beta.bin", "gamma.bin"]);
        }

        #[test]
        fn test_get_file_missing_returns_none() {
            let dir = setup_test_dir();
            assert!(dir.get_file("missing").is_none());
        }

        #[test]
        fn test_file_length() {
            let dir = setup_test_dir();
            assert_eq!(dir.file_length("beta.bin").unwrap(), 2500);
            assert_eq!(dir.file_length("gamma.bin").unwrap(), 0);
        }

        #[test]
        fn test_size_in_bytes_sums_allocations() {
            let dir = setup_test_dir();
            // alpha: one 1024-byte buffer; beta: three; gamma: none.
            assert_eq!(dir.size_in_bytes(), 4 * 1024);
        }

        #[test]
        fn test_absent_name_is_a_branchable_not_found() {
            let dir = setup_test_dir();

            let err = dir.file_length("missing").unwrap_err();
            assert!(matches!(
                err.downcast_ref::<StoreError>(),
                Some(StoreError::FileNotFound(name)) if name == "missing"
            ));
            assert!(dir.open_input("missing").is_err());
            assert!(dir.delete_file("missing").is_err());
        }
    }

    mod streams {
        use super::*;

        #[test]
        fn test_write_then_read_round_trip() {
            let dir = RamDirectory::new();
            let bytes: Vec<u8> = (0..4000).map(|i| (i % 256) as u8).collect();

            let mut out = dir.create_output("data.bin").unwrap();
            out.write_all(&bytes).unwrap();
            drop(out);

            let mut input = dir.open_input("data.bin").unwrap();
            assert_eq!(input.len(), 4000);
            let mut read_back = Vec::new();
            input.read_to_end(&mut read_back).unwrap();
            assert_eq!(read_back, bytes);
        }

        #[test]
        fn test_create_output_replaces_existing_file() {
            let dir = setup_test_dir();
            let mut out = dir.create_output("alpha.bin").unwrap();
            out.write_all(b"fresh").unwrap();
            drop(out);

            assert_eq!(dir.file_length("alpha.bin").unwrap(), 5);
        }

        #[test]
        fn test_delete_file_removes_from_listing() {
            let dir = setup_test_dir();
            dir.delete_file("alpha.bin").unwrap();
            assert!(dir.get_file("alpha.bin").is_none());
            assert_eq!(dir.list_all().unwrap().len(), 2);
        }
    }

    mod locking {
        use super::*;

        #[test]
        fn test_write_lock_is_exclusive_until_dropped() {
            let dir = RamDirectory::new();

            let guard = dir.acquire_write_lock().unwrap();
            let busy = dir.acquire_write_lock();
            assert!(matches!(
                busy.unwrap_err().downcast_ref::<StoreError>(),
                Some(StoreError::LockBusy)
            ));

            drop(guard);
            assert!(dir.acquire_write_lock().is_ok());
        }

        #[test]
        fn test_concurrent_writers_to_distinct_files() {
            let dir = Arc::new(RamDirectory::new());
            let mut handles = Vec::new();
            for i in 0..4 {
                let dir = Arc::clone(&dir);
                handles.push(std::thread::spawn(move || {
                    let name = format!("file-{}.bin", i);
                    let mut out = dir.create_output(&name).unwrap();
                    for _ in 0..10 {
                        out.write_all(&vec![i as u8; 300]).unwrap();
                    }
                }));
            }
            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(dir.list_all().unwrap().len(), 4);
            for i in 0..4 {
                assert_eq!(dir.file_length(&format!("file-{}.bin", i)).unwrap(), 3000);
            }
        }
    }

    mod copy_from {
        use super::*;

        #[test]
        fn test_copy_is_exhaustive_and_byte_exact() {
            let src = setup_test_dir();
            let copy = RamDirectory::copy_from(&src, 512).unwrap();

            let mut names = copy.list_all().unwrap();
            names.sort();
            assert_eq!(names, ["alpha.bin", "beta.bin", "gamma.bin"]);
            for (name, file) in src.entries() {
                assert!(file.compare(&copy.get_file(&name).unwrap()), "{}", name);
            }
        }

        #[test]
        fn test_copy_is_isolated_from_source_mutation() {
            let src = setup_test_dir();
            let copy = RamDirectory::copy_from(&src, 256).unwrap();

            src.get_file("beta.bin").unwrap().append(b"more bytes");

            assert_eq!(copy.file_length("beta.bin").unwrap(), 2500);
            assert_eq!(src.file_length("beta.bin").unwrap(), 2510);
        }

        #[test]
        fn test_chunk_size_smaller_than_buffer_capacity() {
            let src = setup_test_dir();
            let copy = RamDirectory::copy_from(&src, 7).unwrap();
            assert!(src
                .get_file("beta.bin")
                .unwrap()
                .compare(&copy.get_file("beta.bin").unwrap()));
        }

        #[test]
        fn test_zero_chunk_size_is_rejected() {
            let src = RamDirectory::new();
            assert!(RamDirectory::copy_from(&src, 0).is_err());
        }
    }

    mod factory {
        use super::*;

        #[test]
        fn test_factory_controls_buffer_capacity() {
            let dir = RamDirectory::with_factory(Arc::new(|| RamFile::with_capacity(256)));
            let mut out = dir.create_output("small.bin").unwrap();
            out.write_all(&[0u8; 1000]).unwrap();
            drop(out);

            let file = dir.get_file("small.bin").unwrap();
            assert_eq!(file.capacity(), 256);
            assert_eq!(file.buffer_count(), 4);
        }
    }
}
