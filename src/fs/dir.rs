//! A disk-backed implementation of the directory abstraction.
//!
//! `FsDirectory` adapts one existing host directory to the [`Directory`]
//! trait: a flat listing of regular files with read, create, delete and
//! length operations. Its main job is to act as the copy source for loading
//! an on-disk data set into a [`RamDirectory`](crate::RamDirectory).

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, anyhow};
use log::warn;

use crate::core::{DirLock, Directory, InputStream, Result, StoreError};

pub struct FsDirectory {
    root: PathBuf, // host path, must exist
    write_lock: Arc<AtomicBool>,
}

impl FsDirectory {
    /// Opens an existing host directory.
    /// * `root` must exist and be a directory; it is never created or
    ///   removed by this type.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if root.as_os_str().is_empty() {
            return Err(anyhow!("invalid root path: empty"));
        }
        if !root.is_dir() {
            return Err(anyhow!("{:?} is not a directory", root));
        }
        Ok(Self {
            root: root.to_path_buf(),
            write_lock: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns the host path of the backing directory.
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Flat filenames only: a name must not escape the root.
    fn resolve(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(anyhow!("invalid file name: {:?}", name));
        }
        Ok(self.root.join(name))
    }

    fn not_found(name: &str, e: io::Error) -> anyhow::Error {
        if e.kind() == io::ErrorKind::NotFound {
            StoreError::FileNotFound(name.to_string()).into()
        } else {
            anyhow::Error::from(e)
        }
    }
}

impl Directory for FsDirectory {
    /// Regular files directly under the root; subdirectories are not listed.
    fn list_all(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => warn!("skipping non-utf8 file name {:?}", raw),
            }
        }
        Ok(names)
    }

    fn open_input(&self, name: &str) -> Result<Box<dyn InputStream>> {
        let path = self.resolve(name)?;
        let file = File::open(&path).map_err(|e| Self::not_found(name, e))?;
        let len = file.metadata()?.len();
        Ok(Box::new(FsInput { file, len }))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn Write + Send>> {
        let path = self.resolve(name)?;
        let file = File::create(&path).with_context(|| format!("cannot create {:?}", path))?;
        Ok(Box::new(file))
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        let path = self.resolve(name)?;
        std::fs::remove_file(&path).map_err(|e| Self::not_found(name, e))
    }

    fn file_length(&self, name: &str) -> Result<u64> {
        let path = self.resolve(name)?;
        let meta = std::fs::metadata(&path).map_err(|e| Self::not_found(name, e))?;
        Ok(meta.len())
    }

    /// In-process single-instance lock, same policy as the RAM store.
    /// Cross-process advisory locking is out of scope for this backend.
    fn acquire_write_lock(&self) -> Result<DirLock> {
        DirLock::acquire(&self.write_lock)
    }
}

struct FsInput {
    file: File,
    len: u64,
}

impl Read for FsInput {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        self.file.read(out)
    }
}

impl Seek for FsInput {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl InputStream for FsInput {
    fn len(&self) -> u64 {
        self.len
    }
}
