//! The portable transfer representation of a directory's full contents.

use std::io::Write as _;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::{Directory, Result};
use crate::ram::RamDirectory;

/// A directory's contents as a pure value: an ordered list of file records,
/// independent of any live directory.
///
/// Every buffer is a deep copy, so a snapshot stays correct even if its
/// source directory is mutated or dropped after capture. The value has no
/// mutation operations; serialize it with any serde backend to move it
/// across processes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub files: Vec<FileRecord>,
}

/// One file's name, logical length, and buffer contents.
///
/// Buffer sizes are arbitrary: reconstruction depends only on cumulative
/// byte order and `length`, not on any particular chunking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub length: u64,
    pub buffers: Vec<Vec<u8>>,
}

impl Snapshot {
    /// Extracts a snapshot of `dir`: for each file, its logical length and a
    /// deep copy of every buffer's bytes.
    ///
    /// Each file is read atomically, but the listing as a whole is only
    /// stable if no writer runs concurrently: hold the directory's write
    /// lock around capture when writers may be active.
    pub fn capture(dir: &RamDirectory) -> Snapshot {
        let mut files = Vec::new();
        for (name, file) in dir.entries() {
            let (length, buffers) = file.export();
            files.push(FileRecord {
                name,
                length,
                buffers,
            });
        }
        Snapshot { files }
    }

    /// Rebuilds a fresh, fully independent [`RamDirectory`] holding exactly
    /// this snapshot's contents.
    ///
    /// Each record's buffers are replayed in order while counting down the
    /// declared length; the final buffer is cut at the point where the
    /// logical length is reached, so trailing slack bytes in a record never
    /// leak into the reconstructed file.
    pub fn restore(&self) -> Result<RamDirectory> {
        let dir = RamDirectory::new();
        for record in &self.files {
            let mut out = dir.create_output(&record.name)?;
            let mut remaining = record.length;
            for buffer in &record.buffers {
                if remaining == 0 {
                    break;
                }
                if remaining > buffer.len() as u64 {
                    out.write_all(buffer)?;
                    remaining -= buffer.len() as u64;
                } else {
                    out.write_all(&buffer[..remaining as usize])?;
                    remaining = 0;
                }
            }
            if remaining > 0 {
                warn!(
                    "record '{}' is {} bytes short of its declared length",
                    record.name, remaining
                );
            }
        }
        Ok(dir)
    }

    /// Number of file records.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
