//! A portable, in-memory directory store for Rust. Named files are held as
//! chunked byte buffers, the whole store deep-copies from any external
//! directory, converts into a serde-serializable snapshot value, and rebuilds
//! from that snapshot byte-for-byte.
//!
//! ### Overview
//!
//! `ramdir-kit` keeps a small, memory-resident set of files behind the
//! generic `Directory` trait, so consumers (an indexing engine, for example)
//! never see the storage behind their streams. A `Snapshot` carries the full
//! store across process boundaries in any serde format, and
//! `compare_directories` certifies the round trip file by file.
//!
//! **Key ideas**:
//! - **Abstraction**: Consumers work through a single trait (list, open,
//!   create, delete, length, write lock) over RAM- or disk-backed storage.
//! - **Portability**: Snapshots own deep copies of every buffer; they
//!   survive mutation or drop of their source directory.
//! - **Fidelity**: Round trips are certified by exhaustive byte-exact
//!   comparison, reported per file instead of fail-fast.
//! - **Extensibility**: Directories produce their files through a pluggable
//!   factory, so specialized buffer behavior needs no new directory type.

mod core;
mod fs;
mod ram;
mod snapshot;
mod validate;

pub use crate::core::{DirLock, Directory, InputStream, Result, StoreError};
pub use crate::fs::FsDirectory;
pub use crate::ram::{
    DEFAULT_BUFFER_SIZE, FileFactory, RamDirectory, RamFile, RamInput, RamOutput,
};
pub use crate::snapshot::{FileRecord, Snapshot};
pub use crate::validate::compare_directories;
