//! A single named file's content, held as chunked fixed-capacity buffers.

use std::sync::RwLock;

/// Buffer capacity used by files from the default factory.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// An in-memory file body: an ordered sequence of buffers plus a logical
/// length.
///
/// Every buffer except possibly the last holds exactly `capacity` valid
/// bytes; the last holds the remainder, so `buffer_count()` is always
/// `ceil(len / capacity)` (and `0` for an empty file). Buffers are owned
/// exclusively by the file and never shared.
///
/// Growth is append-only. All methods take `&self`; buffer-list mutation is
/// synchronized by an interior lock, independent of any directory-level
/// locking (which, when needed, must be taken first).
#[derive(Debug)]
pub struct RamFile {
    capacity: usize,
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    buffers: Vec<Vec<u8>>,
    len: u64,
}

impl RamFile {
    /// Creates an empty file with the default buffer capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    /// Creates an empty file whose buffers hold up to `capacity` bytes each.
    /// Specialized variants are produced through a directory's file factory.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must be positive");
        Self {
            capacity,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Current logical size in bytes.
    pub fn len(&self) -> u64 {
        self.inner.read().unwrap().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffer capacity this file allocates in.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of physical buffers.
    pub fn buffer_count(&self) -> usize {
        self.inner.read().unwrap().buffers.len()
    }

    /// Physically allocated bytes across all buffers.
    pub fn size_in_bytes(&self) -> u64 {
        let inner = self.inner.read().unwrap();
        inner.buffers.iter().map(|b| b.capacity() as u64).sum()
    }

    /// The valid bytes of the `index`-th buffer.
    ///
    /// # Panics
    /// Panics if `index` is out of `0..buffer_count()`; an invalid index is
    /// a programming error, like slice indexing.
    pub fn buffer(&self, index: usize) -> Vec<u8> {
        let inner = self.inner.read().unwrap();
        match inner.buffers.get(index) {
            Some(buffer) => buffer.clone(),
            None => panic!(
                "buffer index {} out of range 0..{}",
                index,
                inner.buffers.len()
            ),
        }
    }

    /// Appends `bytes` at the end of the file, allocating new buffers as the
    /// current last buffer fills. Never truncates or overwrites.
    pub fn append(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let mut inner = self.inner.write().unwrap();
        let mut rest = bytes;
        while !rest.is_empty() {
            let fill = (inner.len % self.capacity as u64) as usize;
            if fill == 0 {
                // last buffer is full, or none exists yet
                inner.buffers.push(Vec::with_capacity(self.capacity));
            }
            let take = rest.len().min(self.capacity - fill);
            inner.buffers.last_mut().unwrap().extend_from_slice(&rest[..take]); // safe unwrap()
            inner.len += take as u64;
            rest = &rest[take..];
        }
    }

    /// Copies bytes starting at `pos` into `out`, returning how many were
    /// copied (short when `pos + out.len()` passes the end of the file).
    pub(crate) fn read_at(&self, pos: u64, out: &mut [u8]) -> usize {
        let inner = self.inner.read().unwrap();
        if pos >= inner.len {
            return 0;
        }
        let want = out.len().min((inner.len - pos) as usize);
        let mut copied = 0;
        while copied < want {
            let at = pos + copied as u64;
            let buffer = &inner.buffers[(at / self.capacity as u64) as usize];
            let offset = (at % self.capacity as u64) as usize;
            let take = (want - copied).min(buffer.len() - offset);
            out[copied..copied + take].copy_from_slice(&buffer[offset..offset + take]);
            copied += take;
        }
        copied
    }

    /// Logical length plus a deep copy of every buffer's valid bytes, read
    /// under a single lock so the pair is always mutually consistent.
    pub(crate) fn export(&self) -> (u64, Vec<Vec<u8>>) {
        let inner = self.inner.read().unwrap();
        (inner.len, inner.buffers.clone())
    }

    /// Byte-exact structural equality with `other`.
    ///
    /// Lengths and buffer counts are checked first and a mismatch in either
    /// returns `false` immediately, so the walk never indexes past the
    /// shorter file. Otherwise buffers are compared in order, stopping at the
    /// first differing one.
    pub fn compare(&self, other: &RamFile) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        // Lock both files in address order so concurrent compares over the
        // same pair cannot cross-block.
        let flipped = self as *const RamFile > other as *const RamFile;
        let (first, second) = if flipped { (other, self) } else { (self, other) };
        let a = first.inner.read().unwrap();
        let b = second.inner.read().unwrap();

        if a.len != b.len || a.buffers.len() != b.buffers.len() {
            return false;
        }
        a.buffers.iter().zip(&b.buffers).all(|(x, y)| x == y)
    }
}

impl Default for RamFile {
    fn default() -> Self {
        Self::new()
    }
}
