//! Byte-exact comparison between two directories, used to certify snapshot
//! round trips.

use std::collections::BTreeMap;

use crate::ram::RamDirectory;

/// Compares every file listed by `a` against its same-named counterpart in
/// `b`, reporting per-file equality.
///
/// A name absent from `b` records `false` for that name. The walk always
/// completes the full listing instead of aborting at the first mismatch, so
/// the caller sees the full extent of divergence. Mismatches are data, not
/// errors: nothing here mutates either directory or fails.
pub fn compare_directories(a: &RamDirectory, b: &RamDirectory) -> BTreeMap<String, bool> {
    let mut report = BTreeMap::new();
    for (name, file) in a.entries() {
        let matched = match b.get_file(&name) {
            Some(other) => file.compare(&other),
            None => false,
        };
        report.insert(name, matched);
    }
    report
}
