//! `format` and the path-keyed singleton registry.
//!
//! The spec's distilled source relies on dependency-injected singleton
//! lifetime to guarantee one backing-file handle per path; here that is
//! enforced by construction via a process-wide registry keyed on the
//! canonicalized path, handing back a clone of the existing `Arc` instead of
//! opening the file a second time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use super::backing_file::BackingFile;
use super::error::Result;
use super::Inner;

static REGISTRY: Mutex<Option<HashMap<PathBuf, Weak<RwLock<Inner>>>>> = Mutex::new(None);

/// Reset the record area: `append_cursor = 0`, `capacity_total` preserved.
/// Does not zero the record area — readers are gated by the cursor, so the
/// stale bytes are simply unreachable.
pub fn format(file: &mut BackingFile) -> Result<()> {
    file.set_cursor(0)?;
    file.sync()?;
    log::info!("formatted backing file (capacity {})", file.capacity_total());
    Ok(())
}

/// Return the shared handle for `path`, opening or creating it at `capacity`
/// only if no live handle for this path already exists.
pub fn shared_inner(path: &Path, capacity: i32) -> Result<Arc<RwLock<Inner>>> {
    let canonical = canonical_key(path);
    let mut registry = REGISTRY.lock();
    let map = registry.get_or_insert_with(HashMap::new);

    if let Some(existing) = map.get(&canonical).and_then(Weak::upgrade) {
        log::debug!("reusing existing handle for {}", canonical.display());
        return Ok(existing);
    }

    let file = BackingFile::open_or_create(path, capacity)?;
    let inner = Arc::new(RwLock::new(Inner { file }));
    map.insert(canonical, Arc::downgrade(&inner));
    Ok(inner)
}

/// Canonicalize the parent directory and rejoin the file name, rather than
/// canonicalizing `path` itself. `path` may not exist yet on its first
/// `open`, in which case canonicalizing it directly would fail and fall
/// back to the raw (possibly relative) string — and a later `open` of the
/// same literal path, now that the file exists, would canonicalize to a
/// different key, handing back a second, uncoordinated handle over the same
/// backing file. The parent directory exists on both calls, so keying off
/// its canonical form plus the file name is stable across the file's own
/// creation.
fn canonical_key(path: &Path) -> PathBuf {
    let file_name = match path.file_name() {
        Some(name) => name,
        None => return path.to_path_buf(),
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match std::fs::canonicalize(parent) {
        Ok(canonical_parent) => canonical_parent.join(file_name),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlobStore;
    use tempfile::tempdir;

    #[test]
    fn format_resets_cursor_but_keeps_capacity() {
        let dir = tempdir().unwrap();
        let store = BlobStore::open(&dir.path().join("s.bin"), 1024).unwrap();
        store.create_file("a", b"hello").unwrap();
        store.format().unwrap();

        assert!(store.list_files().unwrap().is_empty());
        assert_eq!(store.available_space().unwrap(), 1024 - 8);
    }

    #[test]
    fn opening_the_same_path_twice_shares_one_handle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s.bin");
        let a = BlobStore::open(&path, 1024).unwrap();
        a.create_file("x", b"1").unwrap();

        let b = BlobStore::open(&path, 1024).unwrap();
        assert_eq!(b.read_file("x").unwrap(), b"1");
    }

    #[test]
    fn opening_a_not_yet_existing_non_canonical_path_twice_shares_one_handle() {
        // A path containing a redundant `.` component normalizes away under
        // `fs::canonicalize` once the file exists, but not before. Both
        // `open` calls pass the exact same (non-canonical) `PathBuf`, so a
        // correct registry key must treat them as the same path regardless
        // of which call actually created the file.
        let dir = tempdir().unwrap();
        let path = dir.path().join(".").join("s.bin");

        let a = BlobStore::open(&path, 1024).unwrap();
        a.create_file("x", b"1").unwrap();

        let b = BlobStore::open(&path, 1024).unwrap();
        assert_eq!(b.read_file("x").unwrap(), b"1");
    }
}
