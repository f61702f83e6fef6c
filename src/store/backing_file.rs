//! The fixed-capacity backing file: a `File` handle plus the 8-byte prefix
//! (`capacity_total`, `append_cursor`) cached in memory and kept in sync with
//! disk.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, Write};
use std::path::Path;

use super::allocator::PREFIX_SIZE;
use super::error::{Error, Result};
use super::platform;

pub struct BackingFile {
    file: File,
    capacity_total: i32,
    append_cursor: i32,
}

impl BackingFile {
    /// Open an existing backing file in place, or create one at `capacity`
    /// bytes if absent. The prefix is written and flushed before this
    /// returns, for a freshly created file.
    pub fn open_or_create(path: &Path, capacity: i32) -> Result<Self> {
        if capacity <= PREFIX_SIZE {
            return Err(Error::InvalidArgument(format!(
                "capacity {capacity} must exceed the {PREFIX_SIZE}-byte prefix"
            )));
        }

        let existed = path.exists();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(Error::StorageUnavailable)?;

        if existed {
            let (capacity_total, append_cursor) = read_prefix(&mut file)?;
            if capacity_total != capacity {
                log::warn!(
                    "ignoring requested capacity {capacity} for {}: on-disk prefix says {capacity_total}",
                    path.display()
                );
            }
            log::debug!(
                "reopened backing file {} (capacity={capacity_total}, cursor={append_cursor})",
                path.display()
            );
            Ok(Self {
                file,
                capacity_total,
                append_cursor,
            })
        } else {
            file.set_len(capacity as u64).map_err(Error::StorageUnavailable)?;
            let mut store = Self {
                file,
                capacity_total: capacity,
                append_cursor: 0,
            };
            store.flush_prefix()?;
            log::info!(
                "created backing file {} at capacity {capacity}",
                path.display()
            );
            Ok(store)
        }
    }

    pub const fn capacity_total(&self) -> i32 {
        self.capacity_total
    }

    pub const fn append_cursor(&self) -> i32 {
        self.append_cursor
    }

    /// Absolute file offset for a record-area-relative offset.
    pub const fn absolute(&self, relative: i32) -> u64 {
        (PREFIX_SIZE as u64) + (relative as u64)
    }

    pub fn read_at(&self, relative_offset: i32, buf: &mut [u8]) -> Result<()> {
        platform::read_at(&self.file, self.absolute(relative_offset), buf).map_err(Error::from)
    }

    pub fn write_at(&self, relative_offset: i32, buf: &[u8]) -> Result<()> {
        platform::write_at(&self.file, self.absolute(relative_offset), buf).map_err(Error::from)
    }

    /// Advance the append cursor and persist the prefix before returning.
    pub fn advance_cursor(&mut self, by: i32) -> Result<()> {
        self.append_cursor += by;
        self.flush_prefix()
    }

    /// Overwrite the cursor outright (used by `defragment`/`format`) and
    /// persist the prefix.
    pub fn set_cursor(&mut self, cursor: i32) -> Result<()> {
        self.append_cursor = cursor;
        self.flush_prefix()
    }

    pub fn flush_prefix(&mut self) -> Result<()> {
        let mut prefix = [0u8; PREFIX_SIZE as usize];
        prefix[0..4].copy_from_slice(&self.capacity_total.to_be_bytes());
        prefix[4..8].copy_from_slice(&self.append_cursor.to_be_bytes());
        platform::write_at(&self.file, 0, &prefix).map_err(Error::from)?;
        self.file.sync_data().map_err(Error::from)
    }

    pub fn sync(&self) -> Result<()> {
        self.file.sync_all().map_err(Error::from)
    }
}

fn read_prefix(file: &mut File) -> Result<(i32, i32)> {
    let mut buf = [0u8; PREFIX_SIZE as usize];
    file.rewind().map_err(Error::StorageUnavailable)?;
    file.read_exact(&mut buf).map_err(Error::StorageUnavailable)?;
    let capacity_total = i32::from_be_bytes(buf[0..4].try_into().unwrap());
    let append_cursor = i32::from_be_bytes(buf[4..8].try_into().unwrap());
    Ok((capacity_total, append_cursor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_then_reopen_recovers_prefix() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.bin");
        {
            let mut store = BackingFile::open_or_create(&path, 1024).unwrap();
            assert_eq!(store.capacity_total(), 1024);
            assert_eq!(store.append_cursor(), 0);
            store.advance_cursor(13).unwrap();
        }
        let reopened = BackingFile::open_or_create(&path, 1024).unwrap();
        assert_eq!(reopened.capacity_total(), 1024);
        assert_eq!(reopened.append_cursor(), 13);
    }

    #[test]
    fn rejects_capacity_too_small_for_prefix() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.bin");
        assert!(BackingFile::open_or_create(&path, 4).is_err());
    }

    #[test]
    fn positional_io_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.bin");
        let store = BackingFile::open_or_create(&path, 1024).unwrap();
        store.write_at(0, b"hello").unwrap();
        let mut buf = [0u8; 5];
        store.read_at(0, &mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }
}
