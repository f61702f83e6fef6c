//! Whole-file reads and the streaming `ReadChannel`.

use parking_lot::lock_api::ArcRwLockReadGuard;
use parking_lot::RawRwLock;

use super::error::{Error, Result};
use super::scanner::find_live;
use super::Inner;

/// Read a live record's full content into a freshly allocated buffer.
pub fn read_whole(inner: &Inner, name: &str) -> Result<Vec<u8>> {
    let loc = find_live(&inner.file, name)?
        .ok_or_else(|| Error::FileNotFound(name.to_string()))?;
    let mut buf = vec![0u8; loc.content_len as usize];
    inner.file.read_at(loc.content_offset, &mut buf)?;
    Ok(buf)
}

/// A positional cursor over one live record's content range. Holds an
/// owned, `Arc`-cloned read guard on the facade's lock for its whole
/// lifetime, pinning the record against `defragment`/`format`/overwrite
/// until the channel is dropped.
pub struct ReadChannel {
    guard: ArcRwLockReadGuard<RawRwLock, Inner>,
    start: i32,
    len: i64,
    pos: i64,
}

impl ReadChannel {
    pub(crate) fn open(guard: ArcRwLockReadGuard<RawRwLock, Inner>, name: &str) -> Result<Self> {
        let loc = find_live(&guard.file, name)?
            .ok_or_else(|| Error::FileNotFound(name.to_string()))?;
        Ok(Self {
            guard,
            start: loc.content_offset,
            len: i64::from(loc.content_len),
            pos: 0,
        })
    }

    pub fn len(&self) -> i64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn position(&self) -> i64 {
        self.pos
    }

    /// Read into `buf`, returning the number of bytes read (0 at EOF).
    /// `buf` may be any size; reads are clamped to the record's remaining
    /// length.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let remaining = self.len - self.pos;
        if remaining <= 0 {
            return Ok(0);
        }
        let to_read = (buf.len() as i64).min(remaining) as usize;
        let offset = self.start + self.pos as i32;
        self.guard.file.read_at(offset, &mut buf[..to_read])?;
        self.pos += to_read as i64;
        Ok(to_read)
    }

    /// Release the pin on the underlying record.
    pub fn close(self) {
        drop(self);
    }
}
