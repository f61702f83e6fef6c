//! `BlobStore`: the public facade. Every operation acquires the appropriate
//! side of the read-write lock, then delegates to the component modules.

mod allocator;
mod backing_file;
mod defrag;
pub mod error;
mod lifecycle;
mod platform;
mod read;
mod record;
mod scanner;
mod write;

use std::io;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

pub use error::{Error, Result};
pub use read::ReadChannel;

use backing_file::BackingFile;
use crate::http::HttpSource;
use crate::source::{ByteSource, FileSource};

/// State guarded by the facade's read-write lock.
pub struct Inner {
    file: BackingFile,
}

/// A handle to one backing file. Cheap to clone: internally an `Arc` around
/// the shared lock, so every clone (and every handle returned by `open` for
/// the same path, per the single-instance guarantee) observes the same
/// state.
#[derive(Clone)]
pub struct BlobStore {
    inner: Arc<RwLock<Inner>>,
}

impl BlobStore {
    /// Open the backing file at `path`, creating it at `capacity` bytes if
    /// absent. A second `open` on the same path (from anywhere in the
    /// process) returns a handle sharing the same underlying state.
    pub fn open(path: &Path, capacity: i32) -> Result<Self> {
        let inner = lifecycle::shared_inner(path, capacity)?;
        Ok(Self { inner })
    }

    /// Create an empty record named `name`.
    pub fn create_file(&self, name: &str, content: &[u8]) -> Result<()> {
        let mut guard = self.inner.write();
        write::append_bytes(&mut guard.file, name, content)
    }

    /// Ingest an ambient-OS file at `path`: the stored name is the file's
    /// own basename, length comes from its metadata.
    pub fn copy_from_path(&self, path: &Path) -> Result<()> {
        let mut source = FileSource::open(path).map_err(|err| {
            if err.kind() == io::ErrorKind::InvalidInput {
                Error::InvalidArgument(err.to_string())
            } else {
                Error::IoFailure(err)
            }
        })?;
        self.ingest(&mut source)
    }

    /// Fetch `uri` and store it under a name derived from
    /// `Content-Disposition` or the URI's last path segment.
    pub fn download_and_save(&self, uri: &str) -> Result<()> {
        let mut source = HttpSource::fetch(uri)?;
        self.ingest(&mut source)
    }

    /// Ingest any byte source, streaming directly when its length is known
    /// up front and buffering otherwise.
    fn ingest(&self, source: &mut dyn ByteSource) -> Result<()> {
        let mut guard = self.inner.write();
        if let Some(length) = source.length_hint() {
            write::append_from_known_length_source(&mut guard.file, source, length)
        } else {
            write::append_from_unbounded_source(&mut guard.file, source)
        }
    }

    /// Replace-or-create `name` with `content`.
    pub fn overwrite_file(&self, name: &str, content: &[u8]) -> Result<()> {
        let mut guard = self.inner.write();
        write::overwrite_bytes(&mut guard.file, name, content)
    }

    /// Full content of the live record named `name`.
    pub fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let guard = self.inner.read();
        read::read_whole(&guard, name)
    }

    /// A streaming cursor over the live record named `name`. Pins the
    /// record against defragmentation/format until dropped.
    pub fn open_read_channel(&self, name: &str) -> Result<ReadChannel> {
        let guard = self.inner.read_arc();
        ReadChannel::open(guard, name)
    }

    /// Tombstone the live record named `name`. A no-op if absent.
    pub fn delete_file(&self, name: &str) -> Result<()> {
        let mut guard = self.inner.write();
        write::delete(&mut guard.file, name)
    }

    /// Live names, in scan order.
    pub fn list_files(&self) -> Result<Vec<String>> {
        let guard = self.inner.read();
        scanner::list_live(&guard.file)
    }

    pub fn file_exists(&self, name: &str) -> Result<bool> {
        let guard = self.inner.read();
        scanner::exists(&guard.file, name)
    }

    /// Bytes free in the record area.
    pub fn available_space(&self) -> Result<i32> {
        let guard = self.inner.read();
        Ok(allocator::available_space(
            guard.file.capacity_total(),
            guard.file.append_cursor(),
        ))
    }

    /// Compact the record area, reclaiming tombstoned space.
    pub fn defragment(&self) -> Result<()> {
        let mut guard = self.inner.write();
        defrag::defragment(&mut guard.file)
    }

    /// Reset the record area to empty, preserving capacity.
    pub fn format(&self) -> Result<()> {
        let mut guard = self.inner.write();
        lifecycle::format(&mut guard.file)
    }
}
