//! Byte-source capability consumed by the write path. Keeps the core free of
//! any transport concern: an ambient-OS file and an HTTP download both reduce
//! to `{ name_hint, length_hint, read_into }`.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

pub trait ByteSource {
    /// The source's own idea of a name (a file's basename, a download's
    /// filename). `None` means the caller must supply one.
    fn name_hint(&self) -> Option<String>;

    /// Exact length if known up front; `None` for a stream whose size is
    /// only known once it ends.
    fn length_hint(&self) -> Option<i64>;

    /// Read into `buf`, returning the number of bytes read, or `0` at EOF.
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// An ambient-OS file, ingested by `copyFromPath`.
pub struct FileSource {
    file: File,
    name: String,
    len: i64,
}

impl FileSource {
    pub fn open(path: &Path) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
        Ok(Self {
            file: File::open(path)?,
            name,
            len: i64::try_from(metadata.len()).unwrap_or(i64::MAX),
        })
    }
}

impl ByteSource for FileSource {
    fn name_hint(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn length_hint(&self) -> Option<i64> {
        Some(self.len)
    }

    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}
