//! Append, overwrite, and stream-from-source writes.

use std::io::Read;

use super::allocator::{available_space, is_enough_space};
use super::backing_file::BackingFile;
use super::error::{Error, Result};
use super::record::{on_disk_size, Header, HEADER_SIZE, TOMBSTONE_LIVE};
use super::scanner::{find_live, tombstone};
use crate::source::ByteSource;

/// Append `(name, content)` as a new live record, admission-checked against
/// current free space.
pub fn append_bytes(file: &mut BackingFile, name: &str, content: &[u8]) -> Result<()> {
    let total = on_disk_size(name, content.len())?;
    let capacity_total = file.capacity_total();
    let append_cursor = file.append_cursor();
    if !is_enough_space(capacity_total, append_cursor, total) {
        log::warn!("admission rejected for '{name}': need {total} bytes");
        return Err(Error::InsufficientSpace {
            needed: i64::from(total),
            available: i64::from(available_space(capacity_total, append_cursor)),
        });
    }

    let name_bytes = name.as_bytes();
    let content_len = i32::try_from(content.len())
        .map_err(|_| Error::InvalidArgument("content exceeds INT32_MAX".into()))?;
    let name_len = i32::try_from(name_bytes.len())
        .map_err(|_| Error::InvalidArgument("name too long to encode".into()))?;
    let header = Header::encode(name_len, content_len, TOMBSTONE_LIVE)?;

    let header_offset = append_cursor;
    file.write_at(header_offset, &header)?;
    file.write_at(header_offset + HEADER_SIZE, name_bytes)?;
    file.write_at(header_offset + HEADER_SIZE + name_len, content)?;
    file.advance_cursor(total)?;
    log::debug!("appended '{name}' ({total} bytes on disk)");
    Ok(())
}

/// Replace any existing live record named `name` with `content`: tombstone
/// the old record (if present) first, then append the new one. Falls
/// through to a pure append when no live record with this name exists.
pub fn overwrite_bytes(file: &mut BackingFile, name: &str, content: &[u8]) -> Result<()> {
    if let Some(loc) = find_live(file, name)? {
        tombstone(file, loc)?;
    }
    append_bytes(file, name, content)
}

/// Tombstone the live record named `name`, if any. A no-op (not an error) if
/// absent — idempotent.
pub fn delete(file: &mut BackingFile, name: &str) -> Result<()> {
    if let Some(loc) = find_live(file, name)? {
        tombstone(file, loc)?;
        log::debug!("deleted '{name}'");
    }
    Ok(())
}

/// Stream a source of *known* length directly into the record area, without
/// buffering its content in memory.
pub fn append_from_known_length_source(
    file: &mut BackingFile,
    source: &mut dyn ByteSource,
    length: i64,
) -> Result<()> {
    let name = source
        .name_hint()
        .ok_or_else(|| Error::InvalidArgument("source has no name hint".into()))?;

    let total = on_disk_size(&name, length.max(0) as usize)?;
    let capacity_total = file.capacity_total();
    let append_cursor = file.append_cursor();
    if !is_enough_space(capacity_total, append_cursor, total) {
        return Err(Error::InsufficientSpace {
            needed: i64::from(total),
            available: i64::from(available_space(capacity_total, append_cursor)),
        });
    }

    let name_bytes = name.as_bytes();
    let name_len = i32::try_from(name_bytes.len())
        .map_err(|_| Error::InvalidArgument("name too long to encode".into()))?;
    let content_len = i32::try_from(length)
        .map_err(|_| Error::InvalidArgument("content exceeds INT32_MAX".into()))?;
    let header = Header::encode(name_len, content_len, TOMBSTONE_LIVE)?;

    let header_offset = append_cursor;
    file.write_at(header_offset, &header)?;
    file.write_at(header_offset + HEADER_SIZE, name_bytes)?;

    let mut written = 0i32;
    let mut buf = [0u8; 64 * 1024];
    while written < content_len {
        let n = source.read_into(&mut buf)?;
        if n == 0 {
            return Err(Error::IoFailure(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("source for '{name}' ended early: {written} of {content_len} bytes"),
            )));
        }
        let n_i32 = i32::try_from(n).unwrap();
        file.write_at(header_offset + HEADER_SIZE + name_len + written, &buf[..n])?;
        written += n_i32;
    }

    file.advance_cursor(total)?;
    log::debug!("appended '{name}' from known-length source ({total} bytes on disk)");
    Ok(())
}

/// Buffer a source of *unknown* length fully in memory, rejecting as soon as
/// the running total would not fit, then emit it as a single append once its
/// real size is known. Nothing is written to the backing file if admission
/// ultimately fails.
pub fn append_from_unbounded_source(file: &mut BackingFile, source: &mut dyn ByteSource) -> Result<()> {
    let name = source
        .name_hint()
        .ok_or_else(|| Error::InvalidArgument("source has no name hint".into()))?;

    let capacity_total = file.capacity_total();
    let append_cursor = file.append_cursor();
    let available = i64::from(available_space(capacity_total, append_cursor));

    // Per spec: admission is pre-checked with whatever length is known,
    // falling back to len(name) when no content-length was advertised.
    let hinted = source.length_hint().unwrap_or(name.len() as i64);
    let hinted_total = i64::from(HEADER_SIZE) + name.len() as i64 + hinted.max(0);
    if hinted_total > available {
        return Err(Error::InsufficientSpace {
            needed: hinted_total,
            available,
        });
    }

    let mut buffer = Vec::with_capacity(hinted.max(0).min(1 << 20) as usize);
    let mut chunk = [0u8; 64 * 1024];
    loop {
        let n = source.read_into(&mut chunk)?;
        if n == 0 {
            break;
        }
        let running_total = i64::from(HEADER_SIZE) + name.len() as i64 + buffer.len() as i64 + n as i64;
        if running_total > available {
            return Err(Error::InsufficientSpace {
                needed: running_total,
                available,
            });
        }
        buffer.extend_from_slice(&chunk[..n]);
    }

    append_bytes(file, &name, &buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::scanner::{list_live, find_live};
    use tempfile::tempdir;

    fn store(cap: i32) -> (tempfile::TempDir, BackingFile) {
        let dir = tempdir().unwrap();
        let file = BackingFile::open_or_create(&dir.path().join("s.bin"), cap).unwrap();
        (dir, file)
    }

    #[test]
    fn append_then_overwrite_tombstones_old_and_adds_new() {
        let (_dir, mut file) = store(1024);
        append_bytes(&mut file, "a", &[1, 2, 3]).unwrap();
        overwrite_bytes(&mut file, "a", &[9]).unwrap();

        assert_eq!(list_live(&file).unwrap(), vec!["a".to_string()]);
        let loc = find_live(&file, "a").unwrap().unwrap();
        assert_eq!(loc.content_len, 1);
    }

    #[test]
    fn overwrite_without_existing_record_is_a_plain_append() {
        let (_dir, mut file) = store(1024);
        overwrite_bytes(&mut file, "a", &[1]).unwrap();
        assert_eq!(list_live(&file).unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn delete_is_idempotent() {
        let (_dir, mut file) = store(1024);
        append_bytes(&mut file, "a", &[1]).unwrap();
        delete(&mut file, "a").unwrap();
        delete(&mut file, "a").unwrap();
        assert!(list_live(&file).unwrap().is_empty());
    }

    #[test]
    fn delete_of_missing_name_is_a_no_op() {
        let (_dir, mut file) = store(1024);
        assert!(delete(&mut file, "nope").is_ok());
    }

    #[test]
    fn append_fails_when_record_does_not_fit() {
        let (_dir, mut file) = store(32);
        let err = append_bytes(&mut file, "a", &[0u8; 100]).unwrap_err();
        assert!(matches!(err, Error::InsufficientSpace { .. }));
    }

    struct VecSource {
        name: String,
        data: Vec<u8>,
        pos: usize,
        length_hint: Option<i64>,
    }

    impl ByteSource for VecSource {
        fn name_hint(&self) -> Option<String> {
            Some(self.name.clone())
        }
        fn length_hint(&self) -> Option<i64> {
            self.length_hint
        }
        fn read_into(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let remaining = &self.data[self.pos..];
            let n = remaining.len().min(buf.len());
            buf[..n].copy_from_slice(&remaining[..n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn known_length_source_streams_directly() {
        let (_dir, mut file) = store(1024);
        let mut source = VecSource {
            name: "file.txt".into(),
            data: b"hello world".to_vec(),
            pos: 0,
            length_hint: Some(11),
        };
        append_from_known_length_source(&mut file, &mut source, 11).unwrap();
        let loc = find_live(&file, "file.txt").unwrap().unwrap();
        assert_eq!(loc.content_len, 11);
    }

    #[test]
    fn unbounded_source_buffers_then_appends() {
        let (_dir, mut file) = store(1024);
        let mut source = VecSource {
            name: "download.bin".into(),
            data: b"streamed content".to_vec(),
            pos: 0,
            length_hint: None,
        };
        append_from_unbounded_source(&mut file, &mut source).unwrap();
        let loc = find_live(&file, "download.bin").unwrap().unwrap();
        assert_eq!(loc.content_len, "streamed content".len() as i32);
    }

    #[test]
    fn unbounded_source_rejects_mid_stream_overrun_without_writing() {
        let (_dir, mut file) = store(40);
        let mut source = VecSource {
            name: "f".into(),
            data: vec![0u8; 100],
            pos: 0,
            length_hint: None,
        };
        let err = append_from_unbounded_source(&mut file, &mut source).unwrap_err();
        assert!(matches!(err, Error::InsufficientSpace { .. }));
        assert!(list_live(&file).unwrap().is_empty());
        assert_eq!(file.append_cursor(), 0);
    }
}
