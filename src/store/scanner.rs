//! Forward scan over the record area to resolve names, enumerate live names,
//! and check existence. No in-memory index: every call re-scans from 0.

use super::backing_file::BackingFile;
use super::error::Result;
use super::record::{Header, HEADER_SIZE};

/// Where a live record lives, enough information to tombstone it or read its
/// content without re-scanning.
#[derive(Debug, Clone, Copy)]
pub struct RecordLocation {
    pub header_offset: i32,
    pub content_offset: i32,
    pub content_len: i32,
    pub total_size: i32,
}

impl RecordLocation {
    fn tombstone_offset(&self) -> i32 {
        // name_len(4) + content_len(4)
        self.header_offset + 8
    }
}

/// Forward-scan the record area, calling `visit` for every record (live or
/// tombstoned) in order. `visit` returns `true` to keep scanning.
fn for_each_record(
    file: &BackingFile,
    mut visit: impl FnMut(&str, RecordLocation, bool) -> Result<bool>,
) -> Result<()> {
    let mut offset = 0i32;
    let cursor = file.append_cursor();
    while offset < cursor {
        let mut header_buf = [0u8; HEADER_SIZE as usize];
        file.read_at(offset, &mut header_buf)?;
        let header = Header::decode(&header_buf)?;

        let name_offset = offset + HEADER_SIZE;
        let mut name_buf = vec![0u8; header.name_len as usize];
        file.read_at(name_offset, &mut name_buf)?;
        let name = String::from_utf8_lossy(&name_buf).into_owned();

        let content_offset = name_offset + header.name_len;
        let loc = RecordLocation {
            header_offset: offset,
            content_offset,
            content_len: header.content_len,
            total_size: header.total_size(),
        };

        let keep_going = visit(&name, loc, header.is_live())?;
        if !keep_going {
            return Ok(());
        }
        offset += header.total_size();
    }
    Ok(())
}

/// First live record with this name, if any. By I3 there is at most one.
pub fn find_live(file: &BackingFile, name: &str) -> Result<Option<RecordLocation>> {
    let mut found = None;
    for_each_record(file, |candidate, loc, is_live| {
        if is_live && candidate == name {
            found = Some(loc);
            return Ok(false);
        }
        Ok(true)
    })?;
    Ok(found)
}

/// Live names in scan order.
pub fn list_live(file: &BackingFile) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for_each_record(file, |candidate, _loc, is_live| {
        if is_live {
            names.push(candidate.to_string());
        }
        Ok(true)
    })?;
    Ok(names)
}

pub fn exists(file: &BackingFile, name: &str) -> Result<bool> {
    Ok(find_live(file, name)?.is_some())
}

/// All live records, in scan order, with their locations — used by the
/// defragmenter.
pub fn live_records(file: &BackingFile) -> Result<Vec<RecordLocation>> {
    let mut records = Vec::new();
    for_each_record(file, |_name, loc, is_live| {
        if is_live {
            records.push(loc);
        }
        Ok(true)
    })?;
    Ok(records)
}

/// Mark the record at `loc` as tombstoned in place.
pub fn tombstone(file: &BackingFile, loc: RecordLocation) -> Result<()> {
    file.write_at(loc.tombstone_offset(), &[super::record::TOMBSTONE_DEAD])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::write::append_bytes;
    use tempfile::tempdir;

    #[test]
    fn finds_and_lists_live_records() {
        let dir = tempdir().unwrap();
        let mut file = BackingFile::open_or_create(&dir.path().join("s.bin"), 1024).unwrap();
        append_bytes(&mut file, "a", b"one").unwrap();
        append_bytes(&mut file, "b", b"two").unwrap();

        assert!(exists(&file, "a").unwrap());
        assert!(!exists(&file, "missing").unwrap());
        assert_eq!(list_live(&file).unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn tombstoned_records_are_skipped() {
        let dir = tempdir().unwrap();
        let mut file = BackingFile::open_or_create(&dir.path().join("s.bin"), 1024).unwrap();
        append_bytes(&mut file, "a", b"one").unwrap();
        let loc = find_live(&file, "a").unwrap().unwrap();
        tombstone(&file, loc).unwrap();

        assert!(!exists(&file, "a").unwrap());
        assert!(list_live(&file).unwrap().is_empty());
    }
}
