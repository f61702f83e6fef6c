//! Compaction: rewrite the record area to remove tombstoned regions while
//! preserving the order of live records.

use super::backing_file::BackingFile;
use super::error::Result;
use super::scanner::live_records;

/// Compact `file` in place. Live records are copied forward to the running
/// total of live-record sizes seen so far; destination offset is always
/// `<=` source offset, so each record is fully read before any later record
/// could be overwritten.
pub fn defragment(file: &mut BackingFile) -> Result<()> {
    let records = live_records(file)?;

    let mut dest = 0i32;
    for loc in &records {
        if loc.header_offset != dest {
            let mut buf = vec![0u8; loc.total_size as usize];
            file.read_at(loc.header_offset, &mut buf)?;
            file.write_at(dest, &buf)?;
        }
        dest += loc.total_size;
    }

    file.set_cursor(dest)?;
    file.sync()?;
    log::info!(
        "defragmented: {} live records, cursor now {dest}",
        records.len()
    );
    Ok(())
}
