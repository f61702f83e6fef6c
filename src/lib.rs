//! A flat, single-file blob store: named byte records appended to one
//! pre-allocated backing file, soft-deleted with tombstones, and reclaimed
//! by an explicit defragmentation pass.

pub mod http;
pub mod source;
pub mod store;

pub use source::ByteSource;
pub use store::{BlobStore, Error, ReadChannel, Result};
