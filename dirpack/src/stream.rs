//! Sequential archive codec: headers from `dirpack-core` interleaved with
//! entry payloads, closed by an all-zero end marker.
mod reader;
mod writer;

pub use reader::{ArchiveReader, Entries};
pub use writer::ArchiveWriter;
