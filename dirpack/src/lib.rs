mod bin;
mod entry;
pub mod ext;
mod pack;
pub mod path;
pub mod stream;
mod unpack;
pub mod walk;

pub use bin::*;
pub use entry::*;
pub use pack::*;
pub use stream::{ArchiveReader, ArchiveWriter};
pub use unpack::*;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

const READ_WRITE_BUF_SIZE: usize = 4 * 1024 * 1024;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("{context}{}", .path.as_ref().map(|p| format!(": {}", p.display())).unwrap_or_default())]
    Io {
        #[source]
        source: io::Error,
        path: Option<PathBuf>,
        context: &'static str,
    },

    #[error("Archive: {0}")]
    Core(#[from] dirpack_core::Error),

    #[error("Invalid component '{}' in path '{}'", .component.display(), .path.display())]
    InvalidPathComponent { path: PathBuf, component: PathBuf },

    #[error("Path '{}' is not inside '{}'", .path.display(), .prefix.display())]
    StripPrefix { prefix: PathBuf, path: PathBuf },

    #[error("Entry size mismatch for '{}': expected {expected}, got {actual}", .path.display())]
    LengthMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("Unsupported file type at '{}'", .path.display())]
    UnsupportedKind { path: PathBuf },

    #[error("Entry '{}' appears more than once in the archive", .path.display())]
    DuplicateEntry { path: PathBuf },

    #[error("'{}' already exists with a different file type", .path.display())]
    KindConflict { path: PathBuf },

    #[error("'{}' does not match the archive", .path.display())]
    VerifyMismatch { path: PathBuf },
}

/// Build a closure for `map_err` that wraps an `io::Error` with context.
#[macro_export]
macro_rules! wrap_io_err {
    ($path:expr, $context:expr) => {
        |source| $crate::Error::Io {
            source,
            path: Some(::std::path::PathBuf::from(
                ::std::convert::AsRef::<::std::path::Path>::as_ref(&$path),
            )),
            context: $context,
        }
    };
    ($context:expr) => {
        |source| $crate::Error::Io {
            source,
            path: None,
            context: $context,
        }
    };
}
