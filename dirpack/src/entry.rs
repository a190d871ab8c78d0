use std::fmt;
use std::fs::{FileType, Metadata};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use dirpack_core::{Header, Mode};

use crate::ext::{check_path, HeaderExt};
use crate::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symlinks, sockets, devices and fifos. Never written to an archive.
    Unsupported,
}

impl EntryKind {
    pub fn from_file_type(file_type: FileType) -> EntryKind {
        if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Unsupported
        }
    }

    fn mode(self) -> Option<Mode> {
        match self {
            EntryKind::File => Some(Mode::FILE),
            EntryKind::Directory => Some(Mode::DIR),
            EntryKind::Unsupported => None,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Unsupported => "unsupported",
        })
    }
}

/// One archived filesystem node. `path` is relative to the archive root and
/// only holds normal components.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    path: PathBuf,
    kind: EntryKind,
    mode: Mode,
    size: u64,
}

impl Entry {
    pub fn file(path: impl Into<PathBuf>, mode: Mode, size: u64) -> Entry {
        Entry {
            path: path.into(),
            kind: EntryKind::File,
            mode: mode.perm(),
            size,
        }
    }

    pub fn directory(path: impl Into<PathBuf>, mode: Mode) -> Entry {
        Entry {
            path: path.into(),
            kind: EntryKind::Directory,
            mode: mode.perm(),
            size: 0,
        }
    }

    /// Describe a node found on disk. Metadata should not follow symlinks,
    /// otherwise links are archived as their targets.
    pub fn from_metadata(path: impl Into<PathBuf>, metadata: &Metadata) -> Entry {
        let kind = EntryKind::from_file_type(metadata.file_type());
        Entry {
            path: path.into(),
            kind,
            mode: Mode::from_bits_truncate(metadata.permissions().mode()).perm(),
            size: if kind == EntryKind::File {
                metadata.len()
            } else {
                0
            },
        }
    }

    pub fn from_header(header: &Header) -> Result<Entry, Error> {
        let path = header.check_path()?.to_path_buf();
        let mode = header.mode()?;
        let kind = if mode.is_dir() {
            EntryKind::Directory
        } else if mode.is_file() {
            EntryKind::File
        } else {
            return Err(dirpack_core::Error::InvalidMode(mode.bits()).into());
        };
        Ok(Entry {
            path,
            kind,
            mode: mode.perm(),
            size: header.size(),
        })
    }

    pub fn to_header(&self) -> Result<Header, Error> {
        let kind = self.kind.mode().ok_or_else(|| Error::UnsupportedKind {
            path: self.path.clone(),
        })?;
        Ok(Header::new(kind | self.mode, self.size, &self.path_bytes()?)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Permission bits only
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// The path as stored in a header: normal components joined by `/`
    fn path_bytes(&self) -> Result<Vec<u8>, Error> {
        let path = check_path(&self.path)?;
        let mut bytes = Vec::new();
        for component in path.components() {
            if !bytes.is_empty() {
                bytes.push(b'/');
            }
            bytes.extend_from_slice(component.as_os_str().as_bytes());
        }
        Ok(bytes)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {:04o} {:>10} {}",
            self.kind,
            self.mode.bits(),
            self.size,
            self.path.display()
        )
    }
}
