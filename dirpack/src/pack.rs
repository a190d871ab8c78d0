use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::path::{archive_path, root_file_name};
use crate::walk::{Walk, WalkEntry};
use crate::{wrap_io_err, ArchiveWriter, Entry, EntryKind, Error};

/// What to do with symlinks, sockets, devices and fifos found while packing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnsupportedPolicy {
    /// Leave them out of the archive and keep walking
    #[default]
    Skip,
    /// Abort with [`Error::UnsupportedKind`]
    Error,
}

#[derive(Clone, Debug, Default)]
pub struct PackOptions {
    pub unsupported: UnsupportedPolicy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PackStats {
    pub files: u64,
    pub directories: u64,
    /// Unsupported nodes left out of the archive
    pub skipped: u64,
    /// Payload bytes written
    pub bytes: u64,
}

/// Serializes a filesystem tree into an archive stream.
///
/// Entries are written in walk order (parent directories first, siblings
/// sorted by name), so packing the same tree twice gives the same archive.
#[derive(Clone, Debug, Default)]
pub struct Packer {
    options: PackOptions,
}

impl Packer {
    pub fn new(options: PackOptions) -> Packer {
        Packer { options }
    }

    /// Append every node under `root` to `archive`. The end marker is not
    /// written, see [`ArchiveWriter::finish`].
    ///
    /// When `root` is a directory its entries are named relative to it and
    /// the root itself is not stored. A regular file root is stored under
    /// its file name.
    pub fn pack<W: Write>(
        &self,
        root: impl AsRef<Path>,
        archive: &mut ArchiveWriter<W>,
    ) -> Result<PackStats, Error> {
        let root = root.as_ref();
        let mut stats = PackStats::default();

        for node in Walk::new(root) {
            let node = node?;
            let Some(entry) = self.entry_for(root, &node)? else {
                continue;
            };

            match entry.kind() {
                EntryKind::Directory => {
                    archive.write_header(&entry)?;
                    stats.directories += 1;
                }
                EntryKind::File => {
                    let source = File::open(node.path())
                        .map_err(wrap_io_err!(node.path(), "Opening file"))?;
                    stats.bytes += archive.append_reader(&entry, source)?;
                    stats.files += 1;
                }
                EntryKind::Unsupported => match self.options.unsupported {
                    UnsupportedPolicy::Skip => {
                        warn!(path = %node.path().display(), "skipping unsupported file type");
                        stats.skipped += 1;
                        continue;
                    }
                    UnsupportedPolicy::Error => {
                        return Err(Error::UnsupportedKind {
                            path: node.path().to_path_buf(),
                        });
                    }
                },
            }
            debug!(entry = %entry, "packed");
        }

        info!(
            root = %root.display(),
            files = stats.files,
            directories = stats.directories,
            skipped = stats.skipped,
            bytes = stats.bytes,
            "pack finished"
        );
        Ok(stats)
    }

    /// `None` for a directory root, which has no entry of its own
    fn entry_for(&self, root: &Path, node: &WalkEntry) -> Result<Option<Entry>, Error> {
        let name = if node.depth() == 0 {
            if node.metadata().is_dir() {
                return Ok(None);
            }
            root_file_name(root)?
        } else {
            archive_path(node.path(), root)?
        };
        Ok(Some(Entry::from_metadata(name, node.metadata())))
    }
}

/// Pack the tree at `root` into `output` with default options and close the
/// archive.
pub fn pack<W: Write>(root: impl AsRef<Path>, output: W) -> Result<PackStats, Error> {
    let mut archive = ArchiveWriter::new(output);
    let stats = Packer::default().pack(root, &mut archive)?;
    archive.finish()?;
    Ok(stats)
}
