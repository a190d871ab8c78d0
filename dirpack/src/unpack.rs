use std::collections::HashSet;
use std::fs::{self, DirBuilder, OpenOptions, Permissions};
use std::io::{self, Read};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::ext::copy_exact;
use crate::{wrap_io_err, ArchiveReader, Entry, EntryKind, Error, READ_WRITE_BUF_SIZE};

/// Mode for restored directories, before the umask is applied
pub const DEFAULT_DIR_MODE: u32 = 0o775;

/// How the unpacker resolves a path it cannot restore as-is
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Replace what is there
    Overwrite,
    /// Abort the unpack
    #[default]
    Error,
    /// Keep what is there and ignore the entry
    Skip,
}

#[derive(Clone, Debug)]
pub struct UnpackOptions {
    /// A file path that was already restored from the same archive
    pub duplicates: CollisionPolicy,
    /// The destination holds a node of another type, e.g. a directory where
    /// the archive has a file. Re-creating an existing directory is never a
    /// conflict.
    pub conflicts: CollisionPolicy,
    pub dir_mode: u32,
}

impl Default for UnpackOptions {
    fn default() -> UnpackOptions {
        UnpackOptions {
            duplicates: CollisionPolicy::default(),
            conflicts: CollisionPolicy::default(),
            dir_mode: DEFAULT_DIR_MODE,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnpackStats {
    pub files: u64,
    pub directories: u64,
    /// Entries ignored under [`CollisionPolicy::Skip`]
    pub skipped: u64,
    /// Payload bytes written
    pub bytes: u64,
}

/// Materializes an archive stream under a destination directory.
///
/// Entries are restored one at a time in archive order. Nothing is rolled
/// back on failure: entries restored before the error stay on disk.
#[derive(Clone, Debug, Default)]
pub struct Unpacker {
    options: UnpackOptions,
}

impl Unpacker {
    pub fn new(options: UnpackOptions) -> Unpacker {
        Unpacker { options }
    }

    /// Restore every entry of `archive` under `dest`, which is created if
    /// missing. An empty `dest` means the current directory.
    pub fn unpack<R: Read>(
        &self,
        archive: &mut ArchiveReader<R>,
        dest: impl AsRef<Path>,
    ) -> Result<UnpackStats, Error> {
        let dest = dest.as_ref();
        let mut stats = UnpackStats::default();
        let mut restored = HashSet::new();
        let mut buf = vec![0; READ_WRITE_BUF_SIZE];

        self.create_dir(dest)?;

        while let Some(entry) = archive.next_entry()? {
            let target = dest.join(entry.path());

            match entry.kind() {
                EntryKind::Directory => {
                    if !self.resolve_conflict(&target, EntryKind::Directory)? {
                        stats.skipped += 1;
                        continue;
                    }
                    self.create_dir(&target)?;
                    stats.directories += 1;
                }
                EntryKind::File => {
                    if !restored.insert(entry.path().to_path_buf()) {
                        match self.options.duplicates {
                            CollisionPolicy::Overwrite => {}
                            CollisionPolicy::Error => {
                                return Err(Error::DuplicateEntry {
                                    path: entry.path().to_path_buf(),
                                });
                            }
                            CollisionPolicy::Skip => {
                                debug!(entry = %entry, "skipping duplicate");
                                stats.skipped += 1;
                                continue;
                            }
                        }
                    }
                    if !self.resolve_conflict(&target, EntryKind::File)? {
                        stats.skipped += 1;
                        continue;
                    }
                    stats.bytes += self.restore_file(&entry, &target, archive, &mut buf)?;
                    stats.files += 1;
                }
                EntryKind::Unsupported => {
                    return Err(Error::UnsupportedKind {
                        path: entry.path().to_path_buf(),
                    });
                }
            }
            debug!(entry = %entry, "unpacked");
        }

        info!(
            dest = %dest.display(),
            files = stats.files,
            directories = stats.directories,
            skipped = stats.skipped,
            bytes = stats.bytes,
            "unpack finished"
        );
        Ok(stats)
    }

    fn create_dir(&self, path: &Path) -> Result<(), Error> {
        // Relative to the current directory, which exists
        if path.as_os_str().is_empty() {
            return Ok(());
        }
        DirBuilder::new()
            .recursive(true)
            .mode(self.options.dir_mode)
            .create(path)
            .map_err(wrap_io_err!(path, "Creating directory"))
    }

    /// Returns `false` when the entry should be skipped
    fn resolve_conflict(&self, target: &Path, wanted: EntryKind) -> Result<bool, Error> {
        let metadata = match fs::symlink_metadata(target) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(true),
            Err(source) => {
                return Err(Error::Io {
                    source,
                    path: Some(target.to_path_buf()),
                    context: "Reading metadata",
                })
            }
        };
        if EntryKind::from_file_type(metadata.file_type()) == wanted {
            return Ok(true);
        }

        match self.options.conflicts {
            CollisionPolicy::Error => Err(Error::KindConflict {
                path: target.to_path_buf(),
            }),
            CollisionPolicy::Skip => {
                debug!(path = %target.display(), "skipping conflicting entry");
                Ok(false)
            }
            CollisionPolicy::Overwrite => {
                if metadata.is_dir() {
                    fs::remove_dir_all(target)
                } else {
                    fs::remove_file(target)
                }
                .map_err(wrap_io_err!(target, "Removing conflicting node"))?;
                Ok(true)
            }
        }
    }

    /// Copy the payload into `target`, then apply the entry's permissions
    fn restore_file<R: Read>(
        &self,
        entry: &Entry,
        target: &Path,
        archive: &mut ArchiveReader<R>,
        buf: &mut [u8],
    ) -> Result<u64, Error> {
        if let Some(parent) = target.parent() {
            self.create_dir(parent)?;
        }

        // A regular file left here may be read-only; unlinking only needs a
        // writable parent
        match fs::remove_file(target) {
            Ok(()) => debug!(path = %target.display(), "replacing existing file"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(Error::Io {
                    source,
                    path: Some(target.to_path_buf()),
                    context: "Removing existing file",
                })
            }
        }

        // Keep partial content private until the final mode is applied
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(target)
            .map_err(wrap_io_err!(target, "Creating file"))?;

        let copied = copy_exact(&mut *archive, &mut file, buf, entry.size(), target)?;
        drop(file);

        if copied != entry.size() {
            return Err(Error::LengthMismatch {
                path: PathBuf::from(entry.path()),
                expected: entry.size(),
                actual: copied,
            });
        }

        fs::set_permissions(target, Permissions::from_mode(entry.mode().bits()))
            .map_err(wrap_io_err!(target, "Setting permissions"))?;
        Ok(copied)
    }
}

/// Unpack the archive read from `input` under `dest` with default options.
pub fn unpack<R: Read>(input: R, dest: impl AsRef<Path>) -> Result<UnpackStats, Error> {
    Unpacker::default().unpack(&mut ArchiveReader::new(input), dest)
}
