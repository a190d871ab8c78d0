use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use dirpack_core::Mode;
use tracing::info;

use crate::ext::copy_and_hash;
use crate::{
    wrap_io_err, ArchiveReader, ArchiveWriter, Entry, EntryKind, Error, PackOptions, PackStats,
    Packer, UnpackOptions, UnpackStats, Unpacker, READ_WRITE_BUF_SIZE,
};

/// `-` selects stdin
fn open_archive(archive_path: &str) -> Result<ArchiveReader<BufReader<Box<dyn Read>>>, Error> {
    let src: Box<dyn Read> = if archive_path == "-" {
        Box::new(io::stdin())
    } else {
        Box::new(File::open(archive_path).map_err(wrap_io_err!(archive_path, "Opening archive"))?)
    };
    Ok(ArchiveReader::new(BufReader::new(src)))
}

/// Pack `folder` into the file at `archive_path`, `-` for stdout.
pub fn create(archive_path: &str, folder: &str, options: PackOptions) -> Result<PackStats, Error> {
    let dst: Box<dyn Write> = if archive_path == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(archive_path)
                .map_err(wrap_io_err!(archive_path, "Creating archive"))?,
        )
    };

    let mut archive = ArchiveWriter::new(BufWriter::new(dst));
    let stats = Packer::new(options).pack(folder, &mut archive)?;
    archive.finish()?;
    Ok(stats)
}

pub fn extract(
    archive_path: &str,
    base_dir: &str,
    options: UnpackOptions,
) -> Result<UnpackStats, Error> {
    let mut archive = open_archive(archive_path)?;
    Unpacker::new(options).unpack(&mut archive, base_dir)
}

/// Read every header in the archive without extracting anything.
pub fn list(archive_path: &str) -> Result<Vec<Entry>, Error> {
    open_archive(archive_path)?.entries().collect()
}

/// Check that every entry of the archive exists under `base_dir`. Files must
/// have the same content and permission bits, directories only need to
/// exist. Returns the number of entries checked.
pub fn verify(archive_path: &str, base_dir: &str) -> Result<u64, Error> {
    let base_dir = Path::new(base_dir);
    let mut archive = open_archive(archive_path)?;
    let mut buf = vec![0; READ_WRITE_BUF_SIZE];
    let mut count = 0;

    while let Some(entry) = archive.next_entry()? {
        let expected_path = base_dir.join(entry.path());
        let mismatch = || Error::VerifyMismatch {
            path: expected_path.clone(),
        };

        let metadata = match fs::symlink_metadata(&expected_path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(mismatch()),
            Err(source) => {
                return Err(Error::Io {
                    source,
                    path: Some(expected_path.clone()),
                    context: "Reading metadata",
                })
            }
        };
        if EntryKind::from_file_type(metadata.file_type()) != entry.kind() {
            return Err(mismatch());
        }

        if entry.kind() == EntryKind::File {
            if Mode::from_bits_truncate(metadata.permissions().mode()).perm() != entry.mode() {
                return Err(mismatch());
            }

            let (archived_size, archived_hash) = copy_and_hash(&mut archive, io::sink(), &mut buf)
                .map_err(wrap_io_err!(entry.path(), "Hashing archived data"))?;
            if archived_size != entry.size() {
                return Err(Error::LengthMismatch {
                    path: entry.path().to_path_buf(),
                    expected: entry.size(),
                    actual: archived_size,
                });
            }

            let file =
                File::open(&expected_path).map_err(wrap_io_err!(expected_path, "Opening file"))?;
            let (size, hash) = copy_and_hash(file, io::sink(), &mut buf)
                .map_err(wrap_io_err!(expected_path, "Hashing file"))?;
            if size != archived_size || hash != archived_hash {
                return Err(mismatch());
            }
        }
        count += 1;
    }

    info!(base_dir = %base_dir.display(), entries = count, "verify finished");
    Ok(count)
}
