//! Extention traits and I/O helpers for base types defined in `dirpack-core`.
use std::ffi::OsStr;
use std::io::{self, Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Component, Path};

use blake3::{Hash, Hasher};
use dirpack_core::Header;

use crate::{wrap_io_err, Error};

pub trait HeaderExt {
    fn check_path(&self) -> Result<&Path, Error>;
}

impl HeaderExt for Header {
    /// Iterate the components of the path and ensure that there are no
    /// non-normal components.
    fn check_path(&self) -> Result<&Path, Error> {
        check_path(Path::new(OsStr::from_bytes(self.path_bytes())))
    }
}

/// Reject paths that could escape the directory they are joined onto.
pub fn check_path(path: &Path) -> Result<&Path, Error> {
    for component in path.components() {
        match component {
            Component::Normal(_) => {}
            invalid => {
                let bad_component: &Path = invalid.as_ref();
                return Err(Error::InvalidPathComponent {
                    path: path.to_path_buf(),
                    component: bad_component.to_path_buf(),
                });
            }
        }
    }
    Ok(path)
}

/// Copy at most `expected` bytes from `read` to `write` through `buf`.
///
/// Returns the number of bytes copied; a source that ends early is not an
/// error here, callers compare the count against what they expected.
pub(crate) fn copy_exact<R: Read, W: Write>(
    mut read: R,
    mut write: W,
    buf: &mut [u8],
    expected: u64,
    path: &Path,
) -> Result<u64, Error> {
    let mut total = 0;
    while total < expected {
        let want = buf.len().min((expected - total).try_into().unwrap_or(usize::MAX));
        let count = match read.read(&mut buf[..want]) {
            Ok(0) => break,
            Ok(count) => count,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(source) => {
                return Err(Error::Io {
                    source,
                    path: Some(path.to_path_buf()),
                    context: "Reading entry data",
                })
            }
        };
        write
            .write_all(&buf[..count])
            .map_err(wrap_io_err!(path, "Writing entry data"))?;
        total += count as u64;
    }
    Ok(total)
}

pub(crate) fn copy_and_hash<R: Read, W: Write>(
    mut read: R,
    mut write: W,
    buf: &mut [u8],
) -> io::Result<(u64, Hash)> {
    let mut hasher = Hasher::new();
    let mut total = 0;
    loop {
        let count = match read.read(buf) {
            Ok(0) => break,
            Ok(count) => count,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        total += count as u64;
        write.write_all(&buf[..count])?;
        hasher.update_rayon(&buf[..count]);
    }
    Ok((total, hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::Path;

    use super::{check_path, copy_exact};
    use crate::Error;

    #[test]
    fn normal_paths_pass() {
        assert!(check_path(Path::new("usr/lib/libc.so")).is_ok());
    }

    #[test]
    fn escaping_paths_fail() {
        for bad in ["../etc/passwd", "/etc/passwd", "a/../../b", "./a"] {
            assert!(
                matches!(
                    check_path(Path::new(bad)),
                    Err(Error::InvalidPathComponent { .. })
                ),
                "{} was accepted",
                bad
            );
        }
    }

    #[test]
    fn copy_stops_at_expected() {
        let mut buf = [0; 4];
        let mut out = Vec::new();
        let count = copy_exact(&b"0123456789"[..], &mut out, &mut buf, 6, Path::new("x")).unwrap();
        assert_eq!(count, 6);
        assert_eq!(out, b"012345");
    }

    #[test]
    fn copy_reports_short_source() {
        let mut buf = [0; 4];
        let count = copy_exact(&b"012"[..], io::sink(), &mut buf, 6, Path::new("x")).unwrap();
        assert_eq!(count, 3);
    }
}
