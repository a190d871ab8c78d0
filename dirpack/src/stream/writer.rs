use std::cmp;
use std::fmt;
use std::io::{self, Read, Write};
use std::mem;
use std::path::PathBuf;

use dirpack_core::Header;

use crate::ext::copy_exact;
use crate::{wrap_io_err, Entry, Error, READ_WRITE_BUF_SIZE};

/// Payload still owed for the last header written
#[derive(Debug)]
struct Pending {
    path: PathBuf,
    expected: u64,
    written: u64,
}

/// Writes entries to an archive stream.
///
/// Each header is followed by exactly `size` payload bytes, written either
/// through the [`Write`] impl or with [`ArchiveWriter::append_reader`].
/// Writing the next header or finishing fails if the previous payload is
/// incomplete. An archive is only valid once [`ArchiveWriter::finish`] has
/// written the end marker; dropping the writer leaves a truncated archive.
///
/// # Example
/// ```
/// use dirpack::{ArchiveReader, ArchiveWriter, Entry};
/// use dirpack_core::Mode;
///
/// let body = b"This archive contains some text files.";
///
/// let mut writer = ArchiveWriter::new(Vec::new());
/// writer
///     .append_reader(
///         &Entry::file("readme.txt", Mode::from_bits_truncate(0o600), body.len() as u64),
///         &body[..],
///     )
///     .unwrap();
/// let archive = writer.finish().unwrap();
///
/// let mut reader = ArchiveReader::new(&archive[..]);
/// let entry = reader.next_entry().unwrap().unwrap();
/// assert_eq!(entry.path().to_str(), Some("readme.txt"));
/// assert!(reader.next_entry().unwrap().is_none());
/// ```
pub struct ArchiveWriter<W: Write> {
    inner: W,
    pending: Option<Pending>,
    buf: Vec<u8>,
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(inner: W) -> ArchiveWriter<W> {
        ArchiveWriter {
            inner,
            pending: None,
            buf: Vec::new(),
        }
    }

    /// Write the header for `entry`. For files, `entry.size()` payload bytes
    /// must be written before the next header.
    pub fn write_header(&mut self, entry: &Entry) -> Result<(), Error> {
        self.complete_pending()?;

        let header = entry.to_header()?;
        self.inner
            .write_all(header.as_bytes())
            .map_err(wrap_io_err!(entry.path(), "Writing header"))?;

        if entry.size() > 0 {
            self.pending = Some(Pending {
                path: entry.path().to_path_buf(),
                expected: entry.size(),
                written: 0,
            });
        }
        Ok(())
    }

    /// Write the header for `entry` and copy exactly `entry.size()` bytes
    /// from `source` after it. A source with fewer bytes is an error.
    pub fn append_reader(&mut self, entry: &Entry, source: impl Read) -> Result<u64, Error> {
        self.write_header(entry)?;

        let wanted = entry.size().clamp(1, READ_WRITE_BUF_SIZE as u64) as usize;
        if self.buf.len() < wanted {
            self.buf.resize(wanted, 0);
        }

        let mut buf = mem::take(&mut self.buf);
        let copied = copy_exact(source, &mut *self, &mut buf, entry.size(), entry.path());
        self.buf = buf;
        let copied = copied?;

        if copied != entry.size() {
            return Err(Error::LengthMismatch {
                path: entry.path().to_path_buf(),
                expected: entry.size(),
                actual: copied,
            });
        }
        Ok(copied)
    }

    /// Write the end marker and flush, returning the inner writer.
    pub fn finish(mut self) -> Result<W, Error> {
        self.complete_pending()?;
        self.inner
            .write_all(Header::end_marker().as_bytes())
            .map_err(wrap_io_err!("Writing end marker"))?;
        self.inner
            .flush()
            .map_err(wrap_io_err!("Flushing archive"))?;
        Ok(self.inner)
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    fn complete_pending(&mut self) -> Result<(), Error> {
        match self.pending.take() {
            Some(pending) if pending.written != pending.expected => Err(Error::LengthMismatch {
                path: pending.path,
                expected: pending.expected,
                actual: pending.written,
            }),
            _ => Ok(()),
        }
    }
}

impl<W: Write> Write for ArchiveWriter<W> {
    /// Write payload bytes for the current entry. Bytes beyond the declared
    /// size are refused.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let pending = match &mut self.pending {
            Some(pending) if pending.written < pending.expected => pending,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "payload exceeds the size declared in the entry header",
                ))
            }
        };

        let remaining = pending.expected - pending.written;
        let len = cmp::min(buf.len() as u64, remaining) as usize;
        let count = self.inner.write(&buf[..len])?;
        pending.written += count as u64;
        Ok(count)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> fmt::Debug for ArchiveWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ArchiveWriter")
            .field("pending", &self.pending)
            .finish()
    }
}
