use std::cmp;
use std::fmt;
use std::io::{self, Read};
use std::path::PathBuf;

use dirpack_core::{Header, HEADER_SIZE};

use crate::{wrap_io_err, Entry, Error};

/// Payload of the last entry returned by `next_entry`
#[derive(Debug)]
struct Current {
    path: PathBuf,
    size: u64,
    remaining: u64,
}

/// Reads entries from an archive stream in order.
///
/// After [`ArchiveReader::next_entry`] returns a file entry, the reader's
/// [`Read`] impl yields that entry's payload and then reports end of file.
/// Unread payload is skipped by the next call to `next_entry`. A stream that
/// ends inside a payload makes `read` fail with
/// [`io::ErrorKind::UnexpectedEof`].
pub struct ArchiveReader<R: Read> {
    inner: R,
    current: Option<Current>,
    done: bool,
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(inner: R) -> ArchiveReader<R> {
        ArchiveReader {
            inner,
            current: None,
            done: false,
        }
    }

    /// Read the next header. Returns `Ok(None)` once the end marker has been
    /// read. After an error, every further call returns `Ok(None)`.
    pub fn next_entry(&mut self) -> Result<Option<Entry>, Error> {
        if self.done {
            return Ok(None);
        }
        let next = self.read_entry();
        if !matches!(next, Ok(Some(_))) {
            self.done = true;
        }
        next
    }

    /// Iterate over the remaining entries, skipping their payloads.
    pub fn entries(&mut self) -> Entries<'_, R> {
        Entries { reader: self }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_entry(&mut self) -> Result<Option<Entry>, Error> {
        self.skip_payload()?;

        let mut data = [0; HEADER_SIZE];
        self.inner
            .read_exact(&mut data)
            .map_err(wrap_io_err!("Reading header"))?;

        let header = match Header::parse(&data)? {
            Some(header) => header,
            None => return Ok(None),
        };
        let entry = Entry::from_header(header)?;

        self.current = Some(Current {
            path: entry.path().to_path_buf(),
            size: entry.size(),
            remaining: entry.size(),
        });
        Ok(Some(entry))
    }

    fn skip_payload(&mut self) -> Result<(), Error> {
        let Some(current) = self.current.take() else {
            return Ok(());
        };
        if current.remaining == 0 {
            return Ok(());
        }

        let skipped = io::copy(
            &mut (&mut self.inner).take(current.remaining),
            &mut io::sink(),
        )
        .map_err(wrap_io_err!(current.path, "Skipping entry data"))?;

        if skipped != current.remaining {
            return Err(Error::LengthMismatch {
                actual: current.size - current.remaining + skipped,
                expected: current.size,
                path: current.path,
            });
        }
        Ok(())
    }
}

impl<R: Read> Read for ArchiveReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let current = match &mut self.current {
            Some(current) if current.remaining > 0 && !buf.is_empty() => current,
            _ => return Ok(0),
        };

        let len = cmp::min(buf.len() as u64, current.remaining) as usize;
        let count = self.inner.read(&mut buf[..len])?;
        if count == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "archive ended inside entry data",
            ));
        }
        current.remaining -= count as u64;
        Ok(count)
    }
}

impl<R: Read> fmt::Debug for ArchiveReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ArchiveReader")
            .field("current", &self.current)
            .field("done", &self.done)
            .finish()
    }
}

/// Iterator returned by [`ArchiveReader::entries`]
#[derive(Debug)]
pub struct Entries<'a, R: Read> {
    reader: &'a mut ArchiveReader<R>,
}

impl<R: Read> Iterator for Entries<'_, R> {
    type Item = Result<Entry, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_entry().transpose()
    }
}
