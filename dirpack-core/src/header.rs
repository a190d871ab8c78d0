//! The packed struct represents the on-stream format of a dirpack entry
use core::fmt::Display;

use blake3::Hash;
use bytemuck::{Pod, PodCastError, Zeroable};

use crate::{Error, Mode, HEADER_SIZE, MAGIC, PATH_SIZE};

/// Offset of the first byte covered by the header checksum
const SIGNED_OFFSET: usize = 32;

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(packed, C)]
pub struct Header {
    /// Blake3 sum of the header data following this field
    pub blake3: [u8; 32],
    /// Always `MAGIC`; an all-zero header marks the end of the archive
    pub magic: [u8; 8],
    /// Size in bytes of the payload immediately following this header
    pub size: u64,
    /// Unix mode (entry kind and permissions)
    pub mode: u32,
    /// NUL-terminated relative path from extract directory
    pub path: [u8; PATH_SIZE],
}

impl Display for Header {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "path={:?} hash={} size={} mode={:o}",
            core::str::from_utf8(self.path_bytes()).unwrap_or_default(),
            self.blake3().to_hex(),
            self.size(),
            u32::from_le(self.mode)
        )
    }
}

impl Header {
    /// Build a sealed header. `path` must be a relative, `/` separated path
    /// without NUL bytes.
    pub fn new(mode: Mode, size: u64, path: &[u8]) -> Result<Header, Error> {
        if path.is_empty() || path.contains(&0) {
            return Err(Error::InvalidPath);
        }
        if path.len() >= PATH_SIZE {
            return Err(Error::PathTooLong(path.len()));
        }
        if !(mode.is_file() || mode.is_dir()) {
            return Err(Error::InvalidMode(mode.bits()));
        }
        if mode.is_dir() && size != 0 {
            return Err(Error::InvalidSize(size));
        }

        let mut header = Header::zeroed();
        header.magic = MAGIC;
        header.size = size.to_le();
        header.mode = mode.bits().to_le();
        header.path[..path.len()].copy_from_slice(path);
        header.blake3 = header.compute_blake3().into();
        Ok(header)
    }

    /// The all-zero header that terminates an archive
    pub fn end_marker() -> Header {
        Header::zeroed()
    }

    /// Parse a header from raw data and verify its checksum.
    ///
    /// Returns `Ok(None)` for the end marker.
    pub fn parse(data: &[u8]) -> Result<Option<&Header>, Error> {
        let data = data
            .get(..HEADER_SIZE)
            .ok_or(Error::Cast(PodCastError::SizeMismatch))?;

        if data.iter().all(|b| *b == 0) {
            return Ok(None);
        }

        let header: &Header = bytemuck::try_from_bytes(data)?;
        if header.magic != MAGIC {
            return Err(Error::InvalidMagic);
        }
        if &header.blake3 != header.compute_blake3().as_bytes() {
            return Err(Error::InvalidBlake3);
        }

        let mode = header.mode()?;
        if !(mode.is_file() || mode.is_dir()) {
            return Err(Error::InvalidMode(mode.bits()));
        }
        if mode.is_dir() && header.size() != 0 {
            return Err(Error::InvalidSize(header.size()));
        }
        // The last byte is always the terminator
        if header.path[PATH_SIZE - 1] != 0 || header.path_bytes().is_empty() {
            return Err(Error::InvalidPath);
        }

        Ok(Some(header))
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    pub fn is_end_marker(&self) -> bool {
        self.as_bytes().iter().all(|b| *b == 0)
    }

    pub fn blake3(&self) -> Hash {
        Hash::from(self.blake3)
    }

    pub fn size(&self) -> u64 {
        u64::from_le(self.size)
    }

    pub fn mode(&self) -> Result<Mode, Error> {
        let mode = u32::from_le(self.mode);
        Mode::from_bits(mode).ok_or(Error::InvalidMode(mode))
    }

    /// Retrieve the path, ending at the first NUL
    pub fn path_bytes(&self) -> &[u8] {
        let end = self
            .path
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(self.path.len());
        &self.path[..end]
    }

    fn compute_blake3(&self) -> Hash {
        blake3::hash(&self.as_bytes()[SIGNED_OFFSET..])
    }
}

#[cfg(test)]
mod tests {
    use bytemuck::Zeroable;

    use super::Header;
    use crate::{Error, Mode, HEADER_SIZE, PATH_SIZE};

    const SOME_FILE_PATH: &[u8] = b"var/db/fun";
    const SOME_FILE_MODE: Mode = Mode::from_bits_truncate(0o100640);

    #[test]
    fn parses_what_it_seals() {
        let header = Header::new(SOME_FILE_MODE, 33, SOME_FILE_PATH).unwrap();
        let parsed = Header::parse(header.as_bytes()).unwrap().unwrap();

        assert_eq!(SOME_FILE_PATH, parsed.path_bytes());
        assert_eq!(SOME_FILE_MODE, parsed.mode().unwrap());
        assert_eq!(33, parsed.size());
    }

    #[test]
    fn zeroed_is_end_marker() {
        let marker = Header::end_marker();
        assert!(marker.is_end_marker());
        assert!(Header::parse(marker.as_bytes()).unwrap().is_none());
    }

    #[test]
    fn flipped_bit_fails_checksum() {
        let header = Header::new(SOME_FILE_MODE, 33, SOME_FILE_PATH).unwrap();
        let mut bytes = header.as_bytes().to_vec();
        bytes[45] ^= 0x01;

        assert!(matches!(Header::parse(&bytes), Err(Error::InvalidBlake3)));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut header = Header::new(SOME_FILE_MODE, 1, SOME_FILE_PATH).unwrap();
        header.magic = *b"notdirpk";

        assert!(matches!(
            Header::parse(header.as_bytes()),
            Err(Error::InvalidMagic)
        ));
    }

    #[test]
    fn short_data() {
        let header = Header::zeroed();
        assert!(matches!(
            Header::parse(&header.as_bytes()[..HEADER_SIZE - 1]),
            Err(Error::Cast(_))
        ));
    }

    #[test]
    fn path_limits() {
        let long = [b'a'; PATH_SIZE];
        assert!(matches!(
            Header::new(SOME_FILE_MODE, 0, &long),
            Err(Error::PathTooLong(PATH_SIZE))
        ));
        assert!(Header::new(SOME_FILE_MODE, 0, &long[..PATH_SIZE - 1]).is_ok());
        assert!(matches!(
            Header::new(SOME_FILE_MODE, 0, b""),
            Err(Error::InvalidPath)
        ));
        assert!(matches!(
            Header::new(SOME_FILE_MODE, 0, b"a\0b"),
            Err(Error::InvalidPath)
        ));
    }

    #[test]
    fn directories_have_no_payload() {
        let dir = Mode::DIR | Mode::from_bits_truncate(0o755);
        assert!(Header::new(dir, 0, b"lib").is_ok());
        assert!(matches!(
            Header::new(dir, 1, b"lib"),
            Err(Error::InvalidSize(1))
        ));
    }

    #[test]
    fn only_files_and_directories() {
        let symlink = Mode::from_bits_truncate(0o120777);
        assert!(matches!(
            Header::new(symlink, 0, b"link"),
            Err(Error::InvalidMode(_))
        ));
    }
}
