use core::error;
use core::fmt::{Display, Formatter, Result};

use bytemuck::PodCastError;

#[derive(Debug)]
pub enum Error {
    Cast(PodCastError),
    InvalidBlake3,
    InvalidMagic,
    InvalidMode(u32),
    /// Path is empty, contains a NUL, or is not NUL-terminated
    InvalidPath,
    /// A directory header declared a payload
    InvalidSize(u64),
    PathTooLong(usize),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> Result {
        use Error::*;

        match self {
            Cast(err) => write!(f, "Cast: {}", err),
            InvalidBlake3 => write!(f, "Invalid Blake3"),
            InvalidMagic => write!(f, "Magic Invalid"),
            InvalidMode(mode) => write!(f, "Invalid Mode: {:o}", mode),
            InvalidPath => write!(f, "Path Invalid"),
            InvalidSize(size) => write!(f, "Invalid Size: {}", size),
            PathTooLong(len) => write!(f, "Path too long: {} bytes", len),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Cast(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PodCastError> for Error {
    fn from(err: PodCastError) -> Error {
        Error::Cast(err)
    }
}
