#![no_std]

use core::mem;

pub use crate::error::Error;
pub use crate::header::Header;
pub use crate::mode::Mode;

mod error;
mod header;
mod mode;

pub const HEADER_SIZE: usize = mem::size_of::<Header>();

/// Capacity of the header path field, including the NUL terminator
pub const PATH_SIZE: usize = 256;

pub const MAGIC: [u8; 8] = *b"dirpack\0";

#[cfg(test)]
mod tests {
    use core::mem;

    use crate::{Header, HEADER_SIZE};

    #[test]
    fn header_size() {
        assert_eq!(mem::size_of::<Header>(), 308);
        assert_eq!(HEADER_SIZE, 308);
    }
}
