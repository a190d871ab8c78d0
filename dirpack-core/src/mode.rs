use bitflags::bitflags;

bitflags! {
    /// Unix style mode stored in every header. The kind bits use the same
    /// values on every platform.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Mode: u32 {
        /// Permission bits (user, group, other with read, write, execute,
        /// plus setuid, setgid and sticky)
        const PERM = 0o007777;
        const KIND = 0o170000;
        const FILE = 0o100000;
        const DIR = 0o040000;
    }
}

impl Mode {
    pub fn perm(&self) -> Mode {
        *self & Mode::PERM
    }

    pub fn kind(&self) -> Mode {
        *self & Mode::KIND
    }

    pub fn is_file(&self) -> bool {
        self.kind() == Mode::FILE
    }

    pub fn is_dir(&self) -> bool {
        self.kind() == Mode::DIR
    }
}

#[cfg(test)]
mod tests {
    use super::Mode;

    #[test]
    fn kind_and_perm_split() {
        let mode = Mode::from_bits_truncate(0o100640);
        assert!(mode.is_file());
        assert!(!mode.is_dir());
        assert_eq!(mode.perm().bits(), 0o640);
    }

    #[test]
    fn unknown_bits_rejected() {
        assert!(Mode::from_bits(0o1_000_000).is_none());
        assert!(Mode::from_bits(0o040755).unwrap().is_dir());
    }
}
