//! Changes the process working directory, so it lives in its own test binary.
use std::env;
use std::error::Error;
use std::fs;

use dirpack::ArchiveWriter;
use dirpack::Entry;
use dirpack_core::Mode;

#[test]
fn empty_dest_unpacks_into_current_dir() -> Result<(), Box<dyn Error>> {
    let tmp = tempfile::tempdir()?;

    let mut writer = ArchiveWriter::new(Vec::new());
    writer.append_reader(
        &Entry::file("top.txt", Mode::from_bits_truncate(0o644), 3),
        &b"top"[..],
    )?;
    writer.append_reader(
        &Entry::file("nested/inner.txt", Mode::from_bits_truncate(0o600), 5),
        &b"inner"[..],
    )?;
    let archive = writer.finish()?;

    let previous = env::current_dir()?;
    env::set_current_dir(tmp.path())?;
    let result = dirpack::unpack(&archive[..], "");
    env::set_current_dir(previous)?;

    let stats = result?;
    assert_eq!(stats.files, 2);
    assert_eq!(fs::read(tmp.path().join("top.txt"))?, b"top");
    assert_eq!(fs::read(tmp.path().join("nested/inner.txt"))?, b"inner");
    Ok(())
}
