use std::io::{Read, Write};

use dirpack::{ArchiveReader, ArchiveWriter, Entry, EntryKind, Error};
use dirpack_core::{Mode, HEADER_SIZE};

const FILES: [(&str, &str); 3] = [
    ("readme.txt", "This archive contains some text files."),
    ("gopher.txt", "Gopher names:\nGeorge\nGeoffrey\nGonzo"),
    ("todo.txt", "Get animal handling license."),
];

fn text_archive() -> Result<Vec<u8>, Error> {
    let mut writer = ArchiveWriter::new(Vec::new());
    for (name, body) in FILES.iter() {
        let entry = Entry::file(*name, Mode::from_bits_truncate(0o600), body.len() as u64);
        writer.append_reader(&entry, body.as_bytes())?;
    }
    writer.finish()
}

#[test]
fn text_files_read_back_in_order() -> Result<(), Error> {
    let archive = text_archive()?;
    let mut reader = ArchiveReader::new(&archive[..]);

    for (name, body) in FILES.iter() {
        let entry = reader.next_entry()?.expect("missing entry");
        assert_eq!(entry.path().to_str(), Some(*name));
        assert_eq!(entry.kind(), EntryKind::File);
        assert_eq!(entry.mode(), Mode::from_bits_truncate(0o600));

        let mut data = String::new();
        reader.read_to_string(&mut data).unwrap();
        assert_eq!(&data, body);
    }
    assert!(reader.next_entry()?.is_none());
    assert!(reader.next_entry()?.is_none());
    Ok(())
}

#[test]
fn unread_payload_is_skipped() -> Result<(), Error> {
    let archive = text_archive()?;
    let names = ArchiveReader::new(&archive[..])
        .entries()
        .map(|entry| entry.map(|entry| entry.path().to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(names, ["readme.txt", "gopher.txt", "todo.txt"]);
    Ok(())
}

#[test]
fn directories_have_no_payload() -> Result<(), Error> {
    let mut writer = ArchiveWriter::new(Vec::new());
    writer.write_header(&Entry::directory("empty", Mode::from_bits_truncate(0o755)))?;
    let archive = writer.finish()?;
    assert_eq!(archive.len(), 2 * HEADER_SIZE);

    let mut reader = ArchiveReader::new(&archive[..]);
    let entry = reader.next_entry()?.expect("missing entry");
    assert_eq!(entry.kind(), EntryKind::Directory);
    assert_eq!(entry.size(), 0);
    assert_eq!(reader.read(&mut [0; 16]).unwrap(), 0);
    assert!(reader.next_entry()?.is_none());
    Ok(())
}

#[test]
fn truncated_payload() -> Result<(), Error> {
    let archive = text_archive()?;
    // Cut the stream in the middle of the first payload
    let cut = HEADER_SIZE + 10;
    let mut reader = ArchiveReader::new(&archive[..cut]);

    reader.next_entry()?.expect("missing entry");
    match reader.next_entry() {
        Err(Error::LengthMismatch {
            expected, actual, ..
        }) => {
            assert_eq!(expected, FILES[0].1.len() as u64);
            assert_eq!(actual, 10);
        }
        other => panic!("expected length mismatch, got {:?}", other),
    }
    assert!(reader.next_entry()?.is_none());
    Ok(())
}

#[test]
fn truncated_payload_fails_reads() -> Result<(), Error> {
    let archive = text_archive()?;
    let mut reader = ArchiveReader::new(&archive[..HEADER_SIZE + 10]);
    reader.next_entry()?.expect("missing entry");

    let mut data = Vec::new();
    let err = reader.read_to_end(&mut data).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    assert_eq!(data.len(), 10);
    Ok(())
}

#[test]
fn missing_end_marker() -> Result<(), Error> {
    let archive = text_archive()?;
    let mut reader = ArchiveReader::new(&archive[..archive.len() - HEADER_SIZE]);

    for _ in FILES.iter() {
        reader.next_entry()?.expect("missing entry");
    }
    assert!(matches!(reader.next_entry(), Err(Error::Io { .. })));
    Ok(())
}

#[test]
fn corrupted_header() -> Result<(), Error> {
    let mut archive = text_archive()?;
    // Inside the path of the first header
    archive[60] ^= 0xff;

    let mut reader = ArchiveReader::new(&archive[..]);
    assert!(matches!(
        reader.next_entry(),
        Err(Error::Core(dirpack_core::Error::InvalidBlake3))
    ));
    Ok(())
}

#[test]
fn writer_refuses_extra_bytes() -> Result<(), Error> {
    let mut writer = ArchiveWriter::new(Vec::new());
    writer.write_header(&Entry::file("a", Mode::from_bits_truncate(0o644), 3))?;
    writer.write_all(b"abc").unwrap();
    assert!(writer.write_all(b"d").is_err());
    writer.finish()?;
    Ok(())
}

#[test]
fn writer_requires_full_payload() -> Result<(), Error> {
    let mut writer = ArchiveWriter::new(Vec::new());
    writer.write_header(&Entry::file("a", Mode::from_bits_truncate(0o644), 3))?;
    writer.write_all(b"ab").unwrap();
    assert!(matches!(
        writer.write_header(&Entry::file("b", Mode::from_bits_truncate(0o644), 0)),
        Err(Error::LengthMismatch {
            expected: 3,
            actual: 2,
            ..
        })
    ));
    Ok(())
}

#[test]
fn short_source() {
    let mut writer = ArchiveWriter::new(Vec::new());
    let entry = Entry::file("short", Mode::from_bits_truncate(0o644), 10);
    assert!(matches!(
        writer.append_reader(&entry, &b"12345"[..]),
        Err(Error::LengthMismatch { actual: 5, .. })
    ));
}
