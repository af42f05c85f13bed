use rw_zip::{AccessMode, AddOptions, Archive, CompressionMethod, RwZipError};
use std::io::Read;
use tempfile::tempdir;

#[test]
fn empty_archive_is_a_bare_eocd() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.zip");

    {
        let archive = Archive::open(&path, AccessMode::Create).unwrap();
        assert!(archive.is_empty());
    }

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 22);
    assert_eq!(&bytes[..4], &[0x50, 0x4b, 0x05, 0x06]);

    let mut archive = Archive::open(&path, AccessMode::Read).unwrap();
    assert_eq!(archive.len(), 0);
    assert_eq!(archive.entries().count(), 0);
}

#[test]
fn single_file_store_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("single.zip");

    {
        let mut archive = Archive::open(&path, AccessMode::Create).unwrap();
        archive
            .add_entry("hello.txt", &b"hi"[..], &AddOptions::stored())
            .unwrap();
    }

    let mut archive = Archive::open(&path, AccessMode::Read).unwrap();
    let entry = archive.get("hello.txt").unwrap();
    assert_eq!(entry.uncompressed_size(), 2);
    assert_eq!(entry.compressed_size(), 2);
    assert_eq!(entry.crc32(), 0xd893_2aac);
    assert_eq!(entry.compression_method(), CompressionMethod::Stored);

    // New entries carry the default permissions and a current timestamp.
    assert_eq!(entry.unix_mode(), Some(0o100_755));
    let (year, month, day) = entry.modified_date();
    assert!(year >= 2024);
    assert!((1..=12).contains(&month));
    assert!((1..=31).contains(&day));

    let mut data = Vec::new();
    let written = archive.extract(&entry, &mut data).unwrap();
    assert_eq!(written, 2);
    assert_eq!(data, b"hi");
}

#[test]
fn deflate_round_trip_compresses_zeros() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("zeros.zip");
    let input = vec![0u8; 1 << 20];

    {
        let mut archive = Archive::open(&path, AccessMode::Create).unwrap();
        archive
            .add_entry("a.bin", &input[..], &AddOptions::default())
            .unwrap();
    }

    let mut archive = Archive::open(&path, AccessMode::Read).unwrap();
    let entry = archive.get("a.bin").unwrap();
    assert_eq!(entry.uncompressed_size(), input.len() as u64);
    assert!(entry.compressed_size() < entry.uncompressed_size() / 100);

    let mut data = Vec::new();
    archive.extract(&entry, &mut data).unwrap();
    assert_eq!(data, input);
}

#[test]
fn insertion_order_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ordered.zip");
    let payloads: &[(&str, &[u8])] = &[
        ("first.txt", b"alpha"),
        ("second.txt", b"beta and then some"),
        ("third.txt", b"gamma"),
    ];

    {
        let mut archive = Archive::open(&path, AccessMode::Create).unwrap();
        for (name, payload) in payloads {
            archive
                .add_entry(name, *payload, &AddOptions::default())
                .unwrap();
        }
    }

    let mut archive = Archive::open(&path, AccessMode::Read).unwrap();
    assert_eq!(archive.len(), payloads.len());
    let entries: Vec<_> = archive.entries().collect();
    for (entry, (name, payload)) in entries.iter().zip(payloads) {
        assert_eq!(entry.path(), *name);
        assert_eq!(entry.uncompressed_size(), payload.len() as u64);
        let mut data = Vec::new();
        archive.extract(entry, &mut data).unwrap();
        assert_eq!(data, *payload);
    }
}

#[test]
fn payload_larger_than_one_chunk_streams_correctly() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("chunked.zip");
    let input: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();

    {
        let mut archive = Archive::open(&path, AccessMode::Create).unwrap();
        archive
            .add_entry("big.bin", &input[..], &AddOptions::default())
            .unwrap();
        archive
            .add_entry("big-stored.bin", &input[..], &AddOptions::stored())
            .unwrap();
    }

    let mut archive = Archive::open(&path, AccessMode::Read).unwrap();
    for name in ["big.bin", "big-stored.bin"] {
        let entry = archive.get(name).unwrap();
        let mut data = Vec::new();
        archive.extract(&entry, &mut data).unwrap();
        assert_eq!(data, input, "{}", name);
    }
}

#[test]
fn non_ascii_paths_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("names.zip");

    {
        let mut archive = Archive::open(&path, AccessMode::Create).unwrap();
        archive
            .add_entry("na\u{ef}ve.txt", &b"data"[..], &AddOptions::default())
            .unwrap();
        archive
            .add_entry("plain.txt", &b"data"[..], &AddOptions::default())
            .unwrap();
    }

    let mut archive = Archive::open(&path, AccessMode::Read).unwrap();
    assert!(archive.get("na\u{ef}ve.txt").is_some());
    assert!(archive.get("plain.txt").is_some());
    assert!(archive.get("missing.txt").is_none());
}

#[test]
fn empty_entry_path_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad-path.zip");
    let mut archive = Archive::open(&path, AccessMode::Create).unwrap();
    let err = archive
        .add_entry("", &b"x"[..], &AddOptions::default())
        .unwrap_err();
    assert!(matches!(err, RwZipError::InvalidEntryPath(_)));
}

#[test]
fn streaming_reader_inflates_and_verifies() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stream.zip");
    let input: Vec<u8> = b"the quick brown fox ".repeat(4096);

    {
        let mut archive = Archive::open(&path, AccessMode::Create).unwrap();
        archive
            .add_entry("fox.txt", &input[..], &AddOptions::default())
            .unwrap();
    }

    let mut archive = Archive::open(&path, AccessMode::Read).unwrap();
    let entry = archive.get("fox.txt").unwrap();
    let mut reader = archive.reader(&entry).unwrap();
    let mut data = Vec::new();
    reader.read_to_end(&mut data).unwrap();
    assert_eq!(data, input);
}

fn raw_eocd_with_comment(comment: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0x50, 0x4b, 0x05, 0x06];
    bytes.extend_from_slice(&[0u8; 16]);
    bytes.extend_from_slice(&(comment.len() as u16).to_le_bytes());
    bytes.extend_from_slice(comment);
    bytes
}

#[test]
fn archive_comments_of_any_length_parse() {
    let dir = tempdir().unwrap();
    for len in [0usize, 1, 65_535] {
        let path = dir.path().join(format!("comment-{}.zip", len));
        let comment = vec![b'c'; len];
        std::fs::write(&path, raw_eocd_with_comment(&comment)).unwrap();
        let archive = Archive::open(&path, AccessMode::Read).unwrap();
        assert_eq!(archive.len(), 0, "comment length {}", len);
        assert_eq!(archive.comment().len(), len);
    }
}
