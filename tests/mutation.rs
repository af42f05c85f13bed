use rw_zip::{AccessMode, AddOptions, Archive, RwZipError};
use tempfile::tempdir;

#[test]
fn removing_the_middle_entry_keeps_the_others_intact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shrink.zip");
    let filler = vec![0xabu8; 40_000];

    let mut archive = Archive::open(&path, AccessMode::Create).unwrap();
    archive
        .add_entry("a.txt", &b"payload a"[..], &AddOptions::stored())
        .unwrap();
    archive
        .add_entry("b.bin", &filler[..], &AddOptions::stored())
        .unwrap();
    archive
        .add_entry("c.txt", &b"payload c"[..], &AddOptions::stored())
        .unwrap();
    drop(archive);

    let size_before = std::fs::metadata(&path).unwrap().len();

    let mut archive = Archive::open(&path, AccessMode::Update).unwrap();
    let doomed = archive.get("b.bin").unwrap();
    let (span_start, span_end) = {
        // local header + payload; the central directory record adds more.
        (doomed.local_header_offset(), doomed.local_header_offset()
            + 30
            + "b.bin".len() as u64
            + doomed.compressed_size()
            + 16)
    };
    archive.remove(&doomed).unwrap();

    assert_eq!(archive.len(), 2);
    assert!(archive.get("b.bin").is_none());
    let paths: Vec<_> = archive.entries().map(|e| e.path()).collect();
    assert_eq!(paths, ["a.txt", "c.txt"]);
    drop(archive);

    let size_after = std::fs::metadata(&path).unwrap().len();
    assert!(size_before - size_after >= span_end - span_start);

    let mut archive = Archive::open(&path, AccessMode::Read).unwrap();
    for (name, payload) in [("a.txt", &b"payload a"[..]), ("c.txt", &b"payload c"[..])] {
        let entry = archive.get(name).unwrap();
        let mut data = Vec::new();
        archive.extract(&entry, &mut data).unwrap();
        assert_eq!(data, payload, "{}", name);
    }
}

#[test]
fn removing_the_only_entry_leaves_an_empty_archive() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drain.zip");

    let mut archive = Archive::open(&path, AccessMode::Create).unwrap();
    archive
        .add_entry("only.txt", &b"gone soon"[..], &AddOptions::default())
        .unwrap();
    let entry = archive.get("only.txt").unwrap();
    archive.remove(&entry).unwrap();
    assert!(archive.is_empty());
    drop(archive);

    assert_eq!(std::fs::metadata(&path).unwrap().len(), 22);
    let mut archive = Archive::open(&path, AccessMode::Read).unwrap();
    assert_eq!(archive.entries().count(), 0);
}

#[test]
fn removing_a_removed_entry_reports_entry_not_found() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("twice.zip");

    let mut archive = Archive::open(&path, AccessMode::Create).unwrap();
    archive
        .add_entry("keep.txt", &b"keep"[..], &AddOptions::stored())
        .unwrap();
    archive
        .add_entry("x.txt", &b"x"[..], &AddOptions::stored())
        .unwrap();
    let entry = archive.get("x.txt").unwrap();
    archive.remove(&entry).unwrap();
    let err = archive.remove(&entry).unwrap_err();
    assert!(matches!(err, RwZipError::EntryNotFound(_)));
}

#[test]
fn update_mode_appends_to_an_existing_archive() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("append.zip");

    {
        let mut archive = Archive::open(&path, AccessMode::Create).unwrap();
        archive
            .add_entry("old.txt", &b"old"[..], &AddOptions::default())
            .unwrap();
    }

    {
        let mut archive = Archive::open(&path, AccessMode::Update).unwrap();
        archive
            .add_entry("new.txt", &b"new"[..], &AddOptions::default())
            .unwrap();
    }

    let mut archive = Archive::open(&path, AccessMode::Read).unwrap();
    let paths: Vec<_> = archive.entries().map(|e| e.path()).collect();
    assert_eq!(paths, ["old.txt", "new.txt"]);
    for name in ["old.txt", "new.txt"] {
        let entry = archive.get(name).unwrap();
        let mut data = Vec::new();
        archive.extract(&entry, &mut data).unwrap();
        assert_eq!(data.len() as u64, entry.uncompressed_size());
    }
}

#[test]
fn read_mode_rejects_mutation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("readonly.zip");

    {
        let mut archive = Archive::open(&path, AccessMode::Create).unwrap();
        archive
            .add_entry("a.txt", &b"a"[..], &AddOptions::default())
            .unwrap();
    }

    let mut archive = Archive::open(&path, AccessMode::Read).unwrap();
    let entry = archive.get("a.txt").unwrap();
    assert!(matches!(
        archive.add_entry("b.txt", &b"b"[..], &AddOptions::default()),
        Err(RwZipError::UnwritableArchive(_))
    ));
    assert!(matches!(
        archive.remove(&entry),
        Err(RwZipError::UnwritableArchive(_))
    ));
}

#[test]
fn create_fails_when_the_target_exists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("exists.zip");
    std::fs::write(&path, b"anything").unwrap();
    assert!(matches!(
        Archive::open(&path, AccessMode::Create),
        Err(RwZipError::UnwritableArchive(_))
    ));
}

#[test]
fn opening_a_missing_archive_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.zip");
    assert!(matches!(
        Archive::open(&path, AccessMode::Read),
        Err(RwZipError::UnreadableArchive(_))
    ));
    assert!(matches!(
        Archive::open(&path, AccessMode::Update),
        Err(RwZipError::UnwritableArchive(_))
    ));
}

#[test]
fn files_without_an_eocd_are_rejected() {
    let dir = tempdir().unwrap();

    let tiny = dir.path().join("tiny.bin");
    std::fs::write(&tiny, b"PK").unwrap();
    assert!(matches!(
        Archive::open(&tiny, AccessMode::Read),
        Err(RwZipError::MissingEndOfCentralDirectoryRecord)
    ));

    let garbage = dir.path().join("garbage.bin");
    std::fs::write(&garbage, vec![0xaau8; 4096]).unwrap();
    assert!(matches!(
        Archive::open(&garbage, AccessMode::Read),
        Err(RwZipError::MissingEndOfCentralDirectoryRecord)
    ));
}
