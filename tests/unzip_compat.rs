use std::process::Command;
use tempfile::tempdir;

// This test writes a ZIP using the library and then calls `unzip -t` to
// verify compatibility. If `unzip` is not present on the system, the test
// is skipped.

#[test]
fn unzip_compatibility() {
    use rw_zip::{AccessMode, AddOptions, Archive};

    // Check if `unzip` exists by trying to run `unzip -v`.
    let check = Command::new("unzip").arg("-v").output();
    if check.is_err() {
        eprintln!("skipping test: `unzip` not found");
        return;
    }

    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("compat.zip");

    // Create zip
    {
        let mut archive = Archive::open(&zip_path, AccessMode::Create).unwrap();
        archive
            .add_entry("hello.txt", &b"hello from test"[..], &AddOptions::default())
            .unwrap();
        // write a moderate amount of data to ensure a non-trivial archive
        let big = vec![0u8; 1024 * 1024];
        archive
            .add_entry("big.bin", &big[..], &AddOptions::default())
            .unwrap();
        archive
            .add_entry("stored.bin", &b"kept verbatim"[..], &AddOptions::stored())
            .unwrap();
    }

    // Run `unzip -t` to test archive integrity
    let output = Command::new("unzip")
        .arg("-t")
        .arg(&zip_path)
        .output()
        .expect("failed to run unzip");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "unzip reported failure: {} {}",
        stdout,
        stderr
    );
}
