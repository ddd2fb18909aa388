use std::fs;

use layerconf_drivers::disk::OsDisk;
use layerconf_drivers::Disk;

/// `OsDisk` reads real file content and lists real directory children,
/// sorted by name, the same contract `MemoryDisk` fakes for the rest of
/// the driver test suite.
#[test]
fn os_disk_reads_files_and_lists_sorted_children() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("20-override.json"), br#"{"x":2}"#).unwrap();
    fs::write(dir.path().join("10-base.json"), br#"{"x":1}"#).unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();

    let disk = OsDisk;
    let children = disk.read_dir(dir.path()).unwrap();
    assert_eq!(
        children,
        vec![dir.path().join("10-base.json"), dir.path().join("20-override.json")],
        "nested/ is a directory and must be excluded; files come back sorted"
    );

    let bytes = disk.read(&dir.path().join("10-base.json")).unwrap();
    assert_eq!(bytes, br#"{"x":1}"#);
}

#[test]
fn os_disk_modified_advances_after_rewrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.json");
    fs::write(&path, b"{}").unwrap();
    let disk = OsDisk;
    let first = disk.modified(&path).unwrap();

    fs::write(&path, b"{\"changed\":true}").unwrap();
    let second = disk.modified(&path).unwrap();
    assert!(second >= first);
}
