use arcdupe::duplicates::{DuplicateFinder, FinderConfig};
use arcdupe::scanner::{Address, ScanError, WalkerConfig};
use std::fs;
use tempfile::tempdir;

use super::fixtures::{write_file, write_zip};

#[test]
fn test_archive_member_groups_with_plain_file() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let zip = dir.path().join("b.zip");
    write_file(&a, b"hello");
    write_zip(&zip, &[("x.txt", b"hello"), ("y.txt", b"other")]);

    let session = arcdupe::scan(dir.path()).unwrap();

    assert_eq!(session.groups().len(), 1);
    let group = &session.groups()[0];
    assert_eq!(
        group.addresses(),
        vec![&Address::file(&a), &Address::member(&zip, "x.txt")]
    );
    assert_eq!(group.files[1].display_name, "x.txt");
    assert_eq!(session.summary().archive_members, 2);
    assert_eq!(session.summary().archives_scanned, 1);
    // a.txt and b.zip are both plain files
    assert_eq!(session.summary().total_files, 2);
}

#[test]
fn test_members_of_identical_archives() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("one.zip");
    let second = dir.path().join("two.zip");
    write_zip(&first, &[("docs/readme.txt", b"read me")]);
    fs::copy(&first, &second).unwrap();

    let session = arcdupe::scan(dir.path()).unwrap();

    assert_eq!(session.groups().len(), 2);
    let all: Vec<Vec<Address>> = session
        .groups()
        .iter()
        .map(|g| g.files.iter().map(|f| f.address.clone()).collect())
        .collect();
    assert!(all.contains(&vec![Address::file(&first), Address::file(&second)]));
    assert!(all.contains(&vec![
        Address::member(&first, "docs/readme.txt"),
        Address::member(&second, "docs/readme.txt"),
    ]));
}

#[test]
fn test_no_archives_option() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.txt"), b"hello");
    write_zip(&dir.path().join("b.zip"), &[("x.txt", b"hello")]);

    let config = FinderConfig::default().with_scan_archives(false);
    let session = DuplicateFinder::new(config).scan(dir.path()).unwrap();

    assert!(session.groups().is_empty());
    assert_eq!(session.summary().archive_members, 0);
    assert_eq!(session.summary().archives_scanned, 0);
}

#[test]
fn test_archive_detected_by_content_not_extension() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.txt"), b"payload");
    write_zip(&dir.path().join("backup.dat"), &[("p.txt", b"payload")]);
    write_file(&dir.path().join("fake.zip"), b"not an archive at all");

    let session = arcdupe::scan(dir.path()).unwrap();

    assert_eq!(session.groups().len(), 1);
    assert_eq!(
        session.groups()[0].files[1].address,
        Address::member(dir.path().join("backup.dat"), "p.txt")
    );
    assert!(session.errors().is_empty());
}

#[test]
fn test_corrupt_archive_is_reported_and_scan_continues() {
    let dir = tempdir().unwrap();
    let bad = dir.path().join("bad.zip");
    write_file(&bad, b"PK\x03\x04 this is not a real zip body");
    write_file(&dir.path().join("a.txt"), b"dup");
    write_file(&dir.path().join("b.txt"), b"dup");

    let session = arcdupe::scan(dir.path()).unwrap();

    assert_eq!(session.groups().len(), 1);
    assert_eq!(session.errors().len(), 1);
    assert!(matches!(
        &session.errors()[0],
        ScanError::CorruptArchive { path, .. } if path == &bad
    ));
    assert!(session
        .records()
        .iter()
        .all(|r| !r.address.is_archive_member()));
    // The container is still fingerprinted as a file
    assert!(session.record(&Address::file(&bad)).is_some());
}

#[test]
fn test_nested_archive_is_not_opened() {
    let dir = tempdir().unwrap();
    let inner = dir.path().join("inner.zip");
    write_zip(&inner, &[("deep.txt", b"deep")]);
    let inner_bytes = fs::read(&inner).unwrap();
    fs::remove_file(&inner).unwrap();

    let outer = dir.path().join("outer.zip");
    write_zip(&outer, &[("inner.zip", &inner_bytes)]);
    write_file(&dir.path().join("deep.txt"), b"deep");

    let session = arcdupe::scan(dir.path()).unwrap();

    assert!(session.groups().is_empty());
    assert_eq!(session.summary().archive_members, 1);
    assert!(session
        .record(&Address::member(&outer, "inner.zip"))
        .is_some());
}

#[test]
fn test_empty_zip_has_no_members() {
    let dir = tempdir().unwrap();
    write_zip(&dir.path().join("empty.zip"), &[]);

    let session = arcdupe::scan(dir.path()).unwrap();

    assert!(session.errors().is_empty());
    assert_eq!(session.summary().archive_members, 0);
    assert_eq!(session.summary().total_files, 1);
}

#[test]
fn test_walker_filters_apply_to_members() {
    let dir = tempdir().unwrap();
    write_zip(&dir.path().join("one.zip"), &[("blank.txt", b""), ("a.txt", b"same")]);
    write_zip(&dir.path().join("two.zip"), &[("blank.txt", b""), ("b.txt", b"other")]);

    let session = arcdupe::scan(dir.path()).unwrap();
    assert_eq!(session.groups().len(), 1);
    assert_eq!(session.groups()[0].size, 0);

    let walker_config = WalkerConfig {
        skip_empty: true,
        ..WalkerConfig::default()
    };
    let finder = DuplicateFinder::new(FinderConfig::default().with_walker_config(walker_config));
    let session = finder.scan(dir.path()).unwrap();

    assert!(session.groups().is_empty());
    assert_eq!(session.summary().archive_members, 2);
}

#[test]
fn test_rar_member_groups_with_plain_file() {
    let dir = tempdir().unwrap();
    let copy = dir.path().join("copy.txt");
    let rar = dir.path().join("bundle.rar");
    write_file(&copy, b"hello rar");
    fs::copy(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/nested.rar"),
        &rar,
    )
    .unwrap();

    let session = arcdupe::scan(dir.path()).unwrap();

    assert!(session.errors().is_empty());
    assert_eq!(session.groups().len(), 1);
    assert_eq!(
        session.groups()[0].addresses(),
        vec![&Address::file(&copy), &Address::member(&rar, "docs/inner.txt")]
    );
    assert_eq!(session.summary().archive_members, 2);
    assert_eq!(session.summary().archives_scanned, 1);
}
