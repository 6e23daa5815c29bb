use arcdupe::duplicates::{DuplicateFinder, FinderConfig};
use arcdupe::scanner::{Address, WalkerConfig};
use std::fs;
use tempfile::tempdir;

use super::fixtures::write_file;

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let session = arcdupe::scan(dir.path()).unwrap();

    assert!(session.groups().is_empty());
    assert!(session.errors().is_empty());
    assert_eq!(session.summary().total_files, 0);
    assert_eq!(session.root(), dir.path());
}

#[test]
fn test_scan_two_copies_and_a_unique() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    write_file(&a, b"hello");
    write_file(&b, b"hello");
    write_file(&dir.path().join("c.txt"), b"world");

    let session = arcdupe::scan(dir.path()).unwrap();

    assert_eq!(session.groups().len(), 1);
    let group = &session.groups()[0];
    assert_eq!(group.size, 5);
    assert_eq!(
        group.addresses(),
        vec![&Address::file(&a), &Address::file(&b)]
    );
    assert_eq!(session.summary().total_files, 3);
    assert_eq!(session.summary().duplicate_files, 1);
    assert_eq!(session.summary().reclaimable_space, 5);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.txt"), b"content a");
    write_file(&dir.path().join("b.txt"), b"content b");
    write_file(&dir.path().join("c.txt"), b"content c");

    let session = arcdupe::scan(dir.path()).unwrap();

    assert!(!session.has_duplicates());
    assert_eq!(session.summary().total_files, 3);
}

#[test]
fn test_same_size_different_content_not_grouped() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.bin"), b"aaaa");
    write_file(&dir.path().join("b.bin"), b"bbbb");

    let session = arcdupe::scan(dir.path()).unwrap();
    assert!(session.groups().is_empty());
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.txt"), b"nested");
    write_file(&dir.path().join("sub").join("deeper").join("b.txt"), b"nested");

    let session = arcdupe::scan(dir.path()).unwrap();

    assert_eq!(session.groups().len(), 1);
    assert_eq!(session.groups()[0].len(), 2);
}

#[test]
fn test_empty_files_form_a_group() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.empty"), b"");
    write_file(&dir.path().join("b.empty"), b"");

    let session = arcdupe::scan(dir.path()).unwrap();
    assert_eq!(session.groups().len(), 1);
    assert_eq!(session.groups()[0].size, 0);
    assert_eq!(session.summary().reclaimable_space, 0);
}

#[test]
fn test_skip_empty_filter() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.empty"), b"");
    write_file(&dir.path().join("b.empty"), b"");

    let walker_config = WalkerConfig {
        skip_empty: true,
        ..WalkerConfig::default()
    };
    let finder = DuplicateFinder::new(FinderConfig::default().with_walker_config(walker_config));
    let session = finder.scan(dir.path()).unwrap();

    assert!(session.groups().is_empty());
    assert_eq!(session.summary().total_files, 0);
}

#[test]
fn test_size_filters() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("small1"), b"x");
    write_file(&dir.path().join("small2"), b"x");
    write_file(&dir.path().join("big1"), &[7u8; 2048]);
    write_file(&dir.path().join("big2"), &[7u8; 2048]);

    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::new(false, false, Some(1024), None));
    let session = DuplicateFinder::new(config).scan(dir.path()).unwrap();

    assert_eq!(session.groups().len(), 1);
    assert_eq!(session.groups()[0].size, 2048);
}

#[test]
fn test_group_order_is_deterministic() {
    let dir = tempdir().unwrap();
    for i in 0..6 {
        write_file(&dir.path().join(format!("x{i}.txt")), b"xxx");
        write_file(&dir.path().join("nested").join(format!("y{i}.txt")), b"yyyyy");
    }

    let first = arcdupe::scan(dir.path()).unwrap();
    let second = DuplicateFinder::new(FinderConfig::default().with_io_threads(1))
        .scan(dir.path())
        .unwrap();

    let addresses = |s: &arcdupe::session::ScanSession| -> Vec<Vec<Address>> {
        s.groups()
            .iter()
            .map(|g| g.files.iter().map(|f| f.address.clone()).collect())
            .collect()
    };
    assert_eq!(addresses(&first), addresses(&second));
    assert_eq!(first.groups().len(), 2);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_skipped() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("real.txt");
    write_file(&target, b"linked");
    std::os::unix::fs::symlink(&target, dir.path().join("link.txt")).unwrap();
    std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

    let session = arcdupe::scan(dir.path()).unwrap();

    assert!(session.groups().is_empty());
    assert_eq!(session.summary().total_files, 1);
}

#[test]
fn test_hidden_files_included_by_default() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("data");
    write_file(&root.join(".hidden"), b"same");
    write_file(&root.join("visible"), b"same");

    let session = arcdupe::scan(&root).unwrap();
    assert_eq!(session.groups().len(), 1);

    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::new(true, false, None, None));
    let session = DuplicateFinder::new(config).scan(&root).unwrap();
    assert!(session.groups().is_empty());
    assert_eq!(session.summary().total_files, 1);
    assert!(fs::metadata(root.join(".hidden")).is_ok());
}
