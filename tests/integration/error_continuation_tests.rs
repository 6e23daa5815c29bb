use arcdupe::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use arcdupe::scanner::{fingerprint_entries, FileEntry, HashError, Hasher, ScanError};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::SystemTime;
use tempfile::tempdir;

use super::fixtures::write_file;

#[test]
fn test_missing_files_are_reported_not_fatal() {
    let dir = tempdir().unwrap();
    let present = dir.path().join("present.txt");
    write_file(&present, b"here");
    let entries = vec![
        FileEntry::new(dir.path().join("gone_1.txt"), 100, SystemTime::now()),
        FileEntry::new(present.clone(), 4, SystemTime::now()),
        FileEntry::new(dir.path().join("gone_2.txt"), 100, SystemTime::now()),
    ];
    let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();

    let (records, errors) = fingerprint_entries(entries, &Hasher::new(), &pool, None);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].address.disk_path(), present.as_path());
    assert_eq!(errors.len(), 2);
    for err in &errors {
        match err {
            ScanError::HashError(HashError::NotFound(_)) => {}
            other => panic!("Expected NotFound HashError, got: {other:?}"),
        }
    }
}

#[test]
fn test_scan_non_existent_path() {
    let result = arcdupe::scan(std::path::Path::new("/non/existent/path/12345"));

    match result {
        Err(FinderError::PathNotFound(path)) => {
            assert!(path.to_string_lossy().contains("non/existent/path/12345"));
        }
        other => panic!("Expected PathNotFound error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_scan_file_instead_of_directory() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("file.txt");
    write_file(&file_path, b"");

    match arcdupe::scan(&file_path) {
        Err(FinderError::NotADirectory(path)) => assert_eq!(path, file_path),
        other => panic!("Expected NotADirectory error, got {:?}", other.map(|_| ())),
    }
}

#[cfg(unix)]
#[test]
fn test_permission_denied_continues() {
    use std::os::unix::fs::PermissionsExt;
    let dir = tempdir().unwrap();
    let sub = dir.path().join("no_access");
    write_file(&sub.join("hidden.txt"), b"secret");
    write_file(&dir.path().join("ok.txt"), b"public");
    write_file(&dir.path().join("ok_copy.txt"), b"public");

    fs::set_permissions(&sub, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(&sub).is_ok() {
        // Running with elevated privileges; permissions are not enforced
        fs::set_permissions(&sub, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let session = arcdupe::scan(dir.path()).unwrap();

    fs::set_permissions(&sub, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(session.summary().total_files, 2);
    assert_eq!(session.groups().len(), 1);
    assert!(!session.errors().is_empty());
    assert!(session.errors().iter().any(|e| e.path().starts_with(&sub)));
}

#[cfg(unix)]
#[test]
fn test_invalid_utf8_path() {
    use std::os::unix::ffi::OsStrExt;
    let dir = tempdir().unwrap();
    let invalid_name = std::ffi::OsStr::from_bytes(&[0xff, 0xfe, 0xfd]);
    let file_path = dir.path().join(invalid_name);

    if fs::write(&file_path, b"invalid utf8").is_ok() {
        write_file(&dir.path().join("copy"), b"invalid utf8");

        let session = arcdupe::scan(dir.path()).unwrap();

        assert_eq!(session.summary().total_files, 2);
        assert_eq!(session.groups().len(), 1);
    }
}

#[test]
fn test_interrupted_scan_returns_error() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.txt"), b"a");

    let flag = Arc::new(AtomicBool::new(true));
    let config = FinderConfig::default().with_shutdown_flag(flag);
    let result = DuplicateFinder::new(config).scan(dir.path());

    assert!(matches!(result, Err(FinderError::Interrupted)));
}

#[test]
fn test_scan_errors_sorted_by_path() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("z.zip"), b"PK\x03\x04 broken");
    write_file(&dir.path().join("a.zip"), b"PK\x03\x04 broken too");
    write_file(&dir.path().join("m.rar"), b"Rar!\x1a\x07\x00 broken");

    let session = arcdupe::scan(dir.path()).unwrap();

    let paths: Vec<PathBuf> = session
        .errors()
        .iter()
        .map(|e| e.path().to_path_buf())
        .collect();
    assert_eq!(
        paths,
        vec![
            dir.path().join("a.zip"),
            dir.path().join("m.rar"),
            dir.path().join("z.zip"),
        ]
    );
    assert_eq!(session.summary().error_count, 3);
}
