use arcdupe::actions::{DeleteConfig, DeleteError, PlanError};
use arcdupe::scanner::Address;
use filetime::{set_file_mtime, FileTime};
use tempfile::tempdir;

use super::fixtures::{write_file, write_zip};

#[test]
fn test_delete_copy_then_rescan() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    write_file(&a, b"hello");
    write_file(&b, b"hello");
    write_file(&dir.path().join("c.txt"), b"world");

    let session = arcdupe::scan(dir.path()).unwrap();
    let report =
        arcdupe::delete_selected([Address::file(&a)], &session, &DeleteConfig::permanent())
            .unwrap();

    assert!(report.all_succeeded());
    assert_eq!(report.bytes_freed(), 5);
    assert!(!a.exists());
    assert!(b.exists());

    let rescan = arcdupe::scan(dir.path()).unwrap();
    assert!(rescan.groups().is_empty());
}

#[test]
fn test_delete_file_copy_of_archive_member() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let zip = dir.path().join("b.zip");
    write_file(&a, b"hello");
    write_zip(&zip, &[("x.txt", b"hello")]);

    let session = arcdupe::scan(dir.path()).unwrap();
    let report =
        arcdupe::delete_selected([Address::file(&a)], &session, &DeleteConfig::permanent())
            .unwrap();

    assert!(report.all_succeeded());
    assert!(!a.exists());
    assert!(zip.exists());
}

#[test]
fn test_selecting_every_copy_is_rejected() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    write_file(&a, b"hello");
    write_file(&b, b"hello");

    let session = arcdupe::scan(dir.path()).unwrap();
    let result = arcdupe::delete_selected(
        [Address::file(&a), Address::file(&b)],
        &session,
        &DeleteConfig::permanent(),
    );

    assert!(matches!(
        result,
        Err(PlanError::WouldEliminateGroup { members: 2, .. })
    ));
    assert!(a.exists());
    assert!(b.exists());
}

#[test]
fn test_archive_member_is_rejected() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let zip = dir.path().join("b.zip");
    write_file(&a, b"hello");
    write_zip(&zip, &[("x.txt", b"hello")]);

    let session = arcdupe::scan(dir.path()).unwrap();
    let member = Address::member(&zip, "x.txt");
    let result = arcdupe::delete_selected(
        [member.clone(), Address::file(&a)],
        &session,
        &DeleteConfig::permanent(),
    );

    assert_eq!(result.unwrap_err(), PlanError::ArchiveDeletionUnsupported(member));
    assert!(a.exists());
    assert!(zip.exists());
}

#[test]
fn test_unique_file_is_rejected() {
    let dir = tempdir().unwrap();
    let unique = dir.path().join("u.txt");
    write_file(&unique, b"only one");
    write_file(&dir.path().join("a.txt"), b"dup");
    write_file(&dir.path().join("b.txt"), b"dup");

    let session = arcdupe::scan(dir.path()).unwrap();
    let result =
        arcdupe::delete_selected([Address::file(&unique)], &session, &DeleteConfig::permanent());

    assert_eq!(result.unwrap_err(), PlanError::UnknownAddress(Address::file(&unique)));
    assert!(unique.exists());
}

#[test]
fn test_file_removed_after_scan_reports_failure() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let c = dir.path().join("c.txt");
    write_file(&a, b"same");
    write_file(&b, b"same");
    write_file(&c, b"same");

    let session = arcdupe::scan(dir.path()).unwrap();
    std::fs::remove_file(&a).unwrap();

    let report = arcdupe::delete_selected(
        [Address::file(&a), Address::file(&b)],
        &session,
        &DeleteConfig::permanent(),
    )
    .unwrap();

    assert_eq!(report.success_count(), 1);
    assert_eq!(report.failure_count(), 1);
    let failures: Vec<_> = report.failures().collect();
    assert!(matches!(failures[0].1, DeleteError::NotFound(_)));
    assert!(!b.exists());
    assert!(c.exists());
}

#[test]
fn test_modified_file_is_kept() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    write_file(&a, b"same");
    write_file(&b, b"same");
    set_file_mtime(&a, FileTime::from_unix_time(1_000_000, 0)).unwrap();

    let session = arcdupe::scan(dir.path()).unwrap();
    set_file_mtime(&a, FileTime::from_unix_time(2_000_000, 0)).unwrap();

    let report =
        arcdupe::delete_selected([Address::file(&a)], &session, &DeleteConfig::permanent())
            .unwrap();
    assert!(matches!(
        report.outcomes[0].result,
        Err(DeleteError::Modified(_))
    ));
    assert!(a.exists());

    let unchecked = DeleteConfig::permanent().with_verify_mtime(false);
    let report = arcdupe::delete_selected([Address::file(&a)], &session, &unchecked).unwrap();
    assert!(report.all_succeeded());
    assert!(!a.exists());
}

#[cfg(unix)]
#[test]
fn test_file_with_separator_in_name_can_be_deleted() {
    let dir = tempdir().unwrap();
    let odd = dir.path().join("notes::v1.txt");
    let plain = dir.path().join("notes.txt");
    write_file(&odd, b"hello");
    write_file(&plain, b"hello");

    let session = arcdupe::scan(dir.path()).unwrap();
    let printed = session.groups()[0]
        .addresses()
        .iter()
        .map(|a| a.to_string())
        .find(|text| text.ends_with("notes::v1.txt"))
        .unwrap();

    let address = session.resolve(&printed);
    assert_eq!(address, Address::file(&odd));

    let report =
        arcdupe::delete_selected([address], &session, &DeleteConfig::permanent()).unwrap();
    assert!(report.all_succeeded());
    assert!(!odd.exists());
    assert!(plain.exists());
}
