use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

use super::fixtures::{write_file, write_zip};

fn arcdupe(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_arcdupe"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_scan_exit_codes() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.txt"), b"hello");

    let output = arcdupe(&["-q", "scan", path_str(dir.path())]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stdout).contains("No duplicates found"));

    write_file(&dir.path().join("b.txt"), b"hello");
    let output = arcdupe(&["-q", "scan", path_str(dir.path())]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Group 1 (2 copies"));

    write_file(&dir.path().join("bad.zip"), b"PK\x03\x04 broken");
    let output = arcdupe(&["-q", "scan", path_str(dir.path())]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_scan_json_output() {
    let dir = tempdir().unwrap();
    let zip = dir.path().join("b.zip");
    write_file(&dir.path().join("a.txt"), b"hello");
    write_zip(&zip, &[("x.txt", b"hello")]);

    let output = arcdupe(&["-q", "scan", path_str(dir.path()), "--output", "json"]);
    assert_eq!(output.status.code(), Some(0));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let files = json["duplicates"][0]["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[1]["address"], format!("{}::x.txt", zip.display()));
    assert_eq!(files[1]["archive_member"], true);
    assert_eq!(json["summary"]["exit_code"], 0);
}

#[test]
fn test_missing_root_is_general_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");

    let output = arcdupe(&["-q", "scan", path_str(&missing)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("[AD001] Error:"));

    let output = arcdupe(&["-q", "--json-errors", "scan", path_str(&missing)]);
    let json: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(json["code"], "AD001");
    assert_eq!(json["interrupted"], false);
}

#[test]
fn test_delete_with_confirmation_flag() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    write_file(&a, b"hello");
    write_file(&b, b"hello");

    let output = arcdupe(&[
        "-q",
        "delete",
        path_str(dir.path()),
        "--select",
        path_str(&a),
        "--permanent",
        "-y",
    ]);

    assert_eq!(output.status.code(), Some(0));
    assert!(!a.exists());
    assert!(b.exists());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Deleted 1"));
}

#[test]
fn test_delete_declined_without_answer() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    write_file(&a, b"hello");
    write_file(&dir.path().join("b.txt"), b"hello");

    let output = Command::new(env!("CARGO_BIN_EXE_arcdupe"))
        .args(["-q", "delete", path_str(dir.path()), "--select", path_str(&a)])
        .stdin(std::process::Stdio::null())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(a.exists());
    assert!(String::from_utf8_lossy(&output.stdout).contains("nothing was deleted"));
}

#[test]
fn test_delete_rejected_selection() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    write_file(&a, b"hello");
    write_file(&b, b"hello");

    let output = arcdupe(&[
        "-q",
        "delete",
        path_str(dir.path()),
        "--select",
        path_str(&a),
        "--select",
        path_str(&b),
        "-y",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(a.exists());
    assert!(b.exists());
    assert!(String::from_utf8_lossy(&output.stderr).contains("at least one must be kept"));
}

#[cfg(unix)]
#[test]
fn test_delete_file_named_like_archive_member() {
    let dir = tempdir().unwrap();
    let odd = dir.path().join("notes::v1.txt");
    write_file(&odd, b"hello");
    write_file(&dir.path().join("notes.txt"), b"hello");

    let output = arcdupe(&[
        "-q",
        "delete",
        path_str(dir.path()),
        "--select",
        path_str(&odd),
        "--permanent",
        "-y",
    ]);

    assert_eq!(output.status.code(), Some(0));
    assert!(!odd.exists());
    assert!(dir.path().join("notes.txt").exists());
}
