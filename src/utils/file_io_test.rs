use std::io::Write;

use super::file_io::create_parent_dir_if_not_exist;
use super::file_io::open_file_for_append;

/// Passed: "<tmp>/files/data.txt"
/// Expected: "<tmp>/files" created, file itself not
#[test]
fn test_create_parent_dir_for_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let file_path = temp_dir.path().join("files").join("data.txt");

    create_parent_dir_if_not_exist(&file_path).unwrap();

    assert!(file_path.parent().unwrap().is_dir());
    assert!(!file_path.exists());
}

#[test]
fn test_create_parent_dir_is_idempotent() {
    let temp_dir = tempfile::tempdir().unwrap();
    let file_path = temp_dir.path().join("a.log");

    create_parent_dir_if_not_exist(&file_path).unwrap();
    create_parent_dir_if_not_exist(&file_path).unwrap();
}

#[test]
fn test_open_file_for_append_keeps_existing_content() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("logs").join("watchkv.log");

    writeln!(open_file_for_append(&path).unwrap(), "first").unwrap();
    writeln!(open_file_for_append(&path).unwrap(), "second").unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
}

#[test]
fn test_open_file_for_append_on_directory_fails() {
    let temp_dir = tempfile::tempdir().unwrap();

    assert!(open_file_for_append(temp_dir.path()).is_err());
}
