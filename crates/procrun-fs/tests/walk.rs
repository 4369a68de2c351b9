//! Traversal and glob tests against scratch directories

use procrun_fs::{glob, walk_files, write_file};
use std::fs;
use tempfile::tempdir;

#[test]
fn walk_files_concatenates_in_name_order() {
    let tmp = tempdir().unwrap();
    let nested = tmp.path().join("b-dir");
    fs::create_dir_all(&nested).unwrap();

    write_file(tmp.path().join("a.txt"), "one\n").unwrap();
    write_file(nested.join("inner.txt"), "two\n").unwrap();
    write_file(tmp.path().join("c.txt"), "three\n").unwrap();

    let contents = walk_files(tmp.path()).unwrap();
    assert_eq!(contents, "one\ntwo\nthree\n");
}

#[test]
fn walk_files_on_empty_directory() {
    let tmp = tempdir().unwrap();
    assert_eq!(walk_files(tmp.path()).unwrap(), "");
}

#[test]
fn walk_files_missing_root_is_an_error() {
    let tmp = tempdir().unwrap();
    assert!(walk_files(tmp.path().join("absent")).is_err());
}

#[cfg(unix)]
#[test]
fn walk_files_fails_on_unreadable_file() {
    use std::os::unix::fs::PermissionsExt;

    // root can read anything
    if unsafe { libc::geteuid() } == 0 {
        return;
    }

    let tmp = tempdir().unwrap();
    let locked = tmp.path().join("locked");
    write_file(&locked, "secret").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    assert!(walk_files(tmp.path()).is_err());
}

#[test]
fn glob_ignores_letter_case() {
    let tmp = tempdir().unwrap();
    write_file(tmp.path().join("README.md"), "").unwrap();
    write_file(tmp.path().join("notes.MD"), "").unwrap();
    write_file(tmp.path().join("main.rs"), "").unwrap();

    let pattern = format!("{}/*.md", tmp.path().display());
    let mut names: Vec<String> = glob(&pattern)
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();

    assert_eq!(names, vec!["README.md", "notes.MD"]);
}

#[test]
fn glob_wildcard_matches_dotfiles() {
    let tmp = tempdir().unwrap();
    write_file(tmp.path().join(".hidden"), "").unwrap();

    let pattern = format!("{}/*", tmp.path().display());
    let matches = glob(&pattern).unwrap();
    assert_eq!(matches.len(), 1);
}

#[test]
fn glob_rejects_invalid_pattern() {
    assert!(glob("[").is_err());
}
