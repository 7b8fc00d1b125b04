//! Tests for directory listing reads and rendering

use std::fs::{self, File};
use std::time::{Duration, UNIX_EPOCH};

use staticd::error::ServeError;
use staticd::files::listing::{read_entries, render, render_directory};
use tempfile::TempDir;

fn tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    fs::write(root.join("b.txt"), "bb").unwrap();
    fs::write(root.join("a.txt"), "a").unwrap();
    fs::write(root.join(".hidden"), "x").unwrap();
    fs::create_dir(root.join(".config")).unwrap();
    fs::create_dir(root.join("photos")).unwrap();
    fs::write(root.join("report.pdf"), vec![0u8; 4321]).unwrap();

    dir
}

#[test]
fn test_entries_skip_dotfiles_and_sort_by_name() {
    let dir = tree();

    let entries = read_entries(dir.path()).unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();

    assert_eq!(names, vec!["a.txt", "b.txt", "photos", "report.pdf"]);
}

#[test]
fn test_entries_carry_kind_and_size() {
    let dir = tree();

    let entries = read_entries(dir.path()).unwrap();
    let photos = entries.iter().find(|e| e.name == "photos").unwrap();
    let report = entries.iter().find(|e| e.name == "report.pdf").unwrap();

    assert!(photos.is_dir);
    assert_eq!(photos.display_name(), "photos/");
    assert!(!report.is_dir);
    assert_eq!(report.size, 4321);
}

#[test]
fn test_rendered_page_lists_each_visible_entry_once() {
    let dir = tree();

    let html = render_directory(dir.path(), "/files/").unwrap();

    assert!(html.contains("<title>Index of /files/</title>"));
    assert!(html.contains("<h2>Index of /files/</h2>"));
    for href in ["a.txt", "b.txt", "photos/", "report.pdf"] {
        let needle = format!("href=\"{href}\"");
        assert_eq!(html.matches(&needle).count(), 1, "{href}");
    }
    assert!(!html.contains(".hidden"));
    assert!(!html.contains(".config"));
}

#[test]
fn test_directories_show_placeholders() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("only")).unwrap();

    let html = render_directory(dir.path(), "/").unwrap();

    assert!(html.contains("<td class=\"size\">-</td>"));
    assert!(html.contains("<td class=\"last-modified\">-</td>"));
    assert!(html.contains(">only/</a>"));
}

#[test]
fn test_file_rows_show_size_and_date() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "twelve bytes").unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(UNIX_EPOCH + Duration::from_secs(1_700_000_000))
        .unwrap();

    let html = render_directory(dir.path(), "/").unwrap();

    assert!(html.contains("<td class=\"size\">12</td>"));
    assert!(html.contains("<td class=\"last-modified\">14 Nov 2023 22:13</td>"));
}

#[test]
fn test_empty_directory_renders_header_only() {
    let html = render("/empty/", &[]).unwrap();

    assert!(html.contains("Index of /empty/"));
    assert!(!html.contains("<a href"));
}

#[test]
fn test_missing_directory_is_not_found() {
    let dir = TempDir::new().unwrap();

    let result = read_entries(&dir.path().join("gone"));

    assert!(matches!(result, Err(ServeError::NotFound)));
}
