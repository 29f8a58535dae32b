use super::scan::{is_audio_file, scan};
use crate::config::LibrarySettings;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn is_audio_file_matches_configured_extensions_case_insensitive() {
    let settings = LibrarySettings::default();
    assert!(is_audio_file(Path::new("/tmp/a.mp3"), &settings));
    assert!(is_audio_file(Path::new("/tmp/a.MP3"), &settings));
    assert!(is_audio_file(Path::new("/tmp/a.flac"), &settings));
    assert!(is_audio_file(Path::new("/tmp/a.ogg"), &settings));
    assert!(!is_audio_file(Path::new("/tmp/a.txt"), &settings));
    assert!(!is_audio_file(Path::new("/tmp/a"), &settings));
}

#[test]
fn scan_filters_non_audio_and_sorts_by_display_case_insensitive() {
    let dir = tempdir().unwrap();

    fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
    fs::write(dir.path().join("A.ogg"), b"not a real ogg").unwrap();
    fs::write(dir.path().join("c.txt"), b"ignore me").unwrap();

    let files = scan(dir.path(), &LibrarySettings::default());
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].display, "A");
    assert_eq!(files[1].display, "b");
    // Untagged garbage has no duration; that's the transport's problem.
    assert!(files[0].duration.is_none());
}

#[test]
fn scan_respects_include_hidden_false() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".hidden.mp3"), b"not real").unwrap();
    fs::write(dir.path().join("visible.mp3"), b"not real").unwrap();

    let settings = LibrarySettings {
        include_hidden: false,
        ..LibrarySettings::default()
    };
    let files = scan(dir.path(), &settings);

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].display, "visible");
}

#[test]
fn scan_respects_recursive_false() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir_all(&sub).unwrap();
    fs::write(sub.join("child.mp3"), b"not real").unwrap();

    let settings = LibrarySettings {
        recursive: false,
        ..LibrarySettings::default()
    };
    let files = scan(dir.path(), &settings);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].display, "root");
}

#[test]
fn scan_respects_max_depth() {
    let dir = tempdir().unwrap();
    let d1 = dir.path().join("d1");
    let d2 = d1.join("d2");
    fs::create_dir_all(&d2).unwrap();
    fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
    fs::write(d1.join("one.mp3"), b"not real").unwrap();
    fs::write(d2.join("two.mp3"), b"not real").unwrap();

    // WalkDir depth counts root as 0, children as 1, grandchildren as 2...
    // With max_depth=2 we should see root + d1/*, but not d1/d2/*.
    let settings = LibrarySettings {
        max_depth: Some(2),
        ..LibrarySettings::default()
    };
    let files = scan(dir.path(), &settings);

    let names: Vec<String> = files.iter().map(|f| f.display.clone()).collect();
    assert!(names.contains(&"root".to_string()));
    assert!(names.contains(&"one".to_string()));
    assert!(!names.contains(&"two".to_string()));
}
