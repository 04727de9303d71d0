//! Edge case and error handling tests for treeverse


use harness::{TestTree, run_treeverse};
use std::fs;
use treeverse::{Error, FileNode, Format, TreeWalker, WalkerConfig, deserialize, serialize};

fn walk_all(tree: &TestTree) -> treeverse::Result<Option<FileNode>> {
    let config = WalkerConfig {
        text_only: false,
        ..Default::default()
    };
    TreeWalker::new(config).walk(tree.path())
}

// ============================================================================
// Symlink Edge Cases
// ============================================================================

#[test]
#[cfg(unix)]
fn test_symlink_to_file_is_followed() {
    let tree = TestTree::new();
    tree.add_file("target.txt", "alpha beta\ngamma");
    tree.add_symlink("target.txt", "link.txt");

    let root = walk_all(&tree).unwrap().unwrap();
    let link = root.child("link.txt").expect("symlink listed");
    assert!(link.is_text());
    assert_eq!(link.file_info.text.as_ref().unwrap().word_count, 3);
}

#[test]
#[cfg(unix)]
fn test_broken_symlink_aborts_build() {
    let tree = TestTree::new();
    tree.add_file("real.txt", "real");
    tree.add_symlink("nonexistent.txt", "broken_link.txt");

    match walk_all(&tree) {
        Err(Error::FilesystemAccess { path, .. }) => {
            assert!(path.ends_with("broken_link.txt"), "{}", path.display());
        }
        other => panic!("expected filesystem error, got {:?}", other.map(|t| t.is_some())),
    }
}

#[test]
#[cfg(unix)]
fn test_self_referential_symlink_aborts_build() {
    let tree = TestTree::new();
    tree.add_file("file.txt", "content");
    tree.add_symlink("selfref", "selfref");

    assert!(matches!(walk_all(&tree), Err(Error::FilesystemAccess { .. })));
}

#[test]
#[cfg(unix)]
fn test_broken_symlink_cli_exit_code() {
    let tree = TestTree::new();
    tree.add_file("real.txt", "real");
    tree.add_symlink("nowhere", "dangling");

    let (stdout, stderr, success) = run_treeverse(tree.path(), &["traverse"]);
    assert!(!success, "dangling symlink should be fatal");
    assert!(stdout.is_empty(), "no partial tree expected: {}", stdout);
    assert!(stderr.contains("dangling"), "{}", stderr);
}

// ============================================================================
// Permission Error Handling
// ============================================================================

#[test]
#[cfg(unix)]
fn test_unreadable_directory_aborts_build() {
    use std::os::unix::fs::PermissionsExt;

    let tree = TestTree::new();
    tree.add_file("readable/file.txt", "fine");
    let unreadable = tree.add_dir("unreadable");
    tree.add_file("unreadable/hidden.txt", "secret");

    let mut perms = fs::metadata(&unreadable).unwrap().permissions();
    perms.set_mode(0o000);
    fs::set_permissions(&unreadable, perms).expect("Failed to set permissions");

    // Privileged users can read the directory anyway; nothing to test then.
    let privileged = fs::read_dir(&unreadable).is_ok();
    let result = walk_all(&tree);

    // Restore permissions for cleanup
    let mut perms = fs::metadata(&unreadable).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&unreadable, perms).expect("Failed to restore permissions");

    if !privileged {
        assert!(matches!(result, Err(Error::FilesystemAccess { .. })));
    }
}

#[test]
#[cfg(unix)]
fn test_unreadable_file_aborts_build() {
    use std::os::unix::fs::PermissionsExt;

    let tree = TestTree::new();
    let file_path = tree.add_file("locked.txt", "locked");

    let mut perms = fs::metadata(&file_path).unwrap().permissions();
    perms.set_mode(0o000);
    fs::set_permissions(&file_path, perms).expect("Failed to set permissions");

    let privileged = fs::read(&file_path).is_ok();
    let result = walk_all(&tree);

    let mut perms = fs::metadata(&file_path).unwrap().permissions();
    perms.set_mode(0o644);
    fs::set_permissions(&file_path, perms).expect("Failed to restore permissions");

    if !privileged {
        assert!(matches!(result, Err(Error::FilesystemAccess { .. })));
    }
}

// ============================================================================
// Classification Edge Cases
// ============================================================================

#[test]
fn test_empty_file_is_not_text() {
    let tree = TestTree::new();
    tree.add_file("empty.txt", "");

    let root = walk_all(&tree).unwrap().unwrap();
    let empty = root.child("empty.txt").unwrap();
    assert!(!empty.is_text());
    assert!(empty.file_info.text.is_none());

    let doc = serialize(&root, Format::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&doc).unwrap();
    let info = &value["child_nodes"][0]["file_info"];
    assert_eq!(info["is_text_file"], false);
    for field in ["text_encoding", "line_count", "word_count", "character_count"] {
        assert!(info.get(field).is_none(), "{} should be omitted", field);
    }
}

#[test]
fn test_empty_file_dropped_in_text_only_mode() {
    let tree = TestTree::new();
    tree.add_file("empty.txt", "");
    tree.add_file("full.txt", "x");

    let root = TreeWalker::new(WalkerConfig::default())
        .walk(tree.path())
        .unwrap()
        .unwrap();
    assert!(root.child("empty.txt").is_none());
    assert!(root.child("full.txt").is_some());
}

#[test]
fn test_latin1_file_is_not_text() {
    let tree = TestTree::new();
    // "café" in ISO-8859-1
    tree.add_bytes("latin1.txt", &[0x63, 0x61, 0x66, 0xE9]);

    let root = walk_all(&tree).unwrap().unwrap();
    assert!(!root.child("latin1.txt").unwrap().is_text());
}

// ============================================================================
// Special Filenames
// ============================================================================

#[test]
fn test_unicode_and_spaces_round_trip() {
    let tree = TestTree::new();
    tree.add_file("日本語.txt", "こんにちは 世界");
    tree.add_file("dir with spaces/émoji_🎉.md", "# title");
    tree.add_file("yes", "a file named like a yaml bool");
    tree.add_file("1.0", "a file named like a number");

    let root = walk_all(&tree).unwrap().unwrap();
    for format in [Format::Yaml, Format::Json] {
        let doc = serialize(&root, format).unwrap();
        assert_eq!(deserialize(&doc, format).unwrap(), root);
    }

    let jp = root.child("日本語.txt").unwrap();
    let text = jp.file_info.text.as_ref().unwrap();
    assert_eq!(text.encoding, "utf-8");
    assert_eq!(text.character_count, 8);
    assert_eq!(text.word_count, 2);
}
