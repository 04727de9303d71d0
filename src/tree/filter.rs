//! Filter engine and the predicates it is usually fed
//!
//! Filtering is post-order: files are tested against the predicate list,
//! directories survive only while at least one descendant does.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use glob::Pattern;

use super::node::FileNode;
use super::traversal::rebuild;
use crate::error::{Error, Result};

/// Accepts or rejects a single file node.
pub type Predicate = Arc<dyn Fn(&FileNode) -> bool + Send + Sync>;

/// Decide whether one file node is kept.
///
/// Predicates are ANDed in order and short-circuit. Only called for files.
pub fn accepts_file(node: &FileNode, predicates: &[Predicate], text_only: bool) -> bool {
    if text_only && !node.is_text() {
        return false;
    }
    predicates.iter().all(|p| p(node))
}

/// Prune a tree.
///
/// Files that fail [`accepts_file`] are dropped, then every directory left
/// without children is dropped too. Returns `None` when nothing survives.
pub fn filter_tree(tree: FileNode, predicates: &[Predicate], text_only: bool) -> Option<FileNode> {
    let mut dropped = 0usize;
    let result = rebuild(
        tree,
        |_| (),
        |node, ()| {
            let keep = if node.is_dir() {
                !node.children().is_empty()
            } else {
                accepts_file(&node, predicates, text_only)
            };
            if keep {
                Some(node)
            } else {
                dropped += 1;
                None
            }
        },
    );
    log::debug!("filter dropped {} nodes", dropped);
    result
}

/// Accept files whose last extension is in `extensions`, ignoring case.
///
/// Extensions may be given with or without the leading dot.
pub fn extension_predicate<I, S>(extensions: I) -> Predicate
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let extensions: HashSet<String> = extensions
        .into_iter()
        .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();
    Arc::new(move |node: &FileNode| {
        extension_of(&node.name).is_some_and(|ext| extensions.contains(&ext.to_lowercase()))
    })
}

/// Reject files whose name matches any of the glob patterns.
pub fn ignore_predicate(patterns: &[String]) -> Result<Predicate> {
    let patterns = patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| Error::InvalidArgument(format!("bad glob '{}': {}", p, e)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Arc::new(move |node: &FileNode| {
        !patterns.iter().any(|p| p.matches(&node.name))
    }))
}

/// Keep files modified inside the given window. Either bound may be open.
pub fn modified_predicate(newer_than: Option<SystemTime>, older_than: Option<SystemTime>) -> Predicate {
    let newer: Option<DateTime<Utc>> = newer_than.map(DateTime::from);
    let older: Option<DateTime<Utc>> = older_than.map(DateTime::from);
    Arc::new(move |node: &FileNode| {
        let mtime = node.file_info.modified;
        newer.is_none_or(|t| mtime >= t) && older.is_none_or(|t| mtime <= t)
    })
}

/// Text after the last dot of a file name, if any.
///
/// Leading-dot names such as `.bashrc` have no extension.
fn extension_of(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(0) | None => None,
        Some(i) => Some(&name[i + 1..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::{FileInfo, TextStats};
    use std::path::PathBuf;
    use std::time::Duration;

    fn info(path: &str, text: bool) -> FileInfo {
        FileInfo {
            full_path: PathBuf::from(path),
            size: 1,
            modified: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
            text: text.then(|| TextStats {
                encoding: "ascii".to_string(),
                line_count: 1,
                word_count: 1,
                character_count: 1,
            }),
        }
    }

    fn file(name: &str, text: bool) -> FileNode {
        FileNode::file(name, info(&format!("/r/{}", name), text))
    }

    fn sample() -> FileNode {
        FileNode::dir(
            "r",
            info("/r", false),
            vec![
                file("main.py", true),
                file("image.png", false),
                FileNode::dir("docs", info("/r/docs", false), vec![file("guide.md", true)]),
                FileNode::dir("empty", info("/r/empty", false), Vec::new()),
            ],
        )
    }

    fn always(answer: bool) -> Predicate {
        Arc::new(move |_: &FileNode| answer)
    }

    fn names(tree: &FileNode) -> Vec<&str> {
        tree.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn test_text_only_drops_binary_files() {
        let filtered = filter_tree(sample(), &[], true).unwrap();
        assert_eq!(names(&filtered), ["r", "main.py", "docs", "guide.md"]);
    }

    #[test]
    fn test_accept_all_keeps_everything_but_empty_dirs() {
        let filtered = filter_tree(sample(), &[always(true)], false).unwrap();
        assert_eq!(
            names(&filtered),
            ["r", "main.py", "image.png", "docs", "guide.md"]
        );
    }

    #[test]
    fn test_reject_all_annihilates() {
        assert!(filter_tree(sample(), &[always(false)], false).is_none());
    }

    #[test]
    fn test_pruning_is_transitive() {
        let tree = FileNode::dir(
            "r",
            info("/r", false),
            vec![FileNode::dir(
                "a",
                info("/r/a", false),
                vec![FileNode::dir("b", info("/r/a/b", false), vec![file("x.bin", false)])],
            )],
        );
        assert!(filter_tree(tree, &[], true).is_none());
    }

    #[test]
    fn test_predicates_are_anded() {
        let tree = sample();
        let py = extension_predicate(["py", "md"]);
        let not_main: Predicate = Arc::new(|n: &FileNode| n.name != "main.py");
        let filtered = filter_tree(tree, &[py, not_main], false).unwrap();
        assert_eq!(names(&filtered), ["r", "docs", "guide.md"]);
    }

    #[test]
    fn test_predicates_never_see_directories() {
        let seen_dir = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&seen_dir);
        let spy: Predicate = Arc::new(move |n: &FileNode| {
            if n.is_dir() {
                flag.store(true, std::sync::atomic::Ordering::SeqCst);
            }
            true
        });
        filter_tree(sample(), &[spy], false);
        assert!(!seen_dir.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn test_single_file_root() {
        assert!(filter_tree(file("a.py", true), &[], true).is_some());
        assert!(filter_tree(file("a.bin", false), &[], true).is_none());
    }

    #[test]
    fn test_extension_predicate_is_case_insensitive() {
        let p = extension_predicate(["py"]);
        assert!(p(&file("foo.PY", true)));
        assert!(p(&file("foo.py", true)));
        assert!(!p(&file("foo.txt", true)));

        let upper = extension_predicate([".PY"]);
        assert!(upper(&file("foo.py", true)));
    }

    #[test]
    fn test_extension_predicate_edge_names() {
        let p = extension_predicate(["bashrc", "gz"]);
        assert!(!p(&file(".bashrc", true)));
        assert!(!p(&file("Makefile", true)));
        assert!(p(&file("archive.tar.gz", false)));
    }

    #[test]
    fn test_ignore_predicate() {
        let p = ignore_predicate(&["*.log".to_string(), "secret?.txt".to_string()]).unwrap();
        assert!(!p(&file("debug.log", true)));
        assert!(!p(&file("secret1.txt", true)));
        assert!(p(&file("secret12.txt", true)));
        assert!(p(&file("main.rs", true)));
    }

    #[test]
    fn test_ignore_predicate_rejects_bad_glob() {
        let err = ignore_predicate(&["[".to_string()]).err().unwrap();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_modified_predicate_window() {
        let node = file("a.txt", true);
        let mtime: SystemTime = node.file_info.modified.into();
        let hour = Duration::from_secs(3600);

        assert!(modified_predicate(None, None)(&node));
        assert!(modified_predicate(Some(mtime - hour), None)(&node));
        assert!(!modified_predicate(Some(mtime + hour), None)(&node));
        assert!(modified_predicate(None, Some(mtime + hour))(&node));
        assert!(!modified_predicate(None, Some(mtime - hour))(&node));
    }
}
