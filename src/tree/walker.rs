//! TreeWalker - builds the full tree in memory from a filesystem snapshot

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::config::WalkerConfig;
use super::filter::{Predicate, accepts_file, filter_tree};
use super::node::{FileInfo, FileNode};
use crate::classify::classify_file;
use crate::error::{Error, Result};

/// Walks a directory depth-first and records every entry as a `FileNode`.
///
/// Files failing the predicates (or non-text files when `text_only` is set)
/// are left out; directories are kept even when they end up empty. Any I/O
/// failure aborts the whole walk. Symlinks are followed.
pub struct TreeWalker {
    config: WalkerConfig,
    predicates: Vec<Predicate>,
}

/// One visited entry; `parent` indexes into the same arena.
struct Slot {
    node: Option<FileNode>,
    parent: Option<usize>,
}

impl TreeWalker {
    pub fn new(config: WalkerConfig) -> Self {
        Self {
            config,
            predicates: Vec::new(),
        }
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn with_predicates(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.predicates.extend(predicates);
        self
    }

    pub fn walk(&self, root: &Path) -> Result<Option<FileNode>> {
        let root = std::path::absolute(root).map_err(|e| Error::fs(root, e))?;
        let arena = self.collect(root)?;
        log::debug!("walk visited {} entries", arena.len());
        Ok(assemble(arena))
    }

    /// Depth-first pass filling the arena in pre-order.
    fn collect(&self, root: PathBuf) -> Result<Vec<Slot>> {
        let mut arena: Vec<Slot> = Vec::new();
        let mut stack: Vec<(PathBuf, usize, Option<usize>)> = vec![(root, 0, None)];

        while let Some((path, depth, parent)) = stack.pop() {
            let Some(node) = self.visit(&path)? else {
                continue;
            };
            let is_dir = node.is_dir();
            let index = arena.len();
            arena.push(Slot {
                node: Some(node),
                parent,
            });

            if is_dir && self.within_depth(depth + 1) {
                let entries = read_entries(&path)?;
                log::debug!("{}: {} entries at depth {}", path.display(), entries.len(), depth);
                // Reversed so entries come off the stack in iteration order.
                for entry in entries.into_iter().rev() {
                    stack.push((entry, depth + 1, Some(index)));
                }
            }
        }

        Ok(arena)
    }

    fn within_depth(&self, depth: usize) -> bool {
        self.config.max_depth.is_none_or(|max| depth <= max)
    }

    /// Build the childless node for one path, or `None` for a rejected file.
    fn visit(&self, path: &Path) -> Result<Option<FileNode>> {
        let meta = fs::metadata(path).map_err(|e| Error::fs(path, e))?;
        let modified = meta.modified().map_err(|e| Error::fs(path, e))?;

        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let mut info = FileInfo {
            full_path: path.to_path_buf(),
            size: meta.len(),
            modified: DateTime::<Utc>::from(modified),
            text: None,
        };

        if meta.is_dir() {
            return Ok(Some(FileNode::dir(name, info, Vec::new())));
        }

        // Only regular files are read; fifos and sockets would block.
        if meta.is_file() {
            info.text = classify_file(path)?;
            log::trace!("{}: text={}", path.display(), info.text.is_some());
        }

        let node = FileNode::file(name, info);
        if accepts_file(&node, &self.predicates, self.config.text_only) {
            Ok(Some(node))
        } else {
            Ok(None)
        }
    }
}

fn read_entries(path: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(path).map_err(|e| Error::fs(path, e))?;
    entries
        .map(|entry| entry.map(|e| e.path()).map_err(|e| Error::fs(path, e)))
        .collect()
}

/// Link arena slots into the nested tree, children before parents.
///
/// Every child sits at a higher index than its parent, so walking the arena
/// backwards completes each node before it is moved into its parent.
fn assemble(mut arena: Vec<Slot>) -> Option<FileNode> {
    for index in (0..arena.len()).rev() {
        let parent = arena[index].parent;
        let Some(mut node) = arena[index].node.take() else {
            continue;
        };
        // Children were attached last-first.
        if let Some(children) = node.children.as_mut() {
            children.reverse();
        }
        match parent {
            Some(p) => {
                if let Some(siblings) = arena[p].node.as_mut().and_then(|n| n.children.as_mut()) {
                    siblings.push(node);
                }
            }
            None => return Some(node),
        }
    }
    None
}

/// Build a tree. Files are screened during the walk; empty directories stay.
pub fn build(
    root: &Path,
    depth_limit: Option<usize>,
    predicates: Vec<Predicate>,
    text_only: bool,
) -> Result<Option<FileNode>> {
    let config = WalkerConfig {
        max_depth: depth_limit,
        text_only,
        ..Default::default()
    };
    TreeWalker::new(config).with_predicates(predicates).walk(root)
}

/// Build and filter in one go.
///
/// Predicates come from the config options followed by `extra`. They run
/// once per file during the walk; the filter pass afterwards only prunes
/// directories left empty. Returns `None` when no file survives.
pub fn traverse(root: &Path, config: &WalkerConfig, extra: Vec<Predicate>) -> Result<Option<FileNode>> {
    let mut predicates = config.predicates()?;
    predicates.extend(extra);

    let walker = TreeWalker::new(config.clone()).with_predicates(predicates);
    let Some(tree) = walker.walk(root)? else {
        return Ok(None);
    };
    Ok(filter_tree(tree, &[], false))
}
