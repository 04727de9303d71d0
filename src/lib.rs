//! Treeverse - build a tree from a directory, then filter, map and reduce it

pub mod callbacks;
pub mod classify;
pub mod document;
pub mod error;
pub mod tree;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use callbacks::CallbackRegistry;
pub use classify::{classify, classify_file};
pub use document::{Format, deserialize, read_tree, serialize, write_tree};
pub use error::{CallbackKind, Error, Result};
pub use tree::{
    Annotation, FileInfo, FileNode, Mapper, NodePatch, Predicate, Reducer, TextStats, TreeWalker,
    WalkerConfig, build, filter_tree, map_tree, map_tree_parallel, reduce_tree, traverse,
};
