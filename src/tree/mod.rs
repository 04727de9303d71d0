//! File tree model and the stages that transform it
//!
//! - `TreeWalker` builds a tree from the filesystem
//! - `filter_tree` prunes files and the directories they leave empty
//! - `map_tree` rewrites annotations top-down
//! - `reduce_tree` folds annotations bottom-up
//!
//! Every stage takes the tree by value and returns a new one.

mod config;
mod filter;
mod node;
mod transform;
mod traversal;
mod walker;

pub use config::WalkerConfig;
pub use filter::{
    Predicate, accepts_file, extension_predicate, filter_tree, ignore_predicate,
    modified_predicate,
};
pub use node::{Annotation, FileInfo, FileNode, Iter, NodePatch, TextStats, empty_annotation};
pub use transform::{Mapper, Reducer, map_tree, map_tree_parallel, reduce_tree};
pub use walker::{TreeWalker, build, traverse};
