//! Map and reduce stages
//!
//! Both are total: they never add or drop nodes. The mapper runs pre-order
//! and only sees a node's original fields; the reducer runs post-order and
//! sees the already-reduced children.

use std::sync::Arc;

use rayon::prelude::*;

use super::node::{Annotation, FileNode, NodePatch};
use super::traversal::rebuild;

/// Computes a node's new annotation from its own fields.
pub type Mapper = Arc<dyn Fn(&FileNode) -> Annotation + Send + Sync>;

/// Computes a patch for a node whose children are already reduced.
pub type Reducer = Arc<dyn Fn(&FileNode) -> NodePatch + Send + Sync>;

/// Replace every node's annotation with `f(node)`.
///
/// `f` sees the node as it was before this stage, children included; the
/// result replaces the annotation wholesale.
pub fn map_tree<F>(tree: FileNode, f: &F) -> FileNode
where
    F: Fn(&FileNode) -> Annotation + ?Sized,
{
    let mapped = rebuild(tree, |node| f(node), |mut node, annotation| {
        node.annotation = annotation;
        Some(node)
    });
    match mapped {
        Some(tree) => tree,
        None => unreachable!("map never drops nodes"),
    }
}

/// Same result as [`map_tree`], with `f` evaluated on a rayon pool.
///
/// Phase 1 computes every annotation in parallel over the nodes in
/// pre-order; phase 2 rebuilds the tree sequentially in the same order.
/// `workers`: 0 = rayon's global pool, 1 = sequential, N = N threads.
pub fn map_tree_parallel<F>(tree: FileNode, f: &F, workers: usize) -> FileNode
where
    F: Fn(&FileNode) -> Annotation + Sync + ?Sized,
{
    if workers == 1 {
        return map_tree(tree, f);
    }

    let annotations: Vec<Annotation> = {
        let nodes: Vec<&FileNode> = tree.iter().collect();
        with_workers(workers, || nodes.par_iter().map(|&node| f(node)).collect())
    };
    log::debug!("computed {} annotations in parallel", annotations.len());

    let mut annotations = annotations.into_iter();
    let mapped = rebuild(
        tree,
        |_| annotations.next().unwrap_or_default(),
        |mut node, annotation| {
            node.annotation = annotation;
            Some(node)
        },
    );
    match mapped {
        Some(tree) => tree,
        None => unreachable!("map never drops nodes"),
    }
}

/// Fold the tree bottom-up.
///
/// Children are reduced first, then `g` runs on the parent rebuilt with
/// those children and its patch replaces the named fields.
pub fn reduce_tree<G>(tree: FileNode, g: &G) -> FileNode
where
    G: Fn(&FileNode) -> NodePatch + ?Sized,
{
    let reduced = rebuild(tree, |_| (), |node, ()| {
        let patch = g(&node);
        Some(node.apply(patch))
    });
    match reduced {
        Some(tree) => tree,
        None => unreachable!("reduce never drops nodes"),
    }
}

fn with_workers<R, OP>(workers: usize, op: OP) -> R
where
    R: Send,
    OP: FnOnce() -> R + Send,
{
    if workers == 0 {
        return op();
    }
    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(op),
        Err(e) => {
            // Fall back to rayon's global pool if custom pool creation fails
            log::warn!("cannot build {}-thread pool: {}", workers, e);
            op()
        }
    }
}
