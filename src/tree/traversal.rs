//! Stack-based tree rebuilding shared by the filter, map and reduce stages.
//!
//! Every stage consumes a tree and produces a new one. Doing that with plain
//! recursion ties the call-stack depth to the directory depth, so the stages
//! drive this loop over a heap-allocated frame stack instead.

use std::vec;

use super::node::FileNode;

/// A node whose children are still being rebuilt.
struct Frame<S> {
    /// The node with its child list taken out.
    node: FileNode,
    is_dir: bool,
    state: S,
    pending: vec::IntoIter<FileNode>,
    done: Vec<FileNode>,
}

impl<S> Frame<S> {
    fn open<E>(mut node: FileNode, enter: &mut E) -> Self
    where
        E: FnMut(&FileNode) -> S,
    {
        // Entered with original children still attached.
        let state = enter(&node);
        let is_dir = node.is_dir();
        let children = node.children.take().unwrap_or_default();
        Frame {
            node,
            is_dir,
            state,
            done: Vec::with_capacity(children.len()),
            pending: children.into_iter(),
        }
    }
}

/// Rebuild `root` bottom-up.
///
/// `enter` runs in pre-order and sees each node exactly as it arrived,
/// original children included. `exit` runs in post-order and receives the
/// node with its child list replaced by the children that `exit` kept, plus
/// whatever `enter` returned for that node. Returning `None` from `exit`
/// drops the node from its parent.
pub(crate) fn rebuild<S, E, X>(root: FileNode, mut enter: E, mut exit: X) -> Option<FileNode>
where
    E: FnMut(&FileNode) -> S,
    X: FnMut(FileNode, S) -> Option<FileNode>,
{
    let mut stack = vec![Frame::open(root, &mut enter)];

    loop {
        let next_child = stack.last_mut().and_then(|frame| frame.pending.next());
        if let Some(child) = next_child {
            stack.push(Frame::open(child, &mut enter));
            continue;
        }

        let frame = stack.pop()?;
        let mut node = frame.node;
        if frame.is_dir {
            node.children = Some(frame.done);
        }
        let result = exit(node, frame.state);

        match stack.last_mut() {
            Some(parent) => parent.done.extend(result),
            None => return result,
        }
    }
}
