//! Depth-first traversal of forests with per-node visitor data.
//!
//! Both the elimination tree and the junction tree are walked with the same
//! routine. Each visited node gets a piece of data created by the pre-order
//! visitor from its parent's data, and handed back to the post-order visitor
//! together with the parent's data once all children are done. Results flow
//! upward by writing into the parent's data; nothing is kept after the
//! traversal.
//!
//! The forest's roots are children of a synthetic root whose data the caller
//! owns, so results of the roots end up there.
//!
//! # Example
//!
//! ```
//! use jtree_rs::traversal::{depth_first_forest, TreeNode};
//!
//! struct Node(u32, Vec<Node>);
//!
//! impl TreeNode for Node {
//!     fn children(&self) -> &[Self] {
//!         &self.1
//!     }
//! }
//!
//! // Sum of values in every subtree, collected at the synthetic root.
//! let forest = vec![Node(1, vec![Node(2, vec![]), Node(3, vec![])]), Node(4, vec![])];
//! let mut totals = Vec::new();
//! depth_first_forest(
//!     &forest,
//!     &mut totals,
//!     |_node, _parent| Vec::new(),
//!     |node, children: Vec<u32>, parent| parent.push(node.0 + children.iter().sum::<u32>()),
//! );
//! assert_eq!(totals, vec![6, 4]);
//! ```

use std::convert::Infallible;

/// A node of a tree that owns its children.
pub trait TreeNode: Sized {
    fn children(&self) -> &[Self];
}

/// Frame on the traversal stack.
struct StackFrame<'a, N, D> {
    node: &'a N,
    data: D,
    /// Index of the next child to descend into.
    next_child: usize,
}

/// Fallible depth-first traversal of a forest.
///
/// For every node, `visit_pre(node, parent_data)` runs before any of its
/// children are visited and returns the node's data; `visit_post(node, data,
/// parent_data)` runs after all children's post-order visits. Siblings are
/// visited in order. The first error returned by `visit_post` stops the
/// traversal and is returned.
pub fn try_depth_first_forest<'a, N, D, E>(
    roots: &'a [N],
    root_data: &mut D,
    mut visit_pre: impl FnMut(&'a N, &mut D) -> D,
    mut visit_post: impl FnMut(&'a N, D, &mut D) -> Result<(), E>,
) -> Result<(), E>
where
    N: TreeNode,
{
    let mut stack: Vec<StackFrame<'a, N, D>> = Vec::new();

    for root in roots {
        let data = visit_pre(root, root_data);
        stack.push(StackFrame {
            node: root,
            data,
            next_child: 0,
        });

        while let Some(frame) = stack.last_mut() {
            let node: &'a N = frame.node;
            if let Some(child) = node.children().get(frame.next_child) {
                frame.next_child += 1;
                let data = visit_pre(child, &mut frame.data);
                stack.push(StackFrame {
                    node: child,
                    data,
                    next_child: 0,
                });
                continue;
            }

            let Some(frame) = stack.pop() else {
                break;
            };
            let parent_data = match stack.last_mut() {
                Some(parent) => &mut parent.data,
                None => &mut *root_data,
            };
            visit_post(frame.node, frame.data, parent_data)?;
        }
    }

    Ok(())
}

/// Infallible depth-first traversal of a forest.
///
/// See [`try_depth_first_forest`].
pub fn depth_first_forest<'a, N, D>(
    roots: &'a [N],
    root_data: &mut D,
    visit_pre: impl FnMut(&'a N, &mut D) -> D,
    mut visit_post: impl FnMut(&'a N, D, &mut D),
) where
    N: TreeNode,
{
    let result = try_depth_first_forest(roots, root_data, visit_pre, |node, data, parent| {
        visit_post(node, data, parent);
        Ok::<(), Infallible>(())
    });
    match result {
        Ok(()) => {}
        Err(never) => match never {},
    }
}
