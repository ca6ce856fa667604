//! Elimination trees.
//!
//! An elimination tree has one node per eliminated key. Each node holds the
//! factors whose earliest key (in elimination order) is that node's key, and
//! its children are the nodes that must be eliminated before it. The junction
//! tree builder consumes an elimination tree; [`EliminationTree::build`]
//! computes one from a factor graph and an ordering.

use std::collections::{HashMap, HashSet};
use std::fmt;

use log::debug;

use crate::error::{Error, Result};
use crate::factor::{Factor, GraphFactor};
use crate::traversal::TreeNode;
use crate::types::Key;

/// A node of an elimination tree.
pub struct EliminationNode<F, C> {
    key: Key,
    factors: Vec<GraphFactor<F, C>>,
    children: Vec<EliminationNode<F, C>>,
}

impl<F, C> EliminationNode<F, C> {
    pub fn new(
        key: Key,
        factors: Vec<GraphFactor<F, C>>,
        children: Vec<EliminationNode<F, C>>,
    ) -> Self {
        Self {
            key,
            factors,
            children,
        }
    }

    pub fn key(&self) -> Key {
        self.key
    }

    /// Factors attached directly to this node.
    pub fn factors(&self) -> &[GraphFactor<F, C>] {
        &self.factors
    }

    pub fn children(&self) -> &[EliminationNode<F, C>] {
        &self.children
    }
}

impl<F, C> TreeNode for EliminationNode<F, C> {
    fn children(&self) -> &[Self] {
        &self.children
    }
}

impl<F, C> Clone for EliminationNode<F, C> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            factors: self.factors.clone(),
            children: self.children.clone(),
        }
    }
}

/// A forest of elimination nodes plus the factors no node claimed.
pub struct EliminationTree<F, C> {
    roots: Vec<EliminationNode<F, C>>,
    remaining_factors: Vec<GraphFactor<F, C>>,
}

impl<F, C> EliminationTree<F, C> {
    /// Assembles an elimination tree from already-built nodes.
    ///
    /// The caller is responsible for the tree being well formed: every key
    /// owned by exactly one node, and every factor attached to the node of its
    /// earliest eliminated key.
    pub fn new(roots: Vec<EliminationNode<F, C>>, remaining_factors: Vec<GraphFactor<F, C>>) -> Self {
        Self {
            roots,
            remaining_factors,
        }
    }

    pub fn roots(&self) -> &[EliminationNode<F, C>] {
        &self.roots
    }

    /// Factors that involve none of the eliminated keys.
    pub fn remaining_factors(&self) -> &[GraphFactor<F, C>] {
        &self.remaining_factors
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        let mut count = 0;
        crate::traversal::depth_first_forest(
            &self.roots,
            &mut count,
            |_, _| 0,
            |_, below, parent| *parent += below + 1,
        );
        count
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl<F: Factor, C> EliminationTree<F, C> {
    /// Builds the elimination tree of `factors` for the given `ordering`.
    ///
    /// Each factor is attached to the node of its first key in `ordering`.
    /// The parent of a node is the next node (in ordering) that becomes
    /// adjacent to it once it is eliminated; this is found by following the
    /// factors through the columns they touch, with path compression. Factors
    /// involving no ordered key are kept as remaining factors.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateKey`] if `ordering` repeats a key.
    /// - [`Error::MissingKey`] if a key of `ordering` is not involved in any factor.
    pub fn build(factors: &[GraphFactor<F, C>], ordering: &[Key]) -> Result<Self> {
        debug!(
            "EliminationTree::build(factors = {}, ordering = {})",
            factors.len(),
            ordering.len()
        );

        let mut position = HashMap::with_capacity(ordering.len());
        for (j, &key) in ordering.iter().enumerate() {
            if position.insert(key, j).is_some() {
                return Err(Error::DuplicateKey(key));
            }
        }

        // Column index: for every ordered key, the factors involving it.
        let mut columns: Vec<Vec<usize>> = vec![Vec::new(); ordering.len()];
        let mut involved = HashSet::new();
        for (i, factor) in factors.iter().enumerate() {
            for key in factor.keys() {
                involved.insert(*key);
                if let Some(&j) = position.get(key) {
                    if columns[j].last() != Some(&i) {
                        columns[j].push(i);
                    }
                }
            }
        }
        if let Some(&key) = ordering.iter().find(|key| !involved.contains(key)) {
            return Err(Error::MissingKey(key));
        }

        let n = ordering.len();
        let mut parents: Vec<Option<usize>> = vec![None; n];
        // Path-compressed ancestor links used while discovering parents.
        let mut ancestors: Vec<Option<usize>> = vec![None; n];
        let mut prev_col: Vec<Option<usize>> = vec![None; factors.len()];
        let mut attached: Vec<Vec<usize>> = vec![Vec::new(); n];

        for j in 0..n {
            for &i in &columns[j] {
                match prev_col[i] {
                    None => attached[j].push(i),
                    Some(mut r) => {
                        // Find the root of r, compressing the path towards j.
                        while let Some(next) = ancestors[r] {
                            if next == j {
                                break;
                            }
                            ancestors[r] = Some(j);
                            r = next;
                        }
                        if ancestors[r].is_none() && r != j {
                            ancestors[r] = Some(j);
                            parents[r] = Some(j);
                        }
                    }
                }
                prev_col[i] = Some(j);
            }
        }

        // Children always precede their parent in the ordering, so nodes can
        // be assembled front to back.
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut roots = Vec::new();
        for (j, parent) in parents.iter().enumerate() {
            match parent {
                Some(p) => children[*p].push(j),
                None => roots.push(j),
            }
        }

        let mut nodes: Vec<Option<EliminationNode<F, C>>> = Vec::with_capacity(n);
        for j in 0..n {
            let node_children = children[j]
                .iter()
                .filter_map(|&c| nodes[c].take())
                .collect();
            let node_factors = attached[j].iter().map(|&i| factors[i].clone()).collect();
            nodes.push(Some(EliminationNode::new(ordering[j], node_factors, node_children)));
        }

        let roots = roots.into_iter().filter_map(|j| nodes[j].take()).collect();
        let remaining_factors = factors
            .iter()
            .zip(&prev_col)
            .filter(|(_, col)| col.is_none())
            .map(|(factor, _)| factor.clone())
            .collect();

        Ok(Self::new(roots, remaining_factors))
    }
}

impl<F, C> Clone for EliminationTree<F, C> {
    fn clone(&self) -> Self {
        Self {
            roots: self.roots.clone(),
            remaining_factors: self.remaining_factors.clone(),
        }
    }
}

impl<F, C> fmt::Display for EliminationTree<F, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn go<F, C>(f: &mut fmt::Formatter<'_>, node: &EliminationNode<F, C>, indent: usize) -> fmt::Result {
            writeln!(
                f,
                "{:indent$}-({}) factors = {}",
                "",
                node.key,
                node.factors.len(),
                indent = indent
            )?;
            for child in &node.children {
                go(f, child, indent + 2)?;
            }
            Ok(())
        }
        for root in &self.roots {
            go(f, root, 0)?;
        }
        Ok(())
    }
}
