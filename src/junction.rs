//! Junction trees: elimination trees with nodes merged into cliques.
//!
//! A junction tree groups the nodes of an elimination tree into clusters,
//! each of which is eliminated jointly. The grouping is decided symbolically
//! while walking the elimination tree bottom-up: a child is merged into its
//! parent when eliminating the parent's key adds no separator key beyond what
//! the child already needed, i.e. when
//!
//! ```text
//! parents(node) + 1 == parents(child)
//! ```
//!
//! for the symbolic conditionals of the two elimination-tree nodes. Merging
//! is applied to every child of every node, so no remaining edge of the
//! junction tree satisfies it.
//!
//! # Example
//!
//! ```
//! use jtree_rs::etree::EliminationTree;
//! use jtree_rs::factor::GraphFactor;
//! use jtree_rs::junction::JunctionTree;
//! use jtree_rs::symbolic::{SymbolicConditional, SymbolicFactor};
//! use jtree_rs::types::Key;
//!
//! // f(1, 2, 3) eliminated in order 1, 2, 3 forms a single clique.
//! let factors: Vec<GraphFactor<SymbolicFactor, SymbolicConditional>> =
//!     vec![GraphFactor::new(SymbolicFactor::from_ids([1, 2, 3]))];
//! let ordering = [Key::new(1), Key::new(2), Key::new(3)];
//! let etree = EliminationTree::build(&factors, &ordering).unwrap();
//! let jtree = JunctionTree::from_elimination_tree(&etree);
//!
//! assert_eq!(jtree.roots().len(), 1);
//! assert_eq!(jtree.roots()[0].keys(), &ordering);
//! ```

use std::fmt;

use log::{debug, log_enabled, trace, Level};

use crate::etree::{EliminationNode, EliminationTree};
use crate::factor::{Conditional, Factor, GraphFactor};
use crate::symbolic::{eliminate_symbolic, SymbolicConditional, SymbolicFactor};
use crate::traversal::{depth_first_forest, TreeNode};
use crate::types::{fmt_keys, Key};

/// A clique of a junction tree, before elimination.
pub struct Cluster<F, C> {
    pub(crate) keys: Vec<Key>,
    pub(crate) factors: Vec<GraphFactor<F, C>>,
    pub(crate) children: Vec<Cluster<F, C>>,
    pub(crate) problem_size: usize,
}

impl<F, C> Cluster<F, C> {
    fn empty() -> Self {
        Self {
            keys: Vec::new(),
            factors: Vec::new(),
            children: Vec::new(),
            problem_size: 0,
        }
    }

    /// Frontal keys, in the order they are eliminated.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Factors assigned to this cluster.
    pub fn factors(&self) -> &[GraphFactor<F, C>] {
        &self.factors
    }

    pub fn children(&self) -> &[Cluster<F, C>] {
        &self.children
    }

    /// Largest number of keys of any single elimination step merged into
    /// this cluster. A cost estimate only.
    pub fn problem_size(&self) -> usize {
        self.problem_size
    }
}

impl<F, C> TreeNode for Cluster<F, C> {
    fn children(&self) -> &[Self] {
        &self.children
    }
}

impl<F, C> Clone for Cluster<F, C> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            factors: self.factors.clone(),
            children: self.children.clone(),
            problem_size: self.problem_size,
        }
    }
}

impl<F, C> fmt::Debug for Cluster<F, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("keys", &self.keys)
            .field("factors", &self.factors.len())
            .field("children", &self.children)
            .field("problem_size", &self.problem_size)
            .finish()
    }
}

/// A forest of clusters plus the factors that involve no eliminated key.
pub struct JunctionTree<F, C> {
    pub(crate) roots: Vec<Cluster<F, C>>,
    pub(crate) remaining_factors: Vec<GraphFactor<F, C>>,
}

impl<F, C> JunctionTree<F, C> {
    pub fn roots(&self) -> &[Cluster<F, C>] {
        &self.roots
    }

    /// Factors carried over from the elimination tree untouched.
    pub fn remaining_factors(&self) -> &[GraphFactor<F, C>] {
        &self.remaining_factors
    }

    /// Total number of clusters.
    pub fn num_clusters(&self) -> usize {
        self.shape().0
    }

    /// Largest `problem_size` over all clusters, or 0 for an empty tree.
    pub fn max_problem_size(&self) -> usize {
        self.shape().1
    }

    /// Number of clusters and largest `problem_size`, in one pass.
    fn shape(&self) -> (usize, usize) {
        let mut shape = (0, 0);
        depth_first_forest(
            &self.roots,
            &mut shape,
            |_, _| (0, 0),
            |cluster: &Cluster<F, C>, (count, max), parent: &mut (usize, usize)| {
                parent.0 += count + 1;
                parent.1 = parent.1.max(max).max(cluster.problem_size);
            },
        );
        shape
    }
}

impl<F, C> Clone for JunctionTree<F, C> {
    fn clone(&self) -> Self {
        Self {
            roots: self.roots.clone(),
            remaining_factors: self.remaining_factors.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.roots.clone_from(&source.roots);
        self.remaining_factors.clone_from(&source.remaining_factors);
    }
}

/// Per-node data of the construction traversal.
struct ConstructorData<F, C> {
    cluster: Cluster<F, C>,
    child_conditionals: Vec<SymbolicConditional>,
    child_factors: Vec<SymbolicFactor>,
}

impl<F, C> ConstructorData<F, C> {
    fn new(cluster: Cluster<F, C>) -> Self {
        Self {
            cluster,
            child_conditionals: Vec::new(),
            child_factors: Vec::new(),
        }
    }
}

fn constructor_visit_pre<F, C>(
    node: &EliminationNode<F, C>,
    _parent: &mut ConstructorData<F, C>,
) -> ConstructorData<F, C> {
    ConstructorData::new(Cluster {
        keys: vec![node.key()],
        factors: node.factors().to_vec(),
        children: Vec::new(),
        problem_size: 0,
    })
}

fn constructor_visit_post<F: Factor, C>(
    node: &EliminationNode<F, C>,
    data: ConstructorData<F, C>,
    parent: &mut ConstructorData<F, C>,
) {
    let ConstructorData {
        mut cluster,
        child_conditionals,
        child_factors,
    } = data;

    // Symbolic elimination of this node's key over its own factors and the
    // symbolic residuals of its children.
    let keys = node
        .factors()
        .iter()
        .map(|f| f.keys())
        .chain(child_factors.iter().map(|f| f.keys()));
    let (conditional, residual) = eliminate_symbolic(keys, &[node.key()]);
    let nr_parents = conditional.nr_parents();

    assert_eq!(
        cluster.children.len(),
        child_conditionals.len(),
        "Every child cluster needs a symbolic conditional"
    );

    let merge: Vec<bool> = child_conditionals
        .iter()
        .map(|child| nr_parents + 1 == child.nr_parents())
        .collect();

    let mut problem_size = conditional.size();
    let mut kept = Vec::with_capacity(cluster.children.len());
    let mut grandchildren = Vec::new();
    let mut merged_keys: Vec<Vec<Key>> = Vec::new();
    for (child, merge) in cluster.children.drain(..).zip(merge) {
        if merge {
            trace!("merge {:?} into {}", child.keys, node.key());
            problem_size = problem_size.max(child.problem_size);
            merged_keys.push(child.keys);
            cluster.factors.extend(child.factors);
            grandchildren.extend(child.children);
        } else {
            trace!("keep {:?} below {}", child.keys, node.key());
            kept.push(child);
        }
    }

    // Each merged child's keys go in front of what is already there, so the
    // node's own key stays last.
    if !merged_keys.is_empty() {
        let mut keys: Vec<Key> = merged_keys.into_iter().rev().flatten().collect();
        keys.append(&mut cluster.keys);
        cluster.keys = keys;
    }
    kept.append(&mut grandchildren);
    cluster.children = kept;
    cluster.problem_size = problem_size;

    parent.child_conditionals.push(conditional);
    parent.child_factors.push(residual);
    parent.cluster.children.push(cluster);
}

impl<F: Factor, C> JunctionTree<F, C> {
    /// Builds the junction tree of an elimination tree.
    ///
    /// Never fails: the elimination tree is trusted to be well formed.
    pub fn from_elimination_tree(etree: &EliminationTree<F, C>) -> Self {
        debug!(
            "JunctionTree::from_elimination_tree(roots = {})",
            etree.roots().len()
        );

        // The synthetic root gathers the junction tree roots.
        let mut root = ConstructorData::new(Cluster::empty());
        depth_first_forest(
            etree.roots(),
            &mut root,
            constructor_visit_pre,
            constructor_visit_post,
        );

        let tree = Self {
            roots: root.cluster.children,
            remaining_factors: etree.remaining_factors().to_vec(),
        };
        if log_enabled!(Level::Debug) {
            let (clusters, max_problem_size) = tree.shape();
            debug!(
                "JunctionTree::from_elimination_tree -> {} clusters, max problem size {}",
                clusters, max_problem_size
            );
        }
        tree
    }
}

impl<F, C> fmt::Display for JunctionTree<F, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn go<F, C>(f: &mut fmt::Formatter<'_>, cluster: &Cluster<F, C>, indent: usize) -> fmt::Result {
            write!(f, "{:indent$}- ", "", indent = indent)?;
            fmt_keys(f, &cluster.keys)?;
            writeln!(f, "  problemSize = {}", cluster.problem_size)?;
            for child in &cluster.children {
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

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::symbolic::SymbolicFactor;

    type Graph = Vec<GraphFactor<SymbolicFactor, SymbolicConditional>>;
    type Tree = JunctionTree<SymbolicFactor, SymbolicConditional>;

    fn graph(factors: &[&[u64]]) -> Graph {
        factors
            .iter()
            .map(|ids| GraphFactor::new(SymbolicFactor::from_ids(ids.iter().copied())))
            .collect()
    }

    fn build(factors: &[&[u64]], ordering: &[u64]) -> Tree {
        let ordering: Vec<Key> = ordering.iter().copied().map(Key::new).collect();
        let etree = EliminationTree::build(&graph(factors), &ordering).unwrap();
        JunctionTree::from_elimination_tree(&etree)
    }

    fn ids(keys: &[Key]) -> Vec<u64> {
        keys.iter().map(|k| k.id()).collect()
    }

    #[test]
    fn test_pairwise_chain() {
        // 3 - 2 - 1 eliminated 3, 2, 1: cliques {2, 1} <- {3}.
        let tree = build(&[&[3, 2], &[2, 1]], &[3, 2, 1]);
        assert_eq!(tree.roots().len(), 1);
        let root = &tree.roots()[0];
        assert_eq!(ids(root.keys()), vec![2, 1]);
        assert_eq!(root.factors().len(), 1);
        assert_eq!(root.problem_size(), 2);
        assert_eq!(root.children().len(), 1);

        let leaf = &root.children()[0];
        assert_eq!(ids(leaf.keys()), vec![3]);
        assert_eq!(leaf.problem_size(), 2);
        assert!(leaf.children().is_empty());
    }

    #[test]
    fn test_single_clique() {
        let tree = build(&[&[3, 2, 1]], &[3, 2, 1]);
        assert_eq!(tree.num_clusters(), 1);
        let root = &tree.roots()[0];
        assert_eq!(ids(root.keys()), vec![3, 2, 1]);
        assert_eq!(root.problem_size(), 3);
        assert!(root.children().is_empty());
    }

    #[test]
    fn test_star_merges_leaves_into_hub() {
        // Each leaf has the hub as single parent; the hub has none, so every
        // leaf satisfies the merge rule.
        let tree = build(&[&[1, 0], &[2, 0], &[3, 0]], &[1, 2, 3, 0]);
        assert_eq!(tree.num_clusters(), 1);
        let root = &tree.roots()[0];
        assert_eq!(ids(root.keys()), vec![3, 2, 1, 0]);
        assert_eq!(root.factors().len(), 3);
        assert_eq!(root.problem_size(), 2);
    }

    #[test]
    fn test_merged_keys_precede_node_key() {
        // Two branches {1, 2} and {5, 9} both merge into the root 0; the
        // branch merged last ends up first.
        let tree = build(&[&[5, 0, 9], &[1, 2, 0], &[9, 0]], &[5, 1, 2, 9, 0]);
        assert_eq!(tree.num_clusters(), 1);
        assert_eq!(ids(tree.roots()[0].keys()), vec![5, 9, 1, 2, 0]);
        assert_eq!(tree.roots()[0].problem_size(), 3);
    }

    #[test]
    fn test_kept_children_precede_grandchildren() {
        // 5 has children 3 (separator {5, 9}, merged) and 4 (separator {5},
        // kept). 3 has a kept child 1. After merging, 5's children are 4 and
        // then 1; 9 finally absorbs the cluster of 5.
        let tree = build(&[&[5, 9], &[4, 5], &[3, 5, 9], &[1, 3]], &[1, 3, 4, 5, 9]);
        assert_eq!(tree.roots().len(), 1);
        let root = &tree.roots()[0];
        assert_eq!(ids(root.keys()), vec![3, 5, 9]);
        assert_eq!(root.problem_size(), 3);
        let children: Vec<Vec<u64>> = root.children().iter().map(|c| ids(c.keys())).collect();
        assert_eq!(children, vec![vec![4], vec![1]]);
        assert_eq!(root.children()[0].problem_size(), 2);
        assert_eq!(root.children()[1].problem_size(), 2);
    }

    #[test]
    fn test_separator_growth_blocks_merge() {
        // Every step of this graph shrinks the separator by one: one clique.
        let tree = build(&[&[1, 2, 3], &[5, 3]], &[1, 2, 5, 3]);
        assert_eq!(tree.num_clusters(), 1);

        // Eliminating 2 pulls in 3 and 6, so the separator of 2 is larger
        // than that of 1 and they stay apart. The rest merges into 2.
        let tree = build(&[&[1, 2], &[2, 3, 6], &[3, 6]], &[1, 2, 3, 6]);
        assert_eq!(tree.num_clusters(), 2);
        let root = &tree.roots()[0];
        assert_eq!(ids(root.keys()), vec![2, 3, 6]);
        assert_eq!(ids(root.children()[0].keys()), vec![1]);
    }

    #[test]
    fn test_counts_cover_nested_clusters() {
        // 4 absorbs 3; 2 and 1 stay apart: [3 4] -> [2] -> [1].
        let tree = build(&[&[1, 2], &[2, 3], &[3, 4]], &[1, 2, 3, 4]);
        assert_eq!(tree.roots().len(), 1);
        assert_eq!(tree.num_clusters(), 3);
        assert_eq!(tree.max_problem_size(), 2);

        let tree = build(&[&[5, 9], &[4, 5], &[3, 5, 9], &[1, 3], &[7, 8]], &[1, 3, 4, 5, 9, 7, 8]);
        assert_eq!(tree.roots().len(), 2);
        assert_eq!(tree.num_clusters(), 4);
        assert_eq!(tree.max_problem_size(), 3);
    }

    #[test]
    fn test_disconnected_components() {
        let tree = build(&[&[1, 2], &[3, 4], &[7]], &[1, 2, 3, 4]);
        assert_eq!(tree.roots().len(), 2);
        assert_eq!(ids(tree.roots()[0].keys()), vec![1, 2]);
        assert_eq!(ids(tree.roots()[1].keys()), vec![3, 4]);
        assert_eq!(tree.remaining_factors().len(), 1);
        assert_eq!(ids(tree.remaining_factors()[0].keys()), vec![7]);
    }

    #[test]
    fn test_factors_are_shared_not_copied() {
        let g = graph(&[&[1, 2], &[2, 3]]);
        let ordering = [Key::new(1), Key::new(2), Key::new(3)];
        let etree = EliminationTree::build(&g, &ordering).unwrap();
        let tree = JunctionTree::from_elimination_tree(&etree);

        let mut found = 0;
        depth_first_forest(
            tree.roots(),
            &mut (),
            |_, _| (),
            |cluster: &Cluster<_, _>, _, _| {
                for factor in cluster.factors() {
                    assert!(g
                        .iter()
                        .any(|original| std::sync::Arc::ptr_eq(original.payload(), factor.payload())));
                    found += 1;
                }
            },
        );
        assert_eq!(found, 2);
    }

    #[test]
    fn test_clone_duplicates_structure_and_shares_factors() {
        let tree = build(&[&[3, 2], &[2, 1], &[4, 1], &[5]], &[3, 4, 2, 1]);
        let copy = tree.clone();
        assert_eq!(copy.num_clusters(), tree.num_clusters());
        assert_eq!(copy.to_string(), tree.to_string());
        assert!(std::sync::Arc::ptr_eq(
            copy.roots()[0].factors()[0].payload(),
            tree.roots()[0].factors()[0].payload()
        ));
        assert!(std::sync::Arc::ptr_eq(
            copy.remaining_factors()[0].payload(),
            tree.remaining_factors()[0].payload()
        ));

        let mut assigned = build(&[&[9, 8]], &[9, 8]);
        assigned.clone_from(&tree);
        assert_eq!(assigned.to_string(), tree.to_string());
    }

    #[test]
    fn test_display() {
        let tree = build(&[&[3, 2], &[2, 1]], &[3, 2, 1]);
        assert_eq!(
            tree.to_string(),
            "- k2 k1  problemSize = 2\n  - k3  problemSize = 2\n"
        );
    }
}
