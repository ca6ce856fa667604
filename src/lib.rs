//! # jtree-rs: Junction Trees in Rust
//!
//! **`jtree-rs`** turns a factor graph and an elimination ordering into a **Bayes tree**:
//! a tree of conditionals obtained by eliminating variables clique by clique.
//! It is the structural core of sparse inference: the numeric work is delegated to a
//! user-supplied elimination function, while this crate takes care of the trees.
//!
//! ## Pipeline
//!
//! 1. **Elimination tree** ([`etree`]): one node per variable, built from the factors and the ordering.
//! 2. **Junction tree** ([`junction`]): nodes are merged into clusters whenever a child's
//!    separator is exactly its parent's separator plus the parent's own variable.
//! 3. **Elimination** ([`eliminate`]): clusters are eliminated bottom-up with the elimination
//!    function, producing one clique per cluster in a [`BayesTree`][crate::bayes_tree::BayesTree],
//!    plus the factors left over.
//!
//! Factors are shared between the stages through [`Arc`][std::sync::Arc], never copied.
//! Previously eliminated subtrees can be fed back in as [orphans][crate::factor::Orphan]
//! and are spliced into the new tree as they are.
//!
//! ## Basic Usage
//!
//! ```rust
//! use jtree_rs::etree::EliminationTree;
//! use jtree_rs::factor::GraphFactor;
//! use jtree_rs::junction::JunctionTree;
//! use jtree_rs::symbolic::{eliminate_symbolic_factors, SymbolicConditional, SymbolicFactor};
//! use jtree_rs::types::Key;
//!
//! // 1. A chain x1 - x2 - x3 - x4
//! let factors: Vec<GraphFactor<SymbolicFactor, SymbolicConditional>> = [[1, 2], [2, 3], [3, 4]]
//!     .into_iter()
//!     .map(|ids| GraphFactor::new(SymbolicFactor::from_ids(ids)))
//!     .collect();
//! let ordering: Vec<Key> = (1..=4).map(Key::new).collect();
//!
//! // 2. Build the trees
//! let etree = EliminationTree::build(&factors, &ordering).unwrap();
//! let jtree = JunctionTree::from_elimination_tree(&etree);
//! assert_eq!(jtree.num_clusters(), 3);
//!
//! // 3. Eliminate (symbolically, here)
//! let (bayes_tree, remaining) = jtree.eliminate(eliminate_symbolic_factors).unwrap();
//! assert!(remaining.is_empty());
//! assert_eq!(bayes_tree.len(), 3);
//! assert_eq!(bayes_tree.stats().max_clique_size, 2);
//! ```
//!
//! ## Core Components
//!
//! - **[`junction`]**: The clique-tree builder.
//! - **[`eliminate`]**: The elimination engine (sequential, and parallel with the `parallel` feature).
//! - **[`bayes_tree`]**: The resulting tree of cliques with its key index.
//! - **[`symbolic`]**: Key-set-only factors and conditionals, used by the builder itself.

pub mod bayes_tree;
pub mod eliminate;
pub mod error;
pub mod etree;
pub mod factor;
pub mod junction;
pub mod stats;
pub mod symbolic;
pub mod traversal;
pub mod types;
