//! Elimination of a junction tree into a Bayes tree.
//!
//! Clusters are eliminated bottom-up. Each cluster gathers its own factors and
//! the residual factors its children produced, and hands them to a
//! caller-supplied elimination function together with its frontal keys. The
//! function returns a conditional, which becomes a clique of the Bayes tree,
//! and a residual factor over the separator, which is passed up to the parent
//! cluster. Residuals of root clusters end up in the remaining factors.
//!
//! The elimination function is the only place where numbers are involved; the
//! engine itself is agnostic to what factors and conditionals are. Its errors
//! are returned unchanged and abort the whole elimination.
//!
//! # Example
//!
//! ```
//! use jtree_rs::etree::EliminationTree;
//! use jtree_rs::factor::GraphFactor;
//! use jtree_rs::junction::JunctionTree;
//! use jtree_rs::symbolic::{eliminate_symbolic_factors, SymbolicConditional, SymbolicFactor};
//! use jtree_rs::types::Key;
//!
//! let factors: Vec<GraphFactor<SymbolicFactor, SymbolicConditional>> = vec![
//!     GraphFactor::new(SymbolicFactor::from_ids([1, 2])),
//!     GraphFactor::new(SymbolicFactor::from_ids([2, 3])),
//! ];
//! let ordering = [Key::new(1), Key::new(2), Key::new(3)];
//! let etree = EliminationTree::build(&factors, &ordering).unwrap();
//! let jtree = JunctionTree::from_elimination_tree(&etree);
//!
//! let (bayes_tree, remaining) = jtree.eliminate(eliminate_symbolic_factors).unwrap();
//! assert_eq!(bayes_tree.len(), 2);
//! assert!(remaining.is_empty());
//! assert_eq!(bayes_tree.to_string(), "P( k2 k3 )\n  P( k1 | k2 )\n");
//! ```

use std::sync::Arc;

use log::{debug, trace};

use crate::bayes_tree::{BayesTree, CliqueId};
use crate::factor::{Conditional, Factor, GraphFactor};
use crate::junction::{Cluster, JunctionTree};
use crate::traversal::try_depth_first_forest;
use crate::types::Key;

/// Result of eliminating a junction tree: the Bayes tree and every factor no
/// clique consumed.
pub type EliminationResult<F, C> = (BayesTree<C>, Vec<GraphFactor<F, C>>);

/// Per-node data of the elimination traversal.
struct EliminationData<F> {
    /// Slot of this cluster in its parent's collections.
    index_in_parent: usize,
    /// One slot per child: its residual factor, if it left a non-empty one.
    child_factors: Vec<Option<Arc<F>>>,
    /// One slot per child: its clique, once eliminated.
    child_cliques: Vec<Option<CliqueId>>,
}

impl<F> EliminationData<F> {
    fn root() -> Self {
        Self {
            index_in_parent: 0,
            child_factors: Vec::new(),
            child_cliques: Vec::new(),
        }
    }

    /// Reserves a slot for a new child and returns the child's data.
    fn reserve_child(&mut self) -> Self {
        let index_in_parent = self.child_factors.len();
        self.child_factors.push(None);
        self.child_cliques.push(None);
        Self {
            index_in_parent,
            child_factors: Vec::new(),
            child_cliques: Vec::new(),
        }
    }

    fn fill(&mut self, index: usize, clique: CliqueId, residual: Option<Arc<F>>) {
        debug_assert!(self.child_cliques[index].is_none(), "Slot {} written twice", index);
        self.child_cliques[index] = Some(clique);
        self.child_factors[index] = residual;
    }
}

/// Factors handed to the elimination function for `cluster`: its own
/// factors, then the non-empty residuals of its children in child order.
fn gather_factors<F, C>(cluster: &Cluster<F, C>, child_factors: &[Option<Arc<F>>]) -> Vec<Arc<F>> {
    let mut gathered = Vec::with_capacity(cluster.factors.len() + child_factors.len());
    gathered.extend(cluster.factors.iter().map(|f| Arc::clone(f.payload())));
    gathered.extend(child_factors.iter().flatten().cloned());
    gathered
}

/// Records an eliminated cluster in the Bayes tree under construction.
///
/// Children get their parent link, orphans among the cluster's factors are
/// spliced in after the regular children, and the conditional's frontal keys
/// are indexed. Returns the new clique.
fn insert_clique<F, C: Conditional>(
    tree: &mut BayesTree<C>,
    cluster: &Cluster<F, C>,
    conditional: Arc<C>,
    children: Vec<CliqueId>,
) -> CliqueId {
    let id = tree.alloc(conditional, children.clone());
    for child in children {
        tree.set_parent(child, id);
    }

    for orphan in cluster.factors.iter().filter_map(|f| f.as_orphan()) {
        let spliced = tree.graft(orphan.subtree(), orphan.root(), Some(id));
        trace!("splice orphan {} under {}", spliced, id);
    }

    // Only the new clique's own frontals are indexed, never spliced orphans.
    tree.index_frontals(id);
    id
}

/// Non-empty residuals are passed up; empty ones are dropped.
fn non_empty<F: Factor>(residual: F) -> Option<Arc<F>> {
    if residual.is_empty() {
        None
    } else {
        Some(Arc::new(residual))
    }
}

/// Remaining factors: the tree's untouched factors, then root residuals.
fn collect_remaining<F, C>(
    jtree: &JunctionTree<F, C>,
    root_residuals: Vec<Option<Arc<F>>>,
) -> Vec<GraphFactor<F, C>> {
    let mut remaining = Vec::with_capacity(jtree.remaining_factors.len() + root_residuals.len());
    remaining.extend(jtree.remaining_factors.iter().cloned());
    remaining.extend(root_residuals.into_iter().flatten().map(GraphFactor::Factor));
    remaining
}

impl<F: Factor, C: Conditional> JunctionTree<F, C> {
    /// Eliminates every cluster with `function` and assembles the Bayes tree.
    ///
    /// `function(factors, keys)` must eliminate `keys` (in that order) from
    /// `factors` and return the conditional over the keys together with the
    /// residual factor on the separator. An empty residual means nothing is
    /// passed upward.
    ///
    /// Returns the Bayes tree and the remaining factors: those of the
    /// junction tree that involve no eliminated key, followed by the
    /// non-empty residuals of root cliques. Empty root residuals are dropped.
    ///
    /// # Errors
    ///
    /// The first error returned by `function` is returned as is; no partial
    /// Bayes tree is produced.
    pub fn eliminate<E>(
        &self,
        function: impl Fn(&[Arc<F>], &[Key]) -> Result<(C, F), E>,
    ) -> Result<EliminationResult<F, C>, E> {
        debug!("JunctionTree::eliminate(roots = {})", self.roots.len());

        let mut tree = BayesTree::new();
        let mut root = EliminationData::root();

        try_depth_first_forest(
            &self.roots,
            &mut root,
            |_, parent| parent.reserve_child(),
            |cluster, data, parent| {
                let EliminationData {
                    index_in_parent,
                    child_factors,
                    child_cliques,
                } = data;

                let gathered = gather_factors(cluster, &child_factors);
                trace!(
                    "eliminate {:?} from {} factors",
                    cluster.keys,
                    gathered.len()
                );
                let (conditional, residual) = function(&gathered, &cluster.keys)?;

                let children = child_cliques.into_iter().flatten().collect();
                let id = insert_clique(&mut tree, cluster, Arc::new(conditional), children);
                parent.fill(index_in_parent, id, non_empty(residual));
                Ok(())
            },
        )?;

        let roots = root.child_cliques.into_iter().flatten().collect();
        tree.set_roots(roots);
        let remaining = collect_remaining(self, root.child_factors);

        debug!(
            "JunctionTree::eliminate -> {} cliques, {} remaining factors",
            tree.len(),
            remaining.len()
        );
        Ok((tree, remaining))
    }
}

#[cfg(feature = "parallel")]
mod parallel {
    use std::sync::{Arc, Mutex, PoisonError};

    use log::{debug, trace};
    use rayon::prelude::*;

    use super::{collect_remaining, gather_factors, insert_clique, non_empty, EliminationResult};
    use crate::bayes_tree::{BayesTree, CliqueId};
    use crate::factor::{Conditional, Factor};
    use crate::junction::{Cluster, JunctionTree};
    use crate::types::Key;

    /// Settings for [`JunctionTree::eliminate_parallel`].
    #[derive(Debug, Clone)]
    pub struct ParallelConfig {
        /// Children of a cluster are eliminated in parallel only when the
        /// cluster's `problem_size` is at least this large.
        pub min_problem_size: usize,
    }

    impl Default for ParallelConfig {
        fn default() -> Self {
            Self {
                min_problem_size: 10,
            }
        }
    }

    type Eliminated<F> = (CliqueId, Option<Arc<F>>);

    fn eliminate_cluster<F, C, E, Fun>(
        cluster: &Cluster<F, C>,
        function: &Fun,
        config: &ParallelConfig,
        tree: &Mutex<BayesTree<C>>,
    ) -> Result<Eliminated<F>, E>
    where
        F: Factor + Send + Sync,
        C: Conditional + Send + Sync,
        E: Send,
        Fun: Fn(&[Arc<F>], &[Key]) -> Result<(C, F), E> + Sync,
    {
        let children: Vec<Eliminated<F>> = if cluster.problem_size >= config.min_problem_size {
            trace!("fork {} children of {:?}", cluster.children.len(), cluster.keys);
            cluster
                .children
                .par_iter()
                .map(|child| eliminate_cluster(child, function, config, tree))
                .collect::<Result<_, E>>()?
        } else {
            cluster
                .children
                .iter()
                .map(|child| eliminate_cluster(child, function, config, tree))
                .collect::<Result<_, E>>()?
        };

        let (child_cliques, child_factors): (Vec<CliqueId>, Vec<Option<Arc<F>>>) =
            children.into_iter().unzip();
        let gathered = gather_factors(cluster, &child_factors);
        let (conditional, residual) = function(&gathered, &cluster.keys)?;

        let mut tree = tree.lock().unwrap_or_else(PoisonError::into_inner);
        let id = insert_clique(&mut tree, cluster, Arc::new(conditional), child_cliques);
        Ok((id, non_empty(residual)))
    }

    impl<F, C> JunctionTree<F, C>
    where
        F: Factor + Send + Sync,
        C: Conditional + Send + Sync,
    {
        /// Like [`eliminate`][JunctionTree::eliminate], but eliminates
        /// independent subtrees concurrently.
        ///
        /// A cluster's elimination function runs only after all of its
        /// children have finished. For a deterministic `function` the
        /// conditionals and remaining factors are the same as with
        /// [`eliminate`][JunctionTree::eliminate]; clique handles may be
        /// assigned in a different order.
        pub fn eliminate_parallel<E, Fun>(
            &self,
            function: Fun,
            config: &ParallelConfig,
        ) -> Result<EliminationResult<F, C>, E>
        where
            E: Send,
            Fun: Fn(&[Arc<F>], &[Key]) -> Result<(C, F), E> + Sync,
        {
            debug!(
                "JunctionTree::eliminate_parallel(roots = {}, min_problem_size = {})",
                self.roots.len(),
                config.min_problem_size
            );

            let tree = Mutex::new(BayesTree::new());
            let roots: Vec<Eliminated<F>> = self
                .roots
                .par_iter()
                .map(|root| eliminate_cluster(root, &function, config, &tree))
                .collect::<Result<_, E>>()?;

            let (root_cliques, root_residuals): (Vec<CliqueId>, Vec<Option<Arc<F>>>) =
                roots.into_iter().unzip();
            let mut tree = tree.into_inner().unwrap_or_else(PoisonError::into_inner);
            tree.set_roots(root_cliques);
            let remaining = collect_remaining(self, root_residuals);
            Ok((tree, remaining))
        }
    }
}

#[cfg(feature = "parallel")]
pub use parallel::ParallelConfig;
