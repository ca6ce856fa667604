//! Property tests over random factor graphs and orderings.
//!
//! The reference for every check is plain graph elimination on adjacency sets:
//! eliminating a key connects all of its remaining neighbours, which are its
//! parents.

use std::collections::{BTreeSet, HashMap};

use jtree_rs::bayes_tree::BayesTree;
use jtree_rs::etree::EliminationTree;
use jtree_rs::factor::GraphFactor;
use jtree_rs::junction::JunctionTree;
use jtree_rs::symbolic::{eliminate_symbolic_factors, SymbolicConditional, SymbolicFactor};
use jtree_rs::types::Key;
use proptest::prelude::*;

type Problem = (Vec<Vec<u64>>, Vec<u64>);

/// Random factors over `0..n`, every key in at least one factor, plus a
/// random full ordering.
fn arb_problem() -> impl Strategy<Value = Problem> {
    (1u64..14).prop_flat_map(|n| {
        let factor = prop::collection::vec(0..n, 1..4).prop_map(|keys| {
            let unique: BTreeSet<u64> = keys.into_iter().collect();
            unique.into_iter().collect::<Vec<u64>>()
        });
        let factors = prop::collection::vec(factor, 0..(2 * n as usize));
        let ordering = Just((0..n).collect::<Vec<u64>>()).prop_shuffle();
        (factors, ordering).prop_map(move |(mut factors, ordering)| {
            factors.extend((0..n).map(|k| vec![k]));
            (factors, ordering)
        })
    })
}

fn reference_parents(factors: &[Vec<u64>], ordering: &[u64]) -> HashMap<u64, BTreeSet<u64>> {
    let mut adjacency: HashMap<u64, BTreeSet<u64>> = HashMap::new();
    for factor in factors {
        for &a in factor {
            let neighbours = adjacency.entry(a).or_default();
            neighbours.extend(factor.iter().copied().filter(|&b| b != a));
        }
    }
    let mut parents = HashMap::new();
    for &v in ordering {
        let neighbours = adjacency.remove(&v).unwrap_or_default();
        for &a in &neighbours {
            if let Some(adjacent) = adjacency.get_mut(&a) {
                adjacent.remove(&v);
                adjacent.extend(neighbours.iter().copied().filter(|&b| b != a));
            }
        }
        parents.insert(v, neighbours);
    }
    parents
}

fn solve(
    (factors, ordering): &Problem,
) -> (
    JunctionTree<SymbolicFactor, SymbolicConditional>,
    BayesTree<SymbolicConditional>,
) {
    let graph: Vec<GraphFactor<SymbolicFactor, SymbolicConditional>> = factors
        .iter()
        .map(|ids| GraphFactor::new(SymbolicFactor::from_ids(ids.iter().copied())))
        .collect();
    let ordering: Vec<Key> = ordering.iter().copied().map(Key::new).collect();
    let etree = EliminationTree::build(&graph, &ordering).unwrap();
    let jtree = JunctionTree::from_elimination_tree(&etree);
    let (bayes_tree, remaining) = jtree.eliminate(eliminate_symbolic_factors).unwrap();
    assert!(remaining.is_empty());
    (jtree, bayes_tree)
}

fn key_set(keys: &[Key]) -> BTreeSet<u64> {
    keys.iter().map(|k| k.id()).collect()
}

proptest! {
    /// Every key is frontal in exactly one clique, which the index points to.
    #[test]
    fn keys_are_partitioned(problem in arb_problem()) {
        let (jtree, tree) = solve(&problem);
        prop_assert_eq!(tree.len(), jtree.num_clusters());

        let mut seen = BTreeSet::new();
        for (id, clique) in tree.iter() {
            for &key in clique.frontals() {
                prop_assert!(seen.insert(key.id()));
                prop_assert_eq!(tree.clique_of(key), Some(id));
            }
        }
        let expected: BTreeSet<u64> = problem.1.iter().copied().collect();
        prop_assert_eq!(seen, expected);
    }

    /// Separators are the parents of a clique's last frontal key and are
    /// contained in the parent clique.
    #[test]
    fn separators_match_graph_elimination(problem in arb_problem()) {
        let (_, tree) = solve(&problem);
        let parents = reference_parents(&problem.0, &problem.1);

        for (id, clique) in tree.iter() {
            let last = clique.frontals().last().unwrap().id();
            prop_assert_eq!(key_set(clique.separator()), parents[&last].clone());

            match clique.parent() {
                Some(parent) => {
                    prop_assert!(tree.children(parent).contains(&id));
                    let parent_keys = key_set(tree.conditional(parent).keys());
                    prop_assert!(key_set(clique.separator()).is_subset(&parent_keys));
                }
                None => prop_assert!(clique.separator().is_empty()),
            }
        }
    }

    /// Keys share a clique exactly when the merge rule holds along the
    /// elimination tree: a key joins its elimination-tree parent iff it has
    /// one more parent than that node.
    #[test]
    fn cliques_follow_merge_rule(problem in arb_problem()) {
        let (_, tree) = solve(&problem);
        let (_, ordering) = &problem;
        let parents = reference_parents(&problem.0, ordering);
        let position: HashMap<u64, usize> =
            ordering.iter().enumerate().map(|(i, &k)| (k, i)).collect();
        let etree_parent = |v: u64| parents[&v].iter().copied().min_by_key(|p| position[p]);

        for &v in ordering {
            let Some(p) = etree_parent(v) else {
                continue;
            };
            let merges = parents[&v].len() == parents[&p].len() + 1;
            let same_clique = tree.clique_of(Key::new(v)) == tree.clique_of(Key::new(p));
            prop_assert_eq!(merges, same_clique, "key {} with parent {}", v, p);
        }
    }

    /// The node's own key comes last among a cluster's keys.
    #[test]
    fn cluster_ends_with_its_highest_key(problem in arb_problem()) {
        let (_, tree) = solve(&problem);
        let position: HashMap<u64, usize> =
            problem.1.iter().enumerate().map(|(i, &k)| (k, i)).collect();
        for (_, clique) in tree.iter() {
            let frontals = clique.frontals();
            let last = frontals.last().unwrap().id();
            prop_assert!(frontals.iter().all(|k| position[&k.id()] <= position[&last]));
        }
    }

    #[test]
    fn problem_size_bounds_clique_size(problem in arb_problem()) {
        let (jtree, tree) = solve(&problem);
        let max_size = tree.stats().max_clique_size;
        prop_assert!(jtree.max_problem_size() <= max_size);
    }
}

#[cfg(feature = "parallel")]
proptest! {
    #[test]
    fn parallel_matches_sequential(problem in arb_problem()) {
        use jtree_rs::eliminate::ParallelConfig;

        let (jtree, sequential) = solve(&problem);
        let config = ParallelConfig { min_problem_size: 1 };
        let (parallel, remaining) = jtree.eliminate_parallel(eliminate_symbolic_factors, &config).unwrap();
        prop_assert!(remaining.is_empty());
        prop_assert_eq!(sequential.to_string(), parallel.to_string());
    }
}
