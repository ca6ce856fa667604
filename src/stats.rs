//! Statistics over a Bayes tree.

use std::fmt;

use num_bigint::BigUint;

use crate::bayes_tree::BayesTree;
use crate::factor::Conditional;
use crate::types::Key;

/// Shape of a Bayes tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeStats {
    pub num_cliques: usize,
    /// Largest number of keys (frontals and separator) in a clique.
    pub max_clique_size: usize,
    pub avg_clique_size: f64,
    pub max_separator_size: usize,
    pub max_frontal_count: usize,
}

impl fmt::Display for TreeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cliques:            {}", self.num_cliques)?;
        writeln!(f, "max clique size:    {}", self.max_clique_size)?;
        writeln!(f, "avg clique size:    {:.2}", self.avg_clique_size)?;
        writeln!(f, "max separator size: {}", self.max_separator_size)?;
        writeln!(f, "max frontals:       {}", self.max_frontal_count)
    }
}

impl<C: Conditional> BayesTree<C> {
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            num_cliques: self.len(),
            ..TreeStats::default()
        };
        let mut total = 0;
        for (_, clique) in self.iter() {
            let conditional = clique.conditional();
            stats.max_clique_size = stats.max_clique_size.max(conditional.size());
            stats.max_separator_size = stats.max_separator_size.max(conditional.nr_parents());
            stats.max_frontal_count = stats.max_frontal_count.max(conditional.nr_frontals());
            total += conditional.size();
        }
        if stats.num_cliques > 0 {
            stats.avg_clique_size = total as f64 / stats.num_cliques as f64;
        }
        stats
    }

    /// Total number of entries of all clique tables of a discrete tree.
    ///
    /// A clique's table has one entry per joint assignment of its keys, so its
    /// size is the product of the keys' `cardinality`.
    pub fn table_size(&self, cardinality: impl Fn(Key) -> u64) -> BigUint {
        let mut total = BigUint::ZERO;
        for (_, clique) in self.iter() {
            let conditional = clique.conditional();
            let size = conditional
                .frontals()
                .iter()
                .chain(conditional.parents())
                .fold(BigUint::from(1u32), |acc, &key| acc * cardinality(key));
            total += size;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use test_log::test;

    use super::*;
    use crate::symbolic::SymbolicConditional;

    fn tree() -> BayesTree<SymbolicConditional> {
        // P(2, 1)
        //   P(3 | 2)
        //   P(4, 5 | 2, 1)
        let mut tree = BayesTree::new();
        let root = tree.push_root(Arc::new(SymbolicConditional::from_ids([2, 1], [])));
        tree.add_clique(Arc::new(SymbolicConditional::from_ids([3], [2])), Some(root));
        tree.add_clique(Arc::new(SymbolicConditional::from_ids([4, 5], [2, 1])), Some(root));
        tree
    }

    #[test]
    fn test_stats() {
        let stats = tree().stats();
        assert_eq!(stats.num_cliques, 3);
        assert_eq!(stats.max_clique_size, 4);
        assert_eq!(stats.max_separator_size, 2);
        assert_eq!(stats.max_frontal_count, 2);
        assert!((stats.avg_clique_size - 8.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_stats_of_empty_tree() {
        let stats = BayesTree::<SymbolicConditional>::new().stats();
        assert_eq!(stats, TreeStats::default());
    }

    #[test]
    fn test_table_size_binary() {
        // 2^2 + 2^2 + 2^4
        assert_eq!(tree().table_size(|_| 2), BigUint::from(24u32));
    }

    #[test]
    fn test_table_size_exceeds_u64() {
        let mut tree = BayesTree::new();
        tree.push_root(Arc::new(SymbolicConditional::from_ids(0..5, [])));
        let expected = BigUint::from(1u64 << 40).pow(5);
        assert_eq!(tree.table_size(|_| 1 << 40), expected);
    }
}
