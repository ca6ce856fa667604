//! Symbolic elimination over key adjacency.
//!
//! Symbolic elimination tracks structure only: eliminating a set of frontal
//! keys from a set of factors yields a conditional whose parents are all the
//! other keys those factors touch, and a residual factor over exactly those
//! parents. The junction tree builder uses it to decide which elimination-tree
//! nodes belong to the same clique.
//!
//! [`eliminate_symbolic_factors`] has the shape of a numeric elimination
//! function, so a [`JunctionTree`][crate::junction::JunctionTree] over
//! [`SymbolicFactor`]s can be eliminated into a purely structural Bayes tree.

use std::collections::HashSet;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use log::trace;

use crate::factor::{Conditional, Factor};
use crate::types::{fmt_keys, Key};

/// A factor that only records which keys it involves.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct SymbolicFactor {
    keys: Vec<Key>,
}

impl SymbolicFactor {
    pub fn new(keys: Vec<Key>) -> Self {
        Self { keys }
    }

    pub fn from_ids(ids: impl IntoIterator<Item = u64>) -> Self {
        Self::new(ids.into_iter().map(Key::new).collect())
    }

    /// Symbolic version of any factor.
    pub fn from_factor(factor: &impl Factor) -> Self {
        Self::new(factor.keys().to_vec())
    }
}

impl Factor for SymbolicFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }
}

impl fmt::Display for SymbolicFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f( ")?;
        fmt_keys(f, &self.keys)?;
        write!(f, " )")
    }
}

/// A conditional that only records its frontal and parent keys.
///
/// Keys are stored frontals first, then parents.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct SymbolicConditional {
    keys: Vec<Key>,
    nr_frontals: usize,
}

impl SymbolicConditional {
    /// # Panics
    ///
    /// Panics if `nr_frontals > keys.len()`.
    pub fn new(keys: Vec<Key>, nr_frontals: usize) -> Self {
        assert!(
            nr_frontals <= keys.len(),
            "Conditional cannot have more frontals ({}) than keys ({})",
            nr_frontals,
            keys.len()
        );
        Self { keys, nr_frontals }
    }

    pub fn from_ids(
        frontals: impl IntoIterator<Item = u64>,
        parents: impl IntoIterator<Item = u64>,
    ) -> Self {
        let mut keys: Vec<Key> = frontals.into_iter().map(Key::new).collect();
        let nr_frontals = keys.len();
        keys.extend(parents.into_iter().map(Key::new));
        Self::new(keys, nr_frontals)
    }

    /// All keys, frontals first.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }
}

impl Conditional for SymbolicConditional {
    fn frontals(&self) -> &[Key] {
        &self.keys[..self.nr_frontals]
    }

    fn parents(&self) -> &[Key] {
        &self.keys[self.nr_frontals..]
    }
}

impl fmt::Display for SymbolicConditional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P( ")?;
        fmt_keys(f, self.frontals())?;
        if self.nr_parents() > 0 {
            write!(f, " | ")?;
            fmt_keys(f, self.parents())?;
        }
        write!(f, " )")
    }
}

/// Symbolically eliminates `ordering` from the factors given by their key sets.
///
/// The conditional's frontals are `ordering`, in order; its parents are every
/// other key of the factors, in order of first appearance. The residual
/// factor ranges over the parents. A frontal key that no factor mentions is
/// still reported as a frontal.
pub fn eliminate_symbolic<'a>(
    factors: impl IntoIterator<Item = &'a [Key]>,
    ordering: &[Key],
) -> (SymbolicConditional, SymbolicFactor) {
    let frontals: HashSet<Key> = ordering.iter().copied().collect();
    debug_assert_eq!(frontals.len(), ordering.len(), "Ordering has duplicate keys");

    let mut seen = HashSet::new();
    let mut parents = Vec::new();
    for keys in factors {
        for &key in keys {
            if !frontals.contains(&key) && seen.insert(key) {
                parents.push(key);
            }
        }
    }
    trace!(
        "eliminate_symbolic(ordering = {:?}) -> {} parents",
        ordering,
        parents.len()
    );

    let mut keys = ordering.to_vec();
    keys.extend_from_slice(&parents);
    (
        SymbolicConditional::new(keys, ordering.len()),
        SymbolicFactor::new(parents),
    )
}

/// Elimination function for symbolic factor graphs.
///
/// Never fails; the error type is [`Infallible`].
pub fn eliminate_symbolic_factors(
    factors: &[Arc<SymbolicFactor>],
    ordering: &[Key],
) -> Result<(SymbolicConditional, SymbolicFactor), Infallible> {
    Ok(eliminate_symbolic(
        factors.iter().map(|f| f.keys()),
        ordering,
    ))
}
