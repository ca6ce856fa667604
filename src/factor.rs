//! Factor and conditional capability sets.
//!
//! The engine never looks inside a factor or a conditional. All it needs is
//! the set of keys they range over, which is what the [`Factor`] and
//! [`Conditional`] traits expose. Factors are shared by reference ([`Arc`]):
//! the same factor may appear in the source graph, an elimination tree and
//! several junction trees at once, and is never copied or mutated.
//!
//! A factor slot in a graph is a [`GraphFactor`]: either an ordinary factor,
//! or an [`Orphan`], a previously eliminated Bayes-tree subtree that should be
//! reattached without being eliminated again.

use std::fmt;
use std::sync::Arc;

use crate::bayes_tree::{BayesTree, CliqueId};
use crate::types::Key;

/// Anything that ranges over a set of keys.
pub trait Factor {
    /// The keys this factor involves.
    fn keys(&self) -> &[Key];

    /// An empty factor involves no keys and carries nothing worth passing up.
    fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }
}

/// The result of eliminating some frontal keys: a distribution over the
/// frontals conditioned on the parents (the separator).
pub trait Conditional {
    /// Eliminated keys, in elimination order.
    fn frontals(&self) -> &[Key];

    /// Separator keys the frontals are conditioned on.
    fn parents(&self) -> &[Key];

    fn nr_frontals(&self) -> usize {
        self.frontals().len()
    }

    fn nr_parents(&self) -> usize {
        self.parents().len()
    }

    /// Total number of keys (frontals and parents).
    fn size(&self) -> usize {
        self.nr_frontals() + self.nr_parents()
    }
}

impl<T: Factor + ?Sized> Factor for Arc<T> {
    fn keys(&self) -> &[Key] {
        (**self).keys()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }
}

/// A factor slot: an ordinary shared factor or an orphan subtree.
pub enum GraphFactor<F, C> {
    Factor(Arc<F>),
    Orphan(Arc<Orphan<F, C>>),
}

impl<F, C> GraphFactor<F, C> {
    /// Wraps an owned factor.
    pub fn new(factor: F) -> Self {
        GraphFactor::Factor(Arc::new(factor))
    }

    /// The factor handed to an elimination function for this slot.
    ///
    /// For an orphan this is its separator factor.
    pub fn payload(&self) -> &Arc<F> {
        match self {
            GraphFactor::Factor(factor) => factor,
            GraphFactor::Orphan(orphan) => &orphan.separator,
        }
    }

    pub fn as_orphan(&self) -> Option<&Orphan<F, C>> {
        match self {
            GraphFactor::Factor(_) => None,
            GraphFactor::Orphan(orphan) => Some(orphan),
        }
    }

    pub fn is_orphan(&self) -> bool {
        matches!(self, GraphFactor::Orphan(_))
    }
}

impl<F: Factor, C> GraphFactor<F, C> {
    pub fn keys(&self) -> &[Key] {
        self.payload().keys()
    }
}

impl<F, C> Clone for GraphFactor<F, C> {
    fn clone(&self) -> Self {
        match self {
            GraphFactor::Factor(factor) => GraphFactor::Factor(Arc::clone(factor)),
            GraphFactor::Orphan(orphan) => GraphFactor::Orphan(Arc::clone(orphan)),
        }
    }
}

impl<F, C> From<Arc<F>> for GraphFactor<F, C> {
    fn from(factor: Arc<F>) -> Self {
        GraphFactor::Factor(factor)
    }
}

impl<F, C> From<Orphan<F, C>> for GraphFactor<F, C> {
    fn from(orphan: Orphan<F, C>) -> Self {
        GraphFactor::Orphan(Arc::new(orphan))
    }
}

impl<F: fmt::Debug, C: fmt::Debug> fmt::Debug for GraphFactor<F, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphFactor::Factor(factor) => f.debug_tuple("Factor").field(factor).finish(),
            GraphFactor::Orphan(orphan) => f.debug_tuple("Orphan").field(orphan).finish(),
        }
    }
}

/// A previously eliminated subtree, carried as a factor over its separator.
///
/// When the engine meets an orphan among a cluster's factors it splices the
/// subtree in as a child of the new clique, sharing its conditionals, and
/// hands only `separator` to the elimination function.
#[derive(Debug)]
pub struct Orphan<F, C> {
    subtree: BayesTree<C>,
    separator: Arc<F>,
}

impl<F, C> Orphan<F, C> {
    /// Creates an orphan from a detached single-root subtree and the factor
    /// summarising it over its separator keys.
    ///
    /// # Panics
    ///
    /// Panics if `subtree` does not have exactly one root.
    pub fn new(subtree: BayesTree<C>, separator: Arc<F>) -> Self {
        assert_eq!(
            subtree.roots().len(),
            1,
            "Orphan subtree must have exactly one root"
        );
        Self { subtree, separator }
    }

    pub fn subtree(&self) -> &BayesTree<C> {
        &self.subtree
    }

    /// The root clique of the subtree, in the subtree's own arena.
    pub fn root(&self) -> CliqueId {
        self.subtree.roots()[0]
    }

    pub fn separator(&self) -> &Arc<F> {
        &self.separator
    }
}
