//! Bayes trees: trees of conditionals produced by eliminating a junction tree.
//!
//! Cliques live in an arena owned by the [`BayesTree`] and are referred to by
//! lightweight [`CliqueId`] handles. A clique's `children` list is the owning
//! direction of the tree; its `parent` handle is only used to walk upward.
//! Conditionals are shared ([`Arc`]), so copying a subtree into another tree
//! never duplicates or recomputes them.
//!
//! The tree also keeps an index from every frontal key to the clique that
//! eliminates it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::factor::Conditional;
use crate::types::{fmt_keys, Key};

/// Handle of a clique inside a [`BayesTree`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CliqueId(u32);

impl CliqueId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Position of the clique in the arena.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CliqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A clique of a Bayes tree.
#[derive(Debug)]
pub struct Clique<C> {
    conditional: Arc<C>,
    parent: Option<CliqueId>,
    children: Vec<CliqueId>,
}

impl<C> Clique<C> {
    pub fn conditional(&self) -> &Arc<C> {
        &self.conditional
    }

    /// The enclosing clique, or `None` for a root.
    pub fn parent(&self) -> Option<CliqueId> {
        self.parent
    }

    pub fn children(&self) -> &[CliqueId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl<C: Conditional> Clique<C> {
    pub fn frontals(&self) -> &[Key] {
        self.conditional.frontals()
    }

    /// Separator keys: the parents of the clique's conditional.
    pub fn separator(&self) -> &[Key] {
        self.conditional.parents()
    }
}

impl<C> Clone for Clique<C> {
    fn clone(&self) -> Self {
        Self {
            conditional: Arc::clone(&self.conditional),
            parent: self.parent,
            children: self.children.clone(),
        }
    }
}

/// A forest of cliques of conditionals.
#[derive(Debug)]
pub struct BayesTree<C> {
    cliques: Vec<Clique<C>>,
    roots: Vec<CliqueId>,
    nodes: HashMap<Key, CliqueId>,
}

impl<C> Default for BayesTree<C> {
    fn default() -> Self {
        Self {
            cliques: Vec::new(),
            roots: Vec::new(),
            nodes: HashMap::new(),
        }
    }
}

impl<C> Clone for BayesTree<C> {
    fn clone(&self) -> Self {
        Self {
            cliques: self.cliques.clone(),
            roots: self.roots.clone(),
            nodes: self.nodes.clone(),
        }
    }
}

impl<C> BayesTree<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roots(&self) -> &[CliqueId] {
        &self.roots
    }

    /// Number of cliques.
    pub fn len(&self) -> usize {
        self.cliques.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cliques.is_empty()
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    pub fn clique(&self, id: CliqueId) -> &Clique<C> {
        &self.cliques[id.index()]
    }

    pub fn get(&self, id: CliqueId) -> Option<&Clique<C>> {
        self.cliques.get(id.index())
    }

    pub fn parent(&self, id: CliqueId) -> Option<CliqueId> {
        self.clique(id).parent
    }

    pub fn children(&self, id: CliqueId) -> &[CliqueId] {
        &self.clique(id).children
    }

    pub fn conditional(&self, id: CliqueId) -> &Arc<C> {
        &self.clique(id).conditional
    }

    /// The clique in which `key` is a frontal variable.
    pub fn clique_of(&self, key: Key) -> Option<CliqueId> {
        self.nodes.get(&key).copied()
    }

    /// The key-to-clique index.
    pub fn index(&self) -> &HashMap<Key, CliqueId> {
        &self.nodes
    }

    /// All cliques with their handles, in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (CliqueId, &Clique<C>)> + '_ {
        self.cliques
            .iter()
            .enumerate()
            .map(|(i, clique)| (CliqueId(i as u32), clique))
    }

    /// Cliques of the subtree rooted at `id`, in pre-order.
    pub fn descendants(&self, id: CliqueId) -> Vec<CliqueId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        order
    }

    /// Depth of a clique; roots have depth 0.
    pub fn depth(&self, id: CliqueId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Appends a clique without touching the key index or any parent links.
    pub(crate) fn alloc(&mut self, conditional: Arc<C>, children: Vec<CliqueId>) -> CliqueId {
        assert!(self.cliques.len() < u32::MAX as usize, "Too many cliques");
        let id = CliqueId(self.cliques.len() as u32);
        self.cliques.push(Clique {
            conditional,
            parent: None,
            children,
        });
        id
    }

    /// Sets the parent link of `child`, which must not have one yet.
    pub(crate) fn set_parent(&mut self, child: CliqueId, parent: CliqueId) {
        let clique = &mut self.cliques[child.index()];
        debug_assert!(
            clique.parent.is_none(),
            "Clique {} already has parent {:?}",
            child,
            clique.parent
        );
        clique.parent = Some(parent);
    }

    pub(crate) fn set_roots(&mut self, roots: Vec<CliqueId>) {
        self.roots = roots;
    }

    /// Copies the subtree rooted at `root` of `other` into this tree, under
    /// `parent`. Conditionals are shared, not copied. The key index is not
    /// updated. Returns the handle of the copied root.
    pub(crate) fn graft(&mut self, other: &BayesTree<C>, root: CliqueId, parent: Option<CliqueId>) -> CliqueId {
        let order = other.descendants(root);
        let mut mapping = HashMap::with_capacity(order.len());
        // Post-order: children are allocated before the clique listing them.
        for &old in order.iter().rev() {
            let children: Vec<CliqueId> = other.children(old).iter().map(|c| mapping[c]).collect();
            let new = self.alloc(Arc::clone(other.conditional(old)), children.clone());
            for child in children {
                self.set_parent(child, new);
            }
            mapping.insert(old, new);
        }
        let new_root = mapping[&root];
        if let Some(parent) = parent {
            self.set_parent(new_root, parent);
            self.cliques[parent.index()].children.push(new_root);
        }
        new_root
    }
}

impl<C: Conditional> BayesTree<C> {
    /// Adds a clique under `parent` (or as a new root) and indexes its
    /// frontal keys.
    ///
    /// # Panics
    ///
    /// Panics if one of the frontal keys already belongs to another clique.
    pub fn add_clique(&mut self, conditional: Arc<C>, parent: Option<CliqueId>) -> CliqueId {
        let id = self.alloc(conditional, Vec::new());
        match parent {
            Some(parent) => {
                self.set_parent(id, parent);
                self.cliques[parent.index()].children.push(id);
            }
            None => self.roots.push(id),
        }
        self.index_frontals(id);
        id
    }

    /// Adds a root clique. See [`add_clique`][Self::add_clique].
    pub fn push_root(&mut self, conditional: Arc<C>) -> CliqueId {
        self.add_clique(conditional, None)
    }

    pub(crate) fn index_frontals(&mut self, id: CliqueId) {
        let frontals = self.cliques[id.index()].conditional.frontals();
        for &key in frontals {
            let previous = self.nodes.insert(key, id);
            assert!(
                previous.is_none() || previous == Some(id),
                "Key {} is frontal in more than one clique",
                key
            );
        }
    }

    /// A detached copy of the subtree rooted at `id`.
    ///
    /// The copy has a single root, its own arena and key index, and shares
    /// every conditional with this tree. This is how orphans are cut out of an
    /// existing tree before being spliced into a new one.
    pub fn subtree(&self, id: CliqueId) -> BayesTree<C> {
        let mut tree = BayesTree::new();
        let root = tree.graft(self, id, None);
        tree.roots.push(root);
        for i in 0..tree.cliques.len() {
            tree.index_frontals(CliqueId(i as u32));
        }
        tree
    }
}

impl<C: Conditional> fmt::Display for BayesTree<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Pre-order, with each clique's depth carried on the stack.
        let mut stack: Vec<(CliqueId, usize)> = self.roots.iter().rev().map(|&root| (root, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            let clique = self.clique(id);
            stack.extend(clique.children.iter().rev().map(|&child| (child, depth + 1)));
            write!(f, "{:indent$}P( ", "", indent = 2 * depth)?;
            fmt_keys(f, clique.frontals())?;
            if !clique.separator().is_empty() {
                write!(f, " | ")?;
                fmt_keys(f, clique.separator())?;
            }
            writeln!(f, " )")?;
        }
        Ok(())
    }
}
