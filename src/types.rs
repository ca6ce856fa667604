///! Type-safe wrapper for variable keys.
///!
///! Keys identify the variables that factors and conditionals range over.
///! They carry no ordering meaning on their own: the elimination order is
///! always supplied separately.
use std::fmt;

/// A variable identifier.
///
/// # Invariants
///
/// - A key is frontal in at most one clique of a Bayes tree.
/// - Keys are independent of their position in an elimination ordering.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Key(u64);

impl Key {
    /// Creates a new key with the given ID.
    pub const fn new(id: u64) -> Self {
        Key(id)
    }

    /// Returns the raw key ID as a `u64`.
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k{}", self.0)
    }
}

impl From<Key> for u64 {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl From<u64> for Key {
    fn from(id: u64) -> Self {
        Key(id)
    }
}

/// Formats a slice of keys as a space-separated list.
pub(crate) fn fmt_keys(f: &mut fmt::Formatter<'_>, keys: &[Key]) -> fmt::Result {
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", key)?;
    }
    Ok(())
}
