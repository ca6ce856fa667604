//! Error types for jtree-rs.

use thiserror::Error;

use crate::types::Key;

/// Errors raised while building inputs for clique-tree construction.
///
/// Failures of a caller-supplied elimination function are not wrapped here:
/// they are returned to the caller unchanged.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum Error {
    /// The elimination ordering lists the same key more than once.
    #[error("key {0} appears more than once in the ordering")]
    DuplicateKey(Key),

    /// The elimination ordering names a key that no factor mentions.
    #[error("key {0} is not involved in any factor")]
    MissingKey(Key),
}

/// Result type alias for jtree-rs operations.
pub type Result<T> = std::result::Result<T, Error>;
