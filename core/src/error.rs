//! Error types for the core engine.
//!
//! Follows the shape of `other_examples/.../decision_tree.rs`'s
//! `DecisionTreeError`: unit variants, one `#[error(...)]` message each.
//! Programmer errors (an index derived from `dimension` exceeding it) are
//! not represented here — they panic, as the teacher's own `Cluster` does
//! on invariant violations.

use thiserror::Error;

/// Errors produced by the public [`crate::Tree`] façade.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// `Tree::remove` was asked to remove a point that is not present.
    #[error("no point with the given features and label exists in the tree")]
    NotFound,

    /// The configuration passed to [`crate::Tree::new`] violates one of its
    /// invariants (dimension mismatch, zero max height, malformed kind
    /// vector, ...).
    #[error("invalid tree configuration: {0}")]
    ConfigInvalid(String),
}
