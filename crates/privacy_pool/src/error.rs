//! Input validation errors shared across the crate.
//!
//! Every public entry point validates its arguments before computing
//! anything: a malformed argument yields [`InvalidInput`] and no partial
//! state. Domain-specific failures (policy rejections, reconciliation
//! failures, aborted scans) live beside the code that produces them.

use thiserror::Error;

/// A malformed, empty or out-of-range argument.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum InvalidInput {
    /// A required value was empty.
    #[error("{0} is empty")]
    Empty(&'static str),

    /// Text that does not parse as the expected number or address.
    #[error("{what} is malformed: `{input}`")]
    Malformed {
        /// What was being parsed.
        what: &'static str,
        /// The rejected text.
        input: String,
    },

    /// An integer at or above the BN254 scalar field modulus.
    #[error("{0} is not below the field modulus")]
    OutOfField(&'static str),

    /// Zero where a non-zero field element is required (Merkle leaves).
    #[error("{0} must be non-zero")]
    Zero(&'static str),

    /// HD key material whose binary64 rounding overflows to infinity.
    #[error("key material exceeds the binary64 range")]
    KeyOverflow,

    /// A leaf position outside the tree.
    #[error("leaf index {index} outside a tree of {len} leaves")]
    LeafIndex {
        /// Requested position.
        index: usize,
        /// Number of leaves in the tree.
        len: usize,
    },

    /// The tree already holds `2^32` leaves.
    #[error("tree already holds the maximum of 2^32 leaves")]
    TreeFull,

    /// A scan bound outside `1..=max`.
    #[error("scan bound {requested} outside 1..={max}")]
    ScanBound {
        /// The configured bound.
        requested: u32,
        /// The largest accepted bound.
        max: u32,
    },

    /// A withdrawal larger than the value of the note it spends.
    #[error("withdrawal of {amount} exceeds note value {value}")]
    InsufficientValue {
        /// Requested withdrawal amount.
        amount: u128,
        /// Value held by the spent note.
        value: u128,
    },
}
