//! Leaf-index reconciliation.
//!
//! Indexers and relayers do not agree on whether tree positions start at
//! zero or one. Given the position a source reported for a commitment, the
//! local leaves decide which reading is right:
//!
//! 1. the leaf at `reported` is the commitment: zero-based,
//! 2. otherwise, if `reported > 0`, the leaf at `reported - 1` is the
//!    commitment: one-based,
//! 3. otherwise the position is rejected.
//!
//! An exact match always beats the fallback, and a zero leaf never matches.
//! A reported slot past the local leaves that the fallback does not explain
//! is out of range: the local mirror is behind, not the note unspendable.

use core::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use crate::{note::Commitment, primitives::FieldElement};

/// How the reported index had to be read.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IndexConvention {
    /// The reported index was the leaf's position.
    ZeroBased,
    /// The reported index was one past the leaf's position.
    OneBasedFallback,
}

impl IndexConvention {
    /// Stable code for logs and callers.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ZeroBased => "0-based",
            Self::OneBasedFallback => "1-based-fallback",
        }
    }
}

impl fmt::Display for IndexConvention {
    fn fmt(&self, fmtr: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmtr.write_str(self.code())
    }
}

/// A located leaf.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LeafPosition {
    /// Position in the local leaves.
    pub index: usize,
    /// Reading of the reported index that produced `index`.
    pub convention: IndexConvention,
}

/// Why a reported index could not be reconciled.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
#[expect(
    clippy::module_name_repetitions,
    reason = "named for the failure it describes"
)]
pub enum ReconcileFailure {
    /// Negative, or past the local leaves without a fallback match.
    #[error("reported leaf index {reported} is outside the {len} local leaves")]
    OutOfRange {
        /// The reported index.
        reported: i64,
        /// Number of local leaves.
        len: usize,
    },

    /// The reported slot holds zero.
    #[error("leaf {index} is empty")]
    EmptyLeaf {
        /// The reported slot.
        index: usize,
    },

    /// The reported slot holds another commitment.
    #[error("leaf {index} does not hold the expected commitment")]
    CommitmentMismatch {
        /// The reported slot.
        index: usize,
    },
}

impl ReconcileFailure {
    /// Stable code for logs and callers.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match *self {
            Self::OutOfRange { .. } => "out-of-range",
            Self::EmptyLeaf { .. } => "empty-leaf",
            Self::CommitmentMismatch { .. } => "commitment-mismatch",
        }
    }
}

/// Find `expected` at or just before the reported position.
///
/// On failure only the reported slot is classified. When it lies past the
/// local leaves the failure is [`ReconcileFailure::OutOfRange`].
pub fn locate(
    reported: i64,
    leaves: &[FieldElement],
    expected: Commitment,
) -> Result<LeafPosition, ReconcileFailure> {
    let out_of_range = ReconcileFailure::OutOfRange {
        reported,
        len: leaves.len(),
    };
    let Ok(slot) = usize::try_from(reported) else {
        warn!(reported, "negative leaf index");
        return Err(out_of_range);
    };

    let exact = leaves.get(slot).map(|leaf| (slot, *leaf));
    if exact.is_some_and(|(_, leaf)| expected.matches(leaf)) {
        debug!(index = slot, convention = %IndexConvention::ZeroBased, "leaf located");
        return Ok(LeafPosition {
            index: slot,
            convention: IndexConvention::ZeroBased,
        });
    }

    let fallback = slot
        .checked_sub(1)
        .and_then(|prev| leaves.get(prev).map(|leaf| (prev, *leaf)));
    if let Some((index, _)) = fallback.filter(|&(_, leaf)| expected.matches(leaf)) {
        debug!(reported, index, convention = %IndexConvention::OneBasedFallback, "leaf located");
        return Ok(LeafPosition {
            index,
            convention: IndexConvention::OneBasedFallback,
        });
    }

    let failure = match exact {
        None => out_of_range,
        Some((index, leaf)) if leaf.is_zero() => ReconcileFailure::EmptyLeaf { index },
        Some((index, _)) => ReconcileFailure::CommitmentMismatch { index },
    };
    warn!(reported, reason = failure.code(), "leaf index not reconciled");
    Err(failure)
}
