//! Append-only Merkle accumulator mirroring the pool's commitment tree.
//!
//! Nodes are combined with [`hash2`]. A level with an odd number of nodes
//! promotes its last node unchanged instead of pairing it with a zero
//! default, so the tree is only as deep as its leaf count requires:
//!
//! ```text
//!            r
//!          /   \
//!       h01     c          (c promoted)
//!      /   \    |
//!     a     b   c
//! ```
//!
//! Exported proofs are padded with zero siblings to [`TREE_DEPTH`]; a zero
//! sibling tells the verifier to pass the node up unchanged.

use tracing::{debug, trace};

use crate::{
    error::InvalidInput,
    primitives::{FieldElement, hash2},
};

/// Sibling count of every exported proof.
pub const TREE_DEPTH: usize = 32;

/// Largest number of leaves the tree accepts.
pub const MAX_LEAVES: u64 = 1 << TREE_DEPTH;

/// Parent level: adjacent pairs hashed, an unpaired last node promoted.
fn parent_level(row: &[FieldElement]) -> Vec<FieldElement> {
    row.chunks(2)
        .filter_map(|pair| {
            let left = pair.first()?;
            Some(pair.get(1).map_or(*left, |right| hash2(*left, *right)))
        })
        .collect()
}

/// The local mirror of the pool's commitment tree.
///
/// `levels[0]` holds the leaves in insertion order and each following level
/// the parents of the one below; the last level holds only the root. An
/// empty tree has no levels, root zero and depth zero.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[expect(
    clippy::module_name_repetitions,
    reason = "MerkleTree is the established name"
)]
pub struct MerkleTree {
    levels: Vec<Vec<FieldElement>>,
}

impl MerkleTree {
    /// An empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self { levels: Vec::new() }
    }

    /// Build a tree over `leaves` in one pass.
    pub fn from_leaves(leaves: &[FieldElement]) -> Result<Self, InvalidInput> {
        check_capacity(leaves.len())?;
        if leaves.iter().any(FieldElement::is_zero) {
            return Err(InvalidInput::Zero("leaf"));
        }
        let mut levels = Vec::new();
        if !leaves.is_empty() {
            levels.push(leaves.to_vec());
        }
        while let Some(top) = levels.last().filter(|top| top.len() > 1) {
            let parent = parent_level(top);
            levels.push(parent);
        }
        debug!(leaves = leaves.len(), depth = levels.len().saturating_sub(1), "built tree");
        Ok(Self { levels })
    }

    /// Append one leaf and return its position.
    ///
    /// Only the right edge of each level is rehashed.
    pub fn insert(&mut self, leaf: FieldElement) -> Result<usize, InvalidInput> {
        if leaf.is_zero() {
            return Err(InvalidInput::Zero("leaf"));
        }
        let index = self.len();
        check_capacity(index + 1)?;

        let mut node = leaf;
        let mut position = index;
        let mut level = 0usize;
        loop {
            if self.levels.len() == level {
                self.levels.push(Vec::new());
            }
            let Some(row) = self.levels.get_mut(level) else {
                break;
            };
            row.truncate(position);
            row.push(node);
            if row.len() == 1 {
                break;
            }
            if position & 1 == 1 {
                node = row
                    .get(position - 1)
                    .map_or(node, |left| hash2(*left, node));
            }
            position >>= 1u32;
            level += 1;
        }
        trace!(index, "inserted leaf");
        Ok(index)
    }

    /// Append leaves in order. Nothing is inserted if any leaf is invalid.
    pub fn insert_many(&mut self, leaves: &[FieldElement]) -> Result<(), InvalidInput> {
        check_capacity(self.len() + leaves.len())?;
        if leaves.iter().any(FieldElement::is_zero) {
            return Err(InvalidInput::Zero("leaf"));
        }
        for leaf in leaves {
            self.insert(*leaf)?;
        }
        Ok(())
    }

    /// The leaves in insertion order.
    #[must_use]
    pub fn leaves(&self) -> &[FieldElement] {
        self.levels.first().map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of leaves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.leaves().len()
    }

    /// Whether the tree has no leaves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Levels above the leaves.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// The root, or zero for an empty tree.
    #[must_use]
    pub fn root(&self) -> FieldElement {
        self.levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or_default()
    }

    /// Position of the first leaf equal to `leaf`.
    #[must_use]
    pub fn index_of(&self, leaf: FieldElement) -> Option<usize> {
        self.leaves().iter().position(|node| *node == leaf)
    }

    /// Membership proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Result<MerkleProof, InvalidInput> {
        let leaf = *self.leaves().get(index).ok_or(InvalidInput::LeafIndex {
            index,
            len: self.len(),
        })?;
        let mut siblings = [FieldElement::zero(); TREE_DEPTH];
        let mut position = index;
        for (slot, row) in siblings.iter_mut().zip(self.levels.iter().take(self.depth())) {
            *slot = row.get(position ^ 1).copied().unwrap_or_default();
            position >>= 1u32;
        }
        debug!(index, depth = self.depth(), "built merkle proof");
        Ok(MerkleProof {
            leaf,
            index,
            siblings,
        })
    }
}

fn check_capacity(len: usize) -> Result<(), InvalidInput> {
    match u64::try_from(len) {
        Ok(count) if count <= MAX_LEAVES => Ok(()),
        Ok(_) | Err(_) => Err(InvalidInput::TreeFull),
    }
}

/// A leaf, its position and [`TREE_DEPTH`] siblings, bottom level first.
///
/// This is the shape the withdrawal circuit consumes.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MerkleProof {
    leaf: FieldElement,
    index: usize,
    siblings: [FieldElement; TREE_DEPTH],
}

impl MerkleProof {
    /// The proven leaf.
    #[must_use]
    pub const fn leaf(&self) -> FieldElement {
        self.leaf
    }

    /// The leaf position; bit `i` orders the pair at level `i`.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Siblings from the leaf level upward, zero-padded.
    #[must_use]
    pub const fn siblings(&self) -> &[FieldElement; TREE_DEPTH] {
        &self.siblings
    }

    /// Recompute the root from the leaf and siblings.
    #[must_use]
    pub fn compute_root(&self) -> FieldElement {
        self.siblings
            .iter()
            .enumerate()
            .fold(self.leaf, |node, (level, sibling)| {
                if sibling.is_zero() {
                    node
                } else if (self.index >> level) & 1 == 1 {
                    hash2(*sibling, node)
                } else {
                    hash2(node, *sibling)
                }
            })
    }

    /// Whether the proof recomputes to `root`.
    #[must_use]
    pub fn verify(&self, root: FieldElement) -> bool {
        self.compute_root() == root
    }
}
