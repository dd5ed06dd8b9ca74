//! # privacy_pool
//!
//! Key derivation, commitments and the commitment tree behind a
//! privacy-pool wallet.
//!
//! A wallet derives one [`MasterKeys`] pair per account and every note
//! from it, so a seed alone recovers all funds:
//!
//! - **Deposits** are keyed by pool scope and a per-account index
//!   ([`flow::prepare_deposit`]).
//! - **Withdrawals** spend a note and re-deposit the remainder as a change
//!   note keyed by the spent note's label and the next index of that chain
//!   ([`flow::prepare_withdrawal`]).
//!
//! ## Commitments
//!
//! $$\mathsf{pre} = \text{Hash2}(\mathsf{nf}, \mathsf{s})$$
//! $$\mathsf{cm} = \text{Hash3}(v, \mathsf{label}, \mathsf{pre})$$
//!
//! All hashes are circom-compatible Poseidon over the BN254 scalar field,
//! matching the pool contracts and withdrawal circuit.
//!
//! ## Recovery
//!
//! Wallet metadata gets lost. The [`resolver`] recovers a note's chain
//! position from its nullifier alone, and [`reconcile`] tolerates indexers
//! that report tree positions one-based. Both fail closed.
//!
//! ## Out of scope
//!
//! Proving, contract calls and transaction submission. This crate hands the
//! caller a [`tree::MerkleProof`] and a [`ChangeNote`] and stops there.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![expect(clippy::pub_use, reason = "exporting items for consumers")]

pub mod account;
pub mod error;
pub mod flow;
pub mod keys;
pub mod note;
pub mod policy;
pub mod primitives;
pub mod reconcile;
pub mod resolver;
pub mod tree;

pub use account::Account;
pub use error::InvalidInput;
pub use flow::{FlowError, WithdrawalPlan, WithdrawalRequest, prepare_deposit, prepare_withdrawal};
pub use keys::{KeyMaterial, MasterKeys, NoteKeys};
pub use note::{ChangeNote, Commitment, SpentNote, Value};
pub use primitives::{Address, FieldElement};
pub use resolver::{CancellationFlag, Resolution, ResolverConfig};
pub use tree::{MerkleProof, MerkleTree, TREE_DEPTH};
