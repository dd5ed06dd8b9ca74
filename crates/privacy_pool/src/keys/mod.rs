//! ## Key Hierarchy
//!
//! Every note an account ever owns is derived from one master pair, so a
//! wallet can always recover its notes from the seed alone.
//!
//! ```mermaid
//! flowchart TB
//!     hd["HD key material (account 0, account 1)"]
//!     mk["MasterKeys (master_nullifier, master_secret)"]
//!     dep["deposit NoteKeys (scope, index)"]
//!     wd["withdrawal NoteKeys (label, index)"]
//!     hd -- "round to binary64, Hash1" --> mk
//!     mk --> dep & wd
//! ```
//!
//! ### Master keys ([`MasterKeys`])
//!
//! $$\mathsf{master}_{nf} = \text{Hash1}(\text{round}_{64}(k_0))$$
//! $$\mathsf{master}_{s} = \text{Hash1}(\text{round}_{64}(k_1))$$
//!
//! ### Note keys ([`NoteKeys`])
//!
//! For a context $c$ (a [`Scope`] for deposits, a [`Label`] for change
//! notes) and index $i$:
//!
//! $$\mathsf{nf} = \text{Hash3}(\mathsf{master}_{nf}, c, i)$$
//! $$\mathsf{s} = \text{Hash3}(\mathsf{master}_{s}, c, i)$$
//! $$\mathsf{pre} = \text{Hash2}(\mathsf{nf}, \mathsf{s})$$
//!
//! Deposit and withdrawal keys share one derivation. The two keyspaces
//! stay apart only while no scope value equals a label value; no
//! structural tag separates them.

mod master;
mod note;

pub use master::{KeyMaterial, MasterKeys};
pub use note::{
    Label, NoteKeys, Nullifier, Precommitment, Scope, Secret, deposit_nullifier, derive_deposit,
    derive_withdrawal, withdrawal_nullifier,
};
