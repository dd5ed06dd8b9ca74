//! Deposit and withdrawal preparation.
//!
//! These are the two operations a wallet performs against the pool. Both
//! are pure: they compute what to submit and what to persist, and leave
//! submission, proving and storage to the caller.
//!
//! A withdrawal runs, in order:
//!
//! 1. recipient policy, and the fee cap when relayed,
//! 2. the amount check against the spent note's value,
//! 3. withdrawal index resolution (fails closed when unresolved),
//! 4. change key derivation at the next index under the spent label,
//! 5. leaf reconciliation for the spent commitment,
//! 6. the membership proof and the change commitment.
//!
//! Nothing is returned unless every step succeeds.

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    account::Account,
    error::InvalidInput,
    keys::{Label, NoteKeys, Nullifier, Precommitment, Scope},
    note::{ChangeNote, Commitment, SpentNote, Value},
    policy::{
        PolicyRejection,
        fee::check_fee_cap,
        recipient::{RecipientMode, resolve_recipient},
    },
    primitives::Address,
    reconcile::{self, IndexConvention, ReconcileFailure},
    resolver::{CancellationFlag, Resolution, ScanAborted, resolve},
    tree::{MerkleProof, MerkleTree},
};

/// Why a withdrawal could not be prepared.
#[derive(Clone, Debug, PartialEq, Error)]
#[expect(
    clippy::module_name_repetitions,
    reason = "read as the error of the flows"
)]
pub enum FlowError {
    /// A policy check refused the withdrawal.
    #[error(transparent)]
    Policy(#[from] PolicyRejection),

    /// An argument was malformed or out of range.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    /// No tier could place the spent note in its chain.
    #[error("withdrawal index could not be resolved")]
    Unresolvable,

    /// The caller cancelled index resolution.
    #[error(transparent)]
    Aborted(#[from] ScanAborted),

    /// The reported leaf index does not lead to the spent commitment.
    #[error(transparent)]
    Reconcile(#[from] ReconcileFailure),
}

// =============================================================================
// Deposits
// =============================================================================

/// A prepared deposit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Deposit {
    keys: NoteKeys,
    scope: Scope,
    index: u32,
}

impl Deposit {
    /// The deposit's key triple.
    #[must_use]
    pub const fn keys(&self) -> NoteKeys {
        self.keys
    }

    /// The value handed to the pool with the deposit.
    #[must_use]
    pub const fn precommitment(&self) -> Precommitment {
        self.keys.precommitment()
    }

    /// The deposit's index under its scope.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// The leaf the pool inserts once it assigns `label`.
    #[must_use]
    pub fn commitment(&self, value: Value, label: Label) -> Commitment {
        Commitment::compute(value, label, self.keys.precommitment())
    }

    /// The deposit as a spendable note. It carries no withdrawal index, so
    /// spending it resolves through the deposit scan.
    #[must_use]
    pub fn note(&self, value: Value, label: Label) -> SpentNote {
        SpentNote {
            nullifier: self.keys.nullifier(),
            secret: self.keys.secret(),
            value,
            label,
            scope: self.scope,
            withdrawal_index: None,
        }
    }
}

/// Derive the keys of the account's `index`-th deposit into `scope`.
#[must_use]
pub fn prepare_deposit(account: &Account, scope: Scope, index: u32) -> Deposit {
    let keys = account.deposit_keys(scope, index);
    debug!(index, "prepared deposit");
    Deposit { keys, scope, index }
}

// =============================================================================
// Withdrawals
// =============================================================================

/// Everything needed to withdraw part or all of one note.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct WithdrawalRequest {
    /// The note being spent.
    pub note: SpentNote,

    /// Amount leaving the pool.
    pub amount: Value,

    /// Direct or relayed submission.
    pub mode: RecipientMode,

    /// Explicit recipient text, if the user gave one.
    pub recipient: Option<String>,

    /// Relayer's quoted fee in basis points. Ignored in direct mode.
    pub quoted_fee_bps: f64,

    /// The pool's maximum relay fee in basis points, if it reported one.
    pub onchain_max_fee_bps: Option<f64>,

    /// Tree position of the spent commitment as reported by the indexer.
    pub reported_leaf_index: i64,

    /// Pool asset.
    pub asset: Address,
}

/// A withdrawal ready for proving.
#[derive(Clone, Debug, PartialEq)]
pub struct WithdrawalPlan {
    /// Membership proof of the spent commitment.
    pub proof: MerkleProof,

    /// Nullifier revealed by the withdrawal.
    pub spent_nullifier: Nullifier,

    /// Address paid.
    pub recipient: Address,

    /// Amount leaving the pool.
    pub amount: Value,

    /// How the spent note was placed in its chain.
    pub resolution: Resolution,

    /// How the reported leaf index was read.
    pub convention: IndexConvention,

    /// The note to persist for the remaining value.
    pub change: ChangeNote,
}

/// Prepare a withdrawal of `request.amount` from `request.note`.
///
/// `tree` must mirror the pool's leaves. `cancel` aborts index resolution.
pub fn prepare_withdrawal(
    account: &Account,
    request: &WithdrawalRequest,
    tree: &MerkleTree,
    cancel: &CancellationFlag,
) -> Result<WithdrawalPlan, FlowError> {
    let recipient = resolve_recipient(
        request.mode,
        request.recipient.as_deref(),
        account.connected(),
    )?;
    if request.mode == RecipientMode::Relay {
        check_fee_cap(request.quoted_fee_bps, request.onchain_max_fee_bps)?;
    }

    let note = &request.note;
    if request.amount == Value::default() {
        return Err(InvalidInput::Zero("withdrawal amount").into());
    }
    let remaining = note
        .value
        .checked_sub(request.amount)
        .ok_or(InvalidInput::InsufficientValue {
            amount: request.amount.into(),
            value: note.value.into(),
        })?;

    let resolution = resolve(account.keys(), note, account.resolver(), cancel)?;
    let Some(next) = resolution.next_index() else {
        warn!(source = %resolution.source(), "withdrawal blocked");
        return Err(FlowError::Unresolvable);
    };
    let change_keys = account.withdrawal_keys(note.label, next);

    let position = reconcile::locate(
        request.reported_leaf_index,
        tree.leaves(),
        note.commitment(),
    )?;
    let proof = tree.proof(position.index)?;

    let change = ChangeNote {
        nullifier: change_keys.nullifier(),
        secret: change_keys.secret(),
        value: remaining,
        label: note.label,
        withdrawal_index: next,
        leaf_index: None,
        commitment: Commitment::compute(remaining, note.label, change_keys.precommitment()),
        asset: request.asset,
    };
    debug!(
        source = %resolution.source(),
        next,
        convention = %position.convention,
        leaf = position.index,
        "prepared withdrawal"
    );
    Ok(WithdrawalPlan {
        proof,
        spent_nullifier: note.nullifier,
        recipient,
        amount: request.amount,
        resolution,
        convention: position.convention,
        change,
    })
}
