//! Pool notes and note commitments.
//!
//! A note is a `(value, label, precommitment)` triple. Its commitment is the
//! public Merkle leaf that the pool stores:
//!
//! $$\mathsf{cm} = \text{Hash3}(v, \mathsf{label}, \mathsf{pre})$$
//!
//! ## Change Note Record
//!
//! | Field | Type | Description |
//! | ----- | ---- | ----------- |
//! | `nullifier` | [`Nullifier`] | Revealed when the note is spent |
//! | `secret` | [`Secret`] | Private half of the precommitment |
//! | `value` | [`Value`] | Remaining balance |
//! | `label` | [`Label`] | Chain label, carried from the spent note |
//! | `withdrawal_index` | `u32` | Position in the label's withdrawal chain |
//! | `leaf_index` | `Option<u64>` | Tree position once the pool inserts it |
//! | `commitment` | [`Commitment`] | The leaf value |
//! | `asset` | [`Address`] | Pool asset |
//!
//! Field elements and the value serialize as decimal strings so the record
//! survives JSON without precision loss.

use core::{fmt, str::FromStr};

use crate::{
    error::InvalidInput,
    keys::{Label, NoteKeys, Nullifier, Precommitment, Scope, Secret},
    primitives::{Address, FieldElement, hash3},
    resolver::RawWithdrawalIndex,
};

/// A pool amount in the asset's smallest unit.
///
/// Always an exact integer below $2^{128}$, so every value is a field
/// element without reduction. Text input must be plain decimal digits.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "String", try_from = "String"))]
pub struct Value(u128);

impl Value {
    /// `self - other`, or `None` if `other` is larger.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(rest) => Some(Self(rest)),
            None => None,
        }
    }
}

impl From<u128> for Value {
    fn from(amount: u128) -> Self {
        Self(amount)
    }
}

impl From<Value> for u128 {
    fn from(value: Value) -> Self {
        value.0
    }
}

impl From<Value> for FieldElement {
    fn from(value: Value) -> Self {
        Self::from(value.0)
    }
}

impl FromStr for Value {
    type Err = InvalidInput;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(InvalidInput::Empty("value"));
        }
        if !trimmed.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(InvalidInput::Malformed {
                what: "value",
                input: trimmed.to_owned(),
            });
        }
        trimmed
            .parse::<u128>()
            .map(Self)
            .map_err(|_err| InvalidInput::Malformed {
                what: "value",
                input: trimmed.to_owned(),
            })
    }
}

impl TryFrom<String> for Value {
    type Error = InvalidInput;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<Value> for String {
    fn from(value: Value) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, fmtr: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmtr, "{}", self.0)
    }
}

/// A note commitment: the leaf stored in the pool's Merkle tree.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Commitment(FieldElement);

impl Commitment {
    /// $\text{Hash3}(v, \mathsf{label}, \mathsf{pre})$.
    #[must_use]
    pub fn compute(value: Value, label: Label, precommitment: Precommitment) -> Self {
        Self(hash3(value.into(), label.into(), precommitment.into()))
    }

    /// Whether a retrieved leaf is this commitment. A zero leaf never
    /// matches.
    #[must_use]
    pub fn matches(&self, leaf: FieldElement) -> bool {
        !leaf.is_zero() && leaf == self.0
    }
}

impl From<Commitment> for FieldElement {
    fn from(cm: Commitment) -> Self {
        cm.0
    }
}

/// The note left over after a partial withdrawal, in the form a wallet
/// persists it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ChangeNote {
    /// Nullifier of the change note.
    pub nullifier: Nullifier,

    /// Secret of the change note.
    pub secret: Secret,

    /// Remaining value.
    pub value: Value,

    /// Chain label, identical to the spent note's.
    pub label: Label,

    /// Index the change keys were derived at.
    pub withdrawal_index: u32,

    /// Position in the pool tree, unknown until the pool inserts the note.
    pub leaf_index: Option<u64>,

    /// The change commitment.
    pub commitment: Commitment,

    /// Pool asset.
    pub asset: Address,
}

impl ChangeNote {
    /// The note's key triple.
    #[must_use]
    pub fn keys(&self) -> NoteKeys {
        NoteKeys::from_secrets(self.nullifier, self.secret)
    }

    /// Whether the stored commitment agrees with the stored secrets.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        Commitment::compute(self.value, self.label, self.keys().precommitment()) == self.commitment
    }

    /// This note as the input of its pool's next withdrawal.
    #[must_use]
    pub fn into_spent(self, scope: Scope) -> SpentNote {
        SpentNote {
            nullifier: self.nullifier,
            secret: self.secret,
            value: self.value,
            label: self.label,
            scope,
            withdrawal_index: Some(RawWithdrawalIndex::from(self.withdrawal_index)),
        }
    }
}

/// A note about to be spent, as loaded from wallet storage.
///
/// `withdrawal_index` is whatever the wallet persisted, possibly nothing;
/// [`resolve`](crate::resolver::resolve) decides what it is worth.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SpentNote {
    /// Nullifier of the note.
    pub nullifier: Nullifier,

    /// Secret of the note.
    pub secret: Secret,

    /// Value held by the note.
    pub value: Value,

    /// Chain label.
    pub label: Label,

    /// Scope of the pool holding the note.
    pub scope: Scope,

    /// Stored withdrawal index, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub withdrawal_index: Option<RawWithdrawalIndex>,
}

impl SpentNote {
    /// The note's key triple.
    #[must_use]
    pub fn keys(&self) -> NoteKeys {
        NoteKeys::from_secrets(self.nullifier, self.secret)
    }

    /// The commitment this note must appear as in the tree.
    #[must_use]
    pub fn commitment(&self) -> Commitment {
        Commitment::compute(self.value, self.label, self.keys().precommitment())
    }
}
