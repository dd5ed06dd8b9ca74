use core::fmt;

use super::MasterKeys;
use crate::primitives::{FieldElement, hash2, hash3};

// =============================================================================
// Derivation contexts
// =============================================================================

/// Pool scope: domain separation for deposit notes.
///
/// Identifies the pool a deposit is made into. Deposit keys are derived
/// under `(scope, index)`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Scope(FieldElement);

impl From<FieldElement> for Scope {
    fn from(fe: FieldElement) -> Self {
        Self(fe)
    }
}

impl From<Scope> for FieldElement {
    fn from(scope: Scope) -> Self {
        scope.0
    }
}

/// Note-chain label: domain separation for withdrawal (change) notes.
///
/// Assigned once when a deposit enters the pool and carried unchanged by
/// every change note descending from it, so the withdrawal keys of one
/// chain live under a single label.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Label(FieldElement);

impl From<FieldElement> for Label {
    fn from(fe: FieldElement) -> Self {
        Self(fe)
    }
}

impl From<Label> for FieldElement {
    fn from(label: Label) -> Self {
        label.0
    }
}

/// A precommitment may serve as the label of a fresh chain.
impl From<Precommitment> for Label {
    fn from(pre: Precommitment) -> Self {
        Self(pre.0)
    }
}

// =============================================================================
// Note secrets
// =============================================================================

/// Note nullifier, revealed when the note is spent.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Nullifier(FieldElement);

impl From<FieldElement> for Nullifier {
    fn from(fe: FieldElement) -> Self {
        Self(fe)
    }
}

impl From<Nullifier> for FieldElement {
    fn from(nf: Nullifier) -> Self {
        nf.0
    }
}

/// Note secret. Never revealed; `Debug` redacts it.
#[derive(Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Secret(FieldElement);

impl From<FieldElement> for Secret {
    fn from(fe: FieldElement) -> Self {
        Self(fe)
    }
}

impl From<Secret> for FieldElement {
    fn from(secret: Secret) -> Self {
        secret.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, fmtr: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmtr.write_str("Secret([REDACTED])")
    }
}

/// $\text{Hash2}(\mathsf{nullifier}, \mathsf{secret})$, the hiding part of
/// a commitment. Handed to the pool at deposit time.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Precommitment(FieldElement);

impl Precommitment {
    /// Compute the precommitment of a nullifier and secret.
    #[must_use]
    pub fn compute(nullifier: Nullifier, secret: Secret) -> Self {
        Self(hash2(nullifier.0, secret.0))
    }
}

impl From<Precommitment> for FieldElement {
    fn from(pre: Precommitment) -> Self {
        pre.0
    }
}

/// The `(nullifier, secret, precommitment)` triple of one note.
///
/// The precommitment is always recomputed from the pair, so the three can
/// never disagree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NoteKeys {
    nullifier: Nullifier,
    secret: Secret,
    precommitment: Precommitment,
}

impl NoteKeys {
    /// Rebuild the triple from a stored nullifier and secret.
    #[must_use]
    pub fn from_secrets(nullifier: Nullifier, secret: Secret) -> Self {
        Self {
            nullifier,
            secret,
            precommitment: Precommitment::compute(nullifier, secret),
        }
    }

    /// The nullifier.
    #[must_use]
    pub const fn nullifier(&self) -> Nullifier {
        self.nullifier
    }

    /// The secret.
    #[must_use]
    pub const fn secret(&self) -> Secret {
        self.secret
    }

    /// The precommitment.
    #[must_use]
    pub const fn precommitment(&self) -> Precommitment {
        self.precommitment
    }
}

// =============================================================================
// Derivation
// =============================================================================

fn note_nullifier(master: &MasterKeys, context: FieldElement, index: u32) -> Nullifier {
    Nullifier(hash3(master.master_nullifier(), context, FieldElement::from(index)))
}

fn derive_note(master: &MasterKeys, context: FieldElement, index: u32) -> NoteKeys {
    NoteKeys::from_secrets(
        note_nullifier(master, context, index),
        Secret(hash3(master.master_secret(), context, FieldElement::from(index))),
    )
}

/// Keys of the `index`-th deposit into the pool identified by `scope`.
#[must_use]
pub fn derive_deposit(master: &MasterKeys, scope: Scope, index: u32) -> NoteKeys {
    derive_note(master, scope.0, index)
}

/// Keys of the `index`-th change note in the chain identified by `label`.
#[must_use]
pub fn derive_withdrawal(master: &MasterKeys, label: Label, index: u32) -> NoteKeys {
    derive_note(master, label.0, index)
}

/// Nullifier of the `index`-th deposit under `scope`, without the secret
/// or precommitment.
#[must_use]
pub fn deposit_nullifier(master: &MasterKeys, scope: Scope, index: u32) -> Nullifier {
    note_nullifier(master, scope.0, index)
}

/// Nullifier of the `index`-th change note under `label`, without the
/// secret or precommitment.
#[must_use]
pub fn withdrawal_nullifier(master: &MasterKeys, label: Label, index: u32) -> Nullifier {
    note_nullifier(master, label.0, index)
}
