//! Withdrawal policy checks.
//!
//! Each check either passes or rejects with a [`PolicyRejection`] whose
//! [`code`](PolicyRejection::code) is stable and safe to show callers.
//! Checks fail closed: anything missing or malformed is a rejection.

pub mod fee;
pub mod recipient;

use thiserror::Error;

use crate::error::InvalidInput;

/// A withdrawal refused by policy.
#[derive(Clone, Debug, PartialEq, Error)]
#[expect(
    clippy::module_name_repetitions,
    reason = "read as the rejection type of the policy checks"
)]
pub enum PolicyRejection {
    /// The relayer's quoted fee is negative or not finite.
    #[error("quoted fee is not a finite non-negative number")]
    InvalidFee,

    /// The pool reported no maximum relay fee.
    #[error("pool reported no maximum relay fee")]
    NoOnchainMax,

    /// The pool's maximum relay fee is negative or not finite.
    #[error("pool maximum relay fee is not a finite non-negative number")]
    InvalidOnchainMax,

    /// The quoted fee is above the pool's maximum.
    #[error("quoted fee of {quoted_bps} bps exceeds the pool maximum of {max_bps} bps")]
    ExceedsMax {
        /// The quoted fee in basis points.
        quoted_bps: f64,
        /// The pool maximum in basis points.
        max_bps: f64,
    },

    /// A direct withdrawal named someone other than the connected account.
    #[error("direct withdrawals must pay the connected account")]
    DirectModeRecipientMismatch,

    /// A direct withdrawal without a connected account.
    #[error("no wallet is connected")]
    NoWallet,

    /// The explicit recipient is not a valid address.
    #[error("recipient is not a valid address: {0}")]
    InvalidAddress(#[source] InvalidInput),

    /// A relayed withdrawal with neither a recipient nor a connected account.
    #[error("no recipient given and no wallet connected")]
    NoRecipientOrWallet,
}

impl PolicyRejection {
    /// Stable reason code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match *self {
            Self::InvalidFee => "invalid-fee",
            Self::NoOnchainMax => "no-onchain-max",
            Self::InvalidOnchainMax => "invalid-onchain-max",
            Self::ExceedsMax { .. } => "exceeds-max",
            Self::DirectModeRecipientMismatch => "direct-mode-recipient-mismatch",
            Self::NoWallet => "no-wallet",
            Self::InvalidAddress(_) => "invalid-address",
            Self::NoRecipientOrWallet => "no-recipient-or-wallet",
        }
    }
}
