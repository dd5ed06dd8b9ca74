//! Withdrawal recipient selection.

use tracing::{debug, warn};

use super::PolicyRejection;
use crate::primitives::Address;

/// How a withdrawal reaches the chain.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[expect(
    clippy::module_name_repetitions,
    reason = "named for the choice it describes"
)]
pub enum RecipientMode {
    /// Submitted by the connected account itself; funds go to that account.
    Direct,
    /// Submitted by a relayer for a fee; funds may go anywhere.
    Relay,
}

/// Pick the address a withdrawal pays.
///
/// - Direct: a wallet must be connected, and an explicit recipient, if
///   given, must be that wallet (compared case-insensitively).
/// - Relay: a non-blank explicit recipient must be a valid address;
///   without one the connected wallet is paid.
#[expect(
    clippy::module_name_repetitions,
    reason = "resolve_recipient reads clearly at call sites"
)]
pub fn resolve_recipient(
    mode: RecipientMode,
    explicit: Option<&str>,
    connected: Option<Address>,
) -> Result<Address, PolicyRejection> {
    let requested = explicit.map(str::trim).filter(|text| !text.is_empty());
    let verdict = match mode {
        RecipientMode::Direct => match connected {
            None => Err(PolicyRejection::NoWallet),
            Some(wallet) => match requested {
                Some(text) if !text.eq_ignore_ascii_case(&wallet.to_lower_hex()) => {
                    Err(PolicyRejection::DirectModeRecipientMismatch)
                }
                Some(_) | None => Ok(wallet),
            },
        },
        RecipientMode::Relay => match requested {
            Some(text) => text.parse().map_err(PolicyRejection::InvalidAddress),
            None => connected.ok_or(PolicyRejection::NoRecipientOrWallet),
        },
    };
    match verdict.as_ref() {
        Ok(recipient) => debug!(?mode, %recipient, "recipient resolved"),
        Err(rejection) => warn!(?mode, reason = rejection.code(), "recipient rejected"),
    }
    verdict
}
