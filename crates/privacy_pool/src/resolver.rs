//! Withdrawal index resolution.
//!
//! A withdrawal must derive its change note at the next free index of the
//! spent note's chain. The index is recovered by the first of four tiers
//! that succeeds:
//!
//! | Tier | Source | `current` | `next` |
//! | ---- | ------ | --------- | ------ |
//! | 1 | index stored on the note | $n$ | $n + 1$ |
//! | 2 | scan withdrawal keys under the label | $i$ | $i + 1$ |
//! | 3 | scan deposit keys under the scope | - | $0$ |
//! | 4 | nothing matched | - | none |
//!
//! Scans compare recomputed nullifiers against the note's nullifier and are
//! bounded by [`ResolverConfig::max_scan`]. An unresolved note must block the
//! withdrawal: guessing an index risks reusing a nullifier.

use core::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::{
    error::InvalidInput,
    keys::{MasterKeys, deposit_nullifier, withdrawal_nullifier},
    note::SpentNote,
};

/// Scan bound used when none is configured.
pub const DEFAULT_MAX_SCAN: u32 = 4096;

/// Largest accepted scan bound.
pub const MAX_SCAN_LIMIT: u32 = 1 << 20;

// =============================================================================
// Explicit index parsing
// =============================================================================

/// A withdrawal index as persisted by wallets: a JSON number or a string.
///
/// Any other JSON value still deserializes, as `Unusable`, so a
/// corrupted field never stops the rest of the note from loading.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum RawWithdrawalIndex {
    /// Integral JSON number.
    Integer(i64),
    /// Fractional or exponent JSON number.
    Float(f64),
    /// Text.
    Text(String),
    /// Any other JSON value. Never an index; serializes back as `null`.
    #[cfg(feature = "serde")]
    #[serde(serialize_with = "serialize_unusable")]
    Unusable(serde::de::IgnoredAny),
}

#[cfg(feature = "serde")]
#[expect(
    clippy::trivially_copy_pass_by_ref,
    reason = "serialize_with passes fields by reference"
)]
fn serialize_unusable<S: serde::Serializer>(
    _value: &serde::de::IgnoredAny,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_unit()
}

impl RawWithdrawalIndex {
    /// The index, if this is a non-negative integer with a successor.
    ///
    /// Negative, fractional, non-finite and non-numeric values yield
    /// `None`, as does `u32::MAX`.
    #[must_use]
    pub fn parse(self) -> Option<u32> {
        let index = match self {
            Self::Integer(value) => u32::try_from(value).ok(),
            // integral finite doubles display without a point or exponent
            Self::Float(value) => value.to_string().parse::<u32>().ok(),
            Self::Text(text) => {
                let digits = text.trim();
                if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
                    None
                } else {
                    digits.parse::<u32>().ok()
                }
            }
            #[cfg(feature = "serde")]
            Self::Unusable(_) => None,
        };
        index.filter(|value| *value < u32::MAX)
    }
}

impl From<u32> for RawWithdrawalIndex {
    fn from(index: u32) -> Self {
        Self::Integer(i64::from(index))
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Resolver tuning.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(rename_all = "camelCase", try_from = "RawResolverConfig")
)]
#[expect(
    clippy::module_name_repetitions,
    reason = "read as resolver configuration at the crate root"
)]
pub struct ResolverConfig {
    max_scan: u32,
}

impl ResolverConfig {
    /// Configure the scan bound; it must lie in `1..=MAX_SCAN_LIMIT`.
    pub fn new(max_scan: u32) -> Result<Self, InvalidInput> {
        if max_scan == 0 || max_scan > MAX_SCAN_LIMIT {
            return Err(InvalidInput::ScanBound {
                requested: max_scan,
                max: MAX_SCAN_LIMIT,
            });
        }
        Ok(Self { max_scan })
    }

    /// Indices `0..max_scan` are tried by each scanning tier.
    #[must_use]
    pub const fn max_scan(&self) -> u32 {
        self.max_scan
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_scan: DEFAULT_MAX_SCAN,
        }
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawResolverConfig {
    #[serde(default = "default_max_scan")]
    max_scan: u32,
}

#[cfg(feature = "serde")]
const fn default_max_scan() -> u32 {
    DEFAULT_MAX_SCAN
}

#[cfg(feature = "serde")]
impl TryFrom<RawResolverConfig> for ResolverConfig {
    type Error = InvalidInput;

    fn try_from(raw: RawResolverConfig) -> Result<Self, Self::Error> {
        Self::new(raw.max_scan)
    }
}

// =============================================================================
// Cancellation
// =============================================================================

/// Caller-held abort switch for long scans.
///
/// Share it by reference with the thread running the scan; setting it makes
/// the scan stop at its next candidate with [`ScanAborted`].
#[derive(Debug, Default)]
pub struct CancellationFlag(AtomicBool);

impl CancellationFlag {
    /// A flag that is not set.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A scan stopped by its [`CancellationFlag`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
#[error("{tier} scan aborted after {scanned} candidates")]
pub struct ScanAborted {
    /// The tier that was scanning.
    pub tier: ResolutionSource,
    /// Candidates checked before the abort.
    pub scanned: u32,
}

// =============================================================================
// Resolution
// =============================================================================

/// Which tier produced a [`Resolution`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResolutionSource {
    /// The note carried its index.
    Note,
    /// Found among the label's withdrawal keys.
    InferredWithdrawal,
    /// Found among the scope's deposit keys.
    Deposit,
    /// No tier matched.
    Unknown,
}

impl ResolutionSource {
    /// Stable code for logs and callers.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::InferredWithdrawal => "inferred-withdrawal",
            Self::Deposit => "deposit",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, fmtr: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmtr.write_str(self.code())
    }
}

/// Outcome of index resolution for one spent note.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Resolution {
    /// The note's own index.
    Note {
        /// The spent note's withdrawal index.
        current: u32,
    },
    /// Recovered by scanning withdrawal keys.
    InferredWithdrawal {
        /// The spent note's withdrawal index.
        current: u32,
    },
    /// The note is an original deposit; change starts a fresh chain.
    Deposit {
        /// The deposit's index under its scope.
        deposit_index: u32,
    },
    /// Nothing matched. The withdrawal must not proceed.
    Unknown,
}

impl Resolution {
    /// The tier that produced this outcome.
    #[must_use]
    pub const fn source(&self) -> ResolutionSource {
        match *self {
            Self::Note { .. } => ResolutionSource::Note,
            Self::InferredWithdrawal { .. } => ResolutionSource::InferredWithdrawal,
            Self::Deposit { .. } => ResolutionSource::Deposit,
            Self::Unknown => ResolutionSource::Unknown,
        }
    }

    /// Index to derive the change note at, if resolved.
    #[must_use]
    pub const fn next_index(&self) -> Option<u32> {
        match *self {
            Self::Note { current } | Self::InferredWithdrawal { current } => current.checked_add(1),
            Self::Deposit { .. } => Some(0),
            Self::Unknown => None,
        }
    }
}

fn scan(
    tier: ResolutionSource,
    max_scan: u32,
    cancel: &CancellationFlag,
    mut matches: impl FnMut(u32) -> bool,
) -> Result<Option<u32>, ScanAborted> {
    for index in 0..max_scan {
        if cancel.is_cancelled() {
            warn!(%tier, scanned = index, "index scan aborted");
            return Err(ScanAborted {
                tier,
                scanned: index,
            });
        }
        if index & 0x3ff == 0 {
            trace!(%tier, index, max_scan, "scanning");
        }
        if matches(index) {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

/// Determine the spent note's position in its chain.
///
/// Tier 1 trusts the note's stored index without checking it against the
/// nullifier. The scanning tiers cost up to `2 * max_scan` nullifier hashes and
/// honour `cancel` between candidates.
pub fn resolve(
    master: &MasterKeys,
    note: &SpentNote,
    config: &ResolverConfig,
    cancel: &CancellationFlag,
) -> Result<Resolution, ScanAborted> {
    if let Some(raw) = note.withdrawal_index.clone() {
        if let Some(current) = raw.parse() {
            debug!(tier = %ResolutionSource::Note, current, "resolved withdrawal index");
            return Ok(Resolution::Note { current });
        }
        debug!("stored withdrawal index unusable, scanning");
    }

    if let Some(current) = scan(
        ResolutionSource::InferredWithdrawal,
        config.max_scan(),
        cancel,
        |index| withdrawal_nullifier(master, note.label, index) == note.nullifier,
    )? {
        debug!(tier = %ResolutionSource::InferredWithdrawal, current, "resolved withdrawal index");
        return Ok(Resolution::InferredWithdrawal { current });
    }

    if let Some(deposit_index) = scan(
        ResolutionSource::Deposit,
        config.max_scan(),
        cancel,
        |index| deposit_nullifier(master, note.scope, index) == note.nullifier,
    )? {
        debug!(tier = %ResolutionSource::Deposit, deposit_index, "resolved withdrawal index");
        return Ok(Resolution::Deposit { deposit_index });
    }

    warn!(max_scan = config.max_scan(), "withdrawal index unresolved");
    Ok(Resolution::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        keys::{Label, NoteKeys, Scope, derive_deposit, derive_withdrawal},
        note::Value,
        primitives::{FieldElement, hash1},
    };

    fn fe(value: u64) -> FieldElement {
        FieldElement::from(value)
    }

    fn master() -> MasterKeys {
        MasterKeys::from_parts(hash1(fe(42)), hash1(fe(43)))
    }

    fn scope() -> Scope {
        Scope::from(fe(1000))
    }

    fn label() -> Label {
        Label::from(fe(2000))
    }

    fn note_with(keys: NoteKeys, withdrawal_index: Option<RawWithdrawalIndex>) -> SpentNote {
        SpentNote {
            nullifier: keys.nullifier(),
            secret: keys.secret(),
            value: Value::from(1_000u128),
            label: label(),
            scope: scope(),
            withdrawal_index,
        }
    }

    fn small() -> ResolverConfig {
        ResolverConfig::new(16).unwrap()
    }

    #[test]
    fn parses_explicit_indices() {
        assert_eq!(RawWithdrawalIndex::Integer(0).parse(), Some(0));
        assert_eq!(RawWithdrawalIndex::Integer(12).parse(), Some(12));
        assert_eq!(RawWithdrawalIndex::Float(3.0).parse(), Some(3));
        assert_eq!(RawWithdrawalIndex::Text(" 42 ".to_owned()).parse(), Some(42));
        assert_eq!(RawWithdrawalIndex::Text("007".to_owned()).parse(), Some(7));
    }

    #[test]
    fn rejects_bad_indices() {
        for raw in [
            RawWithdrawalIndex::Integer(-1),
            RawWithdrawalIndex::Integer(i64::from(u32::MAX)),
            RawWithdrawalIndex::Integer(i64::MAX),
            RawWithdrawalIndex::Float(1.5),
            RawWithdrawalIndex::Float(-2.0),
            RawWithdrawalIndex::Float(f64::NAN),
            RawWithdrawalIndex::Float(f64::INFINITY),
            RawWithdrawalIndex::Text(String::new()),
            RawWithdrawalIndex::Text("abc".to_owned()),
            RawWithdrawalIndex::Text("-3".to_owned()),
            RawWithdrawalIndex::Text("+3".to_owned()),
            RawWithdrawalIndex::Text("1.0".to_owned()),
            RawWithdrawalIndex::Text("1e3".to_owned()),
        ] {
            let shown = format!("{raw:?}");
            assert_eq!(raw.parse(), None, "{shown} accepted");
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn raw_index_from_json() {
        let parse = |json: &str| serde_json::from_str::<RawWithdrawalIndex>(json).unwrap();
        assert_eq!(parse("3"), RawWithdrawalIndex::Integer(3));
        assert_eq!(parse("-3"), RawWithdrawalIndex::Integer(-3));
        assert_eq!(parse("2.5"), RawWithdrawalIndex::Float(2.5));
        assert_eq!(parse("\"4\""), RawWithdrawalIndex::Text("4".to_owned()));
        assert_eq!(parse("4.0").parse(), Some(4));

        for other in ["true", "null", "{\"index\": 1}", "[1]"] {
            let raw = parse(other);
            assert_eq!(raw, RawWithdrawalIndex::Unusable(serde::de::IgnoredAny));
            assert_eq!(raw.parse(), None, "{other} accepted");
        }
        let unusable = RawWithdrawalIndex::Unusable(serde::de::IgnoredAny);
        assert_eq!(serde_json::to_string(&unusable).unwrap(), "null");
    }

    /// A stored note whose index field holds a non-numeric value still
    /// loads, and recovery falls back to scanning.
    #[cfg(feature = "serde")]
    #[test]
    fn corrupted_stored_index_is_scanned() {
        let keys = derive_withdrawal(&master(), label(), 2);
        let mut json = serde_json::to_value(note_with(keys, None)).unwrap();
        json["withdrawalIndex"] = serde_json::json!(true);
        let note: SpentNote = serde_json::from_value(json).unwrap();
        assert_eq!(
            note.withdrawal_index,
            Some(RawWithdrawalIndex::Unusable(serde::de::IgnoredAny))
        );
        let res = resolve(&master(), &note, &small(), &CancellationFlag::new()).unwrap();
        assert_eq!(res, Resolution::InferredWithdrawal { current: 2 });

        // persisting it again drops the bad value
        let again = serde_json::to_value(&note).unwrap();
        assert_eq!(again["withdrawalIndex"], serde_json::Value::Null);
        let reloaded: SpentNote = serde_json::from_value(again).unwrap();
        assert_eq!(reloaded.withdrawal_index, None);
    }

    #[test]
    fn tier_note() {
        // the stored index wins even when the nullifier is unrelated
        let keys = derive_deposit(&master(), scope(), 2);
        let note = note_with(keys, Some(RawWithdrawalIndex::Text("7".to_owned())));
        let cancel = CancellationFlag::new();
        cancel.cancel();
        let res = resolve(&master(), &note, &small(), &cancel).unwrap();
        assert_eq!(res, Resolution::Note { current: 7 });
        assert_eq!(res.next_index(), Some(8));
        assert_eq!(res.source().code(), "note");
    }

    #[test]
    fn tier_inferred_withdrawal() {
        let keys = derive_withdrawal(&master(), label(), 5);
        let note = note_with(keys, None);
        let res = resolve(&master(), &note, &small(), &CancellationFlag::new()).unwrap();
        assert_eq!(res, Resolution::InferredWithdrawal { current: 5 });
        assert_eq!(res.next_index(), Some(6));
        assert_eq!(res.source().code(), "inferred-withdrawal");
    }

    #[test]
    fn tier_deposit() {
        let keys = derive_deposit(&master(), scope(), 3);
        let note = note_with(keys, None);
        let res = resolve(&master(), &note, &small(), &CancellationFlag::new()).unwrap();
        assert_eq!(res, Resolution::Deposit { deposit_index: 3 });
        assert_eq!(res.next_index(), Some(0));
        assert_eq!(res.source().code(), "deposit");
    }

    #[test]
    fn tier_unknown() {
        let stranger = MasterKeys::from_parts(fe(1), fe(2));
        let keys = derive_deposit(&stranger, scope(), 0);
        let note = note_with(keys, None);
        let res = resolve(&master(), &note, &small(), &CancellationFlag::new()).unwrap();
        assert_eq!(res, Resolution::Unknown);
        assert_eq!(res.next_index(), None);
        assert_eq!(res.source().code(), "unknown");
    }

    /// Unusable stored indices fall through to the scans.
    #[test]
    fn invalid_stored_index_falls_through() {
        let keys = derive_withdrawal(&master(), label(), 1);
        for raw in [
            RawWithdrawalIndex::Integer(-1),
            RawWithdrawalIndex::Float(0.5),
            RawWithdrawalIndex::Text("one".to_owned()),
        ] {
            let note = note_with(keys, Some(raw));
            let res = resolve(&master(), &note, &small(), &CancellationFlag::new()).unwrap();
            assert_eq!(res, Resolution::InferredWithdrawal { current: 1 });
        }
    }

    #[test]
    fn scan_is_bounded() {
        let keys = derive_withdrawal(&master(), label(), 16);
        let note = note_with(keys, None);
        let res = resolve(&master(), &note, &small(), &CancellationFlag::new()).unwrap();
        assert_eq!(res, Resolution::Unknown);

        let wider = ResolverConfig::new(17).unwrap();
        let found = resolve(&master(), &note, &wider, &CancellationFlag::new()).unwrap();
        assert_eq!(found, Resolution::InferredWithdrawal { current: 16 });
    }

    #[test]
    fn cancellation_aborts_scan() {
        let keys = derive_deposit(&master(), scope(), 3);
        let note = note_with(keys, None);
        let cancel = CancellationFlag::new();
        cancel.cancel();
        assert_eq!(
            resolve(&master(), &note, &small(), &cancel),
            Err(ScanAborted {
                tier: ResolutionSource::InferredWithdrawal,
                scanned: 0,
            })
        );
    }

    #[test]
    fn config_bounds() {
        assert_eq!(ResolverConfig::default().max_scan(), DEFAULT_MAX_SCAN);
        assert_eq!(
            ResolverConfig::new(0),
            Err(InvalidInput::ScanBound {
                requested: 0,
                max: MAX_SCAN_LIMIT,
            })
        );
        assert!(ResolverConfig::new(MAX_SCAN_LIMIT).is_ok());
        assert!(ResolverConfig::new(MAX_SCAN_LIMIT + 1).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_from_json() {
        let parsed: ResolverConfig = serde_json::from_str(r#"{"maxScan": 64}"#).unwrap();
        assert_eq!(parsed.max_scan(), 64);
        let defaulted: ResolverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(defaulted, ResolverConfig::default());
        assert!(serde_json::from_str::<ResolverConfig>(r#"{"maxScan": 0}"#).is_err());
        assert!(serde_json::from_str::<ResolverConfig>(r#"{"maxscan": 8}"#).is_err());
    }
}
