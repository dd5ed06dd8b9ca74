//! Master keys: the per-account root of every note secret.

use core::fmt;

use num_bigint::BigUint;
use tracing::debug;

use crate::{
    error::InvalidInput,
    primitives::{FieldElement, hash1},
};

/// Significand width of an IEEE-754 binary64 (52 stored bits + 1 implicit).
const BINARY64_SIGNIFICAND_BITS: u64 = 53;

/// Every finite binary64 is below `2^1024`.
const BINARY64_MAX_BITS: u64 = 1024;

/// Raw private-key material of the two HD accounts that seed an account's
/// master keys.
///
/// Account 0 feeds the master nullifier, account 1 the master secret.
/// Mnemonic handling and HD path derivation belong to the wallet layer;
/// this type only carries the resulting private-key integers.
#[derive(Clone)]
pub struct KeyMaterial {
    nullifier_seed: BigUint,
    secret_seed: BigUint,
}

impl KeyMaterial {
    /// Wrap two private-key integers.
    #[must_use]
    pub const fn new(nullifier_seed: BigUint, secret_seed: BigUint) -> Self {
        Self {
            nullifier_seed,
            secret_seed,
        }
    }

    /// Interpret two big-endian private keys. Empty slices are rejected
    /// rather than read as zero.
    pub fn from_be_bytes(nullifier_seed: &[u8], secret_seed: &[u8]) -> Result<Self, InvalidInput> {
        if nullifier_seed.is_empty() {
            return Err(InvalidInput::Empty("nullifier key material"));
        }
        if secret_seed.is_empty() {
            return Err(InvalidInput::Empty("secret key material"));
        }
        Ok(Self::new(
            BigUint::from_bytes_be(nullifier_seed),
            BigUint::from_bytes_be(secret_seed),
        ))
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, fmtr: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmtr.debug_struct("KeyMaterial")
            .field("nullifier_seed", &"[REDACTED]")
            .field("secret_seed", &"[REDACTED]")
            .finish()
    }
}

/// An account's master key pair `(master_nullifier, master_secret)`.
///
/// Every deposit and withdrawal note of the account is derived from this
/// pair; see [`derive_deposit`](super::derive_deposit) and
/// [`derive_withdrawal`](super::derive_withdrawal). Session-lived: the
/// crate never persists it.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct MasterKeys {
    nullifier: FieldElement,
    secret: FieldElement,
}

impl MasterKeys {
    /// Derive the master pair from HD key material.
    ///
    /// Each side is first rounded to the nearest binary64 value (ties to
    /// even) and then reduced into the field and hashed:
    ///
    /// $$\mathsf{master}_x = \text{Hash1}(\text{round}_{64}(k_x) \bmod r)$$
    ///
    /// The rounding discards all but the top 53 significant bits of each
    /// key. Wallets already derived their notes this way, so it must be
    /// reproduced exactly for their funds to stay reachable.
    pub fn derive(material: &KeyMaterial) -> Result<Self, InvalidInput> {
        let nullifier = hash1(FieldElement::reduce(&round_to_binary64(
            &material.nullifier_seed,
        )?));
        let secret = hash1(FieldElement::reduce(&round_to_binary64(
            &material.secret_seed,
        )?));
        debug!("derived master keys");
        Ok(Self { nullifier, secret })
    }

    /// Rebuild a pair from already-derived values.
    #[must_use]
    pub const fn from_parts(master_nullifier: FieldElement, master_secret: FieldElement) -> Self {
        Self {
            nullifier: master_nullifier,
            secret: master_secret,
        }
    }

    /// The master nullifier.
    #[must_use]
    pub const fn master_nullifier(&self) -> FieldElement {
        self.nullifier
    }

    /// The master secret.
    #[must_use]
    pub const fn master_secret(&self) -> FieldElement {
        self.secret
    }
}

impl fmt::Debug for MasterKeys {
    fn fmt(&self, fmtr: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmtr.debug_struct("MasterKeys")
            .field("nullifier", &"[REDACTED]")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Round an integer to the nearest binary64 and return that double's exact
/// integer value, without going through floating point.
///
/// Keeps the top 53 significant bits, rounds half to even on the dropped
/// bits, and fails if the result would be infinite.
pub(crate) fn round_to_binary64(value: &BigUint) -> Result<BigUint, InvalidInput> {
    let bits = value.bits();
    if bits <= BINARY64_SIGNIFICAND_BITS {
        return Ok(value.clone());
    }
    let shift = bits - BINARY64_SIGNIFICAND_BITS;
    let mut significand = value >> shift;
    let dropped = value - (&significand << shift);
    let half = BigUint::from(1u8) << (shift - 1);
    if dropped > half || (dropped == half && significand.bit(0)) {
        significand += 1u8;
    }
    let rounded = significand << shift;
    if rounded.bits() > BINARY64_MAX_BITS {
        return Err(InvalidInput::KeyOverflow);
    }
    Ok(rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pow2(exp: u64) -> BigUint {
        BigUint::from(1u8) << exp
    }

    #[test]
    fn exact_below_53_bits() {
        let value = pow2(53) - 1u8;
        assert_eq!(round_to_binary64(&value).unwrap(), value);
        assert_eq!(
            round_to_binary64(&BigUint::from(0u8)).unwrap(),
            BigUint::from(0u8)
        );
    }

    /// Ties go to the even significand.
    #[test]
    fn ties_to_even() {
        assert_eq!(round_to_binary64(&(pow2(53) + 1u8)).unwrap(), pow2(53));
        assert_eq!(
            round_to_binary64(&(pow2(53) + 3u8)).unwrap(),
            pow2(53) + 4u8
        );
    }

    #[test]
    fn rounds_to_nearest() {
        assert_eq!(
            round_to_binary64(&(pow2(54) + 3u8)).unwrap(),
            pow2(54) + 4u8
        );
        assert_eq!(round_to_binary64(&(pow2(54) + 1u8)).unwrap(), pow2(54));
    }

    /// Rounding up can carry into a new bit.
    #[test]
    fn carry_into_next_power() {
        assert_eq!(round_to_binary64(&(pow2(54) - 1u8)).unwrap(), pow2(54));
        assert_eq!(round_to_binary64(&(pow2(256) - 1u8)).unwrap(), pow2(256));
    }

    #[test]
    fn overflow_is_rejected() {
        assert_eq!(
            round_to_binary64(&(pow2(1024) - 1u8)),
            Err(InvalidInput::KeyOverflow)
        );
        assert_eq!(round_to_binary64(&pow2(1024)), Err(InvalidInput::KeyOverflow));
        // largest finite double survives
        let max_double = (pow2(53) - 1u8) << 971u32;
        assert_eq!(round_to_binary64(&max_double).unwrap(), max_double);
    }

    #[test]
    fn empty_material_rejected() {
        assert_eq!(
            KeyMaterial::from_be_bytes(&[], &[1u8]).unwrap_err(),
            InvalidInput::Empty("nullifier key material")
        );
        assert_eq!(
            KeyMaterial::from_be_bytes(&[1u8], &[]).unwrap_err(),
            InvalidInput::Empty("secret key material")
        );
    }

    #[test]
    fn derivation_is_deterministic() {
        let material = KeyMaterial::from_be_bytes(&[0x11u8; 32], &[0x22u8; 32]).unwrap();
        let first = MasterKeys::derive(&material).unwrap();
        for _ in 0u8..10 {
            assert_eq!(MasterKeys::derive(&material).unwrap(), first);
        }
        assert_ne!(first.master_nullifier(), first.master_secret());
    }

    /// Keys that differ only below the top 53 bits collapse to the same
    /// master pair; this is the preserved truncation behaviour.
    #[test]
    fn truncation_collapses_low_bits() {
        let mut low_a = [0x5au8; 32];
        let mut low_b = [0x5au8; 32];
        low_a[31] = 0x00;
        low_b[31] = 0x01;
        let keys_a =
            MasterKeys::derive(&KeyMaterial::from_be_bytes(&low_a, &[7u8; 32]).unwrap()).unwrap();
        let keys_b =
            MasterKeys::derive(&KeyMaterial::from_be_bytes(&low_b, &[7u8; 32]).unwrap()).unwrap();
        assert_eq!(keys_a, keys_b);

        // a change in the top bits is not lost
        low_b[0] = 0x5b;
        let keys_c =
            MasterKeys::derive(&KeyMaterial::from_be_bytes(&low_b, &[7u8; 32]).unwrap()).unwrap();
        assert_ne!(keys_a.master_nullifier(), keys_c.master_nullifier());
        assert_eq!(keys_a.master_secret(), keys_c.master_secret());
    }

    /// A small key is hashed unchanged: `Hash1(k)`.
    #[test]
    fn small_key_hashes_directly() {
        let keys = MasterKeys::derive(&KeyMaterial::new(
            BigUint::from(42u8),
            BigUint::from(43u8),
        ))
        .unwrap();
        assert_eq!(keys.master_nullifier(), hash1(FieldElement::from(42u64)));
        assert_eq!(keys.master_secret(), hash1(FieldElement::from(43u64)));
    }

    #[test]
    fn debug_redacts() {
        let keys = MasterKeys::from_parts(FieldElement::from(1u64), FieldElement::from(2u64));
        let text = format!("{keys:?}");
        assert!(text.contains("REDACTED"));
        assert!(!text.contains("FieldElement"));
    }
}
