//! Fixed-arity Poseidon over the BN254 scalar field.
//!
//! Parameters are the circom instantiation (`x^5` S-box, 8 full rounds,
//! width `arity + 1`), so outputs agree bit-for-bit with circomlib and
//! poseidon-lite as used by the pool contracts and withdrawal circuit.
//! Higher layers only ever call [`hash1`], [`hash2`] and [`hash3`].

use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonHasher as _};

use super::FieldElement;

fn poseidon<const ARITY: usize>(inputs: [FieldElement; ARITY]) -> FieldElement {
    let words = inputs.map(Fr::from);
    #[expect(clippy::expect_used, reason = "circom parameters exist for arity 1 to 12")]
    let mut hasher = Poseidon::<Fr>::new_circom(ARITY).expect("circom parameters for arity");
    #[expect(clippy::expect_used, reason = "input count always equals the width")]
    let out = hasher.hash(&words).expect("input count matches width");
    let digest = FieldElement::from(out);
    debug_assert!(!digest.is_zero(), "poseidon output is never zero");
    digest
}

/// `Hash1(input)`. Used to turn truncated HD key material into master keys.
#[must_use]
pub fn hash1(input: FieldElement) -> FieldElement {
    poseidon([input])
}

/// `Hash2(left, right)`. Merkle node compression and precommitments.
#[must_use]
pub fn hash2(left: FieldElement, right: FieldElement) -> FieldElement {
    poseidon([left, right])
}

/// `Hash3(first, second, third)`. Note key derivation and commitments.
#[must_use]
pub fn hash3(first: FieldElement, second: FieldElement, third: FieldElement) -> FieldElement {
    poseidon([first, second, third])
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn fe(value: u64) -> FieldElement {
        FieldElement::from(value)
    }

    /// circomlib reference vector: `poseidon([1, 2])`.
    #[test]
    fn matches_circomlib_vector() {
        let expected: FieldElement =
            "0x115cc0f5e7d690413df64c6b9662e9cf2a3617f2743245519e19607a4417189a"
                .parse()
                .unwrap();
        assert_eq!(hash2(fe(1), fe(2)), expected);
    }

    #[test]
    fn deterministic_over_repetitions() {
        let first = (hash1(fe(42)), hash2(fe(1), fe(2)), hash3(fe(1), fe(2), fe(3)));
        for _ in 0u8..50 {
            assert_eq!(hash1(fe(42)), first.0);
            assert_eq!(hash2(fe(1), fe(2)), first.1);
            assert_eq!(hash3(fe(1), fe(2), fe(3)), first.2);
        }
    }

    /// All-zero inputs are not fixed points and still hash to non-zero.
    #[test]
    fn zero_inputs_hash_to_nonzero() {
        let zero = FieldElement::zero();
        assert!(!hash1(zero).is_zero());
        assert!(!hash2(zero, zero).is_zero());
        assert!(!hash3(zero, zero, zero).is_zero());
    }

    /// Arities are independent: padding with zero does not collide.
    #[test]
    fn arities_do_not_collide() {
        assert_ne!(hash1(fe(5)), hash2(fe(5), FieldElement::zero()));
        assert_ne!(
            hash2(fe(5), fe(6)),
            hash3(fe(5), fe(6), FieldElement::zero())
        );
    }

    #[test]
    fn order_matters() {
        assert_ne!(hash2(fe(1), fe(2)), hash2(fe(2), fe(1)));
        assert_ne!(hash3(fe(1), fe(2), fe(3)), hash3(fe(3), fe(2), fe(1)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn outputs_in_open_range(left in any::<u64>(), right in any::<u64>()) {
            let out = hash2(fe(left), fe(right));
            prop_assert!(!out.is_zero());
            prop_assert!(out.to_biguint() < FieldElement::modulus());
        }

        #[test]
        fn distinct_inputs_distinct_outputs(left in any::<u64>(), right in any::<u64>()) {
            prop_assume!(left != right);
            prop_assert_ne!(hash1(fe(left)), hash1(fe(right)));
        }
    }
}
