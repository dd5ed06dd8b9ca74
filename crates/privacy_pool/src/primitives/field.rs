use core::{fmt, str::FromStr};

use ark_bn254::Fr;
use ark_ff::{BigInteger as _, PrimeField as _, Zero as _};
use num_bigint::BigUint;

use crate::error::InvalidInput;

/// An element of the BN254 scalar field ($\mathbb{F}_r$).
///
/// Every key, hash, commitment and Merkle node in the pool is one of
/// these. Construction from integers or text rejects values at or above
/// the modulus instead of silently reducing them; the only reducing
/// constructor is crate-internal and used by master key derivation.
///
/// Serializes as a decimal string so JSON consumers never see a lossy
/// number.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "String", try_from = "String"))]
pub struct FieldElement(Fr);

impl FieldElement {
    /// The additive identity, used as the neutral Merkle node.
    #[must_use]
    pub fn zero() -> Self {
        Self(Fr::zero())
    }

    /// Whether this is the zero element.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The field modulus as an integer.
    #[must_use]
    pub fn modulus() -> BigUint {
        BigUint::from(Fr::MODULUS)
    }

    /// Lift an integer into the field, rejecting values `>= modulus`.
    pub fn from_biguint(value: &BigUint, what: &'static str) -> Result<Self, InvalidInput> {
        if *value >= Self::modulus() {
            return Err(InvalidInput::OutOfField(what));
        }
        Ok(Self::reduce(value))
    }

    /// Reduce an arbitrary integer modulo the field order.
    pub(crate) fn reduce(value: &BigUint) -> Self {
        Self(Fr::from_be_bytes_mod_order(&value.to_bytes_be()))
    }

    /// The canonical integer representative.
    #[must_use]
    pub fn to_biguint(&self) -> BigUint {
        BigUint::from(self.0.into_bigint())
    }

    /// Canonical 32-byte big-endian encoding.
    #[must_use]
    pub fn to_bytes_be(&self) -> [u8; 32] {
        let bytes = self.0.into_bigint().to_bytes_be();
        let mut out = [0u8; 32];
        for (slot, byte) in out.iter_mut().rev().zip(bytes.iter().rev()) {
            *slot = *byte;
        }
        out
    }

    /// Decode a 32-byte big-endian encoding, rejecting non-canonical values.
    pub fn from_bytes_be(bytes: &[u8; 32]) -> Result<Self, InvalidInput> {
        Self::from_biguint(&BigUint::from_bytes_be(bytes), "field element")
    }
}

/// Parse unsigned decimal or `0x`-prefixed hexadecimal text.
///
/// Signs, separators, whitespace inside the digits and empty digit strings
/// are all rejected.
fn parse_unsigned(text: &str, what: &'static str) -> Result<BigUint, InvalidInput> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InvalidInput::Empty(what));
    }
    let (digits, radix) = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex_digits) => (hex_digits, 16u32),
        None => (trimmed, 10u32),
    };
    let malformed = || InvalidInput::Malformed {
        what,
        input: trimmed.to_owned(),
    };
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_digit(radix)) {
        return Err(malformed());
    }
    BigUint::parse_bytes(digits.as_bytes(), radix).ok_or_else(malformed)
}

impl FromStr for FieldElement {
    type Err = InvalidInput;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::from_biguint(&parse_unsigned(text, "field element")?, "field element")
    }
}

impl TryFrom<String> for FieldElement {
    type Error = InvalidInput;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<FieldElement> for String {
    fn from(fe: FieldElement) -> Self {
        fe.to_string()
    }
}

impl From<Fr> for FieldElement {
    fn from(fr: Fr) -> Self {
        Self(fr)
    }
}

impl From<FieldElement> for Fr {
    fn from(fe: FieldElement) -> Self {
        fe.0
    }
}

impl From<u32> for FieldElement {
    fn from(value: u32) -> Self {
        Self(Fr::from(value))
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self(Fr::from(value))
    }
}

impl From<u128> for FieldElement {
    fn from(value: u128) -> Self {
        Self(Fr::from(value))
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, fmtr: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmtr, "{}", self.to_biguint())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, fmtr: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.to_bytes_be();
        let prefix = bytes.get(..4).map(hex::encode).unwrap_or_default();
        write!(fmtr, "FieldElement(0x{prefix}..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `p - 1` is the largest accepted value; `p` itself is rejected.
    #[test]
    fn modulus_boundary() {
        let modulus = FieldElement::modulus();
        let top = &modulus - BigUint::from(1u8);

        let fe = FieldElement::from_biguint(&top, "test").unwrap();
        assert_eq!(fe.to_biguint(), top);
        assert_eq!(
            FieldElement::from_biguint(&modulus, "test"),
            Err(InvalidInput::OutOfField("test"))
        );
        assert_eq!(
            FieldElement::from_str(&modulus.to_string()),
            Err(InvalidInput::OutOfField("field element"))
        );
    }

    #[test]
    fn parses_decimal_and_hex() {
        let dec: FieldElement = "255".parse().unwrap();
        let hex_lower: FieldElement = "0xff".parse().unwrap();
        let hex_upper: FieldElement = "0XFF".parse().unwrap();
        assert_eq!(dec, FieldElement::from(255u64));
        assert_eq!(dec, hex_lower);
        assert_eq!(dec, hex_upper);
        assert_eq!(dec.to_string(), "255");
    }

    #[test]
    fn rejects_malformed_text() {
        for bad in ["-1", "+1", "1.5", "12a", "0x", "0xzz", "1_000", "1 2"] {
            assert!(
                matches!(
                    FieldElement::from_str(bad),
                    Err(InvalidInput::Malformed { .. })
                ),
                "{bad:?} should be malformed"
            );
        }
        assert_eq!(
            FieldElement::from_str("  "),
            Err(InvalidInput::Empty("field element"))
        );
    }

    /// Reduction wraps at the modulus; it is never used for user input.
    #[test]
    fn reduce_wraps_modulus() {
        let wrapped = FieldElement::reduce(&(FieldElement::modulus() + BigUint::from(7u8)));
        assert_eq!(wrapped, FieldElement::from(7u64));
    }

    #[test]
    fn bytes_are_canonical() {
        let fe = FieldElement::from(0x0102_0304u64);
        let bytes = fe.to_bytes_be();
        assert_eq!(bytes[28..], [1u8, 2, 3, 4]);
        assert_eq!(FieldElement::from_bytes_be(&bytes).unwrap(), fe);
        assert!(FieldElement::from_bytes_be(&[0xffu8; 32]).is_err());
    }
}
