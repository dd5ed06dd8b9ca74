use core::{fmt, str::FromStr};

use sha3::{Digest as _, Keccak256};

use crate::error::InvalidInput;

/// A 20-byte account address (recipient, connected wallet, or asset).
///
/// Parsing follows the usual account-address rules: `0x` followed by 40
/// hex digits. An all-lowercase or all-uppercase body is accepted as-is;
/// a mixed-case body must carry a valid EIP-55 checksum. Displays in
/// checksummed form.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "String", try_from = "String"))]
pub struct Address([u8; 20]);

impl Address {
    /// Lowercase `0x`-prefixed hex, the form compared in direct mode.
    #[must_use]
    pub fn to_lower_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// EIP-55 checksummed hex.
    #[must_use]
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let digest = Keccak256::digest(lower.as_bytes());
        let nibbles = digest.iter().flat_map(|byte| [byte >> 4u8, byte & 0x0fu8]);
        let body: String = lower
            .chars()
            .zip(nibbles)
            .map(|(ch, nibble)| {
                if nibble >= 8u8 {
                    ch.to_ascii_uppercase()
                } else {
                    ch
                }
            })
            .collect();
        format!("0x{body}")
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; 20] {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl FromStr for Address {
    type Err = InvalidInput;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(InvalidInput::Empty("address"));
        }
        let malformed = || InvalidInput::Malformed {
            what: "address",
            input: trimmed.to_owned(),
        };
        let body = trimmed.strip_prefix("0x").ok_or_else(malformed)?;
        if body.len() != 40 || !body.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(malformed());
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(body, &mut bytes).map_err(|_err| malformed())?;
        let addr = Self(bytes);

        let has_lower = body.chars().any(|ch| ch.is_ascii_lowercase());
        let has_upper = body.chars().any(|ch| ch.is_ascii_uppercase());
        if has_lower && has_upper && addr.to_checksum() != trimmed {
            return Err(malformed());
        }
        Ok(addr)
    }
}

impl TryFrom<String> for Address {
    type Error = InvalidInput;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_checksum()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, fmtr: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmtr.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, fmtr: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmtr, "Address({})", self.to_checksum())
    }
}
