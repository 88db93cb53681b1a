//! BN254 scalar field elements
//!
//! The scalar field of the `bn128` curve used by circom and snarkjs:
//! p = 21888242871839275222246405745257275088548364400416034343698204186575808495617
//!
//! Two text encodings are supported because the two external boundaries use
//! different ones: decimal strings for circuit witnesses and public signals,
//! and `0x`-prefixed 32-byte big-endian hex for Solidity calldata.

use core::fmt::{self, Debug, Display};
use core::str::FromStr;

use ark_bn254::Fr;
use ark_ff::{BigInteger, Field, PrimeField, UniformRand};
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::error::{Error, Result};

/// Byte length of the big-endian encoding
pub const FIELD_BYTES: usize = 32;

/// An element of the BN254 scalar field, always reduced to `[0, p)`
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct FieldElement(Fr);

impl FieldElement {
    /// Additive identity, also the empty-leaf sentinel of the Merkle tree
    pub const ZERO: Self = Self(Fr::ZERO);

    /// Multiplicative identity
    pub const ONE: Self = Self(Fr::ONE);

    /// The field modulus as an arbitrary-precision integer
    pub fn modulus() -> BigUint {
        BigUint::from(Fr::MODULUS)
    }

    /// Sample a uniformly random element from a cryptographic RNG
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(Fr::rand(rng))
    }

    /// Reduce an arbitrary big-endian byte string modulo p
    ///
    /// Use [`FieldElement::from_be_bytes`] when out-of-range input must be rejected.
    pub fn from_be_bytes_mod_order(bytes: &[u8]) -> Self {
        Self(Fr::from_be_bytes_mod_order(bytes))
    }

    /// Parse a canonical big-endian encoding (at most 32 bytes, value < p)
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > FIELD_BYTES {
            return Err(Error::InvalidFieldElement(format!(
                "{} bytes exceeds {FIELD_BYTES}",
                bytes.len()
            )));
        }
        Self::from_biguint(BigUint::from_bytes_be(bytes))
    }

    /// 32-byte big-endian encoding
    pub fn to_be_bytes(&self) -> [u8; FIELD_BYTES] {
        let bytes = self.0.into_bigint().to_bytes_be();
        let mut out = [0u8; FIELD_BYTES];
        out[FIELD_BYTES - bytes.len()..].copy_from_slice(&bytes);
        out
    }

    /// Parse a decimal string (the circom/snarkjs signal encoding)
    pub fn from_decimal(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidFieldElement(format!("not a decimal integer: {text:?}")));
        }
        let value = trimmed
            .parse::<BigUint>()
            .map_err(|e| Error::InvalidFieldElement(e.to_string()))?;
        Self::from_biguint(value)
    }

    /// Decimal string encoding
    pub fn to_decimal(&self) -> String {
        self.to_biguint().to_string()
    }

    /// Parse `0x`-prefixed (or bare) big-endian hex
    pub fn from_hex(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(Error::InvalidFieldElement(format!("no hex digits: {text:?}")));
        }
        let padded = if digits.len() % 2 == 1 {
            format!("0{digits}")
        } else {
            digits.to_string()
        };
        let bytes = hex::decode(&padded)
            .map_err(|e| Error::InvalidFieldElement(format!("{text:?}: {e}")))?;
        Self::from_be_bytes(&bytes)
    }

    /// `0x`-prefixed, zero-padded 32-byte hex (the Solidity calldata encoding)
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_be_bytes()))
    }

    /// Map a human-readable label to a field element
    ///
    /// `keccak256(label) >> 8`, so the result is below 2^248 and never needs
    /// reduction.
    pub fn from_label(label: &str) -> Self {
        let digest = Keccak256::digest(label.as_bytes());
        Self::from_be_bytes_mod_order(&digest[..FIELD_BYTES - 1])
    }

    /// Whether this is the zero element
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// The underlying arkworks value
    pub fn into_inner(self) -> Fr {
        self.0
    }

    fn to_biguint(self) -> BigUint {
        BigUint::from(self.0.into_bigint())
    }

    fn from_biguint(value: BigUint) -> Result<Self> {
        if value >= Self::modulus() {
            return Err(Error::InvalidFieldElement(format!(
                "{value} is not below the field modulus"
            )));
        }
        Ok(Self(Fr::from(value)))
    }
}

impl From<Fr> for FieldElement {
    fn from(value: Fr) -> Self {
        Self(value)
    }
}

impl From<FieldElement> for Fr {
    fn from(value: FieldElement) -> Self {
        value.0
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self(Fr::from(value))
    }
}

impl From<bool> for FieldElement {
    fn from(value: bool) -> Self {
        if value {
            Self::ONE
        } else {
            Self::ZERO
        }
    }
}

/// Accepts decimal, or hex when prefixed with `0x`
impl FromStr for FieldElement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::from_hex(s)
        } else {
            Self::from_decimal(s)
        }
    }
}

impl Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_decimal())
    }
}

impl fmt::LowerHex for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        write!(f, "{}", hex::encode(self.to_be_bytes()))
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
