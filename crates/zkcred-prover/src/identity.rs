//! Identities, commitments and nullifiers
//!
//! - commitment = Poseidon(secret)
//! - nullifier hash = Poseidon(secret, external context)
//!
//! The external context names a proof session (a voting round, an airdrop
//! epoch). The same identity yields the same nullifier within one context
//! and unlinkable nullifiers across contexts. Uniqueness of nullifiers is
//! enforced by the verifying contract, not here.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::field::FieldElement;
use crate::hash::{generate_identity_secret, FieldHasher};

/// A private identity secret and its public commitment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Identity secret (keep private!)
    pub secret: FieldElement,
    /// Public commitment, used as the Merkle leaf
    pub commitment: FieldElement,
}

impl Identity {
    /// Generate a fresh random identity
    pub fn generate<H: FieldHasher>(hasher: &H) -> Result<Self> {
        Self::from_secret(hasher, generate_identity_secret())
    }

    /// Rebuild an identity from a known secret
    pub fn from_secret<H: FieldHasher>(hasher: &H, secret: FieldElement) -> Result<Self> {
        Ok(Self {
            secret,
            commitment: commitment(hasher, secret)?,
        })
    }

    /// Nullifier hash of this identity within `context`
    pub fn nullifier_hash<H: FieldHasher>(
        &self,
        hasher: &H,
        context: FieldElement,
    ) -> Result<FieldElement> {
        nullifier_hash(hasher, self.secret, context)
    }
}

/// Commitment to an identity secret
pub fn commitment<H: FieldHasher>(hasher: &H, secret: FieldElement) -> Result<FieldElement> {
    hasher.hash_single(secret)
}

/// Nullifier hash for `secret` within `context`
pub fn nullifier_hash<H: FieldHasher>(
    hasher: &H,
    secret: FieldElement,
    context: FieldElement,
) -> Result<FieldElement> {
    hasher.hash_two(secret, context)
}

/// Recompute the commitment of `secret` and compare it with `expected`
pub fn verify_commitment<H: FieldHasher>(
    hasher: &H,
    secret: FieldElement,
    expected: FieldElement,
) -> Result<()> {
    check("commitment", expected, commitment(hasher, secret)?)
}

/// Recompute the nullifier hash of `secret` in `context` and compare it with `expected`
pub fn verify_nullifier<H: FieldHasher>(
    hasher: &H,
    secret: FieldElement,
    context: FieldElement,
    expected: FieldElement,
) -> Result<()> {
    check("nullifier hash", expected, nullifier_hash(hasher, secret, context)?)
}

fn check(what: &'static str, expected: FieldElement, actual: FieldElement) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::VerificationMismatch {
            what,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::CircomPoseidon;

    fn poseidon() -> CircomPoseidon {
        CircomPoseidon::initialized().unwrap()
    }

    #[test]
    fn test_identity_from_secret() {
        let hasher = poseidon();
        let secret = FieldElement::from(12345u64);
        let id = Identity::from_secret(&hasher, secret).unwrap();

        assert_eq!(id.secret, secret);
        assert_eq!(id.commitment, hasher.hash_single(secret).unwrap());
    }

    #[test]
    fn test_generated_identities_differ() {
        let hasher = poseidon();
        let a = Identity::generate(&hasher).unwrap();
        let b = Identity::generate(&hasher).unwrap();
        assert_ne!(a.commitment, b.commitment);
    }

    #[test]
    fn test_nullifier_context_separation() {
        let hasher = poseidon();
        let id = Identity::from_secret(&hasher, FieldElement::from(7u64)).unwrap();

        let round1 = id.nullifier_hash(&hasher, FieldElement::from_label("round-1")).unwrap();
        let round1_again = id.nullifier_hash(&hasher, FieldElement::from_label("round-1")).unwrap();
        let round2 = id.nullifier_hash(&hasher, FieldElement::from_label("round-2")).unwrap();

        assert_eq!(round1, round1_again);
        assert_ne!(round1, round2);
        // Nullifier never equals the public commitment
        assert_ne!(round1, id.commitment);
    }

    #[test]
    fn test_verify_commitment() {
        let hasher = poseidon();
        let id = Identity::from_secret(&hasher, FieldElement::from(99u64)).unwrap();

        assert!(verify_commitment(&hasher, id.secret, id.commitment).is_ok());

        let err = verify_commitment(&hasher, FieldElement::from(100u64), id.commitment).unwrap_err();
        match err {
            Error::VerificationMismatch { what, expected, .. } => {
                assert_eq!(what, "commitment");
                assert_eq!(expected, id.commitment);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_verify_nullifier() {
        let hasher = poseidon();
        let secret = FieldElement::from(5u64);
        let context = FieldElement::from(77u64);
        let expected = nullifier_hash(&hasher, secret, context).unwrap();

        assert!(verify_nullifier(&hasher, secret, context, expected).is_ok());
        assert!(verify_nullifier(&hasher, secret, FieldElement::from(78u64), expected).is_err());
    }
}
