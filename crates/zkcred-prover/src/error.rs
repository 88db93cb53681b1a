//! Error type shared by every zkcred component

use crate::field::FieldElement;

/// Result alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by hashing, tree, prover and orchestration code
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A hash backend or tree was used before `init`/`initialize`
    #[error("{0} used before initialization")]
    NotInitialized(&'static str),

    /// Insertion past `2^depth` leaves
    #[error("Merkle tree is full ({capacity} leaves)")]
    TreeFull { capacity: usize },

    /// Proof requested for a slot that holds no leaf
    #[error("leaf index {index} out of range (leaf count {leaf_count}, capacity {capacity})")]
    IndexOutOfRange {
        index: usize,
        leaf_count: usize,
        capacity: usize,
    },

    /// The proving backend failed, including witness/circuit mismatches
    #[error("prover error: {0}")]
    Prover(String),

    /// A recomputed value disagrees with the caller's expected value
    #[error("{what} mismatch: expected {expected}, computed {actual}")]
    VerificationMismatch {
        what: &'static str,
        expected: FieldElement,
        actual: FieldElement,
    },

    /// Text or bytes that do not encode an element of the scalar field
    #[error("invalid field element: {0}")]
    InvalidFieldElement(String),

    /// A proof request missing inputs its scenario requires
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Calldata that does not have the verifier's fixed shape
    #[error("invalid calldata: {0}")]
    Calldata(String),

    /// Malformed proof or verification key material
    #[error("invalid proof material: {0}")]
    ProofFormat(String),

    /// Failure inside the Poseidon primitive
    #[error("poseidon: {0}")]
    Hash(String),

    /// Configuration that cannot be loaded or fails validation
    #[error("config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a prover error
    pub fn prover(msg: impl Into<String>) -> Self {
        Self::Prover(msg.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a proof format error
    pub fn proof_format(msg: impl Into<String>) -> Self {
        Self::ProofFormat(msg.into())
    }
}

impl From<light_poseidon::PoseidonError> for Error {
    fn from(err: light_poseidon::PoseidonError) -> Self {
        Self::Hash(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TreeFull { capacity: 1024 };
        assert!(err.to_string().contains("1024"));

        let err = Error::IndexOutOfRange {
            index: 7,
            leaf_count: 4,
            capacity: 1024,
        };
        assert!(err.to_string().contains("leaf index 7"));

        let err = Error::NotInitialized("poseidon");
        assert_eq!(err.to_string(), "poseidon used before initialization");

        let err = Error::prover("snarkjs exited with status 1");
        assert!(err.to_string().starts_with("prover error"));
    }

    #[test]
    fn test_mismatch_display() {
        let err = Error::VerificationMismatch {
            what: "commitment",
            expected: FieldElement::from(1u64),
            actual: FieldElement::from(2u64),
        };
        assert_eq!(
            err.to_string(),
            "commitment mismatch: expected 1, computed 2"
        );
    }
}
