//! zkcred Prover - anonymous credential proofs over a Poseidon Merkle tree
//!
//! This crate builds the client side of a Semaphore-style membership proof:
//! identity commitments go into a fixed-depth Poseidon Merkle tree, a member
//! proves inclusion plus a per-context nullifier with a Groth16 circuit, and
//! the proof is formatted as calldata for the on-chain verifier.
//!
//! # Components
//!
//! - `field` - BN254 scalar field element and its text encodings
//! - `hash` - circomlib-compatible Poseidon behind the `FieldHasher` capability
//! - `identity` - identity secrets, commitments and nullifier hashes
//! - `merkle` - fixed-depth Merkle tree with inclusion proofs
//! - `scenario` - per-circuit witness layouts (membership, voting, airdrop, auction)
//! - `prover` - the `Prover` capability and the snarkjs backend
//! - `verifier` - native Groth16 verification of snarkjs proofs
//! - `calldata` - Solidity verifier calldata
//! - `orchestrator` - the staged proof round with progress reporting
//! - `config` - TOML prover configuration
//! - `types` - Witness, Groth16Proof, ProofArtifact
//!
//! # Features
//!
//! - `wasm` - Use the browser RNG on `wasm32-unknown-unknown`

pub mod calldata;
pub mod config;
pub mod error;
pub mod field;
pub mod hash;
pub mod identity;
pub mod merkle;
pub mod orchestrator;
pub mod prover;
pub mod scenario;
pub mod types;
pub mod verifier;

// Re-exports for convenience
pub use calldata::SolidityCalldata;
pub use config::{CircuitArtifacts, ProverConfig};
pub use error::{Error, Result};
pub use field::FieldElement;
pub use hash::{CircomPoseidon, FieldHasher};
pub use identity::Identity;
pub use merkle::{MerkleProof, MerkleTree, TREE_DEPTH};
pub use orchestrator::{prepare_witness, PreparedWitness, ProgressUpdate, ProofOrchestrator, ProofRequest, Stage};
pub use prover::{Prover, SnarkjsProver};
pub use scenario::Scenario;
pub use types::{Groth16Proof, ProofArtifact, Witness};
pub use verifier::VerificationKey;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::field::FieldElement;
    pub use crate::hash::{CircomPoseidon, FieldHasher};
    pub use crate::identity::Identity;
    pub use crate::merkle::{MerkleProof, MerkleTree};
    pub use crate::orchestrator::{ProofOrchestrator, ProofRequest};
    pub use crate::prover::{Prover, SnarkjsProver};
    pub use crate::scenario::Scenario;
    pub use crate::types::ProofArtifact;
}
