//! zkcred WASM bindings
//!
//! The browser runs snarkjs itself; these bindings cover everything around
//! it: identities, commitments, nullifiers, the commitment tree, the
//! circuit witness and the calldata for the verifier contract.
//!
//! Field elements cross the boundary as decimal strings (hex with `0x` is
//! accepted on input).

use std::collections::BTreeMap;

use serde::Serialize;
use wasm_bindgen::prelude::*;
use zkcred_prover::calldata::SolidityCalldata;
use zkcred_prover::field::FieldElement;
use zkcred_prover::hash::CircomPoseidon;
use zkcred_prover::identity::{self, Identity};
use zkcred_prover::merkle::MerkleTree;
use zkcred_prover::orchestrator::{self, PreparedWitness, ProofRequest};
use zkcred_prover::prover::parse_public_signals;
use zkcred_prover::types::Groth16Proof;

type Result<T> = std::result::Result<T, JsError>;

fn poseidon() -> Result<CircomPoseidon> {
    Ok(CircomPoseidon::initialized()?)
}

fn field(text: &str) -> Result<FieldElement> {
    Ok(text.parse::<FieldElement>()?)
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue> {
    // Plain objects rather than JS `Map`s, so snarkjs accepts the witness
    Ok(value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

// ============================================================================
// Public API
// ============================================================================

/// Generate a fresh identity: `{ secret, commitment }`
#[wasm_bindgen]
pub fn generate_identity() -> Result<JsValue> {
    to_js(&Identity::generate(&poseidon()?)?)
}

/// Commitment of an identity secret
#[wasm_bindgen]
pub fn generate_commitment(secret: &str) -> Result<String> {
    Ok(identity::commitment(&poseidon()?, field(secret)?)?.to_decimal())
}

/// Nullifier hash of a secret within an external context
#[wasm_bindgen]
pub fn generate_nullifier(secret: &str, context: &str) -> Result<String> {
    Ok(identity::nullifier_hash(&poseidon()?, field(secret)?, field(context)?)?.to_decimal())
}

/// External context from a human-readable label
#[wasm_bindgen]
pub fn context_from_label(label: &str) -> String {
    FieldElement::from_label(label).to_decimal()
}

/// Check a commitment matches a secret
#[wasm_bindgen]
pub fn verify_commitment(secret: &str, commitment: &str) -> bool {
    let check = || -> zkcred_prover::Result<()> {
        identity::verify_commitment(&CircomPoseidon::initialized()?, secret.parse()?, commitment.parse()?)
    };
    check().is_ok()
}

/// Merkle root over a commitment list (array of strings)
#[wasm_bindgen]
pub fn merkle_root(commitments: JsValue, depth: usize) -> Result<String> {
    let commitments: Vec<FieldElement> = serde_wasm_bindgen::from_value(commitments)?;
    Ok(tree(&commitments, depth)?.root()?.to_decimal())
}

/// Inclusion proof: `{ leafIndex, pathElements, pathIndices }`
#[wasm_bindgen]
pub fn merkle_proof(commitments: JsValue, depth: usize, index: usize) -> Result<JsValue> {
    let commitments: Vec<FieldElement> = serde_wasm_bindgen::from_value(commitments)?;
    to_js(&tree(&commitments, depth)?.proof(index)?)
}

/// Witness and expected public signals for one scenario circuit
///
/// `inputs` maps scenario input names to values, e.g. `{ vote: "2" }`.
/// The returned `witness` is the snarkjs `input.json` object.
#[wasm_bindgen]
pub fn prepare_witness(
    scenario: &str,
    secret: &str,
    commitments: JsValue,
    depth: usize,
    context: &str,
    inputs: JsValue,
) -> Result<JsValue> {
    let request = ProofRequest {
        scenario: scenario.parse()?,
        identity_secret: field(secret)?,
        commitments: serde_wasm_bindgen::from_value(commitments)?,
        leaf_index: None,
        external_context: field(context)?,
        inputs: if inputs.is_undefined() || inputs.is_null() {
            BTreeMap::new()
        } else {
            serde_wasm_bindgen::from_value(inputs)?
        },
    };
    to_js(&prepare(&request, depth)?)
}

fn prepare(request: &ProofRequest, depth: usize) -> zkcred_prover::Result<PreparedWitness> {
    orchestrator::prepare_witness(&CircomPoseidon::initialized()?, depth, request, &mut |_| {})
}

/// Calldata text for the verifier from snarkjs `proof.json` and `public.json`
#[wasm_bindgen]
pub fn format_calldata(proof_json: &str, public_json: &str) -> Result<String> {
    let proof = Groth16Proof::from_json(proof_json)?;
    let signals = parse_public_signals(public_json)?;
    Ok(SolidityCalldata::from_proof(&proof, &signals)?.to_snarkjs_string())
}

/// Calldata as `{ pA, pB, pC, pubSignals }`
#[wasm_bindgen]
pub fn format_calldata_object(proof_json: &str, public_json: &str) -> Result<JsValue> {
    let proof = Groth16Proof::from_json(proof_json)?;
    let signals = parse_public_signals(public_json)?;
    to_js(&SolidityCalldata::from_proof(&proof, &signals)?)
}

/// Get the SDK version
#[wasm_bindgen]
pub fn get_sdk_version() -> String {
    format!("zkcred-wasm-{}", env!("CARGO_PKG_VERSION"))
}

fn tree(commitments: &[FieldElement], depth: usize) -> zkcred_prover::Result<MerkleTree<CircomPoseidon>> {
    MerkleTree::from_leaves(depth, CircomPoseidon::initialized()?, commitments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkcred_prover::scenario::Scenario;

    fn group() -> Vec<FieldElement> {
        let poseidon = CircomPoseidon::initialized().unwrap();
        (1..=3u64)
            .map(|s| identity::commitment(&poseidon, FieldElement::from(s)).unwrap())
            .collect()
    }

    #[test]
    fn test_commitment_matches_core() {
        let poseidon = CircomPoseidon::initialized().unwrap();
        let expected = identity::commitment(&poseidon, FieldElement::from(7u64)).unwrap();
        assert_eq!(generate_commitment("7").ok(), Some(expected.to_decimal()));
        assert!(verify_commitment("7", &expected.to_decimal()));
        assert!(!verify_commitment("8", &expected.to_decimal()));
        assert!(!verify_commitment("not a number", "1"));
    }

    #[test]
    fn test_prepare_voting_witness() {
        let mut inputs = BTreeMap::new();
        inputs.insert("vote".to_string(), FieldElement::from(1u64));
        let mut request = ProofRequest::new(
            Scenario::Voting,
            FieldElement::from(2u64),
            group(),
            FieldElement::from_label("round-1"),
        );
        request.inputs = inputs;

        let prepared = prepare(&request, 10).unwrap();
        assert_eq!(prepared.leaf_index, 1);
        assert_eq!(prepared.merkle_root, tree(&group(), 10).unwrap().root().unwrap());
        assert_eq!(prepared.public_signals.len(), 4);
        assert_eq!(prepared.public_signals[3], FieldElement::from(1u64));

        let json = serde_json::to_value(&prepared.witness).unwrap();
        assert_eq!(json["vote"], "1");
        assert_eq!(json["pathElements"].as_array().unwrap().len(), 10);
    }

    #[test]
    fn test_prepare_rejects_non_member() {
        let request = ProofRequest::new(Scenario::Membership, FieldElement::from(99u64), group(), FieldElement::ZERO);
        assert!(prepare(&request, 10).is_err());
    }

    #[test]
    fn test_format_calldata() {
        let proof = r#"{
            "pi_a": ["1", "2", "1"],
            "pi_b": [["3", "4"], ["5", "6"], ["1", "0"]],
            "pi_c": ["7", "8", "1"],
            "protocol": "groth16",
            "curve": "bn128"
        }"#;
        let Ok(text) = format_calldata(proof, r#"["9"]"#) else {
            panic!("calldata formatting failed");
        };
        let calldata = SolidityCalldata::parse(&text).unwrap();
        assert_eq!(calldata.p_b[0][0], format!("0x{}04", "0".repeat(62)));
        assert_eq!(calldata.pub_signals, vec![format!("0x{}09", "0".repeat(62))]);
    }

    #[test]
    fn test_context_from_label() {
        assert_eq!(
            context_from_label("round-1"),
            FieldElement::from_label("round-1").to_decimal()
        );
    }
}
