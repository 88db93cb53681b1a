//! Common types for the zkcred prover
//!
//! Defines Witness, Groth16Proof, ProofArtifact and other shared types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calldata::SolidityCalldata;
use crate::error::{Error, Result};
use crate::field::FieldElement;
use crate::scenario::Scenario;

/// Value of one circuit input signal
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    /// Scalar signal
    Single(FieldElement),
    /// Array signal (e.g. `pathElements[D]`)
    Array(Vec<FieldElement>),
}

/// Circuit witness input: signal name to decimal-encoded value(s)
///
/// Serializes to the snarkjs `input.json` object. Names must match the
/// compiled circuit exactly; nothing here can check that.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Witness {
    signals: BTreeMap<String, SignalValue>,
}

impl Witness {
    /// Create an empty witness
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar signal
    pub fn set(&mut self, name: impl Into<String>, value: FieldElement) -> &mut Self {
        self.signals.insert(name.into(), SignalValue::Single(value));
        self
    }

    /// Set an array signal
    pub fn set_array(&mut self, name: impl Into<String>, values: Vec<FieldElement>) -> &mut Self {
        self.signals.insert(name.into(), SignalValue::Array(values));
        self
    }

    /// Get a signal by name
    pub fn get(&self, name: &str) -> Option<&SignalValue> {
        self.signals.get(name)
    }

    /// Get a scalar signal by name
    pub fn scalar(&self, name: &str) -> Option<FieldElement> {
        match self.signals.get(name)? {
            SignalValue::Single(v) => Some(*v),
            SignalValue::Array(_) => None,
        }
    }

    /// Whether a signal is set
    pub fn contains(&self, name: &str) -> bool {
        self.signals.contains_key(name)
    }

    /// Number of signals
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Check if witness is empty
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Signal names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.signals.keys().map(String::as_str)
    }

    /// snarkjs `input.json` text
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn default_protocol() -> String {
    "groth16".to_string()
}

fn default_curve() -> String {
    "bn128".to_string()
}

/// A Groth16 proof in the snarkjs `proof.json` layout
///
/// Coordinates are decimal strings over the base field (which is larger
/// than the scalar field, so they are not [`FieldElement`]s). Points are
/// projective with `z = 1`; G2 coordinates are `[c0, c1]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Groth16Proof {
    /// The `A` element in G1
    pub pi_a: [String; 3],
    /// The `B` element in G2
    pub pi_b: [[String; 2]; 3],
    /// The `C` element in G1
    pub pi_c: [String; 3],
    /// Always `"groth16"`
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// Always `"bn128"`
    #[serde(default = "default_curve")]
    pub curve: String,
}

impl Groth16Proof {
    /// Build from affine coordinates
    pub fn from_affine(a: [String; 2], b: [[String; 2]; 2], c: [String; 2]) -> Self {
        let [ax, ay] = a;
        let [bx, by] = b;
        let [cx, cy] = c;
        Self {
            pi_a: [ax, ay, "1".into()],
            pi_b: [bx, by, ["1".into(), "0".into()]],
            pi_c: [cx, cy, "1".into()],
            protocol: default_protocol(),
            curve: default_curve(),
        }
    }

    /// Parse `proof.json` text
    pub fn from_json(text: &str) -> Result<Self> {
        let proof: Self = serde_json::from_str(text)?;
        if proof.protocol != "groth16" {
            return Err(Error::proof_format(format!(
                "unsupported protocol {:?}",
                proof.protocol
            )));
        }
        Ok(proof)
    }
}

/// Everything a caller needs after a successful proof round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofArtifact {
    /// Scenario whose circuit produced the proof
    pub scenario: Scenario,
    /// Raw snarkjs proof
    pub proof: Groth16Proof,
    /// Public signals in circuit order
    pub public_signals: Vec<FieldElement>,
    /// Root of the commitment tree the proof is against
    pub merkle_root: FieldElement,
    /// Nullifier hash; uniqueness is enforced on-chain
    pub nullifier_hash: FieldElement,
    /// Session context the nullifier is bound to
    pub external_context: FieldElement,
    /// Verifier-ready calldata
    pub calldata: SolidityCalldata,
}

impl ProofArtifact {
    /// Pretty JSON encoding
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a JSON-encoded artifact
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_witness() {
        let mut witness = Witness::new();
        witness
            .set("merkleRoot", FieldElement::from(1u64))
            .set_array("pathIndices", vec![FieldElement::ZERO, FieldElement::ONE]);

        assert!(!witness.is_empty());
        assert_eq!(witness.len(), 2);
        assert_eq!(witness.scalar("merkleRoot"), Some(FieldElement::from(1u64)));
        assert_eq!(witness.scalar("pathIndices"), None);
        assert_eq!(witness.scalar("missing"), None);
        assert!(witness.contains("pathIndices"));
    }

    #[test]
    fn test_witness_json_matches_input_json() {
        let mut witness = Witness::new();
        witness
            .set("identitySecret", FieldElement::from(42u64))
            .set_array("pathElements", vec![FieldElement::from(3u64), FieldElement::from(4u64)]);

        let value: serde_json::Value = serde_json::from_str(&witness.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "identitySecret": "42",
                "pathElements": ["3", "4"],
            })
        );

        let back: Witness = serde_json::from_value(value).unwrap();
        assert_eq!(back, witness);
    }

    #[test]
    fn test_groth16_proof_json() {
        let text = r#"{"pi_a":["1","2","1"],"pi_b":[["3","4"],["5","6"],["1","0"]],"pi_c":["7","8","1"],"protocol":"groth16","curve":"bn128"}"#;
        let proof = Groth16Proof::from_json(text).unwrap();
        assert_eq!(proof.pi_b[1], ["5".to_string(), "6".to_string()]);
        assert_eq!(serde_json::to_string(&proof).unwrap(), text);
    }

    #[test]
    fn test_groth16_proof_defaults_and_shape() {
        // protocol/curve may be omitted
        let text = r#"{"pi_a":["1","2","1"],"pi_b":[["3","4"],["5","6"],["1","0"]],"pi_c":["7","8","1"]}"#;
        assert_eq!(Groth16Proof::from_json(text).unwrap().protocol, "groth16");

        // pi_a with two coordinates is not a snarkjs proof
        let short = r#"{"pi_a":["1","2"],"pi_b":[["3","4"],["5","6"],["1","0"]],"pi_c":["7","8","1"]}"#;
        assert!(Groth16Proof::from_json(short).is_err());

        let plonk = r#"{"pi_a":["1","2","1"],"pi_b":[["3","4"],["5","6"],["1","0"]],"pi_c":["7","8","1"],"protocol":"plonk"}"#;
        assert!(matches!(Groth16Proof::from_json(plonk), Err(Error::ProofFormat(_))));
    }

    #[test]
    fn test_from_affine() {
        let proof = Groth16Proof::from_affine(
            ["1".into(), "2".into()],
            [["3".into(), "4".into()], ["5".into(), "6".into()]],
            ["7".into(), "8".into()],
        );
        assert_eq!(proof.pi_a[2], "1");
        assert_eq!(proof.pi_b[2], ["1".to_string(), "0".to_string()]);
        assert_eq!(proof.curve, "bn128");
    }
}
