//! zkcred CLI types

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use zkcred_prover::field::FieldElement;
use zkcred_prover::merkle::MerkleProof;

/// Group membership list, as published by the group operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupData {
    /// Optional label, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Identity commitments in insertion order
    pub commitments: Vec<FieldElement>,
}

impl GroupData {
    /// Load a group file
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading group file {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing group file {}", path.display()))
    }

    /// Find the index of a commitment
    pub fn find_leaf(&self, commitment: &FieldElement) -> Option<usize> {
        self.commitments.iter().position(|leaf| leaf == commitment)
    }

    /// Index of a commitment, or an error naming the missing member
    pub fn require_member(&self, commitment: &FieldElement) -> Result<usize> {
        match self.find_leaf(commitment) {
            Some(index) => Ok(index),
            None => bail!(
                "commitment {commitment} is not in group {}",
                self.name.as_deref().unwrap_or("(unnamed)")
            ),
        }
    }
}

/// `identity` command output (keep private!)
#[derive(Debug, Serialize)]
pub struct IdentityOutput {
    pub secret: FieldElement,
    pub commitment: FieldElement,
}

/// `nullifier` command output
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NullifierOutput {
    pub external_nullifier: FieldElement,
    pub nullifier_hash: FieldElement,
}

/// `tree root` command output
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootOutput {
    pub depth: usize,
    pub leaf_count: usize,
    pub root: FieldElement,
}

/// `tree proof` command output
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofOutput {
    pub root: FieldElement,
    pub leaf: FieldElement,
    #[serde(flatten)]
    pub proof: MerkleProof,
}

/// `verify` command output
#[derive(Debug, Serialize)]
pub struct VerifyOutput {
    pub scenario: String,
    pub valid: bool,
}

/// Parse a `name=value` scenario input
pub fn parse_input(arg: &str) -> Result<(String, FieldElement)> {
    let Some((name, value)) = arg.split_once('=') else {
        bail!("expected name=value, got {arg:?}");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("empty input name in {arg:?}");
    }
    let value: FieldElement = value
        .trim()
        .parse()
        .with_context(|| format!("input {name}"))?;
    Ok((name.to_string(), value))
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(
            parse_input("vote=2").unwrap(),
            ("vote".to_string(), FieldElement::from(2u64))
        );
        assert_eq!(
            parse_input(" recipient = 0x0a ").unwrap().1,
            FieldElement::from(10u64)
        );
        assert!(parse_input("vote").is_err());
        assert!(parse_input("=3").is_err());
        assert!(parse_input("bid=abc").is_err());
    }

    #[test]
    fn test_group_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("group.json");
        fs::write(&path, r#"{"name": "demo", "commitments": ["5", "7", "9"]}"#).unwrap();

        let group = GroupData::load(&path).unwrap();
        assert_eq!(group.commitments.len(), 3);
        assert_eq!(group.find_leaf(&FieldElement::from(7u64)), Some(1));
        assert_eq!(group.find_leaf(&FieldElement::from(8u64)), None);
        assert_eq!(group.require_member(&FieldElement::from(9u64)).unwrap(), 2);
        let err = group.require_member(&FieldElement::from(8u64)).unwrap_err();
        assert!(err.to_string().contains("not in group demo"));

        assert!(GroupData::load(&dir.path().join("missing.json")).is_err());
    }
}
