//! Demo scenarios and their circuit witness layouts
//!
//! Every scenario circuit proves membership of `Poseidon(identitySecret)` in
//! the commitment tree plus `nullifierHash = Poseidon(identitySecret,
//! externalNullifier)`, and binds some scenario-specific signals.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::field::FieldElement;
use crate::hash::FieldHasher;
use crate::merkle::MerkleProof;
use crate::types::Witness;

/// Witness signal names shared by all membership circuits
pub mod signals {
    pub const IDENTITY_SECRET: &str = "identitySecret";
    pub const PATH_ELEMENTS: &str = "pathElements";
    pub const PATH_INDICES: &str = "pathIndices";
    pub const MERKLE_ROOT: &str = "merkleRoot";
    pub const NULLIFIER_HASH: &str = "nullifierHash";
    pub const EXTERNAL_NULLIFIER: &str = "externalNullifier";
    pub const VOTE: &str = "vote";
    pub const RECIPIENT: &str = "recipient";
    pub const BID: &str = "bid";
    pub const BID_SALT: &str = "bidSalt";
    pub const BID_COMMITMENT: &str = "bidCommitment";
}

/// A demo scenario, one compiled circuit each
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Plain anonymous group membership
    Membership,
    /// One anonymous vote per member per round
    Voting,
    /// One claim per member per epoch, bound to a recipient
    Airdrop,
    /// One sealed bid per member per auction
    Auction,
}

impl Scenario {
    /// All scenarios
    pub const ALL: [Scenario; 4] = [
        Scenario::Membership,
        Scenario::Voting,
        Scenario::Airdrop,
        Scenario::Auction,
    ];

    /// Lowercase name, also the artifact directory name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Membership => "membership",
            Self::Voting => "voting",
            Self::Airdrop => "airdrop",
            Self::Auction => "auction",
        }
    }

    /// Caller-supplied inputs this scenario requires
    pub fn required_inputs(&self) -> &'static [&'static str] {
        match self {
            Self::Membership => &[],
            Self::Voting => &[signals::VOTE],
            Self::Airdrop => &[signals::RECIPIENT],
            Self::Auction => &[signals::BID, signals::BID_SALT],
        }
    }

    /// Public signals in the order the circuit exposes them
    pub fn public_signals(&self) -> Vec<&'static str> {
        let mut names = vec![
            signals::MERKLE_ROOT,
            signals::NULLIFIER_HASH,
            signals::EXTERNAL_NULLIFIER,
        ];
        match self {
            Self::Membership => {}
            Self::Voting => names.push(signals::VOTE),
            Self::Airdrop => names.push(signals::RECIPIENT),
            Self::Auction => names.push(signals::BID_COMMITMENT),
        }
        names
    }

    /// Assemble the circuit witness
    pub fn build_witness<H: FieldHasher>(
        &self,
        hasher: &H,
        membership: &MembershipInputs<'_>,
        extra: &BTreeMap<String, FieldElement>,
    ) -> Result<Witness> {
        self.check_inputs(extra)?;

        let mut witness = Witness::new();
        witness
            .set(signals::IDENTITY_SECRET, membership.identity_secret)
            .set_array(signals::PATH_ELEMENTS, membership.path.path_elements.clone())
            .set_array(signals::PATH_INDICES, membership.path.indices_as_field())
            .set(signals::MERKLE_ROOT, membership.merkle_root)
            .set(signals::NULLIFIER_HASH, membership.nullifier_hash)
            .set(signals::EXTERNAL_NULLIFIER, membership.external_context);

        match self {
            Self::Membership => {}
            Self::Voting => {
                witness.set(signals::VOTE, extra[signals::VOTE]);
            }
            Self::Airdrop => {
                witness.set(signals::RECIPIENT, extra[signals::RECIPIENT]);
            }
            Self::Auction => {
                let bid = extra[signals::BID];
                let salt = extra[signals::BID_SALT];
                witness
                    .set(signals::BID, bid)
                    .set(signals::BID_SALT, salt)
                    .set(signals::BID_COMMITMENT, hasher.hash_two(bid, salt)?);
            }
        }
        Ok(witness)
    }

    /// Public signal values the circuit must report for `witness`
    pub fn expected_public_signals(&self, witness: &Witness) -> Result<Vec<FieldElement>> {
        self.public_signals()
            .into_iter()
            .map(|name| {
                witness
                    .scalar(name)
                    .ok_or_else(|| Error::invalid_request(format!("witness lacks public signal {name}")))
            })
            .collect()
    }

    fn check_inputs(&self, extra: &BTreeMap<String, FieldElement>) -> Result<()> {
        let missing: Vec<&str> = self
            .required_inputs()
            .iter()
            .copied()
            .filter(|name| !extra.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(Error::invalid_request(format!(
                "{} scenario requires input(s): {}",
                self.name(),
                missing.join(", ")
            )));
        }
        if let Some(unknown) = extra
            .keys()
            .find(|k| !self.required_inputs().contains(&k.as_str()))
        {
            return Err(Error::invalid_request(format!(
                "{} scenario does not take input {unknown:?}",
                self.name()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::invalid_request(format!("unknown scenario {s:?}")))
    }
}

/// The membership half of every witness
#[derive(Clone, Debug)]
pub struct MembershipInputs<'a> {
    pub identity_secret: FieldElement,
    pub path: &'a MerkleProof,
    pub merkle_root: FieldElement,
    pub nullifier_hash: FieldElement,
    pub external_context: FieldElement,
}
