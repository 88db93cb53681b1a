//! Proof orchestration
//!
//! One proof round walks a fixed, linear sequence of stages:
//!
//! ```text
//! Idle -> BuildingTree -> ComputingMerkleProof -> ComputingNullifier
//!      -> PreparingWitness -> GeneratingProof -> FormattingCalldata -> Done
//! ```
//!
//! Any stage can end the round in `Failed`. Every transition is reported
//! through a synchronous progress callback. The commitment tree is rebuilt
//! from the request on every round; nothing is kept between rounds.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calldata::SolidityCalldata;
use crate::config::ProverConfig;
use crate::error::{Error, Result};
use crate::field::FieldElement;
use crate::hash::FieldHasher;
use crate::identity;
use crate::merkle::MerkleTree;
use crate::prover::Prover;
use crate::scenario::{MembershipInputs, Scenario};
use crate::types::{ProofArtifact, Witness};

/// Orchestrator state
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Idle,
    BuildingTree,
    ComputingMerkleProof,
    ComputingNullifier,
    PreparingWitness,
    GeneratingProof,
    FormattingCalldata,
    Done,
    Failed,
}

impl Stage {
    /// Progress percentage reported on entering the stage
    ///
    /// `Failed` has no fixed value; it repeats the percentage of the stage
    /// that failed.
    pub fn percent(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::BuildingTree => 10,
            Self::ComputingMerkleProof => 20,
            Self::ComputingNullifier => 30,
            Self::PreparingWitness => 40,
            Self::GeneratingProof => 50,
            Self::FormattingCalldata => 90,
            Self::Done => 100,
            Self::Failed => 0,
        }
    }

    /// Human-readable description
    pub fn message(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::BuildingTree => "building commitment tree",
            Self::ComputingMerkleProof => "computing Merkle proof",
            Self::ComputingNullifier => "computing nullifier",
            Self::PreparingWitness => "preparing witness",
            Self::GeneratingProof => "generating proof",
            Self::FormattingCalldata => "formatting calldata",
            Self::Done => "proof ready",
            Self::Failed => "failed",
        }
    }

    /// `Done` or `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// One progress report
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub stage: Stage,
    pub percent: u8,
    pub message: String,
}

/// Everything needed for one proof round
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofRequest {
    pub scenario: Scenario,
    /// The prover's identity secret
    pub identity_secret: FieldElement,
    /// The full group commitment list, in insertion order
    pub commitments: Vec<FieldElement>,
    /// Position of the prover's commitment; located by value when `None`
    pub leaf_index: Option<usize>,
    /// Session context the nullifier is bound to
    pub external_context: FieldElement,
    /// Scenario-specific inputs by signal name
    pub inputs: BTreeMap<String, FieldElement>,
}

impl ProofRequest {
    /// Request without scenario inputs
    pub fn new(
        scenario: Scenario,
        identity_secret: FieldElement,
        commitments: Vec<FieldElement>,
        external_context: FieldElement,
    ) -> Self {
        Self {
            scenario,
            identity_secret,
            commitments,
            leaf_index: None,
            external_context,
            inputs: BTreeMap::new(),
        }
    }

    /// Add a scenario input
    pub fn with_input(mut self, name: impl Into<String>, value: FieldElement) -> Self {
        self.inputs.insert(name.into(), value);
        self
    }

    /// Pin the leaf index instead of searching for the commitment
    pub fn at_index(mut self, index: usize) -> Self {
        self.leaf_index = Some(index);
        self
    }
}

/// Drives one proof round over an injected hasher and prover
pub struct ProofOrchestrator<H, P> {
    hasher: H,
    prover: P,
    config: ProverConfig,
}

impl<H: FieldHasher, P: Prover> ProofOrchestrator<H, P> {
    /// Create an orchestrator
    pub fn new(hasher: H, prover: P, config: ProverConfig) -> Self {
        Self {
            hasher,
            prover,
            config,
        }
    }

    /// Get the config
    pub fn config(&self) -> &ProverConfig {
        &self.config
    }

    /// Get the prover
    pub fn prover(&self) -> &P {
        &self.prover
    }

    /// Run one proof round, reporting every stage transition
    ///
    /// On failure the last report is [`Stage::Failed`] carrying the error
    /// message, and the error is returned unchanged.
    pub fn generate(
        &self,
        request: &ProofRequest,
        on_progress: &mut dyn FnMut(&ProgressUpdate),
    ) -> Result<ProofArtifact> {
        let mut round = Round {
            stage: Stage::Idle,
            percent: 0,
            on_progress,
        };

        match self.run(request, &mut round) {
            Ok(artifact) => Ok(artifact),
            Err(err) => {
                tracing::warn!(
                    scenario = %request.scenario,
                    stage = ?round.stage,
                    error = %err,
                    "proof generation failed"
                );
                let percent = round.percent;
                round.stage = Stage::Failed;
                (round.on_progress)(&ProgressUpdate {
                    stage: Stage::Failed,
                    percent,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// [`generate`](Self::generate) without progress reporting
    pub fn generate_quiet(&self, request: &ProofRequest) -> Result<ProofArtifact> {
        self.generate(request, &mut |_| {})
    }

    /// Verify an artifact against its scenario's verification key
    pub fn verify(&self, artifact: &ProofArtifact) -> Result<bool> {
        let artifacts = self.config.artifacts(artifact.scenario);
        self.prover
            .verify(&artifacts.verification_key, &artifact.public_signals, &artifact.proof)
    }

    fn run(&self, request: &ProofRequest, round: &mut Round<'_>) -> Result<ProofArtifact> {
        let scenario = request.scenario;
        let PreparedWitness {
            witness,
            public_signals: expected,
            merkle_root,
            nullifier_hash,
            ..
        } = prepare_witness(&self.hasher, self.config.tree_depth, request, &mut |stage| {
            round.enter(stage)
        })?;

        round.enter(Stage::GeneratingProof);
        let artifacts = self.config.artifacts(scenario);
        let (proof, public_signals) = {
            let base = Stage::GeneratingProof.percent();
            let span = Stage::FormattingCalldata.percent() - base;
            let on_progress = &mut *round.on_progress;
            self.prover.full_prove(&witness, &artifacts, &mut |pct, msg| {
                let pct = u32::from(pct.min(100));
                on_progress(&ProgressUpdate {
                    stage: Stage::GeneratingProof,
                    percent: base + (pct * u32::from(span) / 100) as u8,
                    message: msg.to_string(),
                });
            })?
        };
        check_public_signals(&expected, &public_signals)?;

        round.enter(Stage::FormattingCalldata);
        let text = self.prover.export_calldata(&proof, &public_signals)?;
        let calldata = SolidityCalldata::parse(&text)?;

        round.enter(Stage::Done);
        Ok(ProofArtifact {
            scenario,
            proof,
            public_signals,
            merkle_root,
            nullifier_hash,
            external_context: request.external_context,
            calldata,
        })
    }
}

/// Everything the circuit needs, computed before the prover runs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedWitness {
    /// snarkjs `input.json` object
    pub witness: Witness,
    /// Public signals the witness implies, in circuit order
    pub public_signals: Vec<FieldElement>,
    pub leaf_index: usize,
    pub merkle_root: FieldElement,
    pub nullifier_hash: FieldElement,
}

/// Build the tree, locate the leaf, derive the nullifier and lay out the
/// scenario witness
///
/// `on_stage` is called as each of the four preparation stages begins. The
/// orchestrator and the browser bindings both go through here.
pub fn prepare_witness<H: FieldHasher>(
    hasher: &H,
    depth: usize,
    request: &ProofRequest,
    on_stage: &mut dyn FnMut(Stage),
) -> Result<PreparedWitness> {
    let scenario = request.scenario;

    on_stage(Stage::BuildingTree);
    let tree = MerkleTree::from_leaves(depth, hasher, &request.commitments)?;
    let merkle_root = tree.root()?;

    on_stage(Stage::ComputingMerkleProof);
    let commitment = identity::commitment(hasher, request.identity_secret)?;
    let leaf_index = match request.leaf_index {
        Some(index) => index,
        None => tree
            .index_of(&commitment)
            .ok_or_else(|| Error::invalid_request("identity commitment is not in the group"))?,
    };
    let path = tree.proof(leaf_index)?;
    if let Some(leaf) = tree.leaf(leaf_index) {
        identity::verify_commitment(hasher, request.identity_secret, leaf)?;
    }

    on_stage(Stage::ComputingNullifier);
    let nullifier_hash =
        identity::nullifier_hash(hasher, request.identity_secret, request.external_context)?;

    on_stage(Stage::PreparingWitness);
    let membership = MembershipInputs {
        identity_secret: request.identity_secret,
        path: &path,
        merkle_root,
        nullifier_hash,
        external_context: request.external_context,
    };
    let witness = scenario.build_witness(hasher, &membership, &request.inputs)?;
    let public_signals = scenario.expected_public_signals(&witness)?;
    tracing::debug!(signals = witness.len(), leaf_index, "witness prepared");

    Ok(PreparedWitness {
        witness,
        public_signals,
        leaf_index,
        merkle_root,
        nullifier_hash,
    })
}

struct Round<'a> {
    stage: Stage,
    percent: u8,
    on_progress: &'a mut dyn FnMut(&ProgressUpdate),
}

impl Round<'_> {
    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        self.percent = stage.percent();
        tracing::info!(stage = ?stage, percent = self.percent, "{}", stage.message());
        (self.on_progress)(&ProgressUpdate {
            stage,
            percent: self.percent,
            message: stage.message().to_string(),
        });
    }
}

/// The circuit must report exactly the public signals the witness implies
fn check_public_signals(expected: &[FieldElement], actual: &[FieldElement]) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(Error::prover(format!(
            "circuit returned {} public signals, expected {}",
            actual.len(),
            expected.len()
        )));
    }
    match expected.iter().zip(actual).find(|(e, a)| e != a) {
        Some((&expected, &actual)) => Err(Error::VerificationMismatch {
            what: "public signal",
            expected,
            actual,
        }),
        None => Ok(()),
    }
}
