//! Deterministic test doubles shared by the integration tests

#![allow(dead_code)]

use std::cell::RefCell;

use ark_bn254::Fr;
use zkcred_prover::config::CircuitArtifacts;
use zkcred_prover::error::{Error, Result};
use zkcred_prover::field::FieldElement;
use zkcred_prover::hash::FieldHasher;
use zkcred_prover::prover::{Progress, Prover};
use zkcred_prover::scenario::Scenario;
use zkcred_prover::types::{Groth16Proof, Witness};

/// `h(x0, .., xn) = 1*x0 + 2*x1 + ..`, so `h(a, b) = a + 2b` and `h(x) = x`
///
/// Order-sensitive and hand-computable; `h(0, 0) = 0` keeps every empty
/// subtree at zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearHasher;

impl FieldHasher for LinearHasher {
    fn hash(&self, inputs: &[FieldElement]) -> Result<FieldElement> {
        if inputs.is_empty() {
            return Err(Error::Hash("no inputs".into()));
        }
        let mut acc = Fr::from(0u64);
        for (i, x) in inputs.iter().enumerate() {
            acc += Fr::from(i as u64 + 1) * x.into_inner();
        }
        Ok(FieldElement::from(acc))
    }
}

pub fn fe(n: u64) -> FieldElement {
    FieldElement::from(n)
}

/// Fixed proof points; the stub never checks them
pub fn dummy_proof() -> Groth16Proof {
    Groth16Proof::from_affine(
        ["1".into(), "2".into()],
        [["3".into(), "4".into()], ["5".into(), "6".into()]],
        ["7".into(), "8".into()],
    )
}

/// What the stub prover should do
#[derive(Clone, Debug)]
pub enum Behavior {
    /// Report exactly the public signals the witness implies
    Honest,
    /// Fail like snarkjs does on an unknown signal name
    Fail(String),
    /// Replace the public signal at `index`
    Tamper { index: usize, value: FieldElement },
}

/// Prover double that derives its public signals from the witness
pub struct StubProver {
    scenario: Scenario,
    behavior: Behavior,
    /// Witnesses received, in call order
    pub witnesses: RefCell<Vec<Witness>>,
}

impl StubProver {
    pub fn new(scenario: Scenario, behavior: Behavior) -> Self {
        Self {
            scenario,
            behavior,
            witnesses: RefCell::new(Vec::new()),
        }
    }

    pub fn honest(scenario: Scenario) -> Self {
        Self::new(scenario, Behavior::Honest)
    }
}

impl Prover for StubProver {
    fn full_prove(
        &self,
        witness: &Witness,
        _artifacts: &CircuitArtifacts,
        progress: &mut Progress<'_>,
    ) -> Result<(Groth16Proof, Vec<FieldElement>)> {
        self.witnesses.borrow_mut().push(witness.clone());
        progress(0, "stub: witness");
        if let Behavior::Fail(msg) = &self.behavior {
            return Err(Error::prover(msg.clone()));
        }

        let mut signals = self.scenario.expected_public_signals(witness)?;
        if let Behavior::Tamper { index, value } = &self.behavior {
            signals[*index] = *value;
        }
        progress(100, "stub: proved");
        Ok((dummy_proof(), signals))
    }
}
