//! Proving backend capability
//!
//! The Groth16 prover is an external collaborator: witness in, proof and
//! public signals out. [`Prover`] is the seam; [`SnarkjsProver`] drives the
//! snarkjs CLI against compiled circuit artifacts.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::calldata::SolidityCalldata;
use crate::config::{CircuitArtifacts, ProverConfig};
use crate::error::{Error, Result};
use crate::field::FieldElement;
use crate::types::{Groth16Proof, Witness};
use crate::verifier;

/// Cooperative progress report: percent complete and a message
pub type Progress<'a> = dyn FnMut(u8, &str) + 'a;

/// A Groth16 proving backend
pub trait Prover {
    /// Compute the witness and prove it against `artifacts`
    ///
    /// Failures, including witness names the circuit does not know, surface
    /// as [`Error::Prover`].
    fn full_prove(
        &self,
        witness: &Witness,
        artifacts: &CircuitArtifacts,
        progress: &mut Progress<'_>,
    ) -> Result<(Groth16Proof, Vec<FieldElement>)>;

    /// Check a proof against a verification key file
    fn verify(
        &self,
        verification_key: &Path,
        public_signals: &[FieldElement],
        proof: &Groth16Proof,
    ) -> Result<bool> {
        verifier::verify_with_key_file(verification_key, public_signals, proof)
    }

    /// Calldata text in the snarkjs `soliditycalldata` form
    fn export_calldata(&self, proof: &Groth16Proof, public_signals: &[FieldElement]) -> Result<String> {
        Ok(SolidityCalldata::from_proof(proof, public_signals)?.to_snarkjs_string())
    }
}

impl<P: Prover + ?Sized> Prover for &P {
    fn full_prove(
        &self,
        witness: &Witness,
        artifacts: &CircuitArtifacts,
        progress: &mut Progress<'_>,
    ) -> Result<(Groth16Proof, Vec<FieldElement>)> {
        (**self).full_prove(witness, artifacts, progress)
    }

    fn verify(
        &self,
        verification_key: &Path,
        public_signals: &[FieldElement],
        proof: &Groth16Proof,
    ) -> Result<bool> {
        (**self).verify(verification_key, public_signals, proof)
    }

    fn export_calldata(&self, proof: &Groth16Proof, public_signals: &[FieldElement]) -> Result<String> {
        (**self).export_calldata(proof, public_signals)
    }
}

/// Prover that shells out to `snarkjs groth16 fullprove`
#[derive(Clone, Debug)]
pub struct SnarkjsProver {
    bin: PathBuf,
}

impl SnarkjsProver {
    /// Use the given snarkjs executable
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    /// Use the executable named in the config
    pub fn from_config(config: &ProverConfig) -> Self {
        Self::new(config.snarkjs_bin.clone())
    }

    /// The snarkjs executable
    pub fn bin(&self) -> &Path {
        &self.bin
    }

    fn run(&self, args: &[&Path]) -> Result<()> {
        let output = Command::new(&self.bin)
            .args(["groth16", "fullprove"])
            .args(args)
            .output()
            .map_err(|e| Error::prover(format!("failed to run {}: {e}", self.bin.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(Error::prover(format!(
                "snarkjs exited with {}: {}",
                output.status,
                detail.trim()
            )));
        }
        Ok(())
    }
}

impl Default for SnarkjsProver {
    fn default() -> Self {
        Self::new("snarkjs")
    }
}

impl Prover for SnarkjsProver {
    fn full_prove(
        &self,
        witness: &Witness,
        artifacts: &CircuitArtifacts,
        progress: &mut Progress<'_>,
    ) -> Result<(Groth16Proof, Vec<FieldElement>)> {
        if let Some(missing) = [&artifacts.wasm, &artifacts.zkey]
            .into_iter()
            .find(|p| !p.exists())
        {
            return Err(Error::prover(format!(
                "missing circuit artifact {}",
                missing.display()
            )));
        }

        let scratch = tempfile::Builder::new()
            .prefix("zkcred-")
            .tempdir()
            .map_err(|e| Error::prover(format!("scratch directory: {e}")))?;
        let input = scratch.path().join("input.json");
        let proof_path = scratch.path().join("proof.json");
        let public_path = scratch.path().join("public.json");

        fs::write(&input, witness.to_json()?)
            .map_err(|e| Error::prover(format!("writing witness: {e}")))?;

        progress(10, "computing witness and proving (snarkjs)");
        tracing::debug!(
            bin = %self.bin.display(),
            wasm = %artifacts.wasm.display(),
            zkey = %artifacts.zkey.display(),
            "running snarkjs groth16 fullprove"
        );
        self.run(&[&input, &artifacts.wasm, &artifacts.zkey, &proof_path, &public_path])?;
        progress(90, "reading proof");

        let proof_text = fs::read_to_string(&proof_path)
            .map_err(|e| Error::prover(format!("reading proof.json: {e}")))?;
        let proof = Groth16Proof::from_json(&proof_text)
            .map_err(|e| Error::prover(format!("unreadable proof.json: {e}")))?;

        let public_text = fs::read_to_string(&public_path)
            .map_err(|e| Error::prover(format!("reading public.json: {e}")))?;
        let public_signals = parse_public_signals(&public_text)
            .map_err(|e| Error::prover(format!("unreadable public.json: {e}")))?;

        progress(100, "proof generated");
        Ok((proof, public_signals))
    }
}

/// Parse snarkjs `public.json` (an array of decimal strings)
pub fn parse_public_signals(text: &str) -> Result<Vec<FieldElement>> {
    let raw: Vec<String> = serde_json::from_str(text)?;
    raw.iter().map(|s| FieldElement::from_decimal(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;

    #[test]
    fn test_parse_public_signals() {
        let signals = parse_public_signals(r#"["1", "22", "333"]"#).unwrap();
        assert_eq!(
            signals,
            vec![FieldElement::from(1u64), FieldElement::from(22u64), FieldElement::from(333u64)]
        );
        assert!(parse_public_signals(r#"[1, 2]"#).is_err());
        assert!(parse_public_signals(r#"["0x01"]"#).is_err());
    }

    #[test]
    fn test_missing_artifacts_fail_before_spawning() {
        let prover = SnarkjsProver::new("/definitely/not/snarkjs");
        let artifacts = CircuitArtifacts::in_dir(Path::new("/nonexistent"), Scenario::Voting);
        let mut calls = 0;
        let err = prover
            .full_prove(&Witness::new(), &artifacts, &mut |_, _| calls += 1)
            .unwrap_err();

        assert!(matches!(err, Error::Prover(ref msg) if msg.contains("voting.wasm")));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_missing_binary_is_prover_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = CircuitArtifacts {
            wasm: dir.path().join("c.wasm"),
            zkey: dir.path().join("c.zkey"),
            verification_key: dir.path().join("vk.json"),
        };
        fs::write(&artifacts.wasm, b"\0asm").unwrap();
        fs::write(&artifacts.zkey, b"zkey").unwrap();

        let prover = SnarkjsProver::new("/definitely/not/snarkjs");
        let err = prover
            .full_prove(&Witness::new(), &artifacts, &mut |_, _| {})
            .unwrap_err();
        assert!(matches!(err, Error::Prover(ref msg) if msg.contains("failed to run")));
    }
}
