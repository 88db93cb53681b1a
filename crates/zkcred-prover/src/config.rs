//! Prover configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! tree_depth = 10
//! snarkjs_bin = "snarkjs"
//! artifacts_dir = "circuits"
//!
//! [circuits.voting]
//! wasm = "build/voting_js/voting.wasm"
//! zkey = "build/voting_final.zkey"
//! verification_key = "build/voting_vkey.json"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::merkle::{MAX_TREE_DEPTH, TREE_DEPTH};
use crate::scenario::Scenario;

/// Compiled circuit files for one scenario, treated as opaque inputs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitArtifacts {
    /// circom-generated witness calculator
    pub wasm: PathBuf,
    /// Groth16 proving key
    pub zkey: PathBuf,
    /// snarkjs verification key JSON
    pub verification_key: PathBuf,
}

impl CircuitArtifacts {
    /// Conventional layout under `dir/<scenario>/`
    pub fn in_dir(dir: &Path, scenario: Scenario) -> Self {
        let name = scenario.name();
        let base = dir.join(name);
        Self {
            wasm: base.join(format!("{name}.wasm")),
            zkey: base.join(format!("{name}_final.zkey")),
            verification_key: base.join("verification_key.json"),
        }
    }

    /// Files that do not exist on disk
    pub fn missing(&self) -> Vec<&Path> {
        [&self.wasm, &self.zkey, &self.verification_key]
            .into_iter()
            .map(PathBuf::as_path)
            .filter(|p| !p.exists())
            .collect()
    }
}

fn default_tree_depth() -> usize {
    TREE_DEPTH
}

fn default_snarkjs_bin() -> PathBuf {
    PathBuf::from("snarkjs")
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("circuits")
}

/// Prover configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverConfig {
    /// Commitment tree depth; must match the compiled circuits
    #[serde(default = "default_tree_depth")]
    pub tree_depth: usize,
    /// snarkjs executable
    #[serde(default = "default_snarkjs_bin")]
    pub snarkjs_bin: PathBuf,
    /// Root of the conventional artifact layout
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
    /// Per-scenario overrides, keyed by scenario name
    #[serde(default)]
    pub circuits: BTreeMap<String, CircuitArtifacts>,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            tree_depth: default_tree_depth(),
            snarkjs_bin: default_snarkjs_bin(),
            artifacts_dir: default_artifacts_dir(),
            circuits: BTreeMap::new(),
        }
    }
}

impl ProverConfig {
    /// Default config rooted at a different artifact directory
    pub fn with_artifacts_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Parse and validate TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), tree_depth = config.tree_depth, "loaded config");
        Ok(config)
    }

    /// Check value ranges and override keys
    pub fn validate(&self) -> Result<()> {
        if self.tree_depth == 0 || self.tree_depth > MAX_TREE_DEPTH {
            return Err(Error::Config(format!(
                "tree_depth {} outside 1..={MAX_TREE_DEPTH}",
                self.tree_depth
            )));
        }
        for name in self.circuits.keys() {
            let scenario = name
                .parse::<Scenario>()
                .map_err(|_| Error::Config(format!("unknown scenario in [circuits]: {name:?}")))?;
            // Lookups use the lowercase name
            if name.as_str() != scenario.name() {
                return Err(Error::Config(format!(
                    "[circuits.{name}] must be written [circuits.{}]",
                    scenario.name()
                )));
            }
        }
        Ok(())
    }

    /// Artifact paths for `scenario`, override first
    pub fn artifacts(&self, scenario: Scenario) -> CircuitArtifacts {
        self.circuits
            .get(scenario.name())
            .cloned()
            .unwrap_or_else(|| CircuitArtifacts::in_dir(&self.artifacts_dir, scenario))
    }
}
