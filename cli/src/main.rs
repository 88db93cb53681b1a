//! zkcred CLI - Anonymous credential proofs from the command line
//!
//! Commands:
//! - identity: Generate (or rebuild) an identity secret and commitment
//! - commit: Compute the commitment of a secret
//! - nullifier: Compute the nullifier hash for a context
//! - tree: Merkle root and inclusion proofs for a group file
//! - prove: Run a full proof round through snarkjs
//! - verify: Verify a proof artifact against its verification key
//! - calldata: Format Solidity verifier calldata
//!
//! Results go to stdout as JSON; logs and progress go to stderr
//! (`RUST_LOG` controls the filter, default `info`).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use zkcred_prover::prelude::*;
use zkcred_prover::prover::parse_public_signals;
use zkcred_prover::{identity, Groth16Proof, ProverConfig, SolidityCalldata};

mod types;

use types::*;

#[derive(Parser)]
#[command(name = "zkcred")]
#[command(about = "Anonymous credential proofs over a Poseidon Merkle tree", long_about = None)]
struct Cli {
    /// Prover config (TOML); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// External context: a field element, or a label mapped with keccak256
#[derive(Args)]
#[group(required = true, multiple = false)]
struct ContextArgs {
    /// External nullifier as a field element (decimal or 0x hex)
    #[arg(long)]
    context: Option<FieldElement>,

    /// External nullifier derived from a label (e.g. "election-2026")
    #[arg(long)]
    label: Option<String>,
}

impl ContextArgs {
    fn value(&self) -> FieldElement {
        match (&self.context, &self.label) {
            (Some(context), _) => *context,
            (None, Some(label)) => FieldElement::from_label(label),
            (None, None) => FieldElement::ZERO,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a fresh identity (keep the secret private!)
    Identity {
        /// Rebuild from a known secret instead of generating one
        #[arg(short, long)]
        secret: Option<FieldElement>,

        /// Also write the identity to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute the commitment of a secret
    Commit {
        #[arg(short, long)]
        secret: FieldElement,
    },

    /// Compute the nullifier hash of a secret within a context
    Nullifier {
        #[arg(short, long)]
        secret: FieldElement,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Merkle tree operations over a group file
    Tree {
        #[command(subcommand)]
        command: TreeCommands,
    },

    /// Generate a proof with snarkjs
    Prove {
        /// Scenario circuit (membership, voting, airdrop, auction)
        #[arg(long, default_value = "membership")]
        scenario: Scenario,

        /// Identity secret
        #[arg(short, long)]
        secret: FieldElement,

        /// Group file (JSON with a `commitments` array)
        #[arg(short, long)]
        group: PathBuf,

        /// Leaf index; located by commitment when omitted
        #[arg(short, long)]
        index: Option<usize>,

        #[command(flatten)]
        context: ContextArgs,

        /// Scenario input as name=value (repeatable)
        #[arg(long = "input", value_name = "NAME=VALUE")]
        inputs: Vec<String>,

        /// Output artifact file
        #[arg(short, long, default_value = "artifact.json")]
        output: PathBuf,
    },

    /// Verify a proof artifact natively
    Verify {
        /// Artifact written by `prove`
        #[arg(short, long, default_value = "artifact.json")]
        artifact: PathBuf,

        /// Verification key; taken from the config when omitted
        #[arg(long)]
        vkey: Option<PathBuf>,
    },

    /// Print verifier calldata in the snarkjs text form
    Calldata {
        /// Artifact written by `prove`
        #[arg(short, long, conflicts_with_all = ["proof", "public"])]
        artifact: Option<PathBuf>,

        /// snarkjs proof.json
        #[arg(long, requires = "public")]
        proof: Option<PathBuf>,

        /// snarkjs public.json
        #[arg(long, requires = "proof")]
        public: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TreeCommands {
    /// Print the Merkle root
    Root {
        #[arg(short, long)]
        group: PathBuf,
    },

    /// Print the inclusion proof for one leaf
    Proof {
        #[arg(short, long)]
        group: PathBuf,

        #[arg(short, long)]
        index: usize,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => ProverConfig::load(path).context("loading config")?,
        None => ProverConfig::default(),
    };
    let poseidon = CircomPoseidon::initialized().context("initializing Poseidon")?;

    match cli.command {
        Commands::Identity { secret, output } => cmd_identity(&poseidon, secret, output.as_deref())?,
        Commands::Commit { secret } => cmd_commit(&poseidon, secret)?,
        Commands::Nullifier { secret, context } => cmd_nullifier(&poseidon, secret, context.value())?,
        Commands::Tree { command } => match command {
            TreeCommands::Root { group } => cmd_tree_root(&poseidon, &config, &group)?,
            TreeCommands::Proof { group, index } => cmd_tree_proof(&poseidon, &config, &group, index)?,
        },
        Commands::Prove {
            scenario,
            secret,
            group,
            index,
            context,
            inputs,
            output,
        } => {
            let group = GroupData::load(&group)?;
            group.require_member(&identity::commitment(&poseidon, secret)?)?;
            let mut request = ProofRequest::new(scenario, secret, group.commitments, context.value());
            request.leaf_index = index;
            request.inputs = inputs
                .iter()
                .map(|arg| parse_input(arg))
                .collect::<Result<BTreeMap<_, _>>>()?;
            cmd_prove(poseidon, config, &request, &output)?;
        }
        Commands::Verify { artifact, vkey } => return cmd_verify(&config, &artifact, vkey.as_deref()),
        Commands::Calldata {
            artifact,
            proof,
            public,
        } => cmd_calldata(artifact.as_deref(), proof.as_deref(), public.as_deref())?,
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_identity(poseidon: &CircomPoseidon, secret: Option<FieldElement>, output: Option<&Path>) -> Result<()> {
    let identity = match secret {
        Some(secret) => Identity::from_secret(poseidon, secret)?,
        None => Identity::generate(poseidon)?,
    };

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&identity)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), "identity saved");
    }

    print_json(&IdentityOutput {
        secret: identity.secret,
        commitment: identity.commitment,
    })
}

fn cmd_commit(poseidon: &CircomPoseidon, secret: FieldElement) -> Result<()> {
    print_json(&identity::commitment(poseidon, secret)?)
}

fn cmd_nullifier(poseidon: &CircomPoseidon, secret: FieldElement, context: FieldElement) -> Result<()> {
    print_json(&NullifierOutput {
        external_nullifier: context,
        nullifier_hash: identity::nullifier_hash(poseidon, secret, context)?,
    })
}

fn load_tree(poseidon: &CircomPoseidon, config: &ProverConfig, group: &Path) -> Result<MerkleTree<CircomPoseidon>> {
    let group = GroupData::load(group)?;
    let tree = MerkleTree::from_leaves(config.tree_depth, *poseidon, &group.commitments)
        .context("building commitment tree")?;
    Ok(tree)
}

fn cmd_tree_root(poseidon: &CircomPoseidon, config: &ProverConfig, group: &Path) -> Result<()> {
    let tree = load_tree(poseidon, config, group)?;
    print_json(&RootOutput {
        depth: tree.depth(),
        leaf_count: tree.leaf_count(),
        root: tree.root()?,
    })
}

fn cmd_tree_proof(poseidon: &CircomPoseidon, config: &ProverConfig, group: &Path, index: usize) -> Result<()> {
    let tree = load_tree(poseidon, config, group)?;
    let proof = tree.proof(index)?;
    let leaf = tree.leaf(index).context("leaf vanished")?;
    print_json(&ProofOutput {
        root: tree.root()?,
        leaf,
        proof,
    })
}

fn cmd_prove(poseidon: CircomPoseidon, config: ProverConfig, request: &ProofRequest, output: &Path) -> Result<()> {
    let prover = SnarkjsProver::from_config(&config);
    let artifacts = config.artifacts(request.scenario);
    let missing = artifacts.missing();
    if !missing.is_empty() {
        tracing::warn!(?missing, "circuit artifacts not found");
    }

    let orchestrator = ProofOrchestrator::new(poseidon, prover, config);
    let artifact = orchestrator
        .generate(request, &mut |update| {
            eprintln!("[{:>3}%] {}", update.percent, update.message);
        })
        .with_context(|| format!("{} proof failed", request.scenario))?;

    fs::write(output, artifact.to_json()?).with_context(|| format!("writing {}", output.display()))?;
    tracing::info!(path = %output.display(), "artifact saved");

    print_json(&artifact)
}

fn cmd_verify(config: &ProverConfig, artifact: &Path, vkey: Option<&Path>) -> Result<ExitCode> {
    let json = fs::read_to_string(artifact).with_context(|| format!("reading {}", artifact.display()))?;
    let artifact = ProofArtifact::from_json(&json).context("parsing artifact")?;

    let vkey = match vkey {
        Some(path) => path.to_path_buf(),
        None => config.artifacts(artifact.scenario).verification_key,
    };
    let prover = SnarkjsProver::from_config(config);
    let valid = prover
        .verify(&vkey, &artifact.public_signals, &artifact.proof)
        .with_context(|| format!("verifying against {}", vkey.display()))?;

    print_json(&VerifyOutput {
        scenario: artifact.scenario.to_string(),
        valid,
    })?;
    Ok(if valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn cmd_calldata(artifact: Option<&Path>, proof: Option<&Path>, public: Option<&Path>) -> Result<()> {
    let (proof, signals) = match (artifact, proof, public) {
        (Some(path), _, _) => {
            let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            let artifact = ProofArtifact::from_json(&json).context("parsing artifact")?;
            (artifact.proof, artifact.public_signals)
        }
        (None, Some(proof), Some(public)) => {
            let proof_json = fs::read_to_string(proof).with_context(|| format!("reading {}", proof.display()))?;
            let public_json =
                fs::read_to_string(public).with_context(|| format!("reading {}", public.display()))?;
            (Groth16Proof::from_json(&proof_json)?, parse_public_signals(&public_json)?)
        }
        _ => bail!("pass --artifact, or both --proof and --public"),
    };

    let calldata = SolidityCalldata::from_proof(&proof, &signals)?;
    println!("{}", calldata.to_snarkjs_string());
    Ok(())
}
