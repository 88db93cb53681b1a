//! Native Groth16 verification of snarkjs proofs
//!
//! Reads the snarkjs `verification_key.json` / `proof.json` layouts, converts
//! them into arkworks types and runs the pairing check with `ark-groth16`.
//! Points are validated (on curve, in the prime-order subgroup) before use.

use std::fs;
use std::path::Path;

use ark_bn254::{Bn254, Fq, Fq2, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::PrimeField;
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, VerifyingKey};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::field::FieldElement;
use crate::types::Groth16Proof;

/// A Groth16 verification key in the snarkjs JSON layout
///
/// `vk_alphabeta_12` is ignored: it is derived from alpha and beta.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKey {
    pub protocol: String,
    pub curve: String,
    #[serde(rename = "nPublic")]
    pub n_public: usize,
    pub vk_alpha_1: [String; 3],
    pub vk_beta_2: [[String; 2]; 3],
    pub vk_gamma_2: [[String; 2]; 3],
    pub vk_delta_2: [[String; 2]; 3],
    #[serde(rename = "IC")]
    pub ic: Vec<[String; 3]>,
}

impl VerificationKey {
    /// Parse `verification_key.json` text
    pub fn from_json(text: &str) -> Result<Self> {
        let vk: Self = serde_json::from_str(text)?;
        if vk.protocol != "groth16" {
            return Err(Error::proof_format(format!("unsupported protocol {:?}", vk.protocol)));
        }
        if vk.ic.len() != vk.n_public + 1 {
            return Err(Error::proof_format(format!(
                "IC has {} points for {} public inputs",
                vk.ic.len(),
                vk.n_public
            )));
        }
        Ok(vk)
    }

    /// Load `verification_key.json`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Convert into an arkworks verifying key, validating every point
    pub fn to_arkworks(&self) -> Result<VerifyingKey<Bn254>> {
        Ok(VerifyingKey {
            alpha_g1: g1(&self.vk_alpha_1)?,
            beta_g2: g2(&self.vk_beta_2)?,
            gamma_g2: g2(&self.vk_gamma_2)?,
            delta_g2: g2(&self.vk_delta_2)?,
            gamma_abc_g1: self.ic.iter().map(g1).collect::<Result<Vec<_>>>()?,
        })
    }

    /// Encode an arkworks verifying key in the snarkjs layout
    pub fn from_arkworks(vk: &VerifyingKey<Bn254>) -> Self {
        Self {
            protocol: "groth16".into(),
            curve: "bn128".into(),
            n_public: vk.gamma_abc_g1.len().saturating_sub(1),
            vk_alpha_1: g1_coords(&vk.alpha_g1),
            vk_beta_2: g2_coords(&vk.beta_g2),
            vk_gamma_2: g2_coords(&vk.gamma_g2),
            vk_delta_2: g2_coords(&vk.delta_g2),
            ic: vk.gamma_abc_g1.iter().map(g1_coords).collect(),
        }
    }
}

impl Groth16Proof {
    /// Convert into an arkworks proof, validating every point
    pub fn to_arkworks(&self) -> Result<Proof<Bn254>> {
        Ok(Proof {
            a: g1(&self.pi_a)?,
            b: g2(&self.pi_b)?,
            c: g1(&self.pi_c)?,
        })
    }

    /// Encode an arkworks proof in the snarkjs layout
    pub fn from_arkworks(proof: &Proof<Bn254>) -> Self {
        Self {
            pi_a: g1_coords(&proof.a),
            pi_b: g2_coords(&proof.b),
            pi_c: g1_coords(&proof.c),
            protocol: "groth16".into(),
            curve: "bn128".into(),
        }
    }
}

/// Verify `proof` against `vk` and the public signals in circuit order
///
/// `Ok(false)` means a well-formed proof that does not verify; malformed
/// input is an error.
pub fn verify(vk: &VerificationKey, public_signals: &[FieldElement], proof: &Groth16Proof) -> Result<bool> {
    if public_signals.len() != vk.n_public {
        return Err(Error::proof_format(format!(
            "verification key expects {} public signals, got {}",
            vk.n_public,
            public_signals.len()
        )));
    }

    let pvk = PreparedVerifyingKey::from(vk.to_arkworks()?);
    let proof = proof.to_arkworks()?;
    let inputs: Vec<_> = public_signals.iter().map(|s| s.into_inner()).collect();

    let valid = Groth16::<Bn254>::verify_proof(&pvk, &proof, &inputs)
        .map_err(|e| Error::proof_format(e.to_string()))?;
    tracing::debug!(valid, n_public = vk.n_public, "groth16 verification");
    Ok(valid)
}

/// [`verify`] with the key read from a file
pub fn verify_with_key_file(
    verification_key: impl AsRef<Path>,
    public_signals: &[FieldElement],
    proof: &Groth16Proof,
) -> Result<bool> {
    verify(&VerificationKey::load(verification_key)?, public_signals, proof)
}

fn fq(decimal: &str) -> Result<Fq> {
    let value: BigUint = decimal
        .trim()
        .parse()
        .map_err(|_| Error::proof_format(format!("coordinate {decimal:?} is not a decimal integer")))?;
    if value >= BigUint::from(Fq::MODULUS) {
        return Err(Error::proof_format(format!("coordinate {decimal} is not below the base field modulus")));
    }
    Ok(Fq::from(value))
}

fn fq_decimal(x: &Fq) -> String {
    BigUint::from(x.into_bigint()).to_string()
}

fn g1(coords: &[String; 3]) -> Result<G1Affine> {
    match coords[2].as_str() {
        "0" => return Ok(G1Affine::zero()),
        "1" => {}
        z => return Err(Error::proof_format(format!("G1 point not normalized (z = {z})"))),
    }
    let point = G1Affine::new_unchecked(fq(&coords[0])?, fq(&coords[1])?);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(Error::proof_format("G1 point not in the prime-order subgroup"));
    }
    Ok(point)
}

fn g2(coords: &[[String; 2]; 3]) -> Result<G2Affine> {
    match (coords[2][0].as_str(), coords[2][1].as_str()) {
        ("0", "0") => return Ok(G2Affine::zero()),
        ("1", "0") => {}
        (z0, z1) => {
            return Err(Error::proof_format(format!(
                "G2 point not normalized (z = [{z0}, {z1}])"
            )))
        }
    }
    let x = Fq2::new(fq(&coords[0][0])?, fq(&coords[0][1])?);
    let y = Fq2::new(fq(&coords[1][0])?, fq(&coords[1][1])?);
    let point = G2Affine::new_unchecked(x, y);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(Error::proof_format("G2 point not in the prime-order subgroup"));
    }
    Ok(point)
}

fn g1_coords(p: &G1Affine) -> [String; 3] {
    if p.infinity {
        return ["0".into(), "1".into(), "0".into()];
    }
    [fq_decimal(&p.x), fq_decimal(&p.y), "1".into()]
}

fn g2_coords(p: &G2Affine) -> [[String; 2]; 3] {
    if p.infinity {
        return [
            ["0".into(), "0".into()],
            ["1".into(), "0".into()],
            ["0".into(), "0".into()],
        ];
    }
    [
        [fq_decimal(&p.x.c0), fq_decimal(&p.x.c1)],
        [fq_decimal(&p.y.c0), fq_decimal(&p.y.c1)],
        ["1".into(), "0".into()],
    ]
}
