//! Field hash adapter
//!
//! Everything that hashes field elements goes through the [`FieldHasher`]
//! capability so the tree and orchestrator can run against a deterministic
//! stub in tests. The production implementation, [`CircomPoseidon`], is
//! circomlib-compatible Poseidon over BN254 and matches `circomlibjs`
//! bit-for-bit, which the compiled circuits require.
//!
//! The Poseidon instances live in process-wide state with an explicit
//! [`init`] / [`teardown`] lifecycle. Hashing before [`init`] fails with
//! [`Error::NotInitialized`] instead of returning a default value.

use std::sync::{Arc, Mutex, RwLock};

use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonHasher as _};
use rand::rngs::OsRng;

use crate::error::{Error, Result};
use crate::field::FieldElement;

/// Largest input count supported by the circom parameter set
pub const MAX_ARITY: usize = 12;

/// Deterministic map from one or more field elements to a field element
pub trait FieldHasher {
    /// Hash `inputs` (1..=[`MAX_ARITY`] elements for Poseidon)
    fn hash(&self, inputs: &[FieldElement]) -> Result<FieldElement>;

    /// Hash a single element
    fn hash_single(&self, x: FieldElement) -> Result<FieldElement> {
        self.hash(&[x])
    }

    /// Hash an ordered pair; `(a, b)` and `(b, a)` differ
    fn hash_two(&self, a: FieldElement, b: FieldElement) -> Result<FieldElement> {
        self.hash(&[a, b])
    }
}

impl<H: FieldHasher + ?Sized> FieldHasher for &H {
    fn hash(&self, inputs: &[FieldElement]) -> Result<FieldElement> {
        (**self).hash(inputs)
    }
}

impl<H: FieldHasher + ?Sized> FieldHasher for Arc<H> {
    fn hash(&self, inputs: &[FieldElement]) -> Result<FieldElement> {
        (**self).hash(inputs)
    }
}

/// One circom Poseidon instance per arity, index = arity - 1
struct PoseidonBackend {
    instances: Vec<Mutex<Poseidon<Fr>>>,
}

impl PoseidonBackend {
    fn new() -> Result<Self> {
        let instances = (1..=MAX_ARITY)
            .map(|arity| Poseidon::<Fr>::new_circom(arity).map(Mutex::new))
            .collect::<core::result::Result<Vec<_>, _>>()?;
        Ok(Self { instances })
    }

    fn hash(&self, inputs: &[FieldElement]) -> Result<FieldElement> {
        if inputs.is_empty() || inputs.len() > MAX_ARITY {
            return Err(Error::Hash(format!(
                "unsupported input count {} (expected 1..={MAX_ARITY})",
                inputs.len()
            )));
        }
        let elements: Vec<Fr> = inputs.iter().map(|x| x.into_inner()).collect();
        let mut poseidon = self.instances[inputs.len() - 1]
            .lock()
            .map_err(|_| Error::Hash("poseidon instance lock poisoned".into()))?;
        Ok(FieldElement::from(poseidon.hash(&elements)?))
    }
}

static BACKEND: RwLock<Option<Arc<PoseidonBackend>>> = RwLock::new(None);

/// Build the process-wide Poseidon instances
///
/// Idempotent: a second call while initialized is a no-op.
pub fn init() -> Result<()> {
    let mut slot = BACKEND
        .write()
        .map_err(|_| Error::Hash("poseidon backend lock poisoned".into()))?;
    if slot.is_none() {
        *slot = Some(Arc::new(PoseidonBackend::new()?));
        tracing::debug!(max_arity = MAX_ARITY, "poseidon backend initialized");
    }
    Ok(())
}

/// Drop the process-wide Poseidon instances
///
/// Hashers created earlier fail with [`Error::NotInitialized`] until the next [`init`].
pub fn teardown() {
    if let Ok(mut slot) = BACKEND.write() {
        if slot.take().is_some() {
            tracing::debug!("poseidon backend torn down");
        }
    }
}

/// Whether [`init`] has completed and [`teardown`] has not been called since
pub fn is_initialized() -> bool {
    BACKEND.read().map(|slot| slot.is_some()).unwrap_or(false)
}

fn backend() -> Result<Arc<PoseidonBackend>> {
    BACKEND
        .read()
        .map_err(|_| Error::Hash("poseidon backend lock poisoned".into()))?
        .clone()
        .ok_or(Error::NotInitialized("poseidon hash"))
}

/// circomlib-compatible Poseidon backed by the process-wide instances
///
/// The handle itself is stateless; readiness is checked on every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct CircomPoseidon;

impl CircomPoseidon {
    /// Initialize the backend (if needed) and return a handle
    pub fn initialized() -> Result<Self> {
        init()?;
        Ok(Self)
    }

    /// Whether calls through this handle will succeed
    pub fn is_ready(&self) -> bool {
        is_initialized()
    }
}

impl FieldHasher for CircomPoseidon {
    fn hash(&self, inputs: &[FieldElement]) -> Result<FieldElement> {
        backend()?.hash(inputs)
    }
}

/// Draw a fresh identity secret from the operating system RNG
pub fn generate_identity_secret() -> FieldElement {
    FieldElement::random(&mut OsRng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector_two_inputs() {
        let poseidon = CircomPoseidon::initialized().unwrap();
        let h = poseidon
            .hash_two(FieldElement::from(1u64), FieldElement::from(2u64))
            .unwrap();
        assert_eq!(
            h.to_decimal(),
            "7853200120776062878684798364095072458815029376092732009249414926327459813530"
        );
    }

    #[test]
    fn test_arity_bounds() {
        let poseidon = CircomPoseidon::initialized().unwrap();
        assert!(poseidon.hash(&[]).is_err());

        let many = vec![FieldElement::ONE; MAX_ARITY + 1];
        assert!(matches!(poseidon.hash(&many), Err(Error::Hash(_))));

        let max = vec![FieldElement::ONE; MAX_ARITY];
        assert!(poseidon.hash(&max).is_ok());
    }

    #[test]
    fn test_generate_identity_secret() {
        let a = generate_identity_secret();
        let b = generate_identity_secret();
        assert_ne!(a, b);
        assert!(!a.is_zero());
    }
}
