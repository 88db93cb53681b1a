//! Process-wide Poseidon lifecycle
//!
//! Kept in its own test binary: tearing the backend down would break any
//! test running alongside it.

use zkcred_prover::error::Error;
use zkcred_prover::field::FieldElement;
use zkcred_prover::hash::{self, CircomPoseidon, FieldHasher};
use zkcred_prover::merkle::MerkleTree;

#[test]
fn test_init_teardown_cycle() {
    let poseidon = CircomPoseidon;
    assert!(!poseidon.is_ready());
    assert!(matches!(
        poseidon.hash_single(FieldElement::ONE),
        Err(Error::NotInitialized("poseidon hash"))
    ));

    let mut tree = MerkleTree::new(4, poseidon).unwrap();
    assert!(matches!(tree.initialize(), Err(Error::NotInitialized(_))));
    assert!(!tree.is_initialized());

    hash::init().unwrap();
    hash::init().unwrap();
    assert!(hash::is_initialized());
    let before = poseidon.hash_single(FieldElement::ONE).unwrap();
    tree.initialize().unwrap();
    tree.insert(before).unwrap();

    hash::teardown();
    assert!(!hash::is_initialized());
    assert!(matches!(
        poseidon.hash_two(FieldElement::ONE, FieldElement::ONE),
        Err(Error::NotInitialized(_))
    ));
    // Inserts hash, so they fail too and leave the tree as it was
    assert!(matches!(tree.insert(FieldElement::ONE), Err(Error::NotInitialized(_))));
    assert_eq!(tree.leaf_count(), 1);

    hash::init().unwrap();
    assert_eq!(poseidon.hash_single(FieldElement::ONE).unwrap(), before);
    tree.insert(FieldElement::ONE).unwrap();
    assert_eq!(tree.leaf_count(), 2);
}
