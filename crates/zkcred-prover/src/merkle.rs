//! Fixed-depth binary Merkle tree over field elements
//!
//! Leaves are appended left to right. Empty slots hold the zero sentinel
//! ([`FieldElement::ZERO`]), so an empty subtree of height `h` hashes to
//! `zeros[h]` with `zeros[0] = 0` and `zeros[h] = H(zeros[h-1], zeros[h-1])`.
//!
//! Sibling pairing at every level is `(node[2i], node[2i + 1])` and the hash
//! input order is always `(left, right)`. The membership circuits encode the
//! same rule, so roots and paths must reproduce it exactly.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::field::FieldElement;
use crate::hash::FieldHasher;

/// Default tree depth (supports 2^TREE_DEPTH leaves)
pub const TREE_DEPTH: usize = 10; // 1024 leaves

/// Deepest tree accepted
pub const MAX_TREE_DEPTH: usize = 32;

/// Merkle inclusion proof for a single leaf
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProof {
    /// Leaf index the proof was extracted for
    pub leaf_index: usize,
    /// Sibling at each level, from leaf to root
    pub path_elements: Vec<FieldElement>,
    /// Position at each level: 0 = current node is the left child, 1 = right
    pub path_indices: Vec<u8>,
}

impl MerkleProof {
    /// Number of levels in the path
    pub fn depth(&self) -> usize {
        self.path_elements.len()
    }

    /// Recompute the root from `leaf` by hashing up the path
    pub fn compute_root<H: FieldHasher>(&self, hasher: &H, leaf: FieldElement) -> Result<FieldElement> {
        if self.path_elements.len() != self.path_indices.len() {
            return Err(Error::invalid_request(format!(
                "path has {} elements but {} indices",
                self.path_elements.len(),
                self.path_indices.len()
            )));
        }

        let mut current = leaf;
        for (sibling, bit) in self.path_elements.iter().zip(&self.path_indices) {
            current = match bit {
                // Current is left child
                0 => hasher.hash_two(current, *sibling)?,
                // Current is right child
                1 => hasher.hash_two(*sibling, current)?,
                other => {
                    return Err(Error::invalid_request(format!("path index {other} is not a bit")))
                }
            };
        }
        Ok(current)
    }

    /// Check that `leaf` under this path hashes to `root`
    pub fn verify<H: FieldHasher>(&self, hasher: &H, leaf: FieldElement, root: FieldElement) -> Result<bool> {
        Ok(self.compute_root(hasher, leaf)? == root)
    }

    /// Path bits as field elements (the circuit's `pathIndices` signal)
    pub fn indices_as_field(&self) -> Vec<FieldElement> {
        self.path_indices
            .iter()
            .map(|&bit| FieldElement::from(u64::from(bit)))
            .collect()
    }
}

/// Append-only Merkle tree with incremental root maintenance
///
/// Must be [`initialize`](MerkleTree::initialize)d before use; every other
/// operation fails with [`Error::NotInitialized`] until then.
#[derive(Clone, Debug)]
pub struct MerkleTree<H> {
    /// Tree depth (log2 of max leaves)
    depth: usize,
    hasher: H,
    /// Empty subtree hash per height, filled by `initialize`
    zeros: Option<Vec<FieldElement>>,
    /// Populated nodes per level; `levels[0]` are the leaves, `levels[depth]` the root
    levels: Vec<Vec<FieldElement>>,
}

impl<H: FieldHasher> MerkleTree<H> {
    /// Create an uninitialized tree of the given depth
    pub fn new(depth: usize, hasher: H) -> Result<Self> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(Error::invalid_request(format!(
                "tree depth {depth} outside 1..={MAX_TREE_DEPTH}"
            )));
        }
        Ok(Self {
            depth,
            hasher,
            zeros: None,
            levels: vec![Vec::new(); depth + 1],
        })
    }

    /// Create with default depth
    pub fn with_default_depth(hasher: H) -> Result<Self> {
        Self::new(TREE_DEPTH, hasher)
    }

    /// Build, initialize and fill a tree in one go
    ///
    /// This is the rebuild-per-request pattern: a fresh tree from the full
    /// known commitment list.
    pub fn from_leaves(depth: usize, hasher: H, leaves: &[FieldElement]) -> Result<Self> {
        let mut tree = Self::new(depth, hasher)?;
        tree.initialize()?;
        tree.insert_many(leaves)?;
        Ok(tree)
    }

    /// Precompute the empty-subtree hashes
    ///
    /// Fails if the hasher itself is not ready. Calling it again is a no-op.
    pub fn initialize(&mut self) -> Result<()> {
        if self.zeros.is_some() {
            return Ok(());
        }
        let mut zeros = Vec::with_capacity(self.depth + 1);
        zeros.push(FieldElement::ZERO);
        for level in 0..self.depth {
            let below = zeros[level];
            zeros.push(self.hasher.hash_two(below, below)?);
        }
        self.zeros = Some(zeros);
        Ok(())
    }

    /// Whether [`initialize`](Self::initialize) has completed
    pub fn is_initialized(&self) -> bool {
        self.zeros.is_some()
    }

    /// Get tree depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Get number of inserted leaves
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Maximum number of leaves this tree can hold
    pub fn capacity(&self) -> usize {
        // Saturates on 32-bit targets at depth 32
        1usize.checked_shl(self.depth as u32).unwrap_or(usize::MAX)
    }

    /// Inserted leaves in index order
    pub fn leaves(&self) -> &[FieldElement] {
        &self.levels[0]
    }

    /// Leaf at `index`, if inserted
    pub fn leaf(&self, index: usize) -> Option<FieldElement> {
        self.levels[0].get(index).copied()
    }

    /// Index of the first leaf equal to `leaf`
    pub fn index_of(&self, leaf: &FieldElement) -> Option<usize> {
        self.levels[0].iter().position(|l| l == leaf)
    }

    /// Borrow the hasher
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Insert a leaf at the next available position
    ///
    /// Updates the path to the root. On a hash failure the tree is left unchanged.
    pub fn insert(&mut self, leaf: FieldElement) -> Result<usize> {
        let zeros = self.zeros()?;
        let index = self.leaf_count();
        if index >= self.capacity() {
            return Err(Error::TreeFull {
                capacity: self.capacity(),
            });
        }

        // Compute the new path first, commit after
        let mut path = Vec::with_capacity(self.depth);
        let mut node = leaf;
        let mut idx = index;
        for level in 0..self.depth {
            node = if idx & 1 == 0 {
                // Appending: nothing exists to the right yet
                self.hasher.hash_two(node, zeros[level])?
            } else {
                self.hasher.hash_two(self.levels[level][idx - 1], node)?
            };
            idx >>= 1;
            path.push((idx, node));
        }

        self.levels[0].push(leaf);
        for (level, (idx, node)) in path.into_iter().enumerate() {
            let nodes = &mut self.levels[level + 1];
            if idx < nodes.len() {
                nodes[idx] = node;
            } else {
                nodes.push(node);
            }
        }

        tracing::trace!(index, "inserted leaf");
        Ok(index)
    }

    /// Insert leaves in order
    ///
    /// Stops at the first failure; leaves inserted before it stay in the tree.
    pub fn insert_many(&mut self, leaves: &[FieldElement]) -> Result<()> {
        for leaf in leaves {
            self.insert(*leaf)?;
        }
        tracing::debug!(
            inserted = leaves.len(),
            leaf_count = self.leaf_count(),
            "inserted leaves"
        );
        Ok(())
    }

    /// Current root
    pub fn root(&self) -> Result<FieldElement> {
        let zeros = self.zeros()?;
        Ok(self.levels[self.depth]
            .first()
            .copied()
            .unwrap_or(zeros[self.depth]))
    }

    /// Inclusion proof for the leaf at `index`
    pub fn proof(&self, index: usize) -> Result<MerkleProof> {
        let zeros = self.zeros()?;
        if index >= self.leaf_count() {
            return Err(Error::IndexOutOfRange {
                index,
                leaf_count: self.leaf_count(),
                capacity: self.capacity(),
            });
        }

        let mut path_elements = Vec::with_capacity(self.depth);
        let mut path_indices = Vec::with_capacity(self.depth);
        let mut idx = index;

        for level in 0..self.depth {
            let sibling = self.levels[level]
                .get(idx ^ 1)
                .copied()
                .unwrap_or(zeros[level]);
            path_elements.push(sibling);
            path_indices.push((idx & 1) as u8);
            idx >>= 1;
        }

        Ok(MerkleProof {
            leaf_index: index,
            path_elements,
            path_indices,
        })
    }

    /// Verify a leaf at the given index matches the current root
    pub fn verify(&self, index: usize, leaf: FieldElement) -> Result<bool> {
        let proof = self.proof(index)?;
        proof.verify(&self.hasher, leaf, self.root()?)
    }

    fn zeros(&self) -> Result<&[FieldElement]> {
        self.zeros
            .as_deref()
            .ok_or(Error::NotInitialized("Merkle tree"))
    }
}
