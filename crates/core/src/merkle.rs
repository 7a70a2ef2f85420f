//! Merkle tree over a block's transactions.
//!
//! Leaves are padded to a power of two by repeating the last leaf. A single
//! leaf is padded to two, so a lone transaction is hashed with itself instead
//! of becoming the root. An empty input has the zero root.

use crate::hash::{hash_concat, Hash};

/// Number of leaves after padding.
fn padded_len(count: usize) -> usize {
    match count {
        0 => 0,
        1 => 2,
        n => n.next_power_of_two(),
    }
}

fn pad_leaves(hashes: &[Hash]) -> Vec<Hash> {
    let mut leaves = hashes.to_vec();
    if let Some(last) = hashes.last().copied() {
        leaves.resize(padded_len(hashes.len()), last);
    }
    leaves
}

fn parent_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks_exact(2)
        .map(|pair| hash_concat(&[pair[0].as_ref(), pair[1].as_ref()]))
        .collect()
}

/// Compute the merkle root of a list of hashes.
pub fn merkle_root(hashes: &[Hash]) -> Hash {
    MerkleTree::new(hashes).root()
}

/// A merkle tree for efficient proofs.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// All nodes in the tree, level by level (padded leaves first).
    levels: Vec<Vec<Hash>>,
    /// Leaves supplied by the caller, before padding.
    leaf_count: usize,
}

/// A merkle proof for a single leaf.
#[derive(Debug, Clone)]
pub struct MerkleProof {
    /// The leaf being proven.
    pub leaf: Hash,
    /// Sibling hashes from leaf to root.
    pub siblings: Vec<Hash>,
    /// Direction for each sibling (true = right, false = left).
    pub directions: Vec<bool>,
}

impl MerkleTree {
    /// Build a merkle tree from a list of leaf hashes.
    pub fn new(leaves: &[Hash]) -> Self {
        if leaves.is_empty() {
            return Self {
                levels: vec![vec![Hash::ZERO]],
                leaf_count: 0,
            };
        }

        let mut levels = vec![pad_leaves(leaves)];
        while let Some(current) = levels.last().filter(|level| level.len() > 1) {
            let next = parent_level(current);
            levels.push(next);
        }

        Self {
            levels,
            leaf_count: leaves.len(),
        }
    }

    /// Get the root of the merkle tree.
    pub fn root(&self) -> Hash {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(Hash::ZERO)
    }

    /// Get the number of leaves supplied (excluding padding).
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Number of levels including leaves and root.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Generate a proof for the leaf at the given index.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaf_count {
            return None;
        }

        let leaf = self.levels[0][index];
        let mut siblings = Vec::new();
        let mut directions = Vec::new();
        let mut idx = index;

        // Padded levels always have even width, so every node has a sibling.
        for level in &self.levels[..self.levels.len() - 1] {
            let is_right = idx % 2 == 0;
            let sibling_idx = if is_right { idx + 1 } else { idx - 1 };
            siblings.push(level[sibling_idx]);
            directions.push(is_right);
            idx /= 2;
        }

        Some(MerkleProof {
            leaf,
            siblings,
            directions,
        })
    }

    /// Verify a merkle proof against this tree's root.
    pub fn verify_proof(&self, proof: &MerkleProof) -> bool {
        verify_proof(&self.root(), proof)
    }
}

/// Verify a merkle proof against a given root.
pub fn verify_proof(root: &Hash, proof: &MerkleProof) -> bool {
    let mut current = proof.leaf;

    for (sibling, is_right) in proof.siblings.iter().zip(proof.directions.iter()) {
        current = if *is_right {
            hash_concat(&[current.as_ref(), sibling.as_ref()])
        } else {
            hash_concat(&[sibling.as_ref(), current.as_ref()])
        };
    }

    current == *root
}
