//! Keccak Merkle trees over sorted pairs.
//!
//! Inner nodes hash `min(a, b) || max(a, b)`, so proofs carry siblings only.
//! Odd layers are padded with a zero node.

use anchor_lang::prelude::*;
use routes_std::{keccak, Bytes32};

use crate::instructions::StorageProverError;

/// Checks that a leaf is committed to by a root.
pub trait InclusionVerifier {
    fn verify(&self, root: &Bytes32, leaf: &Bytes32, proof: &[Bytes32]) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SortedPairMerkle;

impl InclusionVerifier for SortedPairMerkle {
    fn verify(&self, root: &Bytes32, leaf: &Bytes32, proof: &[Bytes32]) -> bool {
        proof
            .iter()
            .fold(*leaf, |node, sibling| hash_pair(&node, sibling))
            == *root
    }
}

#[derive(Clone, Debug)]
pub struct MerkleTree {
    /// Leaves first, root layer last.
    layers: Vec<Vec<Bytes32>>,
}

impl MerkleTree {
    pub fn new(leaves: Vec<Bytes32>) -> Result<Self> {
        require!(!leaves.is_empty(), StorageProverError::EmptyTree);

        let mut layers = vec![leaves];
        while let Some(layer) = layers.last().filter(|layer| layer.len() > 1) {
            let parents = layer
                .chunks(2)
                .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&Bytes32::default())))
                .collect();
            layers.push(parents);
        }

        Ok(Self { layers })
    }

    pub fn root(&self) -> Bytes32 {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or_default()
    }

    pub fn leaves(&self) -> &[Bytes32] {
        self.layers.first().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn proof(&self, index: usize) -> Result<Vec<Bytes32>> {
        require_gt!(
            self.leaves().len(),
            index,
            StorageProverError::LeafIndexOutOfBounds
        );

        Ok(self
            .layers
            .iter()
            .take(self.layers.len() - 1)
            .scan(index, |index, layer| {
                let sibling = layer.get(*index ^ 1).copied().unwrap_or_default();
                *index /= 2;

                Some(sibling)
            })
            .collect())
    }
}

fn hash_pair(a: &Bytes32, b: &Bytes32) -> Bytes32 {
    let (first, second) = if a < b { (a, b) } else { (b, a) };

    keccak([first.as_slice(), second.as_slice()])
}
