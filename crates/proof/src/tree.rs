//! An explicit SSZ Merkle tree supporting proofs by generalized index.
//!
//! Containers are merkleized over their field roots; only the branches a
//! proof descends through need to be expanded into sub-trees, every other
//! field is a pre-hashed leaf.

use alloy_primitives::B256;
use sha2::{Digest, Sha256};

use crate::{gindex_depth, ProofError, ProofResult};

/// A node of an SSZ Merkle tree.
#[derive(Debug, Clone)]
pub enum SszTree {
    /// A chunk or a pre-hashed subtree root.
    Leaf(B256),
    /// An interior node with its memoized root.
    Branch {
        /// Root over the two children.
        root: B256,
        /// Left child.
        left: Box<SszTree>,
        /// Right child.
        right: Box<SszTree>,
    },
}

impl SszTree {
    /// A leaf holding `root`.
    pub const fn leaf(root: B256) -> Self {
        Self::Leaf(root)
    }

    /// An interior node over two subtrees.
    pub fn branch(left: Self, right: Self) -> Self {
        let root = hash_pair(left.root(), right.root());
        Self::Branch { root, left: Box::new(left), right: Box::new(right) }
    }

    /// Merkleizes container fields, zero-padding the chunk count to the next
    /// power of two.
    pub fn container(mut fields: Vec<Self>) -> Self {
        let width = fields.len().next_power_of_two().max(1);
        fields.resize_with(width, || Self::leaf(B256::ZERO));
        Self::from_nodes(fields)
    }

    /// Merkleizes a fixed-depth vector of chunks, zero-padding to `1 << depth`
    /// leaves.
    pub fn from_chunks(chunks: &[B256], depth: u32) -> Self {
        let width = 1usize << depth;
        debug_assert!(chunks.len() <= width);
        let mut nodes: Vec<Self> = chunks.iter().copied().map(Self::leaf).collect();
        nodes.resize_with(width, || Self::leaf(B256::ZERO));
        Self::from_nodes(nodes)
    }

    fn from_nodes(nodes: Vec<Self>) -> Self {
        let mut level = nodes;
        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len() / 2);
            let mut nodes = level.into_iter();
            while let (Some(left), Some(right)) = (nodes.next(), nodes.next()) {
                next.push(Self::branch(left, right));
            }
            level = next;
        }
        level.pop().unwrap_or(Self::Leaf(B256::ZERO))
    }

    /// The root of this (sub)tree.
    pub const fn root(&self) -> B256 {
        match self {
            Self::Leaf(root) => *root,
            Self::Branch { root, .. } => *root,
        }
    }

    /// Produces the Merkle proof for `gindex`, ordered leaf-sibling first.
    ///
    /// Fails if the path descends through a leaf that was not expanded.
    pub fn prove(&self, gindex: u64) -> ProofResult<Vec<B256>> {
        let depth = gindex_depth(gindex);
        let mut node = self;
        let mut siblings = Vec::with_capacity(depth as usize);
        for level in (0..depth).rev() {
            match node {
                Self::Branch { left, right, .. } => {
                    if (gindex >> level) & 1 == 1 {
                        siblings.push(left.root());
                        node = right;
                    } else {
                        siblings.push(right.root());
                        node = left;
                    }
                }
                Self::Leaf(_) => return Err(ProofError::GindexOutOfRange(gindex)),
            }
        }
        siblings.reverse();
        Ok(siblings)
    }
}

/// SHA-256 over the concatenation of two chunks.
pub fn hash_pair(left: B256, right: B256) -> B256 {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    B256::from_slice(&hasher.finalize())
}

/// Folds a leaf-first proof back up to the root. Used to check proofs without
/// re-merkleizing the tree.
pub fn verify_proof(leaf: B256, gindex: u64, proof: &[B256], root: B256) -> bool {
    if proof.len() != gindex_depth(gindex) as usize {
        return false;
    }
    let mut node = leaf;
    let mut index = gindex;
    for sibling in proof {
        node = if index & 1 == 1 { hash_pair(*sibling, node) } else { hash_pair(node, *sibling) };
        index >>= 1;
    }
    index == 1 && node == root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array_gindex;

    fn chunk(byte: u8) -> B256 {
        B256::repeat_byte(byte)
    }

    #[test]
    fn test_container_pads_to_power_of_two() {
        let three = SszTree::container(vec![
            SszTree::leaf(chunk(1)),
            SszTree::leaf(chunk(2)),
            SszTree::leaf(chunk(3)),
        ]);
        let four = SszTree::container(vec![
            SszTree::leaf(chunk(1)),
            SszTree::leaf(chunk(2)),
            SszTree::leaf(chunk(3)),
            SszTree::leaf(B256::ZERO),
        ]);
        assert_eq!(three.root(), four.root());
    }

    #[test]
    fn test_prove_and_verify_every_leaf() {
        let chunks: Vec<B256> = (0u8..8).map(chunk).collect();
        let tree = SszTree::from_chunks(&chunks, 3);
        for (i, leaf) in chunks.iter().enumerate() {
            let gindex = array_gindex(i as u64, 3);
            let proof = tree.prove(gindex).unwrap();
            assert_eq!(proof.len(), 3);
            assert!(verify_proof(*leaf, gindex, &proof, tree.root()));
            assert!(!verify_proof(*leaf, gindex, &proof, chunk(0xff)));
        }
    }

    #[test]
    fn test_prove_past_leaf_fails() {
        let tree = SszTree::container(vec![SszTree::leaf(chunk(1)), SszTree::leaf(chunk(2))]);
        // Depth 1 tree cannot answer a depth 2 index.
        assert!(tree.prove(4).is_err());
    }

    #[test]
    fn test_verify_rejects_wrong_length() {
        let chunks: Vec<B256> = (0u8..4).map(chunk).collect();
        let tree = SszTree::from_chunks(&chunks, 2);
        let proof = tree.prove(4).unwrap();
        assert!(!verify_proof(chunks[0], 8, &proof, tree.root()));
    }
}
