use cosmwasm_std::Binary;

use crate::error::MerkleError;
use crate::hash::{empty_hash, inner_hash, leaf_hash, Hash};
use crate::proof::Proof;

/// Computes the root of the Merkle tree whose leaves are `leaves`, in order
pub fn root_from_leaves<T: AsRef<[u8]>>(leaves: &[T]) -> Hash {
    if leaves.is_empty() {
        return empty_hash();
    }
    subtree(leaves).0
}

/// Computes the root of the tree over `leaves` together with one inclusion proof per leaf.
///
/// This is what a finality provider does before committing a list of public randomness:
/// the root becomes the commitment and the i-th proof accompanies the i-th value.
pub fn proofs_from_leaves<T: AsRef<[u8]>>(leaves: &[T]) -> (Hash, Vec<Proof>) {
    if leaves.is_empty() {
        return (empty_hash(), vec![]);
    }
    let total = leaves.len() as u64;
    let (root, trails) = subtree(leaves);
    let proofs = leaves
        .iter()
        .zip(trails)
        .enumerate()
        .map(|(index, (leaf, aunts))| Proof {
            total,
            index: index as u64,
            leaf_hash: Binary::from(leaf_hash(leaf.as_ref()).to_vec()),
            aunts: aunts.into_iter().map(|a| Binary::from(a.to_vec())).collect(),
        })
        .collect();
    (root, proofs)
}

/// Returns the root of a non-empty subtree and, per leaf, its aunts ordered from the bottom up
fn subtree<T: AsRef<[u8]>>(leaves: &[T]) -> (Hash, Vec<Vec<Hash>>) {
    if leaves.len() == 1 {
        return (leaf_hash(leaves[0].as_ref()), vec![vec![]]);
    }
    let k = (leaves.len() as u64).next_power_of_two() as usize >> 1;
    let (left, mut left_trails) = subtree(&leaves[..k]);
    let (right, right_trails) = subtree(&leaves[k..]);
    for trail in left_trails.iter_mut() {
        trail.push(right);
    }
    left_trails.extend(right_trails.into_iter().map(|mut trail| {
        trail.push(left);
        trail
    }));
    (inner_hash(&left, &right), left_trails)
}

/// `split_point` returns the largest power of 2 less than length
pub(crate) fn split_point(length: u64) -> Result<u64, MerkleError> {
    match length {
        0 => Err(MerkleError::InvalidSplit(length)),
        1 => Ok(0),
        _ => Ok(1 << (63 - (length - 1).leading_zeros())),
    }
}
