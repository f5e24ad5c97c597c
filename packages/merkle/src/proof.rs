//! Inclusion proofs compatible with cometbft/crypto/merkle/proof.go
use cosmwasm_schema::cw_serde;
use cosmwasm_std::Binary;

use crate::error::MerkleError;
use crate::hash::{inner_hash, leaf_hash, Hash, HASH_SIZE};
use crate::tree::split_point;

/// A `Proof` is a proof of a leaf's existence in a Merkle tree.
///
/// Proofs carry the leaf hash but not the root hash. `aunts` are the sibling hashes on the path
/// from the leaf to the root, ordered from the bottom up.
#[cw_serde]
pub struct Proof {
    pub total: u64,
    pub index: u64,
    pub leaf_hash: Binary,
    pub aunts: Vec<Binary>,
}

impl TryFrom<&tendermint_proto::crypto::Proof> for Proof {
    type Error = MerkleError;

    fn try_from(proof: &tendermint_proto::crypto::Proof) -> Result<Self, Self::Error> {
        let total =
            u64::try_from(proof.total).map_err(|_| MerkleError::NegativeProofField("total"))?;
        let index =
            u64::try_from(proof.index).map_err(|_| MerkleError::NegativeProofField("index"))?;
        Ok(Proof {
            total,
            index,
            leaf_hash: proof.leaf_hash.clone().into(),
            aunts: proof.aunts.iter().cloned().map(Binary::from).collect(),
        })
    }
}

impl From<&Proof> for tendermint_proto::crypto::Proof {
    fn from(proof: &Proof) -> Self {
        tendermint_proto::crypto::Proof {
            total: proof.total as i64,
            index: proof.index as i64,
            leaf_hash: proof.leaf_hash.to_vec(),
            aunts: proof.aunts.iter().map(|a| a.to_vec()).collect(),
        }
    }
}

impl Proof {
    pub const MAX_AUNTS: usize = 100;

    /// `validate_basic` checks the sizes of the leaf hash and the aunts, and that there are at
    /// most `MAX_AUNTS` aunts.
    pub fn validate_basic(&self) -> Result<(), MerkleError> {
        if self.leaf_hash.len() != HASH_SIZE {
            return Err(MerkleError::InvalidLeafHashSize {
                expected: HASH_SIZE,
                actual: self.leaf_hash.len(),
            });
        }
        if self.aunts.len() > Proof::MAX_AUNTS {
            return Err(MerkleError::TooManyAunts {
                max: Proof::MAX_AUNTS,
                actual: self.aunts.len(),
            });
        }
        if let Some((index, aunt)) = self
            .aunts
            .iter()
            .enumerate()
            .find(|(_, aunt)| aunt.len() != HASH_SIZE)
        {
            return Err(MerkleError::InvalidAuntSize {
                index,
                expected: HASH_SIZE,
                actual: aunt.len(),
            });
        }
        Ok(())
    }

    /// `verify` checks that the proof commits `leaf` to `root_hash`
    pub fn verify(&self, root_hash: &[u8], leaf: &[u8]) -> Result<(), MerkleError> {
        if root_hash.is_empty() {
            return Err(MerkleError::EmptyRootHash);
        }
        self.validate_basic()?;
        if self.leaf_hash.as_slice() != leaf_hash(leaf) {
            return Err(MerkleError::LeafHashMismatch);
        }
        let computed = self.compute_root_hash()?;
        if computed != root_hash {
            return Err(MerkleError::RootHashMismatch {
                expected: hex::encode(root_hash),
                actual: hex::encode(computed),
            });
        }
        Ok(())
    }

    pub fn compute_root_hash(&self) -> Result<Hash, MerkleError> {
        let aunts: Vec<&[u8]> = self.aunts.iter().map(|a| a.as_slice()).collect();
        compute_hash_from_aunts(self.index, self.total, &self.leaf_hash, &aunts)
    }
}

/// Folds the aunts over the leaf hash up to the root of a tree with `total` leaves.
/// The number of aunts has to match the depth of the leaf exactly.
pub fn compute_hash_from_aunts(
    index: u64,
    total: u64,
    leaf_hash: &[u8],
    aunts: &[&[u8]],
) -> Result<Hash, MerkleError> {
    if index >= total {
        return Err(MerkleError::IndexOutOfRange { index, total });
    }
    if total == 1 {
        if !aunts.is_empty() {
            return Err(MerkleError::InnerHashCount {
                expected: 0,
                actual: aunts.len(),
            });
        }
        return leaf_hash
            .try_into()
            .map_err(|_| MerkleError::InvalidLeafHashSize {
                expected: HASH_SIZE,
                actual: leaf_hash.len(),
            });
    }
    let Some((top, rest)) = aunts.split_last() else {
        return Err(MerkleError::InnerHashCount {
            expected: 1,
            actual: 0,
        });
    };
    let num_left = split_point(total)?;
    if index < num_left {
        let left = compute_hash_from_aunts(index, num_left, leaf_hash, rest)?;
        Ok(inner_hash(&left, top))
    } else {
        let right = compute_hash_from_aunts(index - num_left, total - num_left, leaf_hash, rest)?;
        Ok(inner_hash(top, &right))
    }
}
