//! RFC-6962 domain separated hashing, as used by CometBFT's `crypto/merkle`.
use sha2::{Digest, Sha256};

pub const HASH_SIZE: usize = 32;

const LEAF_PREFIX: u8 = 0;
const INNER_PREFIX: u8 = 1;

pub type Hash = [u8; HASH_SIZE];

/// Root of a tree without leaves
pub fn empty_hash() -> Hash {
    Sha256::digest([]).into()
}

pub fn leaf_hash(leaf: &[u8]) -> Hash {
    Sha256::new()
        .chain_update([LEAF_PREFIX])
        .chain_update(leaf)
        .finalize()
        .into()
}

pub fn inner_hash(left: &[u8], right: &[u8]) -> Hash {
    Sha256::new()
        .chain_update([INNER_PREFIX])
        .chain_update(left)
        .chain_update(right)
        .finalize()
        .into()
}
