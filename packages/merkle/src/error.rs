use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum MerkleError {
    #[error("Cannot split a tree with {0} leaves")]
    InvalidSplit(u64),

    #[error("Invalid index ({index}) and/or total ({total})")]
    IndexOutOfRange { index: u64, total: u64 },

    #[error("Proof field {0} must not be negative")]
    NegativeProofField(&'static str),

    #[error("Expected leaf hash size to be {expected}, got {actual}")]
    InvalidLeafHashSize { expected: usize, actual: usize },

    #[error("Expected no more than {max} aunts, got {actual}")]
    TooManyAunts { max: usize, actual: usize },

    #[error("Expected aunt #{index} size to be {expected}, got {actual}")]
    InvalidAuntSize {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Expected {expected} inner hashes, got {actual}")]
    InnerHashCount { expected: usize, actual: usize },

    #[error("Invalid root hash: cannot be empty")]
    EmptyRootHash,

    #[error("Invalid leaf hash: the proof does not commit to the given leaf")]
    LeafHashMismatch,

    #[error("Invalid root hash: wanted {expected}, got {actual}")]
    RootHashMismatch { expected: String, actual: String },
}
