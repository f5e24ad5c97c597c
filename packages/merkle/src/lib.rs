pub mod error;
pub mod hash;
pub mod proof;
pub mod tree;

pub use error::MerkleError;
pub use proof::Proof;
pub use tree::{proofs_from_leaves, root_from_leaves};
