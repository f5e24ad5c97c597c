pub mod error;
pub mod finality_api;
pub mod staking_api;
mod validate;

pub use error::StakingApiError;
pub use validate::{validate_btc_pk_hex, Validate};

pub type Bytes = Vec<u8>;

/// Size of BIP-340 x-only public keys, EOTS signatures and public randomness values
pub const HASH_SIZE: usize = 32;

/// Size of a BIP-340 Schnorr signature
pub const SCHNORR_SIG_SIZE: usize = 64;
