mod eots;
mod error;

pub use eots::{
    extract, new_pub_rand, new_sec_rand, new_sig, pub_rand_from_sec_rand, pub_rand_to_bytes,
    sig_to_bytes, PubRand, PublicKey, SecRand, SecretKey, Signature,
};
pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;
