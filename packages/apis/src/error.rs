use cosmwasm_std::StdError;
use hex::FromHexError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum StakingApiError {
    #[error("{0}")]
    Std(#[from] StdError),
    #[error("{0}")]
    HexError(#[from] FromHexError),
    #[error("Empty Btc public key")]
    EmptyBtcPk,
    #[error("Invalid Btc public key {0}: expected {1} bytes")]
    InvalidBtcPk(String, usize),
    #[error("Staking tx hash hex string is not {0} chars long")]
    InvalidStakingTxHash(usize),
    #[error("No Finality Providers Btc public keys")]
    EmptyBtcPkList,
    #[error("Duplicate Finality Provider Btc public key: {0}")]
    DuplicatedBtcPk(String),
    #[error("Zero staked amount in delegation {0}")]
    ZeroStake(String),
    #[error("Invalid {field} length: expected {expected}, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Block height must be positive")]
    ZeroHeight,
    #[error("Public randomness commit must contain at least one value")]
    EmptyPubRandCommit,
    #[error("Public randomness commit starting at {0} overflows the height range")]
    PubRandCommitOverflow(u64),
    #[error("Evidence at height {0} has the same app hash for both blocks")]
    EvidenceSameAppHash(u64),
    #[error("Missed blocks counter {counter} exceeds the window size {window}")]
    MissedBlocksCounterOverflow { counter: u64, window: u64 },
    #[error("Invalid voting power distribution cache: {0}")]
    InvalidDistCache(String),
}

impl StakingApiError {
    pub fn dist_cache_err(msg: impl Into<String>) -> Self {
        StakingApiError::InvalidDistCache(msg.into())
    }
}
