use cosmwasm_std::{StdError, Timestamp};
use cw_controllers::AdminError;
use cw_utils::PaymentError;
use hex::FromHexError;
use thiserror::Error;

use babylon_apis::StakingApiError;
use babylon_merkle::MerkleError;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),
    #[error("{0}")]
    Admin(#[from] AdminError),
    #[error("{0}")]
    Payment(#[from] PaymentError),
    #[error("{0}")]
    HexError(#[from] FromHexError),
    #[error("EOTS error: {0}")]
    EotsError(#[from] eots::Error),
    #[error("{0}")]
    MerkleError(#[from] MerkleError),
    #[error("{0}")]
    DecodeError(#[from] prost::DecodeError),
    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),
    #[error("{0}")]
    ApiError(#[from] StakingApiError),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error("Duplicate storage namespace: {0}")]
    DuplicateNamespace(String),
    #[error("Invalid genesis state: {0}")]
    InvalidGenesis(String),

    // Public randomness commits
    #[error("Finality provider {0} is not registered")]
    FinalityProviderNotFound(String),
    #[error("Finality provider {0} is already slashed")]
    FinalityProviderAlreadySlashed(String),
    #[error("Too few public randomness values: got {0}, the minimum is {1}")]
    TooFewPubRand(u64, u64),
    #[error("The commitment has to be {expected} bytes, got {actual}")]
    InvalidCommitmentLength { expected: usize, actual: usize },
    #[error("The signature has to be {expected} bytes, got {actual}")]
    InvalidSignatureLength { expected: usize, actual: usize },
    #[error("The public randomness commit starting at {0} overflows the height range")]
    PubRandCommitOverflow(u64),
    #[error("The start height ({0}) is lower than the finality activation height ({1})")]
    PubRandCommitBeforeActivation(u64, u64),
    #[error("The start height ({0}) overlaps the highest committed height ({1})")]
    InvalidPubRandHeight(u64, u64),
    #[error("Failed to verify signature: {0}")]
    FailedSignatureVerification(String),

    // Finality signatures
    #[error("Finality provider {0} has no voting power at height {1}")]
    NoVotingPower(String, u64),
    #[error("The chain has not reached height {height} yet (current height: {current})")]
    HeightTooHigh { height: u64, current: u64 },
    #[error("Empty finality signature")]
    EmptySignature,
    #[error("Block {0} is not indexed")]
    BlockNotFound(u64),
    #[error("Public randomness not found for finality provider {0} at height {1}")]
    MissingPubRandCommit(String, u64),
    #[error("The public randomness commit is not BTC timestamped yet: {0}")]
    PubRandCommitNotBTCTimestamped(String),
    #[error("Invalid public randomness: {0}")]
    InvalidPubRand(String),
    #[error("Invalid finality signature: {0}")]
    InvalidFinalitySig(String),
    #[error("Invalid app hash: expected 32 bytes, got {0}")]
    InvalidAppHash(usize),

    // Governance and jailing
    #[error("The list of finality providers to jail is empty")]
    EmptyFpList,
    #[error("The halting height must be positive")]
    ZeroHaltingHeight,
    #[error("The halting height ({0}) is above the current height ({1})")]
    HaltingHeightTooHigh(u64, u64),
    #[error("Finality provider {0} has voted at the halting height {1}")]
    FinalityProviderVotedAtHaltingHeight(String, u64),
    #[error("Finality provider {0} is not jailed")]
    FinalityProviderNotJailed(String),
    #[error("Finality provider {0} is jailed until {1}")]
    JailPeriodNotPassed(String, Timestamp),

    // Invariant violations. These abort the block
    #[error("BTC delegation {0} referenced by a power distribution event does not exist")]
    MissingDelegation(String),
    #[error("Finality provider {0} referenced by a power distribution event does not exist")]
    UnknownFinalityProvider(String),
    #[error("Inconsistent BTC delegation {0}: {1}")]
    InconsistentDelegation(String, String),
    #[error("Voting power distribution cache at height {0} does not exist")]
    MissingDistCache(u64),
    #[error("Signing info of active finality provider {0} does not exist")]
    MissingSigningInfo(String),
    #[error("Missed blocks counter of {0} does not match its missed block bitmap")]
    MissedBlocksCounterUnderflow(String),
}
