use std::str::FromStr;

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Binary, Decimal, Uint128};
#[cfg(not(target_arch = "wasm32"))]
use {
    babylon_apis::finality_api::{FinalityProviderSigningInfo, PubRandCommit, VotingPowerDistCache},
    cw_controllers::AdminResponse,
};

use babylon_apis::finality_api::{Evidence, IndexedBlock};
use babylon_merkle::Proof;
use babylon_proto::babylon::finality::v1 as proto;
use prost::Message;

use crate::error::ContractError;
use crate::genesis::GenesisState;
use crate::state::config::Params;

#[cw_serde]
#[derive(Default)]
pub struct InstantiateMsg {
    pub params: Option<Params>,
    pub admin: Option<String>,
    /// State to start from. Its params are used when `params` is not set
    pub genesis: Option<GenesisState>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Commits a list of public randomness values for `num_pub_rand` heights starting at
    /// `start_height`. `commitment` is the Merkle root over the values, and `signature` the
    /// BIP-340 signature of the finality provider over
    /// `start_height || num_pub_rand || commitment`
    CommitPubRandList {
        fp_btc_pk_hex: String,
        start_height: u64,
        num_pub_rand: u64,
        commitment: Binary,
        signature: Binary,
    },
    /// Submits a finality vote, i.e. an EOTS signature over the block at `height`
    AddFinalitySig {
        fp_btc_pk_hex: String,
        height: u64,
        pub_rand: Binary,
        proof: Proof,
        block_app_hash: Binary,
        signature: Binary,
    },
    /// Replaces the module params. Governance only
    UpdateParams { params: Params },
    /// Jails the given finality providers and recomputes the voting power distribution from
    /// `halting_height` on, so that finality can resume. Governance only
    ResumeFinality {
        fp_pks_hex: Vec<String>,
        halting_height: u64,
    },
    /// Unjails a finality provider once its jail period is over. Sent by the finality provider
    UnjailFinalityProvider { fp_btc_pk_hex: String },
}

/// Who may send a message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Authority {
    /// Anyone. Handlers authenticate the content (e.g. signatures) themselves
    Permissionless,
    /// Only the governance authority, i.e. the admin
    Governance,
}

pub trait MsgAuthority {
    fn authority(&self) -> Authority;
}

impl MsgAuthority for ExecuteMsg {
    fn authority(&self) -> Authority {
        match self {
            ExecuteMsg::UpdateParams { .. } | ExecuteMsg::ResumeFinality { .. } => {
                Authority::Governance
            }
            ExecuteMsg::CommitPubRandList { .. }
            | ExecuteMsg::AddFinalitySig { .. }
            | ExecuteMsg::UnjailFinalityProvider { .. } => Authority::Permissionless,
        }
    }
}

#[cw_serde]
pub enum SudoMsg {
    /// The SDK should call SudoMsg::BeginBlock{} once per block (in BeginBlock).
    /// It updates the voting power distribution and indexes the block
    BeginBlock { app_hash_hex: String },
    /// The SDK should call SudoMsg::EndBlock{} once per block (in EndBlock).
    /// It tallies and rewards blocks, and tracks the liveness of the finality providers
    EndBlock {},
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// `Params` returns the current parameters of the finality module
    #[returns(Params)]
    Params {},
    /// `Admin` returns the current admin, i.e. the governance authority
    #[returns(AdminResponse)]
    Admin {},
    /// `ActivatedHeight` returns the height at which BTC staking got activated, or 0
    #[returns(ActivatedHeightResponse)]
    ActivatedHeight {},
    /// `Cursors` returns the next heights to finalize and to reward
    #[returns(CursorsResponse)]
    Cursors {},
    /// `CurrentVotingPower` returns the voting power of the finality provider at the last height
    /// with a voting power table
    #[returns(VotingPowerResponse)]
    CurrentVotingPower { btc_pk_hex: String },
    /// `VotingPower` returns the voting power of the finality provider at `height`
    #[returns(VotingPowerResponse)]
    VotingPower { btc_pk_hex: String, height: u64 },
    /// `ActiveFinalityProviders` returns the active set at `height`
    #[returns(ActiveFinalityProvidersResponse)]
    ActiveFinalityProviders { height: u64 },
    /// `VotingPowerDistCache` returns the voting power distribution at `height`, if it hasn't
    /// been pruned yet
    #[returns(Option<VotingPowerDistCache>)]
    VotingPowerDistCache { height: u64 },
    /// `Block` returns the indexed block information at height
    #[returns(IndexedBlock)]
    Block { height: u64 },
    /// `Blocks` return the list of indexed blocks.
    ///
    /// `start_after` is the height of the block to start after (before, if `reverse` is `true`),
    /// or `None` to start from the beginning (end, if `reverse` is `true`).
    /// `limit` is the maximum number of blocks to return.
    /// `finalised` is an optional filter to return only finalised blocks.
    /// `reverse` is an optional flag to return the blocks in reverse order
    #[returns(BlocksResponse)]
    Blocks {
        start_after: Option<u64>,
        limit: Option<u32>,
        finalised: Option<bool>,
        reverse: Option<bool>,
    },
    /// `FinalitySignature` returns the signature of the finality provider for a given block height
    #[returns(FinalitySignatureResponse)]
    FinalitySignature { btc_pk_hex: String, height: u64 },
    /// `Votes` returns the finality providers that voted for the canonical block at `height`
    #[returns(VotesResponse)]
    Votes { height: u64 },
    /// `PubRandCommit` returns the public random commitments for a given FP.
    ///
    /// `btc_pk_hex` is the BTC public key of the finality provider, in hex format.
    ///
    /// `start_after` is the height of to start after (before, if `reverse` is `true`),
    /// or `None` to start from the beginning (end, if `reverse` is `true`).
    /// `limit` is the maximum number of commitments to return.
    /// `reverse` is an optional flag to return the commitments in reverse order
    #[returns(Vec<PubRandCommit>)]
    PubRandCommit {
        btc_pk_hex: String,
        start_after: Option<u64>,
        limit: Option<u32>,
        reverse: Option<bool>,
    },
    /// `FirstPubRandCommit` returns the first public random commitment (if any) for a given FP.
    #[returns(Option<PubRandCommit>)]
    FirstPubRandCommit { btc_pk_hex: String },
    /// `LastPubRandCommit` returns the last public random commitment (if any) for a given FP.
    #[returns(Option<PubRandCommit>)]
    LastPubRandCommit { btc_pk_hex: String },
    /// `Evidence` returns the evidence for a given FP and block height
    #[returns(EvidenceResponse)]
    Evidence { btc_pk_hex: String, height: u64 },
    /// `Evidences` lists evidences at heights from `start_height` on, ordered by FP and height.
    ///
    /// `start_after` is the (FP, height) key to continue after
    #[returns(EvidencesResponse)]
    Evidences {
        start_height: Option<u64>,
        start_after: Option<(String, u64)>,
        limit: Option<u32>,
    },
    /// `SigningInfo` returns the liveness bookkeeping of the finality provider
    #[returns(Option<FinalityProviderSigningInfo>)]
    SigningInfo { btc_pk_hex: String },
    /// `MissedBlocks` returns the window indices of the blocks the finality provider missed
    #[returns(MissedBlocksResponse)]
    MissedBlocks { btc_pk_hex: String },
}

#[cw_serde]
pub struct ActivatedHeightResponse {
    pub height: u64,
}

#[cw_serde]
pub struct CursorsResponse {
    pub next_height_to_finalize: u64,
    pub next_height_to_reward: u64,
}

#[cw_serde]
pub struct VotingPowerResponse {
    pub height: u64,
    pub voting_power: u64,
}

#[cw_serde]
pub struct ActiveFinalityProvider {
    pub btc_pk_hex: String,
    pub voting_power: u64,
}

#[cw_serde]
pub struct ActiveFinalityProvidersResponse {
    pub finality_providers: Vec<ActiveFinalityProvider>,
}

#[cw_serde]
pub struct FinalitySignatureResponse {
    pub signature: Vec<u8>,
}

#[cw_serde]
pub struct VotesResponse {
    pub btc_pks: Vec<String>,
}

#[cw_serde]
pub struct BlocksResponse {
    pub blocks: Vec<IndexedBlock>,
}

#[cw_serde]
pub struct EvidenceResponse {
    pub evidence: Option<Evidence>,
}

#[cw_serde]
pub struct EvidencesResponse {
    pub evidences: Vec<Evidence>,
}

#[cw_serde]
pub struct MissedBlocksResponse {
    pub indices: Vec<u64>,
}

// Wire messages

pub const MSG_COMMIT_PUB_RAND_LIST_URL: &str = "/babylon.finality.v1.MsgCommitPubRandList";
pub const MSG_ADD_FINALITY_SIG_URL: &str = "/babylon.finality.v1.MsgAddFinalitySig";
pub const MSG_UPDATE_PARAMS_URL: &str = "/babylon.finality.v1.MsgUpdateParams";
pub const MSG_RESUME_FINALITY_PROPOSAL_URL: &str = "/babylon.finality.v1.MsgResumeFinalityProposal";
pub const MSG_UNJAIL_FINALITY_PROVIDER_URL: &str = "/babylon.finality.v1.MsgUnjailFinalityProvider";

/// Decodes a protobuf encoded message of the finality module, given its type URL
pub fn decode_execute_msg(type_url: &str, value: &[u8]) -> Result<ExecuteMsg, ContractError> {
    match type_url {
        MSG_COMMIT_PUB_RAND_LIST_URL => proto::MsgCommitPubRandList::decode(value)?.try_into(),
        MSG_ADD_FINALITY_SIG_URL => proto::MsgAddFinalitySig::decode(value)?.try_into(),
        MSG_UPDATE_PARAMS_URL => proto::MsgUpdateParams::decode(value)?.try_into(),
        MSG_RESUME_FINALITY_PROPOSAL_URL => {
            proto::MsgResumeFinalityProposal::decode(value)?.try_into()
        }
        MSG_UNJAIL_FINALITY_PROVIDER_URL => {
            proto::MsgUnjailFinalityProvider::decode(value)?.try_into()
        }
        _ => Err(ContractError::UnknownMessageType(type_url.to_string())),
    }
}

impl TryFrom<proto::Params> for Params {
    type Error = ContractError;

    fn try_from(p: proto::Params) -> Result<Self, Self::Error> {
        let non_negative = |name: &str, v: i64| {
            u64::try_from(v).map_err(|_| ContractError::InvalidParams(format!("negative {name}")))
        };
        // `LegacyDec` travels as the integer string of its 18 decimals fixed point value
        let atomics = Uint128::from_str(&p.min_signed_per_window)?;
        let min_signed_per_window = Decimal::from_atomics(atomics, 18)
            .map_err(|e| ContractError::InvalidParams(e.to_string()))?;
        let jail_duration = p
            .jail_duration
            .ok_or_else(|| ContractError::InvalidParams("missing jail_duration".into()))?;
        Ok(Params {
            max_active_finality_providers: p.max_active_finality_providers,
            min_pub_rand: p.min_pub_rand,
            signed_blocks_window: non_negative("signed_blocks_window", p.signed_blocks_window)?,
            min_signed_per_window,
            finality_sig_timeout: non_negative("finality_sig_timeout", p.finality_sig_timeout)?,
            jail_duration: non_negative("jail_duration", jail_duration.seconds)?,
            finality_activation_height: p.finality_activation_height,
            max_finalized_rewarded_blocks_per_end_block: p
                .max_finalized_rewarded_blocks_per_end_block,
        })
    }
}

impl TryFrom<proto::MsgCommitPubRandList> for ExecuteMsg {
    type Error = ContractError;

    fn try_from(msg: proto::MsgCommitPubRandList) -> Result<Self, Self::Error> {
        Ok(ExecuteMsg::CommitPubRandList {
            fp_btc_pk_hex: hex::encode(&msg.fp_btc_pk),
            start_height: msg.start_height,
            num_pub_rand: msg.num_pub_rand,
            commitment: msg.commitment.to_vec().into(),
            signature: msg.sig.to_vec().into(),
        })
    }
}

impl TryFrom<proto::MsgAddFinalitySig> for ExecuteMsg {
    type Error = ContractError;

    fn try_from(msg: proto::MsgAddFinalitySig) -> Result<Self, Self::Error> {
        let proof = msg
            .proof
            .as_ref()
            .ok_or_else(|| ContractError::InvalidPubRand("missing inclusion proof".into()))?;
        Ok(ExecuteMsg::AddFinalitySig {
            fp_btc_pk_hex: hex::encode(&msg.fp_btc_pk),
            height: msg.block_height,
            pub_rand: msg.pub_rand.to_vec().into(),
            proof: Proof::try_from(proof)?,
            block_app_hash: msg.block_app_hash.to_vec().into(),
            signature: msg.finality_sig.to_vec().into(),
        })
    }
}

impl TryFrom<proto::MsgUpdateParams> for ExecuteMsg {
    type Error = ContractError;

    fn try_from(msg: proto::MsgUpdateParams) -> Result<Self, Self::Error> {
        let params = msg
            .params
            .ok_or_else(|| ContractError::InvalidParams("missing params".into()))?;
        Ok(ExecuteMsg::UpdateParams {
            params: params.try_into()?,
        })
    }
}

impl TryFrom<proto::MsgResumeFinalityProposal> for ExecuteMsg {
    type Error = ContractError;

    fn try_from(msg: proto::MsgResumeFinalityProposal) -> Result<Self, Self::Error> {
        Ok(ExecuteMsg::ResumeFinality {
            fp_pks_hex: msg.fp_pks_hex,
            halting_height: msg.halting_height.into(),
        })
    }
}

impl TryFrom<proto::MsgUnjailFinalityProvider> for ExecuteMsg {
    type Error = ContractError;

    fn try_from(msg: proto::MsgUnjailFinalityProvider) -> Result<Self, Self::Error> {
        Ok(ExecuteMsg::UnjailFinalityProvider {
            fp_btc_pk_hex: hex::encode(&msg.fp_btc_pk),
        })
    }
}
