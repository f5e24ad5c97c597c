//! Import and export of the whole module state.
//!
//! Every list is exported in storage key order, so exporting the imported state yields the same
//! genesis.
use std::collections::BTreeSet;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Order::Ascending;
use cosmwasm_std::{StdResult, Storage};

use babylon_apis::finality_api::{
    Evidence, FinalityProviderSigningInfo, IndexedBlock, PubRandCommit, VotingPowerDistCache,
};
use babylon_apis::{validate_btc_pk_hex, Validate, HASH_SIZE};

use crate::error::ContractError;
use crate::state::config::{Params, PARAMS};
use crate::state::finality::{
    next_height_to_finalize, next_height_to_reward, BLOCKS, EVIDENCES, NEXT_HEIGHT_TO_FINALIZE,
    NEXT_HEIGHT_TO_REWARD, VOTES,
};
use crate::state::liveness::{
    missed_block_indices, set_missed_block_bit, MISSED_BITMAP, SIGNING_INFO,
};
use crate::state::public_randomness::{PUB_RAND_COMMITS, PUB_RAND_COMMIT_INDEX, PUB_RAND_VALUES};
use crate::state::voting_power::{VOTING_POWER, VP_DIST_CACHE};

#[cw_serde]
#[derive(Default)]
pub struct GenesisState {
    pub params: Params,
    pub indexed_blocks: Vec<IndexedBlock>,
    pub evidences: Vec<Evidence>,
    pub vote_sigs: Vec<VoteSig>,
    pub public_randomness: Vec<PublicRandomness>,
    pub pub_rand_commits: Vec<PubRandCommitWithPk>,
    pub pub_rand_commit_indexes: Vec<PubRandCommitIdx>,
    pub signing_infos: Vec<FinalityProviderSigningInfo>,
    pub missed_blocks: Vec<FinalityProviderMissedBlocks>,
    pub voting_powers: Vec<VotingPowerFp>,
    pub vp_dist_caches: Vec<VotingPowerDistCacheBlkHeight>,
    pub next_height_to_finalize: u64,
    pub next_height_to_reward: u64,
}

/// A finality signature over the canonical block at `block_height`
#[cw_serde]
pub struct VoteSig {
    pub block_height: u64,
    pub fp_btc_pk_hex: String,
    pub finality_sig: Vec<u8>,
}

#[cw_serde]
pub struct PublicRandomness {
    pub block_height: u64,
    pub fp_btc_pk_hex: String,
    pub pub_rand: Vec<u8>,
}

#[cw_serde]
pub struct PubRandCommitWithPk {
    pub fp_btc_pk_hex: String,
    pub pub_rand_commit: PubRandCommit,
}

/// The start heights of the commits of a finality provider
#[cw_serde]
pub struct PubRandCommitIdx {
    pub fp_btc_pk_hex: String,
    pub start_heights: Vec<u64>,
}

#[cw_serde]
pub struct FinalityProviderMissedBlocks {
    pub fp_btc_pk_hex: String,
    /// Window indices of the missed blocks
    pub missed_block_indices: Vec<u64>,
}

#[cw_serde]
pub struct VotingPowerFp {
    pub block_height: u64,
    pub fp_btc_pk_hex: String,
    pub voting_power: u64,
}

#[cw_serde]
pub struct VotingPowerDistCacheBlkHeight {
    pub block_height: u64,
    pub vp_distribution: VotingPowerDistCache,
}

fn invalid(msg: impl Into<String>) -> ContractError {
    ContractError::InvalidGenesis(msg.into())
}

impl GenesisState {
    pub fn validate(&self) -> Result<(), ContractError> {
        self.params.validate()?;

        for block in &self.indexed_blocks {
            block.validate()?;
        }
        for evidence in &self.evidences {
            evidence.validate()?;
        }
        for vote in &self.vote_sigs {
            validate_btc_pk_hex(&vote.fp_btc_pk_hex)?;
            if vote.finality_sig.len() != HASH_SIZE {
                return Err(invalid(format!(
                    "finality signature of {} at height {} has {} bytes",
                    vote.fp_btc_pk_hex,
                    vote.block_height,
                    vote.finality_sig.len()
                )));
            }
        }
        for pr in &self.public_randomness {
            validate_btc_pk_hex(&pr.fp_btc_pk_hex)?;
            if pr.pub_rand.len() != HASH_SIZE {
                return Err(invalid(format!(
                    "public randomness of {} at height {} has {} bytes",
                    pr.fp_btc_pk_hex,
                    pr.block_height,
                    pr.pub_rand.len()
                )));
            }
        }
        for commit in &self.pub_rand_commits {
            validate_btc_pk_hex(&commit.fp_btc_pk_hex)?;
            commit.pub_rand_commit.validate()?;
        }
        for idx in &self.pub_rand_commit_indexes {
            validate_btc_pk_hex(&idx.fp_btc_pk_hex)?;
            if idx.start_heights.windows(2).any(|w| w[0] >= w[1]) {
                return Err(invalid(format!(
                    "commit index of {} is not strictly increasing",
                    idx.fp_btc_pk_hex
                )));
            }
            for start in &idx.start_heights {
                let indexed = self.pub_rand_commits.iter().any(|c| {
                    c.fp_btc_pk_hex == idx.fp_btc_pk_hex && c.pub_rand_commit.start_height == *start
                });
                if !indexed {
                    return Err(invalid(format!(
                        "commit index of {} refers to a missing commit at {}",
                        idx.fp_btc_pk_hex, start
                    )));
                }
            }
        }
        let window = self.params.signed_blocks_window;
        for info in &self.signing_infos {
            info.validate()?;
            if info.missed_blocks_counter > window {
                return Err(invalid(format!(
                    "missed blocks counter {} of {} is above the window ({})",
                    info.missed_blocks_counter, info.fp_btc_pk_hex, window
                )));
            }
        }
        for missed in &self.missed_blocks {
            validate_btc_pk_hex(&missed.fp_btc_pk_hex)?;
            if let Some(index) = missed.missed_block_indices.iter().find(|i| **i >= window) {
                return Err(invalid(format!(
                    "missed block index {} of {} is outside of the window",
                    index, missed.fp_btc_pk_hex
                )));
            }
        }
        // The counter of each finality provider is the number of set bits in its bitmap
        for info in &self.signing_infos {
            let missed: BTreeSet<u64> = self
                .missed_blocks
                .iter()
                .filter(|m| m.fp_btc_pk_hex == info.fp_btc_pk_hex)
                .flat_map(|m| m.missed_block_indices.iter().copied())
                .collect();
            if missed.len() as u64 != info.missed_blocks_counter {
                return Err(invalid(format!(
                    "missed blocks counter {} of {} does not match its {} missed blocks",
                    info.missed_blocks_counter,
                    info.fp_btc_pk_hex,
                    missed.len()
                )));
            }
        }
        for missed in &self.missed_blocks {
            let has_info = self
                .signing_infos
                .iter()
                .any(|info| info.fp_btc_pk_hex == missed.fp_btc_pk_hex);
            if !has_info {
                return Err(invalid(format!(
                    "missed blocks of {} without signing info",
                    missed.fp_btc_pk_hex
                )));
            }
        }
        for vp in &self.voting_powers {
            validate_btc_pk_hex(&vp.fp_btc_pk_hex)?;
            if vp.voting_power == 0 {
                return Err(invalid(format!(
                    "zero voting power for {} at height {}",
                    vp.fp_btc_pk_hex, vp.block_height
                )));
            }
        }
        for dc in &self.vp_dist_caches {
            dc.vp_distribution.validate()?;
        }
        if self.next_height_to_reward > self.next_height_to_finalize {
            return Err(invalid(format!(
                "next height to reward ({}) is above the next height to finalize ({})",
                self.next_height_to_reward, self.next_height_to_finalize
            )));
        }
        Ok(())
    }
}

/// Validates the genesis and writes it to storage
pub fn init_genesis(
    storage: &mut dyn Storage,
    genesis: &GenesisState,
) -> Result<(), ContractError> {
    genesis.validate()?;

    PARAMS.save(storage, &genesis.params)?;
    for block in &genesis.indexed_blocks {
        BLOCKS.save(storage, block.height, block)?;
    }
    for evidence in &genesis.evidences {
        let fp_btc_pk_hex = hex::encode(&evidence.fp_btc_pk);
        EVIDENCES.save(storage, (&fp_btc_pk_hex, evidence.block_height), evidence)?;
    }
    for vote in &genesis.vote_sigs {
        VOTES.save(
            storage,
            (vote.block_height, &vote.fp_btc_pk_hex),
            &vote.finality_sig,
        )?;
    }
    for pr in &genesis.public_randomness {
        PUB_RAND_VALUES.save(storage, (&pr.fp_btc_pk_hex, pr.block_height), &pr.pub_rand)?;
    }
    for commit in &genesis.pub_rand_commits {
        PUB_RAND_COMMITS.save(
            storage,
            (&commit.fp_btc_pk_hex, commit.pub_rand_commit.start_height),
            &commit.pub_rand_commit,
        )?;
    }
    for idx in &genesis.pub_rand_commit_indexes {
        PUB_RAND_COMMIT_INDEX.save(storage, &idx.fp_btc_pk_hex, &idx.start_heights)?;
    }
    for info in &genesis.signing_infos {
        SIGNING_INFO.save(storage, &info.fp_btc_pk_hex, info)?;
    }
    for missed in &genesis.missed_blocks {
        for index in &missed.missed_block_indices {
            set_missed_block_bit(storage, &missed.fp_btc_pk_hex, *index, true)?;
        }
    }
    for vp in &genesis.voting_powers {
        VOTING_POWER.save(storage, (vp.block_height, &vp.fp_btc_pk_hex), &vp.voting_power)?;
    }
    for dc in &genesis.vp_dist_caches {
        VP_DIST_CACHE.save(storage, dc.block_height, &dc.vp_distribution)?;
    }
    NEXT_HEIGHT_TO_FINALIZE.save(storage, &genesis.next_height_to_finalize)?;
    NEXT_HEIGHT_TO_REWARD.save(storage, &genesis.next_height_to_reward)?;
    Ok(())
}

pub fn export_genesis(storage: &dyn Storage) -> Result<GenesisState, ContractError> {
    let indexed_blocks = BLOCKS
        .range(storage, None, None, Ascending)
        .map(|item| item.map(|(_, block)| block))
        .collect::<StdResult<_>>()?;
    let evidences = EVIDENCES
        .range(storage, None, None, Ascending)
        .map(|item| item.map(|(_, evidence)| evidence))
        .collect::<StdResult<_>>()?;
    let vote_sigs = VOTES
        .range(storage, None, None, Ascending)
        .map(|item| {
            item.map(|((block_height, fp_btc_pk_hex), finality_sig)| VoteSig {
                block_height,
                fp_btc_pk_hex,
                finality_sig,
            })
        })
        .collect::<StdResult<_>>()?;
    let public_randomness = PUB_RAND_VALUES
        .range(storage, None, None, Ascending)
        .map(|item| {
            item.map(|((fp_btc_pk_hex, block_height), pub_rand)| PublicRandomness {
                block_height,
                fp_btc_pk_hex,
                pub_rand,
            })
        })
        .collect::<StdResult<_>>()?;
    let pub_rand_commits = PUB_RAND_COMMITS
        .range(storage, None, None, Ascending)
        .map(|item| {
            item.map(|((fp_btc_pk_hex, _), pub_rand_commit)| PubRandCommitWithPk {
                fp_btc_pk_hex,
                pub_rand_commit,
            })
        })
        .collect::<StdResult<_>>()?;
    let pub_rand_commit_indexes = PUB_RAND_COMMIT_INDEX
        .range(storage, None, None, Ascending)
        .map(|item| {
            item.map(|(fp_btc_pk_hex, start_heights)| PubRandCommitIdx {
                fp_btc_pk_hex,
                start_heights,
            })
        })
        .collect::<StdResult<_>>()?;
    let signing_infos = SIGNING_INFO
        .range(storage, None, None, Ascending)
        .map(|item| item.map(|(_, info)| info))
        .collect::<StdResult<_>>()?;
    let mut missed_fps = MISSED_BITMAP
        .keys(storage, None, None, Ascending)
        .map(|item| item.map(|(fp_btc_pk_hex, _)| fp_btc_pk_hex))
        .collect::<StdResult<Vec<_>>>()?;
    missed_fps.dedup();
    let missed_blocks = missed_fps
        .into_iter()
        .map(|fp_btc_pk_hex| {
            Ok(FinalityProviderMissedBlocks {
                missed_block_indices: missed_block_indices(storage, &fp_btc_pk_hex)?,
                fp_btc_pk_hex,
            })
        })
        .collect::<StdResult<_>>()?;
    let voting_powers = VOTING_POWER
        .range(storage, None, None, Ascending)
        .map(|item| {
            item.map(|((block_height, fp_btc_pk_hex), voting_power)| VotingPowerFp {
                block_height,
                fp_btc_pk_hex,
                voting_power,
            })
        })
        .collect::<StdResult<_>>()?;
    let vp_dist_caches = VP_DIST_CACHE
        .range(storage, None, None, Ascending)
        .map(|item| {
            item.map(|(block_height, vp_distribution)| VotingPowerDistCacheBlkHeight {
                block_height,
                vp_distribution,
            })
        })
        .collect::<StdResult<_>>()?;

    Ok(GenesisState {
        params: PARAMS.load(storage)?,
        indexed_blocks,
        evidences,
        vote_sigs,
        public_randomness,
        pub_rand_commits,
        pub_rand_commit_indexes,
        signing_infos,
        missed_blocks,
        voting_powers,
        vp_dist_caches,
        next_height_to_finalize: next_height_to_finalize(storage)?,
        next_height_to_reward: next_height_to_reward(storage)?,
    })
}
