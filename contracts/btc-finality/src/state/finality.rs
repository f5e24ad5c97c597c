use std::collections::BTreeSet;

use cosmwasm_std::Order::Ascending;
use cosmwasm_std::{StdResult, Storage};
use cw_storage_plus::{Item, Map};

use babylon_apis::finality_api::{Evidence, IndexedBlock};

use crate::state::{
    BLOCKS_NAMESPACE, EVIDENCES_NAMESPACE, NEXT_HEIGHT_TO_FINALIZE_NAMESPACE,
    NEXT_HEIGHT_TO_REWARD_NAMESPACE, VOTES_NAMESPACE,
};

/// Map of blocks information by height
pub const BLOCKS: Map<u64, IndexedBlock> = Map::new(BLOCKS_NAMESPACE);

/// Map of finality signatures (EOTS `s` values) by block height and FP
pub const VOTES: Map<(u64, &str), Vec<u8>> = Map::new(VOTES_NAMESPACE);

/// Map of double signing evidence by FP and block height
pub const EVIDENCES: Map<(&str, u64), Evidence> = Map::new(EVIDENCES_NAMESPACE);

/// Next height to finalise
pub const NEXT_HEIGHT_TO_FINALIZE: Item<u64> = Item::new(NEXT_HEIGHT_TO_FINALIZE_NAMESPACE);

/// Next height to reward
pub const NEXT_HEIGHT_TO_REWARD: Item<u64> = Item::new(NEXT_HEIGHT_TO_REWARD_NAMESPACE);

pub fn next_height_to_finalize(storage: &dyn Storage) -> StdResult<u64> {
    Ok(NEXT_HEIGHT_TO_FINALIZE
        .may_load(storage)?
        .unwrap_or_default())
}

pub fn next_height_to_reward(storage: &dyn Storage) -> StdResult<u64> {
    Ok(NEXT_HEIGHT_TO_REWARD.may_load(storage)?.unwrap_or_default())
}

/// Returns the finality providers that voted for the canonical block at `height`
pub fn voters_at_height(storage: &dyn Storage, height: u64) -> StdResult<BTreeSet<String>> {
    VOTES
        .prefix(height)
        .keys(storage, None, None, Ascending)
        .collect()
}
