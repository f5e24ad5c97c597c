use cosmwasm_std::Order::{Ascending, Descending};
use cosmwasm_std::{StdResult, Storage};
use cw_storage_plus::{Bound, Map};

use babylon_apis::finality_api::PubRandCommit;

use crate::collaborators::EpochOracle;
use crate::error::ContractError;
use crate::state::{
    PUB_RAND_COMMIT_INDEX_NAMESPACE, PUB_RAND_COMMIT_NAMESPACE, PUB_RAND_NAMESPACE,
};

/// Map of public randomness commitments by fp and start height
pub const PUB_RAND_COMMITS: Map<(&str, u64), PubRandCommit> = Map::new(PUB_RAND_COMMIT_NAMESPACE);
/// Sorted start heights of the commitments of each fp
pub const PUB_RAND_COMMIT_INDEX: Map<&str, Vec<u64>> = Map::new(PUB_RAND_COMMIT_INDEX_NAMESPACE);
/// Map of public randomness values by fp and block height
pub const PUB_RAND_VALUES: Map<(&str, u64), Vec<u8>> = Map::new(PUB_RAND_NAMESPACE);

/// Stores a new commitment and records its start height in the fp's index.
/// Commitments are accepted in increasing start height order, so the index stays sorted
pub fn insert_pub_rand_commit(
    storage: &mut dyn Storage,
    fp_btc_pk_hex: &str,
    pr_commit: &PubRandCommit,
) -> StdResult<()> {
    PUB_RAND_COMMITS.save(storage, (fp_btc_pk_hex, pr_commit.start_height), pr_commit)?;
    let mut index = PUB_RAND_COMMIT_INDEX
        .may_load(storage, fp_btc_pk_hex)?
        .unwrap_or_default();
    let pos = index.partition_point(|start| *start < pr_commit.start_height);
    if index.get(pos) != Some(&pr_commit.start_height) {
        index.insert(pos, pr_commit.start_height);
    }
    PUB_RAND_COMMIT_INDEX.save(storage, fp_btc_pk_hex, &index)
}

/// Finds the commitment of `fp_btc_pk_hex` that covers `height`
pub fn get_pub_rand_commit_for_height(
    storage: &dyn Storage,
    fp_btc_pk_hex: &str,
    height: u64,
) -> Result<PubRandCommit, ContractError> {
    let found = match PUB_RAND_COMMIT_INDEX.may_load(storage, fp_btc_pk_hex)? {
        Some(index) => {
            // greatest start height <= height
            let pos = index.partition_point(|start| *start <= height);
            match pos.checked_sub(1).map(|i| index[i]) {
                Some(start) => PUB_RAND_COMMITS.may_load(storage, (fp_btc_pk_hex, start))?,
                None => None,
            }
        }
        None => scan_pub_rand_commit_for_height(storage, fp_btc_pk_hex, height)?,
    };
    match found {
        Some(pr_commit) if pr_commit.in_range(height) => Ok(pr_commit),
        _ => Err(ContractError::MissingPubRandCommit(
            fp_btc_pk_hex.to_string(),
            height,
        )),
    }
}

/// Reverse scan over the commitments, for stores without a commitment index
fn scan_pub_rand_commit_for_height(
    storage: &dyn Storage,
    fp_btc_pk_hex: &str,
    height: u64,
) -> StdResult<Option<PubRandCommit>> {
    let end_at = Some(Bound::inclusive(height));
    PUB_RAND_COMMITS
        .prefix(fp_btc_pk_hex)
        .range(storage, None, end_at, Descending)
        .map(|item| item.map(|(_, value)| value))
        .next()
        .transpose()
}

/// `get_timestamped_pub_rand_commit_for_height` finds the public randomness commitment that
/// includes the given height, and ensures its epoch has been checkpointed on Bitcoin
pub fn get_timestamped_pub_rand_commit_for_height(
    storage: &dyn Storage,
    epoching: &dyn EpochOracle,
    fp_btc_pk_hex: &str,
    height: u64,
) -> Result<PubRandCommit, ContractError> {
    let pr_commit = get_pub_rand_commit_for_height(storage, fp_btc_pk_hex, height)?;

    let finalized_epoch = epoching.last_finalized_epoch()?;
    if finalized_epoch < pr_commit.epoch_num {
        return Err(ContractError::PubRandCommitNotBTCTimestamped(format!(
            "the commit of finality provider {} at height {} is in epoch {}, \
             last finalized epoch: {}",
            fp_btc_pk_hex, pr_commit.start_height, pr_commit.epoch_num, finalized_epoch
        )));
    }

    Ok(pr_commit)
}

/// Whether `fp_btc_pk_hex` has a BTC timestamped commitment covering `height`
pub fn has_timestamped_pub_rand_commit(
    storage: &dyn Storage,
    epoching: &dyn EpochOracle,
    fp_btc_pk_hex: &str,
    height: u64,
) -> Result<bool, ContractError> {
    match get_timestamped_pub_rand_commit_for_height(storage, epoching, fp_btc_pk_hex, height) {
        Ok(_) => Ok(true),
        Err(ContractError::MissingPubRandCommit(..))
        | Err(ContractError::PubRandCommitNotBTCTimestamped(_)) => Ok(false),
        Err(err) => Err(err),
    }
}

pub fn get_first_pub_rand_commit(
    storage: &dyn Storage,
    fp_btc_pk_hex: &str,
) -> Result<Option<PubRandCommit>, ContractError> {
    let res = get_pub_rand_commit(storage, fp_btc_pk_hex, None, Some(1), Some(false))?;
    Ok(res.into_iter().next())
}

pub fn get_last_pub_rand_commit(
    storage: &dyn Storage,
    fp_btc_pk_hex: &str,
) -> Result<Option<PubRandCommit>, ContractError> {
    let res = get_pub_rand_commit(storage, fp_btc_pk_hex, None, Some(1), Some(true))?;
    Ok(res.into_iter().next())
}

// Settings for pagination
const MAX_LIMIT: u32 = 30;
const DEFAULT_LIMIT: u32 = 10;

pub fn get_pub_rand_commit(
    storage: &dyn Storage,
    fp_btc_pk_hex: &str,
    start_after: Option<u64>,
    limit: Option<u32>,
    reverse: Option<bool>,
) -> Result<Vec<PubRandCommit>, ContractError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start_after = start_after.map(Bound::exclusive);
    let (start, end, order) = if reverse.unwrap_or(false) {
        (None, start_after, Descending)
    } else {
        (start_after, None, Ascending)
    };
    let res = PUB_RAND_COMMITS
        .prefix(fp_btc_pk_hex)
        .range(storage, start, end, order)
        .take(limit)
        .map(|item| item.map(|(_, value)| value))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(res)
}
