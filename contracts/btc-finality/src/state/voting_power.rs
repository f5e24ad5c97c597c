use cosmwasm_std::Order::{Ascending, Descending};
use cosmwasm_std::{StdResult, Storage};
use cw_storage_plus::Map;

use babylon_apis::finality_api::VotingPowerDistCache;

use crate::state::{VOTING_POWER_NAMESPACE, VP_DIST_CACHE_NAMESPACE};

/// Voting power (in satoshis) of the active finality providers, by height and FP
pub const VOTING_POWER: Map<(u64, &str), u64> = Map::new(VOTING_POWER_NAMESPACE);

/// Voting power distribution of all finality providers, by height
pub const VP_DIST_CACHE: Map<u64, VotingPowerDistCache> = Map::new(VP_DIST_CACHE_NAMESPACE);

/// The BTC staking activated height, i.e. the lowest height with a voting power row
pub fn activated_height(storage: &dyn Storage) -> StdResult<Option<u64>> {
    VOTING_POWER
        .keys(storage, None, None, Ascending)
        .next()
        .transpose()
        .map(|key| key.map(|(height, _)| height))
}

/// The highest height with voting power rows
pub fn last_voting_power_height(storage: &dyn Storage) -> StdResult<Option<u64>> {
    VOTING_POWER
        .keys(storage, None, None, Descending)
        .next()
        .transpose()
        .map(|key| key.map(|(height, _)| height))
}

pub fn voting_power_at(storage: &dyn Storage, height: u64, fp_btc_pk_hex: &str) -> StdResult<u64> {
    Ok(VOTING_POWER
        .may_load(storage, (height, fp_btc_pk_hex))?
        .unwrap_or_default())
}

/// Voting power table of `height`, ordered by FP
pub fn voting_power_table(storage: &dyn Storage, height: u64) -> StdResult<Vec<(String, u64)>> {
    VOTING_POWER
        .prefix(height)
        .range(storage, None, None, Ascending)
        .collect()
}

/// Replaces the voting power rows of `height` with the active set of `dc`
pub fn set_voting_power_table(
    storage: &mut dyn Storage,
    height: u64,
    dc: &VotingPowerDistCache,
) -> StdResult<()> {
    let stale = VOTING_POWER
        .prefix(height)
        .keys(storage, None, None, Ascending)
        .collect::<StdResult<Vec<_>>>()?;
    for fp in stale {
        VOTING_POWER.remove(storage, (height, &fp));
    }
    for fp in dc.active_finality_providers() {
        VOTING_POWER.save(storage, (height, &fp.btc_pk_hex), &fp.total_bonded_sat)?;
    }
    Ok(())
}
