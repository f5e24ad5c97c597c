use cosmwasm_std::Order::{Ascending, Descending};
use cosmwasm_std::{Deps, StdResult};
use cw_storage_plus::Bound;

use babylon_apis::finality_api::{
    FinalityProviderSigningInfo, IndexedBlock, VotingPowerDistCache,
};

use crate::error::ContractError;
use crate::msg::{
    ActivatedHeightResponse, ActiveFinalityProvider, ActiveFinalityProvidersResponse,
    BlocksResponse, CursorsResponse, EvidenceResponse, EvidencesResponse,
    FinalitySignatureResponse, MissedBlocksResponse, VotesResponse, VotingPowerResponse,
};
use crate::state::config::{Params, PARAMS};
use crate::state::finality::{
    next_height_to_finalize, next_height_to_reward, voters_at_height, BLOCKS, EVIDENCES, VOTES,
};
use crate::state::liveness::{missed_block_indices, SIGNING_INFO};
use crate::state::voting_power::{
    activated_height, last_voting_power_height, voting_power_at, voting_power_table,
    VP_DIST_CACHE,
};

pub fn params(deps: Deps) -> StdResult<Params> {
    PARAMS.load(deps.storage)
}

// Settings for pagination
const MAX_LIMIT: u32 = 30;
const DEFAULT_LIMIT: u32 = 10;

pub fn activated_height_response(deps: Deps) -> StdResult<ActivatedHeightResponse> {
    Ok(ActivatedHeightResponse {
        height: activated_height(deps.storage)?.unwrap_or_default(),
    })
}

pub fn cursors(deps: Deps) -> StdResult<CursorsResponse> {
    Ok(CursorsResponse {
        next_height_to_finalize: next_height_to_finalize(deps.storage)?,
        next_height_to_reward: next_height_to_reward(deps.storage)?,
    })
}

/// Voting power at the last height with a voting power table
pub fn current_voting_power(deps: Deps, btc_pk_hex: String) -> StdResult<VotingPowerResponse> {
    match last_voting_power_height(deps.storage)? {
        Some(height) => voting_power(deps, btc_pk_hex, height),
        None => Ok(VotingPowerResponse {
            height: 0,
            voting_power: 0,
        }),
    }
}

pub fn voting_power(deps: Deps, btc_pk_hex: String, height: u64) -> StdResult<VotingPowerResponse> {
    Ok(VotingPowerResponse {
        height,
        voting_power: voting_power_at(deps.storage, height, &btc_pk_hex)?,
    })
}

/// Active finality providers at `height`, by voting power
pub fn active_finality_providers(
    deps: Deps,
    height: u64,
) -> StdResult<ActiveFinalityProvidersResponse> {
    let mut finality_providers: Vec<_> = voting_power_table(deps.storage, height)?
        .into_iter()
        .map(|(btc_pk_hex, voting_power)| ActiveFinalityProvider {
            btc_pk_hex,
            voting_power,
        })
        .collect();
    finality_providers.sort_by(|a, b| {
        b.voting_power
            .cmp(&a.voting_power)
            .then_with(|| a.btc_pk_hex.cmp(&b.btc_pk_hex))
    });
    Ok(ActiveFinalityProvidersResponse { finality_providers })
}

pub fn voting_power_dist_cache(
    deps: Deps,
    height: u64,
) -> StdResult<Option<VotingPowerDistCache>> {
    VP_DIST_CACHE.may_load(deps.storage, height)
}

pub fn finality_signature(
    deps: Deps,
    btc_pk_hex: String,
    height: u64,
) -> StdResult<FinalitySignatureResponse> {
    match VOTES.may_load(deps.storage, (height, &btc_pk_hex))? {
        Some(signature) => Ok(FinalitySignatureResponse { signature }),
        None => Ok(FinalitySignatureResponse {
            signature: Vec::new(),
        }), // Empty signature response
    }
}

pub fn votes(deps: Deps, height: u64) -> StdResult<VotesResponse> {
    let btc_pks = voters_at_height(deps.storage, height)?.into_iter().collect();
    Ok(VotesResponse { btc_pks })
}

pub fn block(deps: Deps, height: u64) -> StdResult<IndexedBlock> {
    BLOCKS.load(deps.storage, height)
}

/// Get list of blocks.
/// `start_after`: The height to start after, if any.
/// `finalised`: List only finalised blocks if true, otherwise list all blocks.
/// `reverse`: List in descending order if present and true, otherwise in ascending order.
pub fn blocks(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
    finalised: Option<bool>,
    reverse: Option<bool>,
) -> Result<BlocksResponse, ContractError> {
    let finalised = finalised.unwrap_or_default();
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start_after = start_after.map(Bound::exclusive);
    let (start, end, order) = if reverse.unwrap_or(false) {
        (None, start_after, Descending)
    } else {
        (start_after, None, Ascending)
    };
    let blocks = BLOCKS
        .range(deps.storage, start, end, order)
        .filter(|item| {
            if let Ok((_, block)) = item {
                !finalised || block.finalized
            } else {
                true // don't filter errors
            }
        })
        .take(limit)
        .map(|item| item.map(|(_, v)| v))
        .collect::<StdResult<Vec<IndexedBlock>>>()?;
    Ok(BlocksResponse { blocks })
}

pub fn evidence(deps: Deps, btc_pk_hex: String, height: u64) -> StdResult<EvidenceResponse> {
    let evidence = EVIDENCES.may_load(deps.storage, (&btc_pk_hex, height))?;
    Ok(EvidenceResponse { evidence })
}

/// Lists evidences at heights from `start_height` on, in (FP, height) order
pub fn evidences(
    deps: Deps,
    start_height: Option<u64>,
    start_after: Option<(String, u64)>,
    limit: Option<u32>,
) -> StdResult<EvidencesResponse> {
    let start_height = start_height.unwrap_or_default();
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after
        .as_ref()
        .map(|(fp, height)| Bound::exclusive((fp.as_str(), *height)));
    let evidences = EVIDENCES
        .range(deps.storage, start, None, Ascending)
        .filter(|item| {
            if let Ok((_, evidence)) = item {
                evidence.block_height >= start_height
            } else {
                true // don't filter errors
            }
        })
        .take(limit)
        .map(|item| item.map(|(_, evidence)| evidence))
        .collect::<StdResult<_>>()?;
    Ok(EvidencesResponse { evidences })
}

pub fn signing_info(
    deps: Deps,
    btc_pk_hex: String,
) -> StdResult<Option<FinalityProviderSigningInfo>> {
    SIGNING_INFO.may_load(deps.storage, &btc_pk_hex)
}

pub fn missed_blocks(deps: Deps, btc_pk_hex: String) -> StdResult<MissedBlocksResponse> {
    Ok(MissedBlocksResponse {
        indices: missed_block_indices(deps.storage, &btc_pk_hex)?,
    })
}
