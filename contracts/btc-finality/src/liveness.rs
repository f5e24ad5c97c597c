//! Liveness tracking of the active finality providers.
//!
//! A finality provider that misses too many votes in its sliding window gets jailed. Votes are
//! accounted `finality_sig_timeout` blocks late, so that finality providers have some time to
//! submit them.
use cosmwasm_std::Order::Ascending;
use cosmwasm_std::{DepsMut, Env, Event, MessageInfo, Response, StdResult, Storage, Timestamp};

use babylon_apis::finality_api::FinalityProviderSigningInfo;

use crate::collaborators::BtcStakingOracle;
use crate::error::ContractError;
use crate::events;
use crate::state::config::Params;
use crate::state::finality::VOTES;
use crate::state::liveness::{
    clear_missed_blocks, get_missed_block_bit, set_missed_block_bit, SIGNING_INFO,
};
use crate::state::voting_power::VOTING_POWER;

/// Accounts the votes of the finality providers that were active at
/// `height - finality_sig_timeout`, and jails the ones below the liveness threshold
pub fn handle_liveness(
    deps: &mut DepsMut,
    env: &Env,
    staking: &mut dyn BtcStakingOracle,
    params: &Params,
) -> Result<Vec<Event>, ContractError> {
    let examined_height = match env.block.height.checked_sub(params.finality_sig_timeout) {
        Some(height) if height > 0 => height,
        _ => return Ok(vec![]),
    };

    let active_fps = VOTING_POWER
        .prefix(examined_height)
        .keys(deps.storage, None, None, Ascending)
        .collect::<StdResult<Vec<_>>>()?;

    let mut evs = vec![];
    for fp_btc_pk_hex in active_fps {
        let fp = staking
            .finality_provider(&fp_btc_pk_hex)?
            .ok_or_else(|| ContractError::UnknownFinalityProvider(fp_btc_pk_hex.clone()))?;
        // Slashed and jailed finality providers are not accounted
        if fp.is_slashed() || fp.is_jailed() {
            continue;
        }
        let missed = !VOTES.has(deps.storage, (examined_height, fp_btc_pk_hex.as_str()));
        if let Some(ev) = handle_finality_provider_liveness(
            deps.storage,
            env,
            staking,
            params,
            &fp_btc_pk_hex,
            examined_height,
            missed,
        )? {
            evs.push(ev);
        }
    }
    Ok(evs)
}

fn handle_finality_provider_liveness(
    storage: &mut dyn Storage,
    env: &Env,
    staking: &mut dyn BtcStakingOracle,
    params: &Params,
    fp_btc_pk_hex: &str,
    height: u64,
    missed: bool,
) -> Result<Option<Event>, ContractError> {
    let mut signing_info = SIGNING_INFO
        .may_load(storage, fp_btc_pk_hex)?
        .ok_or_else(|| ContractError::MissingSigningInfo(fp_btc_pk_hex.to_string()))?;
    // Not required to sign before becoming active
    if height < signing_info.start_height {
        return Ok(None);
    }

    let index = (height - signing_info.start_height) % params.signed_blocks_window;
    let missed_before = get_missed_block_bit(storage, fp_btc_pk_hex, index)?;
    match (missed_before, missed) {
        (false, true) => {
            set_missed_block_bit(storage, fp_btc_pk_hex, index, true)?;
            signing_info.missed_blocks_counter += 1;
        }
        (true, false) => {
            set_missed_block_bit(storage, fp_btc_pk_hex, index, false)?;
            signing_info.missed_blocks_counter = signing_info
                .missed_blocks_counter
                .checked_sub(1)
                .ok_or_else(|| {
                    ContractError::MissedBlocksCounterUnderflow(fp_btc_pk_hex.to_string())
                })?;
        }
        _ => {}
    }
    if signing_info.missed_blocks_counter > params.signed_blocks_window {
        return Err(babylon_apis::StakingApiError::MissedBlocksCounterOverflow {
            counter: signing_info.missed_blocks_counter,
            window: params.signed_blocks_window,
        }
        .into());
    }

    let mut ev = None;
    let min_height = signing_info.start_height + params.signed_blocks_window;
    if height > min_height && signing_info.missed_blocks_counter > params.max_missed_blocks() {
        let jailed_until = env.block.time.plus_seconds(params.jail_duration);
        jail_finality_provider(storage, staking, &mut signing_info, jailed_until)?;
        ev = Some(events::jailed_finality_provider(fp_btc_pk_hex, jailed_until));
    }

    SIGNING_INFO.save(storage, fp_btc_pk_hex, &signing_info)?;
    Ok(ev)
}

/// Jails the finality provider until `jailed_until`, resetting its liveness window.
/// The caller persists `signing_info`
pub(crate) fn jail_finality_provider(
    storage: &mut dyn Storage,
    staking: &mut dyn BtcStakingOracle,
    signing_info: &mut FinalityProviderSigningInfo,
    jailed_until: Timestamp,
) -> Result<(), ContractError> {
    signing_info.jailed_until = jailed_until;
    signing_info.missed_blocks_counter = 0;
    clear_missed_blocks(storage, &signing_info.fp_btc_pk_hex)?;
    staking.jail_finality_provider(&signing_info.fp_btc_pk_hex)?;
    Ok(())
}

pub fn handle_unjail(
    deps: DepsMut,
    env: &Env,
    info: &MessageInfo,
    staking: &mut dyn BtcStakingOracle,
    fp_btc_pk_hex: &str,
) -> Result<Response, ContractError> {
    let fp = staking
        .finality_provider(fp_btc_pk_hex)?
        .ok_or_else(|| ContractError::FinalityProviderNotFound(fp_btc_pk_hex.to_string()))?;
    if info.sender.as_str() != fp.addr {
        return Err(ContractError::Unauthorized);
    }
    if fp.is_slashed() {
        return Err(ContractError::FinalityProviderAlreadySlashed(
            fp_btc_pk_hex.to_string(),
        ));
    }
    if !fp.is_jailed() {
        return Err(ContractError::FinalityProviderNotJailed(
            fp_btc_pk_hex.to_string(),
        ));
    }
    let jailed_until = SIGNING_INFO
        .may_load(deps.storage, fp_btc_pk_hex)?
        .map(|info| info.jailed_until)
        .unwrap_or_default();
    if env.block.time < jailed_until {
        return Err(ContractError::JailPeriodNotPassed(
            fp_btc_pk_hex.to_string(),
            jailed_until,
        ));
    }

    staking.unjail_finality_provider(fp_btc_pk_hex)?;

    Ok(Response::new().add_event(events::unjail_finality_provider(fp_btc_pk_hex)))
}
