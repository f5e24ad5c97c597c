use cosmwasm_std::{DepsMut, Env, Response};

use babylon_apis::finality_api::FinalityProviderSigningInfo;
use babylon_apis::validate_btc_pk_hex;

use crate::collaborators::BtcStakingOracle;
use crate::error::ContractError;
use crate::events;
use crate::liveness::jail_finality_provider;
use crate::state::config::{Params, PARAMS};
use crate::state::finality::VOTES;
use crate::state::liveness::SIGNING_INFO;
use crate::state::voting_power::{set_voting_power_table, VP_DIST_CACHE};

pub fn handle_update_params(deps: DepsMut, params: Params) -> Result<Response, ContractError> {
    params.validate()?;
    PARAMS.save(deps.storage, &params)?;
    Ok(Response::new().add_event(events::update_params()))
}

/// `handle_resume_finality` jails the given finality providers and removes them from the
/// voting power distribution of every height from `halting_height` on, so that the blocks
/// stalled since `halting_height` can be finalised by the remaining finality providers
pub fn handle_resume_finality(
    deps: DepsMut,
    env: &Env,
    staking: &mut dyn BtcStakingOracle,
    fp_pks_hex: &[String],
    halting_height: u64,
) -> Result<Response, ContractError> {
    if fp_pks_hex.is_empty() {
        return Err(ContractError::EmptyFpList);
    }
    if halting_height == 0 {
        return Err(ContractError::ZeroHaltingHeight);
    }
    let current_height = env.block.height;
    if halting_height > current_height {
        return Err(ContractError::HaltingHeightTooHigh(
            halting_height,
            current_height,
        ));
    }
    for fp_btc_pk_hex in fp_pks_hex {
        validate_btc_pk_hex(fp_btc_pk_hex)?;
        // A finality provider that voted at the halting height is not the cause of the stall
        if VOTES.has(deps.storage, (halting_height, fp_btc_pk_hex.as_str())) {
            return Err(ContractError::FinalityProviderVotedAtHaltingHeight(
                fp_btc_pk_hex.clone(),
                halting_height,
            ));
        }
    }

    let params = PARAMS.load(deps.storage)?;
    let jailed_until = env.block.time.plus_seconds(params.jail_duration);
    let mut res = Response::new();
    for fp_btc_pk_hex in fp_pks_hex {
        let fp = staking
            .finality_provider(fp_btc_pk_hex)?
            .ok_or_else(|| ContractError::FinalityProviderNotFound(fp_btc_pk_hex.clone()))?;
        if fp.is_slashed() || fp.is_jailed() {
            continue;
        }
        let mut signing_info = SIGNING_INFO
            .may_load(deps.storage, fp_btc_pk_hex)?
            .unwrap_or_else(|| FinalityProviderSigningInfo::new(fp_btc_pk_hex, halting_height));
        jail_finality_provider(deps.storage, staking, &mut signing_info, jailed_until)?;
        SIGNING_INFO.save(deps.storage, fp_btc_pk_hex, &signing_info)?;
        res = res.add_event(events::jailed_finality_provider(fp_btc_pk_hex, jailed_until));
    }

    // Rewrite the distribution of the stalled heights without the jailed finality providers
    for height in halting_height..=current_height {
        let Some(mut dc) = VP_DIST_CACHE.may_load(deps.storage, height)? else {
            continue;
        };
        for fp in dc.finality_providers.iter_mut() {
            if fp_pks_hex.contains(&fp.btc_pk_hex) {
                fp.is_jailed = true;
            }
        }
        dc.apply_active_finality_providers(params.max_active_finality_providers);
        set_voting_power_table(deps.storage, height, &dc)?;
        VP_DIST_CACHE.save(deps.storage, height, &dc)?;
        deps.api.debug(&format!(
            "Rewrote the voting power distribution at height {height}: \
             {} active finality providers, total voting power {}",
            dc.num_active_fps, dc.total_voting_power
        ));
    }

    Ok(res.add_event(events::resume_finality(halting_height, fp_pks_hex)))
}
