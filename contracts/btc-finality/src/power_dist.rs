//! Voting power distribution.
//!
//! At every begin block the distribution cache of the previous height is carried over, the
//! power distribution events the BTC staking module recorded since the last processed BTC tip
//! are applied to it, and the resulting active set is persisted as the voting power table of
//! the current height.
use std::collections::{BTreeMap, BTreeSet, HashSet};

use cosmwasm_std::{DepsMut, Env, Event};

use babylon_apis::finality_api::{
    FinalityProviderDistInfo, FinalityProviderSigningInfo, VotingPowerDistCache,
};
use babylon_apis::staking_api::PowerDistUpdateEvent;

use crate::collaborators::{BtcStakingOracle, EpochOracle};
use crate::error::ContractError;
use crate::events::{self, FinalityProviderStatus};
use crate::state::config::Params;
use crate::state::liveness::SIGNING_INFO;
use crate::state::public_randomness::has_timestamped_pub_rand_commit;
use crate::state::voting_power::{set_voting_power_table, VP_DIST_CACHE};

/// The power distribution changes recorded since the last processed BTC tip
#[derive(Default)]
struct PowerDistChanges {
    /// Newly active delegations by finality provider, as (staking tx hash, sats)
    activated: BTreeMap<String, Vec<(String, u64)>>,
    unbonded: HashSet<String>,
    slashed: HashSet<String>,
    jailed: HashSet<String>,
    unjailed: HashSet<String>,
}

impl PowerDistChanges {
    fn jail_status(&self, fp_btc_pk_hex: &str, was_jailed: bool) -> bool {
        if self.jailed.contains(fp_btc_pk_hex) {
            true
        } else if self.unjailed.contains(fp_btc_pk_hex) {
            false
        } else {
            was_jailed
        }
    }
}

/// Records the voting power distribution cache and the voting power table of the current height
pub fn record_voting_power_and_cache(
    deps: &mut DepsMut,
    env: &Env,
    staking: &mut dyn BtcStakingOracle,
    epoching: &dyn EpochOracle,
    params: &Params,
) -> Result<Vec<Event>, ContractError> {
    let height = env.block.height;
    let prev_dc = match height.checked_sub(1) {
        Some(prev_height) => VP_DIST_CACHE.may_load(deps.storage, prev_height)?,
        None => None,
    };

    let last_btc_tip = match height.checked_sub(1) {
        Some(prev_height) => staking
            .btc_height_at_babylon_height(prev_height)?
            .unwrap_or_default(),
        None => 0,
    };
    let cur_btc_tip = staking.current_btc_height()?;
    let dist_events = if last_btc_tip <= cur_btc_tip {
        staking.power_dist_update_events(last_btc_tip, cur_btc_tip)?
    } else {
        vec![]
    };

    // Nothing has ever been staked
    if dist_events.is_empty() && prev_dc.is_none() {
        return Ok(vec![]);
    }

    let mut evs = vec![];
    let changes = classify_events(staking, &dist_events, &mut evs)?;
    let prev_dc = prev_dc.unwrap_or_default();
    let mut dc = apply_changes(staking, &prev_dc, &changes)?;

    for fp in dc.finality_providers.iter_mut() {
        fp.is_timestamped =
            has_timestamped_pub_rand_commit(deps.storage, epoching, &fp.btc_pk_hex, height)?;
    }
    dc.apply_active_finality_providers(params.max_active_finality_providers);

    set_voting_power_table(deps.storage, height, &dc)?;
    VP_DIST_CACHE.save(deps.storage, height, &dc)?;

    for fp_btc_pk_hex in dc.new_active_finality_providers(&prev_dc) {
        // A returning finality provider keeps its counter, but its window restarts
        let signing_info = match SIGNING_INFO.may_load(deps.storage, &fp_btc_pk_hex)? {
            Some(mut info) => {
                info.start_height = height;
                info
            }
            None => FinalityProviderSigningInfo::new(&fp_btc_pk_hex, height),
        };
        SIGNING_INFO.save(deps.storage, &fp_btc_pk_hex, &signing_info)?;
        evs.push(events::finality_provider_status_change(
            &fp_btc_pk_hex,
            FinalityProviderStatus::Active,
        ));
    }
    for fp_btc_pk_hex in dc.new_inactive_finality_providers(&prev_dc) {
        evs.push(events::finality_provider_status_change(
            &fp_btc_pk_hex,
            FinalityProviderStatus::Inactive,
        ));
    }

    let processed: BTreeSet<u32> = dist_events.iter().map(|(btc_height, _)| *btc_height).collect();
    for btc_height in processed {
        staking.clear_power_dist_update_events(btc_height)?;
    }

    Ok(evs)
}

fn classify_events(
    staking: &dyn BtcStakingOracle,
    dist_events: &[(u32, PowerDistUpdateEvent)],
    evs: &mut Vec<Event>,
) -> Result<PowerDistChanges, ContractError> {
    let mut changes = PowerDistChanges::default();
    for (_, event) in dist_events {
        match event {
            PowerDistUpdateEvent::DelegationActivated {
                staking_tx_hash,
                fp_btc_pk_list,
                total_sat,
            } => {
                let del = staking
                    .btc_delegation(staking_tx_hash)?
                    .ok_or_else(|| ContractError::MissingDelegation(staking_tx_hash.clone()))?;
                if del.total_sat != *total_sat {
                    return Err(ContractError::InconsistentDelegation(
                        staking_tx_hash.clone(),
                        format!("event has {} sats, delegation {}", total_sat, del.total_sat),
                    ));
                }
                for fp_btc_pk_hex in fp_btc_pk_list {
                    changes
                        .activated
                        .entry(fp_btc_pk_hex.clone())
                        .or_default()
                        .push((staking_tx_hash.clone(), *total_sat));
                }
            }
            PowerDistUpdateEvent::DelegationUnbonded { staking_tx_hash } => {
                changes.unbonded.insert(staking_tx_hash.clone());
            }
            PowerDistUpdateEvent::DelegationExpired { staking_tx_hash } => {
                changes.unbonded.insert(staking_tx_hash.clone());
                evs.push(events::expired_delegation(staking_tx_hash));
            }
            PowerDistUpdateEvent::SlashedFp { fp_btc_pk_hex } => {
                changes.slashed.insert(fp_btc_pk_hex.clone());
            }
            PowerDistUpdateEvent::JailedFp { fp_btc_pk_hex } => {
                changes.unjailed.remove(fp_btc_pk_hex);
                changes.jailed.insert(fp_btc_pk_hex.clone());
            }
            PowerDistUpdateEvent::UnjailedFp { fp_btc_pk_hex } => {
                changes.jailed.remove(fp_btc_pk_hex);
                changes.unjailed.insert(fp_btc_pk_hex.clone());
            }
        }
    }
    Ok(changes)
}

/// Builds the distribution of the current height out of the previous one and the changes
fn apply_changes(
    staking: &dyn BtcStakingOracle,
    prev_dc: &VotingPowerDistCache,
    changes: &PowerDistChanges,
) -> Result<VotingPowerDistCache, ContractError> {
    let mut dc = VotingPowerDistCache::default();

    for prev_fp in &prev_dc.finality_providers {
        if prev_fp.is_slashed || changes.slashed.contains(&prev_fp.btc_pk_hex) {
            continue;
        }
        let mut fp = FinalityProviderDistInfo::new(
            &prev_fp.btc_pk_hex,
            &prev_fp.addr,
            prev_fp.commission,
        );
        fp.is_jailed = changes.jail_status(&fp.btc_pk_hex, prev_fp.is_jailed);
        for del in &prev_fp.btc_dels {
            if !changes.unbonded.contains(&del.staking_tx_hash) {
                fp.add_bonded_sat(&del.staking_tx_hash, del.total_sat);
            }
        }
        if let Some(dels) = changes.activated.get(&fp.btc_pk_hex) {
            for (staking_tx_hash, sat) in dels {
                fp.add_bonded_sat(staking_tx_hash, *sat);
            }
        }
        dc.add_finality_provider(fp);
    }

    // Finality providers receiving their first delegations, by key order
    let known: HashSet<&str> = prev_dc
        .finality_providers
        .iter()
        .map(|fp| fp.btc_pk_hex.as_str())
        .collect();
    for (fp_btc_pk_hex, dels) in &changes.activated {
        if known.contains(fp_btc_pk_hex.as_str()) {
            continue;
        }
        let record = staking
            .finality_provider(fp_btc_pk_hex)?
            .ok_or_else(|| ContractError::UnknownFinalityProvider(fp_btc_pk_hex.clone()))?;
        if record.is_slashed() || changes.slashed.contains(fp_btc_pk_hex) {
            continue;
        }
        let mut fp = FinalityProviderDistInfo::new(fp_btc_pk_hex, &record.addr, record.commission);
        fp.is_jailed = changes.jail_status(fp_btc_pk_hex, record.is_jailed());
        for (staking_tx_hash, sat) in dels {
            if !changes.unbonded.contains(staking_tx_hash) {
                fp.add_bonded_sat(staking_tx_hash, *sat);
            }
        }
        dc.add_finality_provider(fp);
    }

    Ok(dc)
}
