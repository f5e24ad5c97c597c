use cosmwasm_std::{to_json_binary, Deps, DepsMut, Env, MessageInfo, QueryResponse, Response};
use cw2::set_contract_version;
use cw_utils::{maybe_addr, nonpayable};

use crate::collaborators::Collaborators;
use crate::error::ContractError;
use crate::finality::{
    handle_finality_signature, handle_public_randomness_commit, index_block, is_finality_active,
    reward_blocks, tally_blocks,
};
use crate::genesis::init_genesis;
use crate::governance::{handle_resume_finality, handle_update_params};
use crate::liveness::{handle_liveness, handle_unjail};
use crate::msg::{Authority, ExecuteMsg, InstantiateMsg, MsgAuthority, QueryMsg, SudoMsg};
use crate::power_dist::record_voting_power_and_cache;
use crate::state::config::{ADMIN, PARAMS};
use crate::state::{check_namespaces, NAMESPACES};
use crate::{queries, state};

pub const CONTRACT_NAME: &str = env!("CARGO_PKG_NAME");
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn instantiate(
    mut deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    nonpayable(&info)?;
    check_namespaces(&NAMESPACES)?;

    let api = deps.api;
    ADMIN.set(deps.branch(), maybe_addr(api, msg.admin)?)?;

    match msg.genesis {
        Some(mut genesis) => {
            if let Some(params) = msg.params {
                genesis.params = params;
            }
            init_genesis(deps.storage, &genesis)?;
        }
        None => {
            let params = msg.params.unwrap_or_default();
            params.validate()?;
            PARAMS.save(deps.storage, &params)?;
        }
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    Ok(Response::new().add_attribute("action", "instantiate"))
}

pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> Result<QueryResponse, ContractError> {
    match msg {
        QueryMsg::Params {} => Ok(to_json_binary(&queries::params(deps)?)?),
        QueryMsg::Admin {} => to_json_binary(&ADMIN.query_admin(deps)?).map_err(Into::into),
        QueryMsg::ActivatedHeight {} => {
            Ok(to_json_binary(&queries::activated_height_response(deps)?)?)
        }
        QueryMsg::Cursors {} => Ok(to_json_binary(&queries::cursors(deps)?)?),
        QueryMsg::CurrentVotingPower { btc_pk_hex } => Ok(to_json_binary(
            &queries::current_voting_power(deps, btc_pk_hex)?,
        )?),
        QueryMsg::VotingPower { btc_pk_hex, height } => Ok(to_json_binary(
            &queries::voting_power(deps, btc_pk_hex, height)?,
        )?),
        QueryMsg::ActiveFinalityProviders { height } => Ok(to_json_binary(
            &queries::active_finality_providers(deps, height)?,
        )?),
        QueryMsg::VotingPowerDistCache { height } => Ok(to_json_binary(
            &queries::voting_power_dist_cache(deps, height)?,
        )?),
        QueryMsg::Block { height } => Ok(to_json_binary(&queries::block(deps, height)?)?),
        QueryMsg::Blocks {
            start_after,
            limit,
            finalised,
            reverse,
        } => Ok(to_json_binary(&queries::blocks(
            deps,
            start_after,
            limit,
            finalised,
            reverse,
        )?)?),
        QueryMsg::FinalitySignature { btc_pk_hex, height } => Ok(to_json_binary(
            &queries::finality_signature(deps, btc_pk_hex, height)?,
        )?),
        QueryMsg::Votes { height } => Ok(to_json_binary(&queries::votes(deps, height)?)?),
        QueryMsg::PubRandCommit {
            btc_pk_hex,
            start_after,
            limit,
            reverse,
        } => Ok(to_json_binary(
            &state::public_randomness::get_pub_rand_commit(
                deps.storage,
                &btc_pk_hex,
                start_after,
                limit,
                reverse,
            )?,
        )?),
        QueryMsg::FirstPubRandCommit { btc_pk_hex } => Ok(to_json_binary(
            &state::public_randomness::get_first_pub_rand_commit(deps.storage, &btc_pk_hex)?,
        )?),
        QueryMsg::LastPubRandCommit { btc_pk_hex } => Ok(to_json_binary(
            &state::public_randomness::get_last_pub_rand_commit(deps.storage, &btc_pk_hex)?,
        )?),
        QueryMsg::Evidence { btc_pk_hex, height } => Ok(to_json_binary(&queries::evidence(
            deps, btc_pk_hex, height,
        )?)?),
        QueryMsg::Evidences {
            start_height,
            start_after,
            limit,
        } => Ok(to_json_binary(&queries::evidences(
            deps,
            start_height,
            start_after,
            limit,
        )?)?),
        QueryMsg::SigningInfo { btc_pk_hex } => Ok(to_json_binary(&queries::signing_info(
            deps, btc_pk_hex,
        )?)?),
        QueryMsg::MissedBlocks { btc_pk_hex } => Ok(to_json_binary(&queries::missed_blocks(
            deps, btc_pk_hex,
        )?)?),
    }
}

pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
    collaborators: &mut Collaborators<'_>,
) -> Result<Response, ContractError> {
    nonpayable(&info)?;
    if msg.authority() == Authority::Governance {
        ADMIN.assert_admin(deps.as_ref(), &info.sender)?;
    }

    match msg {
        ExecuteMsg::CommitPubRandList {
            fp_btc_pk_hex,
            start_height,
            num_pub_rand,
            commitment,
            signature,
        } => handle_public_randomness_commit(
            deps,
            &*collaborators.staking,
            collaborators.epoching,
            &fp_btc_pk_hex,
            start_height,
            num_pub_rand,
            &commitment,
            &signature,
        ),
        ExecuteMsg::AddFinalitySig {
            fp_btc_pk_hex,
            height,
            pub_rand,
            proof,
            block_app_hash,
            signature,
        } => handle_finality_signature(
            deps,
            &env,
            &mut *collaborators.staking,
            collaborators.epoching,
            &fp_btc_pk_hex,
            height,
            &pub_rand,
            &proof,
            &block_app_hash,
            &signature,
        ),
        ExecuteMsg::UpdateParams { params } => handle_update_params(deps, params),
        ExecuteMsg::ResumeFinality {
            fp_pks_hex,
            halting_height,
        } => handle_resume_finality(
            deps,
            &env,
            &mut *collaborators.staking,
            &fp_pks_hex,
            halting_height,
        ),
        ExecuteMsg::UnjailFinalityProvider { fp_btc_pk_hex } => handle_unjail(
            deps,
            &env,
            &info,
            &mut *collaborators.staking,
            &fp_btc_pk_hex,
        ),
    }
}

/// Block hooks. Any error returned here is fatal for the block
pub fn sudo(
    mut deps: DepsMut,
    env: Env,
    msg: SudoMsg,
    collaborators: &mut Collaborators<'_>,
) -> Result<Response, ContractError> {
    match msg {
        SudoMsg::BeginBlock { app_hash_hex } => {
            handle_begin_block(&mut deps, env, &app_hash_hex, collaborators)
        }
        SudoMsg::EndBlock {} => handle_end_block(&mut deps, env, collaborators),
    }
}

fn handle_begin_block(
    deps: &mut DepsMut,
    env: Env,
    app_hash_hex: &str,
    collaborators: &mut Collaborators<'_>,
) -> Result<Response, ContractError> {
    let params = PARAMS.load(deps.storage)?;

    // Update the voting power distribution of this height
    let events = record_voting_power_and_cache(
        deps,
        &env,
        &mut *collaborators.staking,
        collaborators.epoching,
        &params,
    )?;
    let mut res = Response::new().add_events(events);

    // Index the current block, so that votes for it can be verified
    if env.block.height >= params.finality_activation_height {
        let ev = index_block(deps.storage, env.block.height, &hex::decode(app_hash_hex)?)?;
        res = res.add_event(ev);
    }
    Ok(res)
}

fn handle_end_block(
    deps: &mut DepsMut,
    env: Env,
    collaborators: &mut Collaborators<'_>,
) -> Result<Response, ContractError> {
    let params = PARAMS.load(deps.storage)?;
    // Nothing to tally before BTC staking is activated
    if !is_finality_active(deps.storage, &env, &params)? {
        return Ok(Response::new());
    }

    let mut res = Response::new();
    res = res.add_events(tally_blocks(deps.storage, &env, &params)?);
    res = res.add_events(handle_liveness(
        deps,
        &env,
        &mut *collaborators.staking,
        &params,
    )?);
    res = res.add_events(reward_blocks(
        deps.storage,
        &env,
        &mut *collaborators.incentive,
        &params,
    )?);
    Ok(res)
}
