use std::cmp::max;

use cosmwasm_std::{DepsMut, Env, Event, Response, Storage};
use k256::ecdsa::signature::Verifier;
use k256::schnorr::{Signature, VerifyingKey};

use babylon_apis::finality_api::{Evidence, IndexedBlock, PubRandCommit};
use babylon_apis::{HASH_SIZE, SCHNORR_SIG_SIZE};
use babylon_merkle::Proof;

use crate::collaborators::{BtcStakingOracle, EpochOracle, IncentiveSink};
use crate::error::ContractError;
use crate::events;
use crate::signing_context::{commit_pub_rand_msg, fp_fin_vote_context_v0, msg_to_sign};
use crate::state::config::{Params, PARAMS};
use crate::state::finality::{
    next_height_to_finalize, next_height_to_reward, voters_at_height, BLOCKS, EVIDENCES,
    NEXT_HEIGHT_TO_FINALIZE, NEXT_HEIGHT_TO_REWARD, VOTES,
};
use crate::state::public_randomness::{
    get_last_pub_rand_commit, get_timestamped_pub_rand_commit_for_height,
    insert_pub_rand_commit, PUB_RAND_COMMITS, PUB_RAND_VALUES,
};
use crate::state::voting_power::{activated_height, voting_power_at, VP_DIST_CACHE};

#[allow(clippy::too_many_arguments)]
pub fn handle_public_randomness_commit(
    deps: DepsMut,
    staking: &dyn BtcStakingOracle,
    epoching: &dyn EpochOracle,
    fp_btc_pk_hex: &str,
    start_height: u64,
    num_pub_rand: u64,
    commitment: &[u8],
    signature: &[u8],
) -> Result<Response, ContractError> {
    // Ensure the finality provider is registered and not slashed
    let fp = staking
        .finality_provider(fp_btc_pk_hex)?
        .ok_or_else(|| ContractError::FinalityProviderNotFound(fp_btc_pk_hex.to_string()))?;
    if fp.is_slashed() {
        return Err(ContractError::FinalityProviderAlreadySlashed(
            fp_btc_pk_hex.to_string(),
        ));
    }

    if commitment.len() != HASH_SIZE {
        return Err(ContractError::InvalidCommitmentLength {
            expected: HASH_SIZE,
            actual: commitment.len(),
        });
    }
    if signature.len() != SCHNORR_SIG_SIZE {
        return Err(ContractError::InvalidSignatureLength {
            expected: SCHNORR_SIG_SIZE,
            actual: signature.len(),
        });
    }

    // Ensure the request contains enough amounts of public randomness
    let params = PARAMS.load(deps.storage)?;
    if num_pub_rand < params.min_pub_rand {
        return Err(ContractError::TooFewPubRand(num_pub_rand, params.min_pub_rand));
    }
    // The last height of the range has to be representable
    if start_height.checked_add(num_pub_rand).is_none() {
        return Err(ContractError::PubRandCommitOverflow(start_height));
    }
    if start_height < params.finality_activation_height {
        return Err(ContractError::PubRandCommitBeforeActivation(
            start_height,
            params.finality_activation_height,
        ));
    }

    // The same commit may be gossiped more than once
    let existing = PUB_RAND_COMMITS.may_load(deps.storage, (fp_btc_pk_hex, start_height))?;
    if let Some(existing) = existing {
        if existing.num_pub_rand == num_pub_rand && existing.commitment == commitment {
            deps.api.debug(&format!(
                "Received duplicated public randomness commit. \
                 Start height: {start_height}, Finality Provider: {fp_btc_pk_hex}"
            ));
            return Ok(Response::new());
        }
    }

    verify_commitment_signature(fp_btc_pk_hex, start_height, num_pub_rand, commitment, signature)?;

    // Ensure the new range starts after the last committed one
    if let Some(last_pr_commit) = get_last_pub_rand_commit(deps.storage, fp_btc_pk_hex)? {
        if start_height <= last_pr_commit.end_height() {
            return Err(ContractError::InvalidPubRandHeight(
                start_height,
                last_pr_commit.end_height(),
            ));
        }
    }

    // All good, store the given public randomness commitment
    let epoch_num = epoching.current_epoch()?;
    let pr_commit = PubRandCommit {
        start_height,
        num_pub_rand,
        epoch_num,
        commitment: commitment.to_vec(),
    };
    insert_pub_rand_commit(deps.storage, fp_btc_pk_hex, &pr_commit)?;

    Ok(Response::new().add_event(events::commit_pub_rand(
        fp_btc_pk_hex,
        start_height,
        num_pub_rand,
        epoch_num,
    )))
}

fn verify_commitment_signature(
    fp_btc_pk_hex: &str,
    start_height: u64,
    num_pub_rand: u64,
    commitment: &[u8],
    signature: &[u8],
) -> Result<(), ContractError> {
    // get BTC public key for verification
    let btc_pk_raw = hex::decode(fp_btc_pk_hex)?;
    let btc_pk = VerifyingKey::from_bytes(&btc_pk_raw)
        .map_err(|e| ContractError::FailedSignatureVerification(e.to_string()))?;

    let schnorr_sig = Signature::try_from(signature)
        .map_err(|e| ContractError::FailedSignatureVerification(e.to_string()))?;

    // The signed message is hashed with sha256 by the verifier
    let msg = commit_pub_rand_msg(start_height, num_pub_rand, commitment);
    btc_pk
        .verify(&msg, &schnorr_sig)
        .map_err(|e| ContractError::FailedSignatureVerification(e.to_string()))
}

#[allow(clippy::too_many_arguments)]
pub fn handle_finality_signature(
    deps: DepsMut,
    env: &Env,
    staking: &mut dyn BtcStakingOracle,
    epoching: &dyn EpochOracle,
    fp_btc_pk_hex: &str,
    height: u64,
    pub_rand: &[u8],
    proof: &Proof,
    block_app_hash: &[u8],
    signature: &[u8],
) -> Result<Response, ContractError> {
    // Ensure the finality provider exists and is not slashed.
    // Jailed finality providers have no voting power, so they are rejected below
    let fp = staking
        .finality_provider(fp_btc_pk_hex)?
        .ok_or_else(|| ContractError::FinalityProviderNotFound(fp_btc_pk_hex.to_string()))?;
    if fp.is_slashed() {
        return Err(ContractError::FinalityProviderAlreadySlashed(
            fp_btc_pk_hex.to_string(),
        ));
    }

    // Ensure the finality provider has voting power at this height
    if voting_power_at(deps.storage, height, fp_btc_pk_hex)? == 0 {
        return Err(ContractError::NoVotingPower(fp_btc_pk_hex.to_string(), height));
    }
    // Ensure the height is proper
    if env.block.height < height {
        return Err(ContractError::HeightTooHigh {
            height,
            current: env.block.height,
        });
    }
    // Ensure the signature is not empty
    if signature.is_empty() {
        return Err(ContractError::EmptySignature);
    }
    // Ensure the finality provider has not cast the same vote yet
    let existing_sig = VOTES.may_load(deps.storage, (height, fp_btc_pk_hex))?;
    if existing_sig.as_deref() == Some(signature) {
        deps.api.debug(&format!(
            "Received duplicated finality vote. \
             Height: {height}, Finality Provider: {fp_btc_pk_hex}"
        ));
        // Exactly the same vote already exists, return success to the provider
        return Ok(Response::new());
    }

    // Find the BTC timestamped public randomness commitment for this height
    let pr_commit =
        get_timestamped_pub_rand_commit_for_height(deps.storage, epoching, fp_btc_pk_hex, height)?;

    let context = fp_fin_vote_context_v0(&env.block.chain_id, env.contract.address.as_str());
    verify_finality_signature(
        fp_btc_pk_hex,
        height,
        pub_rand,
        proof,
        &pr_commit,
        &msg_to_sign(&context, height, block_app_hash),
        signature,
    )?;

    // Verify whether the voted block is a fork or not
    let indexed_block = BLOCKS
        .may_load(deps.storage, height)?
        .ok_or(ContractError::BlockNotFound(height))?;

    // The public randomness value is good, save it
    PUB_RAND_VALUES.save(deps.storage, (fp_btc_pk_hex, height), &pub_rand.to_vec())?;

    let mut res = Response::new();
    if indexed_block.app_hash != block_app_hash {
        // The finality provider votes for a fork!
        let mut evidence = Evidence {
            fp_btc_pk: hex::decode(fp_btc_pk_hex)?,
            block_height: height,
            pub_rand: pub_rand.to_vec(),
            canonical_app_hash: indexed_block.app_hash,
            canonical_finality_sig: vec![],
            fork_app_hash: block_app_hash.to_vec(),
            fork_finality_sig: signature.to_vec(),
        };
        // If this finality provider has also signed the canonical block, slash it
        if let Some(canonical_sig) = existing_sig {
            evidence.canonical_finality_sig = canonical_sig;
        }
        EVIDENCES.save(deps.storage, (fp_btc_pk_hex, height), &evidence)?;
        if evidence.is_slashable() {
            let ev = slash_finality_provider(staking, env, &context, fp_btc_pk_hex, &evidence)?;
            res = res.add_event(ev);
        }
        // An error here would roll back the evidence
        return Ok(res);
    }

    // This signature is good, save the vote to the store
    VOTES.save(deps.storage, (height, fp_btc_pk_hex), &signature.to_vec())?;
    res = res.add_event(events::add_finality_sig(fp_btc_pk_hex, height, block_app_hash));

    // If this finality provider has voted for a fork at this height before, slash it
    if let Some(mut evidence) = EVIDENCES.may_load(deps.storage, (fp_btc_pk_hex, height))? {
        evidence.canonical_finality_sig = signature.to_vec();
        EVIDENCES.save(deps.storage, (fp_btc_pk_hex, height), &evidence)?;
        let ev = slash_finality_provider(staking, env, &context, fp_btc_pk_hex, &evidence)?;
        res = res.add_event(ev);
    }

    Ok(res)
}

/// Verifies the finality signature message w.r.t. the public randomness commitment:
/// - Public randomness inclusion proof.
/// - Finality signature
fn verify_finality_signature(
    fp_btc_pk_hex: &str,
    block_height: u64,
    pub_rand: &[u8],
    proof: &Proof,
    pr_commit: &PubRandCommit,
    msg_hash: &[u8; 32],
    signature: &[u8],
) -> Result<(), ContractError> {
    if pub_rand.len() != HASH_SIZE {
        return Err(ContractError::InvalidPubRand(format!(
            "expected {HASH_SIZE} bytes, got {}",
            pub_rand.len()
        )));
    }
    let proof_height = pr_commit.start_height.checked_add(proof.index);
    if proof_height != Some(block_height) {
        return Err(ContractError::InvalidPubRand(format!(
            "the proof is for index {} of the commit starting at {}, not for height {}",
            proof.index, pr_commit.start_height, block_height
        )));
    }
    // Verify the total amount of randomness is the same as in the commitment
    if proof.total != pr_commit.num_pub_rand {
        return Err(ContractError::InvalidPubRand(format!(
            "the proof is over {} values, the commit has {}",
            proof.total, pr_commit.num_pub_rand
        )));
    }
    // Verify the proof of inclusion for this public randomness
    proof
        .validate_basic()
        .and_then(|_| proof.verify(&pr_commit.commitment, pub_rand))
        .map_err(|e| ContractError::InvalidPubRand(e.to_string()))?;

    // Public randomness is good, verify finality signature
    let pubkey = eots::PublicKey::from_hex(fp_btc_pk_hex)?;
    let pub_rand = eots::new_pub_rand(pub_rand)
        .map_err(|e| ContractError::InvalidPubRand(e.to_string()))?;
    let sig =
        eots::new_sig(signature).map_err(|e| ContractError::InvalidFinalitySig(e.to_string()))?;
    if !pubkey.verify(&pub_rand, msg_hash, &sig) {
        return Err(ContractError::InvalidFinalitySig(
            "EOTS verification failed".into(),
        ));
    }
    Ok(())
}

/// `slash_finality_provider` extracts the BTC SK of the finality provider from the evidence,
/// has the staking module mark it as slashed, and returns the slashing event
fn slash_finality_provider(
    staking: &mut dyn BtcStakingOracle,
    env: &Env,
    context: &str,
    fp_btc_pk_hex: &str,
    evidence: &Evidence,
) -> Result<Event, ContractError> {
    let pk = eots::PublicKey::from_hex(fp_btc_pk_hex)?;
    let btc_sk = pk.extract_secret_key(
        &evidence.pub_rand,
        &msg_to_sign(context, evidence.block_height, &evidence.canonical_app_hash),
        &evidence.canonical_finality_sig,
        &msg_to_sign(context, evidence.block_height, &evidence.fork_app_hash),
        &evidence.fork_finality_sig,
    )?;

    staking.slash_finality_provider(fp_btc_pk_hex, env.block.height)?;

    Ok(events::slashed_finality_provider(evidence, &btc_sk.to_bytes()))
}

pub fn index_block(
    storage: &mut dyn Storage,
    height: u64,
    app_hash: &[u8],
) -> Result<Event, ContractError> {
    if app_hash.len() != HASH_SIZE {
        return Err(ContractError::InvalidAppHash(app_hash.len()));
    }
    let indexed_block = IndexedBlock {
        height,
        app_hash: app_hash.to_vec(),
        finalized: false,
    };
    BLOCKS.save(storage, height, &indexed_block)?;

    Ok(events::index_block(height, app_hash))
}

/// Whether BTC staking has been activated, i.e. some height has a voting power table, and the
/// finality activation height has been reached
pub fn is_finality_active(
    storage: &dyn Storage,
    env: &Env,
    params: &Params,
) -> Result<bool, ContractError> {
    Ok(env.block.height >= params.finality_activation_height
        && activated_height(storage)?.is_some())
}

/// First height the tally and reward loops may look at
fn first_finality_height(storage: &dyn Storage, params: &Params) -> Result<u64, ContractError> {
    let activated = activated_height(storage)?.unwrap_or_default();
    Ok(max(activated, params.finality_activation_height))
}

/// `tally_blocks` tries to finalise the non-finalised blocks in height order, starting at the
/// next height to finalise.
///
/// It stops at the first block that does not get more than 2/3 of the active voting power, so
/// the finalised blocks always form a contiguous prefix of the chain.
/// It must be invoked only after the BTC staking protocol is activated.
pub fn tally_blocks(
    storage: &mut dyn Storage,
    env: &Env,
    params: &Params,
) -> Result<Vec<Event>, ContractError> {
    let stored_height = next_height_to_finalize(storage)?;
    let start_height = max(stored_height, first_finality_height(storage, params)?);

    let mut events = vec![];
    let mut next_height = start_height;
    let max_blocks = params.max_finalized_rewarded_blocks_per_end_block;
    for height in (start_height..=env.block.height).take(max_blocks as usize) {
        let Some(mut indexed_block) = BLOCKS.may_load(storage, height)? else {
            break;
        };
        let Some(dc) = VP_DIST_CACHE.may_load(storage, height)? else {
            break;
        };
        if !indexed_block.finalized {
            let voters = voters_at_height(storage, height)?;
            let voted_power: u64 = dc
                .active_finality_providers()
                .iter()
                .filter(|fp| voters.contains(&fp.btc_pk_hex))
                .map(|fp| fp.total_bonded_sat)
                .sum();
            if !has_quorum(voted_power, dc.total_voting_power) {
                // This block and all subsequent blocks cannot be finalised yet
                break;
            }
            indexed_block.finalized = true;
            BLOCKS.save(storage, height, &indexed_block)?;
            events.push(events::finalize_block(height));
        }
        next_height = height + 1;
    }

    if next_height != stored_height {
        NEXT_HEIGHT_TO_FINALIZE.save(storage, &next_height)?;
    }
    Ok(events)
}

/// `has_quorum` checks whether the voted power is strictly more than 2/3 of the total
fn has_quorum(voted_power: u64, total_power: u64) -> bool {
    u128::from(voted_power) * 3 > u128::from(total_power) * 2
}

/// `reward_blocks` hands the finalised blocks, up to `FinalitySigTimeout` blocks before the
/// current one, to the incentive module, and prunes their voting power distribution caches
pub fn reward_blocks(
    storage: &mut dyn Storage,
    env: &Env,
    incentive: &mut dyn IncentiveSink,
    params: &Params,
) -> Result<Vec<Event>, ContractError> {
    let Some(last_height) = env.block.height.checked_sub(params.finality_sig_timeout) else {
        return Ok(vec![]);
    };
    let stored_height = next_height_to_reward(storage)?;
    let start_height = max(stored_height, first_finality_height(storage, params)?);

    let mut events = vec![];
    let mut next_height = start_height;
    let max_blocks = params.max_finalized_rewarded_blocks_per_end_block;
    for height in (start_height..=last_height).take(max_blocks as usize) {
        match BLOCKS.may_load(storage, height)? {
            Some(block) if block.finalized => {}
            _ => break,
        }
        let dc = VP_DIST_CACHE
            .may_load(storage, height)?
            .ok_or(ContractError::MissingDistCache(height))?;
        let voters = voters_at_height(storage, height)?;
        incentive.reward_btc_staking(height, &dc, &voters)?;
        VP_DIST_CACHE.remove(storage, height);
        events.push(events::reward_btc_staking(height, voters.len()));
        next_height = height + 1;
    }

    if next_height != stored_height {
        NEXT_HEIGHT_TO_REWARD.save(storage, &next_height)?;
    }
    Ok(events)
}
