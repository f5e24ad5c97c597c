use cosmwasm_std::{Event, Timestamp};

use babylon_apis::finality_api::Evidence;

pub const MODULE: &str = "finality";

fn finality_event(ty: &str) -> Event {
    Event::new(ty).add_attribute("module", MODULE)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalityProviderStatus {
    Active,
    Inactive,
}

impl FinalityProviderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalityProviderStatus::Active => "active",
            FinalityProviderStatus::Inactive => "inactive",
        }
    }
}

pub fn finality_provider_status_change(
    fp_btc_pk_hex: &str,
    status: FinalityProviderStatus,
) -> Event {
    finality_event("finality_provider_status_change")
        .add_attribute("btc_pk", fp_btc_pk_hex)
        .add_attribute("new_state", status.as_str())
}

pub fn jailed_finality_provider(fp_btc_pk_hex: &str, jailed_until: Timestamp) -> Event {
    finality_event("jailed_finality_provider")
        .add_attribute("btc_pk", fp_btc_pk_hex)
        .add_attribute("jailed_until", jailed_until.seconds().to_string())
}

pub fn slashed_finality_provider(evidence: &Evidence, secret_key: &[u8]) -> Event {
    finality_event("slashed_finality_provider")
        .add_attribute("fp_btc_pk", hex::encode(&evidence.fp_btc_pk))
        .add_attribute("block_height", evidence.block_height.to_string())
        .add_attribute("pub_rand", hex::encode(&evidence.pub_rand))
        .add_attribute("canonical_app_hash", hex::encode(&evidence.canonical_app_hash))
        .add_attribute("fork_app_hash", hex::encode(&evidence.fork_app_hash))
        .add_attribute(
            "canonical_finality_sig",
            hex::encode(&evidence.canonical_finality_sig),
        )
        .add_attribute("fork_finality_sig", hex::encode(&evidence.fork_finality_sig))
        .add_attribute("secret_key", hex::encode(secret_key))
}

pub fn expired_delegation(staking_tx_hash: &str) -> Event {
    finality_event("expired_delegation").add_attribute("staking_tx_hash", staking_tx_hash)
}

pub fn index_block(height: u64, app_hash: &[u8]) -> Event {
    finality_event("index_block")
        .add_attribute("height", height.to_string())
        .add_attribute("app_hash", hex::encode(app_hash))
}

pub fn finalize_block(height: u64) -> Event {
    finality_event("finalize_block").add_attribute("finalized_height", height.to_string())
}

pub fn commit_pub_rand(
    fp_btc_pk_hex: &str,
    start_height: u64,
    num_pub_rand: u64,
    epoch: u64,
) -> Event {
    finality_event("commit_pub_rand")
        .add_attribute("btc_pk", fp_btc_pk_hex)
        .add_attribute("start_height", start_height.to_string())
        .add_attribute("num_pub_rand", num_pub_rand.to_string())
        .add_attribute("epoch", epoch.to_string())
}

pub fn add_finality_sig(fp_btc_pk_hex: &str, height: u64, app_hash: &[u8]) -> Event {
    finality_event("add_finality_sig")
        .add_attribute("btc_pk", fp_btc_pk_hex)
        .add_attribute("height", height.to_string())
        .add_attribute("app_hash", hex::encode(app_hash))
}

pub fn reward_btc_staking(height: u64, num_voters: usize) -> Event {
    finality_event("reward_btc_staking")
        .add_attribute("height", height.to_string())
        .add_attribute("num_voters", num_voters.to_string())
}

pub fn unjail_finality_provider(fp_btc_pk_hex: &str) -> Event {
    finality_event("unjail_finality_provider").add_attribute("btc_pk", fp_btc_pk_hex)
}

pub fn resume_finality(halting_height: u64, fp_pks_hex: &[String]) -> Event {
    finality_event("resume_finality")
        .add_attribute("halting_height", halting_height.to_string())
        .add_attribute("jailed_fps", fp_pks_hex.join(","))
}

pub fn update_params() -> Event {
    finality_event("update_params")
}
