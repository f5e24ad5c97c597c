use std::collections::HashSet;

use crate::error::StakingApiError;
use crate::finality_api::{
    Evidence, FinalityProviderDistInfo, FinalityProviderSigningInfo, IndexedBlock, PubRandCommit,
    VotingPowerDistCache,
};
use crate::staking_api::{BtcDelegation, PowerDistUpdateEvent};
use crate::HASH_SIZE;

/// A trait for validating the API structs / input.
pub trait Validate {
    fn validate(&self) -> Result<(), StakingApiError>;
}

/// Checks a BIP-340 public key in hex format
pub fn validate_btc_pk_hex(btc_pk_hex: &str) -> Result<(), StakingApiError> {
    if btc_pk_hex.is_empty() {
        return Err(StakingApiError::EmptyBtcPk);
    }
    let pk = hex::decode(btc_pk_hex)?;
    if pk.len() != HASH_SIZE {
        return Err(StakingApiError::InvalidBtcPk(
            btc_pk_hex.to_string(),
            HASH_SIZE,
        ));
    }
    Ok(())
}

fn validate_staking_tx_hash(staking_tx_hash: &str) -> Result<(), StakingApiError> {
    if staking_tx_hash.len() != HASH_SIZE * 2 {
        return Err(StakingApiError::InvalidStakingTxHash(HASH_SIZE * 2));
    }
    hex::decode(staking_tx_hash)?;
    Ok(())
}

fn check_len(field: &'static str, bytes: &[u8], expected: usize) -> Result<(), StakingApiError> {
    if bytes.len() != expected {
        return Err(StakingApiError::InvalidLength {
            field,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

fn check_duplicated_fps(fp_btc_pk_list: &[String]) -> Result<(), StakingApiError> {
    let mut fp_btc_pk_set = HashSet::new();
    for fp_btc_pk in fp_btc_pk_list {
        if !fp_btc_pk_set.insert(fp_btc_pk) {
            return Err(StakingApiError::DuplicatedBtcPk(fp_btc_pk.clone()));
        }
    }
    Ok(())
}

impl Validate for IndexedBlock {
    fn validate(&self) -> Result<(), StakingApiError> {
        if self.height == 0 {
            return Err(StakingApiError::ZeroHeight);
        }
        check_len("app hash", &self.app_hash, HASH_SIZE)
    }
}

impl Validate for PubRandCommit {
    fn validate(&self) -> Result<(), StakingApiError> {
        if self.num_pub_rand == 0 {
            return Err(StakingApiError::EmptyPubRandCommit);
        }
        if self.start_height.checked_add(self.num_pub_rand).is_none() {
            return Err(StakingApiError::PubRandCommitOverflow(self.start_height));
        }
        check_len("commitment", &self.commitment, HASH_SIZE)
    }
}

impl Validate for Evidence {
    fn validate(&self) -> Result<(), StakingApiError> {
        check_len("fp btc pk", &self.fp_btc_pk, HASH_SIZE)?;
        if self.block_height == 0 {
            return Err(StakingApiError::ZeroHeight);
        }
        check_len("pub rand", &self.pub_rand, HASH_SIZE)?;
        check_len("canonical app hash", &self.canonical_app_hash, HASH_SIZE)?;
        check_len("fork app hash", &self.fork_app_hash, HASH_SIZE)?;
        if self.canonical_app_hash == self.fork_app_hash {
            return Err(StakingApiError::EvidenceSameAppHash(self.block_height));
        }
        // the canonical signature is only known once the provider also voted for the
        // canonical block
        if !self.canonical_finality_sig.is_empty() {
            check_len("canonical finality sig", &self.canonical_finality_sig, HASH_SIZE)?;
        }
        check_len("fork finality sig", &self.fork_finality_sig, HASH_SIZE)
    }
}

impl Validate for FinalityProviderSigningInfo {
    fn validate(&self) -> Result<(), StakingApiError> {
        validate_btc_pk_hex(&self.fp_btc_pk_hex)
    }
}

impl Validate for FinalityProviderDistInfo {
    fn validate(&self) -> Result<(), StakingApiError> {
        validate_btc_pk_hex(&self.btc_pk_hex)?;
        let mut sum = 0u64;
        for del in &self.btc_dels {
            validate_staking_tx_hash(&del.staking_tx_hash)?;
            sum = sum.checked_add(del.total_sat).ok_or_else(|| {
                StakingApiError::dist_cache_err(format!(
                    "bonded sats of {} overflow",
                    self.btc_pk_hex
                ))
            })?;
        }
        if sum != self.total_bonded_sat {
            return Err(StakingApiError::dist_cache_err(format!(
                "{} has {} bonded sats but its delegations sum up to {}",
                self.btc_pk_hex, self.total_bonded_sat, sum
            )));
        }
        Ok(())
    }
}

impl Validate for VotingPowerDistCache {
    fn validate(&self) -> Result<(), StakingApiError> {
        let mut seen = HashSet::new();
        for fp in &self.finality_providers {
            fp.validate()?;
            if !seen.insert(fp.btc_pk_hex.as_str()) {
                return Err(StakingApiError::DuplicatedBtcPk(fp.btc_pk_hex.clone()));
            }
        }
        let num_active = self.num_active_fps as usize;
        if num_active > self.finality_providers.len() {
            return Err(StakingApiError::dist_cache_err(format!(
                "{} active finality providers out of {}",
                num_active,
                self.finality_providers.len()
            )));
        }
        if let Some(fp) = self.active_finality_providers().iter().find(|fp| fp.is_zeroed()) {
            return Err(StakingApiError::dist_cache_err(format!(
                "{} is active without voting power",
                fp.btc_pk_hex
            )));
        }
        let total: u64 = self
            .active_finality_providers()
            .iter()
            .map(|fp| fp.total_bonded_sat)
            .sum();
        if total != self.total_voting_power {
            return Err(StakingApiError::dist_cache_err(format!(
                "total voting power {} does not match the active set's {}",
                self.total_voting_power, total
            )));
        }
        Ok(())
    }
}

impl Validate for BtcDelegation {
    fn validate(&self) -> Result<(), StakingApiError> {
        validate_staking_tx_hash(&self.staking_tx_hash)?;
        validate_btc_pk_hex(&self.btc_pk_hex)?;
        if self.fp_btc_pk_list.is_empty() {
            return Err(StakingApiError::EmptyBtcPkList);
        }
        check_duplicated_fps(&self.fp_btc_pk_list)?;
        if self.total_sat == 0 {
            return Err(StakingApiError::ZeroStake(self.staking_tx_hash.clone()));
        }
        Ok(())
    }
}

impl Validate for PowerDistUpdateEvent {
    fn validate(&self) -> Result<(), StakingApiError> {
        match self {
            PowerDistUpdateEvent::DelegationActivated {
                staking_tx_hash,
                fp_btc_pk_list,
                total_sat,
            } => {
                validate_staking_tx_hash(staking_tx_hash)?;
                if fp_btc_pk_list.is_empty() {
                    return Err(StakingApiError::EmptyBtcPkList);
                }
                check_duplicated_fps(fp_btc_pk_list)?;
                if *total_sat == 0 {
                    return Err(StakingApiError::ZeroStake(staking_tx_hash.clone()));
                }
                Ok(())
            }
            PowerDistUpdateEvent::DelegationUnbonded { staking_tx_hash }
            | PowerDistUpdateEvent::DelegationExpired { staking_tx_hash } => {
                validate_staking_tx_hash(staking_tx_hash)
            }
            PowerDistUpdateEvent::SlashedFp { fp_btc_pk_hex }
            | PowerDistUpdateEvent::JailedFp { fp_btc_pk_hex }
            | PowerDistUpdateEvent::UnjailedFp { fp_btc_pk_hex } => {
                validate_btc_pk_hex(fp_btc_pk_hex)
            }
        }
    }
}
