/// Finality messages / API
/// The definitions here roughly follow the same structure as the equivalent protobuf types,
/// defined in `packages/proto/src/gen/babylon.finality.v1.rs`
use std::cmp::Ordering;
use std::collections::HashSet;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Decimal, Timestamp};

use crate::Bytes;

/// `IndexedBlock` is the necessary metadata and finalization status of a block
#[cw_serde]
pub struct IndexedBlock {
    /// `height` is the height of the block
    pub height: u64,
    /// `app_hash` is the AppHash of the block
    pub app_hash: Bytes,
    /// `finalized` indicates whether the IndexedBlock is finalised by 2/3 of the finality
    /// providers or not
    pub finalized: bool,
}

/// `PubRandCommit` is a commitment to a series of public randomness.
/// Currently, the commitment is a root of a Merkle tree that includes a series of public randomness
/// values
#[cw_serde]
pub struct PubRandCommit {
    /// `start_height` is the height of the first commitment
    pub start_height: u64,
    /// `num_pub_rand` is the number of committed public randomness
    pub num_pub_rand: u64,
    /// `epoch_num` is the epoch in which the commit was accepted. The commit can back finality
    /// signatures once this epoch is checkpointed on Bitcoin
    pub epoch_num: u64,
    /// `commitment` is the value of the commitment.
    /// Currently, it's the root of the Merkle tree constructed by the public randomness
    pub commitment: Bytes,
}

impl PubRandCommit {
    /// `in_range` checks if the given height is within the range of the commitment
    pub fn in_range(&self, height: u64) -> bool {
        self.start_height <= height && height <= self.end_height()
    }

    /// `end_height` returns the height of the last commitment
    pub fn end_height(&self) -> u64 {
        (self.start_height + self.num_pub_rand).saturating_sub(1)
    }

    /// `index_of` returns the position of the value for `height` in the committed list
    pub fn index_of(&self, height: u64) -> Option<u64> {
        self.in_range(height).then(|| height - self.start_height)
    }
}

/// Evidence is the evidence that a finality provider has signed finality
/// signatures with correct public randomness on two conflicting Babylon headers
#[cw_serde]
pub struct Evidence {
    /// `fp_btc_pk` is the BTC PK of the finality provider that casts this vote
    pub fp_btc_pk: Bytes,
    /// `block_height` is the height of the conflicting blocks
    pub block_height: u64,
    /// `pub_rand is` the public randomness the finality provider has committed to
    pub pub_rand: Bytes,
    /// `canonical_app_hash` is the AppHash of the canonical block
    pub canonical_app_hash: Bytes,
    /// `fork_app_hash` is the AppHash of the fork block
    pub fork_app_hash: Bytes,
    /// `canonical_finality_sig` is the EOTS signature over the canonical block. Empty when the
    /// finality provider has only voted for the fork so far
    pub canonical_finality_sig: Bytes,
    /// `fork_finality_sig` is the EOTS signature over the fork block
    pub fork_finality_sig: Bytes,
}

impl Evidence {
    /// An evidence is slashable once it carries both signatures, as the two signatures under
    /// the same public randomness leak the secret key
    pub fn is_slashable(&self) -> bool {
        !self.canonical_finality_sig.is_empty() && !self.fork_finality_sig.is_empty()
    }
}

/// `FinalityProviderSigningInfo` is the liveness bookkeeping of a finality provider
#[cw_serde]
pub struct FinalityProviderSigningInfo {
    pub fp_btc_pk_hex: String,
    /// Height at which the finality provider became active for the last time
    pub start_height: u64,
    /// Number of set bits in the missed blocks bitmap
    pub missed_blocks_counter: u64,
    /// Time until which the finality provider cannot be unjailed
    pub jailed_until: Timestamp,
}

impl FinalityProviderSigningInfo {
    pub fn new(fp_btc_pk_hex: &str, start_height: u64) -> Self {
        Self {
            fp_btc_pk_hex: fp_btc_pk_hex.to_string(),
            start_height,
            missed_blocks_counter: 0,
            jailed_until: Timestamp::from_seconds(0),
        }
    }
}

/// The part of a BTC delegation that counts towards a finality provider's voting power
#[cw_serde]
pub struct BtcDelDistInfo {
    pub staking_tx_hash: String,
    pub total_sat: u64,
}

/// `FinalityProviderDistInfo` is a snapshot of a finality provider at one height, as far as
/// the power distribution is concerned
#[cw_serde]
pub struct FinalityProviderDistInfo {
    pub btc_pk_hex: String,
    /// Babylon address of the finality provider
    pub addr: String,
    pub commission: Decimal,
    /// Sum of the `total_sat` of `btc_dels`
    pub total_bonded_sat: u64,
    pub is_timestamped: bool,
    pub is_jailed: bool,
    pub is_slashed: bool,
    pub btc_dels: Vec<BtcDelDistInfo>,
}

impl FinalityProviderDistInfo {
    pub fn new(btc_pk_hex: &str, addr: &str, commission: Decimal) -> Self {
        Self {
            btc_pk_hex: btc_pk_hex.to_string(),
            addr: addr.to_string(),
            commission,
            total_bonded_sat: 0,
            is_timestamped: false,
            is_jailed: false,
            is_slashed: false,
            btc_dels: vec![],
        }
    }

    pub fn add_bonded_sat(&mut self, staking_tx_hash: &str, sat: u64) {
        self.btc_dels.push(BtcDelDistInfo {
            staking_tx_hash: staking_tx_hash.to_string(),
            total_sat: sat,
        });
        self.total_bonded_sat += sat;
    }

    /// Whether this finality provider has to be sorted into the tail with zero voting power
    pub fn is_zeroed(&self) -> bool {
        self.is_jailed || self.is_slashed || !self.is_timestamped || self.total_bonded_sat == 0
    }
}

/// Orders finality providers with voting power first, by bonded sats descending and then by
/// key, and those without voting power last
fn compare_dist_info(a: &FinalityProviderDistInfo, b: &FinalityProviderDistInfo) -> Ordering {
    a.is_zeroed()
        .cmp(&b.is_zeroed())
        .then_with(|| b.total_bonded_sat.cmp(&a.total_bonded_sat))
        .then_with(|| a.btc_pk_hex.cmp(&b.btc_pk_hex))
}

/// `VotingPowerDistCache` is the voting power distribution of all finality providers at one
/// height. The first `num_active_fps` entries form the active set
#[cw_serde]
#[derive(Default)]
pub struct VotingPowerDistCache {
    /// Sum of the bonded sats of the active finality providers
    pub total_voting_power: u64,
    pub finality_providers: Vec<FinalityProviderDistInfo>,
    pub num_active_fps: u32,
}

impl VotingPowerDistCache {
    pub fn add_finality_provider(&mut self, fp: FinalityProviderDistInfo) {
        self.finality_providers.push(fp);
    }

    pub fn sort_finality_providers(&mut self) {
        self.finality_providers.sort_by(compare_dist_info);
    }

    /// Sorts the finality providers and records the first `max_active_fps` eligible ones as
    /// the active set
    pub fn apply_active_finality_providers(&mut self, max_active_fps: u32) {
        self.sort_finality_providers();
        let num_active = self
            .finality_providers
            .iter()
            .take(max_active_fps as usize)
            .take_while(|fp| !fp.is_zeroed())
            .count();
        self.num_active_fps = num_active as u32;
        self.total_voting_power = self.finality_providers[..num_active]
            .iter()
            .map(|fp| fp.total_bonded_sat)
            .sum();
    }

    pub fn active_finality_providers(&self) -> &[FinalityProviderDistInfo] {
        let n = (self.num_active_fps as usize).min(self.finality_providers.len());
        &self.finality_providers[..n]
    }

    pub fn active_fp_set(&self) -> HashSet<&str> {
        self.active_finality_providers()
            .iter()
            .map(|fp| fp.btc_pk_hex.as_str())
            .collect()
    }

    pub fn voting_power_of(&self, fp_btc_pk_hex: &str) -> u64 {
        self.active_finality_providers()
            .iter()
            .find(|fp| fp.btc_pk_hex == fp_btc_pk_hex)
            .map(|fp| fp.total_bonded_sat)
            .unwrap_or_default()
    }

    /// Finality providers active here but not in `prev`
    pub fn new_active_finality_providers(&self, prev: &VotingPowerDistCache) -> Vec<String> {
        let prev_active = prev.active_fp_set();
        self.active_finality_providers()
            .iter()
            .filter(|fp| !prev_active.contains(fp.btc_pk_hex.as_str()))
            .map(|fp| fp.btc_pk_hex.clone())
            .collect()
    }

    /// Finality providers active in `prev` but not here
    pub fn new_inactive_finality_providers(&self, prev: &VotingPowerDistCache) -> Vec<String> {
        let active = self.active_fp_set();
        prev.active_finality_providers()
            .iter()
            .filter(|fp| !active.contains(fp.btc_pk_hex.as_str()))
            .map(|fp| fp.btc_pk_hex.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(pk: &str, sat: u64) -> FinalityProviderDistInfo {
        let mut fp = FinalityProviderDistInfo::new(pk, "addr", Decimal::percent(5));
        fp.is_timestamped = true;
        if sat > 0 {
            fp.add_bonded_sat(&format!("{pk}-del"), sat);
        }
        fp
    }

    fn order(dc: &VotingPowerDistCache) -> Vec<&str> {
        dc.finality_providers
            .iter()
            .map(|fp| fp.btc_pk_hex.as_str())
            .collect()
    }

    #[test]
    fn sort_puts_zeroed_fps_last() {
        let mut jailed = fp("aa", 1000);
        jailed.is_jailed = true;
        let mut slashed = fp("bb", 2000);
        slashed.is_slashed = true;
        let mut not_timestamped = fp("cc", 3000);
        not_timestamped.is_timestamped = false;

        let mut dc = VotingPowerDistCache::default();
        for f in [jailed, slashed, not_timestamped, fp("dd", 0), fp("ee", 10), fp("ff", 20)] {
            dc.add_finality_provider(f);
        }
        dc.apply_active_finality_providers(100);

        assert_eq!(dc.num_active_fps, 2);
        assert_eq!(dc.total_voting_power, 30);
        assert_eq!(&order(&dc)[..2], &["ff", "ee"]);
        assert!(dc.finality_providers[2..].iter().all(|fp| fp.is_zeroed()));
    }

    #[test]
    fn equal_power_breaks_ties_by_key() {
        let mut dc = VotingPowerDistCache::default();
        for pk in ["03", "01", "02"] {
            dc.add_finality_provider(fp(pk, 50));
        }
        dc.apply_active_finality_providers(2);
        assert_eq!(order(&dc), vec!["01", "02", "03"]);
        assert_eq!(dc.num_active_fps, 2);
        assert_eq!(dc.total_voting_power, 100);

        // sorting again yields the same order
        let before = dc.clone();
        dc.apply_active_finality_providers(2);
        assert_eq!(before, dc);
    }

    #[test]
    fn active_set_changes() {
        let mut prev = VotingPowerDistCache::default();
        prev.add_finality_provider(fp("01", 10));
        prev.add_finality_provider(fp("02", 10));
        prev.apply_active_finality_providers(10);

        let mut cur = VotingPowerDistCache::default();
        cur.add_finality_provider(fp("02", 10));
        cur.add_finality_provider(fp("03", 10));
        cur.apply_active_finality_providers(10);

        assert_eq!(cur.new_active_finality_providers(&prev), vec!["03"]);
        assert_eq!(cur.new_inactive_finality_providers(&prev), vec!["01"]);
        assert_eq!(cur.voting_power_of("02"), 10);
        assert_eq!(cur.voting_power_of("01"), 0);
    }

    #[test]
    fn pub_rand_commit_range() {
        let prc = PubRandCommit {
            start_height: 50,
            num_pub_rand: 100,
            epoch_num: 1,
            commitment: vec![0; 32],
        };
        assert_eq!(prc.end_height(), 149);
        assert!(prc.in_range(50) && prc.in_range(149));
        assert!(!prc.in_range(49) && !prc.in_range(150));
        assert_eq!(prc.index_of(60), Some(10));
        assert_eq!(prc.index_of(150), None);
    }
}
