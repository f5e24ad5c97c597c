use std::collections::{BTreeMap, BTreeSet};

use cosmwasm_std::{Decimal, StdResult};
use k256::ecdsa::signature::Signer;
use k256::schnorr::SigningKey;
use sha2::{Digest, Sha256};

use babylon_apis::finality_api::VotingPowerDistCache;
use babylon_apis::staking_api::{BtcDelegation, FinalityProvider, PowerDistUpdateEvent};
use babylon_merkle::{proofs_from_leaves, Proof};

use crate::collaborators::{BtcStakingOracle, EpochOracle, IncentiveSink};
use crate::signing_context::{commit_pub_rand_msg, msg_to_sign};
use crate::state::config::Params;

pub fn finality_params() -> Params {
    Params {
        min_pub_rand: 1,
        ..Params::default()
    }
}

/// In-memory BTC staking module. Events are recorded at the current BTC tip
#[derive(Default)]
pub struct MockStaking {
    pub finality_providers: BTreeMap<String, FinalityProvider>,
    pub delegations: BTreeMap<String, BtcDelegation>,
    pub events: BTreeMap<u32, Vec<PowerDistUpdateEvent>>,
    pub btc_tip: u32,
    pub btc_tips: BTreeMap<u64, u32>,
}

impl MockStaking {
    pub fn add_finality_provider(&mut self, fp: FinalityProvider) {
        self.finality_providers.insert(fp.btc_pk_hex.clone(), fp);
    }

    /// Registers an active delegation of `total_sat` to `fp_btc_pk_hex`
    pub fn delegate(&mut self, staking_tx_hash: &str, fp_btc_pk_hex: &str, total_sat: u64) {
        let del = BtcDelegation {
            staking_tx_hash: staking_tx_hash.to_string(),
            btc_pk_hex: hex::encode([0x02; 32]),
            fp_btc_pk_list: vec![fp_btc_pk_hex.to_string()],
            start_height: self.btc_tip,
            end_height: self.btc_tip + 1000,
            total_sat,
        };
        self.record(PowerDistUpdateEvent::DelegationActivated {
            staking_tx_hash: del.staking_tx_hash.clone(),
            fp_btc_pk_list: del.fp_btc_pk_list.clone(),
            total_sat,
        });
        self.delegations.insert(del.staking_tx_hash.clone(), del);
    }

    pub fn unbond(&mut self, staking_tx_hash: &str) {
        self.record(PowerDistUpdateEvent::DelegationUnbonded {
            staking_tx_hash: staking_tx_hash.to_string(),
        });
    }

    pub fn expire(&mut self, staking_tx_hash: &str) {
        self.record(PowerDistUpdateEvent::DelegationExpired {
            staking_tx_hash: staking_tx_hash.to_string(),
        });
    }

    pub fn record(&mut self, event: PowerDistUpdateEvent) {
        self.events.entry(self.btc_tip).or_default().push(event);
    }

    /// Records the current BTC tip as the one seen at `babylon_height`
    pub fn index_btc_height(&mut self, babylon_height: u64) {
        self.btc_tips.insert(babylon_height, self.btc_tip);
    }

    fn fp_mut(&mut self, fp_btc_pk_hex: &str) -> StdResult<&mut FinalityProvider> {
        self.finality_providers
            .get_mut(fp_btc_pk_hex)
            .ok_or_else(|| cosmwasm_std::StdError::not_found(fp_btc_pk_hex))
    }
}

impl BtcStakingOracle for MockStaking {
    fn finality_provider(&self, fp_btc_pk_hex: &str) -> StdResult<Option<FinalityProvider>> {
        Ok(self.finality_providers.get(fp_btc_pk_hex).cloned())
    }

    fn btc_delegation(&self, staking_tx_hash: &str) -> StdResult<Option<BtcDelegation>> {
        Ok(self.delegations.get(staking_tx_hash).cloned())
    }

    fn power_dist_update_events(
        &self,
        from_btc_height: u32,
        to_btc_height: u32,
    ) -> StdResult<Vec<(u32, PowerDistUpdateEvent)>> {
        Ok(self
            .events
            .range(from_btc_height..=to_btc_height)
            .flat_map(|(height, events)| events.iter().map(|ev| (*height, ev.clone())))
            .collect())
    }

    fn clear_power_dist_update_events(&mut self, btc_height: u32) -> StdResult<()> {
        self.events.remove(&btc_height);
        Ok(())
    }

    fn slash_finality_provider(
        &mut self,
        fp_btc_pk_hex: &str,
        babylon_height: u64,
    ) -> StdResult<()> {
        let btc_tip = self.btc_tip;
        let fp = self.fp_mut(fp_btc_pk_hex)?;
        fp.slashed_babylon_height = babylon_height;
        fp.slashed_btc_height = btc_tip.into();
        self.record(PowerDistUpdateEvent::SlashedFp {
            fp_btc_pk_hex: fp_btc_pk_hex.to_string(),
        });
        Ok(())
    }

    fn jail_finality_provider(&mut self, fp_btc_pk_hex: &str) -> StdResult<()> {
        self.fp_mut(fp_btc_pk_hex)?.jailed = true;
        self.record(PowerDistUpdateEvent::JailedFp {
            fp_btc_pk_hex: fp_btc_pk_hex.to_string(),
        });
        Ok(())
    }

    fn unjail_finality_provider(&mut self, fp_btc_pk_hex: &str) -> StdResult<()> {
        self.fp_mut(fp_btc_pk_hex)?.jailed = false;
        self.record(PowerDistUpdateEvent::UnjailedFp {
            fp_btc_pk_hex: fp_btc_pk_hex.to_string(),
        });
        Ok(())
    }

    fn current_btc_height(&self) -> StdResult<u32> {
        Ok(self.btc_tip)
    }

    fn btc_height_at_babylon_height(&self, babylon_height: u64) -> StdResult<Option<u32>> {
        Ok(self.btc_tips.get(&babylon_height).copied())
    }
}

pub struct MockEpoching {
    pub current_epoch: u64,
    pub last_finalized_epoch: u64,
}

impl MockEpoching {
    pub fn new(current_epoch: u64, last_finalized_epoch: u64) -> Self {
        Self {
            current_epoch,
            last_finalized_epoch,
        }
    }
}

impl EpochOracle for MockEpoching {
    fn current_epoch(&self) -> StdResult<u64> {
        Ok(self.current_epoch)
    }

    fn last_finalized_epoch(&self) -> StdResult<u64> {
        Ok(self.last_finalized_epoch)
    }
}

/// Records every rewarded height with its voters
#[derive(Default)]
pub struct MockIncentive {
    pub rewarded: Vec<(u64, BTreeSet<String>)>,
}

impl MockIncentive {
    pub fn rewarded_heights(&self) -> Vec<u64> {
        self.rewarded.iter().map(|(height, _)| *height).collect()
    }
}

impl IncentiveSink for MockIncentive {
    fn reward_btc_staking(
        &mut self,
        height: u64,
        _dc: &VotingPowerDistCache,
        voters: &BTreeSet<String>,
    ) -> StdResult<()> {
        self.rewarded.push((height, voters.clone()));
        Ok(())
    }
}

/// A list of public randomness values together with its commitment
pub struct PubRandList {
    pub start_height: u64,
    pub num_pub_rand: u64,
    pub commitment: Vec<u8>,
    pub signature: Vec<u8>,
    pub pub_rands: Vec<Vec<u8>>,
    pub proofs: Vec<Proof>,
}

impl PubRandList {
    pub fn pub_rand_and_proof(&self, height: u64) -> (Vec<u8>, Proof) {
        let i = (height - self.start_height) as usize;
        (self.pub_rands[i].clone(), self.proofs[i].clone())
    }
}

/// Finality provider with deterministic keys derived from its name
pub struct TestFinalityProvider {
    pub btc_pk_hex: String,
    pub addr: String,
    seed: [u8; 32],
    signing_key: SigningKey,
    eots_sk: eots::SecretKey,
}

impl TestFinalityProvider {
    pub fn new(name: &str) -> Self {
        let seed: [u8; 32] = Sha256::digest(format!("fp-{name}")).into();
        let signing_key = SigningKey::from_bytes(&seed).unwrap();
        let eots_sk = eots::SecretKey::from_bytes(seed).unwrap();
        let btc_pk_hex = hex::encode(signing_key.verifying_key().to_bytes());
        assert_eq!(btc_pk_hex, eots_sk.pubkey().to_hex());
        Self {
            btc_pk_hex,
            addr: format!("bbn-{name}"),
            seed,
            signing_key,
            eots_sk,
        }
    }

    pub fn finality_provider(&self) -> FinalityProvider {
        FinalityProvider {
            btc_pk_hex: self.btc_pk_hex.clone(),
            addr: self.addr.clone(),
            commission: Decimal::percent(10),
            jailed: false,
            slashed_babylon_height: 0,
            slashed_btc_height: 0,
        }
    }

    pub fn eots_pk(&self) -> eots::PublicKey {
        self.eots_sk.pubkey()
    }

    fn sec_rand(&self, height: u64) -> eots::SecRand {
        let r = Sha256::new()
            .chain_update(self.seed)
            .chain_update(b"rand")
            .chain_update(height.to_be_bytes())
            .finalize();
        eots::new_sec_rand(&r).unwrap()
    }

    pub fn pub_rand(&self, height: u64) -> Vec<u8> {
        eots::pub_rand_to_bytes(&eots::pub_rand_from_sec_rand(&self.sec_rand(height))).to_vec()
    }

    pub fn sign_commit(&self, start_height: u64, num_pub_rand: u64, commitment: &[u8]) -> Vec<u8> {
        let msg = commit_pub_rand_msg(start_height, num_pub_rand, commitment);
        let sig: k256::schnorr::Signature = self.signing_key.sign(&msg);
        sig.to_bytes().to_vec()
    }

    pub fn pub_rand_list(&self, start_height: u64, num_pub_rand: u64) -> PubRandList {
        let pub_rands: Vec<Vec<u8>> = (start_height..start_height + num_pub_rand)
            .map(|height| self.pub_rand(height))
            .collect();
        let (root, proofs) = proofs_from_leaves(&pub_rands);
        PubRandList {
            start_height,
            num_pub_rand,
            commitment: root.to_vec(),
            signature: self.sign_commit(start_height, num_pub_rand, &root),
            pub_rands,
            proofs,
        }
    }

    /// EOTS signature over `app_hash` at `height`, under the given signing context
    pub fn finality_sig(&self, context: &str, height: u64, app_hash: &[u8]) -> Vec<u8> {
        let msg = msg_to_sign(context, height, app_hash);
        eots::sig_to_bytes(&self.eots_sk.sign(&self.sec_rand(height), &msg)).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finality_signatures_verify() {
        let fp = TestFinalityProvider::new("alice");
        let list = fp.pub_rand_list(10, 4);
        let (pub_rand, proof) = list.pub_rand_and_proof(12);
        proof.verify(&list.commitment, &pub_rand).unwrap();

        let sig = fp.finality_sig("ctx", 12, &[7; 32]);
        let msg = msg_to_sign("ctx", 12, &[7; 32]);
        assert!(fp.eots_pk().verify_bytes(&pub_rand, &msg, &sig).unwrap());
    }
}
