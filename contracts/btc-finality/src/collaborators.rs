//! Capabilities of the modules the finality module depends on.
//!
//! The host wires the BTC staking module, the epoching / checkpointing modules and the
//! incentive module in through these traits. Any error returned by them aborts the current
//! handler.
use std::collections::BTreeSet;

use cosmwasm_std::StdResult;

use babylon_apis::finality_api::VotingPowerDistCache;
use babylon_apis::staking_api::{BtcDelegation, FinalityProvider, PowerDistUpdateEvent};

/// The BTC staking module, together with its view of the BTC light client
pub trait BtcStakingOracle {
    fn finality_provider(&self, fp_btc_pk_hex: &str) -> StdResult<Option<FinalityProvider>>;

    fn btc_delegation(&self, staking_tx_hash: &str) -> StdResult<Option<BtcDelegation>>;

    /// Power distribution events recorded at BTC heights `from..=to`, ordered by BTC height
    /// and then by recording order, each with the BTC height it was recorded at
    fn power_dist_update_events(
        &self,
        from_btc_height: u32,
        to_btc_height: u32,
    ) -> StdResult<Vec<(u32, PowerDistUpdateEvent)>>;

    fn clear_power_dist_update_events(&mut self, btc_height: u32) -> StdResult<()>;

    /// Marks the finality provider as slashed at `babylon_height`. The staking module records a
    /// `SlashedFp` event at the current BTC tip
    fn slash_finality_provider(&mut self, fp_btc_pk_hex: &str, babylon_height: u64)
        -> StdResult<()>;

    /// Marks the finality provider as jailed, and records a `JailedFp` event
    fn jail_finality_provider(&mut self, fp_btc_pk_hex: &str) -> StdResult<()>;

    /// Clears the jailed flag of the finality provider, and records an `UnjailedFp` event
    fn unjail_finality_provider(&mut self, fp_btc_pk_hex: &str) -> StdResult<()>;

    fn current_btc_height(&self) -> StdResult<u32>;

    /// BTC tip height the light client had at the given Babylon height, if recorded
    fn btc_height_at_babylon_height(&self, babylon_height: u64) -> StdResult<Option<u32>>;
}

pub trait EpochOracle {
    fn current_epoch(&self) -> StdResult<u64>;

    /// Highest epoch whose checkpoint is buried deep enough on Bitcoin
    fn last_finalized_epoch(&self) -> StdResult<u64>;
}

pub trait IncentiveSink {
    fn reward_btc_staking(
        &mut self,
        height: u64,
        dc: &VotingPowerDistCache,
        voters: &BTreeSet<String>,
    ) -> StdResult<()>;
}

/// The collaborators handed to every state changing entry point
pub struct Collaborators<'a> {
    pub staking: &'a mut dyn BtcStakingOracle,
    pub epoching: &'a dyn EpochOracle,
    pub incentive: &'a mut dyn IncentiveSink,
}
