use derivative::Derivative;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Decimal, Uint128};

use cw_controllers::Admin;
use cw_storage_plus::Item;

use crate::error::ContractError;
use crate::state::{ADMIN_NAMESPACE, PARAMS_NAMESPACE};

pub(crate) const PARAMS: Item<Params> = Item::new(PARAMS_NAMESPACE);
/// Storage for admin. The admin is the governance authority
pub(crate) const ADMIN: Admin = Admin::new(ADMIN_NAMESPACE);

#[cw_serde]
#[derive(Derivative)]
#[derivative(Default)]
pub struct Params {
    /// `max_active_finality_providers` is the maximum number of active finality providers in the
    /// BTC staking protocol
    #[derivative(Default(value = "100"))]
    pub max_active_finality_providers: u32,
    /// `min_pub_rand` is the minimum amount of public randomness each public randomness commitment
    /// should commit
    #[derivative(Default(value = "100"))]
    pub min_pub_rand: u64,
    /// `signed_blocks_window` is the size of the sliding window used to track liveness
    #[derivative(Default(value = "100"))]
    pub signed_blocks_window: u64,
    /// `min_signed_per_window` is the fraction of `signed_blocks_window` a finality provider has
    /// to sign to avoid being jailed
    #[derivative(Default(value = "Decimal::percent(50)"))]
    pub min_signed_per_window: Decimal,
    /// `finality_sig_timeout` is the number of blocks after which a missing vote is accounted
    #[derivative(Default(value = "3"))]
    pub finality_sig_timeout: u64,
    /// `jail_duration` is the minimum time, in seconds, a finality provider remains jailed
    #[derivative(Default(value = "86400"))]
    pub jail_duration: u64,
    /// `finality_activation_height` is the height from which blocks are indexed and votes are
    /// accepted
    pub finality_activation_height: u64,
    /// `max_finalized_rewarded_blocks_per_end_block` bounds the blocks tallied and rewarded per
    /// end block
    #[derivative(Default(value = "10_000"))]
    pub max_finalized_rewarded_blocks_per_end_block: u64,
}

impl Params {
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.max_active_finality_providers == 0 {
            return Err(ContractError::InvalidParams(
                "max_active_finality_providers must be positive".into(),
            ));
        }
        if self.min_pub_rand == 0 {
            return Err(ContractError::InvalidParams(
                "min_pub_rand must be positive".into(),
            ));
        }
        if self.signed_blocks_window == 0 {
            return Err(ContractError::InvalidParams(
                "signed_blocks_window must be positive".into(),
            ));
        }
        if self.min_signed_per_window > Decimal::one() {
            return Err(ContractError::InvalidParams(format!(
                "min_signed_per_window must be in [0, 1], got {}",
                self.min_signed_per_window
            )));
        }
        if self.finality_sig_timeout == 0 {
            return Err(ContractError::InvalidParams(
                "finality_sig_timeout must be positive".into(),
            ));
        }
        if self.jail_duration == 0 {
            return Err(ContractError::InvalidParams(
                "jail_duration must be positive".into(),
            ));
        }
        if self.max_finalized_rewarded_blocks_per_end_block == 0 {
            return Err(ContractError::InvalidParams(
                "max_finalized_rewarded_blocks_per_end_block must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Number of blocks of the window a finality provider has to sign, rounded up
    pub fn min_signed_blocks(&self) -> u64 {
        Uint128::from(self.signed_blocks_window)
            .mul_ceil(self.min_signed_per_window)
            .u128() as u64
    }

    /// Number of blocks of the window a finality provider may miss without being jailed
    pub fn max_missed_blocks(&self) -> u64 {
        self.signed_blocks_window
            .saturating_sub(self.min_signed_blocks())
    }
}
