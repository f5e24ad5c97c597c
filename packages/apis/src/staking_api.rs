/// Records owned by the BTC staking module, as seen by the finality module
use cosmwasm_schema::cw_serde;
use cosmwasm_std::Decimal;

#[cw_serde]
pub struct FinalityProvider {
    /// btc_pk_hex is the Bitcoin secp256k1 PK of this finality provider
    /// the PK follows encoding in BIP-340 spec in hex format
    pub btc_pk_hex: String,
    /// addr is the Babylon address of the finality provider
    pub addr: String,
    /// commission defines the commission rate of the finality provider.
    pub commission: Decimal,
    /// jailed indicates whether the finality provider is currently jailed
    pub jailed: bool,
    /// slashed_babylon_height indicates the Babylon height when
    /// the finality provider is slashed.
    /// if it's 0, then the finality provider is not slashed
    pub slashed_babylon_height: u64,
    /// slashed_btc_height indicates the BTC height when
    /// the finality provider is slashed.
    /// if it's 0, then the finality provider is not slashed
    pub slashed_btc_height: u64,
}

impl FinalityProvider {
    pub fn is_slashed(&self) -> bool {
        self.slashed_babylon_height > 0
    }

    pub fn is_jailed(&self) -> bool {
        self.jailed
    }
}

#[cw_serde]
pub struct BtcDelegation {
    /// staking_tx_hash is the hash of the staking tx, in hex
    pub staking_tx_hash: String,
    /// btc_pk_hex is the Bitcoin secp256k1 PK of the delegator
    pub btc_pk_hex: String,
    /// fp_btc_pk_list is the list of BIP-340 PKs of the finality providers that
    /// this BTC delegation delegates to
    pub fp_btc_pk_list: Vec<String>,
    /// start_height is the start BTC height of the BTC delegation.
    /// It is the start BTC height of the time-lock
    pub start_height: u32,
    /// end_height is the end height of the BTC delegation
    /// it is the end BTC height of the time-lock - w
    pub end_height: u32,
    /// total_sat is the total BTC stakes in this delegation, quantified in satoshi
    pub total_sat: u64,
}

/// `PowerDistUpdateEvent` is an event affecting the voting power distribution, recorded by the
/// BTC staking module at the BTC height it happened
#[cw_serde]
pub enum PowerDistUpdateEvent {
    /// A delegation got its covenant quorum and starts counting
    DelegationActivated {
        staking_tx_hash: String,
        fp_btc_pk_list: Vec<String>,
        total_sat: u64,
    },
    /// A delegation was unbonded early
    DelegationUnbonded { staking_tx_hash: String },
    /// A delegation reached the end of its time-lock
    DelegationExpired { staking_tx_hash: String },
    SlashedFp { fp_btc_pk_hex: String },
    JailedFp { fp_btc_pk_hex: String },
    UnjailedFp { fp_btc_pk_hex: String },
}
