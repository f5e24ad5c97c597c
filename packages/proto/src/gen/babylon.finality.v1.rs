// @generated
/// Params defines the parameters for the finality module.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Params {
    /// max_active_finality_providers is the maximum number of active finality providers
    #[prost(uint32, tag="1")]
    pub max_active_finality_providers: u32,
    /// signed_blocks_window defines the size of the sliding window for tracking finality provider liveness
    #[prost(int64, tag="2")]
    pub signed_blocks_window: i64,
    /// finality_sig_timeout defines how much time (in terms of blocks) finality providers have to cast a finality
    /// vote before being judged as missing their voting turn on the given block
    #[prost(int64, tag="3")]
    pub finality_sig_timeout: i64,
    /// min_signed_per_window defines the minimum number of blocks that a finality provider is required to sign
    /// within the sliding window to avoid being jailed
    #[prost(string, tag="4")]
    pub min_signed_per_window: ::prost::alloc::string::String,
    /// min_pub_rand is the minimum number of public randomness each
    /// message should commit
    #[prost(uint64, tag="5")]
    pub min_pub_rand: u64,
    /// jail_duration is the minimum period of time that a finality provider remains jailed
    #[prost(message, optional, tag="6")]
    pub jail_duration: ::core::option::Option<tendermint_proto::google::protobuf::Duration>,
    /// finality_activation_height is the babylon block height which the finality module will
    /// start to accept finality voting and the minimum allowed value for the public randomness
    /// commit start height.
    #[prost(uint64, tag="7")]
    pub finality_activation_height: u64,
    /// max_finalized_rewarded_blocks_per_end_block bounds the number of blocks finalized and
    /// rewarded in a single end block
    #[prost(uint64, tag="8")]
    pub max_finalized_rewarded_blocks_per_end_block: u64,
}
/// PubRandCommit is a commitment to a series of public randomness
/// currently, the commitment is a root of a Merkle tree that includes
/// a series of public randomness
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PubRandCommit {
    /// start_height is the height of the first commitment
    #[prost(uint64, tag="1")]
    pub start_height: u64,
    /// num_pub_rand is the number of committed public randomness
    #[prost(uint64, tag="2")]
    pub num_pub_rand: u64,
    /// commitment is the value of the commitment
    /// currently, it is the root of the merkle tree constructed by the public randomness
    #[prost(bytes="bytes", tag="3")]
    pub commitment: ::prost::bytes::Bytes,
    /// epoch_num defines the epoch number that the commit falls into
    #[prost(uint64, tag="4")]
    pub epoch_num: u64,
}
/// Evidence is the evidence that a finality provider has signed finality
/// signatures with correct public randomness on two conflicting Babylon headers
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Evidence {
    /// fp_btc_pk is the BTC PK of the finality provider that casts this vote
    #[prost(bytes="bytes", tag="1")]
    pub fp_btc_pk: ::prost::bytes::Bytes,
    /// block_height is the height of the conflicting blocks
    #[prost(uint64, tag="2")]
    pub block_height: u64,
    /// pub_rand is the public randomness the finality provider has committed to
    #[prost(bytes="bytes", tag="3")]
    pub pub_rand: ::prost::bytes::Bytes,
    /// canonical_app_hash is the AppHash of the canonical block
    #[prost(bytes="bytes", tag="4")]
    pub canonical_app_hash: ::prost::bytes::Bytes,
    /// fork_app_hash is the AppHash of the fork block
    #[prost(bytes="bytes", tag="5")]
    pub fork_app_hash: ::prost::bytes::Bytes,
    /// canonical_finality_sig is the finality signature to the canonical block
    /// where finality signature is an EOTS signature, i.e.,
    /// the `s` in a Schnorr signature `(r, s)`
    /// `r` is the public randomness that is already committed by the finality provider
    #[prost(bytes="bytes", tag="6")]
    pub canonical_finality_sig: ::prost::bytes::Bytes,
    /// fork_finality_sig is the finality signature to the fork block
    /// where finality signature is an EOTS signature
    #[prost(bytes="bytes", tag="7")]
    pub fork_finality_sig: ::prost::bytes::Bytes,
}
/// MsgCommitPubRandList defines a message for committing a list of public randomness for EOTS
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgCommitPubRandList {
    #[prost(string, tag="1")]
    pub signer: ::prost::alloc::string::String,
    /// fp_btc_pk is the BTC PK of the finality provider that commits the public randomness
    #[prost(bytes="bytes", tag="2")]
    pub fp_btc_pk: ::prost::bytes::Bytes,
    /// start_height is the start block height of the list of public randomness
    #[prost(uint64, tag="3")]
    pub start_height: u64,
    /// num_pub_rand is the number of public randomness committed
    #[prost(uint64, tag="4")]
    pub num_pub_rand: u64,
    /// commitment is the commitment of these public randomness
    /// currently it's the root of the Merkle tree that includes these public randomness
    #[prost(bytes="bytes", tag="5")]
    pub commitment: ::prost::bytes::Bytes,
    /// sig is the signature on (start_height || num_pub_rand || commitment) signed by
    /// SK corresponding to fp_btc_pk. This prevents others to commit public
    /// randomness on behalf of fp_btc_pk
    #[prost(bytes="bytes", tag="6")]
    pub sig: ::prost::bytes::Bytes,
}
/// MsgAddFinalitySig defines a message for adding a finality vote
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgAddFinalitySig {
    #[prost(string, tag="1")]
    pub signer: ::prost::alloc::string::String,
    /// fp_btc_pk is the BTC PK of the finality provider that casts this vote
    #[prost(bytes="bytes", tag="2")]
    pub fp_btc_pk: ::prost::bytes::Bytes,
    /// block_height is the height of the voted block
    #[prost(uint64, tag="3")]
    pub block_height: u64,
    /// pub_rand is the public randomness committed at this height
    #[prost(bytes="bytes", tag="4")]
    pub pub_rand: ::prost::bytes::Bytes,
    /// proof is the proof that the given public randomness is committed under the commitment
    #[prost(message, optional, tag="5")]
    pub proof: ::core::option::Option<tendermint_proto::crypto::Proof>,
    /// block_app_hash is the AppHash of the voted block
    #[prost(bytes="bytes", tag="6")]
    pub block_app_hash: ::prost::bytes::Bytes,
    /// finality_sig is the finality signature to this block
    /// where finality signature is an EOTS signature, i.e.,
    /// the `s` in a Schnorr signature `(r, s)`
    /// `r` is the public randomness that is already committed by the finality provider
    #[prost(bytes="bytes", tag="7")]
    pub finality_sig: ::prost::bytes::Bytes,
}
/// MsgUpdateParams defines a message for updating finality module parameters.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgUpdateParams {
    /// authority is the address of the governance account.
    #[prost(string, tag="1")]
    pub authority: ::prost::alloc::string::String,
    /// params defines the finality parameters to update.
    ///
    /// NOTE: All parameters must be supplied.
    #[prost(message, optional, tag="2")]
    pub params: ::core::option::Option<Params>,
}
/// MsgUnjailFinalityProvider defines the Msg/UnjailFinalityProvider request type
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgUnjailFinalityProvider {
    #[prost(string, tag="1")]
    pub signer: ::prost::alloc::string::String,
    /// fp_btc_pk is the BTC PK of the finality provider that commits the public randomness
    #[prost(bytes="bytes", tag="2")]
    pub fp_btc_pk: ::prost::bytes::Bytes,
}
/// MsgResumeFinalityProposal is a governance proposal to resume finality from halting
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgResumeFinalityProposal {
    /// authority is the address of the governance account.
    #[prost(string, tag="1")]
    pub authority: ::prost::alloc::string::String,
    /// fp_pks_hex is a list of finality provider public keys to jail
    /// the public key follows encoding in BIP-340 spec
    #[prost(string, repeated, tag="2")]
    pub fp_pks_hex: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    /// halting_height is the height where the finality halting begins
    #[prost(uint32, tag="3")]
    pub halting_height: u32,
}
// @@protoc_insertion_point(module)
